use std::env;

use dtekv_minesweeper::GameConfig;
use tracing::{info, warn};

/// Reads the board's switch wiring and gameplay options from `BOARD_CONFIG`
/// (a JSON object), falling back to the defaults.
pub fn load_board_config() -> GameConfig {
    board_config_from(env::var("BOARD_CONFIG").ok().as_deref())
}

fn board_config_from(raw: Option<&str>) -> GameConfig {
    match raw {
        None => GameConfig::default(),
        Some(json) => match GameConfig::from_json(json) {
            Ok(config) => {
                info!("Loaded board configuration: {:?}", config);
                config
            }
            Err(e) => {
                warn!("Ignoring invalid BOARD_CONFIG ({}), using defaults", e);
                GameConfig::default()
            }
        },
    }
}
