use dtekv_common::switches::{SwitchBitMap, SwitchMapError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::SafeZone;

/// Busy-wait spins between polling ticks on the board.
pub const DEFAULT_TICK_DELAY: u32 = 10_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    SwitchMap(#[from] SwitchMapError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub switch_map: SwitchBitMap,
    pub safe_zone: SafeZone,
    pub tick_delay: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            switch_map: SwitchBitMap::default(),
            safe_zone: SafeZone::default(),
            tick_delay: DEFAULT_TICK_DELAY,
        }
    }
}

impl GameConfig {
    /// Parses a JSON object, filling unset fields with defaults, and
    /// rejects switch maps that point past the registers.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.switch_map.validate()?;
        Ok(config)
    }
}
