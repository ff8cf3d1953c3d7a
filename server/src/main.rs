use std::error::Error;

use dtekv_board_server::{
    build, cleanup::CleanupFairing, config::load_board_config, cors::create_cors,
};
use tracing::info;

#[rocket::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();
    info!("🚀 Starting virtual DTEK-V board server");

    let config = load_board_config();
    let rocket = build(config).attach(create_cors()?).attach(CleanupFairing);

    info!("🌐 Server configured with CORS, cleanup task, and routes");
    info!("📡 Endpoints: POST /create, GET /ws");

    let _ = rocket.launch().await?;
    Ok(())
}
