//! A browser-playable stand-in for the DTEK-V board. Each session runs the
//! same game controller the hardware does; the browser reports its switch
//! and key words over a WebSocket and gets a frame back for every redraw.

use std::sync::Arc;

use dashmap::DashMap;
use dtekv_minesweeper::GameConfig;
use rocket::{Build, Rocket, routes};

pub mod cleanup;
pub mod config;
pub mod cors;
pub mod logic;
pub mod rate_limit;
pub mod routes;

/// Routes and shared state, without CORS or the cleanup task.
pub fn build(config: GameConfig) -> Rocket<Build> {
    let sessions: logic::Sessions = Arc::new(DashMap::new());

    rocket::build()
        .manage(sessions)
        .manage(rate_limit::create_rate_limiter())
        .manage(config)
        .mount(
            "/",
            routes![routes::create_session, routes::websocket_handler],
        )
}
