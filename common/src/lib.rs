//! Types shared between the minesweeper engine, the virtual board server
//! and its clients.

pub mod models;
pub mod protocol;
pub mod switches;
