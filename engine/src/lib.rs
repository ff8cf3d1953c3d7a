//! Minesweeper for the DTEK-V FPGA board.
//!
//! The engine is split the same way the board splits its work:
//!
//! - [`input`] turns the raw switch and key words into one [`Action`] per
//!   polling tick, firing on the confirm key's press edge only.
//! - [`data`] holds the [`Board`]: mine layout, adjacency counts and the
//!   hidden/revealed/flagged state of each cell.
//! - [`logic`] lays out mines on the first reveal (never under the first
//!   cell) and runs the breadth-first reveal cascade.
//! - [`session`] and [`controller`] tie it together: a [`GameController`]
//!   samples a [`HardwareIo`], mutates its [`GameSession`] and asks a
//!   [`Renderer`] to draw whenever something visible changed.
//!
//! ```rust,no_run
//! use dtekv_minesweeper::{GameConfig, MmioIo, Renderer, GameSession, run_minesweeper};
//!
//! struct Vga;
//!
//! impl Renderer for Vga {
//!     fn render(&mut self, session: &GameSession) {
//!         // draw session.board(), session.cursor() and session.outcome()
//!     }
//! }
//!
//! let config = GameConfig::default();
//! // SAFETY: running on the board.
//! let io = unsafe { MmioIo::dtekv(config.tick_delay) };
//! let (_io, _vga) = run_minesweeper(io, Vga, config).expect("presets always fit");
//! ```

pub mod config;
pub mod controller;
pub mod data;
pub mod hardware;
pub mod input;
pub mod logic;
pub mod session;

pub use config::{ConfigError, GameConfig};
pub use controller::{GameController, HardwareIo, Renderer, Tick, run_minesweeper};
pub use data::{Board, Cell, CellState, MINE_SENTINEL, ParamsError, SafeZone};
pub use hardware::MmioIo;
pub use input::{Action, InputSampler};
pub use logic::reveal::RevealReport;
pub use session::{GameSession, Signature};
