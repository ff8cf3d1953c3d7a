//! Client for the virtual DTEK-V board server.
//!
//! [`VirtualBoard`] drives a session the way a player at the hardware does:
//! by flipping switches and pressing the confirm key. The server runs the
//! game and sends back a [`Frame`] whenever the screen changes.
//!
//! ```rust,no_run
//! use dtekv_board_client::{Difficulty, Direction, VirtualBoard};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let board = VirtualBoard::new("http://localhost:8000")?;
//!     board.start(Difficulty::Easy, None).await?;
//!
//!     board.step(Direction::Down).await?;
//!     board.step(Direction::Right).await?;
//!     board.reveal().await?;
//!
//!     if let Some(frame) = board.frame().await {
//!         println!("{} mines left, {:?}", frame.mines_remaining, frame.outcome);
//!     }
//!
//!     board.disconnect().await?;
//!     Ok(())
//! }
//! ```
//!
//! [`BoardClient`] and [`BoardWebSocket`] expose the raw HTTP and WebSocket
//! halves for callers that want to send [`ClientMessage`]s themselves.

mod client;
mod virtual_board;
mod websocket;

pub use client::BoardClient;
pub use virtual_board::{BoardEvent, InputPanel, VirtualBoard};
pub use websocket::BoardWebSocket;

pub use dtekv_common::{models::*, protocol::*, switches::*};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
