use std::{ops::ControlFlow, sync::Arc};

use dashmap::Entry;
use nanoid::nanoid;
use rocket::{State, futures::StreamExt, get, http::Status, post, serde::json::Json};
use rocket_ws::{Channel, Message, WebSocket};
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use dtekv_common::{
    models::{CreateRequest, CreateResponse},
    protocol::ClientMessage,
};
use dtekv_minesweeper::GameConfig;

use crate::{
    logic::{BoardSession, Sessions},
    rate_limit::{ClientIp, RateLimiter, check_rate_limit},
};

#[instrument(level = "trace", skip(sessions, session))]
fn add_session(sessions: &State<Sessions>, session: BoardSession) -> String {
    let mut id_length = 5;
    let max_attempts_per_length = 10;

    loop {
        for _ in 0..max_attempts_per_length {
            let id = nanoid!(id_length);
            match sessions.entry(id.clone()) {
                Entry::Occupied(_) => {
                    debug!("Session ID collision, trying another: {}", id);
                    continue;
                }
                Entry::Vacant(entry) => {
                    entry.insert(Arc::new(Mutex::new(session)));
                    info!("Created new board session with ID: {}", id);
                    return id;
                }
            }
        }

        warn!(
            "Exhausted ID attempts at length {}, increasing to {}",
            id_length,
            id_length + 1
        );
        id_length += 1;
    }
}

#[post("/create", data = "<request>")]
#[instrument(level = "trace", skip(sessions, rate_limiter, config), fields(client_ip = %client_ip.0, difficulty = %request.difficulty))]
pub fn create_session(
    request: Json<CreateRequest>,
    sessions: &State<Sessions>,
    rate_limiter: &State<RateLimiter>,
    config: &State<GameConfig>,
    client_ip: ClientIp,
) -> Result<Json<CreateResponse>, Status> {
    info!(
        "Board creation request from {}: {} (seed {:?})",
        client_ip.0, request.difficulty, request.seed
    );

    if let Err(status) = check_rate_limit(rate_limiter, &client_ip) {
        warn!("Rate limit exceeded for client {}", client_ip.0);
        return Err(status);
    }

    let session = BoardSession::new(request.0, *config.inner()).map_err(|e| {
        warn!("Rejected board parameters: {}", e);
        Status::UnprocessableEntity
    })?;
    let id = add_session(sessions, session);

    info!(
        "Successfully created board {} for client {}",
        id, client_ip.0
    );
    Ok(Json(CreateResponse { id }))
}

/// Applies one WebSocket message to the board. Only a close frame ends the
/// stream.
async fn handle_message(
    board: &Mutex<BoardSession>,
    session_id: &str,
    message: Message,
) -> ControlFlow<()> {
    match message {
        Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
            Ok(ClientMessage::Input { switches, keys }) => {
                debug!(
                    "Input on board {}: switches={:#x} keys={:#x}",
                    session_id, switches, keys
                );
                board.lock().await.input(switches, keys).await;
            }
            Ok(ClientMessage::Restart { difficulty, seed }) => {
                board.lock().await.restart(difficulty, seed).await;
            }
            Err(e) => {
                warn!(
                    "Invalid message format on board {}: {} - Error: {}",
                    session_id, text, e
                );
            }
        },
        Message::Close(_) => return ControlFlow::Break(()),
        Message::Ping(_) | Message::Pong(_) => {}
        _ => debug!("Received non-text message on board {}, ignoring", session_id),
    }
    ControlFlow::Continue(())
}

#[get("/ws?<id>")]
#[instrument(level = "trace", skip(ws, sessions), fields(session_id = %id))]
pub fn websocket_handler(
    ws: WebSocket,
    sessions: &State<Sessions>,
    id: String,
) -> Result<Channel<'static>, Status> {
    let board = match sessions.get(&id) {
        None => {
            warn!("WebSocket connection attempt for non-existent board: {}", id);
            return Err(Status::NotFound);
        }
        Some(value) => {
            info!("WebSocket connection established for board: {}", id);
            value.value().clone()
        }
    };

    Ok(ws.channel(move |stream| {
        let session_id = id.clone();
        Box::pin(async move {
            let (write, mut read) = stream.split();

            let stream_id = {
                let mut board = board.lock().await;
                board.add_stream(write).await
            };

            while let Some(message) = read.next().await {
                match message {
                    Ok(message) => {
                        if handle_message(&board, &session_id, message).await.is_break() {
                            info!(
                                "WebSocket connection closed for board {} (stream: {})",
                                session_id, stream_id
                            );
                            break;
                        }
                    }
                    Err(e) => {
                        error!(
                            "WebSocket error on board {} (stream: {}): {}",
                            session_id, stream_id, e
                        );
                        break;
                    }
                }
            }

            {
                let mut board = board.lock().await;
                board.remove_stream(&stream_id).await;
            }

            info!(
                "Client disconnected from board {} (stream: {})",
                session_id, stream_id
            );
            Ok(())
        })
    }))
}
