use std::sync::Arc;

use dtekv_common::{
    models::{CreateRequest, Difficulty, Direction, Outcome, Pos},
    protocol::{ClientMessage, Frame, ServerMessage},
    switches::SwitchBitMap,
};
use tokio::sync::{Mutex, RwLock, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{BoardClient, BoardWebSocket, Result};

/// Events emitted while connected to a board session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardEvent {
    /// The server drew a new frame.
    FrameUpdated { cursor: Pos, outcome: Outcome },
    /// The finished game was dismissed; a new one follows.
    Menu,
    ConnectionLost,
}

/// Levels of the virtual switches and keys, as the server reads them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputPanel {
    map: SwitchBitMap,
    switches: u32,
    keys: u32,
}

impl InputPanel {
    pub fn new(map: SwitchBitMap) -> Self {
        Self {
            map,
            switches: map.switch_polarity.idle_word(),
            keys: map.key_polarity.idle_word(),
        }
    }

    pub fn map(&self) -> &SwitchBitMap {
        &self.map
    }

    pub fn words(&self) -> (u32, u32) {
        (self.switches, self.keys)
    }

    pub fn set_switch(&mut self, bit: u8, on: bool) -> (u32, u32) {
        self.switches = self.map.switch_polarity.drive(self.switches, bit, on);
        self.words()
    }

    pub fn set_confirm(&mut self, pressed: bool) -> (u32, u32) {
        self.keys = self.map.key_polarity.drive(self.keys, self.map.confirm_key, pressed);
        self.words()
    }

    /// Raises the switch for `difficulty` and lowers the other two.
    pub fn select_difficulty(&mut self, difficulty: Difficulty) -> (u32, u32) {
        for (bit, level) in [
            (self.map.easy, Difficulty::Easy),
            (self.map.medium, Difficulty::Medium),
            (self.map.hard, Difficulty::Hard),
        ] {
            self.set_switch(bit, level == difficulty);
        }
        self.words()
    }

    fn direction_bit(&self, direction: Direction) -> u8 {
        match direction {
            Direction::Up => self.map.up,
            Direction::Down => self.map.down,
            Direction::Left => self.map.left,
            Direction::Right => self.map.right,
        }
    }
}

struct ConnectionState {
    websocket_sender: mpsc::UnboundedSender<ClientMessage>,
    session_id: String,
    background_task: JoinHandle<()>,
}

impl ConnectionState {
    fn send_message(&self, message: ClientMessage) -> Result<()> {
        self.websocket_sender
            .send(message)
            .map_err(|_| "WebSocket sender closed")?;
        Ok(())
    }

    async fn abort_and_wait_background_task(self) {
        self.background_task.abort();
        let _ = self.background_task.await;
    }
}

/// Plays a remote board session through its switches and confirm key, the
/// same way a player sitting at the hardware would.
pub struct VirtualBoard {
    client: BoardClient,
    panel: Mutex<InputPanel>,
    connection_state: Arc<RwLock<Option<ConnectionState>>>,
    event_sender: Arc<RwLock<Option<mpsc::UnboundedSender<BoardEvent>>>>,
    frame: Arc<RwLock<Option<Frame>>>,
}

impl VirtualBoard {
    pub fn new(server_url: &str) -> Result<Self> {
        Self::with_map(server_url, SwitchBitMap::default())
    }

    /// Uses a custom switch wiring. It must match the server's `BOARD_CONFIG`.
    pub fn with_map(server_url: &str, map: SwitchBitMap) -> Result<Self> {
        Ok(Self {
            client: BoardClient::new(server_url)?,
            panel: Mutex::new(InputPanel::new(map)),
            connection_state: Arc::new(RwLock::new(None)),
            event_sender: Arc::new(RwLock::new(None)),
            frame: Arc::new(RwLock::new(None)),
        })
    }

    pub async fn subscribe_to_events(&self) -> mpsc::UnboundedReceiver<BoardEvent> {
        let (sender, receiver) = mpsc::unbounded_channel();
        *self.event_sender.write().await = Some(sender);
        receiver
    }

    pub async fn start(&self, difficulty: Difficulty, seed: Option<u32>) -> Result<()> {
        let session_id = self
            .client
            .create_session(&CreateRequest { difficulty, seed })
            .await?;
        info!("Created {} board with ID: {}", difficulty, session_id);
        self.join(session_id).await
    }

    pub async fn join(&self, session_id: String) -> Result<()> {
        info!("Joining board with ID: {}", session_id);

        let mut conn_state = self.connection_state.write().await;
        if let Some(existing_conn) = conn_state.take() {
            existing_conn.abort_and_wait_background_task().await;
        }
        self.frame.write().await.take();

        let ws_url = self.client.websocket_url(&session_id)?;
        let websocket = BoardWebSocket::connect(&ws_url).await?;
        let websocket_sender = websocket.get_sender();
        let background_task = self.start_background_listener(websocket);

        *conn_state = Some(ConnectionState {
            websocket_sender,
            session_id,
            background_task,
        });
        drop(conn_state);

        // The server's sampler only sees an edge after it has seen the key up.
        let (switches, keys) = self.panel.lock().await.words();
        self.send_input(switches, keys).await
    }

    async fn send_client_message(&self, message: ClientMessage) -> Result<()> {
        let conn_state = self.connection_state.read().await;
        match conn_state.as_ref() {
            Some(conn) => conn.send_message(message),
            None => Err("Not connected to a board. Call start() first.".into()),
        }
    }

    async fn send_input(&self, switches: u32, keys: u32) -> Result<()> {
        self.send_client_message(ClientMessage::Input { switches, keys })
            .await
    }

    pub async fn set_switch(&self, bit: u8, on: bool) -> Result<()> {
        let (switches, keys) = self.panel.lock().await.set_switch(bit, on);
        self.send_input(switches, keys).await
    }

    /// Press and release of the confirm key.
    pub async fn press_confirm(&self) -> Result<()> {
        let mut panel = self.panel.lock().await;
        let (switches, keys) = panel.set_confirm(true);
        self.send_input(switches, keys).await?;
        let (switches, keys) = panel.set_confirm(false);
        self.send_input(switches, keys).await
    }

    /// Raises one action switch, confirms, and lowers it again. Other raised
    /// action switches take priority on the board, so they are left to the caller.
    async fn pulse(&self, bit: u8) -> Result<()> {
        self.set_switch(bit, true).await?;
        self.press_confirm().await?;
        self.set_switch(bit, false).await
    }

    pub async fn step(&self, direction: Direction) -> Result<()> {
        debug!("Stepping cursor {:?}", direction);
        let bit = self.panel.lock().await.direction_bit(direction);
        self.pulse(bit).await
    }

    pub async fn reveal(&self) -> Result<()> {
        let bit = self.panel.lock().await.map().reveal;
        self.pulse(bit).await
    }

    pub async fn toggle_flag(&self) -> Result<()> {
        let bit = self.panel.lock().await.map().flag;
        self.pulse(bit).await
    }

    /// Raises the difficulty switch and confirms. The switch stays up: the
    /// board reads it when the next game is dealt, so confirming on a
    /// finished game goes straight to a game at this difficulty.
    pub async fn select_difficulty(&self, difficulty: Difficulty) -> Result<()> {
        let (switches, keys) = self.panel.lock().await.select_difficulty(difficulty);
        self.send_input(switches, keys).await?;
        self.press_confirm().await
    }

    pub async fn restart(&self, difficulty: Option<Difficulty>, seed: Option<u32>) -> Result<()> {
        info!("Requesting restart: {:?} (seed {:?})", difficulty, seed);
        self.send_client_message(ClientMessage::Restart { difficulty, seed })
            .await
    }

    pub async fn frame(&self) -> Option<Frame> {
        self.frame.read().await.clone()
    }

    pub async fn get_session_id(&self) -> Option<String> {
        let conn_state = self.connection_state.read().await;
        conn_state.as_ref().map(|conn| conn.session_id.clone())
    }

    pub async fn is_connected(&self) -> bool {
        self.connection_state.read().await.is_some()
    }

    pub async fn disconnect(&self) -> Result<()> {
        if let Some(conn) = self.connection_state.write().await.take() {
            conn.abort_and_wait_background_task().await;
        }
        *self.event_sender.write().await = None;
        *self.frame.write().await = None;

        info!("Disconnected from board");
        Ok(())
    }

    fn start_background_listener(&self, mut websocket: BoardWebSocket) -> JoinHandle<()> {
        let frame = self.frame.clone();
        let event_sender = self.event_sender.clone();

        tokio::spawn(async move {
            loop {
                let event = match websocket.receive_message().await {
                    Ok(Some(message)) => {
                        let mut frame = frame.write().await;
                        apply_server_message(&mut frame, message)
                    }
                    Ok(None) => BoardEvent::ConnectionLost,
                    Err(e) => {
                        warn!("Error receiving WebSocket message: {}", e);
                        BoardEvent::ConnectionLost
                    }
                };

                let lost = event == BoardEvent::ConnectionLost;
                if let Some(ref sender) = *event_sender.read().await {
                    let _ = sender.send(event);
                }
                if lost {
                    break;
                }
            }
        })
    }
}

/// Updates `frame` from one server message and reports what happened.
fn apply_server_message(frame: &mut Option<Frame>, message: ServerMessage) -> BoardEvent {
    match message {
        ServerMessage::Frame(next) => {
            let event = BoardEvent::FrameUpdated {
                cursor: next.cursor,
                outcome: next.outcome,
            };
            *frame = Some(next);
            event
        }
        ServerMessage::Menu => BoardEvent::Menu,
    }
}
