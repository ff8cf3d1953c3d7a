use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use dashmap::DashMap;
use rand::Rng;
use rocket::futures::{SinkExt, future::join_all, stream::SplitSink};
use rocket_ws::{Message, stream::DuplexStream};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use dtekv_common::{
    models::{CreateRequest, Difficulty},
    protocol::{Frame, ServerMessage},
    switches::SwitchBitMap,
};
use dtekv_minesweeper::{
    GameConfig, GameController, GameSession, HardwareIo, ParamsError, Renderer, Tick,
};

pub type Sessions = Arc<DashMap<String, Arc<Mutex<BoardSession>>>>;

/// Switch and key words as last reported by the browser. They hold their
/// level until the next `input` message, like the real registers do.
#[derive(Debug, Clone, Copy)]
pub struct LatchedInput {
    switches: u32,
    keys: u32,
}

impl LatchedInput {
    pub fn new(map: &SwitchBitMap) -> Self {
        Self {
            switches: map.switch_polarity.idle_word(),
            keys: map.key_polarity.idle_word(),
        }
    }

    pub fn latch(&mut self, switches: u32, keys: u32) {
        self.switches = switches;
        self.keys = keys;
    }
}

impl HardwareIo for LatchedInput {
    fn read_switches(&mut self) -> u32 {
        self.switches
    }

    fn read_keys(&mut self) -> u32 {
        self.keys
    }

    fn seed(&mut self) -> u32 {
        rand::rng().random()
    }
}

/// Holds the latest frame until the session forwards it to the streams.
#[derive(Debug, Default)]
pub struct FrameRecorder {
    pending: Option<Frame>,
}

impl FrameRecorder {
    pub fn take(&mut self) -> Option<Frame> {
        self.pending.take()
    }
}

impl Renderer for FrameRecorder {
    fn render(&mut self, session: &GameSession) {
        self.pending = Some(session.frame());
    }
}

pub struct BoardSession {
    controller: GameController<LatchedInput, FrameRecorder>,
    streams: HashMap<Uuid, SplitSink<DuplexStream, Message>>,
    last_activity: Instant,
    created_at: Instant,
}

async fn send(stream: &mut SplitSink<DuplexStream, Message>, message: &ServerMessage) {
    if let Ok(text) = serde_json::to_string(message) {
        let _ = stream.send(Message::Text(text)).await;
    }
}

async fn broadcast(
    streams: &mut HashMap<Uuid, SplitSink<DuplexStream, Message>>,
    message: &ServerMessage,
) {
    let futures: Vec<_> = streams
        .iter_mut()
        .map(|(_, stream)| send(stream, message))
        .collect();

    join_all(futures).await;
}

impl BoardSession {
    #[instrument(level = "trace", skip(config))]
    pub fn new(request: CreateRequest, config: GameConfig) -> Result<Self, ParamsError> {
        let mut io = LatchedInput::new(&config.switch_map);
        let seed = request.seed.unwrap_or_else(|| io.seed());
        let session = GameSession::new(request.difficulty, seed, config.safe_zone)?;
        Ok(Self::with_session(io, session, config))
    }

    /// Wraps an already dealt game, e.g. one on a fixed layout.
    pub fn with_session(io: LatchedInput, session: GameSession, config: GameConfig) -> Self {
        let mut controller =
            GameController::with_session(io, FrameRecorder::default(), config, session);
        // The opening frame goes out on join, not as a broadcast.
        controller.redraw();
        controller.renderer_mut().take();

        let now = Instant::now();
        Self {
            controller,
            streams: HashMap::new(),
            last_activity: now,
            created_at: now,
        }
    }

    pub fn frame(&self) -> Frame {
        self.controller.session().frame()
    }

    pub fn session(&self) -> &GameSession {
        self.controller.session()
    }

    fn drain_frame(&mut self, messages: &mut Vec<ServerMessage>) {
        if let Some(frame) = self.controller.renderer_mut().take() {
            messages.push(ServerMessage::Frame(frame));
        }
    }

    /// Latches the reported words and runs one controller tick. Returns the
    /// messages every connected stream should receive.
    pub fn apply_input(
        &mut self,
        switches: u32,
        keys: u32,
    ) -> Result<Vec<ServerMessage>, ParamsError> {
        self.last_activity = Instant::now();
        self.controller.io_mut().latch(switches, keys);

        let tick = self.controller.tick();
        let mut messages = Vec::new();
        self.drain_frame(&mut messages);

        if tick == Tick::ExitToMenu {
            messages.push(ServerMessage::Menu);
            self.controller.restart(None, None)?;
            self.controller.redraw();
            self.drain_frame(&mut messages);
            info!(
                "Dealt a new {} game from the menu",
                self.controller.session().difficulty()
            );
        }

        Ok(messages)
    }

    pub fn apply_restart(
        &mut self,
        difficulty: Option<Difficulty>,
        seed: Option<u32>,
    ) -> Result<Vec<ServerMessage>, ParamsError> {
        self.last_activity = Instant::now();
        self.controller.restart(difficulty, seed)?;
        self.controller.redraw();

        let mut messages = Vec::new();
        self.drain_frame(&mut messages);
        Ok(messages)
    }

    async fn publish(&mut self, result: Result<Vec<ServerMessage>, ParamsError>) {
        match result {
            Ok(messages) => {
                for message in &messages {
                    broadcast(&mut self.streams, message).await;
                }
                debug!(
                    "Broadcast {} messages to {} connections",
                    messages.len(),
                    self.streams.len()
                );
            }
            Err(e) => warn!("Could not deal a new game: {}", e),
        }
    }

    #[instrument(level = "trace", skip(self))]
    pub async fn input(&mut self, switches: u32, keys: u32) {
        let result = self.apply_input(switches, keys);
        self.publish(result).await;
    }

    #[instrument(level = "trace", skip(self))]
    pub async fn restart(&mut self, difficulty: Option<Difficulty>, seed: Option<u32>) {
        info!("Restarting board with {:?} (seed {:?})", difficulty, seed);
        let result = self.apply_restart(difficulty, seed);
        self.publish(result).await;
    }

    #[instrument(level = "trace", skip(self, stream))]
    pub async fn add_stream(&mut self, mut stream: SplitSink<DuplexStream, Message>) -> Uuid {
        let id = Uuid::new_v4();
        debug!("Adding stream {} to board", id);
        send(&mut stream, &ServerMessage::Frame(self.frame())).await;
        self.streams.insert(id, stream);
        self.last_activity = Instant::now();
        info!(
            "Stream {} added, total connections: {}",
            id,
            self.streams.len()
        );
        id
    }

    #[instrument(level = "trace", skip(self))]
    pub async fn remove_stream(&mut self, id: &Uuid) {
        if self.streams.remove(id).is_some() {
            info!(
                "Stream {} removed, remaining connections: {}",
                id,
                self.streams.len()
            );
        } else {
            warn!("Attempted to remove non-existent stream: {}", id);
        }
        self.last_activity = Instant::now()
    }

    pub fn has_active_connections(&self) -> bool {
        !self.streams.is_empty()
    }

    /// Idle sessions expire after `inactive`; every session expires after
    /// `active`, connected or not.
    pub fn should_cleanup(&self, inactive: Duration, active: Duration) -> bool {
        if self.created_at.elapsed() >= active {
            return true;
        }
        if self.has_active_connections() {
            return false;
        }
        self.last_activity.elapsed() >= inactive
    }
}

#[cfg(test)]
mod tests {
    use dtekv_common::models::{Outcome, Pos};
    use dtekv_minesweeper::Board;

    use super::*;

    const RELEASED: u32 = u32::MAX;
    const PRESSED: u32 = u32::MAX & !1;
    const DOWN: u32 = 1 << 5;
    const REVEAL: u32 = 1 << 9;
    const HARD: u32 = 1 << 3;

    fn one_safe_cell() -> BoardSession {
        let config = GameConfig::default();
        let board = Board::from_layout(1, 2, &[Pos::new(0, 1)]).unwrap();
        let session = GameSession::from_board(Difficulty::Easy, 5, board);
        BoardSession::with_session(LatchedInput::new(&config.switch_map), session, config)
    }

    fn frames(messages: &[ServerMessage]) -> Vec<&Frame> {
        messages
            .iter()
            .filter_map(|message| match message {
                ServerMessage::Frame(frame) => Some(frame),
                ServerMessage::Menu => None,
            })
            .collect()
    }

    #[test]
    fn quiet_input_sends_nothing() {
        let mut board = BoardSession::new(CreateRequest::default(), GameConfig::default()).unwrap();
        assert!(board.apply_input(0, RELEASED).unwrap().is_empty());
        assert!(board.apply_input(0, RELEASED).unwrap().is_empty());
    }

    #[test]
    fn cursor_move_broadcasts_a_frame() {
        let mut board = BoardSession::new(
            CreateRequest {
                difficulty: Difficulty::Medium,
                seed: Some(3),
            },
            GameConfig::default(),
        )
        .unwrap();
        board.apply_input(0, RELEASED).unwrap();

        let messages = board.apply_input(DOWN, PRESSED).unwrap();
        let sent = frames(&messages);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].cursor, Pos::new(1, 0));
        assert_eq!(sent[0].rows, 12);

        // Holding the key does not repeat the move.
        assert!(board.apply_input(DOWN, PRESSED).unwrap().is_empty());
    }

    #[test]
    fn dismissing_a_finished_game_goes_through_the_menu() {
        let mut board = one_safe_cell();
        board.apply_input(0, RELEASED).unwrap();

        let messages = board.apply_input(REVEAL, PRESSED).unwrap();
        assert_eq!(frames(&messages)[0].outcome, Outcome::Won);
        board.apply_input(REVEAL, RELEASED).unwrap();

        let messages = board.apply_input(HARD, PRESSED).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], ServerMessage::Menu);
        let next = frames(&messages)[0];
        assert_eq!(next.difficulty, Difficulty::Hard);
        assert_eq!(next.outcome, Outcome::Running);
        assert_eq!((next.rows, next.cols, next.mines), (16, 16, 40));
    }

    #[test]
    fn restart_picks_requested_difficulty_and_seed() {
        let mut board = one_safe_cell();
        let messages = board.apply_restart(Some(Difficulty::Medium), Some(77)).unwrap();
        let frame = frames(&messages)[0];
        assert_eq!(frame.difficulty, Difficulty::Medium);
        assert_eq!(frame.cursor, Pos::default());
        assert_eq!(board.session().seed(), 77);
    }

    #[test]
    fn cleanup_respects_both_timeouts() {
        let board = one_safe_cell();
        let hour = Duration::from_secs(3600);
        assert!(!board.should_cleanup(hour, hour));
        assert!(board.should_cleanup(Duration::ZERO, hour));
        assert!(board.should_cleanup(hour, Duration::ZERO));
    }

    #[tokio::test]
    async fn input_without_streams_still_advances_the_game() {
        let mut board = one_safe_cell();
        board.input(0, RELEASED).await;
        board.input(REVEAL, PRESSED).await;
        assert_eq!(board.frame().outcome, Outcome::Won);

        board.restart(Some(Difficulty::Easy), Some(1)).await;
        assert_eq!(board.frame().outcome, Outcome::Running);
    }
}
