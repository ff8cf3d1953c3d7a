use dtekv_common::models::Difficulty;
use tracing::{debug, info, instrument};

use crate::{
    config::GameConfig,
    data::ParamsError,
    input::{Action, InputSampler},
    session::{GameSession, Signature},
};

/// Raw board inputs, read once per tick.
pub trait HardwareIo {
    fn read_switches(&mut self) -> u32;
    fn read_keys(&mut self) -> u32;
    /// Opaque value a new game is seeded from, e.g. a free-running timer.
    fn seed(&mut self) -> u32;
    /// Pause between ticks. On the board this paces frames and debounces keys.
    fn wait_tick(&mut self) {}
}

pub trait Renderer {
    fn render(&mut self, session: &GameSession);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Continue,
    /// The finished game was dismissed; control goes back to the menu.
    ExitToMenu,
}

/// Owns one game and drives it from sampled input.
pub struct GameController<H, R> {
    io: H,
    renderer: R,
    config: GameConfig,
    sampler: InputSampler,
    session: GameSession,
    drawn: Option<Signature>,
}

impl<H: HardwareIo, R: Renderer> GameController<H, R> {
    /// Starts a game at the difficulty selected on the switches, seeded from
    /// the hardware.
    pub fn new(mut io: H, renderer: R, config: GameConfig) -> Result<Self, ParamsError> {
        let difficulty = config
            .switch_map
            .select_difficulty(io.read_switches())
            .unwrap_or_default();
        let seed = io.seed();
        let session = GameSession::new(difficulty, seed, config.safe_zone)?;
        Ok(Self::with_session(io, renderer, config, session))
    }

    pub fn with_session(io: H, renderer: R, config: GameConfig, session: GameSession) -> Self {
        Self {
            io,
            renderer,
            config,
            sampler: InputSampler::new(config.switch_map),
            session,
            drawn: None,
        }
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn io(&self) -> &H {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut H {
        &mut self.io
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn into_parts(self) -> (H, R) {
        (self.io, self.renderer)
    }

    /// Throws the current game away and deals a new one. Missing arguments
    /// fall back to the difficulty switches (then the current difficulty)
    /// and to the hardware seed.
    #[instrument(level = "trace", skip(self))]
    pub fn restart(
        &mut self,
        difficulty: Option<Difficulty>,
        seed: Option<u32>,
    ) -> Result<(), ParamsError> {
        let difficulty = difficulty
            .or_else(|| {
                self.config
                    .switch_map
                    .select_difficulty(self.io.read_switches())
            })
            .unwrap_or(self.session.difficulty());
        let seed = seed.unwrap_or_else(|| self.io.seed());

        self.session = GameSession::new(difficulty, seed, self.config.safe_zone)?;
        self.sampler.reset();
        self.drawn = None;
        Ok(())
    }

    /// One polling step: sample, apply, redraw if anything visible changed.
    pub fn tick(&mut self) -> Tick {
        let switches = self.io.read_switches();
        let keys = self.io.read_keys();
        let action = self.sampler.sample(switches, keys);
        let tick = self.apply(action);
        self.redraw();
        tick
    }

    pub fn apply(&mut self, action: Action) -> Tick {
        if self.session.outcome().is_finished() {
            if action == Action::None {
                return Tick::Continue;
            }
            info!("Game over acknowledged, returning to menu");
            return Tick::ExitToMenu;
        }

        match action {
            Action::None | Action::Confirm => {}
            Action::Up | Action::Down | Action::Left | Action::Right => {
                if let Some(direction) = action.direction() {
                    self.session.step(direction);
                }
            }
            Action::ToggleFlag => {
                self.session.toggle_flag();
            }
            Action::Reveal => {
                self.session.reveal();
            }
        }
        Tick::Continue
    }

    /// Calls the renderer when the visible signature differs from the last
    /// frame drawn. Returns whether it did.
    pub fn redraw(&mut self) -> bool {
        let signature = self.session.signature();
        if self.drawn == Some(signature) {
            return false;
        }
        debug!("Redrawing for {:?}", signature);
        self.renderer.render(&self.session);
        self.drawn = Some(signature);
        true
    }

    /// Plays until the player dismisses a finished game.
    pub fn run(&mut self) {
        self.redraw();
        while self.tick() == Tick::Continue {
            self.io.wait_tick();
        }
    }
}

/// Runs one game of minesweeper on `io` and hands the hardware back once
/// the player confirms the end screen.
pub fn run_minesweeper<H: HardwareIo, R: Renderer>(
    io: H,
    renderer: R,
    config: GameConfig,
) -> Result<(H, R), ParamsError> {
    let mut controller = GameController::new(io, renderer, config)?;
    controller.run();
    Ok(controller.into_parts())
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use dtekv_common::{
        models::{Outcome, Pos},
        switches::SwitchBitMap,
    };

    use super::*;
    use crate::data::{Board, CellState};

    const RELEASED: u32 = u32::MAX;
    const PRESSED: u32 = u32::MAX & !1;

    /// Replays a fixed list of (switches, keys) samples, then idles.
    #[derive(Default)]
    struct ScriptedIo {
        samples: VecDeque<(u32, u32)>,
        switches: u32,
        ticks: usize,
    }

    impl ScriptedIo {
        fn press(&mut self, switches: u32) {
            self.samples.push_back((switches, PRESSED));
            self.samples.push_back((switches, RELEASED));
        }
    }

    impl HardwareIo for ScriptedIo {
        fn read_switches(&mut self) -> u32 {
            if let Some(&(switches, _)) = self.samples.front() {
                self.switches = switches;
            }
            self.switches
        }

        fn read_keys(&mut self) -> u32 {
            self.samples.pop_front().map_or(RELEASED, |(_, keys)| keys)
        }

        fn seed(&mut self) -> u32 {
            0x1234_5678
        }

        fn wait_tick(&mut self) {
            self.ticks += 1;
        }
    }

    #[derive(Default)]
    struct RecordingRenderer {
        frames: Vec<Signature>,
    }

    impl Renderer for RecordingRenderer {
        fn render(&mut self, session: &GameSession) {
            self.frames.push(session.signature());
        }
    }

    fn switch(bit: u8) -> u32 {
        1 << bit
    }

    fn controller(
        rows: usize,
        cols: usize,
        mines: &[Pos],
    ) -> GameController<ScriptedIo, RecordingRenderer> {
        let session = GameSession::from_board(
            Difficulty::Easy,
            7,
            Board::from_layout(rows, cols, mines).unwrap(),
        );
        let mut io = ScriptedIo::default();
        io.samples.push_back((0, RELEASED));
        GameController::with_session(
            io,
            RecordingRenderer::default(),
            GameConfig::default(),
            session,
        )
    }

    fn drain(controller: &mut GameController<ScriptedIo, RecordingRenderer>) -> Vec<Tick> {
        let mut ticks = Vec::new();
        while !controller.io().samples.is_empty() {
            ticks.push(controller.tick());
        }
        ticks
    }

    #[test]
    fn new_game_follows_difficulty_switches() {
        let map = SwitchBitMap::default();
        let mut io = ScriptedIo::default();
        io.samples.push_back((switch(map.hard), RELEASED));

        let controller =
            GameController::new(io, RecordingRenderer::default(), GameConfig::default()).unwrap();
        assert_eq!(controller.session().difficulty(), Difficulty::Hard);
        assert_eq!(controller.session().seed(), 0x1234_5678);
        assert!(controller.session().board().is_first_move());
    }

    #[test]
    fn moves_reveals_and_flags_from_confirm_edges() {
        let map = SwitchBitMap::default();
        let mut controller = controller(3, 3, &[Pos::new(2, 2)]);
        let io = controller.io_mut();
        io.press(switch(map.down));
        io.press(switch(map.right));
        io.press(switch(map.right));
        io.press(switch(map.flag));
        io.press(switch(map.up));
        io.press(switch(map.reveal));

        assert!(drain(&mut controller).iter().all(|&tick| tick == Tick::Continue));
        let session = controller.session();
        assert_eq!(session.cursor(), Pos::new(0, 2));
        assert_eq!(
            session.board().get(Pos::new(1, 2)).unwrap().state,
            CellState::Flagged
        );
        assert_eq!(
            session.board().get(Pos::new(0, 2)).unwrap().state,
            CellState::Revealed
        );
        assert_eq!(session.outcome(), Outcome::Running);
    }

    #[test]
    fn redraws_only_when_something_visible_changes() {
        let map = SwitchBitMap::default();
        let mut controller = controller(2, 2, &[Pos::new(1, 1)]);
        assert!(controller.redraw());
        assert!(!controller.redraw());

        let io = controller.io_mut();
        io.press(switch(map.up));
        io.press(switch(map.right));
        io.press(0);
        drain(&mut controller);

        // Initial frame plus the move right; blocked moves and plain confirms draw nothing.
        assert_eq!(controller.renderer().frames.len(), 2);
        assert_eq!(controller.renderer().frames[1].cursor, Pos::new(0, 1));
    }

    #[test]
    fn finished_game_waits_for_confirm_then_exits() {
        let map = SwitchBitMap::default();
        let mut controller = controller(2, 2, &[Pos::new(0, 0)]);
        controller.io_mut().press(switch(map.reveal));
        assert_eq!(drain(&mut controller), vec![Tick::Continue; 3]);
        assert_eq!(controller.session().outcome(), Outcome::Lost);
        let frames = controller.renderer().frames.len();

        // Idle ticks and a held key keep the end screen up.
        controller.io_mut().samples.push_back((switch(map.right), RELEASED));
        assert_eq!(controller.tick(), Tick::Continue);

        controller.io_mut().press(switch(map.right));
        assert_eq!(controller.tick(), Tick::ExitToMenu);
        assert_eq!(controller.session().cursor(), Pos::new(0, 0));
        assert_eq!(controller.renderer().frames.len(), frames);
    }

    #[test]
    fn run_returns_after_win_is_acknowledged() {
        let map = SwitchBitMap::default();
        let mut controller = controller(1, 2, &[Pos::new(0, 1)]);
        controller.io_mut().press(switch(map.reveal));
        controller.io_mut().press(0);

        controller.run();
        assert_eq!(controller.session().outcome(), Outcome::Won);
        assert_eq!(controller.io().ticks, 3);
        let outcomes: Vec<Outcome> = controller
            .renderer()
            .frames
            .iter()
            .map(|frame| frame.outcome)
            .collect();
        assert_eq!(outcomes, vec![Outcome::Running, Outcome::Won]);
    }

    #[test]
    fn restart_resets_board_and_sampler() {
        let map = SwitchBitMap::default();
        let mut controller = controller(2, 2, &[Pos::new(0, 0)]);
        controller.io_mut().press(switch(map.reveal));
        drain(&mut controller);
        assert_eq!(controller.session().outcome(), Outcome::Lost);

        controller.restart(Some(Difficulty::Medium), Some(3)).unwrap();
        let session = controller.session();
        assert_eq!(session.outcome(), Outcome::Running);
        assert_eq!(session.difficulty(), Difficulty::Medium);
        assert_eq!(session.seed(), 3);
        assert_eq!(session.board().rows(), 12);
        assert!(controller.redraw());
    }

    #[test]
    fn run_minesweeper_hands_back_hardware() {
        let map = SwitchBitMap::default();
        let mut io = ScriptedIo::default();
        // Sweep the grid row by row, revealing every cell until the game ends.
        io.samples.push_back((0, RELEASED));
        for row in 0..8 {
            for _ in 0..8 {
                io.press(switch(map.reveal));
                io.press(switch(if row % 2 == 0 { map.right } else { map.left }));
            }
            io.press(switch(map.down));
        }
        io.press(0);
        let scripted = io.samples.len();

        let (io, renderer) =
            run_minesweeper(io, RecordingRenderer::default(), GameConfig::default()).unwrap();
        assert!(!renderer.frames.is_empty());
        assert!(io.ticks < scripted);
    }
}
