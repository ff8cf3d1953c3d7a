use dtekv_common::{
    models::{Difficulty, Direction, Outcome, Pos},
    protocol::Frame,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, instrument};

use crate::{
    data::{Board, CellState, ParamsError, SafeZone},
    logic::reveal::{self, RevealReport},
};

/// What the player can currently see, minus the cell contents. A redraw is
/// due whenever it changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub cursor: Pos,
    pub outcome: Outcome,
    pub revealed: usize,
    pub flags: usize,
}

/// One game: the board, the cursor and the outcome, plus the generator the
/// mines will be drawn from. Seeded once and never reseeded.
#[derive(Debug, Clone)]
pub struct GameSession {
    difficulty: Difficulty,
    seed: u32,
    board: Board,
    cursor: Pos,
    outcome: Outcome,
    rng: ChaCha8Rng,
}

impl GameSession {
    pub fn new(
        difficulty: Difficulty,
        seed: u32,
        safe_zone: SafeZone,
    ) -> Result<Self, ParamsError> {
        let board = Board::new(difficulty.params(), safe_zone)?;
        info!(
            "New {} game: {}x{} with {} mines (seed {:#010x})",
            difficulty,
            board.rows(),
            board.cols(),
            board.mine_count(),
            seed
        );
        Ok(Self::from_board(difficulty, seed, board))
    }

    /// Plays on a prepared board, e.g. one built with [`Board::from_layout`].
    pub fn from_board(difficulty: Difficulty, seed: u32, board: Board) -> Self {
        Self {
            difficulty,
            seed,
            board,
            cursor: Pos::default(),
            outcome: Outcome::Running,
            rng: ChaCha8Rng::seed_from_u64(u64::from(seed)),
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn cursor(&self) -> Pos {
        self.cursor
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn signature(&self) -> Signature {
        Signature {
            cursor: self.cursor,
            outcome: self.outcome,
            revealed: self.board.revealed_count(),
            flags: self.board.flag_count(),
        }
    }

    /// Moves the cursor one cell, stopping at the edges. Returns whether it moved.
    pub fn step(&mut self, direction: Direction) -> bool {
        let (dr, dc) = direction.delta();
        let row = self
            .cursor
            .row
            .saturating_add_signed(dr)
            .min(self.board.rows() - 1);
        let col = self
            .cursor
            .col
            .saturating_add_signed(dc)
            .min(self.board.cols() - 1);
        let moved = Pos::new(row, col) != self.cursor;
        self.cursor = Pos::new(row, col);
        moved
    }

    #[instrument(level = "trace", skip(self), fields(cursor = %self.cursor))]
    pub fn reveal(&mut self) -> RevealReport {
        if self.outcome.is_finished() {
            debug!("Ignoring reveal on finished game");
            return RevealReport {
                opened: Vec::new(),
                outcome: self.outcome,
            };
        }

        let report = reveal::reveal(&mut self.board, self.cursor, &mut self.rng);
        self.outcome = report.outcome;
        report
    }

    #[instrument(level = "trace", skip(self), fields(cursor = %self.cursor))]
    pub fn toggle_flag(&mut self) -> Option<CellState> {
        if self.outcome.is_finished() {
            debug!("Ignoring flag on finished game");
            return None;
        }
        reveal::toggle_flag(&mut self.board, self.cursor)
    }

    pub fn frame(&self) -> Frame {
        Frame {
            difficulty: self.difficulty,
            rows: self.board.rows(),
            cols: self.board.cols(),
            mines: self.board.mine_count(),
            mines_remaining: self.board.mines_remaining(),
            cursor: self.cursor,
            outcome: self.outcome,
            field: self.board.field(),
        }
    }
}
