use std::collections::VecDeque;

use dtekv_common::models::{Outcome, Pos};
use rand::Rng;
use tracing::{debug, info, instrument};

use super::placement::{compute_adjacency, place_mines};
use crate::data::{Board, CellState};

/// Cells changed by a reveal and the outcome it left the game in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevealReport {
    pub opened: Vec<Pos>,
    pub outcome: Outcome,
}

impl RevealReport {
    pub fn is_noop(&self) -> bool {
        self.opened.is_empty()
    }
}

fn sweep_mines(board: &mut Board, opened: &mut Vec<Pos>) {
    let cols = board.cols;
    for (index, cell) in board.cells.iter_mut().enumerate() {
        if !cell.is_mine || cell.state == CellState::Revealed {
            continue;
        }
        if cell.state == CellState::Flagged {
            board.flags -= 1;
        }
        cell.state = CellState::Revealed;
        board.revealed += 1;
        opened.push(Pos::new(index / cols, index % cols));
    }
}

/// Opens `target` and cascades breadth-first through zero-adjacency cells.
///
/// The first reveal of a game lays out the mines around `target` before
/// anything is opened. Out-of-bounds, revealed and flagged targets are
/// ignored. Hitting a mine sweeps every mine open and stops the cascade.
#[instrument(level = "trace", skip(board, rng), fields(target = %target))]
pub fn reveal<R: Rng>(board: &mut Board, target: Pos, rng: &mut R) -> RevealReport {
    let Some(cell) = board.get(target) else {
        debug!("Ignoring reveal outside the grid");
        return RevealReport::default();
    };
    if cell.state != CellState::Hidden {
        debug!("Ignoring reveal on {:?} cell", cell.state);
        return RevealReport::default();
    }

    if board.first_move {
        place_mines(board, target, rng);
        compute_adjacency(board);
        board.first_move = false;
    }

    let total = board.total_cells();
    let cols = board.cols;
    let mut queued = vec![false; total];
    let mut worklist = VecDeque::with_capacity(total);
    let mut opened = Vec::new();

    queued[target.row * cols + target.col] = true;
    worklist.push_back(target);

    while let Some(pos) = worklist.pop_front() {
        let Some(index) = board.index(pos) else {
            continue;
        };
        let cell = &mut board.cells[index];
        if cell.state != CellState::Hidden {
            continue;
        }
        cell.state = CellState::Revealed;
        let (is_mine, adjacent) = (cell.is_mine, cell.adjacent);
        board.revealed += 1;
        opened.push(pos);

        if is_mine {
            board.detonated = Some(pos);
            sweep_mines(board, &mut opened);
            info!("Mine hit at {} - game over", pos);
            return RevealReport {
                opened,
                outcome: Outcome::Lost,
            };
        }

        if adjacent == 0 {
            for next in board.neighbours(pos) {
                let next_index = next.row * cols + next.col;
                if !queued[next_index] && board.cells[next_index].state == CellState::Hidden {
                    queued[next_index] = true;
                    worklist.push_back(next);
                }
            }
        }
    }

    let outcome = if board.revealed == board.safe_cells() {
        info!("All {} safe cells revealed - game won", board.safe_cells());
        Outcome::Won
    } else {
        debug!("Revealed {} cells, game continues", opened.len());
        Outcome::Running
    };

    RevealReport { opened, outcome }
}

/// Flips a hidden cell to flagged and back. Returns the new state, or
/// `None` when the cell is revealed or off the grid.
pub fn toggle_flag(board: &mut Board, pos: Pos) -> Option<CellState> {
    let index = board.index(pos)?;
    let cell = &mut board.cells[index];
    match cell.state {
        CellState::Hidden => {
            cell.state = CellState::Flagged;
            board.flags += 1;
        }
        CellState::Flagged => {
            cell.state = CellState::Hidden;
            board.flags -= 1;
        }
        CellState::Revealed => {
            debug!("Ignoring flag on revealed cell {}", pos);
            return None;
        }
    }
    Some(cell.state)
}
