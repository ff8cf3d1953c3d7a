use dtekv_common::models::Pos;
use rand::Rng;
use tracing::{debug, instrument};

use crate::data::{Board, MINE_SENTINEL};

/// Scatters the board's mines by rejection sampling, keeping the safe zone
/// around `safe` clear. Any previous layout is discarded.
#[instrument(level = "trace", skip(board, rng), fields(safe = %safe))]
pub fn place_mines<R: Rng>(board: &mut Board, safe: Pos, rng: &mut R) {
    let zone = board.safe_zone;
    let excluded = board
        .positions()
        .filter(|&pos| zone.contains(safe, pos))
        .count();
    debug_assert!(
        board.mines == 0 || board.mines < board.total_cells() - excluded,
        "{} mines cannot be placed around {}",
        board.mines,
        safe
    );

    for cell in &mut board.cells {
        cell.is_mine = false;
    }

    let mut placed = 0;
    let mut draws = 0usize;
    while placed < board.mines {
        draws += 1;
        let pos = Pos::new(
            rng.random_range(0..board.rows),
            rng.random_range(0..board.cols),
        );
        if zone.contains(safe, pos) {
            continue;
        }

        let cell = &mut board.cells[pos.row * board.cols + pos.col];
        if cell.is_mine {
            continue;
        }
        cell.is_mine = true;
        placed += 1;
    }

    debug!("Placed {} mines in {} draws", placed, draws);
}

/// Recounts the mines around every cell. Mine cells get [`MINE_SENTINEL`].
pub fn compute_adjacency(board: &mut Board) {
    let counts: Vec<u8> = board
        .positions()
        .map(|pos| {
            if board.cells[pos.row * board.cols + pos.col].is_mine {
                return MINE_SENTINEL;
            }
            board
                .neighbours(pos)
                .filter(|n| board.cells[n.row * board.cols + n.col].is_mine)
                .count() as u8
        })
        .collect();

    for (cell, adjacent) in board.cells.iter_mut().zip(counts) {
        cell.adjacent = adjacent;
    }
}
