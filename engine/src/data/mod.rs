use dtekv_common::models::{self, GameParams, MAX_COLS, MAX_ROWS, Pos};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Adjacency value stored in mine cells. Never shown as a number.
pub const MINE_SENTINEL: u8 = u8::MAX;

const NEIGHBOURS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CellState {
    #[default]
    Hidden,
    Revealed,
    Flagged,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cell {
    pub is_mine: bool,
    pub adjacent: u8,
    pub state: CellState,
}

/// Region kept free of mines around the first revealed cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafeZone {
    /// Only the revealed cell itself.
    Cell,
    /// The revealed cell and its Moore neighbourhood, so the first reveal
    /// always opens a cascade.
    #[default]
    Neighbourhood,
}

impl SafeZone {
    pub fn contains(self, safe: Pos, pos: Pos) -> bool {
        match self {
            SafeZone::Cell => safe == pos,
            SafeZone::Neighbourhood => {
                safe.row.abs_diff(pos.row) <= 1 && safe.col.abs_diff(pos.col) <= 1
            }
        }
    }

    /// Largest number of cells this zone can cover on a `rows` x `cols` grid.
    pub fn max_excluded(self, rows: usize, cols: usize) -> usize {
        match self {
            SafeZone::Cell => 1,
            SafeZone::Neighbourhood => rows.min(3) * cols.min(3),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamsError {
    #[error("grid must have at least one row and column")]
    EmptyGrid,
    #[error(
        "grid {rows}x{cols} exceeds the {max_rows}x{max_cols} framebuffer capacity",
        max_rows = MAX_ROWS,
        max_cols = MAX_COLS
    )]
    GridTooLarge { rows: usize, cols: usize },
    #[error("{mines} mines need more than the {placeable} cells outside the safe zone")]
    TooManyMines { mines: usize, placeable: usize },
    #[error("mine at {0} lies outside the grid")]
    MineOutOfBounds(Pos),
}

fn check_dimensions(rows: usize, cols: usize) -> Result<(), ParamsError> {
    if rows == 0 || cols == 0 {
        return Err(ParamsError::EmptyGrid);
    }
    if rows > MAX_ROWS || cols > MAX_COLS {
        return Err(ParamsError::GridTooLarge { rows, cols });
    }
    Ok(())
}

/// Rejects parameters whose mine count could leave placement without a free cell.
pub fn validate_params(params: &GameParams, zone: SafeZone) -> Result<(), ParamsError> {
    check_dimensions(params.rows, params.cols)?;

    let placeable = params.cells() - zone.max_excluded(params.rows, params.cols);
    if params.mines != 0 && params.mines >= placeable {
        return Err(ParamsError::TooManyMines {
            mines: params.mines,
            placeable,
        });
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct Board {
    pub(crate) rows: usize,
    pub(crate) cols: usize,
    pub(crate) mines: usize,
    pub(crate) revealed: usize,
    pub(crate) flags: usize,
    pub(crate) first_move: bool,
    pub(crate) safe_zone: SafeZone,
    pub(crate) detonated: Option<Pos>,
    pub(crate) cells: Vec<Cell>,
}

impl Board {
    /// An empty board. Mines are laid out on the first reveal.
    pub fn new(params: GameParams, safe_zone: SafeZone) -> Result<Self, ParamsError> {
        validate_params(&params, safe_zone)?;
        Ok(Self {
            rows: params.rows,
            cols: params.cols,
            mines: params.mines,
            revealed: 0,
            flags: 0,
            first_move: true,
            safe_zone,
            detonated: None,
            cells: vec![Cell::default(); params.cells()],
        })
    }

    /// A board with a fixed mine layout, ready to play without placement.
    pub fn from_layout(rows: usize, cols: usize, mines: &[Pos]) -> Result<Self, ParamsError> {
        check_dimensions(rows, cols)?;

        let mut board = Self {
            rows,
            cols,
            mines: 0,
            revealed: 0,
            flags: 0,
            first_move: false,
            safe_zone: SafeZone::Cell,
            detonated: None,
            cells: vec![Cell::default(); rows * cols],
        };

        for &pos in mines {
            let index = board.index(pos).ok_or(ParamsError::MineOutOfBounds(pos))?;
            if !board.cells[index].is_mine {
                board.cells[index].is_mine = true;
                board.mines += 1;
            }
        }
        crate::logic::placement::compute_adjacency(&mut board);

        Ok(board)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn mine_count(&self) -> usize {
        self.mines
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed
    }

    pub fn flag_count(&self) -> usize {
        self.flags
    }

    pub fn is_first_move(&self) -> bool {
        self.first_move
    }

    pub fn safe_zone(&self) -> SafeZone {
        self.safe_zone
    }

    /// The mine that ended the game, if one was hit.
    pub fn detonated(&self) -> Option<Pos> {
        self.detonated
    }

    pub fn total_cells(&self) -> usize {
        self.rows * self.cols
    }

    pub fn safe_cells(&self) -> usize {
        self.total_cells() - self.mines
    }

    /// Mines minus flags, floored at zero for the on-screen counter.
    pub fn mines_remaining(&self) -> usize {
        self.mines.saturating_sub(self.flags)
    }

    pub fn contains(&self, pos: Pos) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    pub(crate) fn index(&self, pos: Pos) -> Option<usize> {
        self.contains(pos).then(|| pos.row * self.cols + pos.col)
    }

    pub fn get(&self, pos: Pos) -> Option<&Cell> {
        self.index(pos).map(|index| &self.cells[index])
    }

    pub fn positions(&self) -> impl Iterator<Item = Pos> + use<> {
        let cols = self.cols;
        (0..self.total_cells()).map(move |index| Pos::new(index / cols, index % cols))
    }

    /// In-bounds members of the Moore neighbourhood of `pos`.
    pub fn neighbours(&self, pos: Pos) -> impl Iterator<Item = Pos> + use<> {
        let (rows, cols) = (self.rows, self.cols);
        NEIGHBOURS.iter().filter_map(move |&(dr, dc)| {
            let row = pos.row.checked_add_signed(dr)?;
            let col = pos.col.checked_add_signed(dc)?;
            (row < rows && col < cols).then_some(Pos::new(row, col))
        })
    }

    pub fn mine_positions(&self) -> impl Iterator<Item = Pos> + '_ {
        self.positions()
            .zip(self.cells.iter())
            .filter(|(_, cell)| cell.is_mine)
            .map(|(pos, _)| pos)
    }

    pub fn view(&self, pos: Pos) -> Option<models::Cell> {
        let cell = self.get(pos)?;
        Some(match cell.state {
            CellState::Hidden => models::Cell::Hidden,
            CellState::Flagged => models::Cell::Flagged,
            CellState::Revealed if cell.is_mine => models::Cell::Mine {
                exploded: self.detonated == Some(pos),
            },
            CellState::Revealed => models::Cell::Revealed {
                adjacent: cell.adjacent,
            },
        })
    }

    /// Row-major snapshot of what the player can see.
    pub fn field(&self) -> Vec<Vec<models::Cell>> {
        self.positions()
            .filter_map(|pos| self.view(pos))
            .collect::<Vec<_>>()
            .chunks(self.cols)
            .map(|chunk| chunk.to_vec())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use dtekv_common::models::Difficulty;

    use super::*;

    #[test]
    fn presets_validate_under_every_safe_zone() {
        for difficulty in Difficulty::ALL {
            for zone in [SafeZone::Cell, SafeZone::Neighbourhood] {
                assert_eq!(validate_params(&difficulty.params(), zone), Ok(()));
            }
        }
    }

    #[test]
    fn rejects_grids_outside_capacity() {
        assert_eq!(
            validate_params(&GameParams::new(0, 5, 1), SafeZone::Cell),
            Err(ParamsError::EmptyGrid)
        );
        assert_eq!(
            validate_params(&GameParams::new(21, 5, 1), SafeZone::Cell),
            Err(ParamsError::GridTooLarge { rows: 21, cols: 5 })
        );
    }

    #[test]
    fn mine_count_must_leave_room_outside_the_safe_zone() {
        // 4x4 leaves 16 - 9 = 7 placeable cells around a central first reveal.
        assert!(validate_params(&GameParams::new(4, 4, 6), SafeZone::Neighbourhood).is_ok());
        assert_eq!(
            validate_params(&GameParams::new(4, 4, 7), SafeZone::Neighbourhood),
            Err(ParamsError::TooManyMines {
                mines: 7,
                placeable: 7
            })
        );
        assert!(validate_params(&GameParams::new(4, 4, 14), SafeZone::Cell).is_ok());
    }

    #[test]
    fn errors_describe_the_rejected_parameters() {
        let errors: [(ParamsError, &str); 3] = [
            (
                ParamsError::GridTooLarge { rows: 21, cols: 5 },
                "grid 21x5 exceeds the 20x26 framebuffer capacity",
            ),
            (
                ParamsError::TooManyMines {
                    mines: 7,
                    placeable: 7,
                },
                "7 mines need more than the 7 cells outside the safe zone",
            ),
            (
                ParamsError::MineOutOfBounds(Pos::new(2, 0)),
                "mine at (2, 0) lies outside the grid",
            ),
        ];
        for (error, message) in errors {
            assert_eq!(error.to_string(), message);
        }

        let boxed: Box<dyn std::error::Error + Send + Sync> = Box::new(ParamsError::EmptyGrid);
        assert_eq!(boxed.to_string(), "grid must have at least one row and column");
    }

    #[test]
    fn new_board_defers_mines() {
        let board = Board::new(Difficulty::Easy.params(), SafeZone::default()).unwrap();
        assert!(board.is_first_move());
        assert_eq!(board.mine_positions().count(), 0);
        assert_eq!(board.mine_count(), 10);
        assert_eq!(board.revealed_count(), 0);
    }

    #[test]
    fn neighbours_are_clipped_at_edges() {
        let board = Board::from_layout(3, 4, &[]).unwrap();
        assert_eq!(board.neighbours(Pos::new(0, 0)).count(), 3);
        assert_eq!(board.neighbours(Pos::new(0, 1)).count(), 5);
        assert_eq!(board.neighbours(Pos::new(1, 1)).count(), 8);
        assert_eq!(board.neighbours(Pos::new(2, 3)).count(), 3);
    }

    #[test]
    fn layout_rejects_mines_off_the_grid() {
        assert_eq!(
            Board::from_layout(2, 2, &[Pos::new(2, 0)]).unwrap_err(),
            ParamsError::MineOutOfBounds(Pos::new(2, 0))
        );
    }

    #[test]
    fn field_is_row_major_and_hides_everything_initially() {
        let board = Board::from_layout(2, 3, &[Pos::new(1, 2)]).unwrap();
        let field = board.field();
        assert_eq!(field.len(), 2);
        assert!(field.iter().all(|row| row.len() == 3));
        assert!(field.iter().flatten().all(|cell| *cell == models::Cell::Hidden));
    }
}
