use std::fmt;

use serde::{Deserialize, Serialize};

/// Widest grid that fits the 320 pixel framebuffer with 12 pixel cells.
pub const MAX_COLS: usize = 26;
/// Tallest grid that fits the 240 pixel framebuffer with 12 pixel cells.
pub const MAX_ROWS: usize = 20;

/// What a player is allowed to see of a single cell.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "state")]
pub enum Cell {
    #[serde(rename = "hidden")]
    Hidden,
    #[serde(rename = "flagged")]
    Flagged,
    #[serde(rename = "revealed")]
    Revealed { adjacent: u8 },
    #[serde(rename = "mine")]
    Mine { exploded: bool },
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

impl Pos {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Row and column step for one move.
    pub const fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Board dimensions and mine count for this preset.
    pub const fn params(self) -> GameParams {
        match self {
            Difficulty::Easy => GameParams::new(8, 8, 10),
            Difficulty::Medium => GameParams::new(12, 12, 20),
            Difficulty::Hard => GameParams::new(16, 16, 40),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GameParams {
    pub rows: usize,
    pub cols: usize,
    pub mines: usize,
}

impl GameParams {
    pub const fn new(rows: usize, cols: usize, mines: usize) -> Self {
        Self { rows, cols, mines }
    }

    pub const fn cells(&self) -> usize {
        self.rows * self.cols
    }
}

impl Default for GameParams {
    fn default() -> Self {
        Difficulty::Easy.params()
    }
}

/// Progress of a single game. Moves forward only: `Running` to `Lost` or `Won`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    #[default]
    Running,
    Lost,
    Won,
}

impl Outcome {
    pub const fn is_finished(self) -> bool {
        !matches!(self, Outcome::Running)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateRequest {
    pub difficulty: Difficulty,
    /// Pins the mine layout; the server picks a random seed when absent.
    pub seed: Option<u32>,
}

#[derive(Serialize, Deserialize)]
pub struct CreateResponse {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_fit_the_framebuffer() {
        for difficulty in Difficulty::ALL {
            let params = difficulty.params();
            assert!(params.rows <= MAX_ROWS, "{difficulty} has too many rows");
            assert!(params.cols <= MAX_COLS, "{difficulty} has too many columns");
            assert!(params.mines < params.cells());
        }
    }

    #[test]
    fn cell_views_are_tagged_by_state() {
        let json = serde_json::to_string(&Cell::Revealed { adjacent: 3 }).unwrap();
        assert_eq!(json, r#"{"state":"revealed","adjacent":3}"#);

        let mine: Cell = serde_json::from_str(r#"{"state":"mine","exploded":true}"#).unwrap();
        assert_eq!(mine, Cell::Mine { exploded: true });
    }

    #[test]
    fn create_request_defaults_to_easy_without_seed() {
        let request: CreateRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.difficulty, Difficulty::Easy);
        assert_eq!(request.seed, None);
    }
}
