//! Bit assignments for the board's slide switches and push keys.
//!
//! The drafts for the board disagreed on which switch does what and on
//! whether a set bit means "on" or "pressed". Both are configuration here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Difficulty;

/// Width of the switch and key registers.
pub const REGISTER_BITS: u8 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SwitchMapError {
    #[error("{name} bit {bit} is outside the {width}-bit register", width = REGISTER_BITS)]
    BitOutOfRange { name: &'static str, bit: u8 },
}

/// Mask for `bit`, empty when the bit is past the register.
#[inline]
const fn mask(bit: u8) -> u32 {
    match 1u32.checked_shl(bit as u32) {
        Some(mask) => mask,
        None => 0,
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// A set bit means the input is asserted.
    #[default]
    ActiveHigh,
    /// A cleared bit means the input is asserted (pull-up keys).
    ActiveLow,
}

impl Polarity {
    #[inline]
    pub const fn is_asserted(self, word: u32, bit: u8) -> bool {
        let mask = mask(bit);
        if mask == 0 {
            return false;
        }
        let set = word & mask != 0;
        match self {
            Polarity::ActiveHigh => set,
            Polarity::ActiveLow => !set,
        }
    }

    /// Returns `word` with `bit` driven to the asserted or released level.
    #[inline]
    pub const fn drive(self, word: u32, bit: u8, asserted: bool) -> u32 {
        let set = match self {
            Polarity::ActiveHigh => asserted,
            Polarity::ActiveLow => !asserted,
        };
        if set { word | mask(bit) } else { word & !mask(bit) }
    }

    /// A word with every input released.
    #[inline]
    pub const fn idle_word(self) -> u32 {
        match self {
            Polarity::ActiveHigh => 0,
            Polarity::ActiveLow => u32::MAX,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchBitMap {
    pub easy: u8,
    pub medium: u8,
    pub hard: u8,
    pub up: u8,
    pub down: u8,
    pub left: u8,
    pub right: u8,
    pub flag: u8,
    pub reveal: u8,
    pub confirm_key: u8,
    pub switch_polarity: Polarity,
    pub key_polarity: Polarity,
}

impl Default for SwitchBitMap {
    fn default() -> Self {
        Self {
            easy: 1,
            medium: 2,
            hard: 3,
            up: 4,
            down: 5,
            right: 6,
            left: 7,
            flag: 8,
            reveal: 9,
            confirm_key: 0,
            switch_polarity: Polarity::ActiveHigh,
            key_polarity: Polarity::ActiveLow,
        }
    }
}

impl SwitchBitMap {
    /// Checks that every assignment names a bit of the 32-bit registers.
    pub fn validate(&self) -> Result<(), SwitchMapError> {
        let out_of_range = [
            ("easy", self.easy),
            ("medium", self.medium),
            ("hard", self.hard),
            ("up", self.up),
            ("down", self.down),
            ("left", self.left),
            ("right", self.right),
            ("flag", self.flag),
            ("reveal", self.reveal),
            ("confirm_key", self.confirm_key),
        ]
        .into_iter()
        .find(|&(_, bit)| bit >= REGISTER_BITS);

        match out_of_range {
            Some((name, bit)) => Err(SwitchMapError::BitOutOfRange { name, bit }),
            None => Ok(()),
        }
    }

    #[inline]
    pub const fn switch_on(&self, switches: u32, bit: u8) -> bool {
        self.switch_polarity.is_asserted(switches, bit)
    }

    #[inline]
    pub const fn confirm_pressed(&self, keys: u32) -> bool {
        self.key_polarity.is_asserted(keys, self.confirm_key)
    }

    /// First raised difficulty switch, checked easy, medium, hard.
    pub fn select_difficulty(&self, switches: u32) -> Option<Difficulty> {
        [
            (self.easy, Difficulty::Easy),
            (self.medium, Difficulty::Medium),
            (self.hard, Difficulty::Hard),
        ]
        .into_iter()
        .find(|&(bit, _)| self.switch_on(switches, bit))
        .map(|(_, difficulty)| difficulty)
    }
}
