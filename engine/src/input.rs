//! Turns raw switch and key words into one discrete action per tick.

use dtekv_common::{models::Direction, switches::SwitchBitMap};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Up,
    Down,
    Left,
    Right,
    ToggleFlag,
    Reveal,
    /// Confirm pressed with no action switch raised.
    Confirm,
}

impl Action {
    pub const fn direction(self) -> Option<Direction> {
        match self {
            Action::Up => Some(Direction::Up),
            Action::Down => Some(Direction::Down),
            Action::Left => Some(Direction::Left),
            Action::Right => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Edge detector for the confirm key.
///
/// An action fires only on the tick where the confirm key goes from
/// released to pressed; the switches are read at that instant to decide
/// which action it is. Holding the key never repeats.
#[derive(Debug, Clone)]
pub struct InputSampler {
    map: SwitchBitMap,
    previous_switches: u32,
    previous_keys: u32,
}

impl InputSampler {
    pub fn new(map: SwitchBitMap) -> Self {
        let mut sampler = Self {
            map,
            previous_switches: 0,
            previous_keys: 0,
        };
        sampler.reset();
        sampler
    }

    /// Forgets past input. A confirm key that is already held down must be
    /// released before it can fire again.
    pub fn reset(&mut self) {
        self.previous_switches = self.map.switch_polarity.idle_word();
        self.previous_keys =
            self.map
                .key_polarity
                .drive(self.map.key_polarity.idle_word(), self.map.confirm_key, true);
    }

    pub fn map(&self) -> &SwitchBitMap {
        &self.map
    }

    pub fn previous_switches(&self) -> u32 {
        self.previous_switches
    }

    pub fn previous_keys(&self) -> u32 {
        self.previous_keys
    }

    pub fn sample(&mut self, switches: u32, keys: u32) -> Action {
        let was_pressed = self.map.confirm_pressed(self.previous_keys);
        let is_pressed = self.map.confirm_pressed(keys);

        let action = if is_pressed && !was_pressed {
            self.decode(switches)
        } else {
            Action::None
        };

        self.previous_switches = switches;
        self.previous_keys = keys;

        if action != Action::None {
            trace!("Confirm edge with switches {:#06x} -> {:?}", switches, action);
        }
        action
    }

    fn decode(&self, switches: u32) -> Action {
        let map = &self.map;
        [
            (map.up, Action::Up),
            (map.down, Action::Down),
            (map.left, Action::Left),
            (map.right, Action::Right),
            (map.flag, Action::ToggleFlag),
            (map.reveal, Action::Reveal),
        ]
        .into_iter()
        .find(|&(bit, _)| map.switch_on(switches, bit))
        .map_or(Action::Confirm, |(_, action)| action)
    }
}
