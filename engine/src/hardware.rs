//! Memory-mapped inputs of the DTEK-V board.

use core::{hint, ptr};

use crate::controller::HardwareIo;

pub const SWITCH_BASE: usize = 0x0400_0010;
pub const KEY_BASE: usize = 0x0400_00d0;
pub const TIMER_BASE: usize = 0x0400_0020;

/// Reads switches, keys and the timer straight from their registers.
pub struct MmioIo {
    switches: *const u32,
    keys: *const u32,
    timer: *const u32,
    tick_delay: u32,
}

impl MmioIo {
    /// # Safety
    ///
    /// Each pointer must stay valid for volatile 32-bit reads for as long as
    /// the returned value is used.
    pub const unsafe fn new(
        switches: *const u32,
        keys: *const u32,
        timer: *const u32,
        tick_delay: u32,
    ) -> Self {
        Self {
            switches,
            keys,
            timer,
            tick_delay,
        }
    }

    /// # Safety
    ///
    /// Only sound when running on the board itself, where the input
    /// registers are mapped at their fixed addresses.
    pub const unsafe fn dtekv(tick_delay: u32) -> Self {
        // SAFETY: forwarded to the caller.
        unsafe {
            Self::new(
                SWITCH_BASE as *const u32,
                KEY_BASE as *const u32,
                TIMER_BASE as *const u32,
                tick_delay,
            )
        }
    }
}

impl HardwareIo for MmioIo {
    #[inline]
    fn read_switches(&mut self) -> u32 {
        // SAFETY: validity guaranteed by the constructor contract.
        unsafe { ptr::read_volatile(self.switches) }
    }

    #[inline]
    fn read_keys(&mut self) -> u32 {
        // SAFETY: validity guaranteed by the constructor contract.
        unsafe { ptr::read_volatile(self.keys) }
    }

    fn seed(&mut self) -> u32 {
        // SAFETY: validity guaranteed by the constructor contract.
        unsafe { ptr::read_volatile(self.timer) }
    }

    fn wait_tick(&mut self) {
        for _ in 0..self.tick_delay {
            hint::spin_loop();
        }
    }
}
