//! Test and helper mocks for pca_core

use pca_traits::{Bus, Delay};

/// A delay that returns immediately and tallies the requested time.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDelay {
    pub total_us: u64,
    pub calls: usize,
}

impl Delay for NoopDelay {
    fn delay_us(&mut self, us: u32) {
        self.total_us += u64::from(us);
        self.calls += 1;
    }
}

/// A bus with nothing attached: every address is NACKed and reads return
/// no data.
#[derive(Debug, Default, Clone, Copy)]
pub struct AbsentBus;

impl Bus for AbsentBus {
    fn begin_transmission(&mut self, _address: u8) {}

    fn write(&mut self, _byte: u8) -> usize {
        1
    }

    fn end_transmission(&mut self) -> u8 {
        2
    }

    fn request_from(&mut self, _address: u8, _len: usize) -> usize {
        0
    }

    fn read(&mut self) -> u8 {
        0
    }
}
