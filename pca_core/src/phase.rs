//! Phase window computation and decoding (datasheet section 7.3.3).
//!
//! A channel is high between `begin` and `end` within a 4096-tick cycle.
//! Bit 12 of either value is the full-on / full-off sentinel.

use crate::config::PhaseBalancer;

/// Full-scale duty and the full-on/full-off sentinel bit.
pub const PWM_FULL: u16 = 0x1000;
/// 12-bit phase position mask.
pub const PWM_MASK: u16 = 0x0FFF;
pub const CHANNEL_COUNT: u8 = 16;
/// Start offset between neighbouring channels under linear balancing.
pub const LINEAR_STEP: u16 = PWM_FULL / CHANNEL_COUNT as u16;

/// Channel register block addressed by a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelTarget {
    Channel(u8),
    /// The broadcast `ALL_LED` block.
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhaseWindow {
    pub begin: u16,
    pub end: u16,
}

impl PhaseWindow {
    pub const FULL_OFF: PhaseWindow = PhaseWindow {
        begin: 0,
        end: PWM_FULL,
    };
    pub const FULL_ON: PhaseWindow = PhaseWindow {
        begin: PWM_FULL,
        end: 0,
    };

    pub fn new(begin: u16, end: u16) -> Self {
        Self { begin, end }
    }

    /// Duty encoded by this window.
    ///
    /// Full off takes precedence over full on; a window whose end precedes
    /// its begin wraps across the cycle boundary. Reserved upper bits are
    /// ignored.
    pub fn duty(self) -> u16 {
        if self.end & PWM_FULL != 0 {
            return 0;
        }
        if self.begin & PWM_FULL != 0 {
            return PWM_FULL;
        }
        let (begin, end) = (self.begin & PWM_MASK, self.end & PWM_MASK);
        if begin <= end {
            end - begin
        } else {
            (end + PWM_FULL) - begin
        }
    }
}

/// Phase window for `duty` on `target` under the given balancing policy.
pub fn compute_phase_window(
    target: ChannelTarget,
    duty: u16,
    balancer: PhaseBalancer,
) -> PhaseWindow {
    if duty == 0 {
        return PhaseWindow::FULL_OFF;
    }
    if duty >= PWM_FULL {
        return PhaseWindow::FULL_ON;
    }
    let channel = match target {
        // The broadcast block never gets a shifted start.
        ChannelTarget::All => return PhaseWindow::new(0, duty & PWM_MASK),
        ChannelTarget::Channel(ch) => ch,
    };
    match balancer {
        PhaseBalancer::None | PhaseBalancer::Dynamic => PhaseWindow::new(0, duty & PWM_MASK),
        PhaseBalancer::Linear => {
            let centre = i32::from(channel) * i32::from(LINEAR_STEP);
            let begin = (centre - i32::from(duty >> 1)).max(0);
            let end = (begin + i32::from(duty)).min(i32::from(PWM_MASK));
            let begin = end - i32::from(duty);
            PhaseWindow::new(begin as u16, end as u16)
        }
    }
}
