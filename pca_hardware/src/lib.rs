//! Bus transports for the PCA9685 driver.
//!
//! - [`sim::SimulatedPca9685`]: register-accurate software model of the chip,
//!   usable wherever a real bus is not available.
//! - `i2c::I2cBus` (feature `hardware`, Linux): Linux I²C via `rppal`.
pub mod error;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod i2c;
pub mod sim;

pub use pca_traits::{Bus, BusError};
pub use sim::{SimulatedPca9685, Transaction};
