#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! PCA9685 16-channel PWM controller driver (transport-agnostic).
//!
//! All bus traffic goes through the `pca_traits::Bus` trait and all waits
//! through `pca_traits::Delay`, so the same driver runs against real I²C or
//! the simulated chip in `pca_hardware`.
//!
//! ## Architecture
//!
//! - **Registers**: register map, MODE bits, prescaler math (`registers`)
//! - **Codec**: register and channel-block transactions, last-error tracking (`codec`)
//! - **Phase**: phase window computation and decoding, balancing (`phase`)
//! - **Device**: the `Pca9685` controller and its builder (`device`)
//! - **Servo**: angle/speed to duty curves (`servo`)
//! - **Setup**: bring-up from a `pca_config::Config` (`setup`, `conversions`)
//!
//! ## Duty values
//!
//! Duties are 12-bit (0..=4095) with 4096 meaning fully on. Writing 0 turns a
//! channel fully off.

pub mod codec;
pub mod config;
pub mod conversions;
pub mod device;
pub mod error;
pub mod mocks;
pub mod phase;
pub mod registers;
pub mod servo;
pub mod setup;

pub use config::{
    DeviceConfig, DisabledMode, DriverMode, EnabledMode, PhaseBalancer, PhaseByteOrder,
    UpdateMode,
};
pub use device::{
    Addressing, LED_FREQUENCY_HZ, Pca9685, Pca9685Builder, RegisterSnapshot, SERVO_FREQUENCY_HZ,
    SubAddress,
};
pub use error::{ConfigError, PcaError, Result};
pub use phase::{CHANNEL_COUNT, ChannelTarget, PWM_FULL, PhaseWindow, compute_phase_window};
pub use servo::{ServoCurve, ServoEval};
pub use setup::{ServoMap, build_controller};
