use pca_traits::BusError;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("open-drain outputs cannot drive the disabled state high")]
    OpenDrainHigh,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PcaError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("bus error: {0}")]
    Bus(#[from] BusError),
}

impl PcaError {
    /// Transport status code, when the error came from the bus.
    pub fn bus_code(&self) -> Option<u8> {
        match self {
            PcaError::Bus(e) => Some(e.code()),
            PcaError::Config(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PcaError>;
pub use eyre::Report;
