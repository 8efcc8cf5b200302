//! Device configuration types for the driver.
//!
//! These are the runtime configuration types used by `Pca9685`.
//! They are separate from the TOML-deserialized config in `pca_config`.

use crate::error::ConfigError;
use crate::registers::mode2;

/// Output driver structure (MODE2.OUTDRV).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriverMode {
    /// Outputs can only sink current; use with external pull-ups.
    OpenDrain,
    #[default]
    TotemPole,
}

/// Output logic state while outputs are enabled (MODE2.INVRT).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnabledMode {
    #[default]
    Normal,
    Inverted,
}

/// Output state while the OE pin disables outputs (MODE2.OUTNE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisabledMode {
    #[default]
    Low,
    /// Not available with open-drain outputs.
    High,
    Floating,
}

/// When new channel values take effect (MODE2.OCH).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateMode {
    /// On the bus STOP condition.
    #[default]
    AfterStop,
    /// On each byte ACK.
    AfterAck,
}

/// How channel on-times are spread across the 4096-tick cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhaseBalancer {
    /// Every channel turns on at tick 0.
    #[default]
    None,
    /// Channel `n` is centred around tick `n * 256`.
    Linear,
    /// Not implemented; behaves like `None`.
    Dynamic,
}

/// Wire order of the begin/end halves of a channel register block.
///
/// A few clone boards have the two halves swapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhaseByteOrder {
    #[default]
    BeginEnd,
    EndBegin,
}

/// Output and timing configuration applied by `Pca9685::init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceConfig {
    pub driver_mode: DriverMode,
    pub enabled_mode: EnabledMode,
    pub disabled_mode: DisabledMode,
    pub update_mode: UpdateMode,
    pub phase_balancer: PhaseBalancer,
}

impl DeviceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.driver_mode == DriverMode::OpenDrain && self.disabled_mode == DisabledMode::High {
            return Err(ConfigError::OpenDrainHigh);
        }
        Ok(())
    }

    /// MODE2 register value for this configuration.
    pub fn mode2_value(&self) -> u8 {
        let mut value = 0u8;
        if self.driver_mode == DriverMode::TotemPole {
            value |= mode2::OUTDRV_TPOLE;
        }
        if self.enabled_mode == EnabledMode::Inverted {
            value |= mode2::INVRT;
        }
        match self.disabled_mode {
            DisabledMode::Low => {}
            DisabledMode::High => value |= mode2::OUTNE_TPHIGH,
            DisabledMode::Floating => value |= mode2::OUTNE_HIGHZ,
        }
        if self.update_mode == UpdateMode::AfterAck {
            value |= mode2::OCH_ONACK;
        }
        value
    }

    pub fn with_phase_balancer(mut self, phase_balancer: PhaseBalancer) -> Self {
        self.phase_balancer = phase_balancer;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_totem_pole_only() {
        assert_eq!(DeviceConfig::default().mode2_value(), 0x04);
    }

    #[test]
    fn every_flag_maps_to_its_bit() {
        let cfg = DeviceConfig {
            driver_mode: DriverMode::TotemPole,
            enabled_mode: EnabledMode::Inverted,
            disabled_mode: DisabledMode::High,
            update_mode: UpdateMode::AfterAck,
            phase_balancer: PhaseBalancer::Linear,
        };
        assert_eq!(cfg.mode2_value(), 0x04 | 0x10 | 0x01 | 0x08);

        let floating = DeviceConfig {
            driver_mode: DriverMode::OpenDrain,
            disabled_mode: DisabledMode::Floating,
            ..DeviceConfig::default()
        };
        assert_eq!(floating.mode2_value(), 0x02);
    }

    #[test]
    fn open_drain_cannot_idle_high() {
        let cfg = DeviceConfig {
            driver_mode: DriverMode::OpenDrain,
            disabled_mode: DisabledMode::High,
            ..DeviceConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::OpenDrainHigh));
    }
}
