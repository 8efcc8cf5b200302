//! `From` implementations bridging `pca_config` types to `pca_core` types.

use crate::config::{
    DeviceConfig, DisabledMode, DriverMode, EnabledMode, PhaseBalancer, PhaseByteOrder,
    UpdateMode,
};
use crate::servo::ServoEval;

// ── output modes ─────────────────────────────────────────────────────────────

impl From<pca_config::DriverMode> for DriverMode {
    fn from(m: pca_config::DriverMode) -> Self {
        match m {
            pca_config::DriverMode::OpenDrain => Self::OpenDrain,
            pca_config::DriverMode::TotemPole => Self::TotemPole,
        }
    }
}

impl From<pca_config::EnabledMode> for EnabledMode {
    fn from(m: pca_config::EnabledMode) -> Self {
        match m {
            pca_config::EnabledMode::Normal => Self::Normal,
            pca_config::EnabledMode::Inverted => Self::Inverted,
        }
    }
}

impl From<pca_config::DisabledMode> for DisabledMode {
    fn from(m: pca_config::DisabledMode) -> Self {
        match m {
            pca_config::DisabledMode::Low => Self::Low,
            pca_config::DisabledMode::High => Self::High,
            pca_config::DisabledMode::Floating => Self::Floating,
        }
    }
}

impl From<pca_config::UpdateMode> for UpdateMode {
    fn from(m: pca_config::UpdateMode) -> Self {
        match m {
            pca_config::UpdateMode::AfterStop => Self::AfterStop,
            pca_config::UpdateMode::AfterAck => Self::AfterAck,
        }
    }
}

impl From<pca_config::PhaseBalancer> for PhaseBalancer {
    fn from(m: pca_config::PhaseBalancer) -> Self {
        match m {
            pca_config::PhaseBalancer::None => Self::None,
            pca_config::PhaseBalancer::Linear => Self::Linear,
            pca_config::PhaseBalancer::Dynamic => Self::Dynamic,
        }
    }
}

// ── DeviceConfig ─────────────────────────────────────────────────────────────

impl From<&pca_config::OutputCfg> for DeviceConfig {
    fn from(c: &pca_config::OutputCfg) -> Self {
        Self {
            driver_mode: c.driver_mode.into(),
            enabled_mode: c.enabled_mode.into(),
            disabled_mode: c.disabled_mode.into(),
            update_mode: c.update_mode.into(),
            phase_balancer: c.phase_balancer.into(),
        }
    }
}

impl From<&pca_config::DeviceCfg> for PhaseByteOrder {
    fn from(c: &pca_config::DeviceCfg) -> Self {
        if c.swap_phase_registers {
            Self::EndBegin
        } else {
            Self::BeginEnd
        }
    }
}

// ── ServoEval ────────────────────────────────────────────────────────────────

impl From<&pca_config::ServoCfg> for ServoEval {
    fn from(c: &pca_config::ServoCfg) -> Self {
        match c.mid {
            Some(mid) => Self::new(c.min, mid, c.max),
            None => Self::linear(c.min, c.max),
        }
    }
}

impl From<&pca_config::ServoCalibrationRow> for ServoEval {
    fn from(r: &pca_config::ServoCalibrationRow) -> Self {
        match r.mid {
            Some(mid) => Self::new(r.min, mid, r.max),
            None => Self::linear(r.min, r.max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_section_maps_every_field() {
        let cfg = pca_config::OutputCfg {
            driver_mode: pca_config::DriverMode::OpenDrain,
            enabled_mode: pca_config::EnabledMode::Inverted,
            disabled_mode: pca_config::DisabledMode::Floating,
            update_mode: pca_config::UpdateMode::AfterAck,
            phase_balancer: pca_config::PhaseBalancer::Linear,
        };
        let dc = DeviceConfig::from(&cfg);
        assert_eq!(dc.driver_mode, DriverMode::OpenDrain);
        assert_eq!(dc.enabled_mode, EnabledMode::Inverted);
        assert_eq!(dc.disabled_mode, DisabledMode::Floating);
        assert_eq!(dc.update_mode, UpdateMode::AfterAck);
        assert_eq!(dc.phase_balancer, PhaseBalancer::Linear);
    }

    #[test]
    fn swapped_registers_select_end_begin() {
        let dev = pca_config::DeviceCfg {
            swap_phase_registers: true,
            ..Default::default()
        };
        assert_eq!(PhaseByteOrder::from(&dev), PhaseByteOrder::EndBegin);
    }

    #[test]
    fn servo_without_mid_is_linear() {
        let s = ServoEval::from(&pca_config::ServoCfg {
            min: 102,
            mid: None,
            max: 512,
        });
        assert!(!s.is_spline());
    }
}
