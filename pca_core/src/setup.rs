//! Controller bring-up from a loaded `pca_config::Config`.

use eyre::WrapErr;
use pca_traits::{Bus, Delay};
use tracing::info;

use crate::config::{DeviceConfig, PhaseByteOrder};
use crate::device::{Pca9685, Pca9685Builder};
use crate::servo::ServoEval;

/// Build a controller from `cfg` and bring the chip up: `init` with the
/// `[output]` section, then program `[pwm] frequency_hz`. Proxy addressers
/// skip both, since the chips behind them are configured individually.
pub fn build_controller<B: Bus, D: Delay>(
    bus: B,
    delay: D,
    cfg: &pca_config::Config,
) -> eyre::Result<Pca9685<B, D>> {
    let mut dev = Pca9685Builder::new(bus)
        .address(cfg.device.address)
        .bus_speed_hz(cfg.device.speed_hz)
        .phase_byte_order(PhaseByteOrder::from(&cfg.device))
        .proxy(cfg.device.proxy)
        .delay(delay)
        .build();

    if dev.is_proxy_addresser() {
        info!(address = format_args!("{:#04x}", dev.address()), "proxy addresser ready");
        return Ok(dev);
    }

    dev.init(DeviceConfig::from(&cfg.output))
        .wrap_err("initialize PCA9685")?;
    dev.set_pwm_frequency(cfg.pwm.frequency_hz)
        .wrap_err_with(|| format!("program PWM frequency {} Hz", cfg.pwm.frequency_hz))?;
    Ok(dev)
}

/// Per-channel servo curves: CSV rows first, then the `[servo]` default.
#[derive(Debug, Clone, Default)]
pub struct ServoMap {
    channels: [Option<ServoEval>; 16],
    fallback: Option<ServoEval>,
}

impl ServoMap {
    pub fn new(
        default: Option<&pca_config::ServoCfg>,
        rows: &[pca_config::ServoCalibrationRow],
    ) -> Self {
        let mut map = Self {
            channels: [None; 16],
            fallback: default.map(ServoEval::from),
        };
        for row in rows {
            if let Some(slot) = map.channels.get_mut(usize::from(row.channel)) {
                *slot = Some(ServoEval::from(row));
            }
        }
        map
    }

    /// Curve for `channel`, if one is calibrated.
    pub fn get(&self, channel: u8) -> Option<&ServoEval> {
        self.channels
            .get(usize::from(channel))
            .and_then(Option::as_ref)
            .or(self.fallback.as_ref())
    }
}
