#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and servo calibration parsing for the PCA9685 tools.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The servo calibration CSV loader enforces headers and per-row ranges.
use serde::Deserialize;

/// Full-scale duty; the largest value a servo calibration point may take.
pub const PWM_FULL: u16 = 4096;
pub const CHANNEL_COUNT: u8 = 16;

/// Servo calibration CSV schema.
///
/// Expected headers:
/// channel,min,mid,max
///
/// `mid` may be left empty for a two-point (linear) calibration.
///
/// Example:
/// channel,min,mid,max
/// 0,102,,512
/// 1,128,324,526
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ServoCalibrationRow {
    pub channel: u8,
    pub min: u16,
    pub mid: Option<u16>,
    pub max: u16,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DeviceCfg {
    /// 7-bit bus address. Module addresses are normalized into 0x40..=0x7F.
    pub address: u8,
    /// Linux I²C bus number (`/dev/i2c-N`).
    pub bus: u8,
    pub speed_hz: u32,
    /// Talk to a sub-address or all-call group instead of one chip.
    pub proxy: bool,
    /// Some clone boards swap the begin and end halves of each channel block.
    pub swap_phase_registers: bool,
}

impl Default for DeviceCfg {
    fn default() -> Self {
        Self {
            address: 0x40,
            bus: 1,
            speed_hz: 400_000,
            proxy: false,
            swap_phase_registers: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DriverMode {
    OpenDrain,
    #[default]
    TotemPole,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum EnabledMode {
    #[default]
    Normal,
    Inverted,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DisabledMode {
    #[default]
    Low,
    High,
    Floating,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateMode {
    #[default]
    AfterStop,
    AfterAck,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PhaseBalancer {
    #[default]
    None,
    Linear,
    Dynamic,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct OutputCfg {
    pub driver_mode: DriverMode,
    pub enabled_mode: EnabledMode,
    pub disabled_mode: DisabledMode,
    pub update_mode: UpdateMode,
    pub phase_balancer: PhaseBalancer,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PwmCfg {
    /// PWM frequency programmed at start-up
    pub frequency_hz: f32,
}

impl Default for PwmCfg {
    fn default() -> Self {
        Self { frequency_hz: 50.0 }
    }
}

/// Default servo calibration used when a channel has no CSV row.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct ServoCfg {
    pub min: u16,
    #[serde(default)]
    pub mid: Option<u16>,
    pub max: u16,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceCfg,
    #[serde(default)]
    pub output: OutputCfg,
    #[serde(default)]
    pub pwm: PwmCfg,
    #[serde(default)]
    pub servo: Option<ServoCfg>,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Lowest and highest PWM frequency the internal oscillator can produce.
pub const MIN_FREQUENCY_HZ: f32 = 24.0;
pub const MAX_FREQUENCY_HZ: f32 = 1526.0;

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Device
        if self.device.address > 0x7F {
            eyre::bail!("device.address must be a 7-bit address (<= 0x7f)");
        }
        if self.device.speed_hz == 0 {
            eyre::bail!("device.speed_hz must be > 0");
        }
        if self.device.speed_hz > 1_000_000 {
            eyre::bail!("device.speed_hz must be <= 1000000 (Fast-mode Plus)");
        }

        // Output
        if self.output.driver_mode == DriverMode::OpenDrain
            && self.output.disabled_mode == DisabledMode::High
        {
            eyre::bail!("output.disabled_mode 'high' is not available with driver_mode 'open-drain'");
        }

        // PWM
        let hz = self.pwm.frequency_hz;
        if !hz.is_finite() || !(MIN_FREQUENCY_HZ..=MAX_FREQUENCY_HZ).contains(&hz) {
            eyre::bail!("pwm.frequency_hz must be in [{MIN_FREQUENCY_HZ}, {MAX_FREQUENCY_HZ}]");
        }

        // Servo
        if let Some(servo) = &self.servo {
            check_servo_points("servo", servo.min, servo.mid, servo.max)?;
        }

        // Logging
        if let Some(rotation) = self.logging.rotation.as_deref()
            && !matches!(rotation, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never, daily, hourly");
        }

        Ok(())
    }
}

fn check_servo_points(what: &str, min: u16, mid: Option<u16>, max: u16) -> eyre::Result<()> {
    if max > PWM_FULL {
        eyre::bail!("{what}.max must be <= {PWM_FULL}");
    }
    if min > max {
        eyre::bail!("{what}.min must be <= {what}.max");
    }
    if let Some(mid) = mid
        && !(min..=max).contains(&mid)
    {
        eyre::bail!("{what}.mid must lie between {what}.min and {what}.max");
    }
    Ok(())
}

/// Load per-channel servo calibration.
///
/// Rows are returned in file order. Channels must be in range and unique.
pub fn load_servo_csv(path: &std::path::Path) -> eyre::Result<Vec<ServoCalibrationRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open servo calibration CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["channel", "min", "mid", "max"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "servo calibration CSV must have headers 'channel,min,mid,max', got: {}",
            actual.join(",")
        );
    }

    let mut rows: Vec<ServoCalibrationRow> = Vec::new();
    for (idx, rec) in rdr.deserialize::<ServoCalibrationRow>().enumerate() {
        let line = idx + 2;
        let row = match rec {
            Ok(row) => row,
            Err(e) => eyre::bail!("invalid CSV row {}: {}", line, e),
        };
        if row.channel >= CHANNEL_COUNT {
            eyre::bail!("row {}: channel must be in 0..{}", line, CHANNEL_COUNT);
        }
        if rows.iter().any(|r| r.channel == row.channel) {
            eyre::bail!("row {}: duplicate channel {}", line, row.channel);
        }
        check_servo_points(&format!("row {line}"), row.min, row.mid, row.max)?;
        rows.push(row);
    }

    if rows.is_empty() {
        eyre::bail!("servo calibration CSV {:?} has no rows", path);
    }
    Ok(rows)
}
