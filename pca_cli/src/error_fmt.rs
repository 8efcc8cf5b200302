//! Human-readable error descriptions and structured JSON error formatting.

use pca_core::{ConfigError, PcaError};
use pca_traits::BusError;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(pe) = err.downcast_ref::<PcaError>() {
        return match pe {
            PcaError::Config(ConfigError::OpenDrainHigh) => {
                "What happened: The output configuration is invalid (open-drain outputs cannot idle high).\nLikely causes: [output] driver_mode = \"open-drain\" together with disabled_mode = \"high\".\nHow to fix: Use disabled_mode \"low\" or \"floating\", or switch driver_mode to \"totem-pole\".".to_string()
            }
            PcaError::Bus(BusError::AddressNack) => {
                "What happened: No device acknowledged its address.\nLikely causes: Wrong [device] address or bus number, missing pull-ups, or the board is unpowered.\nHow to fix: Check wiring and power, locate the chip with `i2cdetect`, then fix [device] in the config.".to_string()
            }
            PcaError::Bus(BusError::DataTooLong) => {
                "What happened: A transaction did not fit in the transport buffer.\nLikely causes: The I²C driver accepts fewer bytes per transfer than expected.\nHow to fix: Write fewer channels at once (e.g. `set-range` with a shorter list).".to_string()
            }
            PcaError::Bus(BusError::DataNack) => {
                "What happened: The device rejected a data byte.\nLikely causes: Bus noise, a marginal clock speed, or another master on the bus.\nHow to fix: Retry; lower device.speed_hz if it persists.".to_string()
            }
            PcaError::Bus(BusError::Other(4)) => {
                "What happened: The device returned fewer bytes than requested.\nLikely causes: The device was reset or lost power mid-read, or the address belongs to a proxy group.\nHow to fix: Retry; read back only from a uniquely addressed module.".to_string()
            }
            PcaError::Bus(other) => format!(
                "What happened: Bus error ({other}, code {}).\nLikely causes: Electrical problems on the bus.\nHow to fix: Check wiring and pull-ups, then retry.",
                other.code()
            ),
        };
    }

    if let Some(te) = err.downcast_ref::<toml::de::Error>() {
        return format!(
            "What happened: The config file could not be parsed ({}).\nLikely causes: A TOML syntax error, a misspelt mode name, or a value of the wrong type.\nHow to fix: Edit the config file, then rerun.",
            te.message().trim()
        );
    }

    if let Some(pca_hardware::error::HwError::NoSuchBus(bus)) =
        err.downcast_ref::<pca_hardware::error::HwError>()
    {
        return format!(
            "What happened: I²C bus /dev/i2c-{bus} could not be opened.\nLikely causes: The bus is disabled, the number is wrong, or the process lacks permission.\nHow to fix: Enable I²C, fix device.bus in the config, or add the user to the i2c group."
        );
    }

    // String-based heuristics for errors coming from config loading
    let msg = err.to_string();
    let lower = format!("{err:#}").to_ascii_lowercase();

    if lower.contains("servo calibration csv must have headers") {
        return "Invalid headers in servo calibration CSV. Expected 'channel,min,mid,max'.".to_string();
    }

    if lower.contains("no servo calibration") {
        return format!(
            "What happened: {msg}.\nLikely causes: No [servo] section in the config and no --calibration row for this channel.\nHow to fix: Add a [servo] section or a CSV row for the channel."
        );
    }

    if lower.contains("invalid configuration") {
        let root = err.root_cause();
        return format!(
            "What happened: Configuration is invalid ({root}).\nLikely causes: Missing or out-of-range values.\nHow to fix: Edit the config file and try again."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

fn is_config_error(err: &eyre::Report) -> bool {
    err.downcast_ref::<toml::de::Error>().is_some()
        || err
            .chain()
            .any(|e| e.to_string().starts_with("invalid configuration"))
}

/// Stable exit codes: 3 configuration, 4 device not found, 5 other bus
/// errors, 1 for everything else. Usage errors exit with 2 from clap.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<PcaError>() {
        Some(PcaError::Config(_)) => 3,
        Some(PcaError::Bus(BusError::AddressNack)) => 4,
        Some(PcaError::Bus(_)) => 5,
        None if is_config_error(err) => 3,
        None => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    match err.downcast_ref::<PcaError>() {
        Some(PcaError::Config(_)) => "InvalidConfig",
        Some(PcaError::Bus(BusError::AddressNack)) => "AddressNack",
        Some(PcaError::Bus(BusError::DataNack)) => "DataNack",
        Some(PcaError::Bus(BusError::DataTooLong)) => "DataTooLong",
        Some(PcaError::Bus(BusError::Other(4))) => "ShortRead",
        Some(PcaError::Bus(_)) => "Bus",
        None if is_config_error(err) => "InvalidConfig",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let code = err.downcast_ref::<PcaError>().and_then(PcaError::bus_code);
    json!({
        "reason": reason_name(err),
        "bus_code": code,
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use eyre::WrapErr;

    fn wrapped(e: PcaError) -> eyre::Report {
        Err::<(), _>(e).wrap_err("initialize PCA9685").unwrap_err()
    }

    #[test]
    fn typed_errors_survive_context() {
        let err = wrapped(PcaError::Bus(BusError::AddressNack));
        assert_eq!(exit_code_for_error(&err), 4);
        assert!(humanize(&err).contains("No device acknowledged"));

        let err = wrapped(PcaError::Config(ConfigError::OpenDrainHigh));
        assert_eq!(exit_code_for_error(&err), 3);
    }

    #[test]
    fn json_error_carries_bus_code() {
        let err = wrapped(PcaError::Bus(BusError::SHORT_READ));
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "ShortRead");
        assert_eq!(v["bus_code"], 4);
        assert_eq!(v["exit_code"], 5);
    }

    #[test]
    fn untyped_errors_fall_back() {
        let err = eyre::eyre!("boom");
        assert_eq!(exit_code_for_error(&err), 1);
        assert!(humanize(&err).starts_with("Something went wrong."));

        let err = eyre::eyre!("pwm.frequency_hz must be in [24, 1526]")
            .wrap_err("invalid configuration in cfg.toml");
        assert_eq!(exit_code_for_error(&err), 3);
        assert!(humanize(&err).contains("pwm.frequency_hz"));
    }
}
