//! CLI argument definitions and shared statics.

use clap::{ArgAction, ArgGroup, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "pca9685", version, about = "PCA9685 PWM controller CLI")]
pub struct Cli {
    /// Path to config TOML (typed); built-in defaults when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Optional per-channel servo calibration CSV (strict header)
    #[arg(long, value_name = "FILE")]
    pub calibration: Option<PathBuf>,

    /// Print results and errors as JSON instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Bus backend
    #[arg(long, value_enum, default_value_t = Backend::Sim)]
    pub backend: Backend,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum Backend {
    /// In-process simulated chip (state does not persist between runs)
    Sim,
    /// Linux /dev/i2c-N (requires the `hardware` feature)
    I2c,
}

fn channel() -> clap::builder::RangedI64ValueParser<u8> {
    clap::value_parser!(u8).range(0..16)
}

fn duty() -> clap::builder::RangedI64ValueParser<u16> {
    clap::value_parser!(u16).range(0..=4096)
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Bring the chip up from config and confirm it responds
    SelfCheck,
    /// Show the configuration registers
    Info,
    /// Software-reset every PCA9685 on the bus
    Reset,
    /// Program the PWM frequency
    Freq {
        /// Frequency in Hz (24..=1526; clamped by the chip)
        #[arg(long)]
        hz: f32,
    },
    /// Turn a channel fully on
    On {
        #[arg(long, value_parser = channel())]
        channel: u8,
    },
    /// Turn a channel fully off
    Off {
        #[arg(long, value_parser = channel())]
        channel: u8,
    },
    /// Set one channel, or all channels, to a duty value
    #[command(group(ArgGroup::new("target").required(true).args(["channel", "all"])))]
    Set {
        #[arg(long, value_parser = channel())]
        channel: Option<u8>,
        /// Write every channel through the broadcast block
        #[arg(long, action = ArgAction::SetTrue)]
        all: bool,
        /// Duty value, 0..=4096 (4096 = fully on)
        #[arg(long, value_parser = duty())]
        value: u16,
    },
    /// Set consecutive channels starting at --start
    SetRange {
        #[arg(long, value_parser = channel())]
        start: u8,
        /// Comma-separated duty values
        #[arg(long, value_delimiter = ',', num_args = 1.., required = true, value_parser = duty())]
        values: Vec<u16>,
    },
    /// Read back a channel's duty value
    Get {
        #[arg(long, value_parser = channel())]
        channel: u8,
    },
    /// Drive a servo channel through its calibration curve
    #[command(group(ArgGroup::new("position").required(true).args(["angle", "speed"])))]
    Servo {
        #[arg(long, value_parser = channel())]
        channel: u8,
        /// Angle in degrees, -90..=90
        #[arg(long, allow_hyphen_values = true)]
        angle: Option<f32>,
        /// Continuous-rotation speed, -1..=1
        #[arg(long, allow_hyphen_values = true)]
        speed: Option<f32>,
    },
}
