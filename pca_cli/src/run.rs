//! Command execution: config loading, backend selection and dispatch.

use std::path::Path;

use eyre::{WrapErr, eyre};
use pca_core::registers;
use pca_core::{Pca9685, RegisterSnapshot, ServoMap, build_controller};
use pca_traits::{Bus, YieldingDelay};
use serde_json::{Value, json};
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;

use crate::cli::{Backend, Cli, Commands};
use crate::logging::init_tracing;

type Controller = Pca9685<Box<dyn Bus>>;

/// Load and validate the TOML config; built-in defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> eyre::Result<pca_config::Config> {
    let Some(path) = path else {
        return Ok(pca_config::Config::default());
    };
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config file {}", path.display()))?;
    let cfg = pca_config::load_toml(&text)
        .wrap_err_with(|| format!("invalid configuration: cannot parse {}", path.display()))?;
    cfg.validate()
        .wrap_err_with(|| format!("invalid configuration in {}", path.display()))?;
    Ok(cfg)
}

fn open_bus(backend: Backend, cfg: &pca_config::Config) -> eyre::Result<Box<dyn Bus>> {
    match backend {
        Backend::Sim => {
            let mut sim =
                pca_hardware::SimulatedPca9685::new(registers::module_address(cfg.device.address));
            // Test hook: simulate a chip that does not answer.
            if std::env::var_os("PCA_TEST_SIM_OFFLINE").is_some() {
                sim.set_offline(true);
            }
            debug!(address = sim.address(), "simulated bus");
            Ok(Box::new(sim))
        }
        Backend::I2c => open_i2c(cfg),
    }
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn open_i2c(cfg: &pca_config::Config) -> eyre::Result<Box<dyn Bus>> {
    let bus = pca_hardware::i2c::I2cBus::open(cfg.device.bus)
        .wrap_err_with(|| format!("open /dev/i2c-{}", cfg.device.bus))?;
    if let Ok(hz) = bus.clock_speed() {
        info!(bus = cfg.device.bus, clock_hz = hz, configured_hz = cfg.device.speed_hz, "i2c bus");
    }
    Ok(Box::new(bus))
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn open_i2c(cfg: &pca_config::Config) -> eyre::Result<Box<dyn Bus>> {
    eyre::bail!(
        "the i2c backend (bus {}) requires a Linux build with --features hardware",
        cfg.device.bus
    )
}

struct Output {
    json: bool,
}

impl Output {
    fn emit(&self, text: impl FnOnce() -> String, value: Value) {
        if self.json {
            println!("{value}");
        } else {
            println!("{}", text());
        }
    }
}

fn snapshot_json(address: u8, s: &RegisterSnapshot) -> Value {
    json!({
        "address": address,
        "mode1": s.mode1,
        "mode2": s.mode2,
        "sub_addresses": s.sub_addresses,
        "all_call": s.all_call,
        "prescale": s.prescale,
        "frequency_hz": s.frequency_hz(),
        "sleeping": s.is_sleeping(),
    })
}

/// Run one command. The log file guard is handed back through `log_guard`
/// so the caller can log the final error before flushing.
pub fn run(cli: Cli, log_guard: &mut Option<WorkerGuard>) -> eyre::Result<()> {
    let cfg = load_config(cli.config.as_deref())?;
    *log_guard = init_tracing(cli.json, &cli.log_level, &cfg.logging)?;

    let rows = match cli.calibration.as_deref() {
        Some(path) => pca_config::load_servo_csv(path).wrap_err_with(|| {
            format!("invalid configuration: servo calibration {}", path.display())
        })?,
        None => Vec::new(),
    };
    let servos = ServoMap::new(cfg.servo.as_ref(), &rows);
    let out = Output { json: cli.json };
    let bus = open_bus(cli.backend, &cfg)?;

    if let Commands::Reset = cli.cmd {
        // Reset goes to the general call address; no bring-up needed.
        let mut dev: Controller = Pca9685::new(bus, cfg.device.address);
        return reset(&mut dev, &out);
    }

    let mut dev: Controller = build_controller(bus, YieldingDelay::default(), &cfg)?;
    info!(
        address = format_args!("{:#04x}", dev.address()),
        proxy = dev.is_proxy_addresser(),
        backend = ?cli.backend,
        "controller ready"
    );
    execute(&mut dev, cli.cmd, &servos, &out)
}

fn reset(dev: &mut Controller, out: &Output) -> eyre::Result<()> {
    dev.reset_devices().wrap_err("software reset")?;
    out.emit(
        || "software reset sent".to_string(),
        json!({ "status": "ok", "reset": true }),
    );
    Ok(())
}

/// Duty now on `channel`. Proxies cannot read back, so they report what was
/// requested.
fn duty_after(dev: &mut Controller, channel: u8, requested: u16) -> eyre::Result<u16> {
    if dev.is_proxy_addresser() {
        return Ok(requested);
    }
    dev.channel_pwm(channel)
        .wrap_err_with(|| format!("read channel {channel}"))
}

fn execute(
    dev: &mut Controller,
    cmd: Commands,
    servos: &ServoMap,
    out: &Output,
) -> eyre::Result<()> {
    let address = dev.address();
    match cmd {
        Commands::SelfCheck => match dev.read_registers().wrap_err("read registers")? {
            Some(s) => out.emit(
                || {
                    format!(
                        "ok: PCA9685 at {address:#04x} responding (mode1 {:#04x}, prescale {}, {:.1} Hz)",
                        s.mode1,
                        s.prescale,
                        s.frequency_hz()
                    )
                },
                json!({ "status": "ok", "registers": snapshot_json(address, &s) }),
            ),
            None => out.emit(
                || format!("ok: proxy addresser at {address:#04x} (no read-back)"),
                json!({ "status": "ok", "proxy": true, "address": address }),
            ),
        },
        Commands::Info => match dev.read_registers().wrap_err("read registers")? {
            Some(s) => out.emit(
                || {
                    format!(
                        "address     {address:#04x}\nmode1       {:#04x}\nmode2       {:#04x}\nsubadr1..3  {:#04x} {:#04x} {:#04x}\nallcall     {:#04x}\nprescale    {} ({:.2} Hz)\nsleeping    {}",
                        s.mode1,
                        s.mode2,
                        s.sub_addresses[0],
                        s.sub_addresses[1],
                        s.sub_addresses[2],
                        s.all_call,
                        s.prescale,
                        s.frequency_hz(),
                        s.is_sleeping()
                    )
                },
                snapshot_json(address, &s),
            ),
            None => out.emit(
                || format!("proxy addresser at {address:#04x}: registers are not readable"),
                json!({ "proxy": true, "address": address }),
            ),
        },
        Commands::Reset => reset(dev, out)?,
        Commands::Freq { hz } => {
            if !hz.is_finite() || hz <= 0.0 {
                eyre::bail!("--hz must be a positive number, got {hz}");
            }
            if dev.is_proxy_addresser() {
                out.emit(
                    || format!("frequency {hz} Hz skipped: proxy addresser at {address:#04x} cannot program PRE_SCALE"),
                    json!({ "requested_hz": hz, "proxy": true, "skipped": true }),
                );
                return Ok(());
            }
            dev.set_pwm_frequency(hz)
                .wrap_err_with(|| format!("program PWM frequency {hz} Hz"))?;
            let prescale = registers::prescaler_for(hz);
            let actual = registers::frequency_for(prescale);
            out.emit(
                || format!("frequency {hz} Hz -> prescale {prescale} ({actual:.2} Hz)"),
                json!({ "requested_hz": hz, "prescale": prescale, "frequency_hz": actual }),
            );
        }
        Commands::On { channel } => {
            dev.set_channel_on(channel)
                .wrap_err_with(|| format!("turn channel {channel} on"))?;
            let duty = duty_after(dev, channel, pca_core::PWM_FULL)?;
            out.emit(
                || format!("channel {channel} on (duty {duty})"),
                json!({ "channel": channel, "duty": duty }),
            );
        }
        Commands::Off { channel } => {
            dev.set_channel_off(channel)
                .wrap_err_with(|| format!("turn channel {channel} off"))?;
            let duty = duty_after(dev, channel, 0)?;
            out.emit(
                || format!("channel {channel} off (duty {duty})"),
                json!({ "channel": channel, "duty": duty }),
            );
        }
        Commands::Set {
            channel,
            all,
            value,
        } => match channel {
            Some(ch) if !all => {
                dev.set_channel_pwm(ch, value)
                    .wrap_err_with(|| format!("set channel {ch}"))?;
                let duty = duty_after(dev, ch, value)?;
                out.emit(
                    || format!("channel {ch} duty {duty}"),
                    json!({ "channel": ch, "duty": duty }),
                );
            }
            _ => {
                dev.set_all_channels_pwm(value)
                    .wrap_err("set all channels")?;
                out.emit(
                    || format!("all channels duty {value}"),
                    json!({ "channel": "all", "duty": value }),
                );
            }
        },
        Commands::SetRange { start, values } => {
            dev.set_channels_pwm(start, &values)
                .wrap_err_with(|| format!("set channels from {start}"))?;
            let count = values.len().min(usize::from(pca_core::CHANNEL_COUNT - start));
            let mut duties = Vec::with_capacity(count);
            for (ch, &requested) in (start..).zip(&values[..count]) {
                duties.push(duty_after(dev, ch, requested)?);
            }
            out.emit(
                || {
                    let list: Vec<String> = duties.iter().map(u16::to_string).collect();
                    format!("channels {start}.. duty {}", list.join(","))
                },
                json!({ "start": start, "duties": duties }),
            );
        }
        Commands::Get { channel } => {
            let duty = dev
                .channel_pwm(channel)
                .wrap_err_with(|| format!("read channel {channel}"))?;
            out.emit(
                || format!("channel {channel} duty {duty}"),
                json!({ "channel": channel, "duty": duty }),
            );
        }
        Commands::Servo {
            channel,
            angle,
            speed,
        } => {
            let eval = servos
                .get(channel)
                .ok_or_else(|| eyre!("no servo calibration for channel {channel}"))?;
            let (duty, label, position) = match (angle, speed) {
                (Some(a), _) => (eval.pwm_for_angle(a), format!("angle {a}"), json!({ "angle": a })),
                (None, Some(s)) => (eval.pwm_for_speed(s), format!("speed {s}"), json!({ "speed": s })),
                (None, None) => eyre::bail!("servo needs --angle or --speed"),
            };
            dev.set_channel_pwm(channel, duty)
                .wrap_err_with(|| format!("drive servo on channel {channel}"))?;
            out.emit(
                || format!("channel {channel} servo {label} -> duty {duty}"),
                json!({ "channel": channel, "position": position, "duty": duty }),
            );
        }
    }
    Ok(())
}
