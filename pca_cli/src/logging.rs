//! Tracing subscriber setup: console layer plus an optional JSON log file.

use std::path::Path;

use eyre::{WrapErr, eyre};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber.
///
/// The console honours `RUST_LOG` first, then `--log-level`, and always
/// writes to stderr so stdout stays clean for command output. The file
/// layer (from `[logging]`) writes JSON lines; the returned guard flushes it
/// when dropped.
pub fn init_tracing(
    json: bool,
    log_level: &str,
    logging: &pca_config::Logging,
) -> eyre::Result<Option<WorkerGuard>> {
    let console_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .wrap_err_with(|| format!("invalid --log-level '{log_level}'"))?;
    let console: BoxedLayer = if json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    };

    let mut layers = vec![console];
    let mut guard = None;
    if let Some(file) = logging.file.as_deref() {
        let (layer, g) = file_layer(file, logging)?;
        layers.push(layer);
        guard = Some(g);
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| eyre!("install tracing subscriber: {e}"))?;
    Ok(guard)
}

fn file_layer(
    file: &str,
    logging: &pca_config::Logging,
) -> eyre::Result<(BoxedLayer, WorkerGuard)> {
    let path = Path::new(file);
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .ok_or_else(|| eyre!("logging.file '{file}' does not name a file"))?;

    let appender = match logging.rotation.as_deref() {
        Some("daily") => tracing_appender::rolling::daily(dir, name),
        Some("hourly") => tracing_appender::rolling::hourly(dir, name),
        _ => tracing_appender::rolling::never(dir, name),
    };
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let level = logging.level.as_deref().unwrap_or("info");
    let filter =
        EnvFilter::try_new(level).wrap_err_with(|| format!("invalid logging.level '{level}'"))?;
    let layer = fmt::layer()
        .json()
        .with_writer(writer)
        .with_filter(filter)
        .boxed();
    Ok((layer, guard))
}
