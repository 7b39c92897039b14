use color_eyre::{Result, eyre::WrapErr};
use std::{fs, path::Path};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub const DEFAULT_FILTER: &str = "info";

/// Routes `tracing` output to a daily log file; the terminal belongs to the UI.
///
/// The returned guard flushes buffered lines when dropped and must outlive the app.
pub fn init(directory: &Path) -> Result<WorkerGuard> {
    fs::create_dir_all(directory)
        .wrap_err_with(|| format!("failed to create log directory {}", directory.display()))?;
    let appender = tracing_appender::rolling::daily(directory, "chain-messenger.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer),
        )
        .try_init()
        .wrap_err("failed to install tracing subscriber")?;

    Ok(guard)
}
