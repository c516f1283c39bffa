use std::{fs::File, path::Path, sync::OnceLock};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the file logger. Later calls are no-ops.
pub fn setup_logger(
    log_dir: &Path,
    level: &str,
    _endpoint: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if LOG_GUARD.get().is_some() {
        return Ok(());
    }

    let file = File::create(log_dir.join("kubedash.log"))?;
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file);

    let file_layer = fmt::layer()
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(non_blocking_writer)
        .with_filter(EnvFilter::try_new(level)?);

    if LOG_GUARD.set(guard).is_err() {
        return Ok(());
    }
    tracing_subscriber::registry().with(file_layer).try_init().ok();

    Ok(())
}
