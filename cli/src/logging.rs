use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Default directives; HTTP plumbing is only interesting when it fails.
const LOG_FILTER: &str = "info,reqwest=warn,hyper=warn,hyper_util=warn,rustls=warn";

/// Initialize logging to stderr plus a daily file under `log_dir`.
///
/// `RUST_LOG` overrides the default filter. The returned guard flushes the
/// file writer on drop and must be held for the life of the program. If the
/// log directory can't be created, logs go to stderr only.
pub fn init_logging(log_dir: &Path) -> Option<WorkerGuard> {
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(LOG_FILTER));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    if let Err(e) = std::fs::create_dir_all(log_dir) {
        tracing_subscriber::registry()
            .with(filter())
            .with(stderr_layer)
            .init();
        tracing::warn!(path = ?log_dir, error = %e, "Failed to create log directory, logging to stderr only");
        return None;
    }

    let appender = tracing_appender::rolling::daily(log_dir, "shinycount.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .with_writer(writer);

    tracing_subscriber::registry()
        .with(filter())
        .with(stderr_layer)
        .with(file_layer)
        .init();

    tracing::debug!(path = ?log_dir, "Logging initialized");
    Some(guard)
}
