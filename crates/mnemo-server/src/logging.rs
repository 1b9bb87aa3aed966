//! Tracing initialization for the `mnemo` binary.

use mnemo_infrastructure::MnemoPaths;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str =
    "mnemo=info,mnemo_application=info,mnemo_infrastructure=info,mnemo_interaction=info";
const VERBOSE_LOG_FILTER: &str =
    "mnemo=debug,mnemo_application=debug,mnemo_infrastructure=debug,mnemo_interaction=debug";

/// Installs a stderr layer and, when the log directory is writable, a daily
/// rolling file layer.
///
/// The returned guard flushes the file writer on drop; keep it alive for the
/// lifetime of the process.
pub fn init_logging(verbose: bool) -> Option<WorkerGuard> {
    let env_filter = if verbose {
        EnvFilter::new(VERBOSE_LOG_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };

    let mut guard = None;
    let file_layer = match MnemoPaths::logs_dir().map_err(|e| e.to_string()).and_then(|dir| {
        std::fs::create_dir_all(&dir)
            .map(|_| dir)
            .map_err(|e| e.to_string())
    }) {
        Ok(log_dir) => {
            let file_appender = tracing_appender::rolling::daily(log_dir, "mnemo.log");
            let (file_writer, worker_guard) = tracing_appender::non_blocking(file_appender);
            guard = Some(worker_guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(file_writer)
                    .with_ansi(false)
                    .with_filter(env_filter.clone()),
            )
        }
        Err(err) => {
            eprintln!("Warning: failed to create logs directory: {err}");
            None
        }
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(env_filter),
        )
        .init();

    guard
}
