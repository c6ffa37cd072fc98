//! Tracing configuration and log routing.
//!
//! Logs go to stdout with a compact formatter, and additionally to a file so
//! webhook traffic can be audited after the fact. `COURT_INDEX_LOG_FILE`
//! selects the file; without it logs land in `logs/court-index.log`. The file
//! writer is non-blocking so request handlers never wait on disk.

use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Configure tracing subscribers for stdout and optional file logging.
///
/// Respects `RUST_LOG` for filtering and defaults to `info`. File logging is
/// best-effort: when the target cannot be opened the server keeps running with
/// stdout only.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(false).compact();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer);

    match open_log_writer() {
        Some(writer) => {
            let file_layer = fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false)
                .compact();
            registry.with(file_layer).init();
        }
        None => registry.init(),
    }
}

/// Open the log file and wrap it in a non-blocking writer.
fn open_log_writer() -> Option<NonBlocking> {
    let file = match std::env::var("COURT_INDEX_LOG_FILE") {
        Ok(path) => std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|err| eprintln!("Failed to open log file {path}: {err}"))
            .ok()?,
        Err(_) => {
            if let Err(err) = std::fs::create_dir_all("logs") {
                eprintln!("Failed to create logs directory: {err}");
                return None;
            }
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open("logs/court-index.log")
                .map_err(|err| eprintln!("Failed to open logs/court-index.log: {err}"))
                .ok()?
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);
    let _ = LOG_GUARD.set(guard);
    Some(non_blocking)
}
