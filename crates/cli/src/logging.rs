//! Tracing setup
//!
//! Every command logs to stderr. `stake watch` also writes a log file under
//! `.stake/logs/`; keep the returned guard alive until exit or buffered lines
//! are lost.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Filter from `RUST_LOG`, else from the `-v` count
fn filter(verbose: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    })
}

pub fn init(verbose: u8) {
    tracing_subscriber::fmt()
        .with_env_filter(filter(verbose))
        .with_writer(std::io::stderr)
        .init();
}

/// Stderr plus an appended `logs_dir/file_name`
pub fn init_with_file(verbose: u8, logs_dir: &Path, file_name: &str) -> WorkerGuard {
    let appender = tracing_appender::rolling::never(logs_dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let stderr = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter(verbose));
    // The file always gets lifecycle events
    let file = fmt::layer()
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(filter(verbose.max(1)));

    tracing_subscriber::registry().with(stderr).with(file).init();
    guard
}
