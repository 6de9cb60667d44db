//! File logging. The terminal belongs to the UI, so tracing output goes to a log file,
//! or nowhere when the log directory cannot be created.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_DIR: &str = "./data/logs";
pub const LOG_FILE: &str = "ragdesk-console.log";

/// Single never-rotated log file in `dir`; `None` if the file cannot be opened.
pub fn log_appender(dir: impl AsRef<Path>) -> Option<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE)
        .build(dir)
        .ok()
}

/// Installs the global subscriber. Keep the returned guard alive to flush on exit.
pub fn init(dir: impl AsRef<Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    match log_appender(dir) {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false),
                )
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(filter).init();
            None
        }
    }
}
