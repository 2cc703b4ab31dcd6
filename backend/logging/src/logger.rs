//! Structured Logger
//!
//! Console output for operators plus a daily NDJSON file for everything,
//! analysis-cycle events included.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::event_logger::CYCLE_EVENT_TARGET;

/// Initialize the global logger.
///
/// `RUST_LOG` wins over `level`. Cycle events go to the file only. If the log
/// directory cannot be used, logging falls back to the console. Keep the
/// returned guard alive for as long as the file should be written; a second
/// call is a no-op apart from the returned guard.
pub fn init_logger<P: AsRef<Path>>(log_dir: P, level: &str) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("finsight.log")
        .build(log_dir.as_ref());

    let (file_layer, guard) = match appender {
        Ok(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        Err(e) => {
            eprintln!(
                "finsight: file logging disabled, cannot use {}: {e}",
                log_dir.as_ref().display()
            );
            (None, None)
        }
    };

    let console_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_ansi(true)
        .with_filter(filter_fn(|meta| meta.target() != CYCLE_EVENT_TARGET));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();

    guard
}
