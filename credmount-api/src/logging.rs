//! Logging configuration
//!
//! Console output always, plus an optional daily-rolling JSON file.

use std::io;

use serde::{Deserialize, Serialize};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const LOG_FILE_PREFIX: &str = "credmount.log";

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    pub log_dir: String,
    pub file_logging_enabled: bool,
    /// Emit JSON on the console as well
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: "/var/log/credmount".to_string(),
            file_logging_enabled: false,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Install the global subscriber.
    ///
    /// The returned guard flushes the file writer on drop, keep it alive for
    /// as long as the process logs.
    pub fn init(&self) -> anyhow::Result<Option<WorkerGuard>> {
        let env_filter =
            EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&self.level))?;

        let console_layer = if self.json_format {
            fmt::layer().json().with_writer(io::stdout).boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(true)
                .with_writer(io::stdout)
                .boxed()
        };

        let (file_layer, guard) = if self.file_logging_enabled {
            let file_appender = rolling::daily(&self.log_dir, LOG_FILE_PREFIX);
            let (writer, guard) = non_blocking(file_appender);
            let layer = fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(false)
                .json()
                .with_writer(writer);
            (Some(layer), Some(guard))
        } else {
            (None, None)
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .try_init()?;

        tracing::info!(
            level = %self.level,
            file = self.file_logging_enabled,
            "Logging initialized"
        );

        Ok(guard)
    }
}
