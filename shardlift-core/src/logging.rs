//! Logging configuration module
//! Console logging on stderr plus an optional JSON log file

use std::io;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,              // log level (trace, debug, info, warn, error)
    pub file_dir: Option<PathBuf>,  // directory for the JSON log file
    pub rotation: LogRotation,      // log rotation policy
    pub ansi: bool,                 // colored console output
}

/// Log rotation policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogRotation {
    Hourly,
    Daily,
    Never,
}

impl LogRotation {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "hourly" => Some(LogRotation::Hourly),
            "daily" => Some(LogRotation::Daily),
            "never" => Some(LogRotation::Never),
            _ => None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_dir: None,
            rotation: LogRotation::Daily,
            ansi: true,
        }
    }
}

impl LoggingConfig {
    const FILE_NAME: &'static str = "shardlift.log";

    /// Filter used when RUST_LOG is unset
    pub fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level))
    }

    /// Initialize logging based on configuration
    ///
    /// The returned guard flushes the file writer on drop and must outlive
    /// every workflow in the process.
    pub fn init(&self) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error + Send + Sync>> {
        let console_layer = fmt::layer()
            .with_target(false)
            .with_level(true)
            .with_ansi(self.ansi)
            .with_writer(io::stderr);

        let guard = if let Some(ref dir) = self.file_dir {
            let file_appender = match self.rotation {
                LogRotation::Hourly => rolling::hourly(dir, Self::FILE_NAME),
                LogRotation::Daily => rolling::daily(dir, Self::FILE_NAME),
                LogRotation::Never => rolling::never(dir, Self::FILE_NAME),
            };

            let (writer, guard) = non_blocking(file_appender);

            let file_layer = fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(false)
                .json()
                .with_writer(writer);

            tracing_subscriber::registry()
                .with(self.filter())
                .with(console_layer)
                .with(file_layer)
                .try_init()?;

            Some(guard)
        } else {
            tracing_subscriber::registry()
                .with(self.filter())
                .with(console_layer)
                .try_init()?;

            None
        };

        tracing::debug!("Logging initialized - level: {}", self.level);

        Ok(guard)
    }
}

/// Log an outgoing cluster API request
#[macro_export]
macro_rules! log_cluster_request {
    ($operation:expr, $method:expr, $path:expr) => {
        tracing::debug!(
            operation = $operation,
            method = $method,
            path = $path,
            "Cluster API request"
        )
    };
}

/// Log an outgoing cloud provider call
#[macro_export]
macro_rules! log_cloud_call {
    ($operation:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::debug!(
            operation = $operation,
            $($key = $value),+,
            "Cloud API call"
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert!(config.file_dir.is_none());
        assert_eq!(config.rotation, LogRotation::Daily);
    }

    #[test]
    fn test_log_rotation_parse() {
        assert_eq!(LogRotation::parse("Hourly"), Some(LogRotation::Hourly));
        assert_eq!(LogRotation::parse("never"), Some(LogRotation::Never));
        assert_eq!(LogRotation::parse("weekly"), None);
    }
}
