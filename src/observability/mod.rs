use serde::{Deserialize, Serialize};
use std::io;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

// "logs": {
//   "enabled": true,
//   "level": "info",
//   "destination": { "type": "file", "path": "/var/log/jcv" }
// }

pub const LOG_FILE_PREFIX: &str = "json-component-validator.log";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub enabled: bool,
    pub level: String,
    pub destination: LogDestination,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LogDestination {
    #[serde(rename = "stderr")]
    Stderr,
    /// `path` is a directory; files rotate daily.
    #[serde(rename = "file")]
    File { path: String },
    #[serde(rename = "null")]
    Null,
}

/// `RUST_LOG`, when set, replaces the configured level.
pub fn build_filter(level: &str) -> Result<EnvFilter, Box<dyn std::error::Error>> {
    let base = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::new(directives),
        _ => EnvFilter::new(level),
    };
    Ok(base
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?)
        .add_directive("rustls=warn".parse()?))
}

/// Installs the global subscriber. Keep the returned guard alive for as long
/// as file logging should flush.
pub fn init_logs(config: &LogConfig) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
    if !config.enabled {
        return Ok(None);
    }

    let filter = build_filter(&config.level)?;

    match &config.destination {
        LogDestination::File { path } => {
            let file_appender = RollingFileAppender::new(Rotation::DAILY, path, LOG_FILE_PREFIX);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            Registry::default()
                .with(filter)
                .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                .try_init()?;
            Ok(Some(guard))
        }
        LogDestination::Stderr => {
            // a subscriber may already be installed by an embedding application or a test
            let _ = Registry::default()
                .with(filter)
                .with(fmt::layer().with_writer(io::stderr))
                .try_init();
            Ok(None)
        }
        LogDestination::Null => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_destination_serde_tag() {
        let value = serde_json::to_value(LogDestination::File {
            path: "/tmp/logs".to_string(),
        })
        .unwrap();
        assert_eq!(value["type"], "file");
        assert_eq!(value["path"], "/tmp/logs");

        let parsed: LogDestination = serde_json::from_str(r#"{"type":"stderr"}"#).unwrap();
        assert!(matches!(parsed, LogDestination::Stderr));
    }

    #[test]
    fn test_disabled_logs_install_nothing() {
        let config = LogConfig {
            enabled: false,
            level: "debug".to_string(),
            destination: LogDestination::Stderr,
        };
        assert!(init_logs(&config).unwrap().is_none());
    }

    #[test]
    fn test_build_filter_accepts_plain_level() {
        assert!(build_filter("warn").is_ok());
    }
}
