use crate::error::JcvError;
use crate::observability::{LogConfig, LogDestination};
use crate::schema::parse_draft;
use getset::{CopyGetters, Getters, Setters};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::str::FromStr;
use tracing::debug;

pub mod constants;

use constants::*;

/*
Configuration Loading (12-Factor App Pattern)
=============================================

Later sources override earlier ones:

1. DEFAULTS: built into the code (port 7071 on 0.0.0.0, 4 workers, ...)
2. CONFIG FILE: optional JSON file passed with --config
3. ENVIRONMENT VARIABLES: JCV_HOST, JCV_PORT, JCV_WORKERS, JCV_MAX_BODY_BYTES,
   JCV_DRAFT, JCV_NULLABLE, JCV_REMOTE_REFS, JCV_FETCH_TIMEOUT_SECS,
   JCV_LOG_LEVEL, JCV_LOG_FILE, JCV_CONTACT_EMAIL
4. COMMAND LINE FLAGS: applied by the binary through the setters

Validation runs once, after the last layer, so a flag can repair a bad
environment value.

Usage:
```rust,ignore
let mut config = load_config(None)?;
config.set_port(8080);
config.validate()?;
```
*/

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Getters, CopyGetters, Setters)]
#[serde(default)]
pub struct Config {
    #[getset(get = "pub", set = "pub")]
    host: String,
    #[getset(get_copy = "pub", set = "pub")]
    port: u16,
    #[getset(get_copy = "pub", set = "pub")]
    workers: usize,
    #[getset(get_copy = "pub", set = "pub")]
    max_body_bytes: usize,
    /// JSON Schema draft forced for every component. `None` picks the draft
    /// matching the source document's version.
    #[getset(get = "pub", set = "pub")]
    draft: Option<String>,
    /// Treat OpenAPI `nullable: true` as permitting `null`.
    #[getset(get_copy = "pub", set = "pub")]
    nullable: bool,
    /// Allow external `$ref`s to be fetched over http(s).
    #[getset(get_copy = "pub", set = "pub")]
    remote_refs: bool,
    #[getset(get_copy = "pub", set = "pub")]
    fetch_timeout_secs: u64,
    #[getset(get = "pub", set = "pub")]
    log_level: String,
    /// Directory for daily rolling log files. Logs go to stderr when unset.
    #[getset(get = "pub", set = "pub")]
    log_dir: Option<String>,
    /// Published as `info.contact.email` of the generated API description.
    #[getset(get = "pub", set = "pub")]
    contact_email: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            workers: DEFAULT_WORKERS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            draft: None,
            nullable: true,
            remote_refs: true,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_dir: None,
            contact_email: None,
        }
    }
}

impl Config {
    /// Reads a JSON config file. Missing keys keep their defaults.
    pub fn from_file(path: &str) -> Result<Config, JcvError> {
        let content = fs::read_to_string(path).map_err(|e| {
            JcvError::ConfigError(format!("Failed to read config at '{}': {}", path, e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            JcvError::ConfigError(format!("Invalid config file '{}': {}", path, e))
        })
    }

    /// Environment variables always win over the config file.
    pub fn apply_env_overrides(&mut self) -> Result<(), JcvError> {
        if let Some(host) = get_env_var(ENV_HOST) {
            self.host = host;
        }
        if let Some(port) = parse_env_var::<u16>(ENV_PORT)? {
            self.port = port;
        }
        if let Some(workers) = parse_env_var::<usize>(ENV_WORKERS)? {
            self.workers = workers;
        }
        if let Some(max) = parse_env_var::<usize>(ENV_MAX_BODY_BYTES)? {
            self.max_body_bytes = max;
        }
        if let Some(draft) = get_env_var(ENV_DRAFT) {
            self.draft = Some(draft);
        }
        if let Some(nullable) = parse_env_bool(ENV_NULLABLE)? {
            self.nullable = nullable;
        }
        if let Some(remote) = parse_env_bool(ENV_REMOTE_REFS)? {
            self.remote_refs = remote;
        }
        if let Some(timeout) = parse_env_var::<u64>(ENV_FETCH_TIMEOUT_SECS)? {
            self.fetch_timeout_secs = timeout;
        }
        if let Some(level) = get_env_var(ENV_LOG_LEVEL) {
            self.log_level = level;
        }
        if let Some(dir) = get_env_var(ENV_LOG_FILE) {
            self.log_dir = Some(dir);
        }
        if let Some(email) = get_env_var(ENV_CONTACT_EMAIL) {
            self.contact_email = Some(email);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), JcvError> {
        if self.host.trim().is_empty() {
            return Err(JcvError::ConfigError("host must not be empty".to_string()));
        }
        if self.workers == 0 {
            return Err(JcvError::ConfigError(
                "workers must be at least 1".to_string(),
            ));
        }
        if self.max_body_bytes == 0 {
            return Err(JcvError::ConfigError(
                "max_body_bytes must be greater than 0".to_string(),
            ));
        }
        if let Some(draft) = &self.draft {
            parse_draft(draft)?;
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn log_config(&self) -> LogConfig {
        let destination = match &self.log_dir {
            Some(dir) => LogDestination::File { path: dir.clone() },
            None => LogDestination::Stderr,
        };
        LogConfig {
            enabled: true,
            level: self.log_level.clone(),
            destination,
        }
    }
}

/// Defaults, then the optional config file, then the environment.
///
/// Values are parsed but not validated; call [`Config::validate`] once every
/// layer has been applied.
pub fn load_config(path: Option<&str>) -> Result<Config, JcvError> {
    let mut config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    config.apply_env_overrides()?;
    debug!("loaded config {:?}", config);
    Ok(config)
}

/// Returns the trimmed value, treating empty variables as unset.
pub fn get_env_var(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
        _ => None,
    }
}

fn parse_env_var<T: FromStr>(key: &str) -> Result<Option<T>, JcvError>
where
    T::Err: std::fmt::Display,
{
    match get_env_var(key) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| JcvError::ConfigError(format!("{}='{}': {}", key, raw, e))),
        None => Ok(None),
    }
}

fn parse_env_bool(key: &str) -> Result<Option<bool>, JcvError> {
    match get_env_var(key) {
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(JcvError::ConfigError(format!(
                "{}='{}': expected true or false",
                key, raw
            ))),
        },
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_container_port() {
        let config = Config::default();
        assert_eq!(config.port(), 7071);
        assert_eq!(config.host(), "0.0.0.0");
        assert_eq!(config.bind_address(), "0.0.0.0:7071");
        assert!(config.nullable());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let mut config = Config::default();
        config.set_workers(0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("workers"));
    }

    #[test]
    fn test_validate_rejects_unknown_draft() {
        let mut config = Config::default();
        config.set_draft(Some("draft-99".to_string()));
        assert!(matches!(
            config.validate(),
            Err(JcvError::ConfigError(_))
        ));
    }

    #[test]
    fn test_partial_config_file_keeps_defaults() {
        let config: Config = serde_json::from_str(r#"{"port": 9000, "workers": 2}"#).unwrap();
        assert_eq!(config.port(), 9000);
        assert_eq!(config.workers(), 2);
        assert_eq!(config.host(), DEFAULT_HOST);
        assert_eq!(config.max_body_bytes(), DEFAULT_MAX_BODY_BYTES);
    }

    #[test]
    fn test_log_config_uses_file_destination_when_dir_set() {
        let mut config = Config::default();
        config.set_log_dir(Some("/var/log/jcv".to_string()));
        let logs = config.log_config();
        assert!(matches!(logs.destination, LogDestination::File { ref path } if path == "/var/log/jcv"));
    }
}
