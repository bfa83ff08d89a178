//! Unified error type for the component validator.
//!
//! Startup problems (loading the source document, understanding it as an
//! OpenAPI or Swagger document, compiling component schemas, binding the
//! server) are reported through [`JcvError`]. Problems with individual HTTP
//! requests never surface here; the router turns them into 4xx replies.
//!
//! # Example
//!
//! ```rust,ignore
//! use json_component_validator::error::JcvError;
//!
//! fn read_source(path: &str) -> Result<String, JcvError> {
//!     std::fs::read_to_string(path).map_err(|e| JcvError::SourceReadFailed {
//!         source: path.to_string(),
//!         reason: e.to_string(),
//!     })
//! }
//! ```

use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum JcvError {
    /// Invalid configuration value, from a config file, the environment or a flag.
    ConfigError(String),

    /// Local source document does not exist.
    SourceNotFound { path: String },

    /// Source document exists but could not be read.
    SourceReadFailed { source: String, reason: String },

    /// Remote source document could not be fetched.
    FetchFailed { url: String, reason: String },

    /// Source text is neither YAML nor JSON, or has the wrong shape.
    ParseFailed { reason: String },

    /// Neither `swagger` nor `openapi` names a supported version.
    UnsupportedSpecVersion { found: Option<String> },

    /// The document has no `definitions` / `components.schemas` mapping.
    ComponentsMissing { section: String },

    /// A component could not be compiled into a JSON schema validator.
    SchemaCompileFailed { component: String, reason: String },

    /// Two components normalize to the same route.
    DuplicateEndpoint {
        endpoint: String,
        first: String,
        second: String,
    },

    /// Binding or running the HTTP server failed.
    ServerError(String),

    IoError(std::io::Error),

    Internal { message: String },
}

impl fmt::Display for JcvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JcvError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            JcvError::SourceNotFound { path } => {
                write!(
                    f,
                    "Source document not found: '{}'. Pass an existing file path or an http(s) URL.",
                    path
                )
            }
            JcvError::SourceReadFailed { source, reason } => {
                write!(
                    f,
                    "Failed to read source document '{}': {}. Check that the file is readable UTF-8 text.",
                    source, reason
                )
            }
            JcvError::FetchFailed { url, reason } => {
                write!(f, "Failed to fetch '{}': {}", url, reason)
            }
            JcvError::ParseFailed { reason } => {
                write!(f, "Source document is not valid YAML or JSON: {}", reason)
            }
            JcvError::UnsupportedSpecVersion { found } => match found {
                Some(version) => write!(
                    f,
                    "Unrecognized OpenAPI version '{}'. Expected swagger 2.x or openapi 3.x.",
                    version
                ),
                None => write!(
                    f,
                    "Unrecognized OpenAPI version: the document has neither a 'swagger' nor an 'openapi' field."
                ),
            },
            JcvError::ComponentsMissing { section } => {
                write!(
                    f,
                    "No component schemas found: '{}' is missing or is not a mapping.",
                    section
                )
            }
            JcvError::SchemaCompileFailed { component, reason } => {
                write!(
                    f,
                    "Failed to compile schema for component '{}': {}",
                    component, reason
                )
            }
            JcvError::DuplicateEndpoint {
                endpoint,
                first,
                second,
            } => {
                write!(
                    f,
                    "Components '{}' and '{}' both map to endpoint '{}'. Rename one of them.",
                    first, second, endpoint
                )
            }
            JcvError::ServerError(msg) => write!(f, "Server error: {}", msg),
            JcvError::IoError(err) => write!(f, "IO error: {}", err),
            JcvError::Internal { message } => write!(f, "{}", message),
        }
    }
}

impl Error for JcvError {}

impl From<std::io::Error> for JcvError {
    fn from(err: std::io::Error) -> Self {
        JcvError::IoError(err)
    }
}

impl From<serde_json::Error> for JcvError {
    fn from(err: serde_json::Error) -> Self {
        JcvError::ParseFailed {
            reason: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for JcvError {
    fn from(err: serde_yaml::Error) -> Self {
        JcvError::ParseFailed {
            reason: err.to_string(),
        }
    }
}

impl From<String> for JcvError {
    fn from(err: String) -> Self {
        JcvError::Internal { message: err }
    }
}

impl From<&str> for JcvError {
    fn from(err: &str) -> Self {
        JcvError::Internal {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = JcvError::ConfigError("JCV_PORT must be a number".to_string());
        let msg = err.to_string();
        assert!(msg.contains("Configuration error"));
        assert!(msg.contains("JCV_PORT"));
    }

    #[test]
    fn test_source_not_found_is_actionable() {
        let err = JcvError::SourceNotFound {
            path: "/tmp/missing.yaml".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/tmp/missing.yaml"), "Should include the path");
        assert!(msg.contains("URL"), "Should mention the URL alternative");
    }

    #[test]
    fn test_unsupported_version_display() {
        let with_version = JcvError::UnsupportedSpecVersion {
            found: Some("1.2".to_string()),
        };
        assert!(with_version.to_string().contains("'1.2'"));

        let without = JcvError::UnsupportedSpecVersion { found: None };
        let msg = without.to_string();
        assert!(msg.contains("swagger"));
        assert!(msg.contains("openapi"));
    }

    #[test]
    fn test_duplicate_endpoint_names_both_components() {
        let err = JcvError::DuplicateEndpoint {
            endpoint: "/validate_pet_owner".to_string(),
            first: "Pet Owner".to_string(),
            second: "pet_owner".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Pet Owner"));
        assert!(msg.contains("pet_owner"));
        assert!(msg.contains("/validate_pet_owner"));
    }

    #[test]
    fn test_io_error_from_std_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: JcvError = io_err.into();
        assert!(matches!(err, JcvError::IoError(_)));
        assert!(err.to_string().contains("access denied"));
    }

    #[test]
    fn test_yaml_error_becomes_parse_failed() {
        let yaml_err = serde_yaml::from_str::<serde_json::Value>("key: [unclosed").unwrap_err();
        let err: JcvError = yaml_err.into();
        assert!(matches!(err, JcvError::ParseFailed { .. }));
    }

    #[test]
    fn test_error_from_str() {
        let err: JcvError = "test error".into();
        assert!(matches!(err, JcvError::Internal { .. }));
        assert_eq!(err.to_string(), "test error");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<JcvError>();
    }
}
