use crate::loader::{fetch_url, read_path};
use jsonschema::{Retrieve, Uri};
use serde_json::Value;
use std::error::Error;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Scheme jsonschema assigns to documents without an `$id`; references
/// relative to the component schema come back with it.
const DEFAULT_SCHEME: &str = "json-schema";

#[derive(Debug)]
struct RetrieveError(String);

impl std::fmt::Display for RetrieveError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error for RetrieveError {}

/// Resolves external `$ref`s of component schemas.
///
/// Relative references are joined onto the location of the source document,
/// so `common.yaml#/components/schemas/Error` next to `api.yaml` works for
/// both files and URLs. Retrieved documents may be YAML or JSON.
pub struct SourceRetriever {
    base: Option<Url>,
    remote: bool,
    timeout: Duration,
}

impl SourceRetriever {
    pub fn new(base: Option<Url>, remote: bool, timeout: Duration) -> Self {
        SourceRetriever {
            base,
            remote,
            timeout,
        }
    }

    fn locate(&self, uri: &str) -> Result<Url, RetrieveError> {
        let parsed = Url::parse(uri).map_err(|e| RetrieveError(format!("{}: {}", uri, e)))?;
        if parsed.scheme() != DEFAULT_SCHEME {
            return Ok(parsed);
        }
        let relative = parsed.path().trim_start_matches('/');
        match &self.base {
            Some(base) => base
                .join(relative)
                .map_err(|e| RetrieveError(format!("{}: {}", relative, e))),
            None => Err(RetrieveError(format!(
                "cannot resolve relative reference '{}' without a source location",
                relative
            ))),
        }
    }

    fn fetch(&self, location: &Url) -> Result<Value, RetrieveError> {
        let text = match location.scheme() {
            "http" | "https" if self.remote => {
                fetch_url(location, self.timeout).map_err(|e| RetrieveError(e.to_string()))?
            }
            "http" | "https" => {
                return Err(RetrieveError(format!(
                    "remote reference '{}' is disabled",
                    location
                )));
            }
            "file" => {
                let path = location
                    .to_file_path()
                    .map_err(|_| RetrieveError(format!("invalid file URL '{}'", location)))?;
                read_path(&path).map_err(|e| RetrieveError(e.to_string()))?
            }
            other => {
                return Err(RetrieveError(format!(
                    "unsupported scheme '{}' in reference '{}'",
                    other, location
                )));
            }
        };
        serde_yaml::from_str(&text).map_err(|e| RetrieveError(format!("{}: {}", location, e)))
    }
}

impl Retrieve for SourceRetriever {
    fn retrieve(&self, uri: &Uri<String>) -> Result<Value, Box<dyn Error + Send + Sync>> {
        debug!("retrieving external reference {}", uri.as_str());
        let location = self.locate(uri.as_str())?;
        Ok(self.fetch(&location)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_relative_reference_joins_base() {
        let base = Url::parse("https://example.com/specs/api.yaml").unwrap();
        let retriever = SourceRetriever::new(Some(base), true, Duration::from_secs(1));
        let located = retriever.locate("json-schema:///common.yaml").unwrap();
        assert_eq!(located.as_str(), "https://example.com/specs/common.yaml");
    }

    #[test]
    fn test_relative_reference_without_base_fails() {
        let retriever = SourceRetriever::new(None, true, Duration::from_secs(1));
        assert!(retriever.locate("json-schema:///common.yaml").is_err());
    }

    #[test]
    fn test_remote_disabled() {
        let retriever = SourceRetriever::new(None, false, Duration::from_secs(1));
        let location = Url::parse("https://example.com/common.yaml").unwrap();
        let err = retriever.fetch(&location).unwrap_err();
        assert!(err.to_string().contains("disabled"));
    }

    #[test]
    fn test_file_reference_reads_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("common.yaml");
        fs::write(&path, "Error:\n  type: object\n").unwrap();
        let retriever = SourceRetriever::new(None, false, Duration::from_secs(1));
        let value = retriever
            .fetch(&Url::from_file_path(&path).unwrap())
            .unwrap();
        assert_eq!(value["Error"]["type"], "object");
    }
}
