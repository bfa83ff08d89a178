//! Loading the source document named on the command line.
//!
//! The argument is tried as a URL first and falls back to a local path. Only
//! `http`, `https` and `file` URLs count; anything else (including Windows
//! drive letters such as `C:\specs\api.yaml`, which parse with scheme `c`) is
//! read from the filesystem.

use crate::error::JcvError;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(Url),
    Path(PathBuf),
}

impl Source {
    pub fn parse(arg: &str) -> Source {
        match Url::parse(arg) {
            Ok(url) if matches!(url.scheme(), "http" | "https" | "file") => Source::Url(url),
            _ => Source::Path(PathBuf::from(arg)),
        }
    }

    /// Location that relative external `$ref`s are resolved against.
    pub fn base_url(&self) -> Option<Url> {
        match self {
            Source::Url(url) => Some(url.clone()),
            Source::Path(path) => {
                let absolute = fs::canonicalize(path).ok()?;
                Url::from_file_path(absolute).ok()
            }
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Url(url) => write!(f, "{}", url),
            Source::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

pub fn load_source(source: &Source, timeout: Duration) -> Result<String, JcvError> {
    match source {
        Source::Url(url) if url.scheme() == "file" => {
            let path = url.to_file_path().map_err(|_| JcvError::SourceReadFailed {
                source: url.to_string(),
                reason: "not a valid local file URL".to_string(),
            })?;
            read_path(&path)
        }
        Source::Url(url) => fetch_url(url, timeout),
        Source::Path(path) => read_path(path),
    }
}

/// Classifies `arg` and loads it.
pub fn load_document(arg: &str, timeout: Duration) -> Result<(Source, String), JcvError> {
    let source = Source::parse(arg);
    info!("loading source document from {}", source);
    let text = load_source(&source, timeout)?;
    debug!("loaded {} bytes from {}", text.len(), source);
    Ok((source, text))
}

pub(crate) fn read_path(path: &Path) -> Result<String, JcvError> {
    if !path.exists() {
        return Err(JcvError::SourceNotFound {
            path: path.display().to_string(),
        });
    }
    fs::read_to_string(path).map_err(|e| JcvError::SourceReadFailed {
        source: path.display().to_string(),
        reason: e.to_string(),
    })
}

pub(crate) fn fetch_url(url: &Url, timeout: Duration) -> Result<String, JcvError> {
    debug!("fetching {}", url);
    let fetch_failed = |reason: String| JcvError::FetchFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| fetch_failed(e.to_string()))?;

    let response = client
        .get(url.as_str())
        .send()
        .map_err(|e| fetch_failed(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(fetch_failed(format!("server responded with {}", status)));
    }

    response.text().map_err(|e| fetch_failed(e.to_string()))
}
