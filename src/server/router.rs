use crate::apispec::{API_DOCS_PATH, API_SPEC_PATH, api_docs_html};
use crate::health::{HealthStatus, health_check};
use crate::server::AppState;
use percent_encoding::percent_decode_str;
use serde_json::Value;
use tiny_http::Method;
use tracing::{debug, warn};

pub const HEALTH_PATH: &str = "/health";
pub const SUCCESS_MESSAGE: &str = "Successfully validated";

pub const CONTENT_TYPE_TEXT: &str = "text/plain; charset=UTF-8";
pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_HTML: &str = "text/html; charset=UTF-8";

/// A response before it is handed to the HTTP layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
    pub headers: Vec<(&'static str, String)>,
}

impl Reply {
    pub fn text(status: u16, body: impl Into<String>) -> Reply {
        Reply {
            status,
            content_type: CONTENT_TYPE_TEXT,
            body: body.into(),
            headers: Vec::new(),
        }
    }

    pub fn json(status: u16, value: &Value) -> Reply {
        Reply {
            status,
            content_type: CONTENT_TYPE_JSON,
            body: value.to_string(),
            headers: Vec::new(),
        }
    }

    pub fn html(status: u16, body: impl Into<String>) -> Reply {
        Reply {
            status,
            content_type: CONTENT_TYPE_HTML,
            body: body.into(),
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Reply {
        self.headers.push((name, value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// The percent-decoded path of a request target, without query or fragment.
pub fn request_path(url: &str) -> String {
    let raw = url.split(['?', '#']).next().unwrap_or_default();
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// Dispatches one request. The query string and fragment are ignored.
pub fn route(state: &AppState, method: &Method, url: &str, body: &[u8]) -> Reply {
    let decoded = request_path(url);
    let path = decoded.as_str();

    if *method == Method::Options {
        return preflight();
    }

    if state.registry().get(path).is_some() {
        return match method {
            Method::Post => validate(state, path, body),
            _ => Reply::text(405, format!("Method {} not allowed on {}", method, path))
                .with_header("Allow", "POST, OPTIONS"),
        };
    }

    match (method, path) {
        (Method::Get | Method::Head, API_SPEC_PATH) => Reply::json(200, state.api_spec()),
        (Method::Get | Method::Head, HEALTH_PATH) => health(state),
        (Method::Get | Method::Head, docs) if docs.trim_end_matches('/') == API_DOCS_PATH => {
            Reply::html(200, api_docs_html())
        }
        _ => Reply::text(404, format!("No route for {} {}", method, path)),
    }
}

fn validate(state: &AppState, path: &str, body: &[u8]) -> Reply {
    let instance: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            debug!("rejecting unparseable body on {}: {}", path, e);
            return Reply::text(400, format!("Invalid JSON: {}", e));
        }
    };

    match state.registry().validate(path, &instance) {
        Some(outcome) if outcome.valid => Reply::text(200, SUCCESS_MESSAGE),
        Some(outcome) => {
            warn!(
                "{} rejected instance with {} issue(s)",
                path,
                outcome.issues.len()
            );
            Reply::text(400, outcome.to_text())
        }
        None => Reply::text(404, format!("No component is served at {}", path)),
    }
}

fn health(state: &AppState) -> Reply {
    let report = health_check(state.registry(), state.uptime());
    let status = match report.status {
        HealthStatus::Healthy | HealthStatus::Degraded => 200,
        HealthStatus::Unhealthy => 503,
    };
    match serde_json::to_value(&report) {
        Ok(value) => Reply::json(status, &value),
        Err(e) => Reply::text(500, format!("Failed to encode health report: {}", e)),
    }
}

fn preflight() -> Reply {
    Reply::text(200, "")
        .with_header("Access-Control-Allow-Methods", "GET, HEAD, POST, OPTIONS")
        .with_header("Access-Control-Allow-Headers", "Content-Type")
}
