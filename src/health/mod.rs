//! Health reporting for the validator service, served at `GET /health`.

use crate::registry::ComponentRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, SystemTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    fn severity(self) -> u8 {
        match self {
            HealthStatus::Healthy => 0,
            HealthStatus::Degraded => 1,
            HealthStatus::Unhealthy => 2,
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, String>>,
    /// Seconds since the Unix epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked_at: Option<u64>,
}

impl ComponentHealth {
    pub fn new(name: impl Into<String>, status: HealthStatus, message: impl Into<String>) -> Self {
        let checked_at = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .ok();

        Self {
            name: name.into(),
            status,
            message: message.into(),
            details: None,
            checked_at,
        }
    }

    pub fn with_details(mut self, details: HashMap<String, String>) -> Self {
        self.details = Some(details);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// Worst status of all components.
    pub status: HealthStatus,
    pub components: Vec<ComponentHealth>,
    pub version: String,
    pub uptime_secs: u64,
}

impl HealthCheckResult {
    pub fn from_components(components: Vec<ComponentHealth>, uptime: Duration) -> Self {
        let status = components
            .iter()
            .map(|c| c.status)
            .max_by_key(|s| s.severity())
            .unwrap_or(HealthStatus::Healthy);

        Self {
            status,
            components,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_secs: uptime.as_secs(),
        }
    }
}

/// A registry without components serves nothing but the health and API
/// description routes, which counts as unhealthy.
pub fn registry_health(registry: &ComponentRegistry) -> ComponentHealth {
    let mut details = HashMap::new();
    details.insert("source_title".to_string(), registry.title().to_string());
    details.insert("spec_version".to_string(), registry.version().to_string());
    details.insert("draft".to_string(), format!("{:?}", registry.draft()));
    details.insert("components".to_string(), registry.len().to_string());

    let (status, message) = if registry.is_empty() {
        (
            HealthStatus::Unhealthy,
            "No components were found in the source document.".to_string(),
        )
    } else {
        (
            HealthStatus::Healthy,
            format!("{} component validators loaded.", registry.len()),
        )
    };

    ComponentHealth::new("components", status, message).with_details(details)
}

pub fn health_check(registry: &ComponentRegistry, uptime: Duration) -> HealthCheckResult {
    let components = vec![
        registry_health(registry),
        // answering this request is the proof
        ComponentHealth::new("server", HealthStatus::Healthy, "Accepting requests."),
    ];
    HealthCheckResult::from_components(components, uptime)
}
