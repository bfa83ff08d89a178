use crate::error::JcvError;
use crate::openapi::normalize::COMPONENTS_REF_PREFIX;
use jsonschema::{Draft, Validator};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub mod retriever;

pub use retriever::SourceRetriever;

/// Accepts `4`, `draft4`, `draft-04`, ..., `2019-09`, `2020-12`.
pub fn parse_draft(raw: &str) -> Result<Draft, JcvError> {
    let normalized = raw
        .trim()
        .to_ascii_lowercase()
        .trim_start_matches("draft")
        .trim_start_matches(['-', '_'])
        .trim_start_matches('0')
        .to_string();
    match normalized.as_str() {
        "4" => Ok(Draft::Draft4),
        "6" => Ok(Draft::Draft6),
        "7" => Ok(Draft::Draft7),
        "2019-09" | "201909" => Ok(Draft::Draft201909),
        "2020-12" | "202012" => Ok(Draft::Draft202012),
        _ => Err(JcvError::ConfigError(format!(
            "unknown JSON Schema draft '{}', expected one of 4, 6, 7, 2019-09, 2020-12",
            raw
        ))),
    }
}

/// How component schemas are compiled.
#[derive(Debug, Clone)]
pub struct SchemaOptions {
    /// Overrides the draft implied by the document version.
    pub draft: Option<Draft>,
    pub remote_refs: bool,
    /// Location of the source document, for relative external references.
    pub base_url: Option<Url>,
    pub fetch_timeout: Duration,
}

impl Default for SchemaOptions {
    fn default() -> Self {
        SchemaOptions {
            draft: None,
            remote_refs: true,
            base_url: None,
            fetch_timeout: Duration::from_secs(crate::config::constants::DEFAULT_FETCH_TIMEOUT_SECS),
        }
    }
}

/// The schema an instance of `name` is validated against: the component
/// itself, carrying the whole component set under `components.schemas` so
/// `#/components/schemas/...` references (including to itself) resolve
/// within one document.
///
/// Boolean schemas cannot carry extra keys and are wrapped in `allOf`.
pub fn build_component_schema(name: &str, components: &Map<String, Value>) -> Option<Value> {
    let component = components.get(name)?;
    let mut schema = match component {
        Value::Object(map) => map.clone(),
        other => {
            let mut wrapper = Map::new();
            wrapper.insert("allOf".to_string(), json!([other]));
            wrapper
        }
    };
    if schema.contains_key("components") {
        warn!(
            "component '{}' defines its own 'components' key; it is replaced for reference resolution",
            name
        );
    }
    schema.insert(
        "components".to_string(),
        json!({ "schemas": Value::Object(components.clone()) }),
    );
    Some(Value::Object(schema))
}

/// `#/components/schemas/<name>` with JSON pointer escaping.
pub fn component_ref(name: &str) -> String {
    format!(
        "{}{}",
        COMPONENTS_REF_PREFIX,
        name.replace('~', "~0").replace('/', "~1")
    )
}

pub fn compile(
    schema: &Value,
    draft: Draft,
    retriever: SourceRetriever,
) -> Result<Validator, String> {
    jsonschema::options()
        .with_draft(draft)
        .with_retriever(retriever)
        .build(schema)
        .map_err(|e| e.to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub message: String,
    /// JSON pointer into the validated instance; empty for the root.
    pub instance_path: String,
    pub schema_path: String,
}

impl ValidationIssue {
    pub fn location(&self) -> &str {
        if self.instance_path.is_empty() {
            "/"
        } else {
            &self.instance_path
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationOutcome {
    /// One line per issue: `<message> at <instance path>`.
    pub fn to_text(&self) -> String {
        self.issues
            .iter()
            .map(|issue| format!("{} at {}", issue.message, issue.location()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub fn validate_instance(validator: &Validator, instance: &Value) -> ValidationOutcome {
    let issues: Vec<ValidationIssue> = validator
        .iter_errors(instance)
        .map(|error| ValidationIssue {
            message: error.to_string(),
            instance_path: error.instance_path.to_string(),
            schema_path: error.schema_path.to_string(),
        })
        .collect();
    debug!("validation finished with {} issue(s)", issues.len());
    ValidationOutcome {
        valid: issues.is_empty(),
        issues,
    }
}
