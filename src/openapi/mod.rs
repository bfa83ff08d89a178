use crate::error::JcvError;
use jsonschema::Draft;
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, warn};

pub mod normalize;

pub const DEFAULT_TITLE: &str = "untitled";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecVersion {
    Swagger2,
    OpenApi30,
    OpenApi31,
}

impl SpecVersion {
    /// `swagger` takes precedence over `openapi`. Numeric versions (YAML
    /// `swagger: 2.0`) are compared by their textual form.
    pub fn detect(document: &Value) -> Result<SpecVersion, JcvError> {
        let raw = document
            .get("swagger")
            .or_else(|| document.get("openapi"))
            .map(|v| match v {
                Value::String(s) => s.trim().to_string(),
                other => other.to_string(),
            });

        match raw.as_deref() {
            Some(v) if v.starts_with('2') => Ok(SpecVersion::Swagger2),
            Some(v) if v.starts_with("3.1") => Ok(SpecVersion::OpenApi31),
            Some(v) if v.starts_with('3') => Ok(SpecVersion::OpenApi30),
            _ => Err(JcvError::UnsupportedSpecVersion { found: raw }),
        }
    }

    /// Swagger 2 and OpenAPI 3.0 schema objects are Draft 4 dialects;
    /// OpenAPI 3.1 adopts 2020-12.
    pub fn default_draft(self) -> Draft {
        match self {
            SpecVersion::Swagger2 | SpecVersion::OpenApi30 => Draft::Draft4,
            SpecVersion::OpenApi31 => Draft::Draft202012,
        }
    }

    pub fn components_section(self) -> &'static str {
        match self {
            SpecVersion::Swagger2 => "definitions",
            SpecVersion::OpenApi30 | SpecVersion::OpenApi31 => "components.schemas",
        }
    }
}

impl fmt::Display for SpecVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecVersion::Swagger2 => write!(f, "swagger 2"),
            SpecVersion::OpenApi30 => write!(f, "openapi 3.0"),
            SpecVersion::OpenApi31 => write!(f, "openapi 3.1"),
        }
    }
}

/// An OpenAPI or Swagger document reduced to what validation needs: its
/// version, title and the component schemas, with references already
/// pointing at `#/components/schemas/`.
#[derive(Debug, Clone)]
pub struct ApiDocument {
    version: SpecVersion,
    title: String,
    components: Map<String, Value>,
}

impl ApiDocument {
    /// Parses YAML or JSON text (JSON is valid YAML).
    pub fn parse(text: &str, nullable: bool) -> Result<ApiDocument, JcvError> {
        let value: Value = serde_yaml::from_str(text)?;
        ApiDocument::from_value(value, nullable)
    }

    pub fn from_value(document: Value, nullable: bool) -> Result<ApiDocument, JcvError> {
        if !document.is_object() {
            return Err(JcvError::ParseFailed {
                reason: "the top level must be a mapping".to_string(),
            });
        }

        let version = SpecVersion::detect(&document)?;
        let title = document
            .get("info")
            .and_then(|info| info.get("title"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| {
                warn!("document has no info.title, using '{}'", DEFAULT_TITLE);
                DEFAULT_TITLE.to_string()
            });

        let section = match version {
            SpecVersion::Swagger2 => document.get("definitions"),
            SpecVersion::OpenApi30 | SpecVersion::OpenApi31 => document
                .get("components")
                .and_then(|components| components.get("schemas")),
        };

        let mut components = match section {
            Some(Value::Object(map)) => map.clone(),
            _ => {
                return Err(JcvError::ComponentsMissing {
                    section: version.components_section().to_string(),
                });
            }
        };

        if version == SpecVersion::Swagger2 {
            components
                .values_mut()
                .for_each(normalize::rewrite_definition_refs);
        }
        if nullable && version != SpecVersion::OpenApi31 {
            components.values_mut().for_each(normalize::apply_nullable);
        }

        debug!(
            "parsed {} document '{}' with {} components",
            version,
            title,
            components.len()
        );

        Ok(ApiDocument {
            version,
            title,
            components,
        })
    }

    pub fn version(&self) -> SpecVersion {
        self.version
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn components(&self) -> &Map<String, Value> {
        &self.components
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detect_versions() {
        assert_eq!(
            SpecVersion::detect(&json!({"swagger": "2.0"})).unwrap(),
            SpecVersion::Swagger2
        );
        assert_eq!(
            SpecVersion::detect(&json!({"openapi": "3.0.3"})).unwrap(),
            SpecVersion::OpenApi30
        );
        assert_eq!(
            SpecVersion::detect(&json!({"openapi": "3.1.0"})).unwrap(),
            SpecVersion::OpenApi31
        );
    }

    #[test]
    fn test_detect_numeric_swagger_version() {
        let doc: Value = serde_yaml::from_str("swagger: 2.0\n").unwrap();
        assert_eq!(SpecVersion::detect(&doc).unwrap(), SpecVersion::Swagger2);
    }

    #[test]
    fn test_detect_rejects_unknown_and_missing() {
        let err = SpecVersion::detect(&json!({"openapi": "4.0"})).unwrap_err();
        assert!(matches!(err, JcvError::UnsupportedSpecVersion { found: Some(ref v) } if v == "4.0"));

        let err = SpecVersion::detect(&json!({"info": {}})).unwrap_err();
        assert!(matches!(err, JcvError::UnsupportedSpecVersion { found: None }));
    }

    #[test]
    fn test_default_drafts() {
        assert!(matches!(SpecVersion::Swagger2.default_draft(), Draft::Draft4));
        assert!(matches!(
            SpecVersion::OpenApi31.default_draft(),
            Draft::Draft202012
        ));
    }

    #[test]
    fn test_parse_openapi3_yaml() {
        let text = r#"
openapi: 3.0.0
info:
  title: Pets
  version: "1"
components:
  schemas:
    Pet:
      type: object
      required: [name]
      properties:
        name: {type: string}
        tag: {type: string, nullable: true}
    Owner:
      type: object
"#;
        let doc = ApiDocument::parse(text, true).unwrap();
        assert_eq!(doc.version(), SpecVersion::OpenApi30);
        assert_eq!(doc.title(), "Pets");
        let names: Vec<&String> = doc.components().keys().collect();
        assert_eq!(names, vec!["Pet", "Owner"]);
        assert_eq!(
            doc.components()["Pet"]["properties"]["tag"]["type"],
            json!(["string", "null"])
        );
    }

    #[test]
    fn test_parse_without_nullable_keeps_types() {
        let doc = ApiDocument::from_value(
            json!({
                "openapi": "3.0.0",
                "components": {"schemas": {"A": {"type": "string", "nullable": true}}}
            }),
            false,
        )
        .unwrap();
        assert_eq!(doc.components()["A"]["type"], "string");
        assert_eq!(doc.title(), DEFAULT_TITLE);
    }

    #[test]
    fn test_swagger2_definitions_are_rewritten() {
        let doc = ApiDocument::from_value(
            json!({
                "swagger": "2.0",
                "info": {"title": "Legacy"},
                "definitions": {
                    "Order": {"properties": {"item": {"$ref": "#/definitions/Item"}}},
                    "Item": {"type": "object"}
                }
            }),
            true,
        )
        .unwrap();
        assert_eq!(
            doc.components()["Order"]["properties"]["item"]["$ref"],
            "#/components/schemas/Item"
        );
    }

    #[test]
    fn test_missing_components_section() {
        let err = ApiDocument::from_value(json!({"openapi": "3.0.0", "paths": {}}), true)
            .unwrap_err();
        assert!(matches!(err, JcvError::ComponentsMissing { ref section } if section == "components.schemas"));
    }

    #[test]
    fn test_top_level_must_be_mapping() {
        let err = ApiDocument::parse("- just\n- a list\n", true).unwrap_err();
        assert!(matches!(err, JcvError::ParseFailed { .. }));
    }
}
