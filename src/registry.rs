//! Compiled validators for every component of a source document, addressed
//! by the route they are served under.

use crate::error::JcvError;
use crate::openapi::{ApiDocument, SpecVersion};
use crate::schema::{
    SchemaOptions, SourceRetriever, ValidationOutcome, build_component_schema, compile,
    validate_instance,
};
use jsonschema::{Draft, Validator};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, info};

pub const ENDPOINT_PREFIX: &str = "validate_";

/// `validate_` followed by the component name with spaces turned into
/// underscores, lowercased.
pub fn endpoint_name(component: &str) -> String {
    format!(
        "{}{}",
        ENDPOINT_PREFIX,
        component.replace(' ', "_").to_lowercase()
    )
}

pub fn endpoint_path(component: &str) -> String {
    format!("/{}", endpoint_name(component))
}

pub struct ComponentValidator {
    name: String,
    path: String,
    validator: Validator,
}

impl ComponentValidator {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn validate(&self, instance: &Value) -> ValidationOutcome {
        validate_instance(&self.validator, instance)
    }
}

impl std::fmt::Debug for ComponentValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentValidator")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish()
    }
}

#[derive(Debug)]
pub struct ComponentRegistry {
    title: String,
    version: SpecVersion,
    draft: Draft,
    components: Map<String, Value>,
    validators: Vec<ComponentValidator>,
    by_path: HashMap<String, usize>,
}

impl ComponentRegistry {
    /// Compiles one validator per component, in document order.
    ///
    /// Fails on the first component that does not compile and on two
    /// components sharing a route.
    pub fn build(
        document: &ApiDocument,
        options: &SchemaOptions,
    ) -> Result<ComponentRegistry, JcvError> {
        let draft = options
            .draft
            .unwrap_or_else(|| document.version().default_draft());
        let components = document.components();

        let mut validators: Vec<ComponentValidator> = Vec::with_capacity(components.len());
        let mut by_path: HashMap<String, usize> = HashMap::new();

        for name in components.keys() {
            let path = endpoint_path(name);
            if let Some(existing) = by_path.get(&path) {
                return Err(JcvError::DuplicateEndpoint {
                    endpoint: path,
                    first: validators[*existing].name.clone(),
                    second: name.clone(),
                });
            }

            let schema = build_component_schema(name, components).ok_or_else(|| {
                JcvError::Internal {
                    message: format!("component '{}' vanished while building", name),
                }
            })?;
            let retriever = SourceRetriever::new(
                options.base_url.clone(),
                options.remote_refs,
                options.fetch_timeout,
            );
            let validator =
                compile(&schema, draft, retriever).map_err(|reason| JcvError::SchemaCompileFailed {
                    component: name.clone(),
                    reason,
                })?;

            debug!("compiled component '{}' at {}", name, path);
            by_path.insert(path.clone(), validators.len());
            validators.push(ComponentValidator {
                name: name.clone(),
                path,
                validator,
            });
        }

        info!(
            "compiled {} component validators from '{}' ({}, {:?})",
            validators.len(),
            document.title(),
            document.version(),
            draft
        );

        Ok(ComponentRegistry {
            title: document.title().to_string(),
            version: document.version(),
            draft,
            components: components.clone(),
            validators,
            by_path,
        })
    }

    pub fn get(&self, path: &str) -> Option<&ComponentValidator> {
        self.by_path.get(path).map(|index| &self.validators[*index])
    }

    /// `None` when no component is served at `path`.
    pub fn validate(&self, path: &str, instance: &Value) -> Option<ValidationOutcome> {
        self.get(path).map(|component| component.validate(instance))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentValidator> {
        self.validators.iter()
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn version(&self) -> SpecVersion {
        self.version
    }

    pub fn draft(&self) -> Draft {
        self.draft
    }

    pub fn components(&self) -> &Map<String, Value> {
        &self.components
    }
}
