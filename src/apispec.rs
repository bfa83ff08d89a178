use crate::registry::ComponentRegistry;
use crate::schema::component_ref;
use serde_json::{Map, Value, json};

pub const API_SPEC_PATH: &str = "/apispec_1.json";
pub const API_DOCS_PATH: &str = "/apidocs";
pub const API_TITLE: &str = "JSON Component Validator";

const SWAGGER_UI_CDN: &str = "https://unpkg.com/swagger-ui-dist@5";

/// OpenAPI description of a single `POST /validate_<name>` operation.
pub fn validation_operation(component: &str) -> Value {
    json!({
        "tags": ["validation"],
        "summary": format!("Validate '{}' against the spec.", component),
        "description": "Just checking.",
        "requestBody": {
            "description": "Input object",
            "required": true,
            "content": {
                "application/json": {
                    "schema": {"$ref": component_ref(component)}
                }
            }
        },
        "responses": {
            "200": {
                "description": "Success",
                "content": {"text/plain": {"schema": {"type": "string"}}}
            },
            "400": {
                "description": "Failure",
                "content": {"text/plain": {"schema": {"type": "string"}}}
            }
        }
    })
}

/// The OpenAPI document describing this service: the source components plus
/// one validation path per component.
pub fn build_api_spec(registry: &ComponentRegistry, contact_email: Option<&str>) -> Value {
    let mut paths = Map::new();
    for component in registry.iter() {
        paths.insert(
            component.path().to_string(),
            json!({ "post": validation_operation(component.name()) }),
        );
    }

    let mut info = json!({
        "title": API_TITLE,
        "description": format!(
            "Validation of components/definitions for '{}'",
            registry.title()
        ),
        "version": env!("CARGO_PKG_VERSION"),
    });
    if let Some(email) = contact_email {
        info["contact"] = json!({ "email": email });
    }

    json!({
        "openapi": "3.0.0",
        "info": info,
        "tags": [{"name": "validation"}],
        "paths": Value::Object(paths),
        "components": {
            "schemas": Value::Object(registry.components().clone())
        }
    })
}

/// Swagger UI page, loaded from a CDN, rendering [`API_SPEC_PATH`].
pub fn api_docs_html() -> String {
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{title}</title>
  <link rel="stylesheet" href="{cdn}/swagger-ui.css">
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="{cdn}/swagger-ui-bundle.js"></script>
  <script>
    window.ui = SwaggerUIBundle({{
      url: "{spec}",
      dom_id: "#swagger-ui",
      deepLinking: true
    }});
  </script>
</body>
</html>
"##,
        title = API_TITLE,
        cdn = SWAGGER_UI_CDN,
        spec = API_SPEC_PATH
    )
}
