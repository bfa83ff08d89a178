use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static DEFINITIONS_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#/definitions/").expect("static regex"));

pub const COMPONENTS_REF_PREFIX: &str = "#/components/schemas/";

/// Keys whose values are instance data, not schemas.
const DATA_KEYS: [&str; 5] = ["example", "examples", "default", "enum", "const"];

/// Keys whose values map arbitrary names to schemas.
const SCHEMA_MAP_KEYS: [&str; 4] = ["properties", "patternProperties", "definitions", "$defs"];

/// Points Swagger 2 `#/definitions/...` references at `#/components/schemas/...`
/// so every component can be validated with the same document layout.
pub fn rewrite_definition_refs(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                match child {
                    Value::String(reference)
                        if key == "$ref" && DEFINITIONS_REF.is_match(reference) =>
                    {
                        let rewritten = DEFINITIONS_REF
                            .replace(reference.as_str(), COMPONENTS_REF_PREFIX)
                            .into_owned();
                        *reference = rewritten;
                    }
                    _ => rewrite_definition_refs(child),
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(rewrite_definition_refs),
        _ => {}
    }
}

/// OpenAPI 3.0 `nullable: true` (and Swagger's `x-nullable: true`) widen a
/// typed schema to also accept `null`. Schemas without `type` are left alone.
///
/// Property names are never mistaken for keywords: a property called
/// `default` is still a schema.
pub fn apply_nullable(value: &mut Value) {
    match value {
        Value::Object(map) => {
            let nullable = ["nullable", "x-nullable"]
                .iter()
                .any(|key| map.get(*key) == Some(&Value::Bool(true)));

            if nullable && map.contains_key("type") {
                if let Some(ty) = map.get_mut("type") {
                    widen_type(ty);
                }
                if let Some(Value::Array(options)) = map.get_mut("enum")
                    && !options.contains(&Value::Null)
                {
                    options.push(Value::Null);
                }
            }

            for (key, child) in map.iter_mut() {
                let key = key.as_str();
                if DATA_KEYS.contains(&key) {
                    continue;
                }
                match child {
                    Value::Object(named) if SCHEMA_MAP_KEYS.contains(&key) => {
                        named.values_mut().for_each(apply_nullable)
                    }
                    _ => apply_nullable(child),
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(apply_nullable),
        _ => {}
    }
}

fn widen_type(ty: &mut Value) {
    let null = Value::String("null".to_string());
    match ty {
        Value::String(single) if single != "null" => {
            *ty = Value::Array(vec![Value::String(single.clone()), null]);
        }
        Value::Array(types) if !types.contains(&null) => types.push(null),
        _ => {}
    }
}
