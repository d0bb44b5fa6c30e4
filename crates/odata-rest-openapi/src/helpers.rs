//! Shared JSON document building helpers.

use serde_json::{json, Value};

/// `#/components/schemas/{name}`.
pub fn schema_ref(component: &str) -> String {
    format!("#/components/schemas/{component}")
}

/// Component name behind a local `#/components/schemas/{name}` ref.
pub fn local_component(schema_ref: &str) -> Option<&str> {
    schema_ref
        .strip_prefix("#/components/schemas/")
        .filter(|name| !name.is_empty() && !name.contains('/'))
}

/// Component key for an entity: `{service}.{entity}`, restricted to the
/// characters OpenAPI allows in component names (`[A-Za-z0-9._-]`).
pub fn component_name(service: &str, entity: &str) -> String {
    format!("{}.{}", service.trim_matches('/'), entity.trim_matches('/'))
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Response object with description + inline `application/json` schema.
pub fn json_response(description: &str, schema: Value) -> Value {
    json!({
        "description": description,
        "content": { "application/json": { "schema": schema } },
    })
}

/// Response object with description + `application/json` schema `$ref`.
pub fn json_response_with_schema_ref(description: &str, schema_ref: &str) -> Value {
    json_response(description, json!({ "$ref": schema_ref }))
}

/// Render a document as YAML.
///
/// # Errors
///
/// Returns [`Error::Yaml`](crate::Error::Yaml) if serialization fails.
pub fn to_yaml(doc: &Value) -> crate::Result<String> {
    Ok(serde_yaml_ng::to_string(doc)?)
}

/// Render a document as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`Error::Json`](crate::Error::Json) if serialization fails.
pub fn to_json(doc: &Value) -> crate::Result<String> {
    Ok(serde_json::to_string_pretty(doc)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_names_sanitized() {
        assert_eq!(component_name("demo", "Products"), "demo.Products");
        assert_eq!(
            component_name("/sap/opu/odata/ZSRV/", "A_Item"),
            "sap_opu_odata_ZSRV.A_Item",
        );
        assert_eq!(component_name("my svc", "Ä"), "my_svc._");
    }

    #[test]
    fn local_component_names() {
        assert_eq!(local_component("#/components/schemas/Problem"), Some("Problem"));
        assert_eq!(local_component("common.yaml#/components/schemas/Problem"), None);
        assert_eq!(local_component("#/components/schemas/"), None);
        assert_eq!(local_component("#/components/responses/Problem"), None);
    }

    #[test]
    fn response_with_ref() {
        assert_eq!(
            json_response_with_schema_ref("Oops", "#/components/schemas/E"),
            json!({
                "description": "Oops",
                "content": {"application/json": {"schema": {"$ref": "#/components/schemas/E"}}},
            }),
        );
    }

    #[test]
    fn yaml_rendering() {
        let yaml = to_yaml(&json!({"openapi": "3.1.0", "paths": {}})).unwrap();
        assert!(yaml.contains("openapi: 3.1.0"), "{yaml}");
    }
}
