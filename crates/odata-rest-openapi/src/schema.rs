//! EDM property model → JSON Schema (2020-12, as used by OpenAPI 3.1).

use odata_rest_core::{EntityDef, PropertyDef};
use serde_json::{json, Map, Value};

/// JSON Schema `type` and `format` for an EDM primitive type.
///
/// Unknown types (complex types, enums, vendor types) yield `None` and are
/// published unconstrained.
///
/// ```
/// use odata_rest_openapi::edm_json_type;
///
/// assert_eq!(edm_json_type("Edm.Int32"), Some(("integer", Some("int32"))));
/// assert_eq!(edm_json_type("Edm.Guid"), Some(("string", Some("uuid"))));
/// assert_eq!(edm_json_type("NS.Address"), None);
/// ```
#[must_use]
pub fn edm_json_type(edm_type: &str) -> Option<(&'static str, Option<&'static str>)> {
    let mapped = match edm_type {
        "Edm.String" => ("string", None),
        "Edm.Boolean" => ("boolean", None),
        "Edm.Byte" => ("integer", Some("uint8")),
        "Edm.SByte" => ("integer", Some("int8")),
        "Edm.Int16" => ("integer", Some("int16")),
        "Edm.Int32" => ("integer", Some("int32")),
        "Edm.Int64" => ("integer", Some("int64")),
        "Edm.Single" => ("number", Some("float")),
        "Edm.Double" => ("number", Some("double")),
        "Edm.Decimal" => ("number", Some("decimal")),
        "Edm.Guid" => ("string", Some("uuid")),
        "Edm.Date" => ("string", Some("date")),
        "Edm.DateTime" | "Edm.DateTimeOffset" => ("string", Some("date-time")),
        "Edm.Time" | "Edm.Duration" => ("string", Some("duration")),
        "Edm.TimeOfDay" => ("string", Some("time")),
        "Edm.Binary" | "Edm.Stream" => ("string", Some("byte")),
        _ => return None,
    };
    Some(mapped)
}

/// Schema of one property.
#[must_use]
pub fn property_schema(property: &PropertyDef) -> Value {
    let mut schema = Map::new();

    if let Some((base_type, format)) = edm_json_type(&property.type_name) {
        let json_type = if property.nullable {
            json!([base_type, "null"])
        } else {
            json!(base_type)
        };
        schema.insert("type".to_string(), json_type);
        if let Some(format) = format {
            schema.insert("format".to_string(), json!(format));
        }
        // MaxLength only constrains string-typed values.
        if let Some(max_length) = property.max_length.filter(|_| base_type == "string") {
            schema.insert("maxLength".to_string(), json!(max_length));
        }
    } else {
        schema.insert(
            "description".to_string(),
            json!(format!("EDM type {}", property.type_name)),
        );
    }

    if let Some(label) = property.label.as_deref().filter(|l| !l.is_empty()) {
        schema.insert("title".to_string(), json!(label));
    }
    schema.insert("x-edm-type".to_string(), json!(property.type_name));
    if !property.filterable {
        schema.insert("x-filterable".to_string(), json!(false));
    }

    Value::Object(schema)
}

/// Object schema of one entity, with keys and navigation names as extensions.
#[must_use]
pub fn entity_schema(entity: &EntityDef) -> Value {
    let properties: Map<String, Value> = entity
        .properties
        .iter()
        .map(|p| (p.name.clone(), property_schema(p)))
        .collect();

    let mut schema = json!({
        "type": "object",
        "title": entity.name,
        "properties": properties,
    });

    if !entity.keys.is_empty() {
        schema["x-keys"] = json!(entity.keys);
    }
    if !entity.navigation.is_empty() {
        let names: Vec<&str> = entity.navigation.iter().map(|n| n.name.as_str()).collect();
        schema["x-navigation"] = json!(names);
    }

    schema
}

/// Schema of the `{"value": [...]}` collection envelope.
#[must_use]
pub fn collection_schema(item_ref: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "value": {
                "type": "array",
                "items": { "$ref": item_ref },
            },
        },
    })
}

/// The `ErrorResponse` component: `{status_code, message, details}`.
#[must_use]
pub fn error_response_schema() -> Value {
    json!({
        "type": "object",
        "required": ["status_code", "message", "details"],
        "properties": {
            "status_code": { "type": "integer", "description": "HTTP status code" },
            "message": { "description": "Error message, or the raw upstream body" },
            "details": { "description": "Upstream error details, if any" },
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use odata_rest_core::NavigationDef;
    use pretty_assertions::assert_eq;

    #[test]
    fn nullable_string_with_length_and_label() {
        let mut prop = PropertyDef::new("Name", "Edm.String");
        prop.max_length = Some(40);
        prop.label = Some("Product Name".to_string());
        assert_eq!(
            property_schema(&prop),
            json!({
                "type": ["string", "null"],
                "maxLength": 40,
                "title": "Product Name",
                "x-edm-type": "Edm.String",
            }),
        );
    }

    #[test]
    fn non_nullable_integer() {
        let mut prop = PropertyDef::new("ID", "Edm.Int32");
        prop.nullable = false;
        prop.filterable = false;
        assert_eq!(
            property_schema(&prop),
            json!({
                "type": "integer",
                "format": "int32",
                "x-edm-type": "Edm.Int32",
                "x-filterable": false,
            }),
        );
    }

    #[test]
    fn formatted_string_keeps_max_length() {
        let mut prop = PropertyDef::new("Id", "Edm.Guid");
        prop.max_length = Some(36);
        let schema = property_schema(&prop);
        assert_eq!(schema["format"], "uuid");
        assert_eq!(schema["maxLength"], 36);
    }

    #[test]
    fn max_length_ignored_for_numbers() {
        let mut prop = PropertyDef::new("Qty", "Edm.Decimal");
        prop.max_length = Some(13);
        assert!(property_schema(&prop).get("maxLength").is_none());
    }

    #[test]
    fn unknown_type_unconstrained() {
        let schema = property_schema(&PropertyDef::new("Address", "NS.Address"));
        assert!(schema.get("type").is_none());
        assert_eq!(schema["description"], "EDM type NS.Address");
    }

    #[test]
    fn entity_with_keys_and_navigation() {
        let entity = EntityDef {
            name: "Products".to_string(),
            keys: vec!["ID".to_string()],
            properties: vec![PropertyDef::new("ID", "Edm.Int32")],
            navigation: vec![NavigationDef {
                name: "Category".to_string(),
                target: Some("Category".to_string()),
            }],
        };
        let schema = entity_schema(&entity);
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["title"], "Products");
        assert_eq!(schema["x-keys"], json!(["ID"]));
        assert_eq!(schema["x-navigation"], json!(["Category"]));
        assert_eq!(schema["properties"]["ID"]["format"], "int32");
    }

    #[test]
    fn entity_without_properties() {
        let entity = EntityDef {
            name: "Ghosts".to_string(),
            ..EntityDef::default()
        };
        assert_eq!(
            entity_schema(&entity),
            json!({"type": "object", "title": "Ghosts", "properties": {}}),
        );
    }
}
