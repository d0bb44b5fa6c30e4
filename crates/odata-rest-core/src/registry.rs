//! Service registry adapter: raw store rows → canonical [`ServiceRecord`]s.
//!
//! Service tables have carried several historical column layouts. Each
//! canonical field is resolved from a fixed, ordered list of source columns;
//! the first column holding a non-empty value wins:
//!
//! | Field              | Columns, in precedence order                         |
//! |--------------------|------------------------------------------------------|
//! | `id`               | `id`, `ID`                                           |
//! | `name`             | `name`, `service_name`                               |
//! | `base_url`         | `service_url`, `service_base_url`, `base_url`        |
//! | `raw_metadata`     | `metadata_xml` (xml), `metadata` (xml), `metadata_json` (json) |
//! | `metadata_encoding`| explicit `metadata_encoding`, else implied by the metadata column |
//! | `active`           | `active` (missing column means active)               |
//! | `mode`             | `route_mode`                                         |

use std::collections::BTreeMap;

use serde_json::Value;

use crate::model::{MetadataEncoding, RouteMode, ServiceRecord};

/// One row as read from the store: column name → value.
pub type RawServiceRow = BTreeMap<String, Value>;

const ID_COLUMNS: &[&str] = &["id", "ID"];
const NAME_COLUMNS: &[&str] = &["name", "service_name"];
const BASE_URL_COLUMNS: &[&str] = &["service_url", "service_base_url", "base_url"];
const METADATA_COLUMNS: &[(&str, MetadataEncoding)] = &[
    ("metadata_xml", MetadataEncoding::Xml),
    ("metadata", MetadataEncoding::Xml),
    ("metadata_json", MetadataEncoding::Json),
];

/// Normalize one raw row. Total and pure: every row yields a record.
///
/// A row with no usable name yields a record with an empty name, which the
/// synthesizer skips.
#[must_use]
pub fn normalize_row(row: &RawServiceRow) -> ServiceRecord {
    let (raw_metadata, implied_encoding) = METADATA_COLUMNS
        .iter()
        .find_map(|(column, encoding)| text(row, column).map(|raw| (raw, *encoding)))
        .unwrap_or_default();

    let metadata_encoding = text(row, "metadata_encoding")
        .and_then(|name| MetadataEncoding::from_name(&name))
        .unwrap_or(implied_encoding);

    ServiceRecord {
        id: first_text(row, ID_COLUMNS),
        name: first_text(row, NAME_COLUMNS)
            .map(|n| n.trim().to_string())
            .unwrap_or_default(),
        base_url: first_text(row, BASE_URL_COLUMNS),
        raw_metadata,
        metadata_encoding,
        active: row.get("active").map_or(true, truthy),
        mode: text(row, "route_mode").and_then(|m| RouteMode::from_name(&m)),
    }
}

/// Normalize rows and keep only the active ones, in store order.
#[must_use]
pub fn load_active_services(rows: &[RawServiceRow]) -> Vec<ServiceRecord> {
    rows.iter()
        .map(normalize_row)
        .filter(|record| {
            if !record.active {
                tracing::debug!(service = %record.name, "skipping inactive service");
            }
            record.active
        })
        .collect()
}

fn first_text(row: &RawServiceRow, columns: &[&str]) -> Option<String> {
    columns.iter().find_map(|column| text(row, column))
}

/// A column's value as text. Null, empty and whitespace-only values are absent.
fn text(row: &RawServiceRow, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "y" | "on"
        ),
        Value::Null | Value::Array(_) | Value::Object(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn row(value: Value) -> RawServiceRow {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn modern_layout() {
        let record = normalize_row(&row(json!({
            "id": 7,
            "name": "demo",
            "service_url": "http://example.com",
            "metadata_xml": "<Edmx/>",
            "active": 1,
        })));
        let mut expected = ServiceRecord::new("demo", "<Edmx/>").with_base_url("http://example.com");
        expected.id = Some("7".to_string());
        assert_eq!(record, expected);
    }

    #[test]
    fn legacy_layout() {
        let record = normalize_row(&row(json!({
            "service_name": "legacy",
            "service_base_url": "http://legacy",
            "metadata": "<Edmx/>",
            "description": "ignored",
            "active": true,
        })));
        assert_eq!(record.name, "legacy");
        assert_eq!(record.base_url.as_deref(), Some("http://legacy"));
        assert_eq!(record.raw_metadata, "<Edmx/>");
        assert_eq!(record.metadata_encoding, MetadataEncoding::Xml);
    }

    #[test]
    fn json_metadata_column() {
        let record = normalize_row(&row(json!({
            "service_name": "api",
            "base_url": "http://api",
            "metadata_json": "{\"entities\": []}",
        })));
        assert_eq!(record.metadata_encoding, MetadataEncoding::Json);
        assert_eq!(record.base_url.as_deref(), Some("http://api"));
    }

    #[test]
    fn precedence_when_several_columns_present() {
        let record = normalize_row(&row(json!({
            "name": "primary",
            "service_name": "secondary",
            "service_url": "http://first",
            "service_base_url": "http://second",
            "metadata_xml": "<xml-first/>",
            "metadata": "<xml-second/>",
        })));
        assert_eq!(record.name, "primary");
        assert_eq!(record.base_url.as_deref(), Some("http://first"));
        assert_eq!(record.raw_metadata, "<xml-first/>");
    }

    #[test]
    fn empty_values_fall_through() {
        let record = normalize_row(&row(json!({
            "name": "",
            "service_name": "fallback",
            "service_url": null,
            "service_base_url": "http://fallback",
            "metadata_xml": "   ",
            "metadata_json": "{}",
        })));
        assert_eq!(record.name, "fallback");
        assert_eq!(record.base_url.as_deref(), Some("http://fallback"));
        assert_eq!(record.raw_metadata, "{}");
        assert_eq!(record.metadata_encoding, MetadataEncoding::Json);
    }

    #[test]
    fn explicit_encoding_and_mode() {
        let record = normalize_row(&row(json!({
            "name": "s",
            "metadata": "{}",
            "metadata_encoding": "JSON",
            "route_mode": "list",
        })));
        assert_eq!(record.metadata_encoding, MetadataEncoding::Json);
        assert_eq!(record.mode, Some(RouteMode::List));
    }

    #[test]
    fn active_flag_forms() {
        let cases = [
            (json!(1), true),
            (json!(0), false),
            (json!(true), true),
            (json!(false), false),
            (json!("1"), true),
            (json!("0"), false),
            (json!("TRUE"), true),
            (json!(null), false),
        ];
        for (value, expected) in cases {
            let record = normalize_row(&row(json!({ "name": "s", "active": value })));
            assert_eq!(record.active, expected, "active = {value}");
        }

        let record = normalize_row(&row(json!({ "name": "s" })));
        assert!(record.active);
    }

    #[test]
    fn nameless_row_is_total() {
        let record = normalize_row(&RawServiceRow::new());
        assert_eq!(record.name, "");
        assert!(!record.has_metadata());
        assert!(record.active);
    }

    #[test]
    fn inactive_rows_filtered() {
        let rows = vec![
            row(json!({ "name": "a", "active": 1 })),
            row(json!({ "name": "b", "active": 0 })),
            row(json!({ "name": "c" })),
        ];
        let names: Vec<String> = load_active_services(&rows)
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["a", "c"]);
    }
}
