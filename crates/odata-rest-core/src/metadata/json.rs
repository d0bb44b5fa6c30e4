//! Pre-normalized JSON metadata: the document is already a [`ServiceSchema`].

use super::{Degradation, ParsedSchema};
use crate::model::ServiceSchema;

pub(super) fn parse(raw: &str) -> ParsedSchema {
    match serde_json::from_str::<ServiceSchema>(raw) {
        Ok(mut schema) => {
            // Entity names become path segments; an unnamed entity has no route.
            schema.entities.retain(|e| !e.name.trim().is_empty());
            ParsedSchema::complete(schema)
        }
        Err(err) => ParsedSchema::degraded(Degradation::MalformedJson(err.to_string())),
    }
}
