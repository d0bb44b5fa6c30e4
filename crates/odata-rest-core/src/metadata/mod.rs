//! Metadata interpretation: raw EDMX / JSON text → [`ServiceSchema`].
//!
//! Parsing is total. Any document that cannot be interpreted degrades to
//! [`ServiceSchema::empty`] and the reason is reported through
//! [`ParseOutcome`], so one bad service never aborts route generation for
//! the others.
//!
//! Three parser variants exist:
//! - **Rich EDMX** ([`ParserVariant::Rich`], the default): entity sets
//!   resolved against their entity types (keys, properties, navigation).
//!   An unresolvable entity type still yields the entity, with empty lists.
//! - **Minimal EDMX** ([`ParserVariant::Minimal`]): entity set names only.
//! - **JSON**: selected by [`MetadataEncoding::Json`]; the decoded document
//!   is trusted as already being in [`ServiceSchema`] shape.

mod edmx;
mod json;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{MetadataEncoding, ServiceSchema};

/// EDMX interpretation depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserVariant {
    /// Entity sets resolved to entity types (keys, properties, navigation).
    #[default]
    Rich,
    /// Entity set names only; no keys or properties.
    Minimal,
}

/// Options for [`parse_with`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// EDMX interpretation depth. Ignored for JSON metadata.
    pub variant: ParserVariant,
}

impl ParseOptions {
    /// Options selecting the given EDMX variant.
    #[must_use]
    pub const fn variant(variant: ParserVariant) -> Self {
        Self { variant }
    }
}

/// Why a document degraded to the empty schema.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Degradation {
    /// The document is not well-formed XML.
    MalformedXml(String),
    /// The document is not valid JSON or not in schema shape.
    MalformedJson(String),
    /// The root element is not `Edmx`.
    MissingEdmxRoot,
    /// The `Edmx` root has no `DataServices` child.
    MissingDataServices,
    /// No metadata text at all.
    Blank,
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedXml(reason) => write!(f, "malformed XML: {reason}"),
            Self::MalformedJson(reason) => write!(f, "malformed JSON: {reason}"),
            Self::MissingEdmxRoot => f.write_str("root element is not Edmx"),
            Self::MissingDataServices => f.write_str("Edmx root has no DataServices"),
            Self::Blank => f.write_str("metadata is empty"),
        }
    }
}

/// How a parse went. Never an error: degraded parses still carry a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// The document was interpreted (it may still declare zero entities).
    Complete,
    /// The document could not be interpreted; the schema is empty.
    Degraded(Degradation),
}

/// A schema together with the outcome that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSchema {
    /// The interpreted (or empty) schema.
    pub schema: ServiceSchema,
    /// Whether interpretation succeeded.
    pub outcome: ParseOutcome,
}

impl ParsedSchema {
    pub(crate) fn complete(schema: ServiceSchema) -> Self {
        Self {
            schema,
            outcome: ParseOutcome::Complete,
        }
    }

    pub(crate) fn degraded(reason: Degradation) -> Self {
        Self {
            schema: ServiceSchema::empty(),
            outcome: ParseOutcome::Degraded(reason),
        }
    }

    /// The degradation reason, if any.
    #[must_use]
    pub fn degradation(&self) -> Option<&Degradation> {
        match &self.outcome {
            ParseOutcome::Complete => None,
            ParseOutcome::Degraded(reason) => Some(reason),
        }
    }
}

/// Parse raw metadata with the rich EDMX parser (or the JSON parser).
///
/// Never fails: malformed input yields `{version: "v2", entities: []}`.
///
/// ```
/// use odata_rest_core::{parse, MetadataEncoding, ODataVersion};
///
/// let schema = parse("<not-xml", MetadataEncoding::Xml);
/// assert!(schema.entities.is_empty());
/// assert_eq!(schema.version, ODataVersion::V2);
/// ```
#[must_use]
pub fn parse(raw: &str, encoding: MetadataEncoding) -> ServiceSchema {
    parse_detailed(raw, encoding, ParseOptions::default()).schema
}

/// Parse raw metadata with explicit options.
#[must_use]
pub fn parse_with(raw: &str, encoding: MetadataEncoding, options: ParseOptions) -> ServiceSchema {
    parse_detailed(raw, encoding, options).schema
}

/// Parse raw metadata and report whether the document degraded.
#[must_use]
pub fn parse_detailed(raw: &str, encoding: MetadataEncoding, options: ParseOptions) -> ParsedSchema {
    if raw.trim().is_empty() {
        return ParsedSchema::degraded(Degradation::Blank);
    }

    let parsed = match encoding {
        MetadataEncoding::Xml => edmx::parse(raw, options.variant),
        MetadataEncoding::Json => json::parse(raw),
    };

    match &parsed.outcome {
        ParseOutcome::Complete => tracing::debug!(
            version = %parsed.schema.version,
            entities = parsed.schema.entities.len(),
            "parsed service metadata",
        ),
        ParseOutcome::Degraded(reason) => {
            tracing::debug!(%reason, "metadata degraded to empty schema");
        }
    }

    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_metadata_degrades() {
        for encoding in [MetadataEncoding::Xml, MetadataEncoding::Json] {
            let parsed = parse_detailed("  \n", encoding, ParseOptions::default());
            assert_eq!(parsed.degradation(), Some(&Degradation::Blank));
            assert_eq!(parsed.schema, ServiceSchema::empty());
        }
    }

    #[test]
    fn degradation_display() {
        assert_eq!(
            Degradation::MissingDataServices.to_string(),
            "Edmx root has no DataServices",
        );
        assert_eq!(
            Degradation::MalformedXml("eof".to_string()).to_string(),
            "malformed XML: eof",
        );
    }
}
