//! Service schema and service record types.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// OData protocol generation of a service's metadata.
///
/// Serialized as `"v2"` / `"v4"`. Deserialization is lenient so stored JSON
/// metadata written by other tools (`"4.0"`, `"V4"`, `4`) still maps correctly:
/// anything whose major version is `4` is [`ODataVersion::V4`], everything
/// else is [`ODataVersion::V2`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ODataVersion {
    /// OData v2 (and anything not recognized as v4).
    #[default]
    V2,
    /// OData v4.
    V4,
}

impl ODataVersion {
    /// Map a version string (`"4.0"`, `"v4"`, `"1.0"`, ...) to a version tag.
    ///
    /// ```
    /// use odata_rest_core::ODataVersion;
    ///
    /// assert_eq!(ODataVersion::from_version_str("4.0"), ODataVersion::V4);
    /// assert_eq!(ODataVersion::from_version_str("1.0"), ODataVersion::V2);
    /// assert_eq!(ODataVersion::from_version_str(""), ODataVersion::V2);
    /// ```
    #[must_use]
    pub fn from_version_str(raw: &str) -> Self {
        let trimmed = raw.trim();
        let unprefixed = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);
        match unprefixed.split('.').next() {
            Some("4") => Self::V4,
            _ => Self::V2,
        }
    }

    /// Canonical tag (`"v2"` or `"v4"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::V2 => "v2",
            Self::V4 => "v4",
        }
    }
}

impl fmt::Display for ODataVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ODataVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ODataVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(match value {
            serde_json::Value::String(s) => Self::from_version_str(&s),
            serde_json::Value::Number(n) => Self::from_version_str(&n.to_string()),
            _ => Self::V2,
        })
    }
}

/// How a service record's raw metadata is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataEncoding {
    /// EDMX XML document (OData v2 or v4).
    #[default]
    Xml,
    /// Pre-normalized JSON already in [`ServiceSchema`] shape.
    Json,
}

impl MetadataEncoding {
    /// Parse an encoding name (`"xml"` / `"json"`, case-insensitive).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "xml" | "edmx" => Some(Self::Xml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Entity model of one OData service.
///
/// Always well-formed: a document that cannot be interpreted yields
/// [`ServiceSchema::empty`], never a partially populated schema.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServiceSchema {
    /// Protocol generation derived from the EDMX root.
    #[serde(default)]
    pub version: ODataVersion,
    /// Entity sets exposed by the service, in document order.
    #[serde(default)]
    pub entities: Vec<EntityDef>,
}

impl ServiceSchema {
    /// The safe default: `{version: "v2", entities: []}`.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            version: ODataVersion::V2,
            entities: Vec::new(),
        }
    }

    /// Look up an entity by exact name.
    #[must_use]
    pub fn entity(&self, name: &str) -> Option<&EntityDef> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// Whether the schema exposes no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// One queryable entity set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EntityDef {
    /// Entity set name. Never empty once a schema has been parsed.
    #[serde(default)]
    pub name: String,
    /// Key property names from `Key/PropertyRef`.
    #[serde(default)]
    pub keys: Vec<String>,
    /// Declared structural properties.
    #[serde(default)]
    pub properties: Vec<PropertyDef>,
    /// Declared navigation properties.
    #[serde(default, alias = "navigationProperties")]
    pub navigation: Vec<NavigationDef>,
}

/// A structural property of an entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDef {
    /// Property name.
    pub name: String,
    /// Declared EDM type (e.g. `Edm.String`).
    #[serde(rename = "type", default = "default_edm_type")]
    pub type_name: String,
    /// `false` only when the vendor `filterable` attribute is exactly `"false"`.
    #[serde(default = "default_true")]
    pub filterable: bool,
    /// `false` only when `Nullable` is exactly `"false"`.
    #[serde(default = "default_true")]
    pub nullable: bool,
    /// Display label (vendor `label` attribute).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Declared `MaxLength`, when numeric.
    #[serde(
        default,
        alias = "length",
        alias = "maxLength",
        deserialize_with = "lenient_length",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_length: Option<u32>,
}

impl PropertyDef {
    /// A filterable, nullable property with no label or length.
    #[must_use]
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            filterable: true,
            nullable: true,
            label: None,
            max_length: None,
        }
    }
}

/// A navigation property (relationship to another entity type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationDef {
    /// Navigation property name.
    pub name: String,
    /// Target entity type name (namespace stripped) or, for v2, the target role.
    #[serde(default, alias = "type", skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// Default EDM type for properties declared without one.
pub const DEFAULT_EDM_TYPE: &str = "Edm.String";

fn default_edm_type() -> String {
    DEFAULT_EDM_TYPE.to_string()
}

const fn default_true() -> bool {
    true
}

/// Accept `MaxLength` as a number or a numeric string; anything else is `None`.
fn lenient_length<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Route-shape mode for a service's synthesized collection routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteMode {
    /// Live proxying: each request performs the upstream call.
    #[default]
    Invoke,
    /// Contract scaffolding: a static empty placeholder, no upstream call.
    List,
}

impl RouteMode {
    /// Parse a mode name (`"invoke"` / `"list"`, case-insensitive).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "invoke" => Some(Self::Invoke),
            "list" => Some(Self::List),
            _ => None,
        }
    }

    /// Lowercase mode name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Invoke => "invoke",
            Self::List => "list",
        }
    }
}

impl fmt::Display for RouteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical service record, produced by [`normalize_row`](crate::normalize_row).
///
/// Immutable for the lifetime of one generation pass.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServiceRecord {
    /// Store identifier, when the row carried one.
    pub id: Option<String>,
    /// Service name; also the route path segment and document tag.
    pub name: String,
    /// Upstream base URL, when the row carried one.
    pub base_url: Option<String>,
    /// Raw metadata document (EDMX XML or JSON).
    pub raw_metadata: String,
    /// Encoding of [`raw_metadata`](Self::raw_metadata).
    pub metadata_encoding: MetadataEncoding,
    /// Inactive records never produce routes.
    pub active: bool,
    /// Per-record route mode, overriding the gateway default.
    pub mode: Option<RouteMode>,
}

impl ServiceRecord {
    /// An active record with XML metadata.
    #[must_use]
    pub fn new(name: impl Into<String>, raw_metadata: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            base_url: None,
            raw_metadata: raw_metadata.into(),
            metadata_encoding: MetadataEncoding::Xml,
            active: true,
            mode: None,
        }
    }

    /// Set the upstream base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the metadata encoding.
    #[must_use]
    pub fn with_encoding(mut self, encoding: MetadataEncoding) -> Self {
        self.metadata_encoding = encoding;
        self
    }

    /// Set the active flag.
    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Set a per-record route mode.
    #[must_use]
    pub fn with_mode(mut self, mode: RouteMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Whether the record has any metadata text at all.
    #[must_use]
    pub fn has_metadata(&self) -> bool {
        !self.raw_metadata.trim().is_empty()
    }
}
