//! Document-level configuration loaded from YAML.
//!
//! # File format
//!
//! ```yaml
//! title: OData OpenAPI Bridge
//! version: 1.0.0
//! description: Dynamically generated API from OData services
//! error_schema_ref: "#/components/schemas/ErrorResponse"
//! servers:
//!   - url: https://gateway.example.com
//!     description: Production
//! ```

use std::path::Path;

use serde::Deserialize;

/// Default document title.
pub const DEFAULT_TITLE: &str = "OData OpenAPI Bridge";
/// Default document version.
pub const DEFAULT_VERSION: &str = "1.0.0";
/// Default document description.
pub const DEFAULT_DESCRIPTION: &str = "Dynamically generated API from OData services";

/// `info`, `servers` and error schema settings shared by every document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// `info.title`.
    pub title: String,
    /// `info.version`.
    pub version: String,
    /// `info.description`.
    pub description: String,
    /// `$ref` of the error response schema.
    pub error_schema_ref: String,
    /// `servers` entries. Omitted from documents when empty.
    pub servers: Vec<ServerEntry>,
}

/// One `servers` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerEntry {
    /// Server URL.
    pub url: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            version: DEFAULT_VERSION.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            error_schema_ref: crate::DEFAULT_ERROR_SCHEMA_REF.to_string(),
            servers: Vec::new(),
        }
    }
}

impl DocumentConfig {
    /// Load config from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml_ng::from_str(&content)?;
        Ok(config)
    }
}
