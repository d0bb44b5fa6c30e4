#![allow(clippy::doc_markdown)] // README uses "OpenAPI" and "OData" proper nouns throughout
#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! ## API Reference
//!
//! - [`ApiCatalog`]: route descriptors → full and per-service documents
//! - [`DocumentConfig`]: document `info`, `servers` and error schema `$ref`
//! - [`entity_schema`] / [`property_schema`] / [`edm_json_type`]: EDM → JSON Schema
//! - [`to_json`] / [`to_yaml`]: document rendering

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod document;
mod error;
mod helpers;
mod schema;

/// Default `$ref` path for the error response schema.
///
/// Override via [`DocumentConfig::error_schema_ref`] when the document is
/// merged into one that names its error component differently.
pub const DEFAULT_ERROR_SCHEMA_REF: &str = "#/components/schemas/ErrorResponse";

pub use config::{
    DocumentConfig, ServerEntry, DEFAULT_DESCRIPTION, DEFAULT_TITLE, DEFAULT_VERSION,
};
pub use document::ApiCatalog;
pub use error::{Error, Result};
pub use helpers::{component_name, to_json, to_yaml};
pub use schema::{
    collection_schema, edm_json_type, entity_schema, error_response_schema, property_schema,
};
