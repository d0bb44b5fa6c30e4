#![allow(clippy::doc_markdown)] // README uses "OData", "OpenAPI" and "SQLite" proper nouns throughout
#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! ## API Reference
//!
//! - [`GatewayConfig`]: YAML gateway configuration
//! - [`ServiceStore`] / [`SqliteServiceStore`]: raw service rows
//! - [`load_records`] / [`backfill_metadata`] / [`upstream_client`]: startup steps
//! - [`Gateway`]: synthesized router plus document endpoints

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod app;
mod config;
mod store;

pub use app::{backfill_metadata, load_records, upstream_client, Gateway};
pub use config::{
    GatewayConfig, RoutesConfig, UpstreamSettings, DEFAULT_DATABASE, DEFAULT_TABLE,
};
pub use store::{ServiceStore, SqliteServiceStore, StoreError};
