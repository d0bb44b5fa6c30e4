#![allow(clippy::doc_markdown)] // README uses "OData" and "OpenAPI" proper nouns throughout
#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! ## API Reference
//!
//! # Types
//!
//! - [`Synthesizer`]: Parses service metadata and registers one route per entity
//! - [`AxumRegistrar`]: [`RouteRegistrar`] building an [`axum::Router`]
//! - [`EntityHandler`]: The generic collection handler (`invoke` or `list`)
//! - [`UpstreamClient`]: Authenticated upstream OData client
//! - [`UpstreamError`]: The `{status_code, message, details}` error response
//! - [`normalize_error`]: Flattens upstream error bodies
//!
//! # Companion Crates
//!
//! | Crate                 | Purpose                                   |
//! |-----------------------|-------------------------------------------|
//! | `odata-rest-core`     | Service model, metadata parsing, route descriptors |
//! | `odata-rest` (this)   | Runtime: handlers, upstream calls, errors |
//! | `odata-rest-openapi`  | OpenAPI documents for synthesized routes  |

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod runtime;
mod synth;

pub use runtime::*;
pub use synth::{
    AxumRegistrar, EntityHandler, RouteError, RouteRegistrar, Synthesis, Synthesizer,
    RESERVED_ROOTS,
};
