#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! ## API Reference
//!
//! - [`parse`] / [`parse_with`] / [`parse_detailed`]: raw metadata → [`ServiceSchema`]
//! - [`normalize_row`] / [`load_active_services`]: store rows → [`ServiceRecord`]
//! - [`describe_service`]: [`ServiceRecord`] + [`ServiceSchema`] → [`RouteDescriptor`]s
//! - [`ODATA_QUERY_PARAMS`]: the five accepted OData query options

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod metadata;
mod model;
mod registry;
mod routes;

pub use metadata::{
    parse, parse_detailed, parse_with, Degradation, ParseOptions, ParseOutcome, ParsedSchema,
    ParserVariant,
};
pub use model::{
    EntityDef, MetadataEncoding, NavigationDef, ODataVersion, PropertyDef, RouteMode,
    ServiceRecord, ServiceSchema, DEFAULT_EDM_TYPE,
};
pub use registry::{load_active_services, normalize_row, RawServiceRow};
pub use routes::{
    describe_service, operation_id, query_param, route_path, ParamKind, ParamSpec,
    RouteDescriptor, RouteMethod, RouteOptions, ODATA_QUERY_PARAMS,
};
