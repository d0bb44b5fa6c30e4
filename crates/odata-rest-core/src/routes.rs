//! Route descriptors: one `GET` collection route per (service, entity).
//!
//! Construction here is pure. Registering handlers against a router is the
//! runtime's job (`odata-rest`), and publishing documents is
//! `odata-rest-openapi`'s; both consume the same [`RouteDescriptor`]s so a
//! per-service document can be sliced out of the full route set by
//! [`RouteDescriptor::service_tag`] alone.

use std::fmt;

use crate::model::{EntityDef, RouteMode, ServiceRecord, ServiceSchema};

/// HTTP method of a synthesized route. Only reads are synthesized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RouteMethod {
    /// `GET`
    #[default]
    Get,
}

impl RouteMethod {
    /// Lowercase method name, as used for OpenAPI path item keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
        }
    }
}

impl fmt::Display for RouteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => f.write_str("GET"),
        }
    }
}

/// Value shape of a query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Integer with an inclusive lower bound.
    Integer {
        /// Smallest accepted value.
        minimum: i64,
    },
    /// Free-form string, forwarded unvalidated.
    String,
}

/// One accepted query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    /// Wire name, including the `$` prefix.
    pub name: &'static str,
    /// Value shape and bounds.
    pub kind: ParamKind,
    /// Human-readable description for published documents.
    pub description: &'static str,
}

/// The OData system query options accepted by every collection route.
pub const ODATA_QUERY_PARAMS: [ParamSpec; 5] = [
    ParamSpec {
        name: "$top",
        kind: ParamKind::Integer { minimum: 1 },
        description: "Maximum number of entries to return",
    },
    ParamSpec {
        name: "$skip",
        kind: ParamKind::Integer { minimum: 0 },
        description: "Number of entries to skip",
    },
    ParamSpec {
        name: "$filter",
        kind: ParamKind::String,
        description: "OData filter expression",
    },
    ParamSpec {
        name: "$select",
        kind: ParamKind::String,
        description: "Comma-separated list of properties to return",
    },
    ParamSpec {
        name: "$orderby",
        kind: ParamKind::String,
        description: "Sort order, e.g. `Name desc`",
    },
];

/// Look up one of [`ODATA_QUERY_PARAMS`] by wire name.
#[must_use]
pub fn query_param(name: &str) -> Option<&'static ParamSpec> {
    ODATA_QUERY_PARAMS.iter().find(|p| p.name == name)
}

/// A synthesized collection route. Ephemeral: built and consumed within one
/// generation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDescriptor {
    /// Absolute router path (e.g. `/demo/Products`).
    pub path: String,
    /// Always [`RouteMethod::Get`].
    pub method: RouteMethod,
    /// Grouping tag; equals the service name.
    pub service_tag: String,
    /// Service name as stored (untrimmed of inner slashes).
    pub service_name: String,
    /// The entity this route serves.
    pub entity: EntityDef,
    /// Whether the route proxies upstream or returns a placeholder.
    pub mode: RouteMode,
    /// Stable operation identifier (`{mode}_{service}_{entity}`, sanitized).
    pub operation_id: String,
    /// One-line operation summary.
    pub summary: String,
    /// Accepted query parameters.
    pub query_params: Vec<ParamSpec>,
}

/// How a service's routes are shaped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteOptions {
    /// Leading path segment(s) placed before the service name (e.g. `invoke`).
    pub prefix: Option<String>,
    /// Mode applied to every route of the service.
    pub mode: RouteMode,
}

impl RouteOptions {
    /// Options with the given mode and no prefix.
    #[must_use]
    pub const fn mode(mode: RouteMode) -> Self {
        Self { prefix: None, mode }
    }

    /// Set the path prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }
}

/// Join path parts into an absolute router path.
///
/// Each part is trimmed of leading/trailing `/`; empty parts are skipped.
/// Returns `None` when nothing remains.
///
/// ```
/// use odata_rest_core::route_path;
///
/// assert_eq!(route_path(None, "/demo/", "Products").as_deref(), Some("/demo/Products"));
/// assert_eq!(
///     route_path(Some("invoke"), "sap/opu/odata/ZSRV", "Orders").as_deref(),
///     Some("/invoke/sap/opu/odata/ZSRV/Orders"),
/// );
/// assert_eq!(route_path(None, "/", ""), None);
/// ```
#[must_use]
pub fn route_path(prefix: Option<&str>, service: &str, entity: &str) -> Option<String> {
    let segments: Vec<&str> = [prefix.unwrap_or_default(), service, entity]
        .into_iter()
        .map(|part| part.trim().trim_matches('/'))
        .filter(|part| !part.is_empty())
        .collect();

    if segments.is_empty() {
        None
    } else {
        Some(format!("/{}", segments.join("/")))
    }
}

/// Describe every collection route of one service.
///
/// One descriptor per entity, in schema order. Entities whose name trims to
/// nothing are skipped.
#[must_use]
pub fn describe_service(
    record: &ServiceRecord,
    schema: &ServiceSchema,
    options: &RouteOptions,
) -> Vec<RouteDescriptor> {
    schema
        .entities
        .iter()
        .filter(|entity| !entity.name.trim().trim_matches('/').is_empty())
        .filter_map(|entity| {
            let path = route_path(options.prefix.as_deref(), &record.name, &entity.name)?;
            Some(RouteDescriptor {
                path,
                method: RouteMethod::Get,
                service_tag: record.name.clone(),
                service_name: record.name.clone(),
                entity: entity.clone(),
                mode: options.mode,
                operation_id: operation_id(options.mode, &record.name, &entity.name),
                summary: summary(options.mode, &record.name, &entity.name),
                query_params: ODATA_QUERY_PARAMS.to_vec(),
            })
        })
        .collect()
}

/// `{mode}_{service}_{entity}` with every non-alphanumeric character as `_`.
#[must_use]
pub fn operation_id(mode: RouteMode, service: &str, entity: &str) -> String {
    format!("{mode}_{service}_{entity}")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn summary(mode: RouteMode, service: &str, entity: &str) -> String {
    match mode {
        RouteMode::Invoke => format!("Invoke {entity} from {service}"),
        RouteMode::List => format!("List {entity} from {service}"),
    }
}
