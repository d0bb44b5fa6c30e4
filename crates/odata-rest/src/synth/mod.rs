//! Route synthesis: service records → registered collection routes.
//!
//! For each active service the metadata is parsed, one
//! [`RouteDescriptor`] is built per entity, and a generic
//! [`EntityHandler`] capturing `{service, entity, base_url}` is registered
//! through a [`RouteRegistrar`]. A service that cannot be synthesized (bad
//! metadata, unregistrable path) is logged and skipped; every other service
//! still registers. An `invoke`-mode service without a base URL is a startup
//! error, caught by [`Synthesizer::validate`] before synthesis.

mod handler;
mod registrar;

use std::collections::HashMap;

use odata_rest_core::{
    describe_service, parse_detailed, ParseOptions, RouteDescriptor, RouteMode, RouteOptions,
    ServiceRecord,
};

pub use handler::EntityHandler;
pub use registrar::{AxumRegistrar, RouteError, RouteRegistrar, RESERVED_ROOTS};

use crate::runtime::{ConfigError, UpstreamClient};

/// Result of one generation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Synthesis {
    /// Routes that were registered, in registration order.
    pub routes: Vec<RouteDescriptor>,
    /// Services that were synthesized (possibly with zero routes), in store order.
    pub services: Vec<String>,
}

impl Synthesis {
    /// Whether `service` took part in this pass.
    #[must_use]
    pub fn has_service(&self, service: &str) -> bool {
        self.services.iter().any(|s| s == service)
    }

    /// Routes tagged with `service`.
    pub fn routes_for<'a>(&'a self, service: &'a str) -> impl Iterator<Item = &'a RouteDescriptor> {
        self.routes.iter().filter(move |r| r.service_tag == service)
    }
}

/// Builds and registers collection routes for a set of services.
#[derive(Debug, Clone, Default)]
pub struct Synthesizer {
    upstream: Option<UpstreamClient>,
    prefix: Option<String>,
    default_mode: RouteMode,
    service_modes: HashMap<String, RouteMode>,
    parse: ParseOptions,
}

impl Synthesizer {
    /// A synthesizer proxying through `upstream`.
    ///
    /// With `None`, only `list`-mode services can be synthesized.
    #[must_use]
    pub fn new(upstream: Option<UpstreamClient>) -> Self {
        Self {
            upstream,
            ..Self::default()
        }
    }

    /// Place every route under a leading path segment (e.g. `invoke`).
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.prefix = (!prefix.trim_matches('/').is_empty()).then_some(prefix);
        self
    }

    /// Mode for services without a per-service or per-record override.
    #[must_use]
    pub const fn with_default_mode(mut self, mode: RouteMode) -> Self {
        self.default_mode = mode;
        self
    }

    /// Override the mode of one service.
    #[must_use]
    pub fn with_service_mode(mut self, service: impl Into<String>, mode: RouteMode) -> Self {
        self.service_modes.insert(service.into(), mode);
        self
    }

    /// EDMX parser options.
    #[must_use]
    pub const fn with_parse_options(mut self, parse: ParseOptions) -> Self {
        self.parse = parse;
        self
    }

    /// Effective mode: per-service override, then the record's own, then the default.
    #[must_use]
    pub fn mode_for(&self, record: &ServiceRecord) -> RouteMode {
        self.service_modes
            .get(&record.name)
            .copied()
            .or(record.mode)
            .unwrap_or(self.default_mode)
    }

    /// Check that every active `invoke`-mode service can reach an upstream.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingBaseUrl`] for the first such service
    /// with neither a global nor a per-record base URL.
    pub fn validate(&self, records: &[ServiceRecord]) -> Result<(), ConfigError> {
        let invoke = records.iter().filter(|record| {
            record.active && !record.name.is_empty() && self.mode_for(record) == RouteMode::Invoke
        });
        for record in invoke {
            let base_url = match &self.upstream {
                Some(client) => client.resolve_base_url(record.base_url.as_deref()),
                None => record.base_url.clone().filter(|url| !url.trim().is_empty()),
            };
            if base_url.is_none() {
                return Err(ConfigError::MissingBaseUrl {
                    service: record.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Synthesize and register routes for `records`.
    ///
    /// Inactive records are skipped. Never fails as a whole: every problem is
    /// confined to the service (or route) it concerns.
    pub fn synthesize<R: RouteRegistrar>(
        &self,
        records: &[ServiceRecord],
        registrar: &mut R,
    ) -> Synthesis {
        let mut synthesis = Synthesis::default();

        for record in records {
            if !record.active {
                tracing::debug!(service = %record.name, "skipping inactive service");
                continue;
            }
            if record.name.is_empty() {
                tracing::warn!(id = ?record.id, "skipping service without a name");
                continue;
            }

            let mode = self.mode_for(record);
            let backend = match mode {
                RouteMode::List => None,
                RouteMode::Invoke => {
                    let Some(client) = &self.upstream else {
                        tracing::warn!(
                            service = %record.name,
                            "skipping invoke-mode service: no upstream client configured",
                        );
                        continue;
                    };
                    let Some(base_url) = client.resolve_base_url(record.base_url.as_deref())
                    else {
                        tracing::warn!(
                            service = %record.name,
                            "skipping invoke-mode service: no base URL",
                        );
                        continue;
                    };
                    Some((client, base_url))
                }
            };

            let descriptors = self.describe_one(record);
            let mut registered = 0_usize;
            for descriptor in descriptors {
                let handler = match &backend {
                    None => EntityHandler::placeholder(&record.name, &descriptor.entity.name),
                    Some((client, base_url)) => EntityHandler::upstream(
                        (*client).clone(),
                        base_url.clone(),
                        &record.name,
                        &descriptor.entity.name,
                    ),
                };

                match registrar.register(&descriptor, handler) {
                    Ok(()) => {
                        registered += 1;
                        synthesis.routes.push(descriptor);
                    }
                    Err(err) => tracing::warn!(service = %record.name, error = %err, "route skipped"),
                }
            }

            tracing::info!(service = %record.name, %mode, routes = registered, "synthesized service");
            synthesis.services.push(record.name.clone());
        }

        tracing::info!(
            services = synthesis.services.len(),
            routes = synthesis.routes.len(),
            "route synthesis complete",
        );
        synthesis
    }

    fn describe_one(&self, record: &ServiceRecord) -> Vec<RouteDescriptor> {
        let parsed = parse_detailed(&record.raw_metadata, record.metadata_encoding, self.parse);
        if let Some(reason) = parsed.degradation() {
            tracing::warn!(service = %record.name, %reason, "metadata unusable; service has no routes");
        }

        let options = RouteOptions {
            prefix: self.prefix.clone(),
            mode: self.mode_for(record),
        };
        describe_service(record, &parsed.schema, &options)
    }
}
