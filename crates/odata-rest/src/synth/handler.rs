//! The one generic collection handler, parameterized by captured identity.

use odata_rest_core::RouteMode;
use serde_json::Value;

use crate::runtime::{ODataQuery, UpstreamClient, UpstreamError};

#[derive(Debug, Clone)]
enum Backend {
    Placeholder,
    Upstream {
        client: UpstreamClient,
        base_url: String,
    },
}

/// Serves one `(service, entity)` collection route.
///
/// Query options are validated first in both modes, so an out-of-range
/// `$top`/`$skip` is rejected identically whether or not the route proxies.
#[derive(Debug, Clone)]
pub struct EntityHandler {
    service_name: String,
    entity_name: String,
    backend: Backend,
}

impl EntityHandler {
    /// A `list`-mode handler: answers `{"value": []}` without contacting the upstream.
    #[must_use]
    pub fn placeholder(service_name: impl Into<String>, entity_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            entity_name: entity_name.into(),
            backend: Backend::Placeholder,
        }
    }

    /// An `invoke`-mode handler forwarding to `{base_url}/{service}/{entity}`.
    #[must_use]
    pub fn upstream(
        client: UpstreamClient,
        base_url: impl Into<String>,
        service_name: impl Into<String>,
        entity_name: impl Into<String>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            entity_name: entity_name.into(),
            backend: Backend::Upstream {
                client,
                base_url: base_url.into(),
            },
        }
    }

    /// The route mode this handler implements.
    #[must_use]
    pub const fn mode(&self) -> RouteMode {
        match self.backend {
            Backend::Placeholder => RouteMode::List,
            Backend::Upstream { .. } => RouteMode::Invoke,
        }
    }

    /// Handle one request given its raw query pairs.
    ///
    /// # Errors
    ///
    /// `400` for invalid options, otherwise whatever the upstream call yields.
    pub async fn handle<K, V>(&self, pairs: &[(K, V)]) -> Result<Value, UpstreamError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let query = ODataQuery::from_pairs(pairs).map_err(|err| {
            tracing::debug!(
                service = %self.service_name,
                entity = %self.entity_name,
                error = %err,
                "rejected query options",
            );
            UpstreamError::from(err)
        })?;

        match &self.backend {
            Backend::Placeholder => Ok(serde_json::json!({ "value": [] })),
            Backend::Upstream { client, base_url } => {
                client
                    .invoke(base_url, &self.service_name, &self.entity_name, &query)
                    .await
            }
        }
    }
}
