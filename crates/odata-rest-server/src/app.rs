//! Gateway assembly: store rows → records → synthesized routes + documents.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use odata_rest::{AxumRegistrar, ConfigError, UpstreamClient, UpstreamConfig, UpstreamError};
use odata_rest_core::{load_active_services, MetadataEncoding, ServiceRecord};
use odata_rest_openapi::ApiCatalog;
use serde_json::Value;
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::store::{ServiceStore, StoreError};

/// A synthesized gateway, ready to serve.
#[derive(Debug, Clone)]
pub struct Gateway {
    router: Router,
    catalog: Arc<ApiCatalog>,
}

impl Gateway {
    /// Synthesize routes for `records` and mount the document endpoints.
    ///
    /// Registration completes before the router is returned; nothing is
    /// registered afterwards.
    #[must_use]
    pub fn build(
        config: &GatewayConfig,
        records: &[ServiceRecord],
        upstream: Option<UpstreamClient>,
    ) -> Self {
        let mut registrar = AxumRegistrar::new(Router::new());
        let synthesis = config.synthesizer(upstream).synthesize(records, &mut registrar);

        let catalog = Arc::new(ApiCatalog::new(
            synthesis.routes,
            synthesis.services,
            config.openapi.clone(),
        ));

        let documents = Router::new()
            .route("/openapi.json", get(openapi_document))
            .route("/tools/{*service}", get(service_document))
            .with_state(Arc::clone(&catalog));

        let router = registrar
            .into_router()
            .merge(documents)
            .layer(TraceLayer::new_for_http());

        Self { router, catalog }
    }

    /// The routes and services that were synthesized.
    #[must_use]
    pub fn catalog(&self) -> &ApiCatalog {
        &self.catalog
    }

    /// The complete router.
    #[must_use]
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `bind` until Ctrl+C or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound or the server fails.
    pub async fn serve(self, bind: SocketAddr) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(bind)
            .await
            .with_context(|| format!("failed to bind to {bind}"))?;
        tracing::info!(%bind, routes = self.catalog.routes().len(), "gateway listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("gateway server failure")
    }
}

/// Read the store and keep the active, normalized records.
///
/// # Errors
///
/// Returns the store error; a failed read aborts startup.
pub async fn load_records(store: &dyn ServiceStore) -> Result<Vec<ServiceRecord>, StoreError> {
    let rows = store.fetch_rows().await?;
    let records = load_active_services(&rows);
    tracing::info!(rows = rows.len(), active = records.len(), "loaded service records");
    Ok(records)
}

/// Build the upstream client when at least one record runs in `invoke` mode.
///
/// `load` supplies the connection settings
/// ([`UpstreamConfig::from_env`] in the binary); it is only called when a
/// client is needed.
///
/// # Errors
///
/// Returns [`ConfigError`] when credentials are missing, the global base URL
/// is invalid, or an `invoke`-mode service has no base URL at all.
pub fn upstream_client<F>(
    config: &GatewayConfig,
    records: &[ServiceRecord],
    load: F,
) -> anyhow::Result<Option<UpstreamClient>>
where
    F: FnOnce() -> Result<UpstreamConfig, ConfigError>,
{
    if !config.needs_upstream(records) && !config.upstream.fetch_missing_metadata {
        tracing::info!("no invoke-mode services; upstream client not configured");
        return Ok(None);
    }

    let upstream = load()
        .context("upstream configuration")?
        .with_timeout(config.upstream.timeout());
    if let Some(base_url) = &upstream.base_url {
        tracing::info!(%base_url, "global upstream base URL overrides per-service URLs");
    }
    let client = UpstreamClient::new(upstream)?;
    config
        .synthesizer(Some(client.clone()))
        .validate(records)
        .context("upstream configuration")?;
    Ok(Some(client))
}

/// Fetch `$metadata` for active records stored without metadata.
///
/// A failed fetch leaves the record empty; it then yields no routes.
/// Returns how many records were filled.
pub async fn backfill_metadata(client: &UpstreamClient, records: &mut [ServiceRecord]) -> usize {
    let mut filled = 0;
    for record in records
        .iter_mut()
        .filter(|r| r.active && !r.name.is_empty() && !r.has_metadata())
    {
        let Some(base_url) = client.resolve_base_url(record.base_url.as_deref()) else {
            tracing::warn!(service = %record.name, "no metadata and no base URL to fetch it from");
            continue;
        };
        match client.fetch_metadata(&base_url, &record.name).await {
            Ok(xml) => {
                record.raw_metadata = xml;
                record.metadata_encoding = MetadataEncoding::Xml;
                filled += 1;
            }
            Err(err) => tracing::warn!(service = %record.name, error = %err, "metadata fetch failed"),
        }
    }
    filled
}

async fn openapi_document(State(catalog): State<Arc<ApiCatalog>>) -> Json<Value> {
    Json(catalog.document())
}

async fn service_document(
    State(catalog): State<Arc<ApiCatalog>>,
    Path(service): Path<String>,
) -> Result<Json<Value>, UpstreamError> {
    let service = service.trim_matches('/');
    catalog
        .service_document(service)
        .map(Json)
        .ok_or_else(|| UpstreamError::not_found(format!("service '{service}' not found")))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
