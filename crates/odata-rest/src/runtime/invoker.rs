//! Upstream OData invocation: one authenticated `GET` per request, no retries.

use http::header::ACCEPT;
use serde_json::Value;

use super::config::{ConfigError, UpstreamConfig};
use super::error::UpstreamError;
use super::normalize::normalize_error;
use super::query::ODataQuery;

/// Authenticated client for upstream OData services.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    config: UpstreamConfig,
}

impl UpstreamClient {
    /// Build a client with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HttpClient`] if the TLS backend cannot be initialized.
    pub fn new(config: UpstreamConfig) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    /// The configuration this client was built from.
    #[must_use]
    pub const fn config(&self) -> &UpstreamConfig {
        &self.config
    }

    /// Effective base URL for a service: the global one, else the record's.
    #[must_use]
    pub fn resolve_base_url(&self, record_base_url: Option<&str>) -> Option<String> {
        self.config
            .base_url
            .as_deref()
            .or(record_base_url)
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(|url| url.trim_end_matches('/').to_string())
    }

    /// Call `GET {base_url}/{service}/{entity}` with the given options.
    ///
    /// # Errors
    ///
    /// - `503` when the upstream cannot be reached or times out
    /// - the upstream's own status with a normalized body for non-2xx responses
    /// - `502` when a 2xx body is not JSON
    pub async fn invoke(
        &self,
        base_url: &str,
        service_name: &str,
        entity_name: &str,
        query: &ODataQuery,
    ) -> Result<Value, UpstreamError> {
        let url = entity_url(base_url, service_name, entity_name);
        tracing::debug!(%url, params = query.to_pairs().len(), "invoking upstream");

        let response = self
            .request(&url, "application/json", query)
            .send()
            .await
            .map_err(|err| transport_error(&url, &err))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| transport_error(&url, &err))?;

        if !status.is_success() {
            tracing::debug!(%url, status = status.as_u16(), "upstream returned an error");
            return Err(normalize_error(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|err| {
            tracing::warn!(%url, error = %err, "upstream returned a non-JSON body");
            UpstreamError::bad_gateway(format!("upstream returned a non-JSON body: {err}"))
        })
    }

    /// Fetch a service's raw `$metadata` document.
    ///
    /// # Errors
    ///
    /// `503` on transport failure, the normalized upstream error otherwise.
    pub async fn fetch_metadata(
        &self,
        base_url: &str,
        service_name: &str,
    ) -> Result<String, UpstreamError> {
        let url = entity_url(base_url, service_name, "$metadata");
        tracing::info!(%url, "fetching service metadata");

        let response = self
            .request(&url, "application/xml", &ODataQuery::default())
            .send()
            .await
            .map_err(|err| transport_error(&url, &err))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| transport_error(&url, &err))?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(normalize_error(status.as_u16(), &body))
        }
    }

    fn request(&self, url: &str, accept: &str, query: &ODataQuery) -> reqwest::RequestBuilder {
        let credentials = &self.config.credentials;
        let mut request = self
            .http
            .get(url)
            .basic_auth(&credentials.user, Some(&credentials.password))
            .header(ACCEPT, accept);
        let pairs = query.to_pairs();
        if !pairs.is_empty() {
            request = request.query(&pairs);
        }
        request
    }
}

/// `{base_url}/{service}/{entity}` with redundant separators trimmed.
///
/// ```
/// use odata_rest::entity_url;
///
/// assert_eq!(
///     entity_url("http://example.com/", "/demo/", "Products"),
///     "http://example.com/demo/Products",
/// );
/// ```
#[must_use]
pub fn entity_url(base_url: &str, service_name: &str, entity_name: &str) -> String {
    format!(
        "{}/{}/{}",
        base_url.trim().trim_end_matches('/'),
        service_name.trim().trim_matches('/'),
        entity_name.trim().trim_matches('/'),
    )
}

fn transport_error(url: &str, err: &reqwest::Error) -> UpstreamError {
    tracing::warn!(%url, error = %err, timeout = err.is_timeout(), "upstream unreachable");
    UpstreamError::service_unavailable(err.to_string())
}
