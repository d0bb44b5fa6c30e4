//! Gateway configuration loaded from YAML.
//!
//! ```yaml
//! bind: 127.0.0.1:8000
//! database: ../shared.sqlite
//! table: odata_services
//! routes:
//!   prefix: invoke
//!   default_mode: list
//!   service_modes:
//!     ZSALES_SRV: invoke
//! upstream:
//!   timeout_secs: 5
//! openapi:
//!   title: Sales Gateway
//! ```
//!
//! Every key is optional.

use std::collections::BTreeMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use odata_rest::Synthesizer;
use odata_rest_core::{ParseOptions, ParserVariant, RouteMode, ServiceRecord};
use odata_rest_openapi::DocumentConfig;
use serde::{Deserialize, Deserializer};

/// Default store location, relative to the working directory.
pub const DEFAULT_DATABASE: &str = "../shared.sqlite";

/// Default service table.
pub const DEFAULT_TABLE: &str = "odata_services";

/// Top-level gateway configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listen address.
    pub bind: SocketAddr,
    /// SQLite file path or `sqlite:` URL.
    pub database: String,
    /// Table holding the service rows.
    pub table: String,
    /// Route shaping.
    pub routes: RoutesConfig,
    /// Upstream calls.
    pub upstream: UpstreamSettings,
    /// Document `info` and `servers`.
    pub openapi: DocumentConfig,
    /// `tracing` filter directive, overridden by `RUST_LOG`.
    pub log_filter: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::LOCALHOST, 8000)),
            database: DEFAULT_DATABASE.to_string(),
            table: DEFAULT_TABLE.to_string(),
            routes: RoutesConfig::default(),
            upstream: UpstreamSettings::default(),
            openapi: DocumentConfig::default(),
            log_filter: "info".to_string(),
        }
    }
}

/// `routes:` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RoutesConfig {
    /// Leading path segment for every synthesized route.
    pub prefix: Option<String>,
    /// Mode for services without an override.
    pub default_mode: RouteMode,
    /// EDMX interpretation depth.
    pub parser: ParserVariant,
    /// Per-service mode overrides, keyed by service name.
    pub service_modes: BTreeMap<String, RouteMode>,
}

/// `upstream:` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UpstreamSettings {
    /// Per-request timeout in seconds. Must be positive.
    #[serde(deserialize_with = "positive_secs")]
    pub timeout_secs: u64,
    /// Fetch `$metadata` for active services stored without metadata.
    pub fetch_missing_metadata: bool,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            fetch_missing_metadata: false,
        }
    }
}

fn positive_secs<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match u64::deserialize(deserializer)? {
        0 => Err(serde::de::Error::custom("timeout_secs must be greater than 0")),
        secs => Ok(secs),
    }
}

impl UpstreamSettings {
    /// The per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl GatewayConfig {
    /// Load config from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_yaml_ng::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    /// Whether any active record will be synthesized in `invoke` mode.
    #[must_use]
    pub fn needs_upstream(&self, records: &[ServiceRecord]) -> bool {
        let synthesizer = self.synthesizer(None);
        records
            .iter()
            .filter(|record| record.active)
            .any(|record| synthesizer.mode_for(record) == RouteMode::Invoke)
    }

    /// A synthesizer shaped by the `routes:` section.
    #[must_use]
    pub fn synthesizer(&self, upstream: Option<odata_rest::UpstreamClient>) -> Synthesizer {
        let mut synthesizer = Synthesizer::new(upstream)
            .with_default_mode(self.routes.default_mode)
            .with_parse_options(ParseOptions::variant(self.routes.parser));
        if let Some(prefix) = &self.routes.prefix {
            synthesizer = synthesizer.with_prefix(prefix.as_str());
        }
        for (service, mode) in &self.routes.service_modes {
            synthesizer = synthesizer.with_service_mode(service.as_str(), *mode);
        }
        synthesizer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_file_gives_defaults() {
        let config: GatewayConfig = serde_yaml_ng::from_str("{}").unwrap();
        assert_eq!(config, GatewayConfig::default());
        assert_eq!(config.bind.to_string(), "127.0.0.1:8000");
        assert_eq!(config.database, "../shared.sqlite");
        assert_eq!(config.table, "odata_services");
        assert_eq!(config.upstream.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn full_file() {
        let yaml = indoc! {"
            bind: 0.0.0.0:9000
            database: /var/lib/gateway.sqlite
            table: services
            log_filter: debug
            routes:
              prefix: invoke
              default_mode: list
              parser: minimal
              service_modes:
                ZSALES_SRV: invoke
            upstream:
              timeout_secs: 3
              fetch_missing_metadata: true
            openapi:
              title: Sales Gateway
        "};
        let config: GatewayConfig = serde_yaml_ng::from_str(yaml).unwrap();

        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.table, "services");
        assert_eq!(config.routes.prefix.as_deref(), Some("invoke"));
        assert_eq!(config.routes.default_mode, RouteMode::List);
        assert_eq!(config.routes.parser, ParserVariant::Minimal);
        assert_eq!(
            config.routes.service_modes.get("ZSALES_SRV"),
            Some(&RouteMode::Invoke),
        );
        assert!(config.upstream.fetch_missing_metadata);
        assert_eq!(config.upstream.timeout(), Duration::from_secs(3));
        assert_eq!(config.openapi.title, "Sales Gateway");
        assert_eq!(config.openapi.version, "1.0.0");
    }

    #[test]
    fn upstream_needed_only_for_active_invoke_services() {
        let config: GatewayConfig =
            serde_yaml_ng::from_str("routes:\n  default_mode: list\n").unwrap();
        let stub = ServiceRecord::new("stub", "");
        let live = ServiceRecord::new("live", "").with_mode(RouteMode::Invoke);

        assert!(!config.needs_upstream(&[stub.clone()]));
        assert!(!config.needs_upstream(&[stub.clone(), live.clone().with_active(false)]));
        assert!(config.needs_upstream(&[stub, live]));
        assert!(GatewayConfig::default().needs_upstream(&[ServiceRecord::new("x", "")]));
    }

    #[test]
    fn unknown_mode_rejected() {
        let result: Result<GatewayConfig, _> =
            serde_yaml_ng::from_str("routes:\n  default_mode: proxy\n");
        assert!(result.is_err());
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = serde_yaml_ng::from_str::<GatewayConfig>("upstream:\n  timeout_secs: 0\n")
            .unwrap_err();
        assert!(err.to_string().contains("timeout_secs must be greater than 0"), "{err}");

        let config: GatewayConfig =
            serde_yaml_ng::from_str("upstream:\n  timeout_secs: 1\n").unwrap();
        assert_eq!(config.upstream.timeout(), Duration::from_secs(1));
    }

    #[test]
    fn load_from_file() {
        let dir = std::env::temp_dir().join("odata_rest_server_config_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("gateway.yaml");
        std::fs::write(&path, "table: legacy_services\n").unwrap();

        let config = GatewayConfig::load(&path).unwrap();
        assert_eq!(config.table, "legacy_services");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn load_missing_file_names_path() {
        let err = GatewayConfig::load(Path::new("/nonexistent/gateway.yaml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/gateway.yaml"), "{err}");
    }
}
