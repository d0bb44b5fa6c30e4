//! Upstream connection settings, resolved once at startup.

use std::time::Duration;

/// Environment variable holding the global upstream base URL (optional).
pub const ENV_BASE_URL: &str = "ODATA_BASE_URL";
/// Environment variable holding the upstream user.
pub const ENV_USER: &str = "ODATA_USER";
/// Fallback for [`ENV_USER`].
pub const ENV_USER_FALLBACK: &str = "SAP_USER";
/// Environment variable holding the upstream password.
pub const ENV_PASSWORD: &str = "ODATA_PASSWORD";
/// Fallback for [`ENV_PASSWORD`].
pub const ENV_PASSWORD_FALLBACK: &str = "SAP_PASS";

/// Per-request upstream timeout unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Startup configuration failures. Never raised per request.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A required environment variable is unset or empty.
    #[error("missing required environment variable {name}")]
    MissingEnv {
        /// Primary variable name.
        name: &'static str,
    },

    /// The configured base URL is not an absolute `http(s)` URL.
    #[error("invalid upstream base URL `{url}`: {reason}")]
    InvalidBaseUrl {
        /// The rejected value.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An active `invoke`-mode service has no base URL of its own and no
    /// global one is configured.
    #[error("invoke-mode service `{service}` has no base URL (set ODATA_BASE_URL or the record's base_url)")]
    MissingBaseUrl {
        /// The service name.
        service: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build upstream HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// HTTP Basic credentials. The password is redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Basic auth user.
    pub user: String,
    /// Basic auth password.
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Everything the upstream invoker needs, built once and passed by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamConfig {
    /// Global base URL. When set it takes precedence over per-service URLs.
    pub base_url: Option<String>,
    /// Basic auth credentials sent with every upstream call.
    pub credentials: Credentials,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl UpstreamConfig {
    /// Configuration with credentials only.
    #[must_use]
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            base_url: None,
            credentials: Credentials {
                user: user.into(),
                password: password.into(),
            },
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set and validate the global base URL. A trailing `/` is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] for relative or non-HTTP URLs.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConfigError> {
        self.base_url = Some(validate_base_url(base_url)?);
        Ok(self)
    }

    /// Set the per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnv`] when the user or password is not
    /// set, and [`ConfigError::InvalidBaseUrl`] for a malformed base URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through a variable lookup function.
    ///
    /// ```
    /// use odata_rest::UpstreamConfig;
    ///
    /// let config = UpstreamConfig::from_lookup(|name| match name {
    ///     "SAP_USER" => Some("alice".to_string()),
    ///     "ODATA_PASSWORD" => Some("secret".to_string()),
    ///     _ => None,
    /// })
    /// .unwrap();
    /// assert_eq!(config.credentials.user, "alice");
    /// assert_eq!(config.base_url, None);
    /// ```
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let user = non_empty(ENV_USER)
            .or_else(|| non_empty(ENV_USER_FALLBACK))
            .ok_or(ConfigError::MissingEnv { name: ENV_USER })?;
        let password = non_empty(ENV_PASSWORD)
            .or_else(|| non_empty(ENV_PASSWORD_FALLBACK))
            .ok_or(ConfigError::MissingEnv { name: ENV_PASSWORD })?;

        let config = Self::new(user, password);
        match non_empty(ENV_BASE_URL) {
            Some(base_url) => config.with_base_url(&base_url),
            None => Ok(config),
        }
    }
}

/// Check that `raw` is an absolute `http(s)` URL; return it without a trailing `/`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidBaseUrl`] otherwise.
pub fn validate_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    let url = reqwest::Url::parse(trimmed).map_err(|err| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: err.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme `{}`", url.scheme()),
        });
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}
