//! Request-time pieces used by every synthesized route:
//! - [`ODataQuery`]: validated `$top`/`$skip`/`$filter`/`$select`/`$orderby`
//! - [`UpstreamClient`]: authenticated upstream `GET` with a fixed timeout
//! - [`normalize_error`]: heterogeneous upstream error bodies → [`UpstreamError`]
//! - [`UpstreamConfig`]: credentials and base URL, resolved once at startup

mod config;
mod error;
mod invoker;
mod normalize;
mod query;

pub use config::{
    validate_base_url, ConfigError, Credentials, UpstreamConfig, DEFAULT_TIMEOUT, ENV_BASE_URL,
    ENV_PASSWORD, ENV_PASSWORD_FALLBACK, ENV_USER, ENV_USER_FALLBACK,
};
pub use error::UpstreamError;
pub use invoker::{entity_url, UpstreamClient};
pub use normalize::normalize_error;
pub use query::{ODataQuery, QueryError};
