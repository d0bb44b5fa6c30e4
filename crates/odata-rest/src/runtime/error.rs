//! The single error shape surfaced to every caller.

use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::Value;

/// Normalized upstream (or gateway) error.
///
/// Serialized as a flat JSON body with the same status code as the response:
///
/// ```json
/// { "status_code": 404, "message": "Resource not found", "details": null }
/// ```
///
/// `message` is usually a string but is kept as a JSON value: a non-object
/// upstream body (an array, a number) is surfaced as-is.
///
/// # Examples
///
/// ```
/// use axum::response::IntoResponse;
/// use odata_rest::UpstreamError;
///
/// let err = UpstreamError::service_unavailable("connection refused");
/// assert_eq!(err.into_response().status(), axum::http::StatusCode::SERVICE_UNAVAILABLE);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamError {
    /// HTTP status code; the upstream's own code for upstream failures.
    pub status_code: u16,
    /// Human-readable message (or the raw decoded body).
    pub message: Value,
    /// Structured details (`innererror.errordetails` or `innererror`).
    pub details: Option<Value>,
}

impl UpstreamError {
    /// Create an error with an explicit status code.
    #[must_use]
    pub fn new(status_code: u16, message: impl Into<Value>, details: Option<Value>) -> Self {
        Self {
            status_code,
            message: message.into(),
            details,
        }
    }

    /// `400`: the request was rejected before reaching the upstream.
    #[must_use]
    pub fn bad_request(message: impl Into<Value>) -> Self {
        Self::new(StatusCode::BAD_REQUEST.as_u16(), message, None)
    }

    /// `404`: unknown service or route.
    #[must_use]
    pub fn not_found(message: impl Into<Value>) -> Self {
        Self::new(StatusCode::NOT_FOUND.as_u16(), message, None)
    }

    /// `502`: the upstream answered with something that is not usable.
    #[must_use]
    pub fn bad_gateway(message: impl Into<Value>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY.as_u16(), message, None)
    }

    /// `503`: the upstream could not be reached (connect, DNS, timeout).
    #[must_use]
    pub fn service_unavailable(message: impl Into<Value>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE.as_u16(), message, None)
    }

    /// The response status. Codes outside the valid HTTP range map to `502`.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_GATEWAY)
    }

    /// The JSON body `{status_code, message, details}`.
    #[must_use]
    pub fn to_body(&self) -> Value {
        serde_json::json!({
            "status_code": self.status_code,
            "message": self.message,
            "details": self.details.clone().unwrap_or(Value::Null),
        })
    }
}

impl std::fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.message {
            Value::String(message) => write!(f, "{}: {message}", self.status_code),
            other => write!(f, "{}: {other}", self.status_code),
        }
    }
}

impl std::error::Error for UpstreamError {}

impl IntoResponse for UpstreamError {
    fn into_response(self) -> axum::response::Response {
        (self.status(), Json(self.to_body())).into_response()
    }
}
