//! Upstream error body → [`UpstreamError`].

use serde_json::{Map, Value};

use super::error::UpstreamError;

/// Flatten an upstream error response into an [`UpstreamError`].
///
/// Total: every body yields an error carrying `status_code` unchanged.
///
/// - Non-JSON body: the raw text is the message.
/// - JSON object: the `error` member (or the whole object when absent) is
///   the error object. Its `message` is used directly, or, when it is an
///   object (`{"lang": "en", "value": "..."}`), its `value` then `message`.
///   An empty message falls back to `code`. Details are
///   `innererror.errordetails`, else the whole `innererror` object.
/// - Any other JSON value is the message itself.
///
/// ```
/// use odata_rest::normalize_error;
///
/// let body = r#"{"error": {"code": "SY/530", "message": {"lang": "en", "value": "Bad key"}}}"#;
/// let err = normalize_error(400, body);
/// assert_eq!(err.status_code, 400);
/// assert_eq!(err.message, "Bad key");
/// assert_eq!(err.details, None);
/// ```
#[must_use]
pub fn normalize_error(status_code: u16, body: &str) -> UpstreamError {
    let Ok(decoded) = serde_json::from_str::<Value>(body) else {
        return UpstreamError::new(status_code, body, None);
    };

    let Value::Object(root) = decoded else {
        return UpstreamError::new(status_code, decoded, None);
    };

    match root.get("error") {
        Some(Value::Object(error)) => from_error_object(status_code, error),
        // `{"error": "text"}`: the member itself is all there is.
        Some(other) => UpstreamError::new(status_code, truthy_or_null(other), None),
        None => from_error_object(status_code, &root),
    }
}

fn from_error_object(status_code: u16, error: &Map<String, Value>) -> UpstreamError {
    let message = match error.get("message") {
        Some(Value::Object(nested)) => first_truthy(nested, &["value", "message"]),
        Some(other) if is_truthy(other) => Some(other.clone()),
        _ => None,
    };
    let message = message
        .or_else(|| error.get("code").cloned())
        .unwrap_or(Value::Null);

    let details = match error.get("innererror") {
        Some(Value::Object(inner)) => Some(
            inner
                .get("errordetails")
                .filter(|d| is_truthy(d))
                .cloned()
                .unwrap_or_else(|| Value::Object(inner.clone())),
        ),
        _ => None,
    };

    UpstreamError::new(status_code, message, details)
}

fn first_truthy(object: &Map<String, Value>, keys: &[&str]) -> Option<Value> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find(|value| is_truthy(value))
        .cloned()
}

fn truthy_or_null(value: &Value) -> Value {
    if is_truthy(value) {
        value.clone()
    } else {
        Value::Null
    }
}

/// Empty strings, empty containers, `0`, `false` and `null` carry no message.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(members) => !members.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn every_message_shape_yields_x() {
        let bodies = [
            r#"{"error":{"message":{"value":"X"}}}"#,
            r#"{"error":{"message":"X"}}"#,
            r#""X""#,
            "X",
        ];
        for body in bodies {
            let err = normalize_error(500, body);
            assert_eq!(err.message, json!("X"), "body: {body}");
            assert_eq!(err.status_code, 500);
        }
    }

    #[test]
    fn sap_v2_error_with_details() {
        let body = indoc! {r#"
            {
              "error": {
                "code": "/IWBEP/CM_MGW_RT/022",
                "message": {"lang": "en", "value": "Invalid key predicate"},
                "innererror": {
                  "transactionid": "5E6F",
                  "errordetails": [
                    {"code": "/IWBEP/CX_MGW_BUSI_EXCEPTION", "message": "Invalid key predicate", "severity": "error"}
                  ]
                }
              }
            }
        "#};
        let err = normalize_error(400, body);
        assert_eq!(err.message, json!("Invalid key predicate"));
        assert_eq!(
            err.details,
            Some(json!([
                {"code": "/IWBEP/CX_MGW_BUSI_EXCEPTION", "message": "Invalid key predicate", "severity": "error"}
            ])),
        );
    }

    #[test]
    fn innererror_without_errordetails_is_details() {
        let err = normalize_error(
            500,
            r#"{"error": {"message": "boom", "innererror": {"trace": "at x", "errordetails": []}}}"#,
        );
        assert_eq!(
            err.details,
            Some(json!({"trace": "at x", "errordetails": []})),
        );
    }

    #[test]
    fn non_object_innererror_ignored() {
        let err = normalize_error(500, r#"{"error": {"message": "boom", "innererror": "text"}}"#);
        assert_eq!(err.details, None);
    }

    #[test]
    fn nested_message_falls_back_to_inner_message() {
        let err = normalize_error(400, r#"{"error": {"message": {"value": "", "message": "inner"}}}"#);
        assert_eq!(err.message, json!("inner"));
    }

    #[test]
    fn missing_message_falls_back_to_code() {
        let err = normalize_error(403, r#"{"error": {"code": "FORBIDDEN", "message": ""}}"#);
        assert_eq!(err.message, json!("FORBIDDEN"));

        let err = normalize_error(403, r#"{"error": {"code": "FORBIDDEN", "message": {}}}"#);
        assert_eq!(err.message, json!("FORBIDDEN"));
    }

    #[test]
    fn no_message_no_code_is_null() {
        let err = normalize_error(500, r#"{"error": {}}"#);
        assert_eq!(err.message, Value::Null);
        assert_eq!(err.details, None);
    }

    #[test]
    fn body_without_error_member_is_the_error() {
        let err = normalize_error(
            422,
            r#"{"code": "VALIDATION", "message": "name is required"}"#,
        );
        assert_eq!(err.message, json!("name is required"));
    }

    #[test]
    fn string_error_member() {
        let err = normalize_error(401, r#"{"error": "invalid_token"}"#);
        assert_eq!(err.message, json!("invalid_token"));
    }

    #[test]
    fn array_body_is_message() {
        let err = normalize_error(500, r#"[1, 2]"#);
        assert_eq!(err.message, json!([1, 2]));
        assert_eq!(err.details, None);
    }

    #[test]
    fn html_body_kept_verbatim() {
        let body = "<html><body>Gateway Timeout</body></html>";
        let err = normalize_error(504, body);
        assert_eq!(err.message, json!(body));
    }

    #[test]
    fn empty_body() {
        let err = normalize_error(500, "");
        assert_eq!(err.message, json!(""));
    }
}
