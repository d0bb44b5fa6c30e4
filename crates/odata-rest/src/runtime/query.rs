//! OData system query options accepted by collection routes.

use odata_rest_core::{query_param, ParamKind};

use super::error::UpstreamError;

/// Query validation failures. Always a client error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum QueryError {
    /// An integer option could not be parsed.
    #[error("{param} must be an integer, got `{value}`")]
    InvalidInteger {
        /// Option name (e.g. `$top`).
        param: &'static str,
        /// The rejected raw value.
        value: String,
    },

    /// An integer option is below its inclusive lower bound.
    #[error("{param} must be greater than or equal to {minimum}, got {value}")]
    OutOfRange {
        /// Option name (e.g. `$top`).
        param: &'static str,
        /// Inclusive lower bound.
        minimum: i64,
        /// The rejected value.
        value: i64,
    },
}

impl From<QueryError> for UpstreamError {
    fn from(err: QueryError) -> Self {
        let param = match &err {
            QueryError::InvalidInteger { param, .. } | QueryError::OutOfRange { param, .. } => {
                *param
            }
        };
        Self::new(
            400,
            err.to_string(),
            Some(serde_json::json!({ "parameter": param })),
        )
    }
}

/// Validated OData query options.
///
/// `None` means the option was absent from the request and will not be
/// forwarded. `Some("")` is an explicitly empty option and is forwarded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ODataQuery {
    /// `$top`, at least 1.
    pub top: Option<i64>,
    /// `$skip`, at least 0.
    pub skip: Option<i64>,
    /// `$filter`, unvalidated.
    pub filter: Option<String>,
    /// `$select`, unvalidated.
    pub select: Option<String>,
    /// `$orderby`, unvalidated.
    pub orderby: Option<String>,
}

impl ODataQuery {
    /// Validate raw query pairs.
    ///
    /// Unknown names are ignored. When a name repeats, the last value wins.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] when `$top` or `$skip` is not an integer or is
    /// below its lower bound.
    ///
    /// ```
    /// use odata_rest::ODataQuery;
    ///
    /// let pairs = vec![("$top".to_string(), "5".to_string())];
    /// let query = ODataQuery::from_pairs(&pairs).unwrap();
    /// assert_eq!(query.top, Some(5));
    /// assert_eq!(query.skip, None);
    ///
    /// let pairs = vec![("$top".to_string(), "0".to_string())];
    /// assert!(ODataQuery::from_pairs(&pairs).is_err());
    /// ```
    pub fn from_pairs<K, V>(pairs: &[(K, V)]) -> Result<Self, QueryError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut query = Self::default();

        for (name, value) in pairs {
            let Some(spec) = query_param(name.as_ref()) else {
                continue;
            };
            let value = value.as_ref();

            match (spec.name, spec.kind) {
                ("$top", ParamKind::Integer { minimum }) => {
                    query.top = Some(bounded_integer(spec.name, value, minimum)?);
                }
                ("$skip", ParamKind::Integer { minimum }) => {
                    query.skip = Some(bounded_integer(spec.name, value, minimum)?);
                }
                ("$filter", _) => query.filter = Some(value.to_string()),
                ("$select", _) => query.select = Some(value.to_string()),
                ("$orderby", _) => query.orderby = Some(value.to_string()),
                _ => {}
            }
        }

        Ok(query)
    }

    /// Options to forward upstream, in canonical order. Absent options are omitted.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(5);
        if let Some(top) = self.top {
            pairs.push(("$top", top.to_string()));
        }
        if let Some(skip) = self.skip {
            pairs.push(("$skip", skip.to_string()));
        }
        if let Some(filter) = &self.filter {
            pairs.push(("$filter", filter.clone()));
        }
        if let Some(select) = &self.select {
            pairs.push(("$select", select.clone()));
        }
        if let Some(orderby) = &self.orderby {
            pairs.push(("$orderby", orderby.clone()));
        }
        pairs
    }

    /// Whether no option was given.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn bounded_integer(param: &'static str, raw: &str, minimum: i64) -> Result<i64, QueryError> {
    let value: i64 = raw.trim().parse().map_err(|_| QueryError::InvalidInteger {
        param,
        value: raw.to_string(),
    })?;
    if value < minimum {
        return Err(QueryError::OutOfRange {
            param,
            minimum,
            value,
        });
    }
    Ok(value)
}
