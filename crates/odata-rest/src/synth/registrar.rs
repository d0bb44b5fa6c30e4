//! Registering synthesized routes against a host router.

use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::{Json, Query};
use axum::routing::get;
use axum::Router;
use odata_rest_core::RouteDescriptor;

use super::handler::EntityHandler;

/// Path roots owned by the host application (document endpoints).
pub const RESERVED_ROOTS: &[&str] = &["tools", "openapi.json"];

/// Why a route was not registered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum RouteError {
    /// The path cannot be expressed as a static router path.
    #[error("path `{path}` is not a valid static route: {reason}")]
    InvalidPath {
        /// Offending path.
        path: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// The path's first segment belongs to the host application.
    #[error("path `{path}` collides with reserved root `{root}`")]
    Reserved {
        /// Offending path.
        path: String,
        /// The reserved root.
        root: String,
    },

    /// The path was already registered.
    #[error("path `{0}` is already registered")]
    Duplicate(String),
}

/// The host-router contract: register a handler at a described path.
///
/// Implementations must never panic; an unregistrable route is reported as
/// a [`RouteError`] and the caller moves on.
pub trait RouteRegistrar {
    /// Register `handler` for `descriptor`.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError`] when the route cannot be registered.
    fn register(
        &mut self,
        descriptor: &RouteDescriptor,
        handler: EntityHandler,
    ) -> Result<(), RouteError>;
}

/// [`RouteRegistrar`] building an [`axum::Router`].
#[derive(Debug, Default)]
pub struct AxumRegistrar {
    router: Router,
    paths: HashSet<String>,
    reserved: Vec<String>,
}

impl AxumRegistrar {
    /// Register onto `router`, reserving [`RESERVED_ROOTS`].
    #[must_use]
    pub fn new(router: Router) -> Self {
        Self {
            router,
            paths: HashSet::new(),
            reserved: RESERVED_ROOTS.iter().map(|r| (*r).to_string()).collect(),
        }
    }

    /// Reserve an additional first path segment.
    #[must_use]
    pub fn reserve(mut self, root: impl Into<String>) -> Self {
        self.reserved.push(root.into());
        self
    }

    /// Paths registered so far.
    #[must_use]
    pub fn registered(&self) -> usize {
        self.paths.len()
    }

    /// Finish registration.
    #[must_use]
    pub fn into_router(self) -> Router {
        self.router
    }

    fn check(&self, path: &str) -> Result<(), RouteError> {
        let invalid = |reason| RouteError::InvalidPath {
            path: path.to_string(),
            reason,
        };

        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        if !path.starts_with('/') || segments.iter().all(|s| s.is_empty()) {
            return Err(invalid("empty path"));
        }
        for segment in &segments {
            if segment.is_empty() {
                return Err(invalid("empty segment"));
            }
            if segment.contains(['{', '}', '*']) {
                return Err(invalid("segment contains a capture character"));
            }
            if segment.starts_with(':') {
                return Err(invalid("segment starts with `:`"));
            }
        }

        if let Some(root) = self.reserved.iter().find(|r| segments[0] == r.as_str()) {
            return Err(RouteError::Reserved {
                path: path.to_string(),
                root: root.clone(),
            });
        }
        Ok(())
    }
}

/// `path` with every segment percent-encoded, e.g. `/demo/Bücher` → `/demo/B%C3%BCcher`.
fn encoded_path(path: &str) -> Option<String> {
    let mut url = reqwest::Url::parse("http://localhost/").ok()?;
    url.path_segments_mut()
        .ok()?
        .clear()
        .extend(path.trim_start_matches('/').split('/'));
    Some(url.path().to_string())
}

impl RouteRegistrar for AxumRegistrar {
    fn register(
        &mut self,
        descriptor: &RouteDescriptor,
        handler: EntityHandler,
    ) -> Result<(), RouteError> {
        self.check(&descriptor.path)?;
        // The router matches the raw request path, so non-ASCII names must be
        // registered in their percent-encoded form.
        let path = encoded_path(&descriptor.path).ok_or_else(|| RouteError::InvalidPath {
            path: descriptor.path.clone(),
            reason: "path cannot be percent-encoded",
        })?;
        if self.paths.contains(&path) {
            return Err(RouteError::Duplicate(descriptor.path.clone()));
        }

        tracing::debug!(%path, mode = %handler.mode(), "registering route");
        let handler = Arc::new(handler);
        let route = get(move |Query(pairs): Query<Vec<(String, String)>>| {
            let handler = Arc::clone(&handler);
            async move { handler.handle(&pairs).await.map(Json) }
        });

        self.router = std::mem::take(&mut self.router).route(&path, route);
        self.paths.insert(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use odata_rest_core::{describe_service, EntityDef, RouteOptions, ServiceRecord, ServiceSchema};

    fn descriptor(service: &str, entity: &str) -> RouteDescriptor {
        let schema = ServiceSchema {
            entities: vec![EntityDef {
                name: entity.to_string(),
                ..EntityDef::default()
            }],
            ..ServiceSchema::default()
        };
        describe_service(&ServiceRecord::new(service, ""), &schema, &RouteOptions::default())
            .remove(0)
    }

    fn register(registrar: &mut AxumRegistrar, service: &str, entity: &str) -> Result<(), RouteError> {
        registrar.register(
            &descriptor(service, entity),
            EntityHandler::placeholder(service, entity),
        )
    }

    #[test]
    fn duplicate_skipped() {
        let mut registrar = AxumRegistrar::default();
        assert_eq!(register(&mut registrar, "demo", "Products"), Ok(()));
        assert_eq!(
            register(&mut registrar, "demo", "Products"),
            Err(RouteError::Duplicate("/demo/Products".to_string())),
        );
        assert_eq!(registrar.registered(), 1);
    }

    #[test]
    fn reserved_roots_skipped() {
        let mut registrar = AxumRegistrar::new(Router::new());
        assert!(matches!(
            register(&mut registrar, "tools", "Products"),
            Err(RouteError::Reserved { .. }),
        ));
        assert!(matches!(
            register(&mut registrar, "openapi.json", "X"),
            Err(RouteError::Reserved { .. }),
        ));

        let mut registrar = AxumRegistrar::new(Router::new()).reserve("health");
        assert!(register(&mut registrar, "health", "X").is_err());
    }

    #[test]
    fn capture_characters_skipped() {
        let mut registrar = AxumRegistrar::new(Router::new());
        for entity in ["{id}", "Items*", ":param"] {
            assert!(
                matches!(
                    register(&mut registrar, "demo", entity),
                    Err(RouteError::InvalidPath { .. }),
                ),
                "{entity}",
            );
        }
        assert_eq!(registrar.registered(), 0);
    }

    #[test]
    fn segments_percent_encoded() {
        assert_eq!(encoded_path("/demo/Products").as_deref(), Some("/demo/Products"));
        assert_eq!(encoded_path("/demo/Bücher").as_deref(), Some("/demo/B%C3%BCcher"));
        assert_eq!(
            encoded_path("/sap/opu/Zeit Raum").as_deref(),
            Some("/sap/opu/Zeit%20Raum"),
        );
    }

    #[tokio::test]
    async fn non_ascii_entity_reachable() {
        use axum::body::Body;
        use axum::http::{Request, StatusCode};
        use tower::ServiceExt;

        let mut registrar = AxumRegistrar::default();
        assert_eq!(register(&mut registrar, "demo", "Bücher"), Ok(()));
        assert_eq!(
            register(&mut registrar, "demo", "Bücher"),
            Err(RouteError::Duplicate("/demo/Bücher".to_string())),
        );

        let response = registrar
            .into_router()
            .oneshot(Request::builder().uri("/demo/B%C3%BCcher").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn inner_empty_segment_skipped() {
        let mut registrar = AxumRegistrar::new(Router::new());
        assert!(matches!(
            register(&mut registrar, "a//b", "X"),
            Err(RouteError::InvalidPath { reason: "empty segment", .. }),
        ));
    }
}
