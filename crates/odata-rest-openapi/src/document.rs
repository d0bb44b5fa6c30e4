//! Full and per-service OpenAPI documents from route descriptors.

use odata_rest_core::{ParamKind, ParamSpec, RouteDescriptor, RouteMode};
use serde_json::{json, Map, Value};

use crate::config::DocumentConfig;
use crate::helpers::{
    component_name, json_response, json_response_with_schema_ref, local_component, schema_ref,
};
use crate::schema::{collection_schema, entity_schema, error_response_schema};

/// The routes of one generation pass, ready to be published.
///
/// Per-service documents are sliced out by [`RouteDescriptor::service_tag`];
/// metadata is never re-parsed.
#[derive(Debug, Clone, Default)]
pub struct ApiCatalog {
    routes: Vec<RouteDescriptor>,
    services: Vec<String>,
    config: DocumentConfig,
}

impl ApiCatalog {
    /// A catalog of `routes` for the given services (in tag order).
    #[must_use]
    pub fn new(routes: Vec<RouteDescriptor>, services: Vec<String>, config: DocumentConfig) -> Self {
        Self {
            routes,
            services,
            config,
        }
    }

    /// A catalog whose service list is derived from the routes' tags.
    #[must_use]
    pub fn from_routes(routes: Vec<RouteDescriptor>, config: DocumentConfig) -> Self {
        let mut services: Vec<String> = Vec::new();
        for route in &routes {
            if !services.contains(&route.service_tag) {
                services.push(route.service_tag.clone());
            }
        }
        Self::new(routes, services, config)
    }

    /// Published routes.
    #[must_use]
    pub fn routes(&self) -> &[RouteDescriptor] {
        &self.routes
    }

    /// Published service names.
    #[must_use]
    pub fn services(&self) -> &[String] {
        &self.services
    }

    /// Whether `service` is published.
    #[must_use]
    pub fn has_service(&self, service: &str) -> bool {
        self.services.iter().any(|s| s == service)
    }

    /// The document covering every route.
    #[must_use]
    pub fn document(&self) -> Value {
        let services: Vec<&str> = self.services.iter().map(String::as_str).collect();
        build(&self.config, &self.config.title, &services, self.routes.iter())
    }

    /// The document restricted to one service, or `None` if it is not published.
    #[must_use]
    pub fn service_document(&self, service: &str) -> Option<Value> {
        if !self.has_service(service) {
            return None;
        }
        let title = format!("{} - {service}", self.config.title);
        let routes = self.routes.iter().filter(|r| r.service_tag == service);
        Some(build(&self.config, &title, &[service], routes))
    }

    /// Like [`service_document`](Self::service_document), as a typed error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownService`](crate::Error::UnknownService).
    pub fn require_service_document(&self, service: &str) -> crate::Result<Value> {
        self.service_document(service)
            .ok_or_else(|| crate::Error::UnknownService {
                service: service.to_string(),
            })
    }
}

fn build<'a>(
    config: &DocumentConfig,
    title: &str,
    services: &[&str],
    routes: impl Iterator<Item = &'a RouteDescriptor>,
) -> Value {
    let mut paths = Map::new();
    let mut schemas = Map::new();
    // A ref outside this document is resolved by whoever merges it.
    if let Some(name) = local_component(&config.error_schema_ref) {
        schemas.insert(name.to_string(), error_response_schema());
    }

    for route in routes {
        let entity_component = component_name(&route.service_tag, &route.entity.name);
        schemas.insert(entity_component.clone(), entity_schema(&route.entity));

        let operation = operation(route, &schema_ref(&entity_component), &config.error_schema_ref);
        let item = paths
            .entry(route.path.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        item[route.method.as_str()] = operation;
    }

    let tags: Vec<Value> = services
        .iter()
        .map(|service| json!({ "name": service }))
        .collect();

    let mut doc = json!({
        "openapi": "3.1.0",
        "info": {
            "title": title,
            "version": config.version,
            "description": config.description,
        },
        "tags": tags,
        "paths": paths,
        "components": { "schemas": schemas },
    });

    if !config.servers.is_empty() {
        let servers: Vec<Value> = config
            .servers
            .iter()
            .map(|s| match &s.description {
                Some(description) => json!({ "url": s.url, "description": description }),
                None => json!({ "url": s.url }),
            })
            .collect();
        doc["servers"] = Value::Array(servers);
    }

    doc
}

fn operation(route: &RouteDescriptor, entity_ref: &str, error_ref: &str) -> Value {
    let parameters: Vec<Value> = route.query_params.iter().map(parameter).collect();

    let mut responses = Map::new();
    responses.insert(
        "200".to_string(),
        json_response("Successful Response", collection_schema(entity_ref)),
    );
    responses.insert(
        "400".to_string(),
        json_response_with_schema_ref("Invalid query options", error_ref),
    );
    if route.mode == RouteMode::Invoke {
        responses.insert(
            "503".to_string(),
            json_response_with_schema_ref("Upstream service unavailable", error_ref),
        );
        responses.insert(
            "default".to_string(),
            json_response_with_schema_ref("Upstream error", error_ref),
        );
    }

    json!({
        "tags": [route.service_tag],
        "summary": route.summary,
        "operationId": route.operation_id,
        "parameters": parameters,
        "responses": responses,
        "x-route-mode": route.mode.as_str(),
    })
}

fn parameter(param: &ParamSpec) -> Value {
    let schema = match param.kind {
        ParamKind::Integer { minimum } => json!({ "type": "integer", "minimum": minimum }),
        ParamKind::String => json!({ "type": "string" }),
    };
    json!({
        "name": param.name,
        "in": "query",
        "required": false,
        "description": param.description,
        "schema": schema,
    })
}
