//! HTTP surface for kubemeta
//!
//! This crate provides the namespace resolver, the error taxonomy and the
//! axum router serving workload, pod and log metadata.

mod error;
mod namespace;
mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use kubemeta_k8s::{ClusterSource, ImageSource};

pub use error::ApiError;
pub use namespace::{MappingError, NamespaceMap, NamespaceResolver, request_domain};

/// Shared, immutable state handed to every request handler
pub struct AppState {
    pub cluster: Arc<dyn ClusterSource>,
    pub resolver: NamespaceResolver,
    pub image_source: ImageSource,
}

impl AppState {
    pub fn new(
        cluster: Arc<dyn ClusterSource>,
        resolver: NamespaceResolver,
        image_source: ImageSource,
    ) -> Self {
        Self {
            cluster,
            resolver,
            image_source,
        }
    }
}

/// Build the router with all read-only endpoints
///
/// Every listing route is served with and without the trailing slash.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/deployments/", get(routes::deployments))
        .route("/deployments", get(routes::deployments))
        .route("/pods/", get(routes::pods))
        .route("/pods", get(routes::pods))
        .route("/pod/logs/", get(routes::pod_logs))
        .route("/pod/logs", get(routes::pod_logs))
        .route("/healthz", get(routes::healthz))
        .with_state(Arc::new(state))
}
