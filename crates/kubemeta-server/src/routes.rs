use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, Uri, header};
use serde_json::{Value, json};
use tracing::debug;

use kubemeta_k8s::{project_deployments, project_pods};
use kubemeta_types::{PodSummary, WorkloadSummary};

use crate::AppState;
use crate::error::ApiError;

/// Raw query string pairs, in request order
///
/// Repeated keys are kept so a duplicate never rejects the request; lookups
/// take the first occurrence.
type QueryPairs = Vec<(String, String)>;

fn first_value(pairs: &[(String, String)], key: &str) -> Option<String> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct NamespaceQuery {
    pub namespace: Option<String>,
}

impl NamespaceQuery {
    fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            namespace: first_value(pairs, "namespace"),
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct LogQuery {
    pub namespace: Option<String>,
    pub pod: Option<String>,
    pub tail_lines: Option<String>,
    pub container: Option<String>,
}

impl LogQuery {
    fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            namespace: first_value(pairs, "namespace"),
            pod: first_value(pairs, "pod"),
            tail_lines: first_value(pairs, "tail_lines"),
            container: first_value(pairs, "container"),
        }
    }
}

/// Host the request was addressed to (`Host` header, else the URI authority)
fn request_host<'a>(headers: &'a HeaderMap, uri: &'a Uri) -> Option<&'a str> {
    headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| uri.authority().map(|a| a.as_str()))
}

fn required<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, ApiError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or(ApiError::MissingParameter(name))
}

/// GET /deployments/
pub async fn deployments(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    uri: Uri,
    Query(pairs): Query<QueryPairs>,
) -> Result<Json<Vec<WorkloadSummary>>, ApiError> {
    let query = NamespaceQuery::from_pairs(&pairs);
    let host = request_host(&headers, &uri);
    let namespace = state
        .resolver
        .listing_namespace(host, query.namespace.as_deref());
    debug!(?host, ?namespace, "Listing deployments");

    let items = state.cluster.list_deployments().await?;

    Ok(Json(project_deployments(items, namespace, state.image_source)))
}

/// GET /pods/
pub async fn pods(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    uri: Uri,
    Query(pairs): Query<QueryPairs>,
) -> Result<Json<Vec<PodSummary>>, ApiError> {
    let query = NamespaceQuery::from_pairs(&pairs);
    let host = request_host(&headers, &uri);
    let namespace = state
        .resolver
        .listing_namespace(host, query.namespace.as_deref());
    debug!(?host, ?namespace, "Listing pods");

    let items = state.cluster.list_pods().await?;

    Ok(Json(project_pods(items, namespace)))
}

/// GET /pod/logs/
pub async fn pod_logs(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    uri: Uri,
    Query(pairs): Query<QueryPairs>,
) -> Result<Json<String>, ApiError> {
    let query = LogQuery::from_pairs(&pairs);
    let pod = required(&query.pod, "pod")?;
    let namespace = required(&query.namespace, "namespace")?;
    let raw_tail = required(&query.tail_lines, "tail_lines")?;
    let tail_lines = raw_tail
        .parse::<i64>()
        .ok()
        .filter(|n| *n >= 0)
        .ok_or_else(|| ApiError::InvalidParameter {
            name: "tail_lines",
            value: raw_tail.to_string(),
        })?;

    let host = request_host(&headers, &uri);
    state.resolver.check_log_namespace(host, namespace)?;
    debug!(?host, namespace, pod, tail_lines, "Fetching pod logs");

    let logs = state
        .cluster
        .pod_logs(
            namespace,
            pod,
            tail_lines,
            query.container.as_deref().filter(|c| !c.is_empty()),
        )
        .await?;

    Ok(Json(logs))
}

/// GET /healthz
pub async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> QueryPairs {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_repeated_keys_take_first_value() {
        let query = NamespaceQuery::from_pairs(&pairs(&[
            ("namespace", "develop"),
            ("namespace", "staging"),
        ]));
        assert_eq!(query.namespace.as_deref(), Some("develop"));

        let query = LogQuery::from_pairs(&pairs(&[
            ("pod", "api-7f9c"),
            ("namespace", "develop"),
            ("pod", "web-2b1d"),
            ("tail_lines", "10"),
        ]));
        assert_eq!(query.pod.as_deref(), Some("api-7f9c"));
        assert_eq!(query.tail_lines.as_deref(), Some("10"));
        assert!(query.container.is_none());
    }

    #[test]
    fn test_absent_keys() {
        assert_eq!(NamespaceQuery::from_pairs(&[]), NamespaceQuery::default());
        assert_eq!(LogQuery::from_pairs(&pairs(&[("other", "x")])), LogQuery::default());
    }
}
