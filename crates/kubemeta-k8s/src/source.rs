use anyhow::Result;
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;

/// Read-only view of the cluster used by the HTTP handlers.
///
/// Listings are cluster-wide and unfiltered; namespace filtering happens in
/// the projection step. [`crate::KubeClient`] is the production
/// implementation, tests substitute an in-memory one.
#[async_trait]
pub trait ClusterSource: Send + Sync {
    /// List Deployments in all namespaces, in API server order
    async fn list_deployments(&self) -> Result<Vec<Deployment>>;

    /// List Pods in all namespaces, in API server order
    async fn list_pods(&self) -> Result<Vec<Pod>>;

    /// Fetch the last `tail_lines` lines of a pod's log
    ///
    /// `container` is only needed for multi-container pods.
    async fn pod_logs(
        &self,
        namespace: &str,
        pod: &str,
        tail_lines: i64,
        container: Option<&str>,
    ) -> Result<String>;
}
