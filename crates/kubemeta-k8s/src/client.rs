use anyhow::{Context, Result};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;
use kube::Api;
use kube::api::{ListParams, LogParams};
use kube::config::{KubeConfigOptions, Kubeconfig};

use crate::source::ClusterSource;

/// Kubernetes client wrapper
#[derive(Clone)]
pub struct KubeClient {
    client: kube::Client,
}

impl KubeClient {
    /// Create a new KubeClient
    ///
    /// Without a context the configuration is inferred: `KUBECONFIG` or
    /// `~/.kube/config` when present, otherwise the in-cluster service account.
    pub async fn new(context: Option<&str>) -> Result<Self> {
        let config = match context {
            Some(context_name) => {
                let kubeconfig = Kubeconfig::read()
                    .context("Failed to read kubeconfig. Is kubectl configured?")?;

                kube::Config::from_custom_kubeconfig(
                    kubeconfig,
                    &KubeConfigOptions {
                        context: Some(context_name.to_string()),
                        ..Default::default()
                    },
                )
                .await
                .context(format!(
                    "Failed to create config for context: {}",
                    context_name
                ))?
            }
            None => kube::Config::infer()
                .await
                .context("Failed to infer cluster config (no kubeconfig and not running in a pod)")?,
        };

        let client = kube::Client::try_from(config).context("Failed to create client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ClusterSource for KubeClient {
    async fn list_deployments(&self) -> Result<Vec<Deployment>> {
        let deployments: Api<Deployment> = Api::all(self.client.clone());
        let list = deployments
            .list(&ListParams::default())
            .await
            .context("Failed to list deployments")?;

        Ok(list.items)
    }

    async fn list_pods(&self) -> Result<Vec<Pod>> {
        let pods: Api<Pod> = Api::all(self.client.clone());
        let list = pods
            .list(&ListParams::default())
            .await
            .context("Failed to list pods")?;

        Ok(list.items)
    }

    async fn pod_logs(
        &self,
        namespace: &str,
        pod: &str,
        tail_lines: i64,
        container: Option<&str>,
    ) -> Result<String> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let params = LogParams {
            container: container.map(str::to_string),
            tail_lines: Some(tail_lines),
            ..Default::default()
        };

        pods.logs(pod, &params).await.context(format!(
            "Failed to get logs for pod '{}' in namespace '{}'",
            pod, namespace
        ))
    }
}
