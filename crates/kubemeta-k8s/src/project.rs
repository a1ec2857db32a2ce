use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

use kubemeta_types::{ImageSource, PodSummary, WorkloadStatus, WorkloadSummary};

/// Annotation written by `kubectl apply` holding the applied manifest
pub const LAST_APPLIED_ANNOTATION: &str = "kubectl.kubernetes.io/last-applied-configuration";

/// Keep the items of `namespace` (all items when `None`) and project them,
/// preserving listing order
pub fn project_deployments(
    deployments: Vec<Deployment>,
    namespace: Option<&str>,
    image_source: ImageSource,
) -> Vec<WorkloadSummary> {
    deployments
        .into_iter()
        .filter(|d| in_namespace(d.metadata.namespace.as_deref(), namespace))
        .map(|d| deployment_to_summary(d, image_source))
        .collect()
}

/// Keep the items of `namespace` (all items when `None`) and project them,
/// preserving listing order
pub fn project_pods(pods: Vec<Pod>, namespace: Option<&str>) -> Vec<PodSummary> {
    pods.into_iter()
        .filter(|p| in_namespace(p.metadata.namespace.as_deref(), namespace))
        .map(pod_to_summary)
        .collect()
}

fn in_namespace(item: Option<&str>, filter: Option<&str>) -> bool {
    match filter {
        Some(filter) => item == Some(filter),
        None => true,
    }
}

/// Convert a k8s Deployment to WorkloadSummary
pub fn deployment_to_summary(deploy: Deployment, image_source: ImageSource) -> WorkloadSummary {
    let name = deploy.metadata.name.clone().unwrap_or_default();
    let namespace = deploy.metadata.namespace.clone().unwrap_or_default();
    let mut summary = WorkloadSummary::new(name, namespace);

    summary.image_list = match image_source {
        ImageSource::Annotation => images_from_annotation(&deploy),
        ImageSource::Container => images_from_template(&deploy),
    };

    if let Some(first) = summary.image_list.first() {
        let (image, release) = split_image(first);
        summary.image = Some(image);
        summary.image_release = release;
    }

    if let Some(status) = deploy.status {
        summary.status = WorkloadStatus {
            replicas: status.replicas,
            available_replicas: status.available_replicas,
            ready_replicas: status.ready_replicas,
            unavailable_replicas: status.unavailable_replicas,
            updated_replicas: status.updated_replicas,
        };
    }

    if let Some(labels) = deploy.metadata.labels {
        summary.labels = labels;
    }

    summary
}

/// Read container images from the last applied manifest
fn images_from_annotation(deploy: &Deployment) -> Vec<String> {
    let Some(raw) = deploy
        .metadata
        .annotations
        .as_ref()
        .and_then(|a| a.get(LAST_APPLIED_ANNOTATION))
    else {
        return Vec::new();
    };

    let manifest: Value = match serde_json::from_str(raw) {
        Ok(manifest) => manifest,
        Err(e) => {
            warn!(
                deployment = deploy.metadata.name.as_deref().unwrap_or_default(),
                namespace = deploy.metadata.namespace.as_deref().unwrap_or_default(),
                error = %e,
                "Ignoring unparsable last-applied-configuration annotation"
            );
            return Vec::new();
        }
    };

    manifest
        .pointer("/spec/template/spec/containers")
        .and_then(Value::as_array)
        .map(|containers| {
            containers
                .iter()
                .filter_map(|c| c.get("image").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Read container images from the live pod template
fn images_from_template(deploy: &Deployment) -> Vec<String> {
    deploy
        .spec
        .as_ref()
        .and_then(|spec| spec.template.spec.as_ref())
        .map(|pod_spec| {
            pod_spec
                .containers
                .iter()
                .filter_map(|c| c.image.clone())
                .collect()
        })
        .unwrap_or_default()
}

/// Split an image reference into repository and tag (or digest)
///
/// A colon only separates a tag when it follows the last `/`, so registry
/// ports survive: `registry:5000/app:1.2` gives `("registry:5000/app", "1.2")`.
/// A digest wins over a tag: `app:1.2@sha256:ab` gives `("app", "sha256:ab")`.
pub fn split_image(reference: &str) -> (String, Option<String>) {
    if let Some((name, digest)) = reference.split_once('@') {
        let (repo, _tag) = split_tag(name);
        return (repo.to_string(), Some(digest.to_string()));
    }

    let (repo, tag) = split_tag(reference);
    (repo.to_string(), tag.map(str::to_string))
}

fn split_tag(name: &str) -> (&str, Option<&str>) {
    let name_start = name.rfind('/').map(|i| i + 1).unwrap_or(0);
    match name[name_start..].rfind(':') {
        Some(i) => {
            let split = name_start + i;
            (&name[..split], Some(&name[split + 1..]))
        }
        None => (name, None),
    }
}

/// Convert a k8s Pod to PodSummary
pub fn pod_to_summary(pod: Pod) -> PodSummary {
    let name = pod.metadata.name.unwrap_or_default();
    let namespace = pod.metadata.namespace.unwrap_or_default();
    let mut summary = PodSummary::new(name, namespace);

    if let Some(spec) = pod.spec {
        summary.node_name = spec.node_name;
    }

    if let Some(status) = pod.status {
        summary.pod_ip = status.pod_ip;
        summary.node_ip = status.host_ip;
        summary.status = status.phase;
        summary.start_time = status.start_time.map(|t| t.0);
    }

    summary.labels = pod.metadata.labels.unwrap_or_else(BTreeMap::new);

    summary
}
