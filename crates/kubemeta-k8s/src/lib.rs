//! Kubernetes access for kubemeta
//!
//! This crate lists Deployments and Pods across the cluster, fetches pod
//! logs, and projects the API objects into the flat summaries served over
//! HTTP.

mod client;
mod project;
mod source;

pub use client::KubeClient;
pub use project::{
    LAST_APPLIED_ANNOTATION, deployment_to_summary, pod_to_summary, project_deployments,
    project_pods, split_image,
};
pub use source::ClusterSource;

// Re-export types that are used in our public API
pub use kubemeta_types::{ImageSource, PodSummary, WorkloadStatus, WorkloadSummary};
