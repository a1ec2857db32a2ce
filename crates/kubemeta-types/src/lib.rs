//! Shared types for kubemeta
//!
//! This crate contains the flat records served over HTTP and the options
//! shared between the projection and server crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Summary Records
// ============================================================================

/// Replica counters of a workload, as reported by its controller
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadStatus {
    pub replicas: Option<i32>,
    pub available_replicas: Option<i32>,
    pub ready_replicas: Option<i32>,
    pub unavailable_replicas: Option<i32>,
    pub updated_replicas: Option<i32>,
}

/// Flattened view of a Deployment
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadSummary {
    pub name: String,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,

    /// Image repository of the first container (tag stripped)
    pub image: Option<String>,

    /// Tag or digest of the first container image
    pub image_release: Option<String>,

    /// Full image references of every container, in template order
    pub image_list: Vec<String>,

    pub status: WorkloadStatus,
}

impl WorkloadSummary {
    pub fn new(name: String, namespace: String) -> Self {
        Self {
            name,
            namespace,
            labels: BTreeMap::new(),
            image: None,
            image_release: None,
            image_list: Vec::new(),
            status: WorkloadStatus::default(),
        }
    }
}

/// Flattened view of a Pod
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodSummary {
    pub name: String,
    pub namespace: String,
    pub pod_ip: Option<String>,
    pub node_ip: Option<String>,
    pub node_name: Option<String>,

    /// Pod phase string (`Pending`, `Running`, ...)
    pub status: Option<String>,

    pub start_time: Option<DateTime<Utc>>,
    pub labels: BTreeMap<String, String>,
}

impl PodSummary {
    pub fn new(name: String, namespace: String) -> Self {
        Self {
            name,
            namespace,
            pod_ip: None,
            node_ip: None,
            node_name: None,
            status: None,
            start_time: None,
            labels: BTreeMap::new(),
        }
    }
}

// ============================================================================
// Options
// ============================================================================

/// Where workload image references are read from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSource {
    /// The `kubectl.kubernetes.io/last-applied-configuration` annotation
    #[default]
    Annotation,
    /// The live pod template of the Deployment
    Container,
}

impl ImageSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Annotation => "annotation",
            Self::Container => "container",
        }
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "annotation" => Ok(Self::Annotation),
            "container" => Ok(Self::Container),
            other => Err(format!(
                "unknown image source '{}', expected 'annotation' or 'container'",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_source_parse() {
        assert_eq!("annotation".parse::<ImageSource>(), Ok(ImageSource::Annotation));
        assert_eq!("Container".parse::<ImageSource>(), Ok(ImageSource::Container));
        assert!("spec".parse::<ImageSource>().is_err());
    }

    #[test]
    fn test_workload_summary_serializes_missing_fields_as_null() {
        let summary = WorkloadSummary::new("testapp".to_string(), "develop".to_string());
        let value = serde_json::to_value(&summary).unwrap();

        assert_eq!(value["name"], "testapp");
        assert_eq!(value["labels"], serde_json::json!({}));
        assert!(value["image"].is_null());
        assert!(value["status"]["unavailable_replicas"].is_null());
        assert_eq!(value["image_list"], serde_json::json!([]));
    }
}
