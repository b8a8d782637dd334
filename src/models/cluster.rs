//! Cluster, nodes, SVMs, network interfaces and jobs

use super::NamedRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Cluster and Nodes
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cluster {
    pub uuid: Option<String>,
    pub name: Option<String>,
    pub version: Option<ClusterVersion>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterVersion {
    pub full: Option<String>,
    pub generation: Option<i64>,
    pub major: Option<i64>,
    pub minor: Option<i64>,
}

impl ClusterVersion {
    /// `generation.major.minor`, when all three parts are present
    pub fn short(&self) -> Option<String> {
        match (self.generation, self.major, self.minor) {
            (Some(g), Some(ma), Some(mi)) => Some(format!("{}.{}.{}", g, ma, mi)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Node {
    pub uuid: Option<String>,
    pub name: Option<String>,
    pub serial_number: Option<String>,
    pub model: Option<String>,
    pub state: Option<String>,
}

// =============================================================================
// SVMs
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Svm {
    pub uuid: Option<String>,
    pub name: Option<String>,
    pub state: Option<String>,
    pub subtype: Option<String>,
    pub aggregates: Vec<NamedRef>,
}

// =============================================================================
// Network Interfaces
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpInterface {
    pub uuid: Option<String>,
    pub name: Option<String>,
    pub state: Option<String>,
    pub ip: Option<IpInfo>,
    pub services: Vec<String>,
    pub location: Option<InterfaceLocation>,
    pub svm: Option<NamedRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpInfo {
    pub address: Option<String>,
    pub netmask: Option<String>,
    pub family: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterfaceLocation {
    pub home_node: Option<NamedRef>,
    pub node: Option<NamedRef>,
}

// =============================================================================
// Jobs
// =============================================================================

/// A controller job as returned by `GET /cluster/jobs/{uuid}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Job {
    pub uuid: Option<String>,
    pub description: Option<String>,
    pub state: Option<String>,
    pub message: Option<String>,
    pub code: Option<i64>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

/// Job reference returned by mutating calls that complete asynchronously
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobLink {
    pub uuid: Option<String>,
}

/// Body of an accepted mutation: an optional job link plus any records the
/// call was asked to return
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobLinkResponse {
    pub job: Option<JobLink>,
    pub num_records: Option<i64>,
    pub records: Vec<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cluster_version_short() {
        let cluster: Cluster = serde_json::from_value(json!({
            "name": "cluster1",
            "version": {"full": "NetApp Release 9.13.1", "generation": 9, "major": 13, "minor": 1}
        }))
        .unwrap();
        assert_eq!(cluster.version.unwrap().short().as_deref(), Some("9.13.1"));
        assert_eq!(ClusterVersion::default().short(), None);
    }

    #[test]
    fn test_job_times() {
        let job: Job = serde_json::from_value(json!({
            "uuid": "j1",
            "state": "failure",
            "code": 2,
            "start_time": "2023-05-01T10:00:00-04:00",
            "end_time": "2023-05-01T10:00:05-04:00"
        }))
        .unwrap();
        let elapsed = job.end_time.unwrap() - job.start_time.unwrap();
        assert_eq!(elapsed.num_seconds(), 5);
    }
}
