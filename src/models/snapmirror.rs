//! SnapMirror relationships, policies, SVM peers and job schedules

use super::NamedRef;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapmirrorRelationship {
    pub uuid: Option<String>,
    pub source: Option<SnapmirrorEndpoint>,
    pub destination: Option<SnapmirrorEndpoint>,
    pub state: Option<String>,
    pub healthy: Option<bool>,
    pub unhealthy_reason: Vec<serde_json::Value>,
    pub policy: Option<SnapmirrorPolicyRef>,
    pub transfer_schedule: Option<NamedRef>,
}

impl SnapmirrorRelationship {
    pub fn source_path(&self) -> Option<&str> {
        self.source.as_ref().and_then(|e| e.path.as_deref())
    }

    pub fn destination_path(&self) -> Option<&str> {
        self.destination.as_ref().and_then(|e| e.path.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapmirrorEndpoint {
    pub path: Option<String>,
    pub svm: Option<NamedRef>,
}

impl SnapmirrorEndpoint {
    /// True when the endpoint addresses a whole SVM (`svm:`)
    pub fn is_svm_endpoint(&self) -> bool {
        match (
            self.svm.as_ref().and_then(|s| s.name.as_deref()),
            self.path.as_deref(),
        ) {
            (Some(svm), Some(path)) => path == format!("{}:", svm),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapmirrorPolicyRef {
    pub uuid: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub policy_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapmirrorPolicy {
    pub uuid: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub policy_type: Option<String>,
    pub sync_type: Option<String>,
    pub copy_all_source_snapshots: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvmPeer {
    pub uuid: Option<String>,
    pub state: Option<String>,
    pub svm: Option<NamedRef>,
    pub peer: Option<SvmPeerRemote>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvmPeerRemote {
    pub svm: Option<NamedRef>,
    pub cluster: Option<NamedRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Schedule {
    pub uuid: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub schedule_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_svm_endpoint() {
        let endpoint: SnapmirrorEndpoint =
            serde_json::from_value(json!({"path": "svm1:", "svm": {"name": "svm1"}})).unwrap();
        assert!(endpoint.is_svm_endpoint());

        let endpoint: SnapmirrorEndpoint =
            serde_json::from_value(json!({"path": "svm1:vol1", "svm": {"name": "svm1"}}))
                .unwrap();
        assert!(!endpoint.is_svm_endpoint());
        assert!(!SnapmirrorEndpoint::default().is_svm_endpoint());
    }
}
