//! NVMe namespaces, subsystems, hosts and subsystem maps

use super::NamedRef;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NvmeNamespace {
    pub uuid: Option<String>,
    pub name: Option<String>,
    pub os_type: Option<String>,
    pub comment: Option<String>,
    pub space: Option<NamespaceSpace>,
    pub status: Option<NamespaceStatus>,
    pub svm: Option<NamedRef>,
}

impl NvmeNamespace {
    pub fn size(&self) -> Option<i64> {
        self.space.as_ref().and_then(|s| s.size)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamespaceSpace {
    pub size: Option<i64>,
    pub used: Option<i64>,
    pub block_size: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamespaceStatus {
    pub state: Option<String>,
    pub mapped: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NvmeSubsystemMap {
    pub namespace: Option<NamedRef>,
    pub subsystem: Option<NamedRef>,
    pub svm: Option<NamedRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NvmeSubsystem {
    pub uuid: Option<String>,
    pub name: Option<String>,
    pub os_type: Option<String>,
    pub target_nqn: Option<String>,
    pub svm: Option<NamedRef>,
    pub hosts: Vec<NvmeHost>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NvmeHost {
    pub nqn: Option<String>,
}
