//! Volumes, snapshots, aggregates, qtrees and quota rules

use super::NamedRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Volumes
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Volume {
    pub uuid: Option<String>,
    pub name: Option<String>,
    pub style: Option<String>,
    pub state: Option<String>,
    pub comment: Option<String>,
    pub size: Option<i64>,
    #[serde(rename = "type")]
    pub volume_type: Option<String>,
    pub svm: Option<NamedRef>,
    pub aggregates: Vec<NamedRef>,
    pub nas: Option<VolumeNas>,
    pub space: Option<VolumeSpace>,
    pub guarantee: Option<VolumeGuarantee>,
    pub snapshot_policy: Option<NamedRef>,
    pub snapshot_directory_access_enabled: Option<bool>,
    pub encryption: Option<VolumeEncryption>,
    pub tiering: Option<VolumeTiering>,
    pub qos: Option<VolumeQos>,
    pub quota: Option<VolumeQuota>,
    pub clone: Option<VolumeClone>,
}

impl Volume {
    pub fn junction_path(&self) -> Option<&str> {
        self.nas.as_ref().and_then(|n| n.path.as_deref())
    }

    pub fn logical_used(&self) -> Option<i64> {
        self.space
            .as_ref()
            .and_then(|s| s.logical_space.as_ref())
            .and_then(|l| l.used)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeNas {
    pub path: Option<String>,
    pub security_style: Option<String>,
    pub unix_permissions: Option<i64>,
    pub export_policy: Option<NamedRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeSpace {
    pub size: Option<i64>,
    pub used: Option<i64>,
    pub available: Option<i64>,
    pub logical_space: Option<LogicalSpace>,
    pub snapshot: Option<SnapshotReserve>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogicalSpace {
    pub used: Option<i64>,
    pub enforcement: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotReserve {
    pub reserve_percent: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeGuarantee {
    #[serde(rename = "type")]
    pub guarantee_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeEncryption {
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeTiering {
    pub policy: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeQos {
    pub policy: Option<NamedRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeQuota {
    pub enabled: Option<bool>,
    pub state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeClone {
    pub is_flexclone: Option<bool>,
    pub split_initiated: Option<bool>,
    pub parent_volume: Option<NamedRef>,
    pub parent_snapshot: Option<NamedRef>,
}

// =============================================================================
// Snapshots
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub uuid: Option<String>,
    pub name: Option<String>,
    pub create_time: Option<DateTime<Utc>>,
    pub volume: Option<NamedRef>,
    pub svm: Option<NamedRef>,
}

// =============================================================================
// Aggregates
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Aggregate {
    pub uuid: Option<String>,
    pub name: Option<String>,
    pub state: Option<String>,
    pub node: Option<NamedRef>,
}

// =============================================================================
// Qtrees
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Qtree {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub path: Option<String>,
    pub security_style: Option<String>,
    pub unix_permissions: Option<i64>,
    pub export_policy: Option<QtreeExportPolicy>,
    pub qos_policy: Option<NamedRef>,
    pub volume: Option<NamedRef>,
    pub svm: Option<NamedRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QtreeExportPolicy {
    pub id: Option<i64>,
    pub name: Option<String>,
}

// =============================================================================
// Quota Rules
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaRule {
    pub uuid: Option<String>,
    #[serde(rename = "type")]
    pub rule_type: Option<String>,
    pub qtree: Option<NamedRef>,
    pub volume: Option<NamedRef>,
    pub svm: Option<NamedRef>,
    pub space: Option<QuotaSpace>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaSpace {
    pub hard_limit: Option<i64>,
    pub soft_limit: Option<i64>,
}
