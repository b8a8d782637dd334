//! iSCSI, igroups, LUNs and LUN maps

use super::NamedRef;
use serde::{Deserialize, Serialize};

// =============================================================================
// iSCSI
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IscsiCredentials {
    pub initiator: Option<String>,
    pub authentication_type: Option<String>,
    pub chap: Option<IscsiChap>,
    pub svm: Option<NamedRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IscsiChap {
    pub inbound: Option<ChapCredentials>,
    pub outbound: Option<ChapCredentials>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChapCredentials {
    pub user: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IscsiService {
    pub enabled: Option<bool>,
    pub svm: Option<NamedRef>,
    pub target: Option<IscsiTarget>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IscsiTarget {
    pub name: Option<String>,
    pub alias: Option<String>,
}

// =============================================================================
// Initiator Groups
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Igroup {
    pub uuid: Option<String>,
    pub name: Option<String>,
    pub protocol: Option<String>,
    pub os_type: Option<String>,
    pub svm: Option<NamedRef>,
    pub initiators: Vec<IgroupInitiator>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IgroupInitiator {
    pub name: Option<String>,
    pub comment: Option<String>,
}

// =============================================================================
// LUNs
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lun {
    pub uuid: Option<String>,
    pub name: Option<String>,
    pub os_type: Option<String>,
    pub comment: Option<String>,
    pub serial_number: Option<String>,
    pub enabled: Option<bool>,
    pub space: Option<LunSpace>,
    pub qos_policy: Option<NamedRef>,
    pub attributes: Vec<LunAttribute>,
    pub status: Option<LunStatus>,
    pub svm: Option<NamedRef>,
}

impl Lun {
    pub fn size(&self) -> Option<i64> {
        self.space.as_ref().and_then(|s| s.size)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LunSpace {
    pub size: Option<i64>,
    pub used: Option<i64>,
    pub guarantee: Option<LunGuarantee>,
    pub scsi_thin_provisioning_support_enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LunGuarantee {
    pub requested: Option<bool>,
    pub reserved: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LunAttribute {
    pub name: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LunStatus {
    pub state: Option<String>,
    pub mapped: Option<bool>,
    pub read_only: Option<bool>,
}

// =============================================================================
// LUN Maps
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LunMap {
    pub lun: Option<NamedRef>,
    pub igroup: Option<NamedRef>,
    pub svm: Option<NamedRef>,
    pub logical_unit_number: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportingNode {
    pub name: Option<String>,
    pub uuid: Option<String>,
}

// =============================================================================
// LUN Options Schema
// =============================================================================

/// Response of `OPTIONS /storage/luns?return_schema=POST`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LunOptions {
    pub record_schema: Option<LunRecordSchema>,
}

impl LunOptions {
    /// Maximum LUN size the controller accepts, if reported
    pub fn max_size(&self) -> Option<i64> {
        self.size_schema()
            .and_then(|s| s.range.as_ref())
            .and_then(|r| r.max)
    }

    pub fn min_size(&self) -> Option<i64> {
        self.size_schema()
            .and_then(|s| s.range.as_ref())
            .and_then(|r| r.min)
    }

    fn size_schema(&self) -> Option<&SchemaField> {
        self.record_schema
            .as_ref()
            .and_then(|r| r.space.as_ref())
            .and_then(|s| s.size.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LunRecordSchema {
    pub space: Option<LunSpaceSchema>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LunSpaceSchema {
    pub size: Option<SchemaField>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaField {
    pub open_api_type: Option<String>,
    pub range: Option<SchemaRange>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaRange {
    pub min: Option<i64>,
    pub max: Option<i64>,
}
