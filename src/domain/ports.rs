//! Domain Ports
//!
//! Value types shared across the storage operations and the trait seam used
//! to resolve which SVM the client operates on.

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// =============================================================================
// Volume Style and State
// =============================================================================

/// Volume layout on the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeStyle {
    FlexVol,
    FlexGroup,
}

impl VolumeStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            VolumeStyle::FlexVol => "flexvol",
            VolumeStyle::FlexGroup => "flexgroup",
        }
    }
}

impl std::fmt::Display for VolumeStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VolumeStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "flexvol" => Ok(VolumeStyle::FlexVol),
            "flexgroup" => Ok(VolumeStyle::FlexGroup),
            other => Err(Error::InvalidArgument(format!(
                "unknown volume style {}",
                other
            ))),
        }
    }
}

/// Volume state filter for collection queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeState {
    Online,
    Offline,
    Mixed,
    Error,
    /// No state filter
    Any,
}

impl VolumeState {
    /// Query value for the `state` filter, or `None` to omit it
    pub fn as_query(&self) -> Option<&'static str> {
        match self {
            VolumeState::Online => Some("online"),
            VolumeState::Offline => Some("offline"),
            VolumeState::Mixed => Some("mixed"),
            VolumeState::Error => Some("error"),
            VolumeState::Any => None,
        }
    }
}

impl FromStr for VolumeState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "online" => Ok(VolumeState::Online),
            "offline" => Ok(VolumeState::Offline),
            "mixed" => Ok(VolumeState::Mixed),
            "error" => Ok(VolumeState::Error),
            "" => Ok(VolumeState::Any),
            other => Err(Error::InvalidArgument(format!(
                "unknown volume state {}",
                other
            ))),
        }
    }
}

// =============================================================================
// Job State
// =============================================================================

/// State of an asynchronous controller job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Queued,
    Running,
    Paused,
    Success,
    Failure,
}

impl JobState {
    /// Whether the job has stopped changing
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Success | JobState::Failure)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobState::Queued => "queued",
            JobState::Running => "running",
            JobState::Paused => "paused",
            JobState::Success => "success",
            JobState::Failure => "failure",
        };
        f.write_str(s)
    }
}

impl FromStr for JobState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "queued" => Ok(JobState::Queued),
            "running" => Ok(JobState::Running),
            "paused" => Ok(JobState::Paused),
            "success" => Ok(JobState::Success),
            "failure" => Ok(JobState::Failure),
            other => Err(Error::UnexpectedJobState(other.to_string())),
        }
    }
}

// =============================================================================
// QoS Policy Groups
// =============================================================================

/// Kind of QoS policy group attached to a volume or LUN
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QosPolicyGroupKind {
    #[default]
    Invalid,
    Fixed,
    Adaptive,
}

/// A QoS policy group reference
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QosPolicyGroup {
    pub name: String,
    pub kind: QosPolicyGroupKind,
}

impl QosPolicyGroup {
    pub fn fixed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: QosPolicyGroupKind::Fixed,
        }
    }

    pub fn adaptive(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: QosPolicyGroupKind::Adaptive,
        }
    }

    /// Name to send on create, if the group is usable
    pub fn name_for_create(&self) -> Option<&str> {
        if self.kind != QosPolicyGroupKind::Invalid && !self.name.is_empty() {
            Some(&self.name)
        } else {
            None
        }
    }
}

// =============================================================================
// SnapMirror
// =============================================================================

/// Target states for SnapMirror relationship transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapmirrorState {
    InSync,
    Snapmirrored,
    BrokenOff,
    Paused,
    Aborted,
}

impl SnapmirrorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapmirrorState::InSync => "in_sync",
            SnapmirrorState::Snapmirrored => "snapmirrored",
            SnapmirrorState::BrokenOff => "broken_off",
            SnapmirrorState::Paused => "paused",
            SnapmirrorState::Aborted => "aborted",
        }
    }
}

impl std::fmt::Display for SnapmirrorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Export Rule Flavors
// =============================================================================

/// Authentication flavors accepted in export rule access lists
pub const EXPORT_AUTH_FLAVORS: &[&str] =
    &["any", "none", "never", "krb5", "krb5i", "krb5p", "ntlm", "sys"];

/// Keep only recognised authentication flavors
pub fn filter_auth_flavors(flavors: &[String]) -> Vec<String> {
    flavors
        .iter()
        .filter(|f| EXPORT_AUTH_FLAVORS.contains(&f.as_str()))
        .cloned()
        .collect()
}

// =============================================================================
// Features
// =============================================================================

/// Controller capabilities gated on ONTAP version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    FabricPoolFlexVol,
    FabricPoolFlexGroup,
    LunGeometrySkip,
    FlexGroupClone,
    NvmeProtocol,
    RestOnly,
}

impl Feature {
    /// Lowest ONTAP release providing the feature
    pub fn minimum_version(&self) -> semver::Version {
        let (major, minor, patch) = match self {
            Feature::FabricPoolFlexVol => (9, 2, 0),
            Feature::FabricPoolFlexGroup => (9, 5, 0),
            Feature::LunGeometrySkip => (9, 5, 0),
            Feature::FlexGroupClone => (9, 7, 0),
            Feature::NvmeProtocol => (9, 10, 1),
            Feature::RestOnly => (9, 12, 1),
        };
        semver::Version::new(major, minor, patch)
    }
}

// =============================================================================
// SVM Resolution
// =============================================================================

/// Identity of an SVM as reported by the controller
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SvmIdentity {
    pub name: Option<String>,
    pub uuid: Option<String>,
}

/// Trait for the SVM lookups needed to pick the SVM a client works on
#[async_trait]
pub trait SvmResolver: Send + Sync {
    /// Look up one SVM by exact name
    async fn svm_identity_by_name(&self, name: &str) -> Result<SvmIdentity>;

    /// List SVMs matching a name pattern
    async fn svm_identities(&self, pattern: &str) -> Result<Vec<SvmIdentity>>;

    /// Record the SVM uuid to use
    fn set_svm_uuid(&self, uuid: &str);

    /// Record the SVM name to use
    fn set_svm_name(&self, name: &str);
}
