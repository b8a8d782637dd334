//! Core domain types and traits

pub mod ports;

pub use ports::{
    filter_auth_flavors, Feature, JobState, QosPolicyGroup, QosPolicyGroupKind, SnapmirrorState,
    SvmIdentity, SvmResolver, VolumeState, VolumeStyle, EXPORT_AUTH_FLAVORS,
};
