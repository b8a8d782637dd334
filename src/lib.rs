//! ONTAP REST Client
//!
//! An async client for the REST API of ONTAP storage controllers, scoped to
//! a single storage virtual machine (SVM).
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        ops (impl RestClient)                 │
//! │  volume · snapshot · qtree · quota · export · smb · lun ·    │
//! │  igroup · iscsi · nvme · network · svm · cluster · snapmirror│
//! ├──────────────────────────────────────────────────────────────┤
//! │                         client                               │
//! │   verbs + auth  │  pagination (next links)  │  job polling   │
//! ├──────────────────────────────────────────────────────────────┤
//! │        models (wire shapes)   │   error  │  config  │ metrics│
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`client`]: HTTP transport, pagination and job polling
//! - [`ops`]: Storage operations grouped by object family
//! - [`models`]: Request and response shapes
//! - [`domain`]: Core domain types and traits
//! - [`config`]: Client configuration
//! - [`error`]: Error types and handling

pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod models;
pub mod ops;
pub mod util;

// Re-export commonly used types
pub use client::{Query, RestClient};

pub use config::{BackoffSettings, ClientConfig, PollingConfig};

pub use domain::{
    Feature, JobState, QosPolicyGroup, QosPolicyGroupKind, SnapmirrorState, SvmIdentity,
    SvmResolver, VolumeState, VolumeStyle,
};

pub use error::{ApiError, Error, RestError, Result};

pub use metrics::{ClientMetrics, MetricsSnapshot};

pub use models::Collection;

pub use ops::{
    ensure_svm, ChapSettings, EmsEvent, ExportRuleSpec, LunCreateOptions, NvmeNamespaceOptions,
    QtreeCreateOptions, VolumeAttributes, VolumeCreateOptions, MINIMUM_ONTAP_VERSION,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
