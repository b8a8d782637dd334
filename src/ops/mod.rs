//! Storage operations built on top of [`RestClient`](crate::client::RestClient)
//!
//! Each submodule adds an `impl RestClient` block for one family of
//! controller objects. Operations that start asynchronous jobs wait for the
//! job to finish before returning unless their name ends in `_async`.

pub mod cluster;
pub mod export_policy;
pub mod igroup;
pub mod iscsi;
pub mod lun;
pub mod network;
pub mod nvme;
pub mod qtree;
pub mod quota;
pub mod smb;
pub mod snapmirror;
pub mod snapshot;
pub mod svm;
pub mod volume;

pub use cluster::{EmsEvent, MINIMUM_ONTAP_VERSION};
pub use export_policy::ExportRuleSpec;
pub use iscsi::ChapSettings;
pub use lun::LunCreateOptions;
pub use nvme::NvmeNamespaceOptions;
pub use qtree::QtreeCreateOptions;
pub use svm::ensure_svm;
pub use volume::{VolumeAttributes, VolumeCreateOptions};
