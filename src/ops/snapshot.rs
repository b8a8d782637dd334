//! Volume Snapshots

use crate::client::{Query, RestClient};
use crate::domain::VolumeStyle;
use crate::error::Result;
use crate::models::{Collection, JobLinkResponse, Snapshot};
use serde_json::json;
use tracing::info;

fn snapshots_path(volume_uuid: &str) -> String {
    format!("storage/volumes/{}/snapshots", volume_uuid)
}

impl RestClient {
    /// Start a snapshot of the volume and return the job link
    pub async fn snapshot_create(
        &self,
        volume_uuid: &str,
        snapshot_name: &str,
    ) -> Result<JobLinkResponse> {
        let body = json!({
            "name": snapshot_name,
            "svm": {"uuid": self.svm_uuid()},
        });
        info!(volume = volume_uuid, snapshot = snapshot_name, "Creating snapshot");
        self.post(&snapshots_path(volume_uuid), &Query::new(), &body)
            .await
    }

    pub async fn snapshot_create_and_wait(
        &self,
        volume_uuid: &str,
        snapshot_name: &str,
    ) -> Result<()> {
        let accepted = self.snapshot_create(volume_uuid, snapshot_name).await?;
        self.poll_job_status(&accepted).await
    }

    pub async fn snapshot_list(&self, volume_uuid: &str) -> Result<Collection<Snapshot>> {
        let query = Query::new()
            .with("svm.uuid", self.svm_uuid())
            .with("fields", "name,create_time");
        self.get_all(&snapshots_path(volume_uuid), &query).await
    }

    /// Single page of snapshots with this exact name
    pub async fn snapshot_list_by_name(
        &self,
        volume_uuid: &str,
        snapshot_name: &str,
    ) -> Result<Collection<Snapshot>> {
        let query = Query::new()
            .with("svm.uuid", self.svm_uuid())
            .with("name", snapshot_name)
            .with("fields", "name,create_time");
        self.get_one(&snapshots_path(volume_uuid), &query).await
    }

    pub async fn snapshot_get(&self, volume_uuid: &str, snapshot_uuid: &str) -> Result<Snapshot> {
        self.get(
            &format!("{}/{}", snapshots_path(volume_uuid), snapshot_uuid),
            &Query::new(),
        )
        .await
    }

    pub async fn snapshot_get_by_name(
        &self,
        volume_uuid: &str,
        snapshot_name: &str,
    ) -> Result<Option<Snapshot>> {
        Ok(self
            .snapshot_list_by_name(volume_uuid, snapshot_name)
            .await?
            .into_single())
    }

    /// Start deleting a snapshot and return the job link
    pub async fn snapshot_delete(
        &self,
        volume_uuid: &str,
        snapshot_uuid: &str,
    ) -> Result<JobLinkResponse> {
        info!(volume = volume_uuid, snapshot = snapshot_uuid, "Deleting snapshot");
        self.delete(
            &format!("{}/{}", snapshots_path(volume_uuid), snapshot_uuid),
            &Query::new(),
        )
        .await
    }

    pub async fn snapshot_restore_volume(&self, snapshot_name: &str, volume_name: &str) -> Result<()> {
        self.volume_restore_snapshot_by_style(volume_name, snapshot_name, VolumeStyle::FlexVol)
            .await
    }

    pub async fn snapshot_restore_flexgroup(
        &self,
        snapshot_name: &str,
        volume_name: &str,
    ) -> Result<()> {
        self.volume_restore_snapshot_by_style(volume_name, snapshot_name, VolumeStyle::FlexGroup)
            .await
    }
}
