//! SnapMirror Relationships
//!
//! Relationships are found by endpoint path. The local side is always the
//! client's SVM (`{svm}:{volume}`), the remote side is named by the caller.
//! A path of just `{svm}:` marks an SVM-DR relationship.

use crate::client::{Query, RestClient};
use crate::domain::SnapmirrorState;
use crate::error::{Error, Result, ENTRY_DOESNT_EXIST};
use crate::models::{
    Collection, JobLinkResponse, Schedule, SnapmirrorPolicy, SnapmirrorRelationship, SvmPeer,
};
use serde_json::{json, Map, Value};
use tracing::{debug, info, instrument};

const RELATIONSHIPS: &str = "snapmirror/relationships";
const SVM_PEERS: &str = "svm/peers";

/// First relationship whose endpoints match the requested paths. A `None`
/// path matches anything; with `require_paths` both endpoints need a path.
fn find_relationship(
    relationships: Collection<SnapmirrorRelationship>,
    destination_path: Option<&str>,
    source_path: Option<&str>,
    require_paths: bool,
) -> Result<SnapmirrorRelationship> {
    relationships
        .records
        .into_iter()
        .filter(|r| r.source.is_some() && r.destination.is_some())
        .filter(|r| {
            !require_paths || (r.destination_path().is_some() && r.source_path().is_some())
        })
        .filter(|r| destination_path.map_or(true, |p| r.destination_path() == Some(p)))
        .find(|r| source_path.map_or(true, |p| r.source_path() == Some(p)))
        .ok_or_else(|| Error::NotFound("could not find relationship".into()))
}

fn relationship_uuid(relationship: &SnapmirrorRelationship) -> Result<&str> {
    relationship.uuid.as_deref().ok_or_else(|| {
        Error::UnexpectedResponse("unexpected response from snapmirror relationship lookup".into())
    })
}

fn endpoint(svm: &str, volume: &str) -> Option<String> {
    (!volume.is_empty()).then(|| format!("{}:{}", svm, volume))
}

impl RestClient {
    // =========================================================================
    // Peers and SVM-DR
    // =========================================================================

    /// Names of the SVMs peered with any SVM on this cluster
    pub async fn get_peered_vservers(&self) -> Result<Vec<String>> {
        let peers: Collection<SvmPeer> = self.get(SVM_PEERS, &Query::new().all_fields()).await?;
        Ok(peers
            .records
            .into_iter()
            .filter_map(|p| p.peer.and_then(|r| r.svm).and_then(|s| s.name))
            .collect())
    }

    pub async fn snapmirror_relationships_list(
        &self,
    ) -> Result<Collection<SnapmirrorRelationship>> {
        self.get_all(RELATIONSHIPS, &Query::new().all_fields()).await
    }

    /// Whether any relationship has a whole SVM as its destination
    pub async fn is_vserver_dr_destination(&self) -> Result<bool> {
        let relationships = self.snapmirror_relationships_list().await?;
        Ok(relationships
            .records
            .iter()
            .filter_map(|r| r.destination.as_ref())
            .any(|d| d.is_svm_endpoint()))
    }

    /// Whether any relationship has a whole SVM as its source
    pub async fn is_vserver_dr_source(&self) -> Result<bool> {
        let relationships = self.snapmirror_relationships_list().await?;
        Ok(relationships
            .records
            .iter()
            .filter_map(|r| r.source.as_ref())
            .any(|s| s.is_svm_endpoint()))
    }

    /// Whether the SVM takes part in SVM-DR; lookup errors count as no
    pub async fn is_vserver_in_svm_dr(&self) -> bool {
        let (source, destination) =
            futures::join!(self.is_vserver_dr_source(), self.is_vserver_dr_destination());
        source.unwrap_or(false) || destination.unwrap_or(false)
    }

    /// Whether the SVM has at least one peer SVM
    pub async fn is_vserver_dr_capable(&self) -> Result<bool> {
        let query = Query::new()
            .with("svm.uuid", self.svm_uuid())
            .all_fields();
        let peers: Collection<SvmPeer> = self.get(SVM_PEERS, &query).await?;
        Ok(peers
            .records
            .iter()
            .any(|p| p.peer.as_ref().and_then(|r| r.svm.as_ref()).is_some()))
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Relationship from `{remote_svm}:{remote_volume}` into the local volume.
    /// Empty volume names match any path on that side.
    pub async fn snapmirror_get(
        &self,
        local_volume: &str,
        remote_volume: &str,
        remote_svm: &str,
    ) -> Result<SnapmirrorRelationship> {
        let relationships = self.snapmirror_relationships_list().await?;
        find_relationship(
            relationships,
            endpoint(&self.svm_name(), local_volume).as_deref(),
            endpoint(remote_svm, remote_volume).as_deref(),
            false,
        )
    }

    /// Like [`RestClient::snapmirror_get`], but searches relationships this
    /// cluster is the source of
    pub async fn snapmirror_list_destinations(
        &self,
        local_volume: &str,
        remote_volume: &str,
        remote_svm: &str,
    ) -> Result<SnapmirrorRelationship> {
        let query = Query::new()
            .with("list_destinations_only", true)
            .all_fields();
        let relationships = self.get_all(RELATIONSHIPS, &query).await?;
        find_relationship(
            relationships,
            endpoint(&self.svm_name(), local_volume).as_deref(),
            endpoint(remote_svm, remote_volume).as_deref(),
            true,
        )
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn snapmirror_create(
        &self,
        local_volume: &str,
        remote_volume: &str,
        remote_svm: &str,
        policy: &str,
        schedule: &str,
    ) -> Result<()> {
        let mut body = Map::new();
        body.insert(
            "destination".into(),
            json!({ "path": format!("{}:{}", self.svm_name(), local_volume) }),
        );
        body.insert(
            "source".into(),
            json!({ "path": format!("{}:{}", remote_svm, remote_volume) }),
        );
        if !policy.is_empty() {
            body.insert("policy".into(), json!({ "name": policy }));
        }
        if !schedule.is_empty() {
            body.insert("transfer_schedule".into(), json!({ "name": schedule }));
        }

        info!("Creating snapmirror relationship");
        let accepted: JobLinkResponse = self
            .post(RELATIONSHIPS, &Query::new(), &Value::Object(body))
            .await?;
        self.poll_job_status(&accepted).await
    }

    async fn snapmirror_transfer(
        &self,
        relationship: &SnapmirrorRelationship,
        body: Value,
    ) -> Result<()> {
        let uuid = relationship_uuid(relationship)?;
        let _: Value = self
            .post(
                &format!("{}/{}/transfers", RELATIONSHIPS, uuid),
                &Query::new(),
                &body,
            )
            .await?;
        Ok(())
    }

    /// Start the baseline transfer; does not wait for it
    #[instrument(skip(self))]
    pub async fn snapmirror_initialize(
        &self,
        local_volume: &str,
        remote_volume: &str,
        remote_svm: &str,
    ) -> Result<()> {
        let relationship = self
            .snapmirror_get(local_volume, remote_volume, remote_svm)
            .await?;
        self.snapmirror_transfer(&relationship, json!({})).await
    }

    /// Start an incremental transfer, optionally from a named source snapshot
    #[instrument(skip(self))]
    pub async fn snapmirror_update(&self, local_volume: &str, snapshot: &str) -> Result<()> {
        let relationship = self.snapmirror_get(local_volume, "", "").await?;
        let body = if snapshot.is_empty() {
            json!({})
        } else {
            json!({ "source_snapshot": snapshot })
        };
        self.snapmirror_transfer(&relationship, body).await
    }

    async fn snapmirror_patch(
        &self,
        relationship: &SnapmirrorRelationship,
        state: SnapmirrorState,
        extra: Option<(&str, &str)>,
    ) -> Result<()> {
        let uuid = relationship_uuid(relationship)?;
        let mut body = Map::new();
        body.insert("state".into(), json!(state.as_str()));
        if let Some((key, value)) = extra {
            body.insert(key.into(), json!(value));
        }

        info!(relationship = uuid, %state, "Changing snapmirror state");
        let accepted: JobLinkResponse = self
            .patch(
                &format!("{}/{}", RELATIONSHIPS, uuid),
                &Query::new(),
                Some(&Value::Object(body)),
            )
            .await?;
        self.poll_job_status(&accepted).await
    }

    #[instrument(skip(self))]
    pub async fn snapmirror_resync(
        &self,
        local_volume: &str,
        remote_volume: &str,
        remote_svm: &str,
    ) -> Result<()> {
        let relationship = self
            .snapmirror_get(local_volume, remote_volume, remote_svm)
            .await?;
        let is_sync = relationship
            .policy
            .as_ref()
            .and_then(|p| p.policy_type.as_deref())
            == Some("sync");
        let state = if is_sync {
            SnapmirrorState::InSync
        } else {
            SnapmirrorState::Snapmirrored
        };
        self.snapmirror_patch(&relationship, state, None).await
    }

    /// Break the relationship, optionally restoring the destination to `snapshot`
    #[instrument(skip(self))]
    pub async fn snapmirror_break(
        &self,
        local_volume: &str,
        remote_volume: &str,
        remote_svm: &str,
        snapshot: &str,
    ) -> Result<()> {
        let relationship = self
            .snapmirror_get(local_volume, remote_volume, remote_svm)
            .await?;
        let restore = (!snapshot.is_empty()).then_some(("restore_to_snapshot", snapshot));
        self.snapmirror_patch(&relationship, SnapmirrorState::BrokenOff, restore)
            .await
    }

    #[instrument(skip(self))]
    pub async fn snapmirror_quiesce(
        &self,
        local_volume: &str,
        remote_volume: &str,
        remote_svm: &str,
    ) -> Result<()> {
        let relationship = self
            .snapmirror_get(local_volume, remote_volume, remote_svm)
            .await?;
        self.snapmirror_patch(&relationship, SnapmirrorState::Paused, None)
            .await
    }

    #[instrument(skip(self))]
    pub async fn snapmirror_abort(
        &self,
        local_volume: &str,
        remote_volume: &str,
        remote_svm: &str,
    ) -> Result<()> {
        let relationship = self
            .snapmirror_get(local_volume, remote_volume, remote_svm)
            .await?;
        self.snapmirror_patch(&relationship, SnapmirrorState::Aborted, None)
            .await
    }

    async fn snapmirror_delete_with(&self, uuid: &str, flag: &str) -> Result<JobLinkResponse> {
        self.delete(
            &format!("{}/{}", RELATIONSHIPS, uuid),
            &Query::new().with(flag, true),
        )
        .await
    }

    /// Drop the relationship metadata on the source side
    #[instrument(skip(self))]
    pub async fn snapmirror_release(&self, source_volume: &str, source_svm: &str) -> Result<()> {
        let relationship = self
            .snapmirror_list_destinations("", source_volume, source_svm)
            .await?;
        let accepted = self
            .snapmirror_delete_with(relationship_uuid(&relationship)?, "source_only")
            .await?;
        self.poll_job_status(&accepted).await
    }

    /// Remove a relationship from the destination side, then clean up the
    /// source information. Relationships already gone are not an error, nor
    /// is a destination-side failure the controller reports without a code.
    #[instrument(skip(self))]
    pub async fn snapmirror_delete_via_destination(&self, local_volume: &str) -> Result<()> {
        let relationship = match self.snapmirror_list_destinations(local_volume, "", "").await {
            Ok(relationship) => relationship,
            Err(e) if e.is_not_found() => self.snapmirror_get(local_volume, "", "").await?,
            Err(e) => return Err(e),
        };
        let uuid = relationship_uuid(&relationship)?;

        // Controller errors without a code do not stop the source cleanup
        match self.snapmirror_delete_with(uuid, "destination_only").await {
            Ok(_) => {}
            Err(Error::Api(api))
                if api.code.as_deref().map_or(true, |code| code == ENTRY_DOESNT_EXIST) =>
            {
                debug!(relationship = uuid, error = %api, "Destination side not removed, continuing");
            }
            Err(e) => return Err(e),
        }

        let accepted = match self.snapmirror_delete_with(uuid, "source_info_only").await {
            Ok(accepted) => accepted,
            Err(e) if e.api_code() == Some(ENTRY_DOESNT_EXIST) => return Ok(()),
            Err(e) => return Err(e),
        };
        self.poll_job_status(&accepted).await
    }

    #[instrument(skip(self))]
    pub async fn snapmirror_delete(
        &self,
        local_volume: &str,
        remote_volume: &str,
        remote_svm: &str,
    ) -> Result<()> {
        let relationship = self
            .snapmirror_get(local_volume, remote_volume, remote_svm)
            .await?;
        let accepted = self
            .snapmirror_delete_with(relationship_uuid(&relationship)?, "destination_only")
            .await?;
        self.poll_job_status(&accepted).await
    }

    // =========================================================================
    // Policies and Schedules
    // =========================================================================

    /// Cluster-scoped replication policy by name
    pub async fn snapmirror_policy_get(&self, name: &str) -> Result<Option<SnapmirrorPolicy>> {
        let query = Query::new()
            .with("name", name)
            .with("fields", "type,sync_type,copy_all_source_snapshots");
        let policies: Collection<SnapmirrorPolicy> =
            self.get("snapmirror/policies", &query).await?;
        Ok(policies.records.into_iter().next())
    }

    pub async fn snapmirror_policy_exists(&self, name: &str) -> Result<bool> {
        Ok(self.snapmirror_policy_get(name).await?.is_some())
    }

    /// Whether exactly one cluster job schedule has this name
    pub async fn job_schedule_exists(&self, name: &str) -> Result<bool> {
        let schedules: Collection<Schedule> = self
            .get("cluster/schedules", &Query::new().with("name", name))
            .await?;
        match schedules.num_records {
            None | Some(0) => Err(Error::NotFound(format!(
                "could not find job with name: {}",
                name
            ))),
            Some(1) => Ok(true),
            Some(_) => Err(Error::NotUnique(format!(
                "more than one job found with name: {}",
                name
            ))),
        }
    }
}
