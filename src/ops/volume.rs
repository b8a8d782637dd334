//! FlexVol and FlexGroup Volumes
//!
//! Every volume operation is implemented once over [`VolumeStyle`]; the
//! `volume_*` and `flexgroup_*` methods fix the style. Mutations look the
//! volume up by name, PATCH it by uuid and wait for the resulting job.

use crate::client::{Query, RestClient};
use crate::domain::{QosPolicyGroup, QosPolicyGroupKind, VolumeState, VolumeStyle};
use crate::error::{Error, Result};
use crate::models::{Collection, JobLinkResponse, Volume};
use crate::util::{convert_size_to_bytes, parse_unix_permissions};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, info, instrument, warn};

const VOLUMES: &str = "storage/volumes";

// =============================================================================
// Request Types
// =============================================================================

/// Options for creating a FlexVol or FlexGroup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeCreateOptions {
    pub name: String,
    /// Aggregates to place the volume on; may be empty for FlexGroups
    pub aggregates: Vec<String>,
    /// Size such as `1g` or a byte count
    pub size: String,
    /// Space guarantee type (`none`, `volume`)
    pub space_reserve: String,
    pub snapshot_policy: String,
    pub unix_permissions: String,
    pub export_policy: String,
    pub security_style: String,
    pub tiering_policy: String,
    pub comment: String,
    pub qos_policy_group: QosPolicyGroup,
    /// `None` leaves encryption to the aggregate default
    pub encrypt: Option<bool>,
    pub snapshot_reserve: Option<i64>,
    /// Create as a data-protection (SnapMirror destination) volume
    pub dp_volume: bool,
}

/// Volume attributes used both as a list filter and as the listed result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeAttributes {
    pub name: String,
    pub aggregates: Vec<String>,
    pub tiering_policy: String,
    pub snapshot_policy: String,
    pub space_reserve: String,
    pub snapshot_reserve: Option<i64>,
    pub snapshot_dir: Option<bool>,
    pub encrypt: Option<bool>,
}

fn or_wildcard(value: &str) -> &str {
    if value.is_empty() {
        "*"
    } else {
        value
    }
}

impl RestClient {
    // =========================================================================
    // Lookups
    // =========================================================================

    /// All volumes of `style` whose names match `pattern`, filtered by state
    pub async fn volumes_by_pattern_style_state(
        &self,
        pattern: &str,
        style: VolumeStyle,
        state: VolumeState,
    ) -> Result<Collection<Volume>> {
        let query = Query::new()
            .with("svm.uuid", self.svm_uuid())
            .with("name", pattern)
            .with_opt("state", state.as_query())
            .with("style", style)
            .all_fields();
        self.get_all(VOLUMES, &query).await
    }

    async fn unique_volume(
        &self,
        name: &str,
        style: VolumeStyle,
        state: VolumeState,
    ) -> Result<Option<Volume>> {
        let result = self.volumes_by_pattern_style_state(name, style, state).await?;
        match result.num_records() {
            0 => Ok(None),
            1 => result.records.into_iter().next().map(Some).ok_or_else(|| {
                Error::UnexpectedResponse(format!(
                    "volume lookup for '{}' reported one record but returned none",
                    name
                ))
            }),
            n => Err(Error::NotUnique(format!(
                "could not find unique volume with name '{}'; found {} matching volumes",
                name, n
            ))),
        }
    }

    /// The online volume of `style` with exactly this name
    pub async fn volume_get_by_name_and_style(
        &self,
        name: &str,
        style: VolumeStyle,
    ) -> Result<Option<Volume>> {
        self.unique_volume(name, style, VolumeState::Online).await
    }

    /// The volume of `style` with exactly this name, in any state
    pub async fn volume_get_in_any_state_by_name_and_style(
        &self,
        name: &str,
        style: VolumeStyle,
    ) -> Result<Option<Volume>> {
        self.unique_volume(name, style, VolumeState::Any).await
    }

    pub async fn volume_exists_by_style(&self, name: &str, style: VolumeStyle) -> Result<bool> {
        if name.is_empty() {
            return Ok(false);
        }
        Ok(self
            .volume_get_by_name_and_style(name, style)
            .await?
            .is_some())
    }

    /// Provisioned size in bytes
    pub async fn volume_size_by_style(&self, name: &str, style: VolumeStyle) -> Result<u64> {
        let volume = self
            .volume_get_by_name_and_style(name, style)
            .await?
            .ok_or_else(|| Error::NotFound(format!("could not find volume with name {}", name)))?;
        let size = volume.size.ok_or_else(|| {
            Error::UnexpectedResponse(format!("could not find size for volume with name {}", name))
        })?;
        Ok(size.max(0) as u64)
    }

    /// Logical bytes used
    pub async fn volume_used_size_by_style(&self, name: &str, style: VolumeStyle) -> Result<i64> {
        let volume = self
            .volume_get_by_name_and_style(name, style)
            .await?
            .ok_or_else(|| Error::NotFound(format!("could not find volume with name {}", name)))?;
        volume.logical_used().ok_or_else(|| {
            Error::UnexpectedResponse(format!(
                "could not find logical space attributes for volume {}",
                name
            ))
        })
    }

    // =========================================================================
    // Modifications
    // =========================================================================

    async fn require_volume(&self, name: &str, style: VolumeStyle) -> Result<(String, Volume)> {
        let volume = self
            .volume_get_by_name_and_style(name, style)
            .await?
            .ok_or_else(|| Error::NotFound(format!("could not find volume with name {}", name)))?;
        let uuid = volume.uuid.clone().ok_or_else(|| {
            Error::UnexpectedResponse(format!("could not find volume uuid with name {}", name))
        })?;
        Ok((uuid, volume))
    }

    async fn patch_volume(&self, uuid: &str, query: &Query, body: Option<&Value>) -> Result<()> {
        let accepted: JobLinkResponse = self
            .patch(&format!("{}/{}", VOLUMES, uuid), query, body)
            .await?;
        self.poll_job_status(&accepted).await
    }

    async fn modify_volume(&self, name: &str, style: VolumeStyle, body: Value) -> Result<()> {
        let (uuid, _) = self.require_volume(name, style).await?;
        self.patch_volume(&uuid, &Query::new(), Some(&body)).await
    }

    #[instrument(skip(self))]
    pub async fn volume_set_size_by_style(
        &self,
        name: &str,
        new_size: &str,
        style: VolumeStyle,
    ) -> Result<()> {
        let bytes = convert_size_to_bytes(new_size)?;
        info!("Resizing {} {} to {} bytes", style, name, bytes);
        self.modify_volume(name, style, json!({ "size": bytes })).await
    }

    #[instrument(skip(self))]
    pub async fn volume_mount_by_style(
        &self,
        name: &str,
        junction_path: &str,
        style: VolumeStyle,
    ) -> Result<()> {
        let (uuid, volume) = self.require_volume(name, style).await?;
        if volume.junction_path() == Some(junction_path) {
            debug!("already mounted to the correct junction path, nothing to do");
            return Ok(());
        }
        self.patch_volume(&uuid, &Query::new(), Some(&json!({"nas": {"path": junction_path}})))
            .await
    }

    #[instrument(skip(self))]
    pub async fn volume_unmount_by_style(&self, name: &str, style: VolumeStyle) -> Result<()> {
        let Some(volume) = self
            .volume_get_in_any_state_by_name_and_style(name, style)
            .await?
        else {
            warn!(volume = name, "Volume does not exist.");
            return Ok(());
        };
        let Some(uuid) = volume.uuid.as_deref() else {
            warn!(volume = name, "Volume UUID does not exist.");
            return Ok(());
        };
        if volume.junction_path() == Some("") {
            debug!("already unmounted, nothing to do");
            return Ok(());
        }
        self.patch_volume(uuid, &Query::new(), Some(&json!({"nas": {"path": ""}})))
            .await
    }

    #[instrument(skip(self))]
    pub async fn volume_rename_by_style(
        &self,
        name: &str,
        new_name: &str,
        style: VolumeStyle,
    ) -> Result<()> {
        info!("Renaming {} {} to {}", style, name, new_name);
        self.modify_volume(name, style, json!({ "name": new_name })).await
    }

    #[instrument(skip(self))]
    pub async fn volume_destroy_by_style(&self, name: &str, style: VolumeStyle) -> Result<()> {
        let volume = self
            .volume_get_by_name_and_style(name, style)
            .await?
            .ok_or_else(|| Error::NotFound(format!("could not find volume: {}", name)))?;
        let uuid = volume
            .uuid
            .ok_or_else(|| Error::UnexpectedResponse(format!("could not find volume: {}", name)))?;

        info!("Destroying {} {}", style, name);
        let accepted: JobLinkResponse = self
            .delete(&format!("{}/{}", VOLUMES, uuid), &Query::new())
            .await?;
        self.poll_job_status(&accepted).await
    }

    pub async fn volume_modify_export_policy_by_style(
        &self,
        name: &str,
        policy: &str,
        style: VolumeStyle,
    ) -> Result<()> {
        self.modify_volume(name, style, json!({"nas": {"export_policy": {"name": policy}}}))
            .await
    }

    pub async fn volume_modify_unix_permissions_by_style(
        &self,
        name: &str,
        permissions: &str,
        style: VolumeStyle,
    ) -> Result<()> {
        let permissions = parse_unix_permissions(permissions)?;
        self.modify_volume(name, style, json!({"nas": {"unix_permissions": permissions}}))
            .await
    }

    pub async fn volume_set_comment_by_style(
        &self,
        name: &str,
        comment: &str,
        style: VolumeStyle,
    ) -> Result<()> {
        self.modify_volume(name, style, json!({ "comment": comment })).await
    }

    pub async fn volume_set_qos_policy_group_by_style(
        &self,
        name: &str,
        qos: &QosPolicyGroup,
        style: VolumeStyle,
    ) -> Result<()> {
        if qos.kind == QosPolicyGroupKind::Invalid {
            return Err(Error::InvalidArgument("invalid QoS policy group".into()));
        }
        if qos.name.is_empty() {
            return Err(Error::InvalidArgument("missing QoS policy group name".into()));
        }
        self.modify_volume(name, style, json!({"qos": {"policy": {"name": qos.name}}}))
            .await
    }

    /// Start splitting a clone from its parent
    pub async fn volume_clone_split_start_by_style(
        &self,
        name: &str,
        style: VolumeStyle,
    ) -> Result<()> {
        info!("Starting clone split of {} {}", style, name);
        self.modify_volume(name, style, json!({"clone": {"split_initiated": true}}))
            .await
    }

    /// Revert a volume to one of its snapshots
    #[instrument(skip(self))]
    pub async fn volume_restore_snapshot_by_style(
        &self,
        name: &str,
        snapshot: &str,
        style: VolumeStyle,
    ) -> Result<()> {
        let (uuid, _) = self.require_volume(name, style).await?;
        let query = Query::new().with("restore_to.snapshot.name", snapshot);
        info!("Restoring {} {} to snapshot {}", style, name, snapshot);
        self.patch_volume(&uuid, &query, None).await
    }

    pub async fn volume_modify_snapshot_directory_access_by_style(
        &self,
        name: &str,
        enable: bool,
        style: VolumeStyle,
    ) -> Result<()> {
        self.modify_volume(
            name,
            style,
            json!({ "snapshot_directory_access_enabled": enable }),
        )
        .await
    }

    /// Turn quota enforcement on or off for a FlexVol
    pub async fn volume_set_quota_enabled(&self, name: &str, enable: bool) -> Result<()> {
        let (uuid, volume) = self.require_volume(name, VolumeStyle::FlexVol).await?;
        if volume.quota.as_ref().and_then(|q| q.enabled) == Some(enable) {
            debug!(volume = name, enable, "Quota already in requested state");
            return Ok(());
        }
        self.patch_volume(&uuid, &Query::new(), Some(&json!({"quota": {"enabled": enable}})))
            .await
    }

    // =========================================================================
    // Create
    // =========================================================================

    async fn create_volume_by_style(
        &self,
        options: &VolumeCreateOptions,
        style: VolumeStyle,
    ) -> Result<()> {
        let size = convert_size_to_bytes(&options.size)?;

        let mut body = Map::new();
        body.insert("name".into(), json!(options.name));
        body.insert("size".into(), json!(size));
        body.insert("guarantee".into(), json!({"type": options.space_reserve}));
        body.insert("snapshot_policy".into(), json!({"name": options.snapshot_policy}));
        body.insert("comment".into(), json!(options.comment));
        body.insert("state".into(), json!("online"));
        body.insert("style".into(), json!(style.as_str()));
        body.insert("svm".into(), json!({"uuid": self.svm_uuid()}));

        if !options.aggregates.is_empty() {
            let aggregates: Vec<Value> = options
                .aggregates
                .iter()
                .map(|name| json!({ "name": name }))
                .collect();
            body.insert("aggregates".into(), Value::Array(aggregates));
        }
        if let Some(reserve) = options.snapshot_reserve {
            body.insert("space".into(), json!({"snapshot": {"reserve_percent": reserve}}));
        }
        if let Some(encrypt) = options.encrypt {
            body.insert("encryption".into(), json!({ "enabled": encrypt }));
        }
        if let Some(qos) = options.qos_policy_group.name_for_create() {
            body.insert("qos".into(), json!({"policy": {"name": qos}}));
        }
        if !options.tiering_policy.is_empty() {
            body.insert("tiering".into(), json!({"policy": options.tiering_policy}));
        }

        let mut nas = Map::new();
        if !options.security_style.is_empty() {
            nas.insert("security_style".into(), json!(options.security_style));
        }
        if options.dp_volume {
            body.insert("type".into(), json!("DP"));
        } else if !options.unix_permissions.is_empty() {
            let permissions = parse_unix_permissions(&options.unix_permissions)?;
            nas.insert("unix_permissions".into(), json!(permissions));
        }
        if !options.export_policy.is_empty() {
            nas.insert("export_policy".into(), json!({"name": options.export_policy}));
        }
        if !nas.is_empty() {
            body.insert("nas".into(), Value::Object(nas));
        }

        info!(
            "Creating {} {} ({} bytes) on {:?}",
            style, options.name, size, options.aggregates
        );
        let accepted: JobLinkResponse = self
            .post(VOLUMES, &Query::new(), &Value::Object(body))
            .await?;
        self.poll_job_status(&accepted).await?;

        let client = self;
        let name = options.name.as_str();
        self.wait_until(
            &format!("{} '{}'", style, name),
            &self.config().polling.existence,
            move || async move { client.volume_exists_by_style(name, style).await },
        )
        .await
    }

    // =========================================================================
    // Listing and Clones
    // =========================================================================

    /// FlexVols matching the given attributes; empty filters match anything
    pub async fn volume_list_by_attrs(
        &self,
        attrs: &VolumeAttributes,
    ) -> Result<Vec<VolumeAttributes>> {
        let aggregates = attrs.aggregates.join("|");
        let query = Query::new()
            .with("svm.uuid", self.svm_uuid())
            .with("name", or_wildcard(&attrs.name))
            .with("aggregates.name", or_wildcard(&aggregates))
            .with("tiering.policy", or_wildcard(&attrs.tiering_policy))
            .with("snapshot_policy.name", or_wildcard(&attrs.snapshot_policy))
            .with("guarantee.type", or_wildcard(&attrs.space_reserve))
            .with_opt("space.snapshot.reserve_percent", attrs.snapshot_reserve)
            .with_opt("snapshot_directory_access_enabled", attrs.snapshot_dir)
            .with_opt("encryption.enabled", attrs.encrypt)
            .with("state", "online")
            .with("style", VolumeStyle::FlexVol)
            .all_fields();

        let result: Collection<Volume> = self.get_all(VOLUMES, &query).await?;
        Ok(result
            .records
            .into_iter()
            .map(|volume| VolumeAttributes {
                name: volume.name.unwrap_or_default(),
                aggregates: volume
                    .aggregates
                    .into_iter()
                    .filter_map(|a| a.name)
                    .collect(),
                tiering_policy: volume
                    .tiering
                    .and_then(|t| t.policy)
                    .unwrap_or_else(|| "none".to_string()),
                snapshot_policy: volume
                    .snapshot_policy
                    .and_then(|p| p.name)
                    .unwrap_or_default(),
                space_reserve: volume
                    .guarantee
                    .and_then(|g| g.guarantee_type)
                    .unwrap_or_default(),
                snapshot_reserve: volume
                    .space
                    .and_then(|s| s.snapshot)
                    .and_then(|s| s.reserve_percent),
                snapshot_dir: Some(volume.snapshot_directory_access_enabled.unwrap_or(false)),
                encrypt: volume.encryption.and_then(|e| e.enabled),
            })
            .collect())
    }

    /// Start a FlexClone of `source` and return the job link
    #[instrument(skip(self))]
    pub async fn volume_clone_create(
        &self,
        clone_name: &str,
        source: &str,
        snapshot: &str,
    ) -> Result<JobLinkResponse> {
        let mut clone = json!({
            "parent_volume": {"name": source},
            "is_flexclone": true,
        });
        if !snapshot.is_empty() {
            clone["parent_snapshot"] = json!({ "name": snapshot });
        }
        let body = json!({
            "name": clone_name,
            "clone": clone,
            "svm": {"uuid": self.svm_uuid()},
        });
        info!("Cloning {} from {}@{}", clone_name, source, snapshot);
        self.post(VOLUMES, &Query::new().return_records(), &body).await
    }

    /// Create a FlexClone and wait for the clone job to finish
    pub async fn volume_clone_create_async(
        &self,
        clone_name: &str,
        source: &str,
        snapshot: &str,
    ) -> Result<()> {
        let accepted = self.volume_clone_create(clone_name, source, snapshot).await?;
        self.poll_job_status(&accepted).await
    }

    /// Names of clones whose parent is `volume` at `snapshot`
    pub async fn volume_list_all_backed_by_snapshot(
        &self,
        volume: &str,
        snapshot: &str,
    ) -> Result<Vec<String>> {
        let query = Query::new()
            .with("svm.uuid", self.svm_uuid())
            .with("clone.parent_volume.name", volume)
            .with("clone.parent_snapshot.name", snapshot)
            .with("fields", "name,clone.parent_volume.name,clone.parent_snapshot.name");
        let result: Collection<Volume> = self.get_all(VOLUMES, &query).await?;

        Ok(result
            .records
            .into_iter()
            .filter(|v| {
                let clone = v.clone.as_ref();
                clone
                    .and_then(|c| c.parent_volume.as_ref())
                    .and_then(|p| p.name.as_deref())
                    == Some(volume)
                    && clone
                        .and_then(|c| c.parent_snapshot.as_ref())
                        .and_then(|p| p.name.as_deref())
                        == Some(snapshot)
            })
            .filter_map(|v| v.name)
            .collect())
    }

    // =========================================================================
    // FlexVol
    // =========================================================================

    pub async fn volume_create(&self, options: &VolumeCreateOptions) -> Result<()> {
        self.create_volume_by_style(options, VolumeStyle::FlexVol).await
    }

    pub async fn volume_list(&self, pattern: &str) -> Result<Vec<Volume>> {
        Ok(self
            .volumes_by_pattern_style_state(pattern, VolumeStyle::FlexVol, VolumeState::Online)
            .await?
            .records)
    }

    pub async fn volume_get_by_name(&self, name: &str) -> Result<Option<Volume>> {
        self.volume_get_by_name_and_style(name, VolumeStyle::FlexVol).await
    }

    pub async fn volume_exists(&self, name: &str) -> Result<bool> {
        self.volume_exists_by_style(name, VolumeStyle::FlexVol).await
    }

    pub async fn volume_size(&self, name: &str) -> Result<u64> {
        self.volume_size_by_style(name, VolumeStyle::FlexVol).await
    }

    pub async fn volume_used_size(&self, name: &str) -> Result<i64> {
        self.volume_used_size_by_style(name, VolumeStyle::FlexVol).await
    }

    pub async fn volume_set_size(&self, name: &str, new_size: &str) -> Result<()> {
        self.volume_set_size_by_style(name, new_size, VolumeStyle::FlexVol)
            .await
    }

    pub async fn volume_mount(&self, name: &str, junction_path: &str) -> Result<()> {
        self.volume_mount_by_style(name, junction_path, VolumeStyle::FlexVol)
            .await
    }

    pub async fn volume_unmount(&self, name: &str) -> Result<()> {
        self.volume_unmount_by_style(name, VolumeStyle::FlexVol).await
    }

    pub async fn volume_rename(&self, name: &str, new_name: &str) -> Result<()> {
        self.volume_rename_by_style(name, new_name, VolumeStyle::FlexVol)
            .await
    }

    pub async fn volume_destroy(&self, name: &str) -> Result<()> {
        self.volume_destroy_by_style(name, VolumeStyle::FlexVol).await
    }

    pub async fn volume_modify_export_policy(&self, name: &str, policy: &str) -> Result<()> {
        self.volume_modify_export_policy_by_style(name, policy, VolumeStyle::FlexVol)
            .await
    }

    pub async fn volume_modify_unix_permissions(&self, name: &str, permissions: &str) -> Result<()> {
        self.volume_modify_unix_permissions_by_style(name, permissions, VolumeStyle::FlexVol)
            .await
    }

    pub async fn volume_set_comment(&self, name: &str, comment: &str) -> Result<()> {
        self.volume_set_comment_by_style(name, comment, VolumeStyle::FlexVol)
            .await
    }

    pub async fn volume_set_qos_policy_group(&self, name: &str, qos: &QosPolicyGroup) -> Result<()> {
        self.volume_set_qos_policy_group_by_style(name, qos, VolumeStyle::FlexVol)
            .await
    }

    pub async fn volume_clone_split_start(&self, name: &str) -> Result<()> {
        self.volume_clone_split_start_by_style(name, VolumeStyle::FlexVol)
            .await
    }

    pub async fn volume_modify_snapshot_directory_access(&self, name: &str, enable: bool) -> Result<()> {
        self.volume_modify_snapshot_directory_access_by_style(name, enable, VolumeStyle::FlexVol)
            .await
    }

    // =========================================================================
    // FlexGroup
    // =========================================================================

    pub async fn flexgroup_create(&self, options: &VolumeCreateOptions) -> Result<()> {
        self.create_volume_by_style(options, VolumeStyle::FlexGroup)
            .await
    }

    pub async fn flexgroup_get_all(&self, pattern: &str) -> Result<Vec<Volume>> {
        Ok(self
            .volumes_by_pattern_style_state(pattern, VolumeStyle::FlexGroup, VolumeState::Online)
            .await?
            .records)
    }

    pub async fn flexgroup_get_by_name(&self, name: &str) -> Result<Option<Volume>> {
        self.volume_get_by_name_and_style(name, VolumeStyle::FlexGroup)
            .await
    }

    pub async fn flexgroup_exists(&self, name: &str) -> Result<bool> {
        self.volume_exists_by_style(name, VolumeStyle::FlexGroup).await
    }

    pub async fn flexgroup_size(&self, name: &str) -> Result<u64> {
        self.volume_size_by_style(name, VolumeStyle::FlexGroup).await
    }

    pub async fn flexgroup_used_size(&self, name: &str) -> Result<i64> {
        self.volume_used_size_by_style(name, VolumeStyle::FlexGroup)
            .await
    }

    pub async fn flexgroup_set_size(&self, name: &str, new_size: &str) -> Result<()> {
        self.volume_set_size_by_style(name, new_size, VolumeStyle::FlexGroup)
            .await
    }

    pub async fn flexgroup_mount(&self, name: &str, junction_path: &str) -> Result<()> {
        self.volume_mount_by_style(name, junction_path, VolumeStyle::FlexGroup)
            .await
    }

    pub async fn flexgroup_unmount(&self, name: &str) -> Result<()> {
        self.volume_unmount_by_style(name, VolumeStyle::FlexGroup).await
    }

    /// Destroy a FlexGroup; one that is already gone is not an error
    pub async fn flexgroup_destroy(&self, name: &str) -> Result<()> {
        match self
            .volume_destroy_by_style(name, VolumeStyle::FlexGroup)
            .await
        {
            Err(e) if e.is_not_found() => {
                warn!(flexgroup = name, "FlexGroup not found.");
                Ok(())
            }
            other => other,
        }
    }

    pub async fn flexgroup_modify_export_policy(&self, name: &str, policy: &str) -> Result<()> {
        self.volume_modify_export_policy_by_style(name, policy, VolumeStyle::FlexGroup)
            .await
    }

    pub async fn flexgroup_modify_unix_permissions(&self, name: &str, permissions: &str) -> Result<()> {
        self.volume_modify_unix_permissions_by_style(name, permissions, VolumeStyle::FlexGroup)
            .await
    }

    pub async fn flexgroup_set_comment(&self, name: &str, comment: &str) -> Result<()> {
        self.volume_set_comment_by_style(name, comment, VolumeStyle::FlexGroup)
            .await
    }

    pub async fn flexgroup_set_qos_policy_group(&self, name: &str, qos: &QosPolicyGroup) -> Result<()> {
        self.volume_set_qos_policy_group_by_style(name, qos, VolumeStyle::FlexGroup)
            .await
    }

    pub async fn flexgroup_clone_split_start(&self, name: &str) -> Result<()> {
        self.volume_clone_split_start_by_style(name, VolumeStyle::FlexGroup)
            .await
    }

    pub async fn flexgroup_modify_snapshot_directory_access(
        &self,
        name: &str,
        enable: bool,
    ) -> Result<()> {
        self.volume_modify_snapshot_directory_access_by_style(name, enable, VolumeStyle::FlexGroup)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::{expect_jobs_succeed, test_client, ACCEPTED, SVM_UUID};
    use assert_matches::assert_matches;
    use httptest::{all_of, matchers::*, responders::*, Expectation, Server};
    use serde_json::Value;

    fn volume_lookup(name: &'static str, response: Value) -> Expectation {
        Expectation::matching(all_of![
            request::method_path("GET", "/api/storage/volumes"),
            request::query(url_decoded(contains(("name", name)))),
        ])
        .respond_with(json_encoded(response))
    }

    fn one_volume(name: &str, uuid: &str, extra: Value) -> Value {
        let mut record = json!({"name": name, "uuid": uuid, "style": "flexvol"});
        if let (Some(record), Some(extra)) = (record.as_object_mut(), extra.as_object()) {
            record.extend(extra.clone());
        }
        json!({"num_records": 1, "records": [record]})
    }

    #[tokio::test]
    async fn test_get_by_name_filters() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/api/storage/volumes"),
                request::query(url_decoded(contains(("svm.uuid", SVM_UUID)))),
                request::query(url_decoded(contains(("name", "vol1")))),
                request::query(url_decoded(contains(("state", "online")))),
                request::query(url_decoded(contains(("style", "flexvol")))),
                request::query(url_decoded(contains(("fields", "**")))),
            ])
            .respond_with(json_encoded(one_volume("vol1", "v1", json!({"size": 1024})))),
        );

        let client = test_client(&server);
        assert_eq!(client.volume_size("vol1").await.unwrap(), 1024);
    }

    #[tokio::test]
    async fn test_get_by_name_none_and_ambiguous() {
        let server = Server::run();
        server.expect(
            volume_lookup("missing", json!({"num_records": 0, "records": []})),
        );
        server.expect(
            volume_lookup("dup*", json!({
                "num_records": 2,
                "records": [{"name": "dup1"}, {"name": "dup2"}]
            })),
        );

        let client = test_client(&server);
        assert!(!client.volume_exists("missing").await.unwrap());
        assert!(!client.volume_exists("").await.unwrap());
        assert_matches!(
            client.volume_get_by_name("dup*").await,
            Err(Error::NotUnique(m)) if m == "could not find unique volume with name 'dup*'; found 2 matching volumes"
        );
    }

    #[tokio::test]
    async fn test_get_by_name_count_without_records() {
        let server = Server::run();
        server.expect(volume_lookup("ghost", json!({"num_records": 1, "records": []})));

        let client = test_client(&server);
        assert_matches!(
            client
                .volume_get_by_name_and_style("ghost", VolumeStyle::FlexVol)
                .await,
            Err(Error::UnexpectedResponse(m)) if m.contains("'ghost'")
        );
    }

    #[tokio::test]
    async fn test_used_size_missing_volume() {
        let server = Server::run();
        server.expect(
            volume_lookup("gone", json!({"num_records": 0, "records": []})),
        );

        let client = test_client(&server);
        let err = client.volume_used_size("gone").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_create_polls_and_waits() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/api/storage/volumes"),
                request::body(json_decoded(eq(json!({
                    "name": "vol1",
                    "size": 1073741824u64,
                    "guarantee": {"type": "none"},
                    "snapshot_policy": {"name": "default"},
                    "comment": "",
                    "state": "online",
                    "style": "flexvol",
                    "svm": {"uuid": SVM_UUID},
                    "aggregates": [{"name": "aggr1"}],
                    "space": {"snapshot": {"reserve_percent": 5}},
                    "encryption": {"enabled": false},
                    "qos": {"policy": {"name": "gold"}},
                    "nas": {
                        "security_style": "unix",
                        "unix_permissions": 755,
                        "export_policy": {"name": "default"}
                    }
                })))),
            ])
            .respond_with(status_code(202).body(ACCEPTED)),
        );
        expect_jobs_succeed(&server, 1);
        server.expect(
            volume_lookup("vol1", one_volume("vol1", "v1", json!({}))),
        );

        let client = test_client(&server);
        let options = VolumeCreateOptions {
            name: "vol1".into(),
            aggregates: vec!["aggr1".into()],
            size: "1g".into(),
            space_reserve: "none".into(),
            snapshot_policy: "default".into(),
            unix_permissions: "rwxr-xr-x".into(),
            export_policy: "default".into(),
            security_style: "unix".into(),
            qos_policy_group: QosPolicyGroup::fixed("gold"),
            encrypt: Some(false),
            snapshot_reserve: Some(5),
            ..Default::default()
        };
        client.volume_create(&options).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_dp_volume_skips_permissions() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/api/storage/volumes"),
                request::body(json_decoded(eq(json!({
                    "name": "fg1",
                    "size": 2147483648u64,
                    "guarantee": {"type": ""},
                    "snapshot_policy": {"name": ""},
                    "comment": "",
                    "state": "online",
                    "style": "flexgroup",
                    "svm": {"uuid": SVM_UUID},
                    "type": "DP"
                })))),
            ])
            .respond_with(status_code(202).body(ACCEPTED)),
        );
        expect_jobs_succeed(&server, 1);
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/api/storage/volumes"),
                request::query(url_decoded(contains(("style", "flexgroup")))),
            ])
            .respond_with(json_encoded(one_volume("fg1", "f1", json!({})))),
        );

        let client = test_client(&server);
        let options = VolumeCreateOptions {
            name: "fg1".into(),
            size: "2g".into(),
            unix_permissions: "rwxrwxrwx".into(),
            dp_volume: true,
            ..Default::default()
        };
        client.flexgroup_create(&options).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_rejects_bad_size() {
        let server = Server::run();
        let client = test_client(&server);
        let options = VolumeCreateOptions {
            name: "vol1".into(),
            size: "lots".into(),
            ..Default::default()
        };
        assert_matches!(client.volume_create(&options).await, Err(Error::InvalidSize(_)));
    }

    #[tokio::test]
    async fn test_mount_skips_when_already_mounted() {
        let server = Server::run();
        server.expect(
            volume_lookup("vol1", one_volume(
                "vol1",
                "v1",
                json!({"nas": {"path": "/vol1"}}),
            )),
        );

        let client = test_client(&server);
        client.volume_mount("vol1", "/vol1").await.unwrap();
    }

    #[tokio::test]
    async fn test_unmount_missing_volume_is_ok() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/api/storage/volumes"),
                request::query(url_decoded(not(contains(key("state"))))),
            ])
            .respond_with(json_encoded(json!({"num_records": 0, "records": []}))),
        );

        let client = test_client(&server);
        client.volume_unmount("vol1").await.unwrap();
    }

    #[tokio::test]
    async fn test_set_size_patches_bytes() {
        let server = Server::run();
        server.expect(
            volume_lookup("vol1", one_volume("vol1", "v1", json!({}))),
        );
        server.expect(
            Expectation::matching(all_of![
                request::method_path("PATCH", "/api/storage/volumes/v1"),
                request::body(json_decoded(eq(json!({"size": 104857600u64})))),
            ])
            .respond_with(status_code(202).body(ACCEPTED)),
        );
        expect_jobs_succeed(&server, 1);

        let client = test_client(&server);
        client.volume_set_size("vol1", "100Mi").await.unwrap();
    }

    #[tokio::test]
    async fn test_restore_snapshot_uses_query() {
        let server = Server::run();
        server.expect(
            volume_lookup("vol1", one_volume("vol1", "v1", json!({}))),
        );
        server.expect(
            Expectation::matching(all_of![
                request::method_path("PATCH", "/api/storage/volumes/v1"),
                request::query(url_decoded(contains(("restore_to.snapshot.name", "snap1")))),
            ])
            .respond_with(status_code(202).body(ACCEPTED)),
        );
        expect_jobs_succeed(&server, 1);

        let client = test_client(&server);
        client
            .volume_restore_snapshot_by_style("vol1", "snap1", VolumeStyle::FlexVol)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_qos_validation() {
        let server = Server::run();
        let client = test_client(&server);
        assert_matches!(
            client.volume_set_qos_policy_group("vol1", &QosPolicyGroup::default()).await,
            Err(Error::InvalidArgument(m)) if m == "invalid QoS policy group"
        );
        assert_matches!(
            client.volume_set_qos_policy_group("vol1", &QosPolicyGroup::fixed("")).await,
            Err(Error::InvalidArgument(m)) if m == "missing QoS policy group name"
        );
    }

    #[tokio::test]
    async fn test_quota_already_enabled() {
        let server = Server::run();
        server.expect(
            volume_lookup("vol1", one_volume(
                "vol1",
                "v1",
                json!({"quota": {"enabled": true}}),
            )),
        );

        let client = test_client(&server);
        client.volume_set_quota_enabled("vol1", true).await.unwrap();
    }

    #[tokio::test]
    async fn test_flexgroup_destroy_missing_is_ok() {
        let mut server = Server::run();
        server.expect(
            volume_lookup("fg1", json!({"num_records": 0, "records": []})),
        );

        let client = test_client(&server);
        client.flexgroup_destroy("fg1").await.unwrap();
        server.verify_and_clear();

        server.expect(
            volume_lookup("vol1", json!({"num_records": 0, "records": []})),
        );
        assert_matches!(
            client.volume_destroy("vol1").await,
            Err(Error::NotFound(m)) if m == "could not find volume: vol1"
        );
    }

    #[tokio::test]
    async fn test_list_by_attrs() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/api/storage/volumes"),
                request::query(url_decoded(contains(("name", "*")))),
                request::query(url_decoded(contains(("aggregates.name", "aggr1|aggr2")))),
                request::query(url_decoded(contains(("tiering.policy", "*")))),
                request::query(url_decoded(contains(("encryption.enabled", "true")))),
                request::query(url_decoded(not(contains(key("snapshot_directory_access_enabled"))))),
            ])
            .respond_with(json_encoded(json!({
                "num_records": 1,
                "records": [{
                    "name": "vol9",
                    "aggregates": [{"name": "aggr1"}],
                    "guarantee": {"type": "none"},
                    "snapshot_policy": {"name": "none"},
                    "encryption": {"enabled": true}
                }]
            }))),
        );

        let client = test_client(&server);
        let filter = VolumeAttributes {
            aggregates: vec!["aggr1".into(), "aggr2".into()],
            encrypt: Some(true),
            ..Default::default()
        };
        let volumes = client.volume_list_by_attrs(&filter).await.unwrap();
        assert_eq!(
            volumes,
            vec![VolumeAttributes {
                name: "vol9".into(),
                aggregates: vec!["aggr1".into()],
                tiering_policy: "none".into(),
                snapshot_policy: "none".into(),
                space_reserve: "none".into(),
                snapshot_reserve: None,
                snapshot_dir: Some(false),
                encrypt: Some(true),
            }]
        );
    }

    #[tokio::test]
    async fn test_clone_create_and_backed_by_snapshot() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/api/storage/volumes"),
                request::query(url_decoded(contains(("return_records", "true")))),
                request::body(json_decoded(eq(json!({
                    "name": "clone1",
                    "clone": {
                        "parent_volume": {"name": "vol1"},
                        "parent_snapshot": {"name": "snap1"},
                        "is_flexclone": true
                    },
                    "svm": {"uuid": SVM_UUID}
                })))),
            ])
            .respond_with(status_code(202).body(ACCEPTED)),
        );
        expect_jobs_succeed(&server, 1);
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/api/storage/volumes"),
                request::query(url_decoded(contains(("clone.parent_snapshot.name", "snap1")))),
            ])
            .respond_with(json_encoded(json!({
                "num_records": 2,
                "records": [
                    {"name": "clone1", "clone": {"parent_volume": {"name": "vol1"}, "parent_snapshot": {"name": "snap1"}}},
                    {"name": "other", "clone": {"parent_volume": {"name": "vol2"}, "parent_snapshot": {"name": "snap1"}}}
                ]
            }))),
        );

        let client = test_client(&server);
        client
            .volume_clone_create_async("clone1", "vol1", "snap1")
            .await
            .unwrap();
        let clones = client
            .volume_list_all_backed_by_snapshot("vol1", "snap1")
            .await
            .unwrap();
        assert_eq!(clones, vec!["clone1".to_string()]);
    }
}
