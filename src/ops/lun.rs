//! LUNs and LUN Maps
//!
//! LUNs are addressed by path (`/vol/<volume>/<lun>`). Creation is
//! synchronous on the controller but the new LUN can take a moment to become
//! visible, so create waits for it under the `lun_create` backoff.

use crate::client::{segment, Query, RestClient};
use crate::domain::QosPolicyGroup;
use crate::error::{Error, Result, LUN_MAP_EXIST_ERROR};
use crate::models::{Collection, Lun, LunMap, LunOptions, ReportingNode};
use crate::util::convert_size_to_bytes;
use serde_json::{json, Value};
use tracing::{debug, info, instrument};

const LUNS: &str = "storage/luns";
const LUN_MAPS: &str = "protocols/san/lun-maps";

/// Options for creating a LUN
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LunCreateOptions {
    /// Full path such as `/vol/vol1/lun0`
    pub path: String,
    pub size_bytes: u64,
    pub os_type: String,
    pub qos_policy_group: QosPolicyGroup,
    /// Request a space guarantee
    pub space_reserved: bool,
    /// Enable SCSI thin provisioning support
    pub space_allocated: bool,
}

impl RestClient {
    // =========================================================================
    // Create and Delete
    // =========================================================================

    #[instrument(skip(self, options), fields(lun = %options.path))]
    pub async fn lun_create(&self, options: &LunCreateOptions) -> Result<()> {
        let body = json!({
            "name": options.path,
            "os_type": options.os_type,
            "space": {
                "size": options.size_bytes,
                "guarantee": {"requested": options.space_reserved},
                "scsi_thin_provisioning_support_enabled": options.space_allocated,
            },
            "qos_policy": {"name": options.qos_policy_group.name},
            "svm": {"uuid": self.svm_uuid()},
        });
        info!(size = options.size_bytes, "Creating LUN");
        let _: Value = self
            .post(LUNS, &Query::new().return_records(), &body)
            .await?;
        self.wait_for_lun(&options.path).await
    }

    /// Clone `source_path` into a new LUN at `path`
    #[instrument(skip(self, qos))]
    pub async fn lun_clone_create(
        &self,
        path: &str,
        source_path: &str,
        size_bytes: u64,
        qos: &QosPolicyGroup,
    ) -> Result<()> {
        let body = json!({
            "name": path,
            "clone": {"source": {"name": source_path}},
            "space": {"size": size_bytes},
            "qos_policy": {"name": qos.name},
            "svm": {"uuid": self.svm_uuid()},
        });
        info!("Cloning LUN");
        let _: Value = self
            .post(LUNS, &Query::new().return_records(), &body)
            .await?;
        self.wait_for_lun(path).await
    }

    async fn wait_for_lun(&self, path: &str) -> Result<()> {
        let client = self;
        self.wait_until(
            &format!("LUN {}", path),
            &self.config().polling.lun_create,
            move || async move { client.lun_get_by_name(path).await.map(|_| true) },
        )
        .await
    }

    pub async fn lun_delete(&self, uuid: &str) -> Result<()> {
        info!(lun = uuid, "Deleting LUN");
        let _: Value = self
            .delete(&format!("{}/{}", LUNS, uuid), &Query::new())
            .await?;
        Ok(())
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub async fn lun_get(&self, uuid: &str) -> Result<Lun> {
        self.get(&format!("{}/{}", LUNS, uuid), &Query::new()).await
    }

    pub async fn lun_list(&self, pattern: &str) -> Result<Collection<Lun>> {
        let query = Query::new()
            .with("svm.uuid", self.svm_uuid())
            .with("name", pattern)
            .all_fields();
        self.get_all(LUNS, &query).await
    }

    /// The LUN at `path`; NotFound unless exactly one matches
    pub async fn lun_get_by_name(&self, path: &str) -> Result<Lun> {
        let result = self.lun_list(path).await?;
        match result.num_records() {
            0 => Err(Error::NotFound(format!("could not find LUN with name {}", path))),
            1 => result
                .into_single()
                .ok_or_else(|| Error::NotFound(format!("could not find LUN with name {}", path))),
            n => Err(Error::NotUnique(format!(
                "found {} LUNs matching name {}",
                n, path
            ))),
        }
    }

    async fn lun_uuid(&self, path: &str) -> Result<(String, Lun)> {
        let lun = self.lun_get_by_name(path).await?;
        let uuid = lun.uuid.clone().ok_or_else(|| {
            Error::UnexpectedResponse(format!("could not find LUN uuid with name {}", path))
        })?;
        Ok((uuid, lun))
    }

    async fn lun_modify(&self, path: &str, body: Value) -> Result<()> {
        let (uuid, _) = self.lun_uuid(path).await?;
        let _: Value = self
            .patch(&format!("{}/{}", LUNS, uuid), &Query::new(), Some(&body))
            .await?;
        Ok(())
    }

    // =========================================================================
    // Properties
    // =========================================================================

    pub async fn lun_get_comment(&self, path: &str) -> Result<String> {
        self.lun_get_by_name(path)
            .await?
            .comment
            .ok_or_else(|| Error::NotFound("LUN did not have a comment".into()))
    }

    pub async fn lun_set_comment(&self, path: &str, comment: &str) -> Result<()> {
        self.lun_modify(path, json!({ "comment": comment })).await
    }

    /// Value of a named attribute, or an empty string when it is not set
    pub async fn lun_get_attribute(&self, path: &str, name: &str) -> Result<String> {
        let lun = self.lun_get_by_name(path).await?;
        Ok(lun
            .attributes
            .into_iter()
            .find(|a| a.name.as_deref() == Some(name))
            .and_then(|a| a.value)
            .unwrap_or_default())
    }

    /// Create or replace a named attribute
    pub async fn lun_set_attribute(&self, path: &str, name: &str, value: &str) -> Result<()> {
        let (uuid, lun) = self.lun_uuid(path).await?;
        let exists = lun.attributes.iter().any(|a| a.name.as_deref() == Some(name));

        let attributes = format!("{}/{}/attributes", LUNS, uuid);
        if exists {
            debug!(lun = path, attribute = name, "Modifying LUN attribute");
            let _: Value = self
                .patch(
                    &format!("{}/{}", attributes, segment(name)),
                    &Query::new(),
                    Some(&json!({ "value": value })),
                )
                .await?;
        } else {
            debug!(lun = path, attribute = name, "Creating LUN attribute");
            let _: Value = self
                .post(&attributes, &Query::new(), &json!({"name": name, "value": value}))
                .await?;
        }
        Ok(())
    }

    pub async fn lun_set_qos_policy_group(&self, path: &str, policy: &str) -> Result<()> {
        self.lun_modify(path, json!({"qos_policy": {"name": policy}}))
            .await
    }

    pub async fn lun_rename(&self, path: &str, new_path: &str) -> Result<()> {
        info!(lun = path, new_path, "Renaming LUN");
        self.lun_modify(path, json!({ "name": new_path })).await
    }

    pub async fn lun_size(&self, path: &str) -> Result<i64> {
        let lun = self.lun_get_by_name(path).await?;
        let space = lun.space.ok_or_else(|| {
            Error::UnexpectedResponse(format!("could not find LUN space with name {}", path))
        })?;
        space.size.ok_or_else(|| {
            Error::UnexpectedResponse(format!("could not find LUN size with name {}", path))
        })
    }

    /// Resize a LUN and return the new size in bytes
    pub async fn lun_set_size(&self, path: &str, new_size: &str) -> Result<u64> {
        let bytes = convert_size_to_bytes(new_size)?;
        info!(lun = path, bytes, "Resizing LUN");
        self.lun_modify(path, json!({"space": {"size": bytes}}))
            .await?;
        Ok(bytes)
    }

    /// Size limits the controller accepts for new LUNs
    pub async fn lun_options(&self) -> Result<LunOptions> {
        let query = Query::new()
            .with("return_schema", "POST")
            .with("fields", "space.size");
        self.options(LUNS, &query).await
    }

    // =========================================================================
    // Maps
    // =========================================================================

    /// Maps of the LUN, optionally narrowed to one igroup
    pub async fn lun_map_info(&self, igroup: &str, path: &str) -> Result<Collection<LunMap>> {
        let query = Query::new()
            .with("lun.name", path)
            .with_opt("igroup.name", Some(igroup).filter(|s| !s.is_empty()))
            .with("fields", "svm,lun,igroup,logical_unit_number");
        self.get(LUN_MAPS, &query).await
    }

    pub async fn lun_map_list(&self, igroup: &str, path: &str) -> Result<Collection<LunMap>> {
        let query = Query::new()
            .with("igroup.name", igroup)
            .with("lun.name", path)
            .all_fields();
        self.get(LUN_MAPS, &query).await
    }

    /// Map a LUN into an igroup; `lun_id` of -1 lets the controller choose
    #[instrument(skip(self))]
    pub async fn lun_map(&self, igroup: &str, path: &str, lun_id: i64) -> Result<Collection<LunMap>> {
        let lun = self.lun_get_by_name(path).await?;

        let mut body = json!({
            "igroup": {"name": igroup},
            "lun": {"name": path, "uuid": lun.uuid},
            "svm": {"uuid": self.svm_uuid()},
        });
        if lun_id != -1 {
            body["logical_unit_number"] = json!(lun_id);
        }
        info!("Mapping LUN");
        self.post(LUN_MAPS, &Query::new().return_records(), &body)
            .await
    }

    /// Remove the LUN from an igroup; an absent map is not an error
    #[instrument(skip(self))]
    pub async fn lun_unmap(&self, igroup: &str, path: &str) -> Result<()> {
        let maps = self.lun_map_info(igroup, path).await?;
        let Some(count) = maps.num_records else {
            return Err(Error::UnexpectedResponse(format!(
                "problem reading maps for LUN {}",
                path
            )));
        };
        if count == 0 {
            return Ok(());
        }
        let igroup_uuid = maps
            .records
            .first()
            .and_then(|m| m.igroup.as_ref())
            .and_then(|i| i.uuid.clone())
            .ok_or_else(|| {
                Error::UnexpectedResponse(format!("problem reading maps for LUN {}", path))
            })?;
        let (lun_uuid, _) = self.lun_uuid(path).await?;

        info!("Unmapping LUN");
        let _: Value = self
            .delete(
                &format!("{}/{}/{}", LUN_MAPS, lun_uuid, igroup_uuid),
                &Query::new(),
            )
            .await?;
        Ok(())
    }

    /// Names of the nodes reporting the LUN through the igroup
    pub async fn lun_map_get_reporting_nodes(&self, igroup: &str, path: &str) -> Result<Vec<String>> {
        let (lun_uuid, _) = self.lun_uuid(path).await?;
        let igroup_uuid = self
            .igroup_get_by_name(igroup)
            .await?
            .ok_or_else(|| Error::NotFound(format!("could not find igroup with name {}", igroup)))?
            .uuid
            .ok_or_else(|| {
                Error::UnexpectedResponse(format!("could not find igroup uuid with name {}", igroup))
            })?;

        let result: Result<Collection<ReportingNode>> = self
            .get(
                &format!("{}/{}/{}/reporting-nodes", LUN_MAPS, lun_uuid, igroup_uuid),
                &Query::new(),
            )
            .await;
        match result {
            Ok(nodes) => Ok(nodes.records.into_iter().filter_map(|n| n.name).collect()),
            Err(e) if e.api_code() == Some(LUN_MAP_EXIST_ERROR) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}
