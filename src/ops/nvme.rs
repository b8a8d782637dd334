//! NVMe Namespaces, Subsystems and Hosts

use crate::client::{segment, Query, RestClient};
use crate::error::{Error, Result};
use crate::models::{Collection, NvmeHost, NvmeNamespace, NvmeSubsystem, NvmeSubsystemMap};
use crate::util::convert_size_to_bytes;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, instrument};

const NAMESPACES: &str = "storage/namespaces";
const SUBSYSTEMS: &str = "protocols/nvme/subsystems";
const SUBSYSTEM_MAPS: &str = "protocols/nvme/subsystem-maps";

/// Parameters for [`RestClient::nvme_namespace_create`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NvmeNamespaceOptions {
    pub name: String,
    pub os_type: String,
    /// Human readable size, e.g. `10GiB`
    pub size: String,
    pub block_size: i64,
    pub comment: String,
}

impl RestClient {
    // =========================================================================
    // Namespaces
    // =========================================================================

    /// Create a namespace and return its uuid
    #[instrument(skip(self, options), fields(namespace = %options.name))]
    pub async fn nvme_namespace_create(&self, options: &NvmeNamespaceOptions) -> Result<String> {
        let size = convert_size_to_bytes(&options.size)?;
        let body = json!({
            "name": options.name,
            "os_type": options.os_type,
            "space": {"size": size, "block_size": options.block_size},
            "comment": options.comment,
            "svm": {"uuid": self.svm_uuid()},
        });

        info!(size, "Creating namespace");
        let created: Collection<NvmeNamespace> = self
            .post(NAMESPACES, &Query::new().return_records(), &body)
            .await?;
        created
            .into_single()
            .filter(|ns| ns.name.as_deref() == Some(options.name.as_str()))
            .and_then(|ns| ns.uuid)
            .ok_or_else(|| {
                Error::UnexpectedResponse(
                    "namespace create call succeeded but newly created namespace not found".into(),
                )
            })
    }

    pub async fn nvme_namespace_set_size(&self, uuid: &str, new_size: i64) -> Result<()> {
        info!(namespace = uuid, new_size, "Resizing namespace");
        let body = json!({ "space": { "size": new_size } });
        let _: Value = self
            .patch(&format!("{}/{}", NAMESPACES, uuid), &Query::new(), Some(&body))
            .await?;
        Ok(())
    }

    pub async fn nvme_namespace_list(&self, pattern: &str) -> Result<Collection<NvmeNamespace>> {
        let query = Query::new()
            .with("svm.uuid", self.svm_uuid())
            .with("name", pattern)
            .all_fields();
        self.get_all(NAMESPACES, &query).await
    }

    pub async fn nvme_namespace_get_by_name(&self, name: &str) -> Result<NvmeNamespace> {
        self.nvme_namespace_list(name)
            .await?
            .into_single()
            .ok_or_else(|| Error::NotFound(format!("could not find namespace with name {}", name)))
    }

    pub async fn nvme_namespace_size(&self, name: &str) -> Result<i64> {
        self.nvme_namespace_get_by_name(name)
            .await?
            .size()
            .ok_or_else(|| {
                Error::UnexpectedResponse(format!("could not find size of namespace {}", name))
            })
    }

    // =========================================================================
    // Subsystem Maps
    // =========================================================================

    pub async fn nvme_subsystem_add_namespace(
        &self,
        subsystem_uuid: &str,
        namespace_uuid: &str,
    ) -> Result<()> {
        let body = json!({
            "namespace": {"uuid": namespace_uuid},
            "subsystem": {"uuid": subsystem_uuid},
            "svm": {"uuid": self.svm_uuid()},
        });
        info!(subsystem = subsystem_uuid, namespace = namespace_uuid, "Mapping namespace");
        let _: Value = self.post(SUBSYSTEM_MAPS, &Query::new(), &body).await?;
        Ok(())
    }

    pub async fn nvme_subsystem_remove_namespace(
        &self,
        subsystem_uuid: &str,
        namespace_uuid: &str,
    ) -> Result<()> {
        info!(subsystem = subsystem_uuid, namespace = namespace_uuid, "Unmapping namespace");
        let _: Value = self
            .delete(
                &format!("{}/{}/{}", SUBSYSTEM_MAPS, subsystem_uuid, namespace_uuid),
                &Query::new(),
            )
            .await?;
        Ok(())
    }

    async fn nvme_subsystem_maps(&self, subsystem_uuid: &str) -> Result<Collection<NvmeSubsystemMap>> {
        self.get(
            SUBSYSTEM_MAPS,
            &Query::new().with("subsystem.uuid", subsystem_uuid),
        )
        .await
    }

    pub async fn nvme_is_namespace_mapped(
        &self,
        subsystem_uuid: &str,
        namespace_uuid: &str,
    ) -> Result<bool> {
        let maps = self.nvme_subsystem_maps(subsystem_uuid).await?;
        Ok(maps
            .records
            .iter()
            .filter_map(|m| m.namespace.as_ref().and_then(|ns| ns.uuid()))
            .any(|uuid| uuid == namespace_uuid))
    }

    /// Number of namespaces mapped to the subsystem
    pub async fn nvme_namespace_count(&self, subsystem_uuid: &str) -> Result<i64> {
        let maps = self.nvme_subsystem_maps(subsystem_uuid).await?;
        maps.num_records.ok_or_else(|| {
            Error::UnexpectedResponse("failed to get subsystem map collection".into())
        })
    }

    // =========================================================================
    // Subsystems
    // =========================================================================

    pub async fn nvme_subsystem_list(&self, pattern: &str) -> Result<Collection<NvmeSubsystem>> {
        let pattern = if pattern.is_empty() { "*" } else { pattern };
        let query = Query::new()
            .with("svm.uuid", self.svm_uuid())
            .with("name", pattern)
            .all_fields();
        let subsystems = self.get_all(SUBSYSTEMS, &query).await?;
        debug!(count = subsystems.num_records(), "Listed subsystems");
        Ok(subsystems)
    }

    pub async fn nvme_subsystem_get_by_name(&self, name: &str) -> Result<Option<NvmeSubsystem>> {
        Ok(self.nvme_subsystem_list(name).await?.into_single())
    }

    pub async fn nvme_subsystem_create(&self, name: &str) -> Result<NvmeSubsystem> {
        let body = json!({
            "name": name,
            "os_type": "linux",
            "svm": {"name": self.svm_name()},
        });
        info!(subsystem = name, "Creating subsystem");
        let created: Collection<NvmeSubsystem> = self
            .post(SUBSYSTEMS, &Query::new().return_records(), &body)
            .await?;
        created
            .into_single()
            .filter(|s| s.name.as_deref() == Some(name))
            .ok_or_else(|| {
                Error::UnexpectedResponse(
                    "subsystem create call succeeded but newly created subsystem not found".into(),
                )
            })
    }

    /// Delete a subsystem along with its host entries and namespace maps
    pub async fn nvme_subsystem_delete(&self, uuid: &str) -> Result<()> {
        let query = Query::new()
            .with("allow_delete_while_mapped", true)
            .with("allow_delete_with_hosts", true);
        info!(subsystem = uuid, "Deleting subsystem");
        let _: Value = self
            .delete(&format!("{}/{}", SUBSYSTEMS, uuid), &query)
            .await?;
        Ok(())
    }

    // =========================================================================
    // Hosts
    // =========================================================================

    pub async fn nvme_add_host_to_subsystem(&self, host_nqn: &str, subsystem_uuid: &str) -> Result<()> {
        let _: Value = self
            .post(
                &format!("{}/{}/hosts", SUBSYSTEMS, subsystem_uuid),
                &Query::new(),
                &json!({ "nqn": host_nqn }),
            )
            .await?;
        Ok(())
    }

    pub async fn nvme_remove_host_from_subsystem(
        &self,
        host_nqn: &str,
        subsystem_uuid: &str,
    ) -> Result<()> {
        let _: Value = self
            .delete(
                &format!("{}/{}/hosts/{}", SUBSYSTEMS, subsystem_uuid, segment(host_nqn)),
                &Query::new(),
            )
            .await?;
        Ok(())
    }

    pub async fn nvme_get_hosts_of_subsystem(&self, subsystem_uuid: &str) -> Result<Vec<NvmeHost>> {
        let hosts: Collection<NvmeHost> = self
            .get(
                &format!("{}/{}/hosts", SUBSYSTEMS, subsystem_uuid),
                &Query::new(),
            )
            .await?;
        Ok(hosts.records)
    }
}
