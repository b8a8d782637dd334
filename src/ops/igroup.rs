//! Initiator Groups

use crate::client::{segment, Query, RestClient};
use crate::error::{Error, Result};
use crate::models::{Collection, Igroup};
use serde_json::{json, Value};
use tracing::{debug, info};

const IGROUPS: &str = "protocols/san/igroups";

impl RestClient {
    /// Create an initiator group in the current SVM
    pub async fn igroup_create(&self, name: &str, protocol: &str, os_type: &str) -> Result<()> {
        let body = json!({
            "name": name,
            "protocol": protocol,
            "os_type": os_type,
            "svm": {"uuid": self.svm_uuid()},
        });
        info!(igroup = name, protocol, os_type, "Creating igroup");
        let created: Collection<Igroup> = self
            .post(IGROUPS, &Query::new().return_records(), &body)
            .await?;
        match created.num_records {
            Some(1) => Ok(()),
            Some(n) => Err(Error::UnexpectedResponse(format!(
                "unexpected response from igroup create, created {} igroups",
                n
            ))),
            None => Err(Error::UnexpectedResponse(
                "unexpected response from igroup create, payload numRecords was nil".into(),
            )),
        }
    }

    async fn igroup_uuid(&self, name: &str) -> Result<String> {
        let igroup = self.igroup_get_by_name(name).await?.ok_or_else(|| {
            Error::NotFound("unexpected response from igroup lookup, igroup was nil".into())
        })?;
        igroup.uuid.ok_or_else(|| {
            Error::UnexpectedResponse(
                "unexpected response from igroup lookup, igroup uuid was nil".into(),
            )
        })
    }

    /// Add an initiator to an initiator group
    pub async fn igroup_add(&self, name: &str, initiator: &str) -> Result<()> {
        let uuid = self.igroup_uuid(name).await?;
        let _: Value = self
            .post(
                &format!("{}/{}/initiators", IGROUPS, uuid),
                &Query::new(),
                &json!({ "name": initiator }),
            )
            .await?;
        Ok(())
    }

    /// Remove an initiator from an initiator group
    pub async fn igroup_remove(&self, name: &str, initiator: &str) -> Result<()> {
        let uuid = self.igroup_uuid(name).await?;
        let _: Value = self
            .delete(
                &format!("{}/{}/initiators/{}", IGROUPS, uuid, segment(initiator)),
                &Query::new(),
            )
            .await?;
        Ok(())
    }

    /// Delete an initiator group; one that does not exist is not an error
    pub async fn igroup_destroy(&self, name: &str) -> Result<()> {
        let Some(igroup) = self.igroup_get_by_name(name).await? else {
            debug!(igroup = name, "No such initiator group (igroup).");
            return Ok(());
        };
        let Some(uuid) = igroup.uuid else {
            debug!(igroup = name, "Initiator group is missing its UUID.");
            return Ok(());
        };

        info!(igroup = name, "Destroying igroup");
        let _: Value = self
            .delete(&format!("{}/{}", IGROUPS, uuid), &Query::new())
            .await?;
        Ok(())
    }

    pub async fn igroup_list(&self, pattern: &str) -> Result<Collection<Igroup>> {
        let pattern = if pattern.is_empty() { "*" } else { pattern };
        let query = Query::new()
            .with("svm.uuid", self.svm_uuid())
            .with("name", pattern)
            .all_fields();
        self.get_all(IGROUPS, &query).await
    }

    pub async fn igroup_get(&self, uuid: &str) -> Result<Igroup> {
        self.get(&format!("{}/{}", IGROUPS, uuid), &Query::new())
            .await
    }

    pub async fn igroup_get_by_name(&self, name: &str) -> Result<Option<Igroup>> {
        Ok(self.igroup_list(name).await?.into_single())
    }
}
