//! iSCSI Services and CHAP Credentials

use crate::client::{Query, RestClient};
use crate::error::{Error, Result};
use crate::models::{Collection, IscsiCredentials, IscsiService};
use serde_json::json;
use tracing::info;

const CREDENTIALS: &str = "protocols/san/iscsi/credentials";
const SERVICES: &str = "protocols/san/iscsi/services";

/// CHAP settings applied to the default initiator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChapSettings {
    pub auth_type: String,
    pub user: String,
    pub passphrase: String,
    pub outbound_user: String,
    pub outbound_passphrase: String,
}

impl RestClient {
    pub async fn iscsi_initiator_get_default_auth(&self) -> Result<Collection<IscsiCredentials>> {
        let query = Query::new()
            .return_records()
            .with("svm.uuid", self.svm_uuid())
            .with("initiator", "default")
            .all_fields();
        self.get(CREDENTIALS, &query).await
    }

    pub async fn iscsi_interface_get(&self) -> Result<Collection<IscsiService>> {
        let query = Query::new()
            .return_records()
            .with("svm.uuid", self.svm_uuid())
            .all_fields();
        self.get(SERVICES, &query).await
    }

    /// Set the CHAP credentials of the SVM's default initiator
    pub async fn iscsi_initiator_set_default_auth(&self, chap: &ChapSettings) -> Result<()> {
        let current = self.iscsi_initiator_get_default_auth().await?;
        if current.num_records != Some(1) && current.num_records.is_some() {
            return Err(Error::NotUnique(
                "should only be one default iscsi initiator".into(),
            ));
        }
        let initiator = current
            .into_single()
            .and_then(|c| c.initiator)
            .ok_or_else(|| {
                Error::UnexpectedResponse("could not get the default iscsi initiator".into())
            })?;

        let mut chap_body = json!({
            "inbound": {"user": chap.user, "password": chap.passphrase},
        });
        if !chap.outbound_user.is_empty() && !chap.outbound_passphrase.is_empty() {
            chap_body["outbound"] = json!({
                "user": chap.outbound_user,
                "password": chap.outbound_passphrase,
            });
        }
        let body = json!({
            "authentication_type": chap.auth_type,
            "chap": chap_body,
        });

        info!(initiator = %initiator, auth_type = %chap.auth_type, "Setting default iSCSI auth");
        let path = format!(
            "{}/{}/{}",
            CREDENTIALS,
            self.svm_uuid(),
            crate::client::segment(&initiator)
        );
        let _: serde_json::Value = self.patch(&path, &Query::new(), Some(&body)).await?;
        Ok(())
    }

    /// iSCSI service of the current SVM, including its target node name
    pub async fn iscsi_node_get_name(&self) -> Result<IscsiService> {
        let svm = self.svm_get(&self.svm_uuid()).await?;
        let svm_uuid = svm.uuid.ok_or_else(|| {
            Error::NotFound(format!(
                "could not find SVM {} ({})",
                self.svm_name(),
                self.svm_uuid()
            ))
        })?;
        self.get(&format!("{}/{}", SERVICES, svm_uuid), &Query::new().all_fields())
            .await
    }
}
