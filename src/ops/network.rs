//! Network Interfaces

use crate::client::{Query, RestClient};
use crate::error::{Error, Result};
use crate::models::{Collection, IpInterface};
use tracing::debug;

const IP_INTERFACES: &str = "network/ip/interfaces";

impl RestClient {
    pub async fn network_ip_interfaces_list(&self) -> Result<Collection<IpInterface>> {
        let query = Query::new()
            .with("svm.uuid", self.svm_uuid())
            .all_fields();
        self.get_all(IP_INTERFACES, &query).await
    }

    /// Addresses of the SVM's up data LIFs serving `protocol` (`nfs`, `iscsi`, ...)
    pub async fn net_interface_get_data_lifs(&self, protocol: &str) -> Result<Vec<String>> {
        if protocol.is_empty() {
            return Err(Error::InvalidArgument("missing protocol specification".into()));
        }
        let query = Query::new()
            .with("services", format!("data_{}", protocol))
            .with("svm.uuid", self.svm_uuid())
            .all_fields();
        let interfaces: Collection<IpInterface> = self.get(IP_INTERFACES, &query).await?;

        let lifs: Vec<String> = interfaces
            .records
            .into_iter()
            .filter(|i| i.state.as_deref() == Some("up"))
            .filter_map(|i| i.ip.and_then(|ip| ip.address))
            .collect();
        debug!(data_lifs = ?lifs, "Data LIFs");
        Ok(lifs)
    }
}
