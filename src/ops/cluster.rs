//! Cluster, Nodes and EMS

use crate::client::{Query, RestClient};
use crate::domain::Feature;
use crate::error::{Error, Result};
use crate::models::{Cluster, Collection, Node};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Oldest ONTAP release this client supports
pub const MINIMUM_ONTAP_VERSION: semver::Version = semver::Version::new(9, 12, 1);

/// An application event sent to the controller's event management system
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmsEvent {
    pub app_version: String,
    pub autosupport_required: bool,
    pub category: String,
    pub computer_name: String,
    pub event_description: String,
    pub event_id: i64,
    pub event_source: String,
}

impl RestClient {
    pub async fn cluster_info(&self) -> Result<Cluster> {
        self.get("cluster", &Query::new().all_fields()).await
    }

    /// Cluster version as `generation.major.minor`, cached after the first read
    pub async fn system_get_ontap_version(&self) -> Result<String> {
        if let Some(version) = self.cached_ontap_version() {
            return Ok(version);
        }
        let cluster = self.cluster_info().await?;
        let version = cluster
            .version
            .and_then(|v| v.short())
            .ok_or_else(|| {
                Error::UnexpectedResponse("could not determine cluster version".into())
            })?;
        self.cache_ontap_version(&version);
        Ok(version)
    }

    /// Whether the cluster's version provides `feature`
    pub async fn supports_feature(&self, feature: Feature) -> bool {
        let version = match self.system_get_ontap_version().await {
            Ok(v) => v,
            Err(e) => {
                debug!(error = %e, ?feature, "Could not read cluster version");
                return false;
            }
        };
        match semver::Version::parse(&version) {
            Ok(v) => v >= feature.minimum_version(),
            Err(_) => false,
        }
    }

    pub async fn node_list(&self, pattern: &str) -> Result<Collection<Node>> {
        let query = Query::new().with("name", pattern).all_fields();
        self.get_all("cluster/nodes", &query).await
    }

    /// Serial numbers of every node in the cluster
    pub async fn node_list_serial_numbers(&self) -> Result<Vec<String>> {
        let nodes = self.node_list("*").await?;
        if nodes.num_records() == 0 {
            return Err(Error::NotFound("could not get node info".into()));
        }
        let serials: Vec<String> = nodes
            .records
            .into_iter()
            .filter_map(|n| n.serial_number)
            .filter(|s| !s.is_empty())
            .collect();
        if serials.is_empty() {
            return Err(Error::NotFound("could not get node serial numbers".into()));
        }
        debug!(count = serials.len(), serial_numbers = %serials.join(","), "Read serial numbers.");
        Ok(serials)
    }

    /// Log an application event with severity `notice`
    pub async fn ems_autosupport_log(&self, event: &EmsEvent) -> Result<()> {
        let body = json!({
            "app_version": event.app_version,
            "autosupport_required": event.autosupport_required,
            "category": event.category,
            "computer_name": event.computer_name,
            "event_description": event.event_description,
            "event_id": event.event_id,
            "event_source": event.event_source,
            "severity": "notice",
        });
        let result: Result<Value> = self
            .post(
                "support/ems/application-logs",
                &Query::new().return_records(),
                &body,
            )
            .await;
        if let Err(e) = &result {
            warn!(error = %e, event_id = event.event_id, "Could not log EMS event");
        }
        result.map(|_| ())
    }

    /// Tiering policy that means "never tier"
    pub fn tiering_policy_value(&self) -> &'static str {
        "none"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::test_client;
    use assert_matches::assert_matches;
    use httptest::{all_of, matchers::*, responders::*, Expectation, Server};

    #[tokio::test]
    async fn test_version_is_cached() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/api/cluster"))
                .times(1)
                .respond_with(json_encoded(json!({
                    "name": "c1",
                    "version": {
                        "full": "NetApp Release 9.13.1: Sun Sep 27 12:15:48 UTC 2023",
                        "generation": 9,
                        "major": 13,
                        "minor": 1
                    }
                }))),
        );

        let client = test_client(&server);
        assert_eq!(client.system_get_ontap_version().await.unwrap(), "9.13.1");
        assert_eq!(client.system_get_ontap_version().await.unwrap(), "9.13.1");
        assert!(client.supports_feature(Feature::NvmeProtocol).await);
        assert!(client.supports_feature(Feature::RestOnly).await);
        assert!(semver::Version::new(9, 13, 1) >= MINIMUM_ONTAP_VERSION);
    }

    #[tokio::test]
    async fn test_version_missing() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/api/cluster"))
                .times(2)
                .respond_with(json_encoded(json!({"version": {"generation": 9, "major": 8}}))),
        );

        let client = test_client(&server);
        assert_matches!(
            client.system_get_ontap_version().await,
            Err(Error::UnexpectedResponse(m)) if m == "could not determine cluster version"
        );
        assert!(!client.supports_feature(Feature::FabricPoolFlexVol).await);
    }

    #[tokio::test]
    async fn test_old_version_lacks_feature() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/api/cluster")).respond_with(
                json_encoded(json!({"version": {"generation": 9, "major": 9, "minor": 1}})),
            ),
        );

        let client = test_client(&server);
        assert!(!client.supports_feature(Feature::NvmeProtocol).await);
        assert!(client.supports_feature(Feature::FlexGroupClone).await);
    }

    #[tokio::test]
    async fn test_serial_numbers() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/api/cluster/nodes"))
                .respond_with(json_encoded(json!({
                    "num_records": 3,
                    "records": [
                        {"name": "n1", "serial_number": "4711"},
                        {"name": "n2", "serial_number": ""},
                        {"name": "n3"}
                    ]
                }))),
        );

        let client = test_client(&server);
        assert_eq!(
            client.node_list_serial_numbers().await.unwrap(),
            vec!["4711".to_string()]
        );
    }

    #[tokio::test]
    async fn test_serial_numbers_errors() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/api/cluster/nodes"))
                .times(2)
                .respond_with(httptest::cycle![
                    json_encoded(json!({"num_records": 0, "records": []})),
                    json_encoded(json!({"num_records": 1, "records": [{"name": "n1"}]})),
                ]),
        );

        let client = test_client(&server);
        assert_matches!(
            client.node_list_serial_numbers().await,
            Err(Error::NotFound(m)) if m == "could not get node info"
        );
        assert_matches!(
            client.node_list_serial_numbers().await,
            Err(Error::NotFound(m)) if m == "could not get node serial numbers"
        );
    }

    #[tokio::test]
    async fn test_ems_log() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/api/support/ems/application-logs"),
                request::body(json_decoded(eq(json!({
                    "app_version": "23.01",
                    "autosupport_required": false,
                    "category": "provisioning",
                    "computer_name": "host1",
                    "event_description": "heartbeat",
                    "event_id": 1,
                    "event_source": "ontap-rest",
                    "severity": "notice"
                })))),
            ])
            .respond_with(status_code(201)),
        );

        let client = test_client(&server);
        let event = EmsEvent {
            app_version: "23.01".into(),
            category: "provisioning".into(),
            computer_name: "host1".into(),
            event_description: "heartbeat".into(),
            event_id: 1,
            event_source: "ontap-rest".into(),
            ..Default::default()
        };
        client.ems_autosupport_log(&event).await.unwrap();
        assert_eq!(client.tiering_policy_value(), "none");
    }
}
