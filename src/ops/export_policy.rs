//! NFS Export Policies and Rules

use crate::client::{Query, RestClient};
use crate::domain::filter_auth_flavors;
use crate::error::{Error, Result};
use crate::models::{Collection, ExportPolicy, ExportRule};
use serde_json::{json, Map, Value};
use tracing::{debug, info, instrument};

const EXPORT_POLICIES: &str = "protocols/nfs/export-policies";

/// Flavor lists and protocols of a new export rule
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportRuleSpec {
    /// Comma separated client matches, e.g. `10.0.0.0/24,host1`
    pub client_match: String,
    pub protocols: Vec<String>,
    pub ro_rule: Vec<String>,
    pub rw_rule: Vec<String>,
    pub superuser: Vec<String>,
}

impl RestClient {
    pub async fn export_policy_create(&self, name: &str) -> Result<()> {
        let body = json!({
            "name": name,
            "svm": {"uuid": self.svm_uuid()},
        });
        info!(policy = name, "Creating export policy");
        let _: Value = self.post(EXPORT_POLICIES, &Query::new(), &body).await?;
        Ok(())
    }

    pub async fn export_policy_get(&self, id: i64) -> Result<ExportPolicy> {
        self.get(&format!("{}/{}", EXPORT_POLICIES, id), &Query::new())
            .await
    }

    pub async fn export_policy_list(&self, pattern: &str) -> Result<Collection<ExportPolicy>> {
        let query = Query::new()
            .with("svm.uuid", self.svm_uuid())
            .with("name", pattern)
            .all_fields();
        self.get_all(EXPORT_POLICIES, &query).await
    }

    pub async fn export_policy_get_by_name(&self, name: &str) -> Result<Option<ExportPolicy>> {
        Ok(self.export_policy_list(name).await?.into_single())
    }

    async fn export_policy_id(&self, name: &str) -> Result<i64> {
        let policy = self
            .export_policy_get_by_name(name)
            .await?
            .ok_or_else(|| Error::NotFound(format!("could not get export policy {}", name)))?;
        policy
            .id
            .ok_or_else(|| Error::NotFound(format!("could not get id for export policy {}", name)))
    }

    #[instrument(skip(self))]
    pub async fn export_policy_destroy(&self, name: &str) -> Result<()> {
        let id = self.export_policy_id(name).await?;
        info!(id, "Destroying export policy");
        let _: Value = self
            .delete(&format!("{}/{}", EXPORT_POLICIES, id), &Query::new())
            .await?;
        Ok(())
    }

    // =========================================================================
    // Rules
    // =========================================================================

    pub async fn export_rule_list(&self, policy: &str) -> Result<Collection<ExportRule>> {
        let id = self.export_policy_id(policy).await?;
        self.get_all(
            &format!("{}/{}/rules", EXPORT_POLICIES, id),
            &Query::new().all_fields(),
        )
        .await
    }

    /// Add a rule to the named policy. Unknown authentication flavors are
    /// dropped from the access lists.
    #[instrument(skip(self, rule), fields(clients = %rule.client_match))]
    pub async fn export_rule_create(&self, policy: &str, rule: &ExportRuleSpec) -> Result<()> {
        let id = self.export_policy_id(policy).await?;

        let clients: Vec<Value> = rule
            .client_match
            .split(',')
            .map(|m| json!({ "match": m }))
            .collect();
        let mut body = Map::new();
        body.insert("clients".into(), Value::Array(clients));
        if !rule.protocols.is_empty() {
            body.insert("protocols".into(), json!(rule.protocols));
        }
        for (key, flavors) in [
            ("ro_rule", &rule.ro_rule),
            ("rw_rule", &rule.rw_rule),
            ("superuser", &rule.superuser),
        ] {
            let flavors = filter_auth_flavors(flavors);
            if !flavors.is_empty() {
                body.insert(key.into(), json!(flavors));
            }
        }

        debug!(body = ?body, "Creating export rule");
        let _: Value = self
            .post(
                &format!("{}/{}/rules", EXPORT_POLICIES, id),
                &Query::new(),
                &Value::Object(body),
            )
            .await?;
        Ok(())
    }

    pub async fn export_rule_destroy(&self, policy: &str, index: i64) -> Result<()> {
        let id = self.export_policy_id(policy).await?;
        info!(policy, index, "Destroying export rule");
        let _: Value = self
            .delete(
                &format!("{}/{}/rules/{}", EXPORT_POLICIES, id, index),
                &Query::new(),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::test_client;
    use assert_matches::assert_matches;
    use httptest::{all_of, matchers::*, responders::*, Expectation, Server};
    use serde_json::Value;

    fn policy_lookup(server: &Server, name: &'static str, response: Value) {
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/api/protocols/nfs/export-policies"),
                request::query(url_decoded(contains(("name", name)))),
            ])
            .respond_with(json_encoded(response)),
        );
    }

    #[tokio::test]
    async fn test_rule_create_filters_flavors() {
        let server = Server::run();
        policy_lookup(
            &server,
            "default",
            json!({"num_records": 1, "records": [{"name": "default", "id": 42}]}),
        );
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/api/protocols/nfs/export-policies/42/rules"),
                request::body(json_decoded(eq(json!({
                    "clients": [{"match": "10.0.0.0/24"}, {"match": "host1"}],
                    "protocols": ["nfs3", "nfs4"],
                    "ro_rule": ["sys"],
                    "superuser": ["none"]
                })))),
            ])
            .respond_with(status_code(201)),
        );

        let client = test_client(&server);
        let rule = ExportRuleSpec {
            client_match: "10.0.0.0/24,host1".into(),
            protocols: vec!["nfs3".into(), "nfs4".into()],
            ro_rule: vec!["sys".into(), "unix".into()],
            rw_rule: vec!["bogus".into()],
            superuser: vec!["none".into()],
        };
        client.export_rule_create("default", &rule).await.unwrap();
    }

    #[tokio::test]
    async fn test_destroy_requires_policy_and_id() {
        let server = Server::run();
        policy_lookup(&server, "gone", json!({"num_records": 0, "records": []}));
        policy_lookup(
            &server,
            "noid",
            json!({"num_records": 1, "records": [{"name": "noid"}]}),
        );
        policy_lookup(
            &server,
            "p1",
            json!({"num_records": 1, "records": [{"name": "p1", "id": 7}]}),
        );
        server.expect(
            Expectation::matching(request::method_path(
                "DELETE",
                "/api/protocols/nfs/export-policies/7",
            ))
            .respond_with(status_code(200)),
        );

        let client = test_client(&server);
        assert_matches!(
            client.export_policy_destroy("gone").await,
            Err(Error::NotFound(m)) if m == "could not get export policy gone"
        );
        assert_matches!(
            client.export_policy_destroy("noid").await,
            Err(Error::NotFound(m)) if m == "could not get id for export policy noid"
        );
        client.export_policy_destroy("p1").await.unwrap();
    }

    #[tokio::test]
    async fn test_rule_list_and_destroy() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/api/protocols/nfs/export-policies"),
                request::query(url_decoded(contains(("name", "p1")))),
            ])
            .times(2)
            .respond_with(json_encoded(
                json!({"num_records": 1, "records": [{"name": "p1", "id": 7}]}),
            )),
        );
        server.expect(
            Expectation::matching(request::method_path(
                "GET",
                "/api/protocols/nfs/export-policies/7/rules",
            ))
            .respond_with(json_encoded(json!({
                "num_records": 1,
                "records": [{"index": 1, "clients": [{"match": "0.0.0.0/0"}], "ro_rule": ["any"]}]
            }))),
        );
        server.expect(
            Expectation::matching(request::method_path(
                "DELETE",
                "/api/protocols/nfs/export-policies/7/rules/1",
            ))
            .respond_with(status_code(200)),
        );

        let client = test_client(&server);
        let rules = client.export_rule_list("p1").await.unwrap();
        assert_eq!(rules.records[0].client_matches(), vec!["0.0.0.0/0"]);
        client.export_rule_destroy("p1", 1).await.unwrap();
    }
}
