//! SVMs and Aggregates
//!
//! Also home of SVM selection: a client is scoped to one SVM, either the one
//! named in its configuration or the only one the credentials can see.

use crate::client::{Query, RestClient};
use crate::domain::{SvmIdentity, SvmResolver};
use crate::error::{Error, Result};
use crate::models::{Aggregate, Collection, Svm};
use async_trait::async_trait;
use tracing::debug;

const SVMS: &str = "svm/svms";

/// Pick the SVM to work on and record it on the resolver
///
/// A configured name must resolve to exactly one SVM. Without one, the SVM
/// is derived only when exactly one is visible.
pub async fn ensure_svm<R: SvmResolver + ?Sized>(
    resolver: &R,
    configured: Option<&str>,
) -> Result<SvmIdentity> {
    if let Some(name) = configured.filter(|n| !n.is_empty()) {
        let svm = resolver.svm_identity_by_name(name).await.map_err(|e| {
            Error::NotFound(format!("unable to get details for SVM {}; {}", name, e))
        })?;
        if let Some(uuid) = svm.uuid.as_deref() {
            resolver.set_svm_uuid(uuid);
        }
        debug!(svm = name, uuid = ?svm.uuid, "Using specified SVM.");
        return Ok(svm);
    }

    const CANNOT_DERIVE: &str = "cannot derive SVM to use; please specify SVM in config file";
    let mut svms = resolver.svm_identities("*").await?;
    if svms.len() != 1 {
        return Err(Error::Configuration(CANNOT_DERIVE.into()));
    }
    let svm = svms.remove(0);
    let (Some(name), Some(uuid)) = (svm.name.as_deref(), svm.uuid.as_deref()) else {
        return Err(Error::Configuration(CANNOT_DERIVE.into()));
    };
    resolver.set_svm_name(name);
    resolver.set_svm_uuid(uuid);
    debug!(svm = name, uuid, "Using derived SVM.");
    Ok(svm)
}

impl RestClient {
    // =========================================================================
    // Aggregates
    // =========================================================================

    pub async fn aggregate_list(&self, pattern: &str) -> Result<Collection<Aggregate>> {
        let query = Query::new().with("name", pattern).all_fields();
        self.get_all("storage/aggregates", &query).await
    }

    // =========================================================================
    // SVMs
    // =========================================================================

    pub async fn svm_get(&self, uuid: &str) -> Result<Svm> {
        self.get(&format!("{}/{}", SVMS, uuid), &Query::new()).await
    }

    pub async fn svm_list(&self, pattern: &str) -> Result<Collection<Svm>> {
        let query = Query::new().with("name", pattern).all_fields();
        self.get_all(SVMS, &query).await
    }

    pub async fn svm_get_by_name(&self, name: &str) -> Result<Svm> {
        self.svm_list(name)
            .await?
            .into_single()
            .ok_or_else(|| Error::UnexpectedResponse("unexpected result".into()))
    }

    /// Names of the aggregates assigned to the current SVM
    pub async fn svm_get_aggregate_names(&self) -> Result<Vec<String>> {
        let svm = self.svm_get(&self.svm_uuid()).await?;
        Ok(svm.aggregates.into_iter().filter_map(|a| a.name).collect())
    }

    /// Operational state of the current SVM
    pub async fn svm_state(&self) -> Result<String> {
        let svm = self.svm_get(&self.svm_uuid()).await?;
        if svm.uuid.is_none() {
            return Err(Error::NotFound(format!(
                "could not find SVM {} ({})",
                self.svm_name(),
                self.svm_uuid()
            )));
        }
        svm.state.ok_or_else(|| {
            Error::UnexpectedResponse(format!(
                "could not find operational state of SVM {}",
                self.svm_name()
            ))
        })
    }

    /// Resolve the configured SVM, or derive the only visible one
    pub async fn ensure_svm(&self) -> Result<SvmIdentity> {
        let configured = self.config().svm.clone();
        ensure_svm(self, configured.as_deref()).await
    }
}

#[async_trait]
impl SvmResolver for RestClient {
    async fn svm_identity_by_name(&self, name: &str) -> Result<SvmIdentity> {
        let svm = self.svm_get_by_name(name).await?;
        Ok(SvmIdentity {
            name: svm.name,
            uuid: svm.uuid,
        })
    }

    async fn svm_identities(&self, pattern: &str) -> Result<Vec<SvmIdentity>> {
        Ok(self
            .svm_list(pattern)
            .await?
            .records
            .into_iter()
            .map(|svm| SvmIdentity {
                name: svm.name,
                uuid: svm.uuid,
            })
            .collect())
    }

    fn set_svm_uuid(&self, uuid: &str) {
        RestClient::set_svm_uuid(self, uuid);
    }

    fn set_svm_name(&self, name: &str) {
        RestClient::set_svm_name(self, name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::{test_client, test_config, SVM_UUID};
    use assert_matches::assert_matches;
    use httptest::{all_of, matchers::*, responders::*, Expectation, Server};
    use parking_lot::Mutex;
    use serde_json::json;

    #[derive(Default)]
    struct FakeResolver {
        svms: Vec<SvmIdentity>,
        chosen: Mutex<SvmIdentity>,
    }

    fn identity(name: &str, uuid: &str) -> SvmIdentity {
        SvmIdentity {
            name: Some(name.into()),
            uuid: Some(uuid.into()),
        }
    }

    #[async_trait]
    impl SvmResolver for FakeResolver {
        async fn svm_identity_by_name(&self, name: &str) -> Result<SvmIdentity> {
            self.svms
                .iter()
                .find(|s| s.name.as_deref() == Some(name))
                .cloned()
                .ok_or_else(|| Error::UnexpectedResponse("unexpected result".into()))
        }

        async fn svm_identities(&self, _pattern: &str) -> Result<Vec<SvmIdentity>> {
            Ok(self.svms.clone())
        }

        fn set_svm_uuid(&self, uuid: &str) {
            self.chosen.lock().uuid = Some(uuid.into());
        }

        fn set_svm_name(&self, name: &str) {
            self.chosen.lock().name = Some(name.into());
        }
    }

    #[tokio::test]
    async fn test_ensure_svm_specified() {
        let resolver = FakeResolver {
            svms: vec![identity("svm0", "u0"), identity("svm1", "u1")],
            ..Default::default()
        };
        let svm = ensure_svm(&resolver, Some("svm1")).await.unwrap();
        assert_eq!(svm.uuid.as_deref(), Some("u1"));
        assert_eq!(resolver.chosen.lock().uuid.as_deref(), Some("u1"));
        assert_eq!(resolver.chosen.lock().name, None);

        assert_matches!(
            ensure_svm(&resolver, Some("nope")).await,
            Err(Error::NotFound(m)) if m.starts_with("unable to get details for SVM nope; ")
        );
    }

    #[tokio::test]
    async fn test_ensure_svm_derived() {
        let resolver = FakeResolver {
            svms: vec![identity("only", "u9")],
            ..Default::default()
        };
        ensure_svm(&resolver, None).await.unwrap();
        assert_eq!(*resolver.chosen.lock(), identity("only", "u9"));

        let ambiguous = FakeResolver {
            svms: vec![identity("a", "1"), identity("b", "2")],
            ..Default::default()
        };
        assert_matches!(
            ensure_svm(&ambiguous, Some("")).await,
            Err(Error::Configuration(m)) if m == "cannot derive SVM to use; please specify SVM in config file"
        );

        let nameless = FakeResolver {
            svms: vec![SvmIdentity {
                name: None,
                uuid: Some("u".into()),
            }],
            ..Default::default()
        };
        assert!(ensure_svm(&nameless, None).await.is_err());
    }

    #[tokio::test]
    async fn test_client_ensure_svm_over_http() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/api/svm/svms"),
                request::query(url_decoded(contains(("name", "svm0")))),
            ])
            .respond_with(json_encoded(json!({
                "num_records": 1,
                "records": [{"name": "svm0", "uuid": "resolved-uuid"}]
            }))),
        );

        let client = RestClient::new(test_config(&server)).unwrap();
        client.ensure_svm().await.unwrap();
        assert_eq!(client.svm_uuid(), "resolved-uuid");
    }

    #[tokio::test]
    async fn test_svm_state_and_aggregates() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/api/svm/svms/svm-uuid-1"))
                .times(2)
                .respond_with(json_encoded(json!({
                    "uuid": SVM_UUID,
                    "name": "svm0",
                    "state": "running",
                    "aggregates": [{"name": "aggr1"}, {"name": "aggr2"}, {"uuid": "x"}]
                }))),
        );

        let client = test_client(&server);
        assert_eq!(client.svm_state().await.unwrap(), "running");
        assert_eq!(
            client.svm_get_aggregate_names().await.unwrap(),
            vec!["aggr1".to_string(), "aggr2".to_string()]
        );
    }

    #[tokio::test]
    async fn test_svm_state_missing() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/api/svm/svms/svm-uuid-1"))
                .respond_with(json_encoded(json!({"uuid": SVM_UUID, "name": "svm0"}))),
        );

        let client = test_client(&server);
        assert_matches!(
            client.svm_state().await,
            Err(Error::UnexpectedResponse(m)) if m == "could not find operational state of SVM svm0"
        );
    }
}
