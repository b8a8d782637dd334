//! SMB Shares

use crate::client::{segment, Query, RestClient};
use crate::error::{Error, Result};
use crate::models::{CifsShare, Collection};
use serde_json::{json, Value};
use tracing::info;

const SHARES: &str = "protocols/cifs/shares";

impl RestClient {
    pub async fn smb_share_create(&self, name: &str, path: &str) -> Result<()> {
        let body = json!({
            "name": name,
            "path": path,
            "svm": {"name": self.svm_name()},
        });
        info!(share = name, path, "Creating SMB share");
        let _: Value = self.post(SHARES, &Query::new(), &body).await?;
        Ok(())
    }

    pub async fn smb_share_exists(&self, name: &str) -> Result<bool> {
        let query = Query::new()
            .with("svm.name", self.svm_name())
            .with("name", name);
        let shares: Collection<CifsShare> = self.get(SHARES, &query).await?;
        match shares.num_records() {
            0 => Ok(false),
            1 => Ok(true),
            n => Err(Error::NotUnique(format!(
                "found {} SMB shares named {}",
                n, name
            ))),
        }
    }

    pub async fn smb_share_destroy(&self, name: &str) -> Result<()> {
        info!(share = name, "Destroying SMB share");
        let _: Value = self
            .delete(
                &format!("{}/{}/{}", SHARES, self.svm_uuid(), segment(name)),
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

    #[tokio::test]
    async fn test_create_uses_svm_name() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/api/protocols/cifs/shares"),
                request::body(json_decoded(eq(json!({
                    "name": "share1",
                    "path": "/vol1",
                    "svm": {"name": "svm0"}
                })))),
            ])
            .respond_with(status_code(201)),
        );

        let client = test_client(&server);
        client.smb_share_create("share1", "/vol1").await.unwrap();
    }

    #[tokio::test]
    async fn test_exists_by_count() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/api/protocols/cifs/shares"),
                request::query(url_decoded(contains(("svm.name", "svm0")))),
            ])
            .times(3)
            .respond_with(httptest::cycle![
                json_encoded(json!({"num_records": 0, "records": []})),
                json_encoded(json!({"num_records": 1, "records": [{"name": "s"}]})),
                json_encoded(json!({"num_records": 2, "records": [{"name": "s"}, {"name": "s"}]})),
            ]),
        );

        let client = test_client(&server);
        assert!(!client.smb_share_exists("s").await.unwrap());
        assert!(client.smb_share_exists("s").await.unwrap());
        assert_matches!(client.smb_share_exists("s").await, Err(Error::NotUnique(_)));
    }

    #[tokio::test]
    async fn test_destroy_encodes_name() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path(
                "DELETE",
                "/api/protocols/cifs/shares/svm-uuid-1/my%20share",
            ))
            .respond_with(status_code(200)),
        );

        let client = test_client(&server);
        client.smb_share_destroy("my share").await.unwrap();
    }
}
