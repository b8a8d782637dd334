//! REST Client Core
//!
//! Owns the HTTP connection to the management LIF and turns controller
//! responses into typed values or structured errors. Storage operations are
//! added to [`RestClient`] by the modules under [`crate::ops`].

pub mod jobs;
pub mod pagination;
pub mod query;

pub use query::Query;

use crate::config::ClientConfig;
use crate::domain::SvmIdentity;
use crate::error::{ApiError, Error, Result};
use crate::metrics::ClientMetrics;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use parking_lot::RwLock;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

// =============================================================================
// Rest Client
// =============================================================================

/// Client for one storage controller, scoped to one SVM
pub struct RestClient {
    config: ClientConfig,
    http: reqwest::Client,
    base_url: String,
    svm: RwLock<SvmIdentity>,
    ontap_version: RwLock<Option<String>>,
    metrics: Arc<ClientMetrics>,
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.base_url)
            .field("svm", &*self.svm.read())
            .finish()
    }
}

impl RestClient {
    /// Create a new client from its configuration
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = reqwest::Client::builder().timeout(config.timeout());

        if config.has_client_identity() {
            let cert = STANDARD.decode(config.client_certificate.trim()).map_err(|e| {
                debug!(error = %e, "Client certificate decode failed");
                Error::Configuration("failed to decode client certificate from base64".into())
            })?;
            let key = STANDARD.decode(config.client_private_key.trim()).map_err(|e| {
                debug!(error = %e, "Private key decode failed");
                Error::Configuration("failed to decode private key from base64".into())
            })?;

            let mut pem = cert;
            pem.push(b'\n');
            pem.extend_from_slice(&key);
            let identity = reqwest::Identity::from_pem(&pem).map_err(|e| {
                debug!(error = %e, "Client identity load failed");
                Error::Configuration("cannot load certificate and key".into())
            })?;
            builder = builder.identity(identity);
        }

        if config.trusted_ca_certificate.is_empty() {
            builder = builder.danger_accept_invalid_certs(true);
        } else {
            let ca = STANDARD
                .decode(config.trusted_ca_certificate.trim())
                .map_err(|e| {
                    debug!(error = %e, "Trusted CA decode failed");
                    Error::Configuration(
                        "failed to decode trusted CA certificate from base64".into(),
                    )
                })?;
            let certificate = reqwest::Certificate::from_pem(&ca).map_err(|e| {
                Error::Configuration(format!("cannot load trusted CA certificate; {}", e))
            })?;
            builder = builder.add_root_certificate(certificate);
        }

        let http = builder
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = format!("{}://{}/api", config.scheme, config.management_lif);
        let svm = SvmIdentity {
            name: config.svm.clone().filter(|s| !s.is_empty()),
            uuid: None,
        };

        Ok(Self {
            config,
            http,
            base_url,
            svm: RwLock::new(svm),
            ontap_version: RwLock::new(None),
            metrics: Arc::new(ClientMetrics::new()),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn metrics(&self) -> Arc<ClientMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Base URL all API paths are relative to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn svm_uuid(&self) -> String {
        self.svm.read().uuid.clone().unwrap_or_default()
    }

    pub fn set_svm_uuid(&self, uuid: &str) {
        self.svm.write().uuid = Some(uuid.to_string());
    }

    pub fn svm_name(&self) -> String {
        self.svm.read().name.clone().unwrap_or_default()
    }

    pub fn set_svm_name(&self, name: &str) {
        self.svm.write().name = Some(name.to_string());
    }

    pub(crate) fn cached_ontap_version(&self) -> Option<String> {
        self.ontap_version.read().clone()
    }

    pub(crate) fn cache_ontap_version(&self, version: &str) {
        *self.ontap_version.write() = Some(version.to_string());
    }

    // =========================================================================
    // HTTP Verbs
    // =========================================================================

    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &Query) -> Result<T> {
        let value = self.send(Method::GET, path, query, None).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &Query,
        body: &Value,
    ) -> Result<T> {
        let value = self.send(Method::POST, path, query, Some(body)).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn patch<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &Query,
        body: Option<&Value>,
    ) -> Result<T> {
        let value = self.send(Method::PATCH, path, query, body).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str, query: &Query) -> Result<T> {
        let value = self.send(Method::DELETE, path, query, None).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn options<T: DeserializeOwned>(&self, path: &str, query: &Query) -> Result<T> {
        let value = self.send(Method::OPTIONS, path, query, None).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Issue one request. Empty success bodies decode as an empty object.
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &Query,
        body: Option<&Value>,
    ) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let trace = self.config.trace_enabled("api");

        let mut request = self.http.request(method.clone(), &url);
        if !query.is_empty() {
            request = request.query(query.pairs());
        }
        if self.config.has_basic_auth() {
            request = request.basic_auth(&self.config.username, Some(&self.config.password));
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        if trace {
            let logged = body.map(redact).unwrap_or(Value::Null);
            debug!(
                method = %method,
                url = %url,
                query = ?query.pairs(),
                body = %logged,
                "API request"
            );
        }

        self.metrics.record_request();
        let response = request.send().await.map_err(|e| {
            self.metrics.record_request_error();
            Error::Http(e)
        })?;

        let status = response.status();
        let text = response.text().await?;

        if trace {
            debug!(status = status.as_u16(), body = %text, "API response");
        }

        if status == StatusCode::UNAUTHORIZED {
            self.metrics.record_request_error();
            return Err(Error::Unauthorized);
        }
        if !status.is_success() {
            self.metrics.record_request_error();
            return Err(Error::Api(ApiError::from_response(status.as_u16(), &text)));
        }

        if text.trim().is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// Copy of a request body with secrets masked for logging
fn redact(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    if k == "password" {
                        (k.clone(), Value::String("<REDACTED>".into()))
                    } else {
                        (k.clone(), redact(v))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}

/// Encode one path segment of a resource URL
pub(crate) fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use assert_matches::assert_matches;
    use httptest::{all_of, matchers::*, responders::*, Expectation, Server};
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_get_with_basic_auth() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/api/cluster"),
                request::headers(contains(("authorization", "Basic YWRtaW46c2VjcmV0"))),
                request::query(url_decoded(contains(("fields", "**")))),
            ])
            .respond_with(json_encoded(json!({"name": "cluster1"}))),
        );

        let client = test_client(&server);
        let value: Value = client
            .get("cluster", &Query::new().all_fields())
            .await
            .unwrap();
        assert_eq!(value["name"], "cluster1");
        assert_eq!(client.metrics().snapshot().requests, 1);
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/api/cluster"))
                .respond_with(status_code(401)),
        );

        let client = test_client(&server);
        let result: Result<Value> = client.get("cluster", &Query::new()).await;
        assert_matches!(result, Err(Error::Unauthorized));
        assert_eq!(client.metrics().snapshot().request_errors, 1);
    }

    #[tokio::test]
    async fn test_api_error_body() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("DELETE", "/api/storage/luns/u1"))
                .respond_with(status_code(404).body(
                    r#"{"error":{"message":"entry doesn't exist","code":"4","target":"uuid"}}"#,
                )),
        );

        let client = test_client(&server);
        let err = client
            .delete::<Value>("storage/luns/u1", &Query::new())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_matches!(err, Error::Api(ApiError { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_empty_body_decodes_as_object() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("PATCH", "/api/storage/luns/u1"),
                request::body(json_decoded(eq(json!({"comment": "hello"})))),
            ])
            .respond_with(status_code(200)),
        );

        let client = test_client(&server);
        let value: Value = client
            .patch("storage/luns/u1", &Query::new(), Some(&json!({"comment": "hello"})))
            .await
            .unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn test_svm_accessors() {
        let server = Server::run();
        let client = RestClient::new(test_config(&server)).unwrap();
        assert_eq!(client.svm_name(), SVM_NAME);
        assert_eq!(client.svm_uuid(), "");
        client.set_svm_uuid("u2");
        client.set_svm_name("svm2");
        assert_eq!(client.svm_uuid(), "u2");
        assert_eq!(client.svm_name(), "svm2");
        assert_eq!(client.base_url(), format!("http://{}/api", server.addr()));
    }

    #[test]
    fn test_certificate_decode_errors() {
        let config = ClientConfig {
            management_lif: "10.0.0.1".into(),
            client_certificate: "not base64!".into(),
            client_private_key: "a2V5".into(),
            ..Default::default()
        };
        assert_matches!(
            RestClient::new(config),
            Err(Error::Configuration(msg)) if msg == "failed to decode client certificate from base64"
        );

        let config = ClientConfig {
            management_lif: "10.0.0.1".into(),
            client_certificate: "Y2VydA==".into(),
            client_private_key: "%%%".into(),
            ..Default::default()
        };
        assert_matches!(
            RestClient::new(config),
            Err(Error::Configuration(msg)) if msg == "failed to decode private key from base64"
        );

        let config = ClientConfig {
            management_lif: "10.0.0.1".into(),
            client_certificate: "Y2VydA==".into(),
            client_private_key: "a2V5".into(),
            ..Default::default()
        };
        assert_matches!(
            RestClient::new(config),
            Err(Error::Configuration(msg)) if msg == "cannot load certificate and key"
        );

        let config = ClientConfig {
            management_lif: "10.0.0.1".into(),
            trusted_ca_certificate: "***".into(),
            ..Default::default()
        };
        assert_matches!(
            RestClient::new(config),
            Err(Error::Configuration(msg)) if msg == "failed to decode trusted CA certificate from base64"
        );
    }

    #[test]
    fn test_redact() {
        let body = json!({
            "chap": {"inbound": {"user": "u", "password": "p"}},
            "list": [{"password": "q"}]
        });
        let redacted = redact(&body);
        assert_eq!(redacted["chap"]["inbound"]["user"], "u");
        assert_eq!(redacted["chap"]["inbound"]["password"], "<REDACTED>");
        assert_eq!(redacted["list"][0]["password"], "<REDACTED>");
    }
}
