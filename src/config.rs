//! Client Configuration
//!
//! Connection, credential and polling settings for [`RestClient`](crate::RestClient).
//! Loaded from YAML or assembled by the CLI from flags and environment.

use crate::error::{Error, Result};
use backoff::ExponentialBackoff;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Default driver name reported in EMS events
pub const DEFAULT_DRIVER_NAME: &str = "ontap-rest";

// =============================================================================
// Backoff Settings
// =============================================================================

/// Exponential backoff parameters for one kind of wait
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffSettings {
    /// First retry interval in milliseconds
    pub initial_interval_ms: u64,
    /// Upper bound for a single interval in milliseconds
    pub max_interval_ms: u64,
    pub multiplier: f64,
    pub randomization_factor: f64,
    /// Total time to keep retrying, in milliseconds
    pub max_elapsed_ms: u64,
}

impl BackoffSettings {
    /// Settings with the standard 1s/x2/0.1 curve and the given deadline
    pub fn with_max_elapsed(max_elapsed: Duration) -> Self {
        Self {
            max_elapsed_ms: max_elapsed.as_millis() as u64,
            ..Self::default()
        }
    }

    pub fn max_elapsed(&self) -> Duration {
        Duration::from_millis(self.max_elapsed_ms)
    }

    /// Build a fresh backoff policy from these settings
    pub fn policy(&self) -> ExponentialBackoff {
        let initial = Duration::from_millis(self.initial_interval_ms);
        ExponentialBackoff {
            current_interval: initial,
            initial_interval: initial,
            multiplier: self.multiplier,
            randomization_factor: self.randomization_factor,
            max_interval: Duration::from_millis(self.max_interval_ms),
            max_elapsed_time: Some(self.max_elapsed()),
            ..ExponentialBackoff::default()
        }
    }
}

impl Default for BackoffSettings {
    fn default() -> Self {
        Self {
            initial_interval_ms: 1_000,
            max_interval_ms: 60_000,
            multiplier: 2.0,
            randomization_factor: 0.1,
            max_elapsed_ms: 120_000,
        }
    }
}

/// Backoff settings for each kind of wait the client performs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Asynchronous job completion
    pub job: BackoffSettings,
    /// LUN appearance after create
    pub lun_create: BackoffSettings,
    /// Volume, FlexGroup and qtree appearance after create
    pub existence: BackoffSettings,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            job: BackoffSettings::with_max_elapsed(Duration::from_secs(120)),
            lun_create: BackoffSettings::with_max_elapsed(Duration::from_secs(120)),
            existence: BackoffSettings::with_max_elapsed(Duration::from_secs(60)),
        }
    }
}

// =============================================================================
// Client Configuration
// =============================================================================

/// Configuration for a REST client
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Management LIF address, `host` or `host:port`
    pub management_lif: String,
    pub username: String,
    pub password: String,
    /// Base64-encoded PEM client certificate
    pub client_certificate: String,
    /// Base64-encoded PEM private key for the client certificate
    pub client_private_key: String,
    /// Base64-encoded PEM CA; enables server certificate verification
    pub trusted_ca_certificate: String,
    /// SVM to operate on; derived from the cluster when empty
    pub svm: Option<String>,
    pub driver_name: String,
    pub timeout_secs: u64,
    /// URL scheme, `https` unless talking to a plain HTTP endpoint
    pub scheme: String,
    /// Debug switches, e.g. `api: true` logs request and response bodies
    pub debug_trace_flags: BTreeMap<String, bool>,
    pub polling: PollingConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            management_lif: String::new(),
            username: String::new(),
            password: String::new(),
            client_certificate: String::new(),
            client_private_key: String::new(),
            trusted_ca_certificate: String::new(),
            svm: None,
            driver_name: DEFAULT_DRIVER_NAME.to_string(),
            timeout_secs: 60,
            scheme: "https".to_string(),
            debug_trace_flags: BTreeMap::new(),
            polling: PollingConfig::default(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redact(value: &str) -> &str {
            if value.is_empty() {
                ""
            } else {
                "<REDACTED>"
            }
        }

        f.debug_struct("ClientConfig")
            .field("management_lif", &self.management_lif)
            .field("username", &redact(&self.username))
            .field("password", &redact(&self.password))
            .field("client_certificate", &redact(&self.client_certificate))
            .field("client_private_key", &redact(&self.client_private_key))
            .field("trusted_ca_certificate", &redact(&self.trusted_ca_certificate))
            .field("svm", &self.svm)
            .field("driver_name", &self.driver_name)
            .field("timeout_secs", &self.timeout_secs)
            .field("scheme", &self.scheme)
            .field("debug_trace_flags", &self.debug_trace_flags)
            .field("polling", &self.polling)
            .finish()
    }
}

impl ClientConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&contents)
    }

    /// Parse configuration from a YAML document
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Check that the configuration can produce a working client
    pub fn validate(&self) -> Result<()> {
        if self.management_lif.trim().is_empty() {
            return Err(Error::Configuration("management LIF is required".into()));
        }
        if self.client_certificate.is_empty() != self.client_private_key.is_empty() {
            return Err(Error::Configuration(
                "client certificate and private key must be supplied together".into(),
            ));
        }
        if self.scheme != "https" && self.scheme != "http" {
            return Err(Error::Configuration(format!(
                "unsupported scheme '{}'",
                self.scheme
            )));
        }
        Ok(())
    }

    /// Whether basic auth credentials are present
    pub fn has_basic_auth(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }

    /// Whether a client certificate identity is present
    pub fn has_client_identity(&self) -> bool {
        !self.client_certificate.is_empty() && !self.client_private_key.is_empty()
    }

    pub fn trace_enabled(&self, flag: &str) -> bool {
        self.debug_trace_flags.get(flag).copied().unwrap_or(false)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.scheme, "https");
        assert_eq!(config.driver_name, DEFAULT_DRIVER_NAME);
        assert_eq!(config.polling.job.max_elapsed(), Duration::from_secs(120));
        assert_eq!(config.polling.existence.max_elapsed(), Duration::from_secs(60));
        assert!(!config.has_basic_auth());
    }

    #[test]
    fn test_backoff_policy() {
        let policy = BackoffSettings::default().policy();
        assert_eq!(policy.initial_interval, Duration::from_secs(1));
        assert_eq!(policy.current_interval, Duration::from_secs(1));
        assert_eq!(policy.multiplier, 2.0);
        assert_eq!(policy.randomization_factor, 0.1);
        assert_eq!(policy.max_elapsed_time, Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_load_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "management_lif: 10.0.0.1\nusername: admin\npassword: secret\nsvm: svm0\n\
             debug_trace_flags:\n  api: true\npolling:\n  job:\n    max_elapsed_ms: 500\n"
        )
        .unwrap();

        let config = ClientConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.management_lif, "10.0.0.1");
        assert_eq!(config.svm.as_deref(), Some("svm0"));
        assert!(config.has_basic_auth());
        assert!(config.trace_enabled("api"));
        assert!(!config.trace_enabled("method"));
        assert_eq!(config.polling.job.max_elapsed_ms, 500);
        assert_eq!(config.polling.job.initial_interval_ms, 1_000);
        assert_eq!(config.polling.existence.max_elapsed_ms, 60_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        let config = ClientConfig::default();
        assert_matches!(config.validate(), Err(Error::Configuration(_)));

        let config = ClientConfig {
            management_lif: "10.0.0.1".into(),
            client_certificate: "Y2VydA==".into(),
            ..Default::default()
        };
        assert_matches!(config.validate(), Err(Error::Configuration(_)));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = ClientConfig {
            management_lif: "10.0.0.1".into(),
            username: "admin".into(),
            password: "hunter2".into(),
            ..Default::default()
        };
        let rendered = format!("{:?}", config);
        assert!(rendered.contains("10.0.0.1"));
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("admin"));
    }
}
