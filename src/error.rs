//! Error types for the ONTAP REST client
//!
//! Provides structured error types for transport failures, controller API
//! errors, job polling and argument validation.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Controller error code returned when the addressed object does not exist
pub const ENTRY_DOESNT_EXIST: &str = "4";

/// Controller error code returned when a LUN is not mapped to an igroup
pub const LUN_MAP_EXIST_ERROR: &str = "5374922";

/// Unified error type for the client
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("response code 401 (Unauthorized): incorrect or missing credentials")]
    Unauthorized,

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    // =========================================================================
    // Controller API Errors
    // =========================================================================
    #[error("{0}")]
    Api(ApiError),

    // =========================================================================
    // Lookup Errors
    // =========================================================================
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    NotUnique(String),

    // =========================================================================
    // Job Errors
    // =========================================================================
    #[error("{0}")]
    JobFailed(RestError),

    #[error("job {uuid} did not complete in time")]
    JobIncomplete { uuid: String },

    #[error("unexpected job state: {0}")]
    UnexpectedJobState(String),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("{0}")]
    InvalidArgument(String),

    #[error("invalid size value '{0}'")]
    InvalidSize(String),

    #[error("cannot process unix permissions value {0}")]
    InvalidPermissions(String),

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Controller error code carried by an API error, if any
    pub fn api_code(&self) -> Option<&str> {
        match self {
            Error::Api(api) => api.code.as_deref(),
            _ => None,
        }
    }

    /// True for lookups that found nothing, including the controller's
    /// "entry doesn't exist" code
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound(_) => true,
            Error::Api(api) => api.code.as_deref() == Some(ENTRY_DOESNT_EXIST),
            _ => false,
        }
    }

    /// Check if this error is transient
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(_) => true,
            Error::Api(api) => api.status >= 500,
            _ => false,
        }
    }

    /// Check if a polling loop should keep going after this error
    pub fn is_retryable(&self) -> bool {
        self.is_transient() || matches!(self, Error::NotFound(_))
    }
}

/// Result type alias for the client
pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// Controller Error Body
// =============================================================================

/// Error reported by the controller in a non-2xx response body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status of the response
    pub status: u16,
    pub code: Option<String>,
    pub message: Option<String>,
    pub target: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiErrorEnvelope {
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
}

impl ApiError {
    /// Build from a response status and raw body; unparseable bodies keep
    /// only the status
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<ApiErrorEnvelope>(body)
            .ok()
            .and_then(|e| e.error)
            .unwrap_or_default();
        Self {
            status,
            code: parsed.code,
            message: parsed.message,
            target: parsed.target,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.message, &self.code) {
            (Some(message), Some(code)) => {
                write!(f, "API status {}: {} (code {})", self.status, message, code)?
            }
            (Some(message), None) => write!(f, "API status {}: {}", self.status, message)?,
            _ => write!(f, "API status {}", self.status)?,
        }
        if let Some(target) = &self.target {
            write!(f, "; target: {}", target)?;
        }
        Ok(())
    }
}

// =============================================================================
// Failed Job Details
// =============================================================================

/// Details of an asynchronous job that finished in the failure state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestError {
    pub uuid: String,
    pub description: String,
    pub state: String,
    pub message: String,
    pub code: i64,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl RestError {
    /// Controller error code as a string, comparable with the named codes
    pub fn code_str(&self) -> String {
        self.code.to_string()
    }

    pub fn is_not_found(&self) -> bool {
        self.code_str() == ENTRY_DOESNT_EXIST
    }
}

impl fmt::Display for RestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "API State: {}, Message: {}, Code: {}, Job: {} ({})",
            self.state, self.message, self.code, self.description, self.uuid
        )
    }
}
