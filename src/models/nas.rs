//! Export policies, export rules and SMB shares

use super::NamedRef;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportPolicy {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub svm: Option<NamedRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportRule {
    pub index: Option<i64>,
    pub clients: Vec<ExportClient>,
    pub protocols: Vec<String>,
    pub ro_rule: Vec<String>,
    pub rw_rule: Vec<String>,
    pub superuser: Vec<String>,
}

impl ExportRule {
    /// Client match strings of the rule
    pub fn client_matches(&self) -> Vec<&str> {
        self.clients
            .iter()
            .filter_map(|c| c.client_match.as_deref())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportClient {
    #[serde(rename = "match")]
    pub client_match: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CifsShare {
    pub name: Option<String>,
    pub path: Option<String>,
    pub svm: Option<NamedRef>,
}
