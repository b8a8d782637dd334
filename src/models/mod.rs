//! Request and response shapes for the controller REST API
//!
//! Only the fields this client reads are modelled. Every field is optional
//! because the controller omits whatever was not requested via `fields`.

pub mod cluster;
pub mod nas;
pub mod nvme;
pub mod san;
pub mod snapmirror;
pub mod storage;

pub use cluster::*;
pub use nas::*;
pub use nvme::*;
pub use san::*;
pub use snapmirror::*;
pub use storage::*;

use serde::{Deserialize, Serialize};

/// Reference to another object by name and/or uuid
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamedRef {
    pub name: Option<String>,
    pub uuid: Option<String>,
}

impl NamedRef {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn uuid(&self) -> Option<&str> {
        self.uuid.as_deref()
    }
}

/// Link to another resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Href {
    pub href: Option<String>,
}

/// Pagination links of a collection page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionLinks {
    pub next: Option<Href>,
    #[serde(rename = "self")]
    pub self_link: Option<Href>,
}

/// One page, or the merged pages, of a collection response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Collection<T> {
    pub num_records: Option<i64>,
    pub records: Vec<T>,
    #[serde(rename = "_links")]
    pub links: Option<CollectionLinks>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            num_records: None,
            records: Vec::new(),
            links: None,
        }
    }
}

impl<T> Collection<T> {
    /// Href of the next page, if the controller reported a non-empty one
    pub fn next_href(&self) -> Option<&str> {
        self.links
            .as_ref()
            .and_then(|l| l.next.as_ref())
            .and_then(|n| n.href.as_deref())
            .filter(|h| !h.is_empty())
    }

    pub fn num_records(&self) -> i64 {
        self.num_records.unwrap_or(0)
    }

    /// The record when exactly one was returned
    pub fn into_single(self) -> Option<T> {
        if self.num_records() == 1 && self.records.len() == 1 {
            self.records.into_iter().next()
        } else {
            None
        }
    }
}
