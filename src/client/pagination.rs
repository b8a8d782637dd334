//! Collection pagination
//!
//! Collection responses carry at most one page of records plus a `next` link.
//! [`RestClient::get_all`] re-issues the original query with the link's
//! parameters layered on top until the controller stops returning links.

use super::{Query, RestClient};
use crate::error::Result;
use crate::models::Collection;
use serde::de::DeserializeOwned;
use tracing::debug;

impl RestClient {
    /// Fetch a single page of a collection without following links
    pub async fn get_one<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &Query,
    ) -> Result<Collection<T>> {
        self.get(path, query).await
    }

    /// Fetch a collection, following `next` links and merging every page
    pub async fn get_all<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &Query,
    ) -> Result<Collection<T>> {
        let mut merged: Collection<T> = self.get(path, query).await?;
        let mut next = merged.next_href().map(str::to_string);
        merged.links = None;

        while let Some(href) = next.take() {
            let mut page_query = query.clone();
            page_query.apply_href(&href)?;
            debug!(path, next = %href, "Following collection link");
            self.metrics.record_page_followed();

            let page: Collection<T> = self.get(path, &page_query).await?;
            let Some(page_records) = page.num_records else {
                break;
            };
            next = page.next_href().map(str::to_string);
            merged.num_records = Some(merged.num_records() + page_records);
            merged.records.extend(page.records);
        }

        Ok(merged)
    }
}
