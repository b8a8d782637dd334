//! Query parameter builder for collection and mutation calls

use crate::error::{Error, Result};

/// Ordered query parameters; setting an existing key replaces its value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Query::set`]
    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    /// Set `key` only when a value is present
    pub fn with_opt<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.with(key, v),
            None => self,
        }
    }

    /// Request every field of the returned records
    pub fn all_fields(self) -> Self {
        self.with("fields", "**")
    }

    /// Ask mutating calls to echo the affected records
    pub fn return_records(self) -> Self {
        self.with("return_records", true)
    }

    pub fn set(&mut self, key: &str, value: impl ToString) {
        let value = value.to_string();
        match self.pairs.iter_mut().find(|(k, _)| k == key) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Override parameters with those carried by a pagination href such as
    /// `/api/storage/volumes?start.uuid=...&max_records=1`
    pub fn apply_href(&mut self, href: &str) -> Result<()> {
        let Some((_, raw)) = href.split_once('?') else {
            return Ok(());
        };
        for segment in raw.split('&').filter(|s| !s.is_empty()) {
            let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
            let key = decode_component(key)?;
            let value = decode_component(value)?;
            self.set(&key, value);
        }
        Ok(())
    }
}

fn decode_component(raw: &str) -> Result<String> {
    urlencoding::decode(&raw.replace('+', " "))
        .map(|s| s.into_owned())
        .map_err(|e| Error::UnexpectedResponse(format!("invalid next link '{}': {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces() {
        let mut query = Query::new().with("name", "*").all_fields();
        query.set("name", "vol1");
        assert_eq!(query.get("name"), Some("vol1"));
        assert_eq!(query.get("fields"), Some("**"));
        assert_eq!(query.pairs().len(), 2);
        assert_eq!(Query::new().with_opt::<&str>("state", None), Query::new());
    }

    #[test]
    fn test_apply_href_overrides() {
        let mut query = Query::new()
            .with("svm.uuid", "s1")
            .with("name", "*")
            .all_fields();
        query
            .apply_href("/api/storage/volumes?start.uuid=abc&fields=%2A%2A&max_records=1&name=%2A")
            .unwrap();
        assert_eq!(query.get("svm.uuid"), Some("s1"));
        assert_eq!(query.get("start.uuid"), Some("abc"));
        assert_eq!(query.get("max_records"), Some("1"));
        assert_eq!(query.get("fields"), Some("**"));
        assert_eq!(query.pairs().len(), 5);
    }

    #[test]
    fn test_apply_href_without_query() {
        let mut query = Query::new().with("name", "x");
        query.apply_href("/api/storage/volumes").unwrap();
        assert_eq!(query, Query::new().with("name", "x"));
    }
}
