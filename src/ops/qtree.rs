//! Qtrees
//!
//! A qtree is addressed by `/{volume}/{qtree}` paths or by name within a
//! volume. Lookups that must be unique read a single page and treat a next
//! link as a second match.

use crate::client::{Query, RestClient};
use crate::error::{Error, Result};
use crate::models::{Collection, JobLinkResponse, Qtree};
use crate::util::parse_unix_permissions;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{info, instrument};

const QTREES: &str = "storage/qtrees";

/// Parameters for [`RestClient::qtree_create`]; empty strings are omitted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QtreeCreateOptions {
    pub name: String,
    pub volume: String,
    /// Octal (`755`) or symbolic (`rwxr-xr-x`) permissions
    pub unix_permissions: String,
    pub export_policy: String,
    pub security_style: String,
    pub qos_policy: String,
}

fn prefix_pattern(prefix: &str) -> String {
    if prefix.is_empty() {
        "*".to_string()
    } else {
        format!("{}*", prefix)
    }
}

/// The only record of a single page, with distinct errors for none and many
fn single_qtree(page: Collection<Qtree>, many: String, none: String) -> Result<Qtree> {
    if page.records.len() > 1 {
        return Err(Error::NotUnique(many));
    }
    let has_next = page.next_href().is_some();
    match page.records.into_iter().next() {
        Some(qtree) => Ok(qtree),
        None if has_next => Err(Error::NotUnique(many)),
        None => Err(Error::NotFound(none)),
    }
}

/// Volume uuid and qtree id, which together address a qtree resource
fn qtree_address(qtree: &Qtree, what: &str) -> Result<(String, i64, String)> {
    let id = qtree
        .id
        .ok_or_else(|| Error::UnexpectedResponse(format!("could not find id for qtree {}", what)))?;
    let volume = qtree.volume.as_ref();
    match (
        volume.and_then(|v| v.uuid.clone()),
        volume.and_then(|v| v.name.clone()),
    ) {
        (Some(uuid), Some(name)) => Ok((uuid, id, name)),
        _ => Err(Error::UnexpectedResponse(format!(
            "unexpected response from qtree lookup, missing volume information for qtree {}",
            what
        ))),
    }
}

impl RestClient {
    /// Create a qtree and wait until it can be looked up by name
    #[instrument(skip(self, options), fields(qtree = %options.name, volume = %options.volume))]
    pub async fn qtree_create(&self, options: &QtreeCreateOptions) -> Result<()> {
        let mut body = Map::new();
        body.insert("name".into(), json!(options.name));
        body.insert("volume".into(), json!({ "name": options.volume }));
        body.insert("svm".into(), json!({ "uuid": self.svm_uuid() }));
        if !options.unix_permissions.is_empty() {
            let permissions = parse_unix_permissions(&options.unix_permissions)?;
            body.insert("unix_permissions".into(), json!(permissions));
        }
        if !options.export_policy.is_empty() {
            body.insert("export_policy".into(), json!({ "name": options.export_policy }));
        }
        if !options.security_style.is_empty() {
            body.insert("security_style".into(), json!(options.security_style));
        }
        if !options.qos_policy.is_empty() {
            body.insert("qos_policy".into(), json!({ "name": options.qos_policy }));
        }

        info!("Creating qtree");
        let accepted: JobLinkResponse = self
            .post(QTREES, &Query::new(), &Value::Object(body))
            .await?;
        self.poll_job_status(&accepted).await?;

        let client = self;
        let (name, volume) = (options.name.as_str(), options.volume.as_str());
        self.wait_until(
            &format!("qtree '{}' in volume '{}'", name, volume),
            &self.config().polling.existence,
            move || async move { client.qtree_get_by_name(name, volume).await.map(|_| true) },
        )
        .await
    }

    async fn patch_qtree(&self, qtree: &Qtree, what: &str, body: &Value) -> Result<()> {
        let (volume_uuid, id, _) = qtree_address(qtree, what)?;
        let accepted: JobLinkResponse = self
            .patch(
                &format!("{}/{}/{}", QTREES, volume_uuid, id),
                &Query::new(),
                Some(body),
            )
            .await?;
        self.poll_job_status(&accepted).await
    }

    /// Rename the qtree at `path`; `new_path` is `/{volume}/{new name}`
    #[instrument(skip(self))]
    pub async fn qtree_rename(&self, path: &str, new_path: &str) -> Result<()> {
        let qtree = self.qtree_get_by_path(path).await?;
        let what = format!("with path {}", path);
        let (_, _, volume_name) = qtree_address(&qtree, &what)?;

        let volume_prefix = format!("/{}/", volume_name);
        let new_name = new_path.strip_prefix(&volume_prefix).unwrap_or(new_path);
        self.patch_qtree(&qtree, &what, &json!({ "name": new_name }))
            .await
    }

    #[instrument(skip(self))]
    pub async fn qtree_destroy_async(&self, path: &str) -> Result<()> {
        let qtree = self.qtree_get_by_path(path).await?;
        let (volume_uuid, id, _) = qtree_address(&qtree, &format!("with path {}", path))?;

        info!("Destroying qtree");
        let accepted: JobLinkResponse = self
            .delete(&format!("{}/{}/{}", QTREES, volume_uuid, id), &Query::new())
            .await?;
        self.poll_job_status(&accepted).await
    }

    /// Qtrees whose names start with `prefix` in volumes starting with `volume_prefix`
    pub async fn qtree_list(&self, prefix: &str, volume_prefix: &str) -> Result<Collection<Qtree>> {
        let query = Query::new()
            .with("svm.uuid", self.svm_uuid())
            .with("name", prefix_pattern(prefix))
            .with("volume.name", prefix_pattern(volume_prefix))
            .all_fields();
        self.get_all(QTREES, &query).await
    }

    pub async fn qtree_get_by_path(&self, path: &str) -> Result<Qtree> {
        let query = Query::new()
            .with("svm.uuid", self.svm_uuid())
            .with("path", path)
            .all_fields();
        let page = self.get_one(QTREES, &query).await?;
        single_qtree(
            page,
            format!("more than one qtree at path {} found", path),
            format!("qtree path {} not found", path),
        )
    }

    pub async fn qtree_get_by_name(&self, name: &str, volume: &str) -> Result<Qtree> {
        let query = Query::new()
            .with("svm.uuid", self.svm_uuid())
            .with("name", name)
            .with("volume.name", volume)
            .all_fields();
        let page = self.get_one(QTREES, &query).await?;
        single_qtree(
            page,
            format!("more than one qtree {} found", name),
            format!("qtree {} not found", name),
        )
    }

    /// Qtrees in the volume, not counting the volume's own qtree
    pub async fn qtree_count(&self, volume: &str) -> Result<usize> {
        let query = Query::new()
            .with("svm.uuid", self.svm_uuid())
            .with("volume.name", volume)
            .all_fields();
        let qtrees: Collection<Qtree> = self.get_all(QTREES, &query).await?;
        Ok(qtrees.num_records().saturating_sub(1).max(0) as usize)
    }

    /// Whether the qtree exists exactly once, and the FlexVol containing it
    pub async fn qtree_exists(&self, name: &str, volume_pattern: &str) -> Result<(bool, String)> {
        let query = Query::new()
            .with("svm.uuid", self.svm_uuid())
            .with("name", name)
            .with("volume.name", volume_pattern)
            .all_fields();
        let qtrees: Collection<Qtree> = self.get_all(QTREES, &query).await?;
        let flexvol = qtrees
            .into_single()
            .and_then(|q| q.volume)
            .and_then(|v| v.name);
        Ok(match flexvol {
            Some(flexvol) => (true, flexvol),
            None => (false, String::new()),
        })
    }

    pub async fn qtree_get(&self, name: &str, volume_prefix: &str) -> Result<Qtree> {
        let query = Query::new()
            .with("svm.uuid", self.svm_uuid())
            .with("name", name)
            .with("volume.name", prefix_pattern(volume_prefix))
            .all_fields();
        let page = self.get_one(QTREES, &query).await?;
        single_qtree(
            page,
            format!("more than one qtree {} found", name),
            format!("qtree {} not found", name),
        )
    }

    pub async fn qtree_get_all(&self, volume_prefix: &str) -> Result<Collection<Qtree>> {
        let query = Query::new()
            .with("svm.uuid", self.svm_uuid())
            .with("volume.name", prefix_pattern(volume_prefix))
            .all_fields();
        self.get_all(QTREES, &query).await
    }

    #[instrument(skip(self))]
    pub async fn qtree_modify_export_policy(
        &self,
        name: &str,
        volume: &str,
        export_policy: &str,
    ) -> Result<()> {
        let qtree = self.qtree_get_by_name(name, volume).await?;
        self.patch_qtree(
            &qtree,
            &format!("with name {}", name),
            &json!({ "export_policy": { "name": export_policy } }),
        )
        .await
    }
}
