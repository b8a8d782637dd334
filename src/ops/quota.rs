//! Quota Rules

use crate::client::{Query, RestClient};
use crate::error::{Error, Result};
use crate::models::{Collection, JobLinkResponse, QuotaRule};
use serde_json::{json, Map, Value};
use tracing::{debug, info, instrument};

const QUOTA_RULES: &str = "storage/quota/rules";

fn parse_hard_limit(disk_limit: &str) -> Result<i64> {
    disk_limit.parse::<i64>().map_err(|_| {
        Error::InvalidArgument(format!("cannot process hard disk limit value {}", disk_limit))
    })
}

impl RestClient {
    /// Enable quotas on a FlexVol
    pub async fn quota_on(&self, volume: &str) -> Result<()> {
        self.volume_set_quota_enabled(volume, true).await
    }

    /// Disable quotas on a FlexVol
    pub async fn quota_off(&self, volume: &str) -> Result<()> {
        self.volume_set_quota_enabled(volume, false).await
    }

    /// Update the hard limit of a quota rule, creating the rule when absent
    #[instrument(skip(self))]
    pub async fn quota_set_entry(
        &self,
        qtree: &str,
        volume: &str,
        quota_type: &str,
        disk_limit: &str,
    ) -> Result<()> {
        let rule = match self.quota_get_entry(volume, qtree, quota_type).await {
            Ok(rule) => rule,
            Err(e) if e.is_not_found() => {
                debug!("Quota rule does not exist, adding it");
                return self
                    .quota_add_entry(volume, qtree, quota_type, disk_limit)
                    .await;
            }
            Err(e) => return Err(e),
        };
        let uuid = rule.uuid.ok_or_else(|| {
            Error::UnexpectedResponse("unexpected response from quota entry lookup".into())
        })?;

        if disk_limit.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "invalid hard disk limit value '{}' for quota modify",
                disk_limit
            )));
        }
        let hard_limit = parse_hard_limit(disk_limit)?;

        info!(hard_limit, "Modifying quota rule");
        let body = json!({ "space": { "hard_limit": hard_limit } });
        let accepted: JobLinkResponse = self
            .patch(&format!("{}/{}", QUOTA_RULES, uuid), &Query::new(), Some(&body))
            .await?;
        self.poll_job_status(&accepted).await
    }

    /// Create a quota rule; an empty `disk_limit` leaves the rule unlimited
    #[instrument(skip(self))]
    pub async fn quota_add_entry(
        &self,
        volume: &str,
        qtree: &str,
        quota_type: &str,
        disk_limit: &str,
    ) -> Result<()> {
        let mut body = Map::new();
        body.insert("qtree".into(), json!({ "name": qtree }));
        body.insert("volume".into(), json!({ "name": volume }));
        body.insert("type".into(), json!(quota_type));
        body.insert("svm".into(), json!({ "uuid": self.svm_uuid() }));
        if !disk_limit.is_empty() {
            let hard_limit = parse_hard_limit(disk_limit)?;
            body.insert("space".into(), json!({ "hard_limit": hard_limit }));
        }

        info!("Adding quota rule");
        let accepted: JobLinkResponse = self
            .post(QUOTA_RULES, &Query::new(), &Value::Object(body))
            .await?;
        self.poll_job_status(&accepted).await
    }

    /// The single rule for the volume (and qtree, when named)
    pub async fn quota_get_entry(
        &self,
        volume: &str,
        qtree: &str,
        quota_type: &str,
    ) -> Result<QuotaRule> {
        let query = Query::new()
            .with("type", quota_type)
            .with("svm.uuid", self.svm_uuid())
            .with("qtree.name", qtree)
            .with("volume.name", volume)
            .with("fields", "uuid,space.hard_limit");
        let rules: Collection<QuotaRule> = self.get_all(QUOTA_RULES, &query).await?;

        let target = if qtree.is_empty() {
            volume.to_string()
        } else {
            format!("{}/{}", volume, qtree)
        };
        if rules.records.len() > 1 {
            return Err(Error::NotUnique(format!(
                "more than one quota rule entry for {} found",
                target
            )));
        }
        rules
            .records
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("no entries for {}", target)))
    }

    /// Tree quota rules of a FlexVol
    pub async fn quota_entry_list(&self, volume: &str) -> Result<Collection<QuotaRule>> {
        let query = Query::new()
            .with("svm.uuid", self.svm_uuid())
            .with("volume.name", volume)
            .with("type", "tree")
            .with("fields", "space.hard_limit,uuid,qtree.name,volume.name");
        self.get_all(QUOTA_RULES, &query).await
    }
}
