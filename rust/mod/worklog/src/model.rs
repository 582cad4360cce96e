use serde::{Deserialize, Serialize};

use opencrm_core::{new_id, now_rfc3339};
use opencrm_store::KvRecord;

/// One user's notes for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkLog {
    #[serde(default)]
    pub id: String,

    /// Owning user id.
    pub user: String,

    /// Calendar date as the client sends it, e.g. `2024-05-01`.
    pub date: String,

    #[serde(default)]
    pub log: String,

    #[serde(default)]
    pub created_at: String,

    #[serde(default)]
    pub updated_at: String,
}

impl KvRecord for WorkLog {
    const RESOURCE: &'static str = "worklog";

    fn kv_prefix() -> &'static str {
        "crm:worklog:"
    }

    fn key_value(&self) -> String {
        entry_key(&self.user, &self.date)
    }

    fn before_create(&mut self) {
        if self.id.is_empty() {
            self.id = new_id();
        }
        let now = now_rfc3339();
        self.created_at = now.clone();
        self.updated_at = now;
    }

    fn before_update(&mut self) {
        self.updated_at = now_rfc3339();
    }
}

/// Key of a user's entry, relative to the worklog prefix.
pub fn entry_key(user: &str, date: &str) -> String {
    format!("{}:{}", user, date)
}

/// Body of `POST /worklog`.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveWorkLog {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub log: String,
}

/// Body of `PUT /worklog/{date}`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateWorkLog {
    #[serde(default)]
    pub log: String,
}
