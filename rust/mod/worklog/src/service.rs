use std::sync::Arc;

use opencrm_core::ServiceError;
use opencrm_kv::KVStore;
use opencrm_store::KvOps;

use crate::model::{SaveWorkLog, WorkLog, entry_key};

/// Per-user, per-date work log entries.
pub struct WorkLogService {
    ops: KvOps<WorkLog>,
}

fn check_date(date: &str) -> Result<&str, ServiceError> {
    let date = date.trim();
    if date.is_empty() {
        return Err(ServiceError::Validation("date is required".into()));
    }
    Ok(date)
}

impl WorkLogService {
    pub fn new(kv: Arc<dyn KVStore>) -> Arc<Self> {
        Arc::new(Self { ops: KvOps::new(kv) })
    }

    /// All of a user's entries, oldest date first.
    pub fn list(&self, user: &str) -> Result<Vec<WorkLog>, ServiceError> {
        self.ops.list_under(&entry_key(user, ""))
    }

    pub fn get(&self, user: &str, date: &str) -> Result<Option<WorkLog>, ServiceError> {
        let date = check_date(date)?;
        self.ops.get(&entry_key(user, date))
    }

    /// Create or overwrite the entry for `input.date`.
    pub fn save(&self, user: &str, input: SaveWorkLog) -> Result<WorkLog, ServiceError> {
        let date = check_date(&input.date)?;
        let saved = match self.get(user, date)? {
            Some(mut existing) => {
                existing.log = input.log;
                self.ops.save(existing)?
            }
            None => self.ops.save_new(WorkLog {
                id: String::new(),
                user: user.to_string(),
                date: date.to_string(),
                log: input.log,
                created_at: String::new(),
                updated_at: String::new(),
            })?,
        };
        tracing::info!(user, date, "work log saved");
        Ok(saved)
    }

    /// Overwrite an existing entry. NotFound if there is none for that date.
    pub fn update(&self, user: &str, date: &str, log: String) -> Result<WorkLog, ServiceError> {
        let date = check_date(date)?;
        let Some(mut existing) = self.get(user, date)? else {
            tracing::warn!(user, date, "work log update for missing date");
            return Err(not_found(date));
        };
        existing.log = log;
        let updated = self.ops.save(existing)?;
        tracing::info!(user, date, "work log updated");
        Ok(updated)
    }

    pub fn delete(&self, user: &str, date: &str) -> Result<WorkLog, ServiceError> {
        let date = check_date(date)?;
        match self.ops.delete(&entry_key(user, date)) {
            Ok(removed) => {
                tracing::info!(user, date, "work log deleted");
                Ok(removed)
            }
            Err(ServiceError::NotFound(_)) => {
                tracing::warn!(user, date, "work log delete for missing date");
                Err(not_found(date))
            }
            Err(other) => Err(other),
        }
    }
}

fn not_found(date: &str) -> ServiceError {
    ServiceError::NotFound(format!("no work log for {}", date))
}
