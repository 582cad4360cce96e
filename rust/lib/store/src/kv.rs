use std::marker::PhantomData;
use std::sync::Arc;

use opencrm_core::ServiceError;
use opencrm_kv::{KVError, KVStore};
use serde::{Serialize, de::DeserializeOwned};

/// Trait implemented by models to declare KV storage behavior.
///
/// Hooks have default no-op impls.
pub trait KvRecord: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Human-readable resource name, used in error messages.
    const RESOURCE: &'static str;

    /// KV key prefix: "crm:{resource}:".
    fn kv_prefix() -> &'static str;

    /// Key of this instance, appended to the prefix.
    fn key_value(&self) -> String;

    /// Called before inserting a new record. Use for auto-fill (uuid, timestamps).
    fn before_create(&mut self) {}

    /// Called before updating an existing record.
    fn before_update(&mut self) {}
}

/// Map a storage error onto the service taxonomy.
pub fn kv_err(e: KVError) -> ServiceError {
    match e {
        KVError::Serialization(msg) => ServiceError::Internal(msg),
        KVError::Storage(msg) => ServiceError::Storage(msg),
    }
}

fn decode<T: KvRecord>(bytes: &[u8]) -> Result<T, ServiceError> {
    serde_json::from_slice(bytes).map_err(|e| ServiceError::Internal(format!("deserialize: {}", e)))
}

fn encode<T: KvRecord>(record: &T) -> Result<Vec<u8>, ServiceError> {
    serde_json::to_vec(record).map_err(|e| ServiceError::Internal(format!("serialize: {}", e)))
}

/// CRUD operations for a KvRecord model. Holds a reference to the KV backend.
pub struct KvOps<T: KvRecord> {
    kv: Arc<dyn KVStore>,
    _phantom: PhantomData<T>,
}

impl<T: KvRecord> Clone for KvOps<T> {
    fn clone(&self) -> Self {
        Self::new(self.kv.clone())
    }
}

impl<T: KvRecord> KvOps<T> {
    pub fn new(kv: Arc<dyn KVStore>) -> Self {
        Self {
            kv,
            _phantom: PhantomData,
        }
    }

    fn make_key(id: &str) -> String {
        format!("{}{}", T::kv_prefix(), id)
    }

    /// Get a record by key value. Returns None if not found.
    pub fn get(&self, id: &str) -> Result<Option<T>, ServiceError> {
        match self.kv.get(&Self::make_key(id)).map_err(kv_err)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Get a record or return NotFound error.
    pub fn get_or_err(&self, id: &str) -> Result<T, ServiceError> {
        self.get(id)?
            .ok_or_else(|| ServiceError::NotFound(format!("{} '{}' not found", T::RESOURCE, id)))
    }

    /// List all records under the model's prefix, in key order.
    pub fn list(&self) -> Result<Vec<T>, ServiceError> {
        self.list_under("")
    }

    /// List records whose key (after the model prefix) starts with `sub`.
    pub fn list_under(&self, sub: &str) -> Result<Vec<T>, ServiceError> {
        let entries = self.kv.scan(&Self::make_key(sub)).map_err(kv_err)?;
        entries.iter().map(|(_key, bytes)| decode(bytes)).collect()
    }

    /// Create a new record. Calls before_create hook, checks for duplicates.
    pub fn save_new(&self, mut record: T) -> Result<T, ServiceError> {
        record.before_create();

        let id = record.key_value();
        let key = Self::make_key(&id);
        if self.kv.get(&key).map_err(kv_err)?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "{} '{}' already exists",
                T::RESOURCE,
                id
            )));
        }

        self.kv.set(&key, &encode(&record)?).map_err(kv_err)?;
        Ok(record)
    }

    /// Write a record, creating or overwriting. Calls before_update hook.
    pub fn save(&self, mut record: T) -> Result<T, ServiceError> {
        record.before_update();

        let key = Self::make_key(&record.key_value());
        self.kv.set(&key, &encode(&record)?).map_err(kv_err)?;
        Ok(record)
    }

    /// Delete a record by key value. NotFound if it does not exist.
    pub fn delete(&self, id: &str) -> Result<T, ServiceError> {
        let record = self.get_or_err(id)?;
        self.kv.delete(&Self::make_key(id)).map_err(kv_err)?;
        Ok(record)
    }

    /// Atomically drop every record of this model and store `records` in
    /// their place. Calls before_create on each new record.
    ///
    /// Returns the number of records removed and the stored records.
    pub fn replace_all(&self, records: Vec<T>) -> Result<(usize, Vec<T>), ServiceError> {
        let mut prepared = Vec::with_capacity(records.len());
        for mut record in records {
            record.before_create();
            let key = Self::make_key(&record.key_value());
            let bytes = encode(&record)?;
            prepared.push((key, bytes, record));
        }

        let entries: Vec<(&str, &[u8])> = prepared
            .iter()
            .map(|(key, bytes, _)| (key.as_str(), bytes.as_slice()))
            .collect();
        let removed = self
            .kv
            .replace_prefix(T::kv_prefix(), &entries)
            .map_err(kv_err)?;

        tracing::debug!(resource = T::RESOURCE, removed, inserted = prepared.len(), "replaced collection");
        Ok((removed, prepared.into_iter().map(|(_, _, r)| r).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Thing {
        id: String,
        name: String,
        #[serde(default)]
        touched: bool,
    }

    impl KvRecord for Thing {
        const RESOURCE: &'static str = "thing";

        fn kv_prefix() -> &'static str {
            "test:thing:"
        }

        fn key_value(&self) -> String {
            self.id.clone()
        }

        fn before_create(&mut self) {
            if self.id.is_empty() {
                self.id = "auto-id".to_string();
            }
        }

        fn before_update(&mut self) {
            self.touched = true;
        }
    }

    fn thing(id: &str, name: &str) -> Thing {
        Thing { id: id.into(), name: name.into(), touched: false }
    }

    fn make_ops() -> (KvOps<Thing>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let kv: Arc<dyn KVStore> =
            Arc::new(opencrm_kv::RedbStore::open(&dir.path().join("test.redb")).unwrap());
        (KvOps::new(kv), dir)
    }

    #[test]
    fn crud_lifecycle() {
        let (ops, _dir) = make_ops();

        let created = ops.save_new(thing("", "Widget")).unwrap();
        assert_eq!(created.id, "auto-id");

        let fetched = ops.get_or_err("auto-id").unwrap();
        assert_eq!(fetched.name, "Widget");
        assert_eq!(ops.list().unwrap().len(), 1);

        let mut updated = fetched;
        updated.name = "Gadget".into();
        let updated = ops.save(updated).unwrap();
        assert!(updated.touched);
        assert_eq!(ops.get_or_err("auto-id").unwrap().name, "Gadget");

        let removed = ops.delete("auto-id").unwrap();
        assert_eq!(removed.name, "Gadget");
        assert!(ops.get("auto-id").unwrap().is_none());
    }

    #[test]
    fn duplicate_key_rejected() {
        let (ops, _dir) = make_ops();
        ops.save_new(thing("x", "A")).unwrap();
        let err = ops.save_new(thing("x", "B")).unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[test]
    fn get_or_err_returns_not_found() {
        let (ops, _dir) = make_ops();
        let err = ops.get_or_err("nope").unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert_eq!(err.to_string(), "thing 'nope' not found");
    }

    #[test]
    fn delete_nonexistent_returns_not_found() {
        let (ops, _dir) = make_ops();
        assert!(matches!(ops.delete("ghost").unwrap_err(), ServiceError::NotFound(_)));
    }

    #[test]
    fn list_under_filters_by_sub_prefix() {
        let (ops, _dir) = make_ops();
        ops.save_new(thing("alice:2024-01-01", "a1")).unwrap();
        ops.save_new(thing("alice:2024-01-02", "a2")).unwrap();
        ops.save_new(thing("bob:2024-01-01", "b1")).unwrap();

        let alice = ops.list_under("alice:").unwrap();
        assert_eq!(alice.len(), 2);
        assert_eq!(ops.list().unwrap().len(), 3);
    }

    #[test]
    fn replace_all_drops_previous_records() {
        let (ops, _dir) = make_ops();
        ops.save_new(thing("old1", "o1")).unwrap();
        ops.save_new(thing("old2", "o2")).unwrap();

        let (removed, stored) = ops
            .replace_all(vec![thing("new1", "n1"), thing("new2", "n2"), thing("new3", "n3")])
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(stored.len(), 3);

        let ids: Vec<_> = ops.list().unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["new1", "new2", "new3"]);
    }
}
