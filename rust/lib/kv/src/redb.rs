use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable, Table, TableDefinition};

use crate::error::KVError;
use crate::traits::KVStore;

const TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("kv");

type KvTable<'txn> = Table<'txn, &'static str, &'static [u8]>;

fn storage(e: impl std::fmt::Display) -> KVError {
    KVError::Storage(e.to_string())
}

/// RedbStore is a KVStore implementation backed by redb, a pure-Rust embedded
/// key-value database. Every write method runs in its own write transaction;
/// redb serializes write transactions, so each call is atomic.
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create a redb database at the given path.
    pub fn open(path: &Path) -> Result<Self, KVError> {
        let db = Database::create(path).map_err(storage)?;

        // Ensure the table exists so read transactions never see it missing.
        let write_txn = db.begin_write().map_err(storage)?;
        {
            let _table = write_txn.open_table(TABLE).map_err(storage)?;
        }
        write_txn.commit().map_err(storage)?;

        tracing::debug!(path = %path.display(), "opened redb store");
        Ok(Self { db: Arc::new(db) })
    }

    fn write<R>(
        &self,
        f: impl FnOnce(&mut KvTable<'_>) -> Result<R, KVError>,
    ) -> Result<R, KVError> {
        let write_txn = self.db.begin_write().map_err(storage)?;
        let out = {
            let mut table = write_txn.open_table(TABLE).map_err(storage)?;
            f(&mut table)?
        };
        write_txn.commit().map_err(storage)?;
        Ok(out)
    }
}

fn keys_with_prefix(table: &KvTable<'_>, prefix: &str) -> Result<Vec<String>, KVError> {
    let mut keys = Vec::new();
    for entry in table.range(prefix..).map_err(storage)? {
        let (key, _) = entry.map_err(storage)?;
        let key = key.value();
        if !key.starts_with(prefix) {
            break;
        }
        keys.push(key.to_string());
    }
    Ok(keys)
}

impl KVStore for RedbStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError> {
        let read_txn = self.db.begin_read().map_err(storage)?;
        let table = read_txn.open_table(TABLE).map_err(storage)?;

        match table.get(key) {
            Ok(Some(val)) => Ok(Some(val.value().to_vec())),
            Ok(None) => Ok(None),
            Err(e) => Err(storage(e)),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError> {
        self.write(|table| {
            table.insert(key, value).map_err(storage)?;
            Ok(())
        })
    }

    fn delete(&self, key: &str) -> Result<(), KVError> {
        self.write(|table| {
            table.remove(key).map_err(storage)?;
            Ok(())
        })
    }

    fn replace_prefix(&self, prefix: &str, entries: &[(&str, &[u8])]) -> Result<usize, KVError> {
        self.write(|table| {
            let stale = keys_with_prefix(table, prefix)?;
            for key in &stale {
                table.remove(key.as_str()).map_err(storage)?;
            }
            for (key, value) in entries {
                table.insert(*key, *value).map_err(storage)?;
            }
            Ok(stale.len())
        })
    }

    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError> {
        let read_txn = self.db.begin_read().map_err(storage)?;
        let table = read_txn.open_table(TABLE).map_err(storage)?;

        let mut results = Vec::new();
        for entry in table.range(prefix..).map_err(storage)? {
            let (key, value) = entry.map_err(storage)?;
            let key = key.value().to_string();
            if !key.starts_with(prefix) {
                break;
            }
            results.push((key, value.value().to_vec()));
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_store() -> (RedbStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::open(&dir.path().join("test.redb")).unwrap();
        (store, dir)
    }

    #[test]
    fn get_set_delete() {
        let (store, _dir) = make_store();
        assert!(store.get("crm:customer:a").unwrap().is_none());

        store.set("crm:customer:a", b"{}").unwrap();
        assert_eq!(store.get("crm:customer:a").unwrap().unwrap(), b"{}");

        store.delete("crm:customer:a").unwrap();
        assert!(store.get("crm:customer:a").unwrap().is_none());

        // Deleting again is a no-op.
        store.delete("crm:customer:a").unwrap();
    }

    #[test]
    fn scan_stops_at_prefix_boundary() {
        let (store, _dir) = make_store();
        store.set("crm:customer:1", b"a").unwrap();
        store.set("crm:customer:2", b"b").unwrap();
        store.set("crm:customerx:3", b"c").unwrap();
        store.set("crm:worklog:u:2024-01-01", b"d").unwrap();

        let rows = store.scan("crm:customer:").unwrap();
        let keys: Vec<_> = rows.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["crm:customer:1", "crm:customer:2"]);
    }

    #[test]
    fn replace_prefix_swaps_only_that_prefix() {
        let (store, _dir) = make_store();
        store.set("crm:customer:old1", b"o1").unwrap();
        store.set("crm:customer:old2", b"o2").unwrap();
        store.set("crm:user:admin", b"u").unwrap();

        let removed = store
            .replace_prefix("crm:customer:", &[("crm:customer:new", b"n".as_slice())])
            .unwrap();
        assert_eq!(removed, 2);

        let rows = store.scan("crm:customer:").unwrap();
        assert_eq!(rows, vec![("crm:customer:new".to_string(), b"n".to_vec())]);
        assert!(store.get("crm:user:admin").unwrap().is_some());
    }

    #[test]
    fn replace_prefix_with_no_entries_clears() {
        let (store, _dir) = make_store();
        store.set("p:1", b"x").unwrap();
        assert_eq!(store.replace_prefix("p:", &[]).unwrap(), 1);
        assert!(store.scan("p:").unwrap().is_empty());
    }

    #[test]
    fn reopen_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("persist.redb");
        {
            let store = RedbStore::open(&path).unwrap();
            store.set("k", b"v").unwrap();
        }
        let store = RedbStore::open(&path).unwrap();
        assert_eq!(store.get("k").unwrap().unwrap(), b"v");
    }
}
