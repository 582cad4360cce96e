use crate::error::KVError;

/// KVStore provides the key-value interface every record collection sits on.
///
/// Keys follow a namespaced convention: `crm:customer:{id}`,
/// `crm:worklog:{user}:{date}`, `crm:user:{username}`. Values are opaque
/// bytes (JSON documents in practice).
pub trait KVStore: Send + Sync {
    /// Get the value for a key. Returns None if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError>;

    /// Set a key-value pair.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError>;

    /// Delete a key. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), KVError>;

    /// Scan all keys matching a prefix. Returns (key, value) pairs sorted by key.
    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError>;

    /// Remove every key under `prefix` and write `entries` in its place,
    /// all in one transaction. Either the whole swap is visible or none of it.
    ///
    /// Returns the number of keys removed.
    fn replace_prefix(&self, prefix: &str, entries: &[(&str, &[u8])]) -> Result<usize, KVError>;
}
