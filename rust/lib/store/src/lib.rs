//! Typed JSON document collections over a [`opencrm_kv::KVStore`].
//!
//! A model implements [`KvRecord`] to declare its key prefix and hooks;
//! [`KvOps`] provides get/list/save/delete on top of the raw byte store.

mod kv;

pub use kv::{KvOps, KvRecord, kv_err};
