pub mod import;
pub mod serial;

use std::cmp::Ordering;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use opencrm_core::{ListParams, ServiceError, SortOrder, merge_patch};
use opencrm_kv::KVStore;
use opencrm_store::KvOps;
use serde_json::Value;

use crate::model::{Customer, RowError, SERIAL_HEADER, field_spec, normalize};

pub use import::{ImportMode, ImportTally};
pub use serial::{SerialAllocator, next_serial};

impl From<RowError> for ServiceError {
    fn from(e: RowError) -> Self {
        match e {
            RowError::Store(msg) => ServiceError::Storage(msg),
            other => ServiceError::Validation(other.to_string()),
        }
    }
}

/// Customer records: CRUD, list/search and bulk import.
pub struct CustomerService {
    pub(crate) ops: KvOps<Customer>,
    /// Held across every "read max serial, then write" sequence. This service
    /// is the only writer of the customer prefix, so holding it makes serial
    /// allocation race-free.
    write_lock: Mutex<()>,
}

impl CustomerService {
    pub fn new(kv: Arc<dyn KVStore>) -> Arc<Self> {
        Arc::new(Self {
            ops: KvOps::new(kv),
            write_lock: Mutex::new(()),
        })
    }

    pub(crate) fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn allocator(&self) -> Result<SerialAllocator, ServiceError> {
        Ok(SerialAllocator::seeded(self.ops.list()?.iter().map(|c| c.serial_no)))
    }

    /// List customers, filtered by `q` and ordered by `sort`/`order`.
    /// Defaults to serial number ascending.
    pub fn list(&self, params: &ListParams) -> Result<Vec<Customer>, ServiceError> {
        let mut items = self.ops.list()?;
        if let Some(needle) = params.query() {
            items.retain(|c| c.matches(&needle));
        }

        let sort = sort_key(params.sort.as_deref().unwrap_or("serialNo"))?;
        items.sort_by(|a, b| {
            let ord = compare_by(a, b, sort);
            match params.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });
        Ok(params.paginate(items))
    }

    pub fn get(&self, id: &str) -> Result<Customer, ServiceError> {
        self.ops.get_or_err(id)
    }

    /// Create one customer. The serial number is always allocated here;
    /// any value supplied by the caller is ignored.
    pub fn create(&self, body: &Value) -> Result<Customer, ServiceError> {
        let mut customer = Customer::from_row(body)?;

        let _guard = self.lock_writes();
        customer.serial_no = self.allocator()?.peek();
        let created = self.ops.save_new(customer)?;
        tracing::info!(id = %created.id, serial = created.serial_no, "customer created");
        Ok(created)
    }

    /// Partial update with JSON merge-patch semantics. Never creates.
    pub fn update(&self, id: &str, patch: &Value) -> Result<Customer, ServiceError> {
        let _guard = self.lock_writes();
        let current = self.ops.get_or_err(id)?;

        let patch_obj = patch
            .as_object()
            .ok_or_else(|| ServiceError::Validation("patch must be a JSON object".into()))?;
        let patch = Value::Object(normalize(patch_obj, true)?);

        let mut base = serde_json::to_value(&current)
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        merge_patch(&mut base, &patch);

        // A cleared name fails to deserialize; report it the same way as blank.
        let mut updated: Customer =
            serde_json::from_value(base).map_err(|_| ServiceError::from(RowError::MissingName))?;
        updated.validate()?;
        updated.id = current.id;
        updated.serial_no = current.serial_no;
        updated.created_at = current.created_at;

        self.ops.save(updated)
    }

    pub fn delete(&self, id: &str) -> Result<Customer, ServiceError> {
        let _guard = self.lock_writes();
        let removed = self.ops.delete(id)?;
        tracing::info!(id = %removed.id, serial = removed.serial_no, "customer deleted");
        Ok(removed)
    }
}

/// Resolve a sort parameter given as wire name or sheet header.
fn sort_key(sort: &str) -> Result<&'static str, ServiceError> {
    match sort {
        "serialNo" | SERIAL_HEADER => Ok("serialNo"),
        "id" => Ok("id"),
        "createdAt" => Ok("createdAt"),
        "updatedAt" => Ok("updatedAt"),
        other => field_spec(other)
            .map(|spec| spec.name)
            .ok_or_else(|| ServiceError::Validation(format!("unknown sort field '{}'", other))),
    }
}

fn compare_by(a: &Customer, b: &Customer, field: &str) -> Ordering {
    match field {
        "serialNo" => a.serial_no.cmp(&b.serial_no),
        _ => a
            .text(field)
            .unwrap_or("")
            .cmp(b.text(field).unwrap_or(""))
            .then(a.serial_no.cmp(&b.serial_no)),
    }
}
