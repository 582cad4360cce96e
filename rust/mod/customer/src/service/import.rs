//! Bulk import of spreadsheet rows.
//!
//! A batch is an ordered list of row objects. Each row is validated on its
//! own; a bad row is counted and skipped, it never aborts the batch. Serial
//! numbers follow input order.
//!
//! - `Append` stores rows one at a time after the existing records. A store
//!   failure on one row is counted like any other bad row.
//! - `Replace` numbers the valid rows 1..N and swaps them in for the whole
//!   existing collection in a single transaction. If that write fails the
//!   previous records stay untouched.

use serde::Serialize;
use serde_json::Value;

use opencrm_core::ServiceError;

use crate::model::{Customer, RowError};
use crate::service::{CustomerService, SerialAllocator};

const PROGRESS_EVERY: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    Replace,
    Append,
}

impl ImportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportMode::Replace => "replace",
            ImportMode::Append => "append",
        }
    }
}

/// Aggregate outcome of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportTally {
    pub total: usize,
    pub inserted: usize,
    pub errors: usize,
}

impl ImportTally {
    fn inserted(self) -> Self {
        Self { total: self.total + 1, inserted: self.inserted + 1, ..self }
    }

    fn failed(self) -> Self {
        Self { total: self.total + 1, errors: self.errors + 1, ..self }
    }
}

/// Accept a request payload as a batch of rows.
///
/// Anything other than a non-empty JSON array is rejected before the store
/// is touched.
pub fn parse_batch(payload: Value) -> Result<Vec<Value>, ServiceError> {
    match payload {
        Value::Array(rows) if !rows.is_empty() => Ok(rows),
        Value::Array(_) => Err(ServiceError::Validation("import batch is empty".into())),
        _ => Err(ServiceError::Validation("import payload must be an array of rows".into())),
    }
}

fn log_skip(index: usize, err: &RowError) {
    tracing::warn!(row = index + 1, error = %err, "import row skipped");
}

fn log_progress(tally: &ImportTally) {
    if tally.inserted > 0 && tally.inserted % PROGRESS_EVERY == 0 {
        tracing::info!(inserted = tally.inserted, processed = tally.total, "import progress");
    }
}

impl CustomerService {
    /// Apply a batch of rows in the given mode.
    pub fn import(&self, mode: ImportMode, rows: Vec<Value>) -> Result<ImportTally, ServiceError> {
        if rows.is_empty() {
            return Err(ServiceError::Validation("import batch is empty".into()));
        }
        tracing::info!(mode = mode.as_str(), rows = rows.len(), "import batch received");

        let _guard = self.lock_writes();
        let tally = match mode {
            ImportMode::Append => self.append_rows(&rows)?,
            ImportMode::Replace => self.replace_rows(&rows)?,
        };

        tracing::info!(
            mode = mode.as_str(),
            total = tally.total,
            inserted = tally.inserted,
            errors = tally.errors,
            "import finished"
        );
        Ok(tally)
    }

    fn append_rows(&self, rows: &[Value]) -> Result<ImportTally, ServiceError> {
        let mut alloc = self.allocator()?;

        let tally = rows.iter().enumerate().fold(ImportTally::default(), |tally, (index, row)| {
            let stored = Customer::from_row(row).and_then(|mut customer| {
                customer.serial_no = alloc.peek();
                self.ops
                    .save_new(customer)
                    .map_err(|e| RowError::Store(e.to_string()))
            });
            match stored {
                Ok(customer) => {
                    alloc.commit(customer.serial_no);
                    let tally = tally.inserted();
                    log_progress(&tally);
                    tally
                }
                Err(err) => {
                    log_skip(index, &err);
                    tally.failed()
                }
            }
        });
        Ok(tally)
    }

    fn replace_rows(&self, rows: &[Value]) -> Result<ImportTally, ServiceError> {
        let mut alloc = SerialAllocator::default();

        let (tally, batch) = rows.iter().enumerate().fold(
            (ImportTally::default(), Vec::with_capacity(rows.len())),
            |(tally, mut batch), (index, row)| match Customer::from_row(row) {
                Ok(mut customer) => {
                    customer.serial_no = alloc.peek();
                    alloc.commit(customer.serial_no);
                    batch.push(customer);
                    let tally = tally.inserted();
                    log_progress(&tally);
                    (tally, batch)
                }
                Err(err) => {
                    log_skip(index, &err);
                    (tally.failed(), batch)
                }
            },
        );

        let (removed, _) = self.ops.replace_all(batch)?;
        tracing::info!(removed, "existing customers replaced");
        Ok(tally)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::tests::{FailingStore, make_service, make_service_on};
    use opencrm_core::ListParams;
    use serde_json::json;

    fn names_and_serials(svc: &CustomerService) -> Vec<(String, u64)> {
        svc.list(&ListParams::default())
            .unwrap()
            .into_iter()
            .map(|c| (c.name, c.serial_no))
            .collect()
    }

    #[test]
    fn empty_or_non_array_payload_rejected() {
        assert!(matches!(parse_batch(json!([])), Err(ServiceError::Validation(_))));
        assert!(matches!(parse_batch(json!({"name": "Kim"})), Err(ServiceError::Validation(_))));
        assert!(matches!(parse_batch(json!(null)), Err(ServiceError::Validation(_))));
        assert_eq!(parse_batch(json!([{"name": "Kim"}])).unwrap().len(), 1);
    }

    #[test]
    fn empty_batch_rejected_without_mutation() {
        let (svc, _dir) = make_service();
        svc.create(&json!({"name": "Existing"})).unwrap();

        let err = svc.import(ImportMode::Replace, vec![]).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(names_and_serials(&svc), vec![("Existing".to_string(), 1)]);
    }

    #[test]
    fn append_counts_blank_name_and_continues() {
        let (svc, _dir) = make_service();
        let rows = vec![
            json!({"name": "A"}),
            json!({"name": "B"}),
            json!({"name": "   "}),
            json!({"name": "D"}),
            json!({"name": "E"}),
        ];

        let tally = svc.import(ImportMode::Append, rows).unwrap();
        assert_eq!(tally, ImportTally { total: 5, inserted: 4, errors: 1 });

        let stored = names_and_serials(&svc);
        assert_eq!(
            stored,
            vec![
                ("A".to_string(), 1),
                ("B".to_string(), 2),
                ("D".to_string(), 3),
                ("E".to_string(), 4),
            ]
        );
    }

    #[test]
    fn append_continues_after_invalid_field() {
        let (svc, _dir) = make_service();
        let rows = vec![
            json!({"name": "A", "인물메모": "x".repeat(crate::model::MEMO_MAX_CHARS + 1)}),
            json!({"name": "B", "tel": {"nested": true}}),
            json!("not a row"),
            json!({"name": "C"}),
        ];

        let tally = svc.import(ImportMode::Append, rows).unwrap();
        assert_eq!(tally, ImportTally { total: 4, inserted: 1, errors: 3 });
        assert_eq!(names_and_serials(&svc), vec![("C".to_string(), 1)]);
    }

    #[test]
    fn append_follows_existing_max_and_strips_supplied_serials() {
        let (svc, _dir) = make_service();
        svc.create(&json!({"name": "Old1"})).unwrap();
        let old2 = svc.create(&json!({"name": "Old2"})).unwrap();
        svc.create(&json!({"name": "Old3"})).unwrap();
        svc.delete(&old2.id).unwrap();

        let rows = vec![json!({"일련번호": 1, "이름": "New1"}), json!({"serialNo": 2, "name": "New2"})];
        svc.import(ImportMode::Append, rows).unwrap();

        assert_eq!(
            names_and_serials(&svc),
            vec![
                ("Old1".to_string(), 1),
                ("Old3".to_string(), 3),
                ("New1".to_string(), 4),
                ("New2".to_string(), 5),
            ]
        );
    }

    #[test]
    fn replace_numbers_rows_from_one_in_input_order() {
        let (svc, _dir) = make_service();
        for name in ["Old1", "Old2", "Old3"] {
            svc.create(&json!({"name": name})).unwrap();
        }

        let rows = vec![
            json!({"이름": "Zed", "일련번호": 40}),
            json!({"이름": "Amy"}),
            json!({"이름": ""}),
            json!({"이름": "Bob"}),
        ];
        let tally = svc.import(ImportMode::Replace, rows).unwrap();
        assert_eq!(tally, ImportTally { total: 4, inserted: 3, errors: 1 });

        assert_eq!(
            names_and_serials(&svc),
            vec![("Zed".to_string(), 1), ("Amy".to_string(), 2), ("Bob".to_string(), 3)]
        );
    }

    #[test]
    fn replace_with_only_bad_rows_clears_collection() {
        let (svc, _dir) = make_service();
        svc.create(&json!({"name": "Old"})).unwrap();

        let tally = svc.import(ImportMode::Replace, vec![json!({"name": " "})]).unwrap();
        assert_eq!(tally, ImportTally { total: 1, inserted: 0, errors: 1 });
        assert!(names_and_serials(&svc).is_empty());
    }

    #[test]
    fn create_after_replace_continues_sequence() {
        let (svc, _dir) = make_service();
        let rows: Vec<_> = (0..25).map(|i| json!({"name": format!("C{i}")})).collect();
        let tally = svc.import(ImportMode::Replace, rows).unwrap();
        assert_eq!(tally.inserted, 25);

        let next = svc.create(&json!({"name": "Next"})).unwrap();
        assert_eq!(next.serial_no, 26);
    }

    #[test]
    fn append_counts_store_failure_and_continues() {
        let (store, _dir) = FailingStore::open();
        store.fail_set_call(2);
        let svc = make_service_on(store);

        let rows = vec![json!({"name": "A"}), json!({"name": "B"}), json!({"name": "C"})];
        let tally = svc.import(ImportMode::Append, rows).unwrap();
        assert_eq!(tally, ImportTally { total: 3, inserted: 2, errors: 1 });

        // The failed row does not use up a serial number.
        assert_eq!(names_and_serials(&svc), vec![("A".to_string(), 1), ("C".to_string(), 2)]);
    }

    #[test]
    fn failed_replace_keeps_previous_records() {
        let (store, _dir) = FailingStore::open();
        let svc = make_service_on(store.clone());
        svc.create(&json!({"name": "Old"})).unwrap();

        store.fail_replace();
        let err = svc
            .import(ImportMode::Replace, vec![json!({"name": "New1"}), json!({"name": "New2"})])
            .unwrap_err();
        assert!(matches!(err, ServiceError::Storage(_)));
        assert_eq!(names_and_serials(&svc), vec![("Old".to_string(), 1)]);
    }
}
