use std::collections::BTreeMap;

use opencrm_core::{new_id, now_rfc3339};
use opencrm_store::KvRecord;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Longest accepted value for the free-text memo fields, in characters.
pub const MEMO_MAX_CHARS: usize = 100_000;

/// One column of the customer record.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Wire name (camelCase).
    pub name: &'static str,
    /// Spreadsheet column header; accepted as an alias on input.
    pub header: &'static str,
    pub max_chars: Option<usize>,
}

const fn field(name: &'static str, header: &'static str) -> FieldSpec {
    FieldSpec { name, header, max_chars: None }
}

const fn memo(name: &'static str, header: &'static str) -> FieldSpec {
    FieldSpec { name, header, max_chars: Some(MEMO_MAX_CHARS) }
}

/// Every user-editable customer field, in spreadsheet column order.
pub const FIELDS: &[FieldSpec] = &[
    field("name", "이름"),
    field("title", "직책"),
    field("company", "회사"),
    field("affiliation", "소속"),
    field("affiliation2", "소속2"),
    field("category", "분류"),
    field("assistant", "보조"),
    field("tel", "Tel"),
    field("mobile", "Mobile"),
    field("email", "E-Mail"),
    field("fax", "Fax"),
    field("workAddress", "직장주소"),
    field("installedMachines", "납품기계보유현황"),
    field("upgradedAt", "업그레이드일시"),
    memo("personalMemo", "인물메모"),
    memo("relationshipLog", "교제기록"),
    field("metAt", "만난날짜"),
    field("materialsReceived", "자료수신여부"),
    field("documentsSent", "문서발송"),
    field("researchField", "연구전문분류"),
    field("customerCode", "고객분류번호"),
    field("grade", "고객등급"),
    field("field", "분야"),
    field("homeAddress", "집주소"),
];

/// Column header of the display identifier.
pub const SERIAL_HEADER: &str = "일련번호";

/// Fields matched by the list search box.
pub const SEARCH_FIELDS: &[&str] = &["name", "company", "affiliation", "affiliation2", "mobile"];

/// Look up a field by wire name or spreadsheet header.
pub fn field_spec(key: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|f| f.name == key || f.header == key)
}

/// Why a single customer row was rejected.
#[derive(Debug, Error, PartialEq)]
pub enum RowError {
    #[error("row is not an object")]
    NotAnObject,

    #[error("name is required")]
    MissingName,

    #[error("field '{0}' must be a scalar value")]
    InvalidField(&'static str),

    #[error("field '{field}' exceeds {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("store: {0}")]
    Store(String),
}

/// A customer contact record.
///
/// `id` is the storage key; `serial_no` is the human-facing sequence number
/// handed out by the allocator. All other columns live in `fields`, keyed by
/// wire name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub serial_no: u64,

    pub name: String,

    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,

    #[serde(default)]
    pub created_at: String,

    #[serde(default)]
    pub updated_at: String,
}

impl Customer {
    /// Build a customer from a raw row object (wire names or sheet headers).
    ///
    /// Any supplied serial number or id is ignored.
    pub fn from_row(row: &Value) -> Result<Self, RowError> {
        let obj = row.as_object().ok_or(RowError::NotAnObject)?;
        Self::from_fields(normalize(obj, false)?)
    }

    /// Build a customer from an already normalized field map.
    pub fn from_fields(fields: Map<String, Value>) -> Result<Self, RowError> {
        let customer: Customer = serde_json::from_value(Value::Object(fields))
            .map_err(|_| RowError::MissingName)?;
        customer.validate()?;
        Ok(customer)
    }

    pub fn validate(&self) -> Result<(), RowError> {
        if self.name.trim().is_empty() {
            return Err(RowError::MissingName);
        }
        Ok(())
    }

    /// Value of a field by wire name, as text. Used for search and sort.
    pub fn text(&self, name: &str) -> Option<&str> {
        match name {
            "id" => Some(&self.id),
            "name" => Some(&self.name),
            "createdAt" => Some(&self.created_at),
            "updatedAt" => Some(&self.updated_at),
            other => self.fields.get(other).map(String::as_str),
        }
    }

    /// Case-insensitive substring match over [`SEARCH_FIELDS`].
    /// `needle` must already be lower-cased.
    pub fn matches(&self, needle: &str) -> bool {
        SEARCH_FIELDS
            .iter()
            .filter_map(|f| self.text(f))
            .any(|v| v.to_lowercase().contains(needle))
    }
}

impl KvRecord for Customer {
    const RESOURCE: &'static str = "customer";

    fn kv_prefix() -> &'static str {
        "crm:customer:"
    }

    fn key_value(&self) -> String {
        self.id.clone()
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

/// Map an input object onto canonical field names with string values.
///
/// Numbers and booleans (as spreadsheets produce them) are stringified.
/// Unknown keys, the serial number and the storage id are dropped. `null`
/// is kept only when `keep_nulls` is set, so merge patches can clear fields.
pub fn normalize(obj: &Map<String, Value>, keep_nulls: bool) -> Result<Map<String, Value>, RowError> {
    let mut out = Map::new();
    for (key, value) in obj {
        let Some(spec) = field_spec(key) else {
            continue;
        };
        let text = match value {
            Value::Null if keep_nulls => {
                out.insert(spec.name.to_string(), Value::Null);
                continue;
            }
            Value::Null => continue,
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Array(_) | Value::Object(_) => return Err(RowError::InvalidField(spec.name)),
        };
        if let Some(max) = spec.max_chars {
            if text.chars().count() > max {
                return Err(RowError::TooLong { field: spec.name, max });
            }
        }
        out.insert(spec.name.to_string(), Value::String(text));
    }
    Ok(out)
}
