use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use chrono::{Duration, NaiveDate};
use serde_json::{Map, Value};

use crate::error::SheetError;

/// One spreadsheet row: header name to cell value. Empty cells are absent.
pub type Row = Map<String, Value>;

/// Columns the import form always sends, as (header, field name) pairs.
const DEFAULT_EMPTY: &[(&str, &str)] = &[("업그레이드일시", "upgradedAt"), ("만난날짜", "metAt")];

/// Read the rows of a spreadsheet. Dispatches on the file extension:
/// `.csv` via the csv reader, `.xlsx`/`.xlsm`/`.xls`/`.ods` via calamine.
pub fn read_rows(path: &Path) -> Result<Vec<Row>, SheetError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let rows = match ext.as_str() {
        "csv" => read_csv(path)?,
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => read_workbook(path)?,
        _ => return Err(SheetError::UnsupportedFormat(path.display().to_string())),
    };
    tracing::debug!(path = %path.display(), rows = rows.len(), "read spreadsheet");
    Ok(rows)
}

/// Fill the date columns the import form always sent with `""` when a row
/// has no value for them under either name.
pub fn apply_import_defaults(rows: &mut [Row]) {
    for row in rows {
        for (header, field) in DEFAULT_EMPTY {
            if !row.contains_key(*header) && !row.contains_key(*field) {
                row.insert((*header).to_string(), Value::String(String::new()));
            }
        }
    }
}

fn read_workbook(path: &Path) -> Result<Vec<Row>, SheetError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| SheetError::Workbook(e.to_string()))?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(SheetError::NoSheets)?;
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| SheetError::Workbook(e.to_string()))?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };
    let header: Vec<Option<String>> = header.iter().map(header_name).collect();

    Ok(rows
        .map(|cells| {
            header
                .iter()
                .zip(cells)
                .filter_map(|(name, cell)| Some((name.clone()?, cell_value(cell)?)))
                .collect::<Row>()
        })
        .filter(|row| !row.is_empty())
        .collect())
}

fn read_csv(path: &Path) -> Result<Vec<Row>, SheetError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let header: Vec<Option<String>> = reader
        .headers()?
        .iter()
        .map(|h| Some(h.trim().trim_start_matches('\u{feff}').to_string()).filter(|h| !h.is_empty()))
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Row = header
            .iter()
            .zip(record.iter())
            .filter_map(|(name, field)| {
                let name = name.clone()?;
                (!field.is_empty()).then(|| (name, Value::String(field.to_string())))
            })
            .collect();
        if !row.is_empty() {
            rows.push(row);
        }
    }
    Ok(rows)
}

fn header_name(cell: &Data) -> Option<String> {
    match cell_value(cell)? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        other => Some(other.to_string()),
    }
}

/// Convert a cell the way a browser-side sheet parser would: text as text,
/// whole numbers as integers, dates as `yyyy-mm-dd`.
fn cell_value(cell: &Data) -> Option<Value> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) => Some(Value::String(s.clone())),
        Data::Int(i) => Some(Value::from(*i)),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Some(Value::from(*f as i64)),
        Data::Float(f) => Some(Value::from(*f)),
        Data::Bool(b) => Some(Value::Bool(*b)),
        Data::DateTime(dt) => excel_date(dt.as_f64()).map(Value::String),
        Data::DateTimeIso(s) => Some(Value::String(s.chars().take(10).collect())),
        Data::DurationIso(s) => Some(Value::String(s.clone())),
    }
}

/// Excel serial day number (1900 date system) to `yyyy-mm-dd`.
fn excel_date(serial: f64) -> Option<String> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    let date = epoch.checked_add_signed(Duration::days(serial.floor() as i64))?;
    Some(date.format("%Y-%m-%d").to_string())
}
