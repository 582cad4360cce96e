use std::path::Path;

use customer::model::SERIAL_HEADER;
use customer::{Customer, FIELDS};
use rust_xlsxwriter::{Format, Workbook};

use crate::error::SheetError;

const SHEET_NAME: &str = "Customers";

/// Write customers to an `.xlsx` file. The first column is the serial
/// number, followed by every field under its spreadsheet header.
pub fn write_customers(path: &Path, customers: &[Customer]) -> Result<(), SheetError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    let bold = Format::new().set_bold();
    sheet.write_string_with_format(0, 0, SERIAL_HEADER, &bold)?;
    for (col, spec) in FIELDS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16 + 1, spec.header, &bold)?;
    }
    sheet.set_freeze_panes(1, 0)?;

    for (idx, customer) in customers.iter().enumerate() {
        let row = idx as u32 + 1;
        sheet.write_number(row, 0, customer.serial_no as f64)?;
        for (col, spec) in FIELDS.iter().enumerate() {
            if let Some(value) = customer.text(spec.name).filter(|v| !v.is_empty()) {
                sheet.write_string(row, col as u16 + 1, value)?;
            }
        }
    }

    workbook.save(path)?;
    tracing::info!(path = %path.display(), rows = customers.len(), "wrote customer export");
    Ok(())
}
