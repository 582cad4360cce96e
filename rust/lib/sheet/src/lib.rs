//! Spreadsheet conversion for customer import and export.
//!
//! Reading turns the first sheet of a workbook (or a CSV file) into JSON row
//! objects keyed by the header row, ready for `POST /api/customers/{replace,add}`.
//! Writing produces an `.xlsx` file whose header row uses the same column
//! names, so an export can be imported again unchanged.

mod error;
mod read;
mod write;

pub use error::SheetError;
pub use read::{Row, apply_import_defaults, read_rows};
pub use write::write_customers;
