use thiserror::Error;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("workbook: {0}")]
    Workbook(String),

    #[error("workbook has no sheets")]
    NoSheets,

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("xlsx: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}
