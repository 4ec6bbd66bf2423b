//! CSV export of analysis results.

mod national;
mod replenishment;

pub use national::*;
pub use replenishment::*;

use thiserror::Error;

/// Export errors.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Export is missing column '{0}'")]
    MissingColumn(String),

    #[error("Line {line}: invalid value '{value}' in column '{column}'")]
    InvalidCell {
        line: usize,
        column: String,
        value: String,
    },
}

pub type ExportResult<T> = Result<T, ExportError>;

/// Finish a writer over an in-memory buffer and return its text.
fn into_string(writer: csv::Writer<Vec<u8>>) -> ExportResult<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}
