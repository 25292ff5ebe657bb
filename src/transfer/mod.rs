//! Bulk import and export of books.
//!
//! CSV import takes six columns (name, author, publishedYear, isbn, genre,
//! description) after a discarded header row. CSV export writes nine columns,
//! adding id and the two audit timestamps, so an export cannot be fed back
//! through CSV import. JSON carries every field both ways.

mod csv_format;
mod json_format;

pub use csv_format::{read_books_csv, write_books_csv, CSV_EXPORT_HEADER, CSV_IMPORT_COLUMNS};
pub use json_format::{read_books_json, write_books_json};

use crate::catalog_store::{Book, BookRecord};
use std::fmt;
use std::io;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Parse error at line {line}: {message}")]
    Parse { line: u64, message: String },

    #[error("Invalid JSON: {0}")]
    Json(serde_json::Error),

    #[error("Invalid CSV: {0}")]
    Csv(csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl TransferError {
    /// Whether the error comes from malformed input rather than the
    /// environment.
    pub fn is_input_error(&self) -> bool {
        !matches!(self, TransferError::Io(_))
    }
}

impl From<serde_json::Error> for TransferError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            TransferError::Io(err.into())
        } else {
            TransferError::Json(err)
        }
    }
}

impl From<csv::Error> for TransferError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            TransferError::Io(err.into())
        } else {
            TransferError::Csv(err)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferFormat {
    Csv,
    Json,
}

impl TransferFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferFormat::Csv => "csv",
            TransferFormat::Json => "json",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            TransferFormat::Csv => "text/csv; charset=utf-8",
            TransferFormat::Json => "application/json",
        }
    }
}

impl fmt::Display for TransferFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("Unsupported format '{0}', expected 'csv' or 'json'")]
pub struct UnknownFormat(pub String);

impl FromStr for TransferFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(TransferFormat::Csv),
            "json" => Ok(TransferFormat::Json),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

/// Decode an import payload into book records.
pub fn parse_books<R: io::Read>(
    format: TransferFormat,
    input: R,
) -> Result<Vec<BookRecord>, TransferError> {
    match format {
        TransferFormat::Csv => Ok(read_books_csv(input)?
            .into_iter()
            .map(BookRecord::from)
            .collect()),
        TransferFormat::Json => read_books_json(input),
    }
}

/// Encode books for export.
pub fn render_books<W: io::Write>(
    format: TransferFormat,
    books: &[Book],
    output: W,
) -> Result<(), TransferError> {
    match format {
        TransferFormat::Csv => write_books_csv(books, output),
        TransferFormat::Json => write_books_json(books, output),
    }
}
