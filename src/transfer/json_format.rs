use super::TransferError;
use crate::catalog_store::{Book, BookRecord};
use std::io;

/// Read a JSON array of book records.
pub fn read_books_json<R: io::Read>(input: R) -> Result<Vec<BookRecord>, TransferError> {
    let records: Vec<BookRecord> = serde_json::from_reader(io::BufReader::new(input))?;
    Ok(records)
}

/// Write books as a pretty-printed JSON array, every field in declaration
/// order.
pub fn write_books_json<W: io::Write>(books: &[Book], output: W) -> Result<(), TransferError> {
    let mut writer = io::BufWriter::new(output);
    serde_json::to_writer_pretty(&mut writer, books)?;
    io::Write::flush(&mut writer)?;
    Ok(())
}
