use super::TransferError;
use crate::catalog_store::{Book, BookFields};
use std::io;

/// Columns accepted by CSV import, in order. The header row itself is
/// skipped without being checked.
pub const CSV_IMPORT_COLUMNS: [&str; 6] = [
    "name",
    "author",
    "publishedYear",
    "isbn",
    "genre",
    "description",
];

pub const CSV_EXPORT_HEADER: [&str; 9] = [
    "id",
    "name",
    "author",
    "publishedYear",
    "isbn",
    "genre",
    "description",
    "addedOn",
    "updatedOn",
];

/// Parse every data row up front. Any bad row fails the whole read, so
/// nothing reaches the store from a partially valid file.
pub fn read_books_csv<R: io::Read>(input: R) -> Result<Vec<BookFields>, TransferError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let mut books = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        if record.len() != CSV_IMPORT_COLUMNS.len() {
            return Err(TransferError::Parse {
                line,
                message: format!(
                    "expected {} fields ({}), found {}",
                    CSV_IMPORT_COLUMNS.len(),
                    CSV_IMPORT_COLUMNS.join(", "),
                    record.len()
                ),
            });
        }

        let published_year = record[2].parse::<i32>().map_err(|_| TransferError::Parse {
            line,
            message: format!("publishedYear '{}' is not an integer", &record[2]),
        })?;

        books.push(BookFields {
            name: record[0].to_string(),
            author: record[1].to_string(),
            published_year,
            isbn: record[3].to_string(),
            genre: record[4].to_string(),
            description: record[5].to_string(),
        });
    }
    Ok(books)
}

/// Write the export header followed by one row per book. An empty slice
/// produces just the header.
pub fn write_books_csv<W: io::Write>(books: &[Book], output: W) -> Result<(), TransferError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(output);

    writer.write_record(CSV_EXPORT_HEADER)?;
    for book in books {
        writer.serialize(book)?;
    }
    writer.flush()?;
    Ok(())
}
