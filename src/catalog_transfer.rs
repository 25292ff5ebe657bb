//! Catalog Transfer Tool
//!
//! Imports books into, or exports books from, a catalog database without
//! going through the HTTP server.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use media_catalog_server::catalog_store::{
    Book, BookFilter, CatalogStore, ImportIdMode, SqliteCatalogStore,
};
use media_catalog_server::clock::SystemClock;
use media_catalog_server::transfer::{parse_books, render_books, TransferFormat};
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "catalog-transfer")]
#[command(about = "Bulk import and export of catalog books")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Insert every book in FILE into the database, all or nothing.
    Import {
        #[arg(long, value_enum)]
        format: TransferFormat,

        /// Keep the ids carried by a JSON file instead of assigning new ones.
        #[arg(long, default_value_t = false)]
        preserve_ids: bool,

        #[arg(value_name = "DB")]
        db: PathBuf,

        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Write every book in the database to stdout or to --output.
    Export {
        #[arg(long, value_enum)]
        format: TransferFormat,

        #[arg(value_name = "DB")]
        db: PathBuf,

        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

fn open_store(db: &Path) -> Result<SqliteCatalogStore> {
    SqliteCatalogStore::new(db, 1, Arc::new(SystemClock))
}

fn import(format: TransferFormat, preserve_ids: bool, db: &Path, file: &Path) -> Result<()> {
    let input =
        File::open(file).with_context(|| format!("Failed to open {}", file.display()))?;
    let records = parse_books(format, BufReader::new(input))
        .with_context(|| format!("Failed to read books from {}", file.display()))?;
    info!("Parsed {} records from {}", records.len(), file.display());

    let id_mode = if preserve_ids {
        ImportIdMode::Preserve
    } else {
        ImportIdMode::Regenerate
    };

    let store = open_store(db)?;
    let books = store
        .import_books(records, id_mode)
        .context("Import rejected, no books were written")?;
    info!("Imported {} books into {}", books.len(), db.display());
    Ok(())
}

/// Render into a temporary file next to `output`, then move it in place.
/// A failed export leaves `output` untouched.
fn export_to_file(format: TransferFormat, books: &[Book], output: &Path) -> Result<()> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    render_books(format, books, &mut tmp)?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(())
}

fn export(format: TransferFormat, db: &Path, output: Option<&Path>) -> Result<()> {
    let store = open_store(db)?;
    let books = store.find_books(&BookFilter::default())?;

    match output {
        Some(path) => {
            export_to_file(format, &books, path)?;
            info!("Exported {} books to {}", books.len(), path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            render_books(format, &books, &mut handle)?;
            if format == TransferFormat::Json {
                writeln!(handle)?;
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let args = Args::parse();

    match args.command {
        Command::Import {
            format,
            preserve_ids,
            db,
            file,
        } => import(format, preserve_ids, &db, &file),
        Command::Export { format, db, output } => export(format, &db, output.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const CSV_INPUT: &str = "name,author,publishedYear,isbn,genre,description\n\
        Dune,Frank Herbert,1965,9780441013593,Science Fiction,Spice\n\
        Emma,Jane Austen,1815,9780141439587,Romance,Matchmaking\n";

    fn names(books: &[Book]) -> Vec<&str> {
        books.iter().map(|b| b.name.as_str()).collect()
    }

    #[test]
    fn import_then_export_to_file() {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("catalog.db");
        let input = dir.path().join("books.csv");
        let output = dir.path().join("books.json");
        fs::write(&input, CSV_INPUT).unwrap();

        import(TransferFormat::Csv, false, &db, &input).unwrap();
        export(TransferFormat::Json, &db, Some(&output)).unwrap();

        let exported: Vec<Book> = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(names(&exported), vec!["Dune", "Emma"]);
        assert_eq!(exported[1].isbn, "9780141439587");
    }

    #[test]
    fn exported_json_imports_into_fresh_catalog_with_ids() {
        let dir = TempDir::new().unwrap();
        let source_db = dir.path().join("source.db");
        let target_db = dir.path().join("target.db");
        let input = dir.path().join("books.csv");
        let exported = dir.path().join("books.json");
        fs::write(&input, CSV_INPUT).unwrap();

        import(TransferFormat::Csv, false, &source_db, &input).unwrap();
        export(TransferFormat::Json, &source_db, Some(&exported)).unwrap();
        import(TransferFormat::Json, true, &target_db, &exported).unwrap();

        let source = open_store(&source_db)
            .unwrap()
            .find_books(&BookFilter::default())
            .unwrap();
        let target = open_store(&target_db)
            .unwrap()
            .find_books(&BookFilter::default())
            .unwrap();
        assert_eq!(source, target);
    }

    #[test]
    fn rejected_import_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("catalog.db");
        let input = dir.path().join("books.csv");
        fs::write(
            &input,
            format!("{}Persuasion,Jane Austen,soon,9780141439686,Romance,Letters\n", CSV_INPUT),
        )
        .unwrap();

        assert!(import(TransferFormat::Csv, false, &db, &input).is_err());

        let books = open_store(&db)
            .unwrap()
            .find_books(&BookFilter::default())
            .unwrap();
        assert!(books.is_empty());
    }

    #[test]
    fn failed_import_of_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = import(
            TransferFormat::Csv,
            false,
            &dir.path().join("catalog.db"),
            &dir.path().join("missing.csv"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Failed to open"));
    }
}
