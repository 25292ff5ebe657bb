mod versioned_schema;

pub use versioned_schema::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, BASE_DB_VERSION,
};

use anyhow::{bail, Result};
use rusqlite::Connection;
use tracing::info;

/// Bring the database at `conn` up to the last schema in `schemas`.
///
/// An empty database gets the latest schema created directly. A database
/// stamped with an older version runs every later migration in one
/// transaction. The resulting layout is validated against the latest schema.
pub fn migrate_if_needed(conn: &mut Connection, schemas: &[VersionedSchema]) -> Result<()> {
    let Some(latest_schema) = schemas.last() else {
        bail!("No schema versions defined");
    };

    let table_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |r| r.get(0),
    )?;

    if table_count == 0 {
        info!("Creating db schema at version {}", latest_schema.version);
        latest_schema.create(conn)?;
        return Ok(());
    }

    let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    if db_version < BASE_DB_VERSION as i64 {
        bail!(
            "Database has user_version {}, which was not written by this server",
            db_version
        );
    }
    let mut current_version = (db_version - BASE_DB_VERSION as i64) as usize;
    if current_version > latest_schema.version {
        bail!(
            "Database schema version {} is newer than the latest known version {}",
            current_version,
            latest_schema.version
        );
    }

    if current_version < latest_schema.version {
        let start_version = current_version;
        let tx = conn.transaction()?;
        for schema in schemas.iter().filter(|s| s.version > start_version) {
            if let Some(migration) = schema.migration {
                info!(
                    "Migrating db from version {} to {}",
                    current_version, schema.version
                );
                migration(&tx)?;
            }
            current_version = schema.version;
        }
        tx.pragma_update(None, "user_version", BASE_DB_VERSION + current_version)?;
        tx.commit()?;
    }

    latest_schema.validate(conn)?;
    Ok(())
}
