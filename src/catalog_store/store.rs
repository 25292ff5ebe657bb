//! SQLite-backed catalog store implementation.
//!
//! Writes go through a single connection; reads are spread round-robin over
//! a small pool of read-only connections on the same WAL database.

use super::error::{CatalogError, CatalogResult};
use super::models::*;
use super::rating::average_rating;
use super::schema::CATALOG_VERSIONED_SCHEMAS;
use super::trait_def::CatalogStore;
use super::validation::{
    validate_album, validate_audit_timestamps, validate_book, validate_new_review,
    validate_review, validate_song,
};
use crate::clock::{truncate_to_millis, SharedClock};
use crate::sqlite_persistence::migrate_if_needed;
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

const ALBUM_COLUMNS: &str = "id, title, artist, release_date, added_on, updated_on";
const BOOK_COLUMNS: &str =
    "id, name, author, published_year, isbn, genre, description, added_on, updated_on";
const SONG_COLUMNS: &str =
    "s.id, s.name, s.artist, s.released_on, s.duration, s.genre, s.description, s.added_on, s.updated_on";
const REVIEW_COLUMNS: &str = "id, review_type, title, author, review_full_text, review_description, \
     affiliation, review_rating, media_id, media_title, added_on, updated_on";

const RELEASE_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone)]
pub struct SqliteCatalogStore {
    read_pool: Vec<Arc<Mutex<Connection>>>,
    write_conn: Arc<Mutex<Connection>>,
    read_index: Arc<AtomicUsize>,
    clock: SharedClock,
}

fn lock(conn: &Mutex<Connection>) -> MutexGuard<'_, Connection> {
    conn.lock().unwrap_or_else(PoisonError::into_inner)
}

/// SQLite treats a negative LIMIT as no limit.
fn sql_limit(limit: Option<usize>) -> i64 {
    limit.map(|l| l as i64).unwrap_or(-1)
}

// =============================================================================
// Row Mapping
// =============================================================================

fn timestamp_at(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let millis: i64 = row.get(idx)?;
    DateTime::from_timestamp_millis(millis)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, millis))
}

fn date_at(row: &Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let text: String = row.get(idx)?;
    NaiveDate::parse_from_str(&text, RELEASE_DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn album_from_row(row: &Row) -> rusqlite::Result<Album> {
    Ok(Album {
        id: row.get(0)?,
        title: row.get(1)?,
        artist: row.get(2)?,
        release_date: date_at(row, 3)?,
        added_on: timestamp_at(row, 4)?,
        updated_on: timestamp_at(row, 5)?,
    })
}

fn book_from_row(row: &Row) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        name: row.get(1)?,
        author: row.get(2)?,
        published_year: row.get(3)?,
        isbn: row.get(4)?,
        genre: row.get(5)?,
        description: row.get(6)?,
        added_on: timestamp_at(row, 7)?,
        updated_on: timestamp_at(row, 8)?,
    })
}

fn song_from_row(row: &Row) -> rusqlite::Result<Song> {
    Ok(Song {
        id: row.get(0)?,
        name: row.get(1)?,
        artist: row.get(2)?,
        released_on: timestamp_at(row, 3)?,
        duration: row.get(4)?,
        genre: row.get(5)?,
        description: row.get(6)?,
        added_on: timestamp_at(row, 7)?,
        updated_on: timestamp_at(row, 8)?,
    })
}

fn review_from_row(row: &Row) -> rusqlite::Result<Review> {
    let review_type: String = row.get(1)?;
    let review_type = ReviewType::from_db_str(&review_type).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            Type::Text,
            format!("unknown review type '{}'", review_type).into(),
        )
    })?;
    Ok(Review {
        id: row.get(0)?,
        review_type,
        title: row.get(2)?,
        author: row.get(3)?,
        review_full_text: row.get(4)?,
        review_description: row.get(5)?,
        affiliation: row.get(6)?,
        review_rating: row.get(7)?,
        media_id: row.get(8)?,
        media_title: row.get(9)?,
        added_on: timestamp_at(row, 10)?,
        updated_on: timestamp_at(row, 11)?,
    })
}

fn query_list<T, P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
    map: fn(&Row) -> rusqlite::Result<T>,
) -> CatalogResult<Vec<T>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let rows = stmt
        .query_map(params, map)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn query_one<T, P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
    map: fn(&Row) -> rusqlite::Result<T>,
) -> CatalogResult<Option<T>> {
    let mut stmt = conn.prepare_cached(sql)?;
    Ok(stmt.query_row(params, map).optional()?)
}

/// "field 'value'" pairs for NotFound messages of multi-criteria lookups.
fn describe_criteria(criteria: &[(&str, Option<String>)]) -> String {
    criteria
        .iter()
        .filter_map(|(field, value)| value.as_ref().map(|v| format!("{} '{}'", field, v)))
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Entity Lookups (usable on both read and write connections)
// =============================================================================

fn require_album(conn: &Connection, id: i64) -> CatalogResult<Album> {
    query_one(
        conn,
        &format!("SELECT {} FROM albums WHERE id = ?1", ALBUM_COLUMNS),
        params![id],
        album_from_row,
    )?
    .ok_or_else(|| CatalogError::not_found("Album", id))
}

fn require_book(conn: &Connection, id: i64) -> CatalogResult<Book> {
    query_one(
        conn,
        &format!("SELECT {} FROM books WHERE id = ?1", BOOK_COLUMNS),
        params![id],
        book_from_row,
    )?
    .ok_or_else(|| CatalogError::not_found("Book", id))
}

fn require_book_by_isbn(conn: &Connection, isbn: &str) -> CatalogResult<Book> {
    query_one(
        conn,
        &format!("SELECT {} FROM books WHERE isbn = ?1", BOOK_COLUMNS),
        params![isbn],
        book_from_row,
    )?
    .ok_or_else(|| CatalogError::not_found_by("Book", "isbn", isbn))
}

fn require_song(conn: &Connection, id: i64) -> CatalogResult<Song> {
    query_one(
        conn,
        &format!("SELECT {} FROM songs s WHERE s.id = ?1", SONG_COLUMNS),
        params![id],
        song_from_row,
    )?
    .ok_or_else(|| CatalogError::not_found("Song", id))
}

fn require_review(conn: &Connection, id: i64) -> CatalogResult<Review> {
    query_one(
        conn,
        &format!("SELECT {} FROM reviews WHERE id = ?1", REVIEW_COLUMNS),
        params![id],
        review_from_row,
    )?
    .ok_or_else(|| CatalogError::not_found("Review", id))
}

fn row_exists(conn: &Connection, table: &str, id: i64) -> CatalogResult<bool> {
    let found = conn
        .prepare_cached(&format!("SELECT 1 FROM {} WHERE id = ?1", table))?
        .query_row(params![id], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

/// Fails with NotFound unless the review's target media exists.
fn require_media(conn: &Connection, review_type: ReviewType, media_id: i64) -> CatalogResult<()> {
    let (table, entity) = match review_type {
        ReviewType::Book => ("books", "Book"),
        ReviewType::Song => ("songs", "Song"),
    };
    if row_exists(conn, table, media_id)? {
        Ok(())
    } else {
        Err(CatalogError::not_found(entity, media_id))
    }
}

fn album_songs(conn: &Connection, album_id: i64) -> CatalogResult<Vec<Song>> {
    query_list(
        conn,
        &format!(
            "SELECT {} FROM album_songs l
             INNER JOIN songs s ON s.id = l.song_id
             WHERE l.album_id = ?1
             ORDER BY l.position",
            SONG_COLUMNS
        ),
        params![album_id],
        song_from_row,
    )
}

fn resolve_album(conn: &Connection, album: Album) -> CatalogResult<ResolvedAlbum> {
    let songs = album_songs(conn, album.id)?;
    Ok(ResolvedAlbum { album, songs })
}

fn media_reviews(
    conn: &Connection,
    review_type: ReviewType,
    media_id: i64,
) -> CatalogResult<Vec<Review>> {
    query_list(
        conn,
        &format!(
            "SELECT {} FROM reviews WHERE review_type = ?1 AND media_id = ?2 ORDER BY id",
            REVIEW_COLUMNS
        ),
        params![review_type.to_db_str(), media_id],
        review_from_row,
    )
}

fn media_ratings(
    conn: &Connection,
    review_type: ReviewType,
    media_id: i64,
) -> CatalogResult<Vec<i32>> {
    query_list(
        conn,
        "SELECT review_rating FROM reviews WHERE review_type = ?1 AND media_id = ?2",
        params![review_type.to_db_str(), media_id],
        |r| r.get(0),
    )
}

fn count_rows(conn: &Connection, table: &str) -> CatalogResult<usize> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| {
        r.get(0)
    })?;
    Ok(count as usize)
}

// =============================================================================
// Row Writes
// =============================================================================

fn write_book_fields(
    conn: &Connection,
    existing: &Book,
    fields: BookFields,
    now: DateTime<Utc>,
) -> CatalogResult<Book> {
    conn.execute(
        "UPDATE books SET name = ?1, author = ?2, published_year = ?3, isbn = ?4, genre = ?5,
         description = ?6, updated_on = ?7 WHERE id = ?8",
        params![
            fields.name,
            fields.author,
            fields.published_year,
            fields.isbn,
            fields.genre,
            fields.description,
            now.timestamp_millis(),
            existing.id
        ],
    )?;
    Ok(Book {
        id: existing.id,
        name: fields.name,
        author: fields.author,
        published_year: fields.published_year,
        isbn: fields.isbn,
        genre: fields.genre,
        description: fields.description,
        added_on: existing.added_on,
        updated_on: now,
    })
}

fn touch_album(conn: &Connection, album_id: i64, now: DateTime<Utc>) -> CatalogResult<()> {
    conn.execute(
        "UPDATE albums SET updated_on = ?1 WHERE id = ?2",
        params![now.timestamp_millis(), album_id],
    )?;
    Ok(())
}

impl SqliteCatalogStore {
    /// Open (creating if needed) the catalog database at `db_path`.
    ///
    /// # Arguments
    /// * `db_path` - Path to the SQLite database file
    /// * `read_pool_size` - Number of read-only connections (at least one is opened)
    /// * `clock` - Source of audit timestamps
    pub fn new<P: AsRef<Path>>(
        db_path: P,
        read_pool_size: usize,
        clock: SharedClock,
    ) -> Result<Self> {
        let db_path = db_path.as_ref();

        let mut write_conn = Connection::open_with_flags(
            db_path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open catalog database {}", db_path.display()))?;

        migrate_if_needed(&mut write_conn, CATALOG_VERSIONED_SCHEMAS)
            .context("Failed to prepare catalog schema")?;

        write_conn.pragma_update(None, "journal_mode", "WAL")?;
        write_conn.pragma_update(None, "foreign_keys", "ON")?;

        let mut read_pool = Vec::with_capacity(read_pool_size.max(1));
        for _ in 0..read_pool_size.max(1) {
            let read_conn = Connection::open_with_flags(
                db_path,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                    | rusqlite::OpenFlags::SQLITE_OPEN_URI
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            read_pool.push(Arc::new(Mutex::new(read_conn)));
        }

        let store = SqliteCatalogStore {
            read_pool,
            write_conn: Arc::new(Mutex::new(write_conn)),
            read_index: Arc::new(AtomicUsize::new(0)),
            clock,
        };

        let counts = store.get_counts()?;
        info!(
            "Opened catalog {}: {} albums, {} books, {} songs, {} reviews",
            db_path.display(),
            counts.albums,
            counts.books,
            counts.songs,
            counts.reviews
        );

        Ok(store)
    }

    fn with_read_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> CatalogResult<T>,
    ) -> CatalogResult<T> {
        let index = self.read_index.fetch_add(1, Ordering::Relaxed) % self.read_pool.len();
        let conn = lock(&self.read_pool[index]);
        f(&conn)
    }

    /// Run `f` inside `BEGIN IMMEDIATE ... COMMIT` on the write connection,
    /// rolling back when it fails.
    fn write_transaction<T>(
        &self,
        f: impl FnOnce(&Connection) -> CatalogResult<T>,
    ) -> CatalogResult<T> {
        let conn = lock(&self.write_conn);
        conn.execute("BEGIN IMMEDIATE", [])?;

        match f(&conn) {
            Ok(value) => {
                if let Err(e) = conn.execute("COMMIT", []) {
                    let _ = conn.execute("ROLLBACK", []);
                    return Err(e.into());
                }
                Ok(value)
            }
            Err(e) => {
                let _ = conn.execute("ROLLBACK", []);
                Err(e)
            }
        }
    }

    fn delete_by_id(&self, table: &str, entity: &'static str, id: i64) -> CatalogResult<()> {
        let conn = lock(&self.write_conn);
        let deleted = conn.execute(&format!("DELETE FROM {} WHERE id = ?1", table), params![id])?;
        if deleted == 0 {
            return Err(CatalogError::not_found(entity, id));
        }
        debug!("Deleted {} {}", entity, id);
        Ok(())
    }
}

impl CatalogStore for SqliteCatalogStore {
    // =========================================================================
    // Albums
    // =========================================================================

    fn create_album(&self, fields: AlbumFields) -> CatalogResult<Album> {
        validate_album(&fields)?;
        let now = self.clock.now();

        let conn = lock(&self.write_conn);
        conn.execute(
            "INSERT INTO albums (title, artist, release_date, added_on, updated_on)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![
                fields.title,
                fields.artist,
                fields.release_date.format(RELEASE_DATE_FORMAT).to_string(),
                now.timestamp_millis()
            ],
        )?;

        Ok(Album {
            id: conn.last_insert_rowid(),
            title: fields.title,
            artist: fields.artist,
            release_date: fields.release_date,
            added_on: now,
            updated_on: now,
        })
    }

    fn get_album(&self, id: i64) -> CatalogResult<ResolvedAlbum> {
        self.with_read_conn(|conn| {
            let album = require_album(conn, id)?;
            resolve_album(conn, album)
        })
    }

    fn find_albums(&self, filter: &AlbumFilter) -> CatalogResult<Vec<ResolvedAlbum>> {
        self.with_read_conn(|conn| {
            let mut albums = if let Some(id) = filter.id {
                vec![require_album(conn, id)?]
            } else if let Some(title) = &filter.title {
                let found = query_list(
                    conn,
                    &format!(
                        "SELECT {} FROM albums WHERE title = ?1 ORDER BY id",
                        ALBUM_COLUMNS
                    ),
                    params![title],
                    album_from_row,
                )?;
                if found.is_empty() {
                    return Err(CatalogError::not_found_by("Album", "title", title));
                }
                found
            } else if let Some(artist) = &filter.artist {
                let found = query_list(
                    conn,
                    &format!(
                        "SELECT {} FROM albums WHERE artist = ?1 ORDER BY id",
                        ALBUM_COLUMNS
                    ),
                    params![artist],
                    album_from_row,
                )?;
                if found.is_empty() {
                    return Err(CatalogError::not_found_by("Album", "artist", artist));
                }
                found
            } else {
                query_list(
                    conn,
                    &format!("SELECT {} FROM albums ORDER BY id LIMIT ?1", ALBUM_COLUMNS),
                    params![sql_limit(filter.limit)],
                    album_from_row,
                )?
            };

            if let Some(limit) = filter.limit {
                albums.truncate(limit);
            }
            albums
                .into_iter()
                .map(|album| resolve_album(conn, album))
                .collect()
        })
    }

    fn update_album(&self, id: i64, fields: AlbumFields) -> CatalogResult<Album> {
        validate_album(&fields)?;
        let now = self.clock.now();

        self.write_transaction(|conn| {
            let existing = require_album(conn, id)?;
            conn.execute(
                "UPDATE albums SET title = ?1, artist = ?2, release_date = ?3, updated_on = ?4
                 WHERE id = ?5",
                params![
                    fields.title,
                    fields.artist,
                    fields.release_date.format(RELEASE_DATE_FORMAT).to_string(),
                    now.timestamp_millis(),
                    id
                ],
            )?;
            Ok(Album {
                id,
                title: fields.title,
                artist: fields.artist,
                release_date: fields.release_date,
                added_on: existing.added_on,
                updated_on: now,
            })
        })
    }

    fn delete_album(&self, id: i64) -> CatalogResult<()> {
        self.delete_by_id("albums", "Album", id)
    }

    fn attach_songs(&self, album_id: i64, song_ids: &[i64]) -> CatalogResult<ResolvedAlbum> {
        let now = self.clock.now();

        self.write_transaction(|conn| {
            require_album(conn, album_id)?;

            let mut position: i64 = conn.query_row(
                "SELECT COALESCE(MAX(position) + 1, 0) FROM album_songs WHERE album_id = ?1",
                params![album_id],
                |r| r.get(0),
            )?;

            let mut attached = 0;
            for song_id in song_ids {
                if !row_exists(conn, "songs", *song_id)? {
                    debug!("Dropping unknown song {} for album {}", song_id, album_id);
                    continue;
                }
                conn.execute(
                    "INSERT INTO album_songs (album_id, song_id, position) VALUES (?1, ?2, ?3)",
                    params![album_id, song_id, position],
                )?;
                position += 1;
                attached += 1;
            }

            if attached > 0 {
                touch_album(conn, album_id, now)?;
            }
            debug!(
                "Attached {} of {} songs to album {}",
                attached,
                song_ids.len(),
                album_id
            );

            let album = require_album(conn, album_id)?;
            resolve_album(conn, album)
        })
    }

    fn detach_songs(&self, album_id: i64, song_ids: &[i64]) -> CatalogResult<()> {
        let now = self.clock.now();

        self.write_transaction(|conn| {
            require_album(conn, album_id)?;

            // One link per requested id, earliest position first.
            let mut removed = 0;
            for song_id in song_ids {
                removed += conn.execute(
                    "DELETE FROM album_songs WHERE rowid = (
                         SELECT rowid FROM album_songs
                         WHERE album_id = ?1 AND song_id = ?2
                         ORDER BY position LIMIT 1)",
                    params![album_id, song_id],
                )?;
            }

            if removed > 0 {
                touch_album(conn, album_id, now)?;
            }
            debug!("Detached {} links from album {}", removed, album_id);
            Ok(())
        })
    }

    fn get_album_rating(&self, id: i64) -> CatalogResult<f64> {
        self.with_read_conn(|conn| {
            require_album(conn, id)?;
            let ratings: Vec<i32> = query_list(
                conn,
                "SELECT r.review_rating FROM album_songs l
                 INNER JOIN songs s ON s.id = l.song_id
                 INNER JOIN reviews r ON r.review_type = 'SONG' AND r.media_id = s.id
                 WHERE l.album_id = ?1",
                params![id],
                |r| r.get(0),
            )?;
            Ok(average_rating(&ratings))
        })
    }

    // =========================================================================
    // Books
    // =========================================================================

    fn create_book(&self, fields: BookFields) -> CatalogResult<Book> {
        validate_book(&fields)?;
        let now = self.clock.now();

        let conn = lock(&self.write_conn);
        conn.execute(
            "INSERT INTO books (name, author, published_year, isbn, genre, description, added_on, updated_on)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                fields.name,
                fields.author,
                fields.published_year,
                fields.isbn,
                fields.genre,
                fields.description,
                now.timestamp_millis()
            ],
        )?;

        Ok(Book {
            id: conn.last_insert_rowid(),
            name: fields.name,
            author: fields.author,
            published_year: fields.published_year,
            isbn: fields.isbn,
            genre: fields.genre,
            description: fields.description,
            added_on: now,
            updated_on: now,
        })
    }

    fn get_book(&self, id: i64) -> CatalogResult<Book> {
        self.with_read_conn(|conn| require_book(conn, id))
    }

    fn find_books(&self, filter: &BookFilter) -> CatalogResult<Vec<Book>> {
        self.with_read_conn(|conn| {
            if filter.is_unfiltered() {
                return query_list(
                    conn,
                    &format!("SELECT {} FROM books ORDER BY id LIMIT ?1", BOOK_COLUMNS),
                    params![sql_limit(filter.limit)],
                    book_from_row,
                );
            }

            let mut books = Vec::new();
            if let Some(id) = filter.id {
                books.push(require_book(conn, id)?);
            }
            if let Some(title) = &filter.title {
                let latest = query_one(
                    conn,
                    &format!(
                        "SELECT {} FROM books WHERE name = ?1 ORDER BY added_on DESC, id DESC LIMIT 1",
                        BOOK_COLUMNS
                    ),
                    params![title],
                    book_from_row,
                )?
                .ok_or_else(|| CatalogError::not_found_by("Book", "title", title))?;
                books.push(latest);
            }
            if let Some(isbn) = &filter.isbn {
                books.push(require_book_by_isbn(conn, isbn)?);
            }
            if let Some(author) = &filter.author {
                books.extend(query_list(
                    conn,
                    &format!("SELECT {} FROM books WHERE author = ?1 ORDER BY id", BOOK_COLUMNS),
                    params![author],
                    book_from_row,
                )?);
            }
            if let Some(genre) = &filter.genre {
                books.extend(query_list(
                    conn,
                    &format!("SELECT {} FROM books WHERE genre = ?1 ORDER BY id", BOOK_COLUMNS),
                    params![genre],
                    book_from_row,
                )?);
            }

            let mut seen = HashSet::new();
            books.retain(|book| seen.insert(book.id));

            if books.is_empty() {
                return Err(CatalogError::NotFound {
                    entity: "Book",
                    key: describe_criteria(&[
                        ("author", filter.author.clone()),
                        ("genre", filter.genre.clone()),
                    ]),
                });
            }
            if let Some(limit) = filter.limit {
                books.truncate(limit);
            }
            Ok(books)
        })
    }

    fn update_book(&self, id: i64, fields: BookFields) -> CatalogResult<Book> {
        validate_book(&fields)?;
        let now = self.clock.now();

        self.write_transaction(|conn| {
            let existing = require_book(conn, id)?;
            write_book_fields(conn, &existing, fields, now)
        })
    }

    fn update_book_by_isbn(&self, isbn: &str, fields: BookFields) -> CatalogResult<Book> {
        validate_book(&fields)?;
        let now = self.clock.now();

        self.write_transaction(|conn| {
            let existing = require_book_by_isbn(conn, isbn)?;
            write_book_fields(conn, &existing, fields, now)
        })
    }

    fn delete_book(&self, id: i64) -> CatalogResult<()> {
        self.delete_by_id("books", "Book", id)
    }

    fn delete_book_by_isbn(&self, isbn: &str) -> CatalogResult<()> {
        let conn = lock(&self.write_conn);
        let deleted = conn.execute("DELETE FROM books WHERE isbn = ?1", params![isbn])?;
        if deleted == 0 {
            return Err(CatalogError::not_found_by("Book", "isbn", isbn));
        }
        Ok(())
    }

    fn get_book_reviews(&self, id: i64) -> CatalogResult<Vec<Review>> {
        self.with_read_conn(|conn| {
            require_book(conn, id)?;
            media_reviews(conn, ReviewType::Book, id)
        })
    }

    fn get_book_rating(&self, id: i64) -> CatalogResult<f64> {
        self.with_read_conn(|conn| {
            require_book(conn, id)?;
            Ok(average_rating(&media_ratings(conn, ReviewType::Book, id)?))
        })
    }

    fn import_books(
        &self,
        records: Vec<BookRecord>,
        id_mode: ImportIdMode,
    ) -> CatalogResult<Vec<Book>> {
        let now = self.clock.now();

        let mut rows = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            let added_on = record.added_on.map(truncate_to_millis).unwrap_or(now);
            let updated_on = record.updated_on.map(truncate_to_millis).unwrap_or(added_on);
            let checked = validate_book(&record.fields)
                .and_then(|_| validate_audit_timestamps(added_on, updated_on));
            if let Err(e) = checked {
                warn!("Rejecting import batch, record {} is invalid: {}", index, e);
                return Err(e.into());
            }
            let id = match id_mode {
                ImportIdMode::Preserve => record.id,
                ImportIdMode::Regenerate => None,
            };
            rows.push((id, record.fields, added_on, updated_on));
        }

        let imported = self.write_transaction(|conn| {
            let mut imported = Vec::with_capacity(rows.len());
            for (id, fields, added_on, updated_on) in rows {
                conn.execute(
                    "INSERT INTO books (id, name, author, published_year, isbn, genre, description, added_on, updated_on)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    params![
                        id,
                        fields.name,
                        fields.author,
                        fields.published_year,
                        fields.isbn,
                        fields.genre,
                        fields.description,
                        added_on.timestamp_millis(),
                        updated_on.timestamp_millis()
                    ],
                )?;

                imported.push(Book {
                    id: conn.last_insert_rowid(),
                    name: fields.name,
                    author: fields.author,
                    published_year: fields.published_year,
                    isbn: fields.isbn,
                    genre: fields.genre,
                    description: fields.description,
                    added_on,
                    updated_on,
                });
            }
            Ok(imported)
        })?;

        info!("Imported {} books ({:?} ids)", imported.len(), id_mode);
        Ok(imported)
    }

    // =========================================================================
    // Songs
    // =========================================================================

    fn create_song(&self, fields: SongFields) -> CatalogResult<Song> {
        validate_song(&fields)?;
        let now = self.clock.now();

        let conn = lock(&self.write_conn);
        conn.execute(
            "INSERT INTO songs (name, artist, released_on, duration, genre, description, added_on, updated_on)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                fields.name,
                fields.artist,
                fields.released_on.timestamp_millis(),
                fields.duration,
                fields.genre,
                fields.description,
                now.timestamp_millis()
            ],
        )?;

        Ok(Song {
            id: conn.last_insert_rowid(),
            name: fields.name,
            artist: fields.artist,
            released_on: fields.released_on,
            duration: fields.duration,
            genre: fields.genre,
            description: fields.description,
            added_on: now,
            updated_on: now,
        })
    }

    fn get_song(&self, id: i64) -> CatalogResult<Song> {
        self.with_read_conn(|conn| require_song(conn, id))
    }

    fn find_songs(&self, filter: &SongFilter) -> CatalogResult<Vec<Song>> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(id) = filter.id {
            clauses.push("s.id = ?");
            values.push(Value::Integer(id));
        }
        if let Some(artist) = &filter.artist {
            clauses.push("s.artist = ?");
            values.push(Value::Text(artist.clone()));
        }
        if let Some(name) = &filter.name {
            clauses.push("s.name = ?");
            values.push(Value::Text(name.clone()));
        }
        if let Some(genre) = &filter.genre {
            clauses.push("s.genre = ?");
            values.push(Value::Text(genre.clone()));
        }
        if let Some(year) = filter.year {
            clauses.push(
                "CAST(strftime('%Y', s.released_on / 1000.0, 'unixepoch') AS INTEGER) = ?",
            );
            values.push(Value::Integer(year as i64));
        }
        if let Some(album_id) = filter.album_id {
            clauses.push("s.id IN (SELECT song_id FROM album_songs WHERE album_id = ?)");
            values.push(Value::Integer(album_id));
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        values.push(Value::Integer(sql_limit(filter.limit)));
        let sql = format!(
            "SELECT {} FROM songs s {} ORDER BY s.id LIMIT ?",
            SONG_COLUMNS, where_clause
        );

        let songs = self.with_read_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let songs = stmt
                .query_map(params_from_iter(values.iter()), song_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(songs)
        })?;

        if songs.is_empty() && !filter.is_unfiltered() {
            if let (Some(id), true) = (filter.id, clauses.len() == 1) {
                return Err(CatalogError::not_found("Song", id));
            }
            return Err(CatalogError::NotFound {
                entity: "Song",
                key: describe_criteria(&[
                    ("id", filter.id.map(|v| v.to_string())),
                    ("artist", filter.artist.clone()),
                    ("name", filter.name.clone()),
                    ("genre", filter.genre.clone()),
                    ("year", filter.year.map(|v| v.to_string())),
                    ("albumId", filter.album_id.map(|v| v.to_string())),
                ]),
            });
        }
        Ok(songs)
    }

    fn update_song(&self, id: i64, fields: SongFields) -> CatalogResult<Song> {
        validate_song(&fields)?;
        let now = self.clock.now();

        self.write_transaction(|conn| {
            let existing = require_song(conn, id)?;
            conn.execute(
                "UPDATE songs SET name = ?1, artist = ?2, released_on = ?3, duration = ?4, genre = ?5,
                 description = ?6, updated_on = ?7 WHERE id = ?8",
                params![
                    fields.name,
                    fields.artist,
                    fields.released_on.timestamp_millis(),
                    fields.duration,
                    fields.genre,
                    fields.description,
                    now.timestamp_millis(),
                    id
                ],
            )?;
            Ok(Song {
                id,
                name: fields.name,
                artist: fields.artist,
                released_on: fields.released_on,
                duration: fields.duration,
                genre: fields.genre,
                description: fields.description,
                added_on: existing.added_on,
                updated_on: now,
            })
        })
    }

    fn delete_song(&self, id: i64) -> CatalogResult<()> {
        self.delete_by_id("songs", "Song", id)
    }

    fn get_song_reviews(&self, id: i64) -> CatalogResult<Vec<Review>> {
        self.with_read_conn(|conn| {
            require_song(conn, id)?;
            media_reviews(conn, ReviewType::Song, id)
        })
    }

    fn get_song_rating(&self, id: i64) -> CatalogResult<f64> {
        self.with_read_conn(|conn| {
            require_song(conn, id)?;
            Ok(average_rating(&media_ratings(conn, ReviewType::Song, id)?))
        })
    }

    // =========================================================================
    // Reviews
    // =========================================================================

    fn create_review(&self, review: NewReview) -> CatalogResult<Review> {
        validate_new_review(&review)?;
        let now = self.clock.now();

        self.write_transaction(|conn| {
            require_media(conn, review.review_type, review.media_id)?;
            conn.execute(
                "INSERT INTO reviews (review_type, title, author, review_full_text, review_description,
                 affiliation, review_rating, media_id, media_title, added_on, updated_on)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
                params![
                    review.review_type.to_db_str(),
                    review.title,
                    review.author,
                    review.review_full_text,
                    review.review_description,
                    review.affiliation,
                    review.review_rating,
                    review.media_id,
                    review.media_title,
                    now.timestamp_millis()
                ],
            )?;

            Ok(Review {
                id: conn.last_insert_rowid(),
                review_type: review.review_type,
                title: review.title,
                author: review.author,
                review_full_text: review.review_full_text,
                review_description: review.review_description,
                affiliation: review.affiliation,
                review_rating: review.review_rating,
                media_id: review.media_id,
                media_title: review.media_title,
                added_on: now,
                updated_on: now,
            })
        })
    }

    fn get_review(&self, id: i64) -> CatalogResult<Review> {
        self.with_read_conn(|conn| require_review(conn, id))
    }

    fn list_reviews(&self, limit: Option<usize>) -> CatalogResult<Vec<Review>> {
        self.with_read_conn(|conn| {
            query_list(
                conn,
                &format!("SELECT {} FROM reviews ORDER BY id LIMIT ?1", REVIEW_COLUMNS),
                params![sql_limit(limit)],
                review_from_row,
            )
        })
    }

    fn update_review(&self, id: i64, update: ReviewUpdate) -> CatalogResult<Review> {
        let now = self.clock.now();

        self.write_transaction(|conn| {
            let mut review = require_review(conn, id)?;
            let retargets = update.retargets();
            update.apply_to(&mut review);
            validate_review(&review)?;
            if retargets {
                require_media(conn, review.review_type, review.media_id)?;
            }
            review.updated_on = now;

            conn.execute(
                "UPDATE reviews SET review_type = ?1, title = ?2, author = ?3, review_full_text = ?4,
                 review_description = ?5, affiliation = ?6, review_rating = ?7, media_id = ?8,
                 media_title = ?9, updated_on = ?10 WHERE id = ?11",
                params![
                    review.review_type.to_db_str(),
                    review.title,
                    review.author,
                    review.review_full_text,
                    review.review_description,
                    review.affiliation,
                    review.review_rating,
                    review.media_id,
                    review.media_title,
                    now.timestamp_millis(),
                    id
                ],
            )?;
            Ok(review)
        })
    }

    fn delete_review(&self, id: i64) -> CatalogResult<()> {
        self.delete_by_id("reviews", "Review", id)
    }

    // =========================================================================
    // Counts
    // =========================================================================

    fn get_counts(&self) -> CatalogResult<CatalogCounts> {
        self.with_read_conn(|conn| {
            Ok(CatalogCounts {
                albums: count_rows(conn, "albums")?,
                books: count_rows(conn, "books")?,
                songs: count_rows(conn, "songs")?,
                reviews: count_rows(conn, "reviews")?,
            })
        })
    }
}
