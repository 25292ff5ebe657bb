//! SQLite schema for the media catalog.
//!
//! Timestamps are INTEGER milliseconds since the Unix epoch. Album release
//! dates are TEXT in `YYYY-MM-DD` form. Reviews reference their media only
//! through `(review_type, media_id)`; there is no stored reverse collection.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
};

// =============================================================================
// Entity Tables
// =============================================================================

const ALBUMS_TABLE: Table = Table {
    name: "albums",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_autoincrement = true
        ),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("artist", &SqlType::Text, non_null = true),
        sqlite_column!("release_date", &SqlType::Text, non_null = true),
        sqlite_column!("added_on", &SqlType::Integer, non_null = true),
        sqlite_column!("updated_on", &SqlType::Integer, non_null = true),
    ],
    indices: &[
        ("idx_albums_title", "title"),
        ("idx_albums_artist", "artist"),
    ],
    unique_constraints: &[],
};

const BOOKS_TABLE: Table = Table {
    name: "books",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_autoincrement = true
        ),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("author", &SqlType::Text, non_null = true),
        sqlite_column!("published_year", &SqlType::Integer, non_null = true),
        sqlite_column!("isbn", &SqlType::Text, non_null = true),
        sqlite_column!("genre", &SqlType::Text, non_null = true),
        sqlite_column!("description", &SqlType::Text, non_null = true),
        sqlite_column!("added_on", &SqlType::Integer, non_null = true),
        sqlite_column!("updated_on", &SqlType::Integer, non_null = true),
    ],
    indices: &[
        ("idx_books_name", "name"),
        ("idx_books_author", "author"),
        ("idx_books_genre", "genre"),
    ],
    unique_constraints: &[&["isbn"]],
};

const SONGS_TABLE: Table = Table {
    name: "songs",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_autoincrement = true
        ),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("artist", &SqlType::Text, non_null = true),
        sqlite_column!("released_on", &SqlType::Integer, non_null = true),
        sqlite_column!("duration", &SqlType::Integer, non_null = true), // seconds
        sqlite_column!("genre", &SqlType::Text, non_null = true),
        sqlite_column!("description", &SqlType::Text, non_null = true),
        sqlite_column!("added_on", &SqlType::Integer, non_null = true),
        sqlite_column!("updated_on", &SqlType::Integer, non_null = true),
    ],
    indices: &[
        ("idx_songs_name", "name"),
        ("idx_songs_artist", "artist"),
        ("idx_songs_genre", "genre"),
    ],
    unique_constraints: &[],
};

const REVIEWS_TABLE: Table = Table {
    name: "reviews",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_autoincrement = true
        ),
        sqlite_column!("review_type", &SqlType::Text, non_null = true), // 'BOOK', 'SONG'
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("author", &SqlType::Text, non_null = true),
        sqlite_column!("review_full_text", &SqlType::Text, non_null = true),
        sqlite_column!("review_description", &SqlType::Text, non_null = true),
        sqlite_column!("affiliation", &SqlType::Text, non_null = true),
        sqlite_column!("review_rating", &SqlType::Integer, non_null = true),
        sqlite_column!("media_id", &SqlType::Integer, non_null = true),
        sqlite_column!("media_title", &SqlType::Text, non_null = true),
        sqlite_column!("added_on", &SqlType::Integer, non_null = true),
        sqlite_column!("updated_on", &SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_reviews_media", "review_type, media_id")],
    unique_constraints: &[],
};

// =============================================================================
// Junction Tables
// =============================================================================

/// Album -> Song sequence. `song_id` carries no foreign key so deleting a
/// song leaves the link in place.
const ALBUM_SONGS_TABLE: Table = Table {
    name: "album_songs",
    columns: &[
        sqlite_column!(
            "album_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "albums",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("song_id", &SqlType::Integer, non_null = true),
        sqlite_column!("position", &SqlType::Integer, non_null = true),
    ],
    indices: &[
        ("idx_album_songs_album", "album_id"),
        ("idx_album_songs_song", "song_id"),
    ],
    unique_constraints: &[&["album_id", "position"]],
};

// =============================================================================
// Versioned Schema Definition
// =============================================================================

pub const CATALOG_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        ALBUMS_TABLE,
        BOOKS_TABLE,
        SONGS_TABLE,
        REVIEWS_TABLE,
        ALBUM_SONGS_TABLE,
    ],
    migration: None,
}];

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn create_schema() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        CATALOG_VERSIONED_SCHEMAS[0].create(&conn).unwrap();
        conn
    }

    #[test]
    fn test_schema_creates_successfully() {
        let conn = create_schema();
        CATALOG_VERSIONED_SCHEMAS[0].validate(&conn).unwrap();
    }

    #[test]
    fn test_isbn_is_unique() {
        let conn = create_schema();
        let insert = "INSERT INTO books (name, author, published_year, isbn, genre, description, added_on, updated_on)
                      VALUES ('Dune', 'Herbert', 1965, '978', 'SF', 'Spice', 0, 0)";
        conn.execute(insert, []).unwrap();
        assert!(conn.execute(insert, []).is_err());
    }

    #[test]
    fn test_deleting_album_drops_its_links() {
        let conn = create_schema();
        conn.execute(
            "INSERT INTO albums (id, title, artist, release_date, added_on, updated_on)
             VALUES (1, 'Blue', 'Joni Mitchell', '1971-06-22', 0, 0)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO album_songs (album_id, song_id, position) VALUES (1, 10, 0), (1, 11, 1)",
            [],
        )
        .unwrap();

        conn.execute("DELETE FROM albums WHERE id = 1", []).unwrap();

        let links: i64 = conn
            .query_row("SELECT COUNT(*) FROM album_songs", [], |r| r.get(0))
            .unwrap();
        assert_eq!(links, 0);
    }

    #[test]
    fn test_song_links_survive_missing_songs() {
        let conn = create_schema();
        conn.execute(
            "INSERT INTO albums (id, title, artist, release_date, added_on, updated_on)
             VALUES (1, 'Blue', 'Joni Mitchell', '1971-06-22', 0, 0)",
            [],
        )
        .unwrap();

        // No row in songs with id 99; the link is still accepted.
        conn.execute(
            "INSERT INTO album_songs (album_id, song_id, position) VALUES (1, 99, 0)",
            [],
        )
        .unwrap();
    }

    #[test]
    fn test_album_positions_are_unique() {
        let conn = create_schema();
        conn.execute(
            "INSERT INTO albums (id, title, artist, release_date, added_on, updated_on)
             VALUES (1, 'Blue', 'Joni Mitchell', '1971-06-22', 0, 0)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO album_songs (album_id, song_id, position) VALUES (1, 5, 0)",
            [],
        )
        .unwrap();

        let duplicate_position = conn.execute(
            "INSERT INTO album_songs (album_id, song_id, position) VALUES (1, 5, 0)",
            [],
        );
        assert!(duplicate_position.is_err());

        // The same song twice at different positions is allowed.
        conn.execute(
            "INSERT INTO album_songs (album_id, song_id, position) VALUES (1, 5, 1)",
            [],
        )
        .unwrap();
    }
}
