//! Test fixture creation
//!
//! Seeds a fresh catalog through the store API, so the ids in
//! `constants.rs` are the ones the store assigns.

use super::constants::*;
use anyhow::Result;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use media_catalog_server::catalog_store::{
    AlbumFields, BookFields, CatalogStore, NewReview, ReviewType, SongFields,
};

pub fn fixture_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(FIXTURE_TIME)
        .expect("FIXTURE_TIME is RFC 3339")
        .with_timezone(&Utc)
}

pub fn book_fields(name: &str, author: &str, year: i32, isbn: &str, genre: &str) -> BookFields {
    BookFields {
        name: name.to_string(),
        author: author.to_string(),
        published_year: year,
        isbn: isbn.to_string(),
        genre: genre.to_string(),
        description: format!("{} by {}", name, author),
    }
}

pub fn song_fields(
    name: &str,
    artist: &str,
    released_on: DateTime<Utc>,
    duration: i32,
    genre: &str,
) -> SongFields {
    SongFields {
        name: name.to_string(),
        artist: artist.to_string(),
        released_on,
        duration,
        genre: genre.to_string(),
        description: format!("{} by {}", name, artist),
    }
}

pub fn new_review(review_type: ReviewType, media_id: i64, media_title: &str, rating: i32) -> NewReview {
    NewReview {
        review_type,
        title: format!("On {}", media_title),
        author: "A. Critic".to_string(),
        review_full_text: "A long and thoughtful review.".to_string(),
        review_description: "Thoughtful".to_string(),
        affiliation: "The Review".to_string(),
        review_rating: rating,
        media_id,
        media_title: media_title.to_string(),
    }
}

/// Insert the books, songs, albums and reviews described in `constants.rs`.
pub fn seed_catalog(store: &dyn CatalogStore) -> Result<()> {
    store.create_book(book_fields(
        "Dune",
        "Frank Herbert",
        1965,
        BOOK_DUNE_ISBN,
        "Science Fiction",
    ))?;
    store.create_book(book_fields("Emma", AUSTEN, 1815, BOOK_EMMA_ISBN, "Romance"))?;
    store.create_book(book_fields(
        "Persuasion",
        AUSTEN,
        1817,
        "9780141439686",
        "Romance",
    ))?;

    let sessions = Utc.with_ymd_and_hms(1959, 8, 17, 0, 0, 0).unwrap();
    store.create_song(song_fields("So What", MILES_DAVIS, sessions, 562, "Jazz"))?;
    store.create_song(song_fields("Blue in Green", MILES_DAVIS, sessions, 337, "Jazz"))?;
    store.create_song(song_fields(
        "Hey Jude",
        "The Beatles",
        Utc.with_ymd_and_hms(1968, 8, 26, 0, 0, 0).unwrap(),
        431,
        "Rock",
    ))?;

    let kind_of_blue = store.create_album(AlbumFields {
        title: "Kind of Blue".to_string(),
        artist: MILES_DAVIS.to_string(),
        release_date: NaiveDate::from_ymd_opt(1959, 8, 17).unwrap(),
    })?;
    store.attach_songs(
        kind_of_blue.id,
        &[SONG_SO_WHAT_ID, SONG_BLUE_IN_GREEN_ID],
    )?;
    store.create_album(AlbumFields {
        title: "Abbey Road".to_string(),
        artist: "The Beatles".to_string(),
        release_date: NaiveDate::from_ymd_opt(1969, 9, 26).unwrap(),
    })?;

    store.create_review(new_review(ReviewType::Book, BOOK_DUNE_ID, "Dune", 4))?;
    store.create_review(new_review(ReviewType::Book, BOOK_DUNE_ID, "Dune", 5))?;
    store.create_review(new_review(ReviewType::Song, SONG_SO_WHAT_ID, "So What", 3))?;

    Ok(())
}
