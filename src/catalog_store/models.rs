//! Catalog models.
//!
//! Stored entities carry a store-assigned id and two audit timestamps.
//! The `*Fields` structs are the caller-supplied part of an entity, used for
//! both create and full update.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Enumerations
// =============================================================================

/// Which kind of media a review points at.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewType {
    Book,
    Song,
}

impl ReviewType {
    /// Convert from database string representation
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "BOOK" => Some(ReviewType::Book),
            "SONG" => Some(ReviewType::Song),
            _ => None,
        }
    }

    /// Convert to database string representation
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ReviewType::Book => "BOOK",
            ReviewType::Song => "SONG",
        }
    }
}

// =============================================================================
// Albums
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: i64,
    pub title: String,
    pub artist: String,
    pub release_date: NaiveDate,
    pub added_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumFields {
    pub title: String,
    pub artist: String,
    pub release_date: NaiveDate,
}

/// An album together with its songs, in link order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolvedAlbum {
    #[serde(flatten)]
    pub album: Album,
    pub songs: Vec<Song>,
}

// =============================================================================
// Books
// =============================================================================

/// Field order is the export column order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i64,
    pub name: String,
    pub author: String,
    pub published_year: i32,
    pub isbn: String,
    pub genre: String,
    pub description: String,
    pub added_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookFields {
    pub name: String,
    pub author: String,
    pub published_year: i32,
    pub isbn: String,
    pub genre: String,
    pub description: String,
}

impl From<&Book> for BookFields {
    fn from(book: &Book) -> Self {
        BookFields {
            name: book.name.clone(),
            author: book.author.clone(),
            published_year: book.published_year,
            isbn: book.isbn.clone(),
            genre: book.genre.clone(),
            description: book.description.clone(),
        }
    }
}

/// A book as it arrives through bulk import.
///
/// `id` is only honored with [`ImportIdMode::Preserve`]. Missing timestamps
/// are stamped by the store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(flatten)]
    pub fields: BookFields,
    #[serde(default)]
    pub added_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_on: Option<DateTime<Utc>>,
}

impl From<BookFields> for BookRecord {
    fn from(fields: BookFields) -> Self {
        BookRecord {
            id: None,
            fields,
            added_on: None,
            updated_on: None,
        }
    }
}

/// How bulk import treats ids carried by the records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportIdMode {
    /// Ignore incoming ids and let the store assign new ones.
    #[default]
    Regenerate,
    /// Insert with the incoming ids; a taken id fails the whole batch.
    Preserve,
}

// =============================================================================
// Songs
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: i64,
    pub name: String,
    pub artist: String,
    pub released_on: DateTime<Utc>,
    /// Seconds.
    pub duration: i32,
    pub genre: String,
    pub description: String,
    pub added_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongFields {
    pub name: String,
    pub artist: String,
    pub released_on: DateTime<Utc>,
    pub duration: i32,
    pub genre: String,
    pub description: String,
}

// =============================================================================
// Reviews
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    pub review_type: ReviewType,
    pub title: String,
    pub author: String,
    pub review_full_text: String,
    pub review_description: String,
    pub affiliation: String,
    pub review_rating: i32,
    pub media_id: i64,
    pub media_title: String,
    pub added_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub review_type: ReviewType,
    pub title: String,
    pub author: String,
    pub review_full_text: String,
    pub review_description: String,
    pub affiliation: String,
    pub review_rating: i32,
    pub media_id: i64,
    pub media_title: String,
}

/// Partial review update. `None` leaves the stored value as is.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReviewUpdate {
    pub review_type: Option<ReviewType>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub review_full_text: Option<String>,
    pub review_description: Option<String>,
    pub affiliation: Option<String>,
    pub review_rating: Option<i32>,
    pub media_id: Option<i64>,
    pub media_title: Option<String>,
}

impl ReviewUpdate {
    /// Whether the update moves the review to a different media item.
    pub fn retargets(&self) -> bool {
        self.review_type.is_some() || self.media_id.is_some()
    }

    pub(crate) fn apply_to(self, review: &mut Review) {
        if let Some(review_type) = self.review_type {
            review.review_type = review_type;
        }
        if let Some(title) = self.title {
            review.title = title;
        }
        if let Some(author) = self.author {
            review.author = author;
        }
        if let Some(text) = self.review_full_text {
            review.review_full_text = text;
        }
        if let Some(description) = self.review_description {
            review.review_description = description;
        }
        if let Some(affiliation) = self.affiliation {
            review.affiliation = affiliation;
        }
        if let Some(rating) = self.review_rating {
            review.review_rating = rating;
        }
        if let Some(media_id) = self.media_id {
            review.media_id = media_id;
        }
        if let Some(media_title) = self.media_title {
            review.media_title = media_title;
        }
    }
}

// =============================================================================
// Lookup filters
// =============================================================================

/// Album lookup. Supplied filters are evaluated in field order and their
/// matches concatenated.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AlbumFilter {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BookFilter {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub isbn: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SongFilter {
    pub id: Option<i64>,
    pub artist: Option<String>,
    pub name: Option<String>,
    pub genre: Option<String>,
    pub year: Option<i32>,
    pub album_id: Option<i64>,
    pub limit: Option<usize>,
}

impl AlbumFilter {
    pub fn is_unfiltered(&self) -> bool {
        self.id.is_none() && self.title.is_none() && self.artist.is_none()
    }
}

impl BookFilter {
    pub fn is_unfiltered(&self) -> bool {
        self.id.is_none()
            && self.title.is_none()
            && self.isbn.is_none()
            && self.author.is_none()
            && self.genre.is_none()
    }
}

impl SongFilter {
    pub fn is_unfiltered(&self) -> bool {
        self.id.is_none()
            && self.artist.is_none()
            && self.name.is_none()
            && self.genre.is_none()
            && self.year.is_none()
            && self.album_id.is_none()
    }
}

// =============================================================================
// Counts
// =============================================================================

/// Row counts per entity table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CatalogCounts {
    pub albums: usize,
    pub books: usize,
    pub songs: usize,
    pub reviews: usize,
}
