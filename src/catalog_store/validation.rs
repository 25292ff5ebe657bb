//! Field validation for catalog entities.
//!
//! Runs before any mutation. Every violation found is reported, so a client
//! can fix all fields in one round trip.

use super::models::{AlbumFields, BookFields, NewReview, Review, SongFields};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldViolation {
    EmptyField,
    NegativeValue { value: i64 },
    Precedes { other: &'static str },
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldViolation::EmptyField => write!(f, "must not be blank"),
            FieldViolation::NegativeValue { value } => {
                write!(f, "must be non-negative, got {}", value)
            }
            FieldViolation::Precedes { other } => write!(f, "must not precede {}", other),
        }
    }
}

/// One or more invalid fields, keyed by their camelCase wire name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationError {
    pub fields: BTreeMap<&'static str, FieldViolation>,
}

impl ValidationError {
    /// Messages keyed by field, the shape returned to HTTP clients.
    pub fn messages(&self) -> BTreeMap<&'static str, String> {
        self.fields
            .iter()
            .map(|(field, violation)| (*field, violation.to_string()))
            .collect()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid fields: ")?;
        for (i, (field, violation)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "'{}' {}", field, violation)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult<T> = Result<T, ValidationError>;

#[derive(Default)]
struct Checker {
    fields: BTreeMap<&'static str, FieldViolation>,
}

impl Checker {
    fn not_blank(&mut self, field: &'static str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.fields.insert(field, FieldViolation::EmptyField);
        }
        self
    }

    fn non_negative(&mut self, field: &'static str, value: i64) -> &mut Self {
        if value < 0 {
            self.fields
                .insert(field, FieldViolation::NegativeValue { value });
        }
        self
    }

    fn not_before(
        &mut self,
        field: &'static str,
        value: DateTime<Utc>,
        other: &'static str,
        bound: DateTime<Utc>,
    ) -> &mut Self {
        if value < bound {
            self.fields.insert(field, FieldViolation::Precedes { other });
        }
        self
    }

    fn finish(&mut self) -> ValidationResult<()> {
        if self.fields.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                fields: std::mem::take(&mut self.fields),
            })
        }
    }
}

pub fn validate_album(album: &AlbumFields) -> ValidationResult<()> {
    Checker::default()
        .not_blank("title", &album.title)
        .not_blank("artist", &album.artist)
        .finish()
}

pub fn validate_book(book: &BookFields) -> ValidationResult<()> {
    Checker::default()
        .not_blank("name", &book.name)
        .not_blank("author", &book.author)
        .not_blank("isbn", &book.isbn)
        .not_blank("genre", &book.genre)
        .not_blank("description", &book.description)
        .finish()
}

/// Audit timestamps carried by an imported book.
pub fn validate_audit_timestamps(
    added_on: DateTime<Utc>,
    updated_on: DateTime<Utc>,
) -> ValidationResult<()> {
    Checker::default()
        .not_before("updatedOn", updated_on, "addedOn", added_on)
        .finish()
}

pub fn validate_song(song: &SongFields) -> ValidationResult<()> {
    Checker::default()
        .not_blank("name", &song.name)
        .not_blank("artist", &song.artist)
        .non_negative("duration", song.duration as i64)
        .not_blank("genre", &song.genre)
        .not_blank("description", &song.description)
        .finish()
}

pub fn validate_new_review(review: &NewReview) -> ValidationResult<()> {
    Checker::default()
        .not_blank("title", &review.title)
        .not_blank("author", &review.author)
        .not_blank("reviewFullText", &review.review_full_text)
        .not_blank("reviewDescription", &review.review_description)
        .not_blank("affiliation", &review.affiliation)
        .non_negative("reviewRating", review.review_rating as i64)
        .not_blank("mediaTitle", &review.media_title)
        .finish()
}

/// Validate a review after a partial update has been applied to it.
pub fn validate_review(review: &Review) -> ValidationResult<()> {
    Checker::default()
        .not_blank("title", &review.title)
        .not_blank("author", &review.author)
        .not_blank("reviewFullText", &review.review_full_text)
        .not_blank("reviewDescription", &review.review_description)
        .not_blank("affiliation", &review.affiliation)
        .non_negative("reviewRating", review.review_rating as i64)
        .not_blank("mediaTitle", &review.media_title)
        .finish()
}
