//! CatalogStore trait definition.

use super::error::CatalogResult;
use super::models::*;

/// Storage backend for the media catalog.
///
/// Every mutation stamps audit timestamps from the store's clock. Deletes
/// never cascade to reviews or album links that reference the deleted row.
pub trait CatalogStore: Send + Sync {
    // =========================================================================
    // Albums
    // =========================================================================

    fn create_album(&self, fields: AlbumFields) -> CatalogResult<Album>;

    /// Get an album with its songs in link order.
    fn get_album(&self, id: i64) -> CatalogResult<ResolvedAlbum>;

    /// List albums, or look them up when `filter` has a criterion set.
    /// A lookup that matches nothing is `NotFound`.
    fn find_albums(&self, filter: &AlbumFilter) -> CatalogResult<Vec<ResolvedAlbum>>;

    fn update_album(&self, id: i64, fields: AlbumFields) -> CatalogResult<Album>;

    fn delete_album(&self, id: i64) -> CatalogResult<()>;

    /// Append the songs that exist to the album's sequence, in request
    /// order. Ids that resolve to no song are dropped without error.
    fn attach_songs(&self, album_id: i64, song_ids: &[i64]) -> CatalogResult<ResolvedAlbum>;

    /// Remove every link from the album to any of `song_ids`.
    fn detach_songs(&self, album_id: i64, song_ids: &[i64]) -> CatalogResult<()>;

    /// Mean rating over the reviews of every song on the album.
    fn get_album_rating(&self, id: i64) -> CatalogResult<f64>;

    // =========================================================================
    // Books
    // =========================================================================

    fn create_book(&self, fields: BookFields) -> CatalogResult<Book>;

    fn get_book(&self, id: i64) -> CatalogResult<Book>;

    fn find_books(&self, filter: &BookFilter) -> CatalogResult<Vec<Book>>;

    fn update_book(&self, id: i64, fields: BookFields) -> CatalogResult<Book>;

    fn update_book_by_isbn(&self, isbn: &str, fields: BookFields) -> CatalogResult<Book>;

    fn delete_book(&self, id: i64) -> CatalogResult<()>;

    fn delete_book_by_isbn(&self, isbn: &str) -> CatalogResult<()>;

    fn get_book_reviews(&self, id: i64) -> CatalogResult<Vec<Review>>;

    fn get_book_rating(&self, id: i64) -> CatalogResult<f64>;

    /// Insert a batch of books in one transaction. Either every record is
    /// inserted or none is.
    fn import_books(
        &self,
        records: Vec<BookRecord>,
        id_mode: ImportIdMode,
    ) -> CatalogResult<Vec<Book>>;

    // =========================================================================
    // Songs
    // =========================================================================

    fn create_song(&self, fields: SongFields) -> CatalogResult<Song>;

    fn get_song(&self, id: i64) -> CatalogResult<Song>;

    fn find_songs(&self, filter: &SongFilter) -> CatalogResult<Vec<Song>>;

    fn update_song(&self, id: i64, fields: SongFields) -> CatalogResult<Song>;

    fn delete_song(&self, id: i64) -> CatalogResult<()>;

    fn get_song_reviews(&self, id: i64) -> CatalogResult<Vec<Review>>;

    fn get_song_rating(&self, id: i64) -> CatalogResult<f64>;

    // =========================================================================
    // Reviews
    // =========================================================================

    /// Create a review of an existing book or song.
    fn create_review(&self, review: NewReview) -> CatalogResult<Review>;

    fn get_review(&self, id: i64) -> CatalogResult<Review>;

    fn list_reviews(&self, limit: Option<usize>) -> CatalogResult<Vec<Review>>;

    /// Apply the supplied fields. Retargeting must name an existing item.
    fn update_review(&self, id: i64, update: ReviewUpdate) -> CatalogResult<Review>;

    fn delete_review(&self, id: i64) -> CatalogResult<()>;

    // =========================================================================
    // Counts (for metrics)
    // =========================================================================

    fn get_counts(&self) -> CatalogResult<CatalogCounts>;
}
