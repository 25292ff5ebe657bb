//! Shared constants for end-to-end tests
//!
//! Ids follow the insertion order in `fixtures.rs`. When the seeded catalog
//! changes, update only this file and the fixtures.

// ============================================================================
// Clock
// ============================================================================

/// Instant the test clock starts at. Every seeded entity is stamped with it.
pub const FIXTURE_TIME: &str = "2024-05-01T10:00:00Z";

// ============================================================================
// Books
// ============================================================================

/// "Dune" by Frank Herbert, reviewed twice (4 and 5)
pub const BOOK_DUNE_ID: i64 = 1;
pub const BOOK_DUNE_ISBN: &str = "9780441013593";

/// "Emma" by Jane Austen, no reviews
pub const BOOK_EMMA_ID: i64 = 2;
pub const BOOK_EMMA_ISBN: &str = "9780141439587";

/// "Persuasion" by Jane Austen, no reviews
pub const BOOK_PERSUASION_ID: i64 = 3;

pub const AUSTEN: &str = "Jane Austen";

pub const BOOK_COUNT: usize = 3;

// ============================================================================
// Songs
// ============================================================================

/// "So What" by Miles Davis, on Kind of Blue, reviewed once (3)
pub const SONG_SO_WHAT_ID: i64 = 1;

/// "Blue in Green" by Miles Davis, on Kind of Blue, no reviews
pub const SONG_BLUE_IN_GREEN_ID: i64 = 2;

/// "Hey Jude" by The Beatles, on no album
pub const SONG_HEY_JUDE_ID: i64 = 3;

pub const MILES_DAVIS: &str = "Miles Davis";

// ============================================================================
// Albums
// ============================================================================

/// "Kind of Blue", links songs 1 and 2 in that order
pub const ALBUM_KIND_OF_BLUE_ID: i64 = 1;

/// "Abbey Road", no songs
pub const ALBUM_ABBEY_ROAD_ID: i64 = 2;

// ============================================================================
// Reviews
// ============================================================================

pub const REVIEW_DUNE_1_ID: i64 = 1;
pub const REVIEW_DUNE_2_ID: i64 = 2;
pub const REVIEW_SO_WHAT_ID: i64 = 3;

pub const REVIEW_COUNT: usize = 3;

/// An id no seeded entity uses
pub const MISSING_ID: i64 = 9999;

// ============================================================================
// Timeouts
// ============================================================================

/// Maximum time to wait for the server to answer its first request
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Interval between readiness polls
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;

/// Timeout applied to every test request
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
