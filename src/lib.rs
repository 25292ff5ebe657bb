//! Media Catalog Server Library
//!
//! Albums, books, songs and their reviews behind a SQLite store, with an axum
//! HTTP surface and bulk book import/export.

pub mod catalog_store;
pub mod clock;
pub mod config;
pub mod server;
pub mod sqlite_persistence;
pub mod transfer;

// Re-export commonly used types for convenience
pub use catalog_store::{CatalogError, CatalogStore, SqliteCatalogStore};
pub use clock::{Clock, FixedClock, SharedClock, SystemClock};
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
pub use transfer::{TransferError, TransferFormat};
