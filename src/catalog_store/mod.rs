mod error;
mod models;
mod rating;
mod schema;
mod store;
mod trait_def;
mod validation;

pub use error::{CatalogError, CatalogResult};
pub use models::*;
pub use rating::average_rating;
pub use schema::CATALOG_VERSIONED_SCHEMAS;
pub use store::SqliteCatalogStore;
pub use trait_def::CatalogStore;
pub use validation::{FieldViolation, ValidationError};
