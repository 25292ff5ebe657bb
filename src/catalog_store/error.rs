use super::validation::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{entity} with {key} not found")]
    NotFound { entity: &'static str, key: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Store(rusqlite::Error),
}

impl CatalogError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        CatalogError::NotFound {
            entity,
            key: format!("id {}", id),
        }
    }

    pub fn not_found_by(entity: &'static str, field: &str, value: impl std::fmt::Display) -> Self {
        CatalogError::NotFound {
            entity,
            key: format!("{} '{}'", field, value),
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            CatalogError::NotFound { .. } => "not_found",
            CatalogError::Validation(_) => "validation",
            CatalogError::Conflict(_) => "conflict",
            CatalogError::Store(_) => "store",
        }
    }
}

impl From<rusqlite::Error> for CatalogError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref failure, ref message)
                if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                CatalogError::Conflict(
                    message
                        .clone()
                        .unwrap_or_else(|| "constraint violation".to_string()),
                )
            }
            other => CatalogError::Store(other),
        }
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;
