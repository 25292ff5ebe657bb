//! Mapping of domain errors onto HTTP responses.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use super::metrics::record_error;
use crate::catalog_store::CatalogError;
use crate::transfer::TransferError;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error(transparent)]
    Body(#[from] JsonRejection),

    #[error(transparent)]
    Query(#[from] QueryRejection),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    fn kind(&self) -> &'static str {
        match self {
            ApiError::Catalog(e) => e.kind(),
            ApiError::Transfer(TransferError::Io(_)) => "io",
            ApiError::Transfer(_) => "parse",
            ApiError::Body(_) | ApiError::Query(_) | ApiError::BadRequest(_) => "bad_request",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        record_error(self.kind());

        let (status, body) = match self {
            ApiError::Catalog(CatalogError::NotFound { .. }) => {
                (StatusCode::NOT_FOUND, json!({ "error": self.to_string() }))
            }
            ApiError::Catalog(CatalogError::Validation(ref e)) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Validation failed", "fields": e.messages() }),
            ),
            ApiError::Catalog(CatalogError::Conflict(ref msg)) => {
                (StatusCode::CONFLICT, json!({ "error": msg }))
            }
            ApiError::Catalog(ref e @ CatalogError::Store(_)) => {
                tracing::error!("Catalog error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Catalog storage error" }),
                )
            }
            ApiError::Transfer(ref e) if e.is_input_error() => {
                (StatusCode::BAD_REQUEST, json!({ "error": e.to_string() }))
            }
            ApiError::Transfer(ref e) => {
                tracing::error!("Transfer error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "IO error" }),
                )
            }
            ApiError::Body(ref rejection) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": rejection.body_text() }),
            ),
            ApiError::Query(ref rejection) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": rejection.body_text() }),
            ),
            ApiError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
        };

        (status, Json(body)).into_response()
    }
}
