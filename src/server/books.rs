use axum::{
    body::Bytes,
    extract::{
        rejection::JsonRejection, rejection::QueryRejection, DefaultBodyLimit, Path, Query, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::{ApiError, ApiResult};
use super::metrics::record_transfer;
use super::state::{GuardedCatalogStore, ServerState};
use crate::catalog_store::{Book, BookFields, BookFilter, ImportIdMode};
use crate::transfer::{parse_books, render_books, TransferFormat};

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct TransferQuery {
    format: Option<String>,
    ids: Option<String>,
}

impl TransferQuery {
    fn format(&self) -> ApiResult<TransferFormat> {
        let raw = self
            .format
            .as_deref()
            .ok_or_else(|| ApiError::BadRequest("Missing 'format' parameter".to_string()))?;
        raw.parse()
            .map_err(|e: crate::transfer::UnknownFormat| ApiError::BadRequest(e.to_string()))
    }

    fn id_mode(&self) -> ApiResult<ImportIdMode> {
        match self.ids.as_deref() {
            None | Some("regenerate") => Ok(ImportIdMode::Regenerate),
            Some("preserve") => Ok(ImportIdMode::Preserve),
            Some(other) => Err(ApiError::BadRequest(format!(
                "Unsupported ids mode '{}', expected 'regenerate' or 'preserve'",
                other
            ))),
        }
    }
}

#[derive(Serialize)]
struct ImportSummary {
    imported: usize,
    books: Vec<Book>,
}

async fn get_books(
    State(store): State<GuardedCatalogStore>,
    filter: Result<Query<BookFilter>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(filter) = filter?;
    Ok(Json(store.find_books(&filter)?))
}

async fn get_book(
    State(store): State<GuardedCatalogStore>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(store.get_book(id)?))
}

async fn post_book(
    State(store): State<GuardedCatalogStore>,
    body: Result<Json<BookFields>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(fields) = body?;
    Ok((StatusCode::CREATED, Json(store.create_book(fields)?)))
}

async fn put_book_by_id(
    State(store): State<GuardedCatalogStore>,
    Path(id): Path<i64>,
    body: Result<Json<BookFields>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(fields) = body?;
    Ok(Json(store.update_book(id, fields)?))
}

async fn put_book_by_isbn(
    State(store): State<GuardedCatalogStore>,
    Path(isbn): Path<String>,
    body: Result<Json<BookFields>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(fields) = body?;
    Ok(Json(store.update_book_by_isbn(&isbn, fields)?))
}

async fn delete_book_by_id(
    State(store): State<GuardedCatalogStore>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    store.delete_book(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_book_by_isbn(
    State(store): State<GuardedCatalogStore>,
    Path(isbn): Path<String>,
) -> ApiResult<impl IntoResponse> {
    store.delete_book_by_isbn(&isbn)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_book_reviews(
    State(store): State<GuardedCatalogStore>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(store.get_book_reviews(id)?))
}

async fn get_book_rating(
    State(store): State<GuardedCatalogStore>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(store.get_book_rating(id)?))
}

async fn import_books(
    State(store): State<GuardedCatalogStore>,
    query: Result<Query<TransferQuery>, QueryRejection>,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let Query(query) = query?;
    let format = query.format()?;
    let id_mode = query.id_mode()?;

    let records = parse_books(format, body.as_ref())?;
    let books = store.import_books(records, id_mode)?;

    info!("Imported {} books from {}", books.len(), format);
    record_transfer("import", format, books.len());

    Ok((
        StatusCode::CREATED,
        Json(ImportSummary {
            imported: books.len(),
            books,
        }),
    ))
}

async fn export_books(
    State(store): State<GuardedCatalogStore>,
    query: Result<Query<TransferQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(query) = query?;
    let format = query.format()?;

    let books = store.find_books(&BookFilter::default())?;
    let mut payload = Vec::new();
    render_books(format, &books, &mut payload)?;

    record_transfer("export", format, books.len());

    Ok(([(header::CONTENT_TYPE, format.content_type())], payload))
}

pub fn make_book_routes(state: ServerState) -> Router {
    let max_import_bytes = state.config.max_import_bytes;

    Router::new()
        .route("/", get(get_books).post(post_book))
        .route("/{id}", get(get_book))
        .route("/{id}/reviews", get(get_book_reviews))
        .route("/{id}/rating", get(get_book_rating))
        .route("/updateById/{id}", put(put_book_by_id))
        .route("/updateByIsbn/{isbn}", put(put_book_by_isbn))
        .route("/deleteById/{id}", delete(delete_book_by_id))
        .route("/deleteByIsbn/{isbn}", delete(delete_book_by_isbn))
        .route(
            "/import",
            post(import_books).layer(DefaultBodyLimit::max(max_import_bytes)),
        )
        .route("/export", get(export_books))
        .with_state(state)
}
