use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use super::error::ApiResult;
use super::state::{GuardedCatalogStore, ServerState};
use crate::catalog_store::{SongFields, SongFilter};

async fn get_songs(
    State(store): State<GuardedCatalogStore>,
    filter: Result<Query<SongFilter>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(filter) = filter?;
    Ok(Json(store.find_songs(&filter)?))
}

async fn get_song(
    State(store): State<GuardedCatalogStore>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(store.get_song(id)?))
}

async fn post_song(
    State(store): State<GuardedCatalogStore>,
    body: Result<Json<SongFields>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(fields) = body?;
    Ok((StatusCode::CREATED, Json(store.create_song(fields)?)))
}

async fn put_song(
    State(store): State<GuardedCatalogStore>,
    Path(id): Path<i64>,
    body: Result<Json<SongFields>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(fields) = body?;
    Ok(Json(store.update_song(id, fields)?))
}

async fn delete_song(
    State(store): State<GuardedCatalogStore>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    store.delete_song(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_song_reviews(
    State(store): State<GuardedCatalogStore>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(store.get_song_reviews(id)?))
}

async fn get_song_rating(
    State(store): State<GuardedCatalogStore>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(store.get_song_rating(id)?))
}

pub fn make_song_routes(state: ServerState) -> Router {
    Router::new()
        .route("/", get(get_songs).post(post_song))
        .route("/{id}", get(get_song).put(put_song).delete(delete_song))
        .route("/{id}/reviews", get(get_song_reviews))
        .route("/{id}/rating", get(get_song_rating))
        .with_state(state)
}
