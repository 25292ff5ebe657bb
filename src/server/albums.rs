use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tracing::debug;

use super::error::ApiResult;
use super::state::{GuardedCatalogStore, ServerState};
use crate::catalog_store::{AlbumFields, AlbumFilter};

async fn get_albums(
    State(store): State<GuardedCatalogStore>,
    filter: Result<Query<AlbumFilter>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(filter) = filter?;
    Ok(Json(store.find_albums(&filter)?))
}

async fn get_album(
    State(store): State<GuardedCatalogStore>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(store.get_album(id)?))
}

async fn post_album(
    State(store): State<GuardedCatalogStore>,
    body: Result<Json<AlbumFields>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(fields) = body?;
    let album = store.create_album(fields)?;
    debug!("Created album {}", album.id);
    Ok((StatusCode::CREATED, Json(album)))
}

async fn put_album(
    State(store): State<GuardedCatalogStore>,
    Path(id): Path<i64>,
    body: Result<Json<AlbumFields>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(fields) = body?;
    Ok(Json(store.update_album(id, fields)?))
}

async fn delete_album(
    State(store): State<GuardedCatalogStore>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    store.delete_album(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn post_album_songs(
    State(store): State<GuardedCatalogStore>,
    Path(id): Path<i64>,
    body: Result<Json<Vec<i64>>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(song_ids) = body?;
    let album = store.attach_songs(id, &song_ids)?;
    Ok((StatusCode::CREATED, Json(album)))
}

async fn delete_album_songs(
    State(store): State<GuardedCatalogStore>,
    Path(id): Path<i64>,
    body: Result<Json<Vec<i64>>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(song_ids) = body?;
    store.detach_songs(id, &song_ids)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_album_rating(
    State(store): State<GuardedCatalogStore>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(store.get_album_rating(id)?))
}

pub fn make_album_routes(state: ServerState) -> Router {
    Router::new()
        .route("/", get(get_albums).post(post_album))
        .route("/{id}", get(get_album).put(put_album).delete(delete_album))
        .route(
            "/{id}/songs",
            post(post_album_songs).delete(delete_album_songs),
        )
        .route("/{id}/rating", get(get_album_rating))
        .with_state(state)
}
