use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;

use super::error::ApiResult;
use super::state::{GuardedCatalogStore, ServerState};
use crate::catalog_store::{NewReview, ReviewUpdate};

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct ListQuery {
    limit: Option<usize>,
}

async fn get_reviews(
    State(store): State<GuardedCatalogStore>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(query) = query?;
    Ok(Json(store.list_reviews(query.limit)?))
}

async fn get_review(
    State(store): State<GuardedCatalogStore>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(store.get_review(id)?))
}

async fn post_review(
    State(store): State<GuardedCatalogStore>,
    body: Result<Json<NewReview>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(review) = body?;
    Ok((StatusCode::CREATED, Json(store.create_review(review)?)))
}

async fn put_review(
    State(store): State<GuardedCatalogStore>,
    Path(id): Path<i64>,
    body: Result<Json<ReviewUpdate>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(update) = body?;
    Ok(Json(store.update_review(id, update)?))
}

async fn delete_review(
    State(store): State<GuardedCatalogStore>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    store.delete_review(id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn make_review_routes(state: ServerState) -> Router {
    Router::new()
        .route("/", get(get_reviews).post(post_review))
        .route("/{id}", get(get_review).put(put_review))
        .route("/delete/{id}", delete(delete_review))
        .with_state(state)
}
