use anyhow::{Context, Result};
use std::time::Duration;

use axum::{extract::State, middleware, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tracing::info;

use super::albums::make_album_routes;
use super::books::make_book_routes;
use super::error::ApiResult;
use super::metrics::{metrics_handler, update_catalog_metrics};
use super::reviews::make_review_routes;
use super::songs::make_song_routes;
use super::{log_requests, state::*, ServerConfig};
use crate::catalog_store::CatalogCounts;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub version: &'static str,
    pub counts: CatalogCounts,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> ApiResult<impl IntoResponse> {
    let counts = state.catalog_store.get_counts()?;
    update_catalog_metrics(counts);

    Ok(Json(ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        version: env!("CARGO_PKG_VERSION"),
        counts,
    }))
}

pub fn make_app(config: ServerConfig, catalog_store: GuardedCatalogStore) -> Result<Router> {
    let state = ServerState::new(config, catalog_store);

    let app: Router = Router::new()
        .route("/", get(home))
        .with_state(state.clone())
        .nest("/albums", make_album_routes(state.clone()))
        .nest("/books", make_book_routes(state.clone()))
        .nest("/songs", make_song_routes(state.clone()))
        .nest("/reviews", make_review_routes(state.clone()))
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn_with_state(state, log_requests));

    Ok(app)
}

fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

async fn refresh_catalog_metrics(catalog_store: GuardedCatalogStore) {
    let mut interval = tokio::time::interval(Duration::from_secs(60));
    loop {
        interval.tick().await;
        match catalog_store.get_counts() {
            Ok(counts) => update_catalog_metrics(counts),
            Err(err) => tracing::warn!("Failed to count catalog items: {}", err),
        }
    }
}

pub async fn run_server(config: ServerConfig, catalog_store: GuardedCatalogStore) -> Result<()> {
    let port = config.port;
    let metrics_port = config.metrics_port;
    let app = make_app(config, catalog_store.clone())?;

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    info!("Ready to serve at port {}!", port);

    if let Some(metrics_port) = metrics_port {
        let metrics_listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", metrics_port))
            .await
            .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;
        info!("Metrics available at port {}!", metrics_port);
        tokio::spawn(async move {
            if let Err(err) = axum::serve(metrics_listener, make_metrics_app()).await {
                tracing::error!("Metrics server stopped: {}", err);
            }
        });
    }

    tokio::spawn(refresh_catalog_metrics(catalog_store));

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Received Ctrl+C, initiating graceful shutdown");
        })
        .await?;
    Ok(())
}
