//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per catalog endpoint. When API routes or
//! request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde::Serialize;
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request failed")
    }

    pub async fn get_query<Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> Response {
        self.client
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .expect("GET request failed")
    }

    pub async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("POST request failed")
    }

    pub async fn put_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Response {
        self.client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("PUT request failed")
    }

    pub async fn delete(&self, path: &str) -> Response {
        self.client
            .delete(self.url(path))
            .send()
            .await
            .expect("DELETE request failed")
    }

    pub async fn delete_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Response {
        self.client
            .delete(self.url(path))
            .json(body)
            .send()
            .await
            .expect("DELETE request failed")
    }

    // ========================================================================
    // Albums
    // ========================================================================

    /// GET /albums/{id}
    pub async fn get_album(&self, id: i64) -> Response {
        self.get(&format!("/albums/{}", id)).await
    }

    /// POST /albums/{id}/songs
    pub async fn attach_songs(&self, album_id: i64, song_ids: &[i64]) -> Response {
        self.post_json(&format!("/albums/{}/songs", album_id), song_ids)
            .await
    }

    /// DELETE /albums/{id}/songs
    pub async fn detach_songs(&self, album_id: i64, song_ids: &[i64]) -> Response {
        self.delete_json(&format!("/albums/{}/songs", album_id), song_ids)
            .await
    }

    // ========================================================================
    // Books
    // ========================================================================

    /// GET /books/{id}
    pub async fn get_book(&self, id: i64) -> Response {
        self.get(&format!("/books/{}", id)).await
    }

    /// POST /books/import
    pub async fn import_books(&self, format: &str, ids: Option<&str>, body: String) -> Response {
        let mut query = vec![("format", format)];
        if let Some(ids) = ids {
            query.push(("ids", ids));
        }
        self.client
            .post(self.url("/books/import"))
            .query(&query)
            .body(body)
            .send()
            .await
            .expect("Import request failed")
    }

    /// GET /books/export
    pub async fn export_books(&self, format: &str) -> Response {
        self.get_query("/books/export", &[("format", format)]).await
    }

    // ========================================================================
    // Songs
    // ========================================================================

    /// GET /songs/{id}
    pub async fn get_song(&self, id: i64) -> Response {
        self.get(&format!("/songs/{}", id)).await
    }

    // ========================================================================
    // Ratings
    // ========================================================================

    /// GET /{collection}/{id}/rating, decoded
    pub async fn rating(&self, collection: &str, id: i64) -> f64 {
        let response = self.get(&format!("/{}/{}/rating", collection, id)).await;
        assert!(
            response.status().is_success(),
            "rating request failed with {}",
            response.status()
        );
        response.json().await.expect("rating is a number")
    }

    // ========================================================================
    // Reviews
    // ========================================================================

    /// GET /reviews/{id}
    pub async fn get_review(&self, id: i64) -> Response {
        self.get(&format!("/reviews/{}", id)).await
    }
}
