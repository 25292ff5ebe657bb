//! End-to-end tests for bulk book import and export

mod common;

use common::*;
use media_catalog_server::server::ServerConfig;
use reqwest::StatusCode;
use serde_json::Value;

const CSV_HEADER: &str = "name,author,publishedYear,isbn,genre,description\n";

#[tokio::test]
async fn test_csv_import_creates_books() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let body = format!(
        "{}The Hobbit,J. R. R. Tolkien,1937,9780547928227,Fantasy,\"There and back, again\"\n\
         Beloved,Toni Morrison,1987,9781400033416,Literary Fiction,Haunting\n",
        CSV_HEADER
    );

    let response = client.import_books("csv", None, body).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let summary: Value = response.json().await.unwrap();
    assert_eq!(summary["imported"], 2);
    assert_eq!(summary["books"][0]["name"], "The Hobbit");
    assert_eq!(summary["books"][0]["description"], "There and back, again");
    assert_eq!(summary["books"][1]["addedOn"], FIXTURE_TIME);

    let books: Vec<Value> = client.get("/books").await.json().await.unwrap();
    assert_eq!(books.len(), BOOK_COUNT + 2);
}

#[tokio::test]
async fn test_csv_import_is_all_or_nothing() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let body = format!(
        "{}The Hobbit,J. R. R. Tolkien,1937,9780547928227,Fantasy,Quest\n\
         Beloved,Toni Morrison,nineteen eighty-seven,9781400033416,Literary Fiction,Haunting\n",
        CSV_HEADER
    );

    let response = client.import_books("csv", None, body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: Value = response.json().await.unwrap();
    assert!(error["error"].as_str().unwrap().contains("line 3"));

    let books: Vec<Value> = client.get("/books").await.json().await.unwrap();
    assert_eq!(books.len(), BOOK_COUNT);
}

#[tokio::test]
async fn test_csv_import_with_wrong_field_count_is_rejected() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let body = format!("{}The Hobbit,J. R. R. Tolkien,1937\n", CSV_HEADER);
    let response = client.import_books("csv", None, body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_import_with_duplicate_isbn_rolls_back() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let body = format!(
        "{}The Hobbit,J. R. R. Tolkien,1937,9780547928227,Fantasy,Quest\n\
         Dune,Frank Herbert,1965,{},Science Fiction,Again\n",
        CSV_HEADER, BOOK_DUNE_ISBN
    );

    let response = client.import_books("csv", None, body).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = client
        .get_query("/books", &[("title", "The Hobbit")])
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_format_is_rejected() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.import_books("xml", None, "<books/>".to_string()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client.export_books("yaml").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client.get("/books/export").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_csv_export() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.export_books("csv").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "text/csv; charset=utf-8"
    );

    let text = response.text().await.unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines[0],
        "id,name,author,publishedYear,isbn,genre,description,addedOn,updatedOn"
    );
    assert_eq!(lines.len(), BOOK_COUNT + 1);
    assert_eq!(
        lines[1],
        format!(
            "1,Dune,Frank Herbert,1965,{},Science Fiction,Dune by Frank Herbert,{},{}",
            BOOK_DUNE_ISBN, FIXTURE_TIME, FIXTURE_TIME
        )
    );
}

#[tokio::test]
async fn test_export_of_empty_catalog() {
    let server = TestServer::spawn_empty().await;
    let client = TestClient::new(server.base_url.clone());

    let csv = client.export_books("csv").await.text().await.unwrap();
    assert_eq!(
        csv,
        "id,name,author,publishedYear,isbn,genre,description,addedOn,updatedOn\n"
    );

    let json = client.export_books("json").await.text().await.unwrap();
    assert_eq!(json, "[]");
}

#[tokio::test]
async fn test_json_round_trip_into_fresh_catalog() {
    let source = TestServer::spawn().await;
    let source_client = TestClient::new(source.base_url.clone());

    let response = source_client.export_books("json").await;
    assert_eq!(response.headers()["content-type"], "application/json");
    let exported = response.text().await.unwrap();

    let target = TestServer::spawn_empty().await;
    let target_client = TestClient::new(target.base_url.clone());

    let response = target_client.import_books("json", None, exported).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let original: Vec<Value> = source_client.get("/books").await.json().await.unwrap();
    let copied: Vec<Value> = target_client.get("/books").await.json().await.unwrap();
    assert_eq!(original.len(), copied.len());
    for (a, b) in original.iter().zip(&copied) {
        for field in [
            "name",
            "author",
            "publishedYear",
            "isbn",
            "genre",
            "description",
            "addedOn",
            "updatedOn",
        ] {
            assert_eq!(a[field], b[field], "field {}", field);
        }
    }
}

#[tokio::test]
async fn test_json_import_regenerates_ids_by_default() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let body = r#"[{"id": 1, "name": "Kindred", "author": "Octavia E. Butler",
                   "publishedYear": 1979, "isbn": "9780807083697",
                   "genre": "Science Fiction", "description": "Time travel"}]"#;

    let response = client.import_books("json", None, body.to_string()).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let summary: Value = response.json().await.unwrap();
    assert_eq!(summary["books"][0]["id"], 4);
}

#[tokio::test]
async fn test_json_import_preserving_taken_id_conflicts() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let body = r#"[{"id": 1, "name": "Kindred", "author": "Octavia E. Butler",
                   "publishedYear": 1979, "isbn": "9780807083697",
                   "genre": "Science Fiction", "description": "Time travel"}]"#;

    let response = client
        .import_books("json", Some("preserve"), body.to_string())
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = client
        .import_books("json", Some("preserve"), body.replace("\"id\": 1", "\"id\": 40"))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(client.get_book(40).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_json_import_is_400() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client
        .import_books("json", None, "[{\"name\": ".to_string())
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_import_body_over_limit_is_rejected() {
    let config = ServerConfig {
        max_import_bytes: 64,
        ..ServerConfig::default()
    };
    let server = TestServer::spawn_with(config, false).await;
    let client = TestClient::new(server.base_url.clone());

    let body = format!(
        "{}{}",
        CSV_HEADER,
        "A Very Long Title,Someone,2000,1,Genre,Description\n".repeat(10)
    );
    let response = client.import_books("csv", None, body).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_json_import_with_inverted_timestamps_is_400() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let body = r#"[{"name": "Kindred", "author": "Octavia E. Butler",
                   "publishedYear": 1979, "isbn": "9780807083697",
                   "genre": "Science Fiction", "description": "Time travel",
                   "addedOn": "2024-01-01T00:00:00Z", "updatedOn": "2020-01-01T00:00:00Z"}]"#;

    let response = client.import_books("json", None, body.to_string()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["fields"]["updatedOn"], "must not precede addedOn");

    let books: Vec<Value> = client.get("/books").await.json().await.unwrap();
    assert_eq!(books.len(), BOOK_COUNT);
}

#[tokio::test]
async fn test_imported_timestamps_match_later_reads() {
    let server = TestServer::spawn_empty().await;
    let client = TestClient::new(server.base_url.clone());

    let body = r#"[{"name": "Kindred", "author": "Octavia E. Butler",
                   "publishedYear": 1979, "isbn": "9780807083697",
                   "genre": "Science Fiction", "description": "Time travel",
                   "addedOn": "2024-01-01T00:00:00.123456Z",
                   "updatedOn": "2024-01-02T00:00:00Z"}]"#;

    let response = client.import_books("json", None, body.to_string()).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let summary: Value = response.json().await.unwrap();
    let imported = &summary["books"][0];
    assert_eq!(imported["addedOn"], "2024-01-01T00:00:00.123Z");

    let stored: Value = client
        .get_book(imported["id"].as_i64().unwrap())
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(&stored, imported);
}
