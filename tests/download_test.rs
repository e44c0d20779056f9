use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use cloud_files::config::TransferConfig;
use cloud_files::services::storage::{LocalStorageService, MemoryStorageService};
use cloud_files::{AppState, create_app};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

fn memory_app(storage: &MemoryStorageService) -> Router {
    create_app(AppState::new(
        Arc::new(storage.clone()),
        TransferConfig::development(),
    ))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_download_streams_stored_file() {
    let dir = tempfile::tempdir().unwrap();
    let data: Vec<u8> = (0..100_000u32).map(|i| (i % 256) as u8).collect();
    std::fs::write(dir.path().join("archive.tar.gz"), &data).unwrap();

    let storage = Arc::new(LocalStorageService::new(dir.path()));
    let app = create_app(AppState::new(
        storage,
        TransferConfig::development().with_storage_dir(dir.path()),
    ));

    let response = app.oneshot(get("/download?file=archive.tar.gz")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "100000");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"archive.tar.gz\"; filename*=UTF-8''archive%2Etar%2Egz"
    );
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(body.as_ref(), data.as_slice());
}

#[tokio::test]
async fn test_missing_parameter_is_bad_request_without_storage_access() {
    let storage = MemoryStorageService::new();
    let app = memory_app(&storage);

    let response = app.clone().oneshot(get("/download")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"], "File parameter is missing");

    let response = app.oneshot(get("/download?file=")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(storage.operation_count(), 0);
}

#[tokio::test]
async fn test_nonexistent_file_is_not_found() {
    let storage = MemoryStorageService::new();
    storage.insert("present.txt", "here");
    let app = memory_app(&storage);

    let response = app.oneshot(get("/download?file=ghost.txt")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = json_body(response).await;
    assert!(json["error"].as_str().unwrap().contains("ghost.txt"));
}

#[tokio::test]
async fn test_path_traversal_is_rejected() {
    let storage = MemoryStorageService::new();
    let app = memory_app(&storage);

    let response = app
        .oneshot(get("/download?file=..%2F..%2Fetc%2Fpasswd"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(storage.operation_count(), 0);
}

#[tokio::test]
async fn test_empty_file_downloads_with_zero_length() {
    let storage = MemoryStorageService::new();
    storage.insert("empty", Vec::<u8>::new());
    let app = memory_app(&storage);

    let response = app.oneshot(get("/download?file=empty")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "0");
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_listing_endpoints() {
    let storage = MemoryStorageService::new();
    storage.insert("b (1).txt", "bb");
    storage.insert("a.txt", "a");
    let app = memory_app(&storage);

    let response = app.clone().oneshot(get("/files")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(
        json,
        serde_json::json!({
            "files": [
                { "name": "a.txt", "size": 1 },
                { "name": "b (1).txt", "size": 2 }
            ]
        })
    );

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let page = String::from_utf8(body.to_vec()).unwrap();
    assert!(page.contains("href=\"/download?file=a%2Etxt\""));
    assert!(page.contains("b (1).txt</a>"));
}

#[tokio::test]
async fn test_health_and_request_id() {
    let storage = MemoryStorageService::new();
    let app = memory_app(&storage);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-request-id"], "abc-123");
    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["storage"], "available");
    assert_eq!(json["backend"], "memory");

    let response = app.oneshot(get("/health")).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_openapi_document_lists_file_routes() {
    let storage = MemoryStorageService::new();
    let app = memory_app(&storage);

    let response = app.oneshot(get("/api-docs/openapi.json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    for path in ["/upload", "/download", "/files", "/health"] {
        assert!(json["paths"].get(path).is_some(), "{}", path);
    }
}
