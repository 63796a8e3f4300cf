//! HTTP integration tests: the real router on an ephemeral port, driven
//! with reqwest.
//!
//! Everything here runs without pdfium: requests either fail before a
//! converter binds the engine or touch only the drop box. Remote inputs are
//! served by a second throwaway axum server on another ephemeral port.
//!
//! Run with:
//!   cargo test --test server -- --nocapture

use axum::body::Body;
use axum::routing::get;
use axum::Router;
use edgequake_convert::{serve, AppState, Artifact, ConversionConfig, ServerConfig};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

struct TestServer {
    base: String,
    state: Arc<AppState>,
    client: reqwest::Client,
    _dir: TempDir,
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

async fn start(max_upload_bytes: usize) -> TestServer {
    start_with(max_upload_bytes, ConversionConfig::default()).await
}

async fn start_with(max_upload_bytes: usize, conversion: ConversionConfig) -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base = format!("http://{addr}");

    let server = ServerConfig {
        bind_address: addr.to_string(),
        output_dir: dir.path().join("converted_files"),
        public_base_url: base.clone(),
        max_upload_bytes,
        ..ServerConfig::default()
    };
    let state = AppState::new(server, conversion).await.unwrap();

    tokio::spawn(serve(listener, state.clone(), std::future::pending()));

    TestServer {
        base,
        state,
        client: reqwest::Client::new(),
        _dir: dir,
    }
}

/// A file host for remote-input tests; returns its base URL.
///
/// - `/missing.pdf` answers 404
/// - `/slow.pdf` answers after five seconds
/// - `/big.pdf` is 4 KiB with a `Content-Length`
/// - `/chunked.pdf` is 8 KiB sent chunked, without a length
async fn file_host() -> String {
    let app = Router::new()
        .route(
            "/missing.pdf",
            get(|| async { axum::http::StatusCode::NOT_FOUND }),
        )
        .route(
            "/slow.pdf",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                b"%PDF-1.4".to_vec()
            }),
        )
        .route("/big.pdf", get(|| async { vec![b'x'; 4096] }))
        .route(
            "/chunked.pdf",
            get(|| async {
                let chunks = (0..8).map(|_| Ok::<_, std::io::Error>(vec![b'x'; 1024]));
                Body::from_stream(futures::stream::iter(chunks))
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await });
    format!("http://{addr}")
}

async fn process_url(srv: &TestServer, url: &str) -> reqwest::Response {
    srv.client
        .post(srv.url("/process"))
        .json(&json!({ "file_type": "pdf-to-word", "url": url }))
        .send()
        .await
        .unwrap()
}

fn file_part(name: &str, mime: &str, bytes: &[u8]) -> Part {
    Part::bytes(bytes.to_vec())
        .file_name(name.to_string())
        .mime_str(mime)
        .unwrap()
}

async fn error_of(resp: reqwest::Response) -> String {
    let body: Value = resp.json().await.unwrap();
    body["error"].as_str().unwrap_or_default().to_string()
}

// ── Liveness ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn status_and_health() {
    let srv = start(1024 * 1024).await;

    let resp = srv.client.get(srv.url("/status")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "status": "File Conversion API is running." }));

    let body: Value = srv
        .client
        .get(srv.url("/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn conversions_table() {
    let srv = start(1024 * 1024).await;
    let body: Value = srv
        .client
        .get(srv.url("/conversions"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let tags: Vec<&str> = body["conversions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["tag"].as_str().unwrap())
        .collect();
    assert_eq!(
        tags,
        [
            "jpg-to-pdf",
            "word-to-pdf",
            "excel-to-pdf",
            "ppt-to-pdf",
            "html-to-pdf",
            "pdf-to-jpg",
            "pdf-to-word",
            "pdf-to-ppt",
            "pdf-to-excel"
        ]
    );
}

// ── /process ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn unsupported_tag_is_rejected() {
    let srv = start(1024 * 1024).await;
    let form = Form::new()
        .text("file_type", "pdf-to-mp3")
        .part("file", file_part("a.pdf", "application/pdf", b"%PDF-1.4"));
    let resp = srv
        .client
        .post(srv.url("/process"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(resp).await, "Unsupported file type: pdf-to-mp3");
}

#[tokio::test]
async fn wrong_format_lists_expected_types() {
    let srv = start(1024 * 1024).await;
    let form = Form::new()
        .text("file_type", "pdf-to-word")
        .part("file", file_part("notes.txt", "text/plain", b"hello"));
    let resp = srv
        .client
        .post(srv.url("/process/"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        error_of(resp).await,
        "Invalid file format: notes.txt. Expected format: application/pdf"
    );
}

#[tokio::test]
async fn missing_fields_are_bad_requests() {
    let srv = start(1024 * 1024).await;

    let form = Form::new().part("file", file_part("a.pdf", "application/pdf", b"%PDF"));
    let resp = srv
        .client
        .post(srv.url("/process"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(error_of(resp).await.contains("file_type"));

    let resp = srv
        .client
        .post(srv.url("/process"))
        .json(&json!({ "file_type": "pdf-to-word", "file_name": "a.pdf" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(error_of(resp).await.contains("'data' or 'url'"));
}

#[tokio::test]
async fn json_with_bad_base64() {
    let srv = start(1024 * 1024).await;
    let resp = srv
        .client
        .post(srv.url("/process"))
        .json(&json!({
            "file_type": "pdf-to-word",
            "file_name": "a.pdf",
            "data": "***not base64***",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(error_of(resp).await.starts_with("Invalid Base64 payload"));
}

#[tokio::test]
async fn json_with_unknown_output_mode() {
    let srv = start(1024 * 1024).await;
    let resp = srv
        .client
        .post(srv.url("/process"))
        .json(&json!({
            "file_type": "pdf-to-word",
            "file_name": "a.pdf",
            "data": "JVBERi0xLjQ=",
            "output": "ftp",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(error_of(resp).await.contains("unknown output mode"));
}

#[tokio::test]
async fn corrupt_image_is_unprocessable() {
    let srv = start(1024 * 1024).await;
    let form = Form::new()
        .text("file_type", "jpg-to-pdf")
        .part("file", file_part("photo.jpg", "image/jpeg", b"definitely not a jpeg"));
    let resp = srv
        .client
        .post(srv.url("/process"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(error_of(resp)
        .await
        .starts_with("JPG-to-PDF conversion failed"));
}

#[tokio::test]
async fn oversized_upload_is_413() {
    let srv = start(1024).await;
    let form = Form::new()
        .text("file_type", "pdf-to-word")
        .part("file", file_part("big.pdf", "application/pdf", &vec![b'x'; 4096]));
    let resp = srv
        .client
        .post(srv.url("/process"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

// ── Remote inputs ────────────────────────────────────────────────────────────

#[tokio::test]
async fn remote_not_found_is_bad_gateway() {
    let host = file_host().await;
    let srv = start(1024 * 1024).await;
    let resp = process_url(&srv, &format!("{host}/missing.pdf")).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let msg = error_of(resp).await;
    assert!(msg.starts_with("Failed to download"), "got: {msg}");
    assert!(msg.contains("404"), "got: {msg}");
}

#[tokio::test]
async fn slow_remote_is_gateway_timeout() {
    let host = file_host().await;
    let config = ConversionConfig::builder()
        .download_timeout_secs(1)
        .build()
        .unwrap();
    let srv = start_with(1024 * 1024, config).await;
    let resp = process_url(&srv, &format!("{host}/slow.pdf")).await;
    assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
    assert!(error_of(resp).await.starts_with("Download timed out after 1s"));
}

#[tokio::test]
async fn oversized_remote_is_413() {
    let host = file_host().await;
    let srv = start(1024).await;
    for path in ["/big.pdf", "/chunked.pdf"] {
        let resp = process_url(&srv, &format!("{host}{path}")).await;
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE, "{path}");
    }
}

#[tokio::test]
async fn non_http_url_is_rejected() {
    let srv = start(1024 * 1024).await;
    let resp = process_url(&srv, "ftp://files.example.com/a.pdf").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(error_of(resp).await.contains("must start with http:// or https://"));
}

// ── /convert/{tag} ───────────────────────────────────────────────────────────

#[tokio::test]
async fn convert_rejects_empty_file() {
    let srv = start(1024 * 1024).await;
    let form = Form::new().part("file", file_part("empty.jpg", "image/jpeg", b""));
    let resp = srv
        .client
        .post(srv.url("/convert/jpg-to-pdf"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(resp).await, "Uploaded file 'empty.jpg' is empty");
}

#[tokio::test]
async fn convert_unknown_tag() {
    let srv = start(1024 * 1024).await;
    let form = Form::new().part("file", file_part("a.pdf", "application/pdf", b"%PDF"));
    let resp = srv
        .client
        .post(srv.url("/convert/pdf-to-gif/"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ── /download ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn download_then_delete() {
    let srv = start(1024 * 1024).await;
    let stored = srv
        .state
        .store
        .save(&Artifact::new(
            "report.pdf",
            "application/pdf",
            b"%PDF-1.4 stored".to_vec(),
        ))
        .await
        .unwrap();
    let path = format!("/download/{}", stored.file_name);

    let resp = srv.client.get(srv.url(&path)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "application/pdf");
    assert!(resp.headers()["content-disposition"]
        .to_str()
        .unwrap()
        .contains(&stored.file_name));
    assert_eq!(resp.bytes().await.unwrap().as_ref(), b"%PDF-1.4 stored");

    let resp = srv.client.delete(srv.url(&path)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["deleted"], stored.file_name);

    let resp = srv.client.get(srv.url(&path)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn download_rejects_odd_names() {
    let srv = start(1024 * 1024).await;
    let resp = srv
        .client
        .get(srv.url("/download/bad%20name.pdf"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = srv
        .client
        .get(srv.url("/download/missing.pdf"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
