//! Test helpers: build the router over local storage in a temp directory.
//!
//! Run from workspace root: `cargo test -p picstore-api --test photos_test`.

pub mod fixtures;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer};
use picstore_api::setup::build_app;
use picstore_core::Config;
use picstore_storage::LocalStorage;
use std::sync::Arc;
use tempfile::TempDir;

/// Test application: server and owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn storage_root(&self) -> &std::path::Path {
        self._temp_dir.path()
    }
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {}).await
}

/// Build a test app after letting the caller adjust the configuration.
pub async fn setup_test_app_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = Config::for_local(temp_dir.path());
    configure(&mut config);

    let storage = LocalStorage::new(temp_dir.path())
        .await
        .expect("Failed to create local storage");
    let (_state, app) = build_app(config, Arc::new(storage)).expect("Failed to build app");

    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        _temp_dir: temp_dir,
    }
}

/// POST `data` as the `photo` part of a multipart form.
pub async fn upload_photo(
    client: &TestServer,
    data: Vec<u8>,
    file_name: &str,
    mime_type: &str,
) -> TestResponse {
    let part = Part::bytes(bytes::Bytes::from(data))
        .file_name(file_name.to_string())
        .mime_type(mime_type.to_string());
    let form = MultipartForm::new().add_part("photo", part);

    client.post("/photos").multipart(form).await
}

/// Upload and return the issued identifier, asserting success.
pub async fn upload_ok(client: &TestServer, data: Vec<u8>, mime_type: &str) -> String {
    let response = upload_photo(client, data, "upload", mime_type).await;
    assert_eq!(response.status_code(), 200, "upload failed: {}", response.text());

    let body = response.json::<serde_json::Value>();
    body["photo_uuid"]
        .as_str()
        .expect("photo_uuid missing from response")
        .to_string()
}
