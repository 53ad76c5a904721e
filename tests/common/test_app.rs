use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode, header};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use listing::config::ServerConfig;
use listing::images::ImageStore;
use listing::server::{AppState, create_router};
use listing::store::{SqliteStore, Store};

/// A router over a fresh data directory, driven in-process.
pub struct TestApp {
    _temp_dir: TempDir,
    pub config: ServerConfig,
    router: Router,
}

impl TestApp {
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    pub async fn start_with(configure: impl FnOnce(&mut ServerConfig)) -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let mut config = ServerConfig {
            data_dir: temp_dir.path().to_path_buf(),
            ..ServerConfig::default()
        };
        configure(&mut config);

        let store = SqliteStore::new(config.db_path()).expect("open store");
        store.initialize().expect("initialize store");
        ImageStore::new(&config.images_dir())
            .ensure_default()
            .await
            .expect("write default image");

        let state = AppState::new(Arc::new(store), &config).expect("build state");
        let router = create_router(Arc::new(state));

        Self {
            _temp_dir: temp_dir,
            config,
            router,
        }
    }

    pub fn images_dir(&self) -> PathBuf {
        self.config.images_dir()
    }

    /// Image files on disk, excluding the default image.
    pub fn stored_images(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.images_dir())
            .expect("read images dir")
            .map(|entry| entry.expect("dir entry").file_name().to_string_lossy().to_string())
            .filter(|name| name != "default.jpg")
            .collect();
        names.sort();
        names
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Bytes) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        (status, body)
    }

    pub async fn response_headers(&self, request: Request<Body>) -> HeaderMap {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        response.headers().clone()
    }

    pub async fn send_json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, body) = self.send(request).await;
        let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Bytes) {
        self.send(Request::get(uri).body(Body::empty()).expect("request"))
            .await
    }

    pub async fn get_json(&self, uri: &str) -> (StatusCode, Value) {
        self.send_json(Request::get(uri).body(Body::empty()).expect("request"))
            .await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send_json(Request::delete(uri).body(Body::empty()).expect("request"))
            .await
    }

    pub async fn post_form(&self, uri: &str, form: Multipart) -> (StatusCode, Value) {
        self.send_json(form.into_request("POST", uri)).await
    }

    pub async fn patch_form(&self, uri: &str, form: Multipart) -> (StatusCode, Value) {
        self.send_json(form.into_request("PATCH", uri)).await
    }

    /// Posts a complete, valid item.
    pub async fn add_item(&self, name: &str, category: &str, image: &[u8]) -> (StatusCode, Value) {
        let form = Multipart::new()
            .text("name", name)
            .text("category", category)
            .file("image", "photo.jpg", "image/jpeg", image);
        self.post_form("/items", form).await
    }
}

/// Hand-built `multipart/form-data` body.
pub struct Multipart {
    boundary: String,
    body: Vec<u8>,
}

impl Multipart {
    pub fn new() -> Self {
        Self {
            boundary: "listing-test-boundary".to_string(),
            body: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn into_request(mut self, method: &str, uri: &str) -> Request<Body> {
        self.body.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());

        Request::builder()
            .method(method)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", self.boundary),
            )
            .body(Body::from(self.body))
            .expect("request")
    }
}

/// JPEG-framed bytes of `len` bytes whose content depends on `seed`.
pub fn fake_jpeg(len: usize, seed: u8) -> Vec<u8> {
    assert!(len >= 4);
    let mut data = Vec::with_capacity(len);
    data.extend_from_slice(&[0xFF, 0xD8]);
    data.extend((0..len - 4).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)));
    data.extend_from_slice(&[0xFF, 0xD9]);
    data
}
