use std::sync::Arc;
use std::time::Instant;

use axum::extract::{DefaultBodyLimit, Request};
use axum::http::{HeaderValue, Method};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{
    Router,
    routing::{delete, get, patch, post},
};
use tower_http::cors::{Any, CorsLayer};

use super::{images, items};
use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::images::ImageStore;
use crate::service::ItemService;
use crate::store::Store;

/// Room for the non-image parts of a multipart request, so an oversized
/// image still reaches validation and gets a specific error.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

pub struct AppState {
    pub items: ItemService,
    pub images: Arc<ImageStore>,
    /// Origin allowed to call the API from a browser.
    pub allowed_origin: HeaderValue,
    pub body_limit: usize,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: &ServerConfig) -> Result<Self> {
        let allowed_origin = HeaderValue::from_str(&config.front_url)
            .map_err(|_| Error::Config(format!("invalid front url: {}", config.front_url)))?;

        let images = Arc::new(ImageStore::new(&config.images_dir()));

        Ok(Self {
            items: ItemService::new(store, images.clone(), config.max_image_bytes),
            images,
            allowed_origin,
            body_limit: config.max_image_bytes + MULTIPART_OVERHEAD_BYTES,
        })
    }
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

fn cors_layer(allowed_origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(allowed_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(items::hello))
        // Items
        .route("/items", get(items::list_items))
        .route("/items", post(items::add_item))
        .route("/items/{id}", get(items::get_item))
        .route("/items/{id}", patch(items::update_item))
        .route("/items/{id}", delete(items::delete_item))
        .route("/search", get(items::search_items))
        // Images (singular path kept for older clients)
        .route("/images/{name}", get(images::get_image))
        .route("/image/{name}", get(images::get_image))
        .layer(DefaultBodyLimit::max(state.body_limit))
        .layer(cors_layer(state.allowed_origin.clone()))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
