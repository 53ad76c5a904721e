use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use tokio_util::io::ReaderStream;
use tracing::error;

use crate::images::{ImageBody, ImageStoreError};
use crate::server::AppState;
use crate::server::response::ApiError;

const JPEG_MEDIA_TYPE: &str = "image/jpeg";

/// GET /images/{name} - Serve an image, or the default image if it is missing
pub async fn get_image(State(state): State<Arc<AppState>>, Path(name): Path<String>) -> Response {
    let (body, size) = match state.images.get_or_default(&name).await {
        Ok(ImageBody::File { reader, size }) => (Body::from_stream(ReaderStream::new(reader)), size),
        Ok(ImageBody::Placeholder(bytes)) => (Body::from(bytes), bytes.len() as u64),
        Err(ImageStoreError::InvalidName(message)) => {
            return ApiError::bad_request(message).into_response();
        }
        Err(e) => {
            error!("Failed to read image {name}: {e}");
            return ApiError::internal("Failed to read image").into_response();
        }
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, JPEG_MEDIA_TYPE)
        .header(header::CONTENT_LENGTH, size)
        .header("X-Content-Type-Options", "nosniff")
        .body(body)
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
