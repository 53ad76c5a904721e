use bytes::Bytes;

use crate::error::{Error, Result};

const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg"];
const JPEG_CONTENT_TYPE: &str = "image/jpeg";

/// An uploaded image as received from the client.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

fn validate_required(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidArgument(format!("{field} is required")));
    }
    Ok(())
}

pub fn validate_item_name(name: &str) -> Result<()> {
    validate_required(name, "name")
}

pub fn validate_category_name(name: &str) -> Result<()> {
    validate_required(name, "category")
}

/// Keywords are matched as substrings, so whitespace is a valid keyword.
pub fn validate_keyword(keyword: &str) -> Result<()> {
    if keyword.is_empty() {
        return Err(Error::InvalidArgument("keyword is required".to_string()));
    }
    Ok(())
}

pub fn validate_image(image: &ImageUpload, max_bytes: usize) -> Result<()> {
    let file_name = image.file_name.to_ascii_lowercase();
    if !ALLOWED_IMAGE_EXTENSIONS.iter().any(|ext| file_name.ends_with(ext)) {
        return Err(Error::InvalidArgument(
            "only .jpg or .jpeg files are allowed".to_string(),
        ));
    }

    if image.bytes.is_empty() {
        return Err(Error::InvalidArgument("image is empty".to_string()));
    }

    if image.bytes.len() > max_bytes {
        return Err(Error::InvalidArgument(format!(
            "image size ({} bytes) exceeds maximum allowed size ({max_bytes} bytes)",
            image.bytes.len()
        )));
    }

    if image.content_type.as_deref() != Some(JPEG_CONTENT_TYPE) {
        return Err(Error::InvalidArgument(format!(
            "image content type must be {JPEG_CONTENT_TYPE}"
        )));
    }

    Ok(())
}
