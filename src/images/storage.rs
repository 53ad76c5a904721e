use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufReader};
use uuid::Uuid;

use crate::error::Error;

/// Suffix of every stored image.
pub const IMAGE_SUFFIX: &str = ".jpg";

/// Name of the placeholder served for missing images.
pub const DEFAULT_IMAGE_NAME: &str = "default.jpg";

/// Placeholder written as `default.jpg` when the store is bootstrapped.
pub const DEFAULT_IMAGE: &[u8] = include_bytes!("../../assets/default.jpg");

#[derive(Debug, Error)]
pub enum ImageStoreError {
    #[error("image not found")]
    NotFound,
    #[error("invalid image name: {0}")]
    InvalidName(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ImageStoreError {
    fn from_io(e: std::io::Error) -> Self {
        if e.kind() == ErrorKind::NotFound {
            Self::NotFound
        } else {
            Self::Io(e)
        }
    }
}

impl From<ImageStoreError> for Error {
    fn from(e: ImageStoreError) -> Self {
        match e {
            ImageStoreError::NotFound => Error::NotFound,
            ImageStoreError::InvalidName(name) => {
                Error::InvalidArgument(format!("invalid image name: {name}"))
            }
            ImageStoreError::Io(e) => Error::Io(e),
        }
    }
}

/// An image opened for reading.
pub enum ImageBody {
    File { reader: BufReader<File>, size: u64 },
    /// The built-in placeholder, used when `default.jpg` is gone too.
    Placeholder(&'static [u8]),
}

/// Content-addressed blob directory. Files are named by the SHA-256 of
/// their bytes, so identical uploads share one file.
pub struct ImageStore {
    base_path: PathBuf,
}

impl ImageStore {
    pub fn new(images_dir: &Path) -> Self {
        Self {
            base_path: images_dir.to_path_buf(),
        }
    }

    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Returns the file name `bytes` are stored under.
    #[must_use]
    pub fn file_name_for(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        format!("{}{IMAGE_SUFFIX}", hex::encode(hasher.finalize()))
    }

    fn image_path(&self, name: &str) -> PathBuf {
        self.base_path.join(name)
    }

    fn temp_path(&self) -> PathBuf {
        self.base_path.join(format!(".tmp-{}", Uuid::new_v4()))
    }

    /// Creates the directory and writes the placeholder `default.jpg` if
    /// it is missing.
    pub async fn ensure_default(&self) -> Result<(), ImageStoreError> {
        fs::create_dir_all(&self.base_path).await?;
        let path = self.image_path(DEFAULT_IMAGE_NAME);
        if !fs::try_exists(&path).await? {
            self.write_atomic(&path, DEFAULT_IMAGE).await?;
        }
        Ok(())
    }

    pub async fn exists(&self, name: &str) -> Result<bool, ImageStoreError> {
        validate_image_name(name)?;
        Ok(fs::try_exists(self.image_path(name)).await?)
    }

    /// Stores `bytes` and returns their file name. Storing content that is
    /// already present does not rewrite the file.
    pub async fn put(&self, bytes: &[u8]) -> Result<String, ImageStoreError> {
        let name = Self::file_name_for(bytes);
        let path = self.image_path(&name);

        if fs::try_exists(&path).await? {
            return Ok(name);
        }

        fs::create_dir_all(&self.base_path).await?;
        self.write_atomic(&path, bytes).await?;

        Ok(name)
    }

    async fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<(), ImageStoreError> {
        let temp_path = self.temp_path();

        let mut temp_file = File::create(&temp_path).await?;
        let written = async {
            temp_file.write_all(bytes).await?;
            temp_file.sync_all().await
        }
        .await;

        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path).await;
            return Err(ImageStoreError::Io(e));
        }

        if let Err(e) = fs::rename(&temp_path, path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(ImageStoreError::Io(e));
        }

        Ok(())
    }

    pub async fn get(&self, name: &str) -> Result<(BufReader<File>, u64), ImageStoreError> {
        validate_image_name(name)?;
        let file = File::open(self.image_path(name))
            .await
            .map_err(ImageStoreError::from_io)?;

        let size = file.metadata().await?.len();

        Ok((BufReader::new(file), size))
    }

    /// Opens `name`, falling back to the default image when it is missing.
    /// Invalid names are still rejected.
    pub async fn get_or_default(&self, name: &str) -> Result<ImageBody, ImageStoreError> {
        match self.get(name).await {
            Ok((reader, size)) => return Ok(ImageBody::File { reader, size }),
            Err(ImageStoreError::NotFound) => {
                tracing::debug!("Image not found: {name}, serving {DEFAULT_IMAGE_NAME}");
            }
            Err(e) => return Err(e),
        }

        match self.get(DEFAULT_IMAGE_NAME).await {
            Ok((reader, size)) => Ok(ImageBody::File { reader, size }),
            Err(ImageStoreError::NotFound) => {
                tracing::warn!("{DEFAULT_IMAGE_NAME} is missing, serving built-in placeholder");
                Ok(ImageBody::Placeholder(DEFAULT_IMAGE))
            }
            Err(e) => Err(e),
        }
    }

    /// Removes a blob. Returns `false` if it was not there. The default
    /// image is never removed.
    pub async fn delete(&self, name: &str) -> Result<bool, ImageStoreError> {
        validate_image_name(name)?;
        if name == DEFAULT_IMAGE_NAME {
            return Ok(false);
        }

        match fs::remove_file(self.image_path(name)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ImageStoreError::Io(e)),
        }
    }
}

fn validate_image_name(name: &str) -> Result<(), ImageStoreError> {
    if !name.ends_with(IMAGE_SUFFIX) || name.len() == IMAGE_SUFFIX.len() {
        return Err(ImageStoreError::InvalidName(format!(
            "'{name}' does not end with {IMAGE_SUFFIX}"
        )));
    }

    if name.contains(['/', '\\', '\0']) || name.starts_with('.') {
        return Err(ImageStoreError::InvalidName(format!(
            "'{name}' is not a plain file name"
        )));
    }

    Ok(())
}
