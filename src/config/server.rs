use std::net::SocketAddr;
use std::path::PathBuf;

/// Largest accepted image upload, in bytes.
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 1024 * 1024;

/// Origin allowed by CORS when none is configured.
pub const DEFAULT_FRONT_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// Cross-origin caller allowed to use the API (e.g., the web frontend).
    pub front_url: String,
    pub max_image_bytes: usize,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("listing.db")
    }

    #[must_use]
    pub fn images_dir(&self) -> PathBuf {
        self.data_dir.join("images")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9000,
            data_dir: PathBuf::from("./data"),
            front_url: DEFAULT_FRONT_URL.to_string(),
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}
