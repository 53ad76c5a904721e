mod server;

pub use server::{DEFAULT_FRONT_URL, DEFAULT_MAX_IMAGE_BYTES, ServerConfig};
