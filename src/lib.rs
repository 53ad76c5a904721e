//! # Listing
//!
//! An item listing service, usable both as a standalone binary and as a library.
//! Items are stored in SQLite; their images live in a content-addressed
//! directory where identical uploads share one file.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! listing = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use listing::config::ServerConfig;
//! use listing::server::{AppState, create_router};
//! use listing::store::{SqliteStore, Store};
//!
//! let config = ServerConfig::default();
//! let store = SqliteStore::new(config.db_path()).unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState::new(Arc::new(store), &config).unwrap());
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Builds the `listing` binary. Disable with `default-features = false`.

pub mod config;
pub mod error;
pub mod images;
pub mod server;
pub mod service;
pub mod store;
pub mod types;
