//! # iconmark Server Library
//!
//! Persistence service for placed icons. A save stores the submitted list
//! under a fresh session id; a load returns it unchanged.
//! This library is used by both the binary and integration tests.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use axum::http::{header, HeaderValue, Method};
use clap::Parser;
use tower_http::cors::CorsLayer;

pub mod health;
pub mod metrics;
pub mod routes;
pub mod sessions;
pub mod validation;

pub use routes::{router, ApiError, SaveIconsRequest, SaveIconsResponse};
pub use sessions::{SessionStore, StoreError, StoreResult};

/// Default port for the server.
pub const DEFAULT_PORT: u16 = 9474;

/// Shared application state.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    /// Saved sessions.
    pub sessions: SessionStore,
}

impl AppState {
    /// Wrap a session store.
    #[must_use]
    pub fn new(sessions: SessionStore) -> Self {
        Self { sessions }
    }
}

/// Command-line and environment configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "iconmark-server", version, about)]
pub struct ServerConfig {
    /// Port to listen on.
    #[arg(long, env = "ICONMARK_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind.
    #[arg(long, env = "ICONMARK_BIND", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub bind: IpAddr,

    /// Directory for JSON session files. Sessions are kept in memory only
    /// when unset.
    #[arg(long, env = "ICONMARK_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}

impl ServerConfig {
    /// Open the session store this configuration describes.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created or read.
    pub fn open_store(&self) -> StoreResult<SessionStore> {
        match &self.data_dir {
            Some(dir) => SessionStore::with_data_dir(dir),
            None => Ok(SessionStore::new()),
        }
    }
}

/// Build a CORS layer that only allows localhost origins.
#[must_use]
pub fn build_cors_layer(port: u16) -> CorsLayer {
    let localhost_origins = [
        format!("http://localhost:{port}"),
        format!("http://127.0.0.1:{port}"),
        // Common dev server ports
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
        "http://localhost:8080".to_string(),
        "http://127.0.0.1:3000".to_string(),
        "http://127.0.0.1:5173".to_string(),
        "http://127.0.0.1:8080".to_string(),
    ];

    let origins: Vec<HeaderValue> = localhost_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ServerConfig::parse_from(["iconmark-server"]);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.bind, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn test_config_flags() {
        let config = ServerConfig::parse_from([
            "iconmark-server",
            "--port",
            "8123",
            "--bind",
            "0.0.0.0",
            "--data-dir",
            "/tmp/iconmark",
        ]);
        assert_eq!(config.port, 8123);
        assert_eq!(config.bind, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/iconmark")));
    }

    #[test]
    fn test_in_memory_store_without_data_dir() {
        let config = ServerConfig::parse_from(["iconmark-server"]);
        let store = config.open_store().expect("store");
        assert!(store.data_dir().is_none());
    }
}
