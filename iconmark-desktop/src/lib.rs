//! # iconmark Desktop
//!
//! Native desktop host for iconmark using winit + wgpu.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p iconmark-desktop -- --background map.png --icon pin.png --icon flag.png
//! ```
//!
//! ## With a persistence server:
//!
//! ```bash
//! cargo run -p iconmark-desktop -- --background map.png --icon pin.png \
//!     --server-url http://localhost:9474 --session <id>
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `DesktopConfig` - Window, palette and server configuration
//! - `IconmarkApp` - Main application implementing `ApplicationHandler`
//! - `IconClient` - `save-icons` / `get-icons` HTTP client
//! - `ImageLoader` - Background image decoding on the tokio runtime

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod app;
pub mod client;
pub mod input;
pub mod loader;

pub use app::{AppEvent, IconmarkApp};
pub use client::{ClientError, ClientResult, IconClient};
pub use input::{CanvasLayout, HostAction, InputMapper};
pub use loader::{ImageLoader, LoadError};

use std::path::PathBuf;

use clap::Parser;
use iconmark_core::ImageSource;

/// Default base URL of the persistence server.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:9474";

/// Command-line arguments for iconmark-desktop.
#[derive(Debug, Clone, Parser)]
#[command(name = "iconmark-desktop")]
#[command(about = "Place icons on a pannable, zoomable image")]
#[command(version)]
pub struct CliArgs {
    /// Background image (file path, URL or data URI)
    #[arg(long)]
    pub background: Option<String>,

    /// Palette icon; repeat for keys 1..9
    #[arg(long = "icon")]
    pub icons: Vec<String>,

    /// Persistence server base URL
    #[arg(long, env = "ICONMARK_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
    pub server_url: String,

    /// Session to load on Ctrl+L before anything has been saved
    #[arg(long, env = "ICONMARK_SESSION")]
    pub session: Option<String>,

    /// Initial icon size in image pixels
    #[arg(long, default_value = "50")]
    pub icon_size: f32,

    /// Window width in pixels
    #[arg(long, default_value = "1280")]
    pub width: u32,

    /// Window height in pixels
    #[arg(long, default_value = "720")]
    pub height: u32,

    /// Directory exports are written to
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,
}

/// Desktop application configuration.
#[derive(Debug, Clone)]
pub struct DesktopConfig {
    /// Window width in pixels.
    pub width: u32,
    /// Window height in pixels.
    pub height: u32,
    /// Window title.
    pub title: String,
    /// Background image.
    pub background: Option<ImageSource>,
    /// Icons behind keys 1..9.
    pub palette: Vec<ImageSource>,
    /// Persistence server base URL.
    pub server_url: String,
    /// Session to load when nothing has been saved yet.
    pub session: Option<String>,
    /// Initial icon size.
    pub icon_size: f32,
    /// Directory exports are written to.
    pub output_dir: PathBuf,
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DesktopConfig {
    /// Create a new desktop configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "iconmark".to_string(),
            background: None,
            palette: Vec::new(),
            server_url: DEFAULT_SERVER_URL.to_string(),
            session: None,
            icon_size: 50.0,
            output_dir: PathBuf::from("."),
        }
    }
}

impl From<CliArgs> for DesktopConfig {
    fn from(args: CliArgs) -> Self {
        let mut palette: Vec<ImageSource> = args.icons.into_iter().map(ImageSource::new).collect();
        if palette.len() > 9 {
            tracing::warn!(
                "Only the first 9 of {} palette icons are reachable from the keyboard",
                palette.len()
            );
            palette.truncate(9);
        }
        Self {
            width: args.width,
            height: args.height,
            title: "iconmark".to_string(),
            background: args.background.map(ImageSource::new),
            palette,
            server_url: args.server_url,
            session: args.session,
            icon_size: args.icon_size,
            output_dir: args.output_dir,
        }
    }
}
