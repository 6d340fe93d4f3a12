//! Image decoding.
//!
//! Backgrounds and icons arrive as files, raw bytes or data URIs. Everything
//! is decoded into a premultiplied tiny-skia [`Pixmap`] ready for drawing.

use std::path::Path;

use base64::Engine;
use tiny_skia::{IntSize, Pixmap};

use crate::error::{RenderError, RenderResult};

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG with alpha support.
    Png,
    /// JPEG (no alpha).
    Jpeg,
    /// WebP (alpha support).
    WebP,
    /// GIF (first frame only).
    Gif,
    /// Unknown/other format.
    Unknown,
}

impl ImageFormat {
    /// Detect format from file extension.
    #[must_use]
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "png" => Self::Png,
            "jpg" | "jpeg" => Self::Jpeg,
            "webp" => Self::WebP,
            "gif" => Self::Gif,
            _ => Self::Unknown,
        }
    }

    /// Detect format from MIME type.
    #[must_use]
    pub fn from_mime(mime: &str) -> Self {
        match mime.to_lowercase().as_str() {
            "image/png" => Self::Png,
            "image/jpeg" | "image/jpg" => Self::Jpeg,
            "image/webp" => Self::WebP,
            "image/gif" => Self::Gif,
            _ => Self::Unknown,
        }
    }

    /// Detect format from magic bytes.
    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            Self::Png
        } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Self::Jpeg
        } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            Self::WebP
        } else if data.starts_with(b"GIF8") {
            Self::Gif
        } else {
            Self::Unknown
        }
    }
}

/// Decode raw image bytes into a premultiplied pixmap.
///
/// # Errors
///
/// Returns an error if the bytes are not a decodable image.
pub fn decode_image(data: &[u8]) -> RenderResult<Pixmap> {
    let format = ImageFormat::from_magic_bytes(data);
    let img = image::load_from_memory(data)
        .map_err(|e| RenderError::Resource(format!("Failed to decode {format:?} image: {e}")))?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let size = IntSize::from_wh(width, height).ok_or(RenderError::PixmapSize { width, height })?;

    let mut data = rgba.into_raw();
    premultiply(&mut data);

    tracing::trace!("Decoded {format:?} image {width}x{height}");
    Pixmap::from_vec(data, size).ok_or(RenderError::PixmapSize { width, height })
}

/// Decode an image from a data URI.
///
/// Supports base64 (`data:image/png;base64,iVBOR...`) and percent-encoded
/// payloads.
///
/// # Errors
///
/// Returns an error if the URI is malformed or the payload is not an image.
pub fn decode_data_uri(uri: &str) -> RenderResult<Pixmap> {
    decode_image(&data_uri_bytes(uri)?)
}

/// Decode an image file from disk.
///
/// # Errors
///
/// Returns an error if the file cannot be read or decoded.
pub fn load_image_file(path: &Path) -> RenderResult<Pixmap> {
    let bytes = std::fs::read(path)
        .map_err(|e| RenderError::Resource(format!("{}: {e}", path.display())))?;
    decode_image(&bytes)
}

/// Extract the payload bytes of a data URI.
///
/// # Errors
///
/// Returns an error if the URI is malformed.
pub fn data_uri_bytes(uri: &str) -> RenderResult<Vec<u8>> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Resource("Not a data URI".to_string()))?;
    let (metadata, payload) = rest
        .split_once(',')
        .ok_or_else(|| RenderError::Resource("Invalid data URI: missing comma".to_string()))?;

    if metadata.ends_with(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| RenderError::Resource(format!("Failed to decode base64: {e}")))
    } else {
        percent_decode(payload)
    }
}

fn percent_decode(input: &str) -> RenderResult<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = bytes
                .get(i + 1..i + 3)
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| RenderError::Resource("Invalid URL encoding".to_string()))?;
            out.push(byte);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Ok(out)
}

#[allow(clippy::cast_possible_truncation)]
fn premultiply(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * a + 127) / 255) as u8;
        }
    }
}
