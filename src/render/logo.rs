//! Embedded logo handling: data URL encoding and decoding

use std::path::Path;

use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::RgbaImage;

use super::RenderError;
use crate::config::style::EmbeddedImage;

/// Guess an image MIME type from a file extension
pub fn mime_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "image/png",
    }
}

pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Split a base64 data URL into its MIME type and payload bytes
pub fn parse_data_url(url: &str) -> Result<(&str, Vec<u8>), RenderError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Logo("not a data URL".to_string()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| RenderError::Logo("data URL has no payload".to_string()))?;
    let mime = meta
        .strip_suffix(";base64")
        .ok_or_else(|| RenderError::Logo("only base64 data URLs are supported".to_string()))?;
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| RenderError::Logo(e.to_string()))?;
    Ok((mime, bytes))
}

pub fn decode_data_url(url: &str) -> Result<RgbaImage, RenderError> {
    let (_, bytes) = parse_data_url(url)?;
    let image = image::load_from_memory(&bytes).map_err(|e| RenderError::Logo(e.to_string()))?;
    Ok(image.to_rgba8())
}

/// Read an image file and embed it, refusing anything that does not decode
pub fn embed_file(path: &Path) -> Result<EmbeddedImage> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read logo: {}", path.display()))?;
    image::load_from_memory(&bytes)
        .with_context(|| format!("Not a supported image: {}", path.display()))?;
    Ok(EmbeddedImage::from_data_url(to_data_url(mime_for_path(path), &bytes)))
}
