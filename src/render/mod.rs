//! Styled QR rendering
//!
//! The matrix comes from the `qrcode` encoder; everything visual (dot
//! shapes, finder styling, gradients, logo) is laid out once as a
//! [`layout::Scene`] and then either rasterized or written as SVG.

pub mod adapter;
pub mod engine;
pub mod layout;
pub mod logo;
pub mod matrix;
pub mod png;
pub mod raster;
pub mod svg;

use image::RgbaImage;
use thiserror::Error;

use crate::color::ColorParseError;
use crate::config::StyleConfig;

pub use adapter::RendererAdapter;
pub use engine::StyledQrEngine;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to encode QR matrix: {0}")]
    Encode(String),
    #[error(transparent)]
    Color(#[from] ColorParseError),
    #[error("invalid embedded image: {0}")]
    Logo(String),
    #[error("failed to encode PNG: {0}")]
    Png(String),
    #[error("raster is empty")]
    EmptyRaster,
}

/// Capability the preview and exports need from a QR styling engine
pub trait QrEngine {
    /// Re-initialize with a full configuration
    fn update(&mut self, text: &str, style: &StyleConfig) -> Result<(), RenderError>;

    /// Replace only the encoded text, keeping the current style
    fn update_data(&mut self, text: &str) -> Result<(), RenderError>;

    /// Current raster, `width × height` of the applied style
    fn raster(&self) -> &RgbaImage;

    /// Quiet-zone margin the raster was drawn with
    fn margin(&self) -> u32;

    /// Native raster export
    fn export_png(&self) -> Result<Vec<u8>, RenderError> {
        png::encode_rgba(self.raster())
    }

    /// Native vector export
    fn export_svg(&self) -> Result<String, RenderError>;
}
