//! Production [`QrEngine`]: `qrcode` matrix + our own styling

use std::sync::Arc;

use image::RgbaImage;
use tracing::{debug, warn};

use super::layout::{Scene, build_scene};
use super::logo::decode_data_url;
use super::matrix::QrMatrix;
use super::{QrEngine, RenderError, raster, svg};
use crate::config::StyleConfig;
use crate::config::style::EmbeddedImage;

/// Decoded logo cached against the data URL it came from
#[derive(Debug, Clone)]
struct DecodedLogo {
    source: EmbeddedImage,
    image: Arc<RgbaImage>,
}

#[derive(Debug, Clone)]
pub struct StyledQrEngine {
    text: String,
    style: StyleConfig,
    logo: Option<DecodedLogo>,
    scene: Scene,
    raster: RgbaImage,
}

impl StyledQrEngine {
    pub fn new(text: &str, style: &StyleConfig) -> Result<Self, RenderError> {
        let logo = decode_logo(style.image.as_ref(), None);
        let (scene, raster) = render(text, style, logo.as_ref())?;
        Ok(Self {
            text: text.to_string(),
            style: style.clone(),
            logo,
            scene,
            raster,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn style(&self) -> &StyleConfig {
        &self.style
    }
}

/// Decode the logo unless the cached one came from the same data URL.
/// A logo that fails to decode is skipped rather than failing the render.
fn decode_logo(image: Option<&EmbeddedImage>, cached: Option<&DecodedLogo>) -> Option<DecodedLogo> {
    let source = image?;
    if let Some(hit) = cached.filter(|c| &c.source == source) {
        return Some(hit.clone());
    }
    match decode_data_url(source.data_url()) {
        Ok(image) => Some(DecodedLogo { source: source.clone(), image: Arc::new(image) }),
        Err(err) => {
            warn!(error = %err, "Ignoring embedded image that failed to decode");
            None
        }
    }
}

fn render(
    text: &str,
    style: &StyleConfig,
    logo: Option<&DecodedLogo>,
) -> Result<(Scene, RgbaImage), RenderError> {
    let matrix = QrMatrix::encode(text, &style.qr_options)?;
    let logo_image = logo.map(|l| l.image.as_ref());
    let scene = build_scene(&matrix, style, logo_image.map(|i| i.dimensions()));
    let raster = raster::rasterize(&scene, logo_image)?;
    debug!(
        width = raster.width(),
        height = raster.height(),
        modules = matrix.size(),
        "Rendered QR raster"
    );
    Ok((scene, raster))
}

impl QrEngine for StyledQrEngine {
    fn update(&mut self, text: &str, style: &StyleConfig) -> Result<(), RenderError> {
        let logo = decode_logo(style.image.as_ref(), self.logo.as_ref());
        let (scene, raster) = render(text, style, logo.as_ref())?;
        self.text = text.to_string();
        self.style = style.clone();
        self.logo = logo;
        self.scene = scene;
        self.raster = raster;
        Ok(())
    }

    fn update_data(&mut self, text: &str) -> Result<(), RenderError> {
        let (scene, raster) = render(text, &self.style, self.logo.as_ref())?;
        self.text = text.to_string();
        self.scene = scene;
        self.raster = raster;
        Ok(())
    }

    fn raster(&self) -> &RgbaImage {
        &self.raster
    }

    fn margin(&self) -> u32 {
        self.style.margin
    }

    fn export_svg(&self) -> Result<String, RenderError> {
        let url = self.logo.as_ref().map(|l| l.source.data_url());
        svg::to_svg(&self.scene, url)
    }
}
