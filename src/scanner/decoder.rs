//! QR decoding of camera frames with rqrr

use rqrr::PreparedImage;
use tracing::trace;

use super::{Decoder, InversionMode};

/// Luma of an RGBA pixel composited over white
fn luma(px: &[u8]) -> u8 {
    let (r, g, b, a) = (px[0] as u32, px[1] as u32, px[2] as u32, px[3] as u32);
    let y = (r * 299 + g * 587 + b * 114) / 1000;
    ((y * a + 255 * (255 - a)) / 255) as u8
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RqrrDecoder;

impl RqrrDecoder {
    fn decode_pass(rgba: &[u8], width: usize, height: usize, invert: bool) -> Option<String> {
        let mut prepared = PreparedImage::prepare_from_greyscale(width, height, |x, y| {
            let i = (y * width + x) * 4;
            let l = luma(&rgba[i..i + 4]);
            if invert { 255 - l } else { l }
        });
        let grids = prepared.detect_grids();
        trace!(grids = grids.len(), invert, "Scanned frame");
        grids
            .into_iter()
            .find_map(|grid| grid.decode().ok().map(|(_meta, content)| content))
    }
}

impl Decoder for RqrrDecoder {
    fn decode(&self, rgba: &[u8], width: u32, height: u32, mode: InversionMode) -> Option<String> {
        let (w, h) = (width as usize, height as usize);
        if w == 0 || h == 0 || rgba.len() < w * h * 4 {
            return None;
        }
        let passes: &[bool] = match mode {
            InversionMode::DontInvert => &[false],
            InversionMode::AttemptBoth => &[false, true],
        };
        passes.iter().find_map(|&invert| Self::decode_pass(rgba, w, h, invert))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StyleConfig;
    use crate::config::style::{CornerDotType, CornerSquareType, DotType, Paint};
    use crate::render::{QrEngine, StyledQrEngine};

    fn plain_style() -> StyleConfig {
        StyleConfig::default()
            .with_dimensions(400, 400, 20)
            .with_dots(|d| {
                d.kind = DotType::Square;
                d.paint = Paint::solid("#000000");
            })
            .with_corners_square(|c| {
                c.kind = CornerSquareType::Square;
                c.paint = Paint::solid("#000000");
            })
            .with_corners_dot(|c| {
                c.kind = CornerDotType::Square;
                c.paint = Paint::solid("#000000");
            })
    }

    #[test]
    fn test_decodes_rendered_code() {
        let engine = StyledQrEngine::new("https://example.com/scan", &plain_style()).unwrap();
        let raster = engine.raster();
        let text = RqrrDecoder.decode(raster.as_raw(), raster.width(), raster.height(), InversionMode::DontInvert);
        assert_eq!(text.as_deref(), Some("https://example.com/scan"));
    }

    #[test]
    fn test_inverted_code_needs_inversion() {
        let engine = StyledQrEngine::new("hello", &plain_style()).unwrap();
        let mut raster = engine.raster().clone();
        for px in raster.pixels_mut() {
            let l = luma(&px.0);
            px.0 = [255 - l, 255 - l, 255 - l, 255];
        }
        let (w, h) = raster.dimensions();
        assert_eq!(RqrrDecoder.decode(raster.as_raw(), w, h, InversionMode::DontInvert), None);
        assert_eq!(
            RqrrDecoder.decode(raster.as_raw(), w, h, InversionMode::AttemptBoth).as_deref(),
            Some("hello")
        );
    }

    #[test]
    fn test_blank_and_short_buffers() {
        let blank = vec![255u8; 64 * 64 * 4];
        assert_eq!(RqrrDecoder.decode(&blank, 64, 64, InversionMode::AttemptBoth), None);
        assert_eq!(RqrrDecoder.decode(&blank[..10], 64, 64, InversionMode::DontInvert), None);
    }

    #[test]
    fn test_transparent_counts_as_white() {
        assert_eq!(luma(&[0, 0, 0, 0]), 255);
        assert_eq!(luma(&[0, 0, 0, 255]), 0);
    }
}
