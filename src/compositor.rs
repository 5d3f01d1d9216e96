//! Combines the engine raster with the text label into one image
//!
//! Canvas height is `qr + block + (VISIBLE_GAP - margin) + FINAL_MARGIN`:
//! the label eats into the QR's quiet zone on its side so that exactly
//! `VISIBLE_GAP` pixels separate it from the outermost modules.

use image::{Rgba as Pixel, RgbaImage};
use tracing::{debug, warn};

use crate::color::{Rgba, parse_hex_color};
use crate::config::{LabelConfig, LabelPosition};
use crate::constants::label::{FINAL_MARGIN, FONT_SIZE_RATIO, MIN_FONT_SIZE, VISIBLE_GAP};
use crate::font::{FontSource, RenderedText, TextRasterizer};
use crate::render::raster::blend;

/// Vertical placement of the two layers inside the composite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeLayout {
    pub width: u32,
    pub height: u32,
    pub qr_y: i64,
    pub text_y: i64,
}

/// Padding between QR raster edge and label, kept so the canvas always
/// grows by at least one row
pub fn padding_adjustment(margin: u32, block: i64) -> i64 {
    (VISIBLE_GAP - margin as i64).max(1 - block - FINAL_MARGIN)
}

pub fn label_font_size(raster_width: u32) -> f32 {
    (raster_width as f32 * FONT_SIZE_RATIO).max(MIN_FONT_SIZE)
}

pub fn layout(qr_width: u32, qr_height: u32, margin: u32, block: i64, position: LabelPosition) -> CompositeLayout {
    let pad = padding_adjustment(margin, block);
    let height = (qr_height as i64 + block + pad + FINAL_MARGIN).max(1);
    let (qr_y, text_y) = match position {
        LabelPosition::Top => (FINAL_MARGIN + block + pad, FINAL_MARGIN),
        _ => (0, qr_height as i64 + pad),
    };
    CompositeLayout { width: qr_width, height: height as u32, qr_y, text_y }
}

fn draw_text(canvas: &mut RgbaImage, text: &RenderedText, x0: i64, y0: i64, color: Rgba) {
    let (w, h) = (canvas.width() as i64, canvas.height() as i64);
    for ty in 0..text.height {
        for tx in 0..text.width {
            let (x, y) = (x0 + tx as i64, y0 + ty as i64);
            if x < 0 || y < 0 || x >= w || y >= h {
                continue;
            }
            let cov = text.coverage(tx, ty);
            if cov > 0 {
                blend(canvas.get_pixel_mut(x as u32, y as u32), color, cov as f32 / 255.0);
            }
        }
    }
}

/// Draw `raster` and the label onto a white canvas
///
/// Returns `None` when there is nothing to add (inactive label or text that
/// rasterizes to nothing).
pub fn compose(
    raster: &RgbaImage,
    margin: u32,
    label: &LabelConfig,
    font: &dyn TextRasterizer,
) -> Option<RgbaImage> {
    if !label.is_active() {
        return None;
    }
    let text = font.render_text(&label.text, label_font_size(raster.width()));
    if text.is_empty() {
        return None;
    }

    let color = parse_hex_color(&label.color).unwrap_or_else(|err| {
        warn!(error = %err, "Invalid label color, drawing in black");
        Rgba::BLACK
    });

    let block = text.height as i64;
    let lay = layout(raster.width(), raster.height(), margin, block, label.position);
    let mut canvas = RgbaImage::from_pixel(lay.width, lay.height, Pixel([255, 255, 255, 255]));

    for (x, y, px) in raster.enumerate_pixels() {
        let cy = lay.qr_y + y as i64;
        if cy < 0 || cy >= lay.height as i64 {
            continue;
        }
        let [r, g, b, a] = px.0;
        blend(canvas.get_pixel_mut(x, cy as u32), Rgba { r, g, b, a }, 1.0);
    }

    let text_x = (lay.width as i64 - text.width as i64) / 2;
    draw_text(&mut canvas, &text, text_x, lay.text_y, color);

    debug!(
        width = lay.width,
        height = lay.height,
        block,
        position = ?label.position,
        "Composited label"
    );
    Some(canvas)
}

/// Composite with font lookup; any missing piece yields the unmodified raster
pub fn compose_or_raw(raster: &RgbaImage, margin: u32, label: &LabelConfig, fonts: &dyn FontSource) -> RgbaImage {
    if !label.is_active() {
        return raster.clone();
    }
    match fonts.load(&label.font) {
        Ok(font) => compose(raster, margin, label, font.as_ref()).unwrap_or_else(|| raster.clone()),
        Err(err) => {
            warn!(font = %label.font, error = %err, "No font for label, exporting plain raster");
            raster.clone()
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Arc;

    /// Block glyphs: every character is a `size/2 × size*0.7` box above a
    /// `size*0.2` descender, so metrics are exact and font-independent
    pub(crate) struct BlockFont;

    impl TextRasterizer for BlockFont {
        fn render_text(&self, text: &str, px: f32) -> RenderedText {
            if text.is_empty() {
                return RenderedText::default();
            }
            let glyph_w = (px / 2.0) as usize;
            let ascent = (px * 0.7) as usize;
            let descent = (px * 0.2) as usize;
            let width = glyph_w * text.chars().count();
            let height = ascent + descent;
            RenderedText { width, height, ascent, descent, mask: vec![255; width * height] }
        }
    }

    pub(crate) struct BlockFonts;

    impl FontSource for BlockFonts {
        fn load(&self, _family: &str) -> anyhow::Result<Arc<dyn TextRasterizer>> {
            Ok(Arc::new(BlockFont))
        }
    }

    struct NoFonts;

    impl FontSource for NoFonts {
        fn load(&self, family: &str) -> anyhow::Result<Arc<dyn TextRasterizer>> {
            Err(anyhow::anyhow!("no font {family}"))
        }
    }

    fn label(text: &str, position: LabelPosition) -> LabelConfig {
        LabelConfig {
            text: text.into(),
            font: "Roboto".into(),
            position,
            color: "#000000".into(),
        }
    }

    fn qr(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Pixel([255, 0, 0, 255]))
    }

    #[test]
    fn test_scan_me_bottom_dimensions() {
        let raster = qr(1000, 1000);
        let l = label("SCAN ME", LabelPosition::Bottom);
        let out = compose_or_raw(&raster, 40, &l, &BlockFonts);

        let block = BlockFont.render_text("SCAN ME", label_font_size(1000)).height as i64;
        assert!(block > 0);
        assert_eq!(out.width(), 1000);
        assert_eq!(out.height() as i64, 1000 + block + (4 - 40) + 5);
        assert!(out.height() > raster.height());
        // deterministic
        assert_eq!(out, compose_or_raw(&raster, 40, &l, &BlockFonts));
    }

    #[test]
    fn test_bottom_layers() {
        let raster = qr(100, 100);
        let out = compose(&raster, 10, &label("AB", LabelPosition::Bottom), &BlockFont).unwrap();
        // 10px font: block 7 + 2 = 9, pad -6 → 100 + 9 - 6 + 5
        assert_eq!(out.height(), 108);
        assert_eq!(out.get_pixel(50, 0).0, [255, 0, 0, 255]);
        // text (two 5px glyphs) centered, starting at the padded row
        assert_eq!(out.get_pixel(50, 94).0, [0, 0, 0, 255]);
        assert_eq!(out.get_pixel(50, 107).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_top_layers() {
        let raster = qr(100, 100);
        let out = compose(&raster, 10, &label("AB", LabelPosition::Top), &BlockFont).unwrap();
        assert_eq!(out.height(), 108);
        assert_eq!(out.get_pixel(50, 0).0, [255, 255, 255, 255]);
        assert_eq!(out.get_pixel(50, 5).0, [0, 0, 0, 255]);
        assert_eq!(out.get_pixel(50, 107).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_inactive_label_returns_raw_raster() {
        let raster = qr(64, 64);
        let hidden = label("SCAN ME", LabelPosition::None);
        assert_eq!(compose_or_raw(&raster, 4, &hidden, &BlockFonts), raster);
        let empty = label("", LabelPosition::Bottom);
        assert_eq!(compose_or_raw(&raster, 4, &empty, &BlockFonts), raster);
    }

    #[test]
    fn test_missing_font_falls_back() {
        let raster = qr(64, 64);
        let l = label("SCAN ME", LabelPosition::Bottom);
        assert_eq!(compose_or_raw(&raster, 4, &l, &NoFonts), raster);
    }

    #[test]
    fn test_huge_margin_still_grows_canvas() {
        let lay = layout(100, 100, 500, 9, LabelPosition::Bottom);
        assert_eq!(lay.height, 101);
        assert_eq!(padding_adjustment(40, 54), -36);
    }

    #[test]
    fn test_transparent_raster_lands_on_white() {
        let raster = RgbaImage::new(100, 100);
        let out = compose(&raster, 10, &label("AB", LabelPosition::Bottom), &BlockFont).unwrap();
        assert_eq!(out.get_pixel(0, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_label_drawn_in_chosen_color() {
        let raster = qr(100, 100);
        let mut l = label("AB", LabelPosition::Top);
        l.color = "#0000FF".into();
        let out = compose(&raster, 10, &l, &BlockFont).unwrap();
        assert_eq!(out.get_pixel(50, 5).0, [0, 0, 255, 255]);
    }
}
