//! TrueType text rasterization using fontdue (pure Rust)

use anyhow::{Context, Result};
use fontdue::{Font, FontSettings};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::discovery::{Substitution, find_font_path};

/// Labels are drawn in the bold face when the family has one
const LABEL_STYLE: &str = "Bold";

/// Coverage mask for one line of text
///
/// `ascent + descent == height`; the baseline sits `ascent` rows from the top.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderedText {
    pub width: usize,
    pub height: usize,
    pub ascent: usize,
    pub descent: usize,
    pub mask: Vec<u8>,
}

impl RenderedText {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn coverage(&self, x: usize, y: usize) -> u8 {
        self.mask[y * self.width + x]
    }
}

/// Anything that can lay out and rasterize a single line of text
pub trait TextRasterizer: Send + Sync {
    fn render_text(&self, text: &str, px: f32) -> RenderedText;
}

/// fontdue-backed [`TextRasterizer`]
#[derive(Debug)]
pub struct FontRenderer {
    font: Font,
}

/// Last-resort font files tried when fontconfig finds nothing
const FALLBACK_FONT_FILES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Bold.ttf",
];

impl FontRenderer {
    pub fn from_path(path: PathBuf) -> Result<Self> {
        let font_data = fs::read(&path)
            .with_context(|| format!("Failed to read font file: {}", path.display()))?;

        let font = Font::from_bytes(font_data, FontSettings::default())
            .map_err(|e| anyhow::anyhow!("Failed to parse font {}: {e}", path.display()))?;

        debug!(path = %path.display(), "Loaded font");
        Ok(Self { font })
    }

    /// Load an installed family, preferring its bold face for labels
    pub fn from_family(family: &str) -> Result<Self> {
        let path = find_font_path(family, Some(LABEL_STYLE), Substitution::Refuse)
            .or_else(|_| find_font_path(family, None, Substitution::Refuse))
            .with_context(|| format!("Failed to resolve font '{family}'"))?;

        info!(family, path = %path.display(), "Resolved label font");
        Self::from_path(path)
    }

    /// Whatever sans face the system offers
    pub fn from_system_font() -> Result<Self> {
        if let Ok(path) = find_font_path("Sans", Some(LABEL_STYLE), Substitution::Accept) {
            match Self::from_path(path) {
                Ok(renderer) => return Ok(renderer),
                Err(err) => warn!(error = ?err, "Fontconfig fallback font unusable"),
            }
        }

        for path in FALLBACK_FONT_FILES {
            if let Ok(renderer) = Self::from_path(PathBuf::from(path)) {
                info!(path = %path, "Loaded fallback font from fixed path");
                return Ok(renderer);
            }
        }

        warn!("No usable system font found");
        Err(anyhow::anyhow!(
            "Could not find any system font (tried fontconfig and {:?})",
            FALLBACK_FONT_FILES
        ))
    }
}

impl TextRasterizer for FontRenderer {
    fn render_text(&self, text: &str, px: f32) -> RenderedText {
        if text.is_empty() {
            return RenderedText::default();
        }

        // Layout glyphs
        let mut glyphs = Vec::new();
        let mut x = 0.0f32;
        let mut max_ascent = 0i32;
        let mut max_descent = 0i32;

        for ch in text.chars() {
            let (metrics, bitmap) = self.font.rasterize(ch, px);

            let ascent = metrics.height as i32 + metrics.ymin;
            let descent = -metrics.ymin;
            max_ascent = max_ascent.max(ascent);
            max_descent = max_descent.max(descent);

            glyphs.push((x.round() as i32 + metrics.xmin, metrics, bitmap));
            x += metrics.advance_width;
        }

        let width = x.ceil().max(0.0) as usize;
        let height = (max_ascent + max_descent).max(0) as usize;
        if width == 0 || height == 0 {
            return RenderedText::default();
        }

        let mut mask = vec![0u8; width * height];
        for (x_offset, metrics, bitmap) in glyphs {
            // Baseline is max_ascent rows from the top
            let top = max_ascent - (metrics.height as i32 + metrics.ymin);

            for gy in 0..metrics.height {
                for gx in 0..metrics.width {
                    let px = x_offset + gx as i32;
                    let py = top + gy as i32;
                    if px < 0 || py < 0 || px >= width as i32 || py >= height as i32 {
                        continue;
                    }
                    let idx = py as usize * width + px as usize;
                    mask[idx] = mask[idx].max(bitmap[gy * metrics.width + gx]);
                }
            }
        }

        RenderedText {
            width,
            height,
            ascent: max_ascent.max(0) as usize,
            descent: max_descent.max(0) as usize,
            mask,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_font_metrics() {
        // Skips silently on machines without any fonts
        let Ok(font) = FontRenderer::from_system_font() else {
            return;
        };
        let caps = font.render_text("SCAN ME", 60.0);
        assert!(!caps.is_empty());
        assert_eq!(caps.ascent + caps.descent, caps.height);

        let descender = font.render_text("gjpq", 60.0);
        assert!(descender.descent > 0);
        assert!(font.render_text("", 60.0).is_empty());
    }
}
