//! Label fonts: discovery, loading and caching

pub mod discovery;
mod renderer;

pub use discovery::list_families;
pub use renderer::{FontRenderer, RenderedText, TextRasterizer};

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use tracing::warn;

/// Resolves a family name to something that can draw it
pub trait FontSource: Send + Sync {
    fn load(&self, family: &str) -> Result<Arc<dyn TextRasterizer>>;
}

/// Installed fonts via fontconfig, falling back to a system sans font.
/// Loaded fonts are cached per requested family.
#[derive(Default)]
pub struct SystemFonts {
    cache: Mutex<HashMap<String, Arc<FontRenderer>>>,
}

impl SystemFonts {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FontSource for SystemFonts {
    fn load(&self, family: &str) -> Result<Arc<dyn TextRasterizer>> {
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| anyhow::anyhow!("font cache poisoned"))?;
        if let Some(hit) = cache.get(family) {
            let hit: Arc<dyn TextRasterizer> = hit.clone();
            return Ok(hit);
        }

        let renderer = match FontRenderer::from_family(family) {
            Ok(r) => r,
            Err(err) => {
                warn!(family, error = %err, "Label font not installed, using system font");
                FontRenderer::from_system_font()?
            }
        };
        let renderer = Arc::new(renderer);
        cache.insert(family.to_string(), renderer.clone());
        let renderer: Arc<dyn TextRasterizer> = renderer;
        Ok(renderer)
    }
}
