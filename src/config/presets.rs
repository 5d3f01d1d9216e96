//! Built-in style presets
//!
//! A preset is a partial overlay: each section it names replaces the
//! corresponding section of the current configuration wholesale.

use std::sync::{Arc, LazyLock};

use super::style::{
    BackgroundOptions, CornerSquareType, CornersSquareOptions, DotType, DotsOptions, Gradient,
    Paint, StyleConfig,
};

/// Sections a preset replaces; `None` leaves the current section in place
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleOverlay {
    pub dots: Option<DotsOptions>,
    pub background: Option<BackgroundOptions>,
    pub corners_square: Option<CornersSquareOptions>,
    /// Drop any embedded logo
    pub clear_image: bool,
}

impl StyleOverlay {
    /// Shallow merge over `base`; sections the overlay does not name keep their `Arc`
    pub fn apply(&self, base: &StyleConfig) -> StyleConfig {
        let mut next = base.clone();
        if let Some(dots) = &self.dots {
            next.dots = Arc::new(dots.clone());
        }
        if let Some(background) = &self.background {
            next.background = Arc::new(background.clone());
        }
        if let Some(corners) = &self.corners_square {
            next.corners_square = Arc::new(corners.clone());
        }
        if self.clear_image {
            next.image = None;
        }
        next
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    pub name: &'static str,
    pub overlay: StyleOverlay,
}

impl Preset {
    /// Main color for the preset button swatch
    pub fn swatch(&self) -> &str {
        self.overlay
            .dots
            .as_ref()
            .map(|d| d.paint.swatch())
            .unwrap_or("#000000")
    }
}

fn dots(paint: Paint) -> Option<DotsOptions> {
    Some(DotsOptions { kind: DotType::Square, paint })
}

fn corners(color: &str) -> Option<CornersSquareOptions> {
    Some(CornersSquareOptions {
        kind: CornerSquareType::Square,
        paint: Paint::solid(color),
    })
}

fn background(color: &str) -> Option<BackgroundOptions> {
    Some(BackgroundOptions { paint: Paint::solid(color) })
}

pub static PRESETS: LazyLock<Vec<Preset>> = LazyLock::new(|| {
    vec![
        Preset {
            name: "Aurora",
            overlay: StyleOverlay {
                dots: dots(Paint::gradient("#FFFFFF", Gradient::linear(0.785, "#8A2EFF", "#FF4BC8"))),
                background: background("transparent"),
                corners_square: corners("#A76BFF"),
                clear_image: false,
            },
        },
        Preset {
            name: "Classic",
            overlay: StyleOverlay {
                dots: dots(Paint::solid("#000000")),
                background: background("#FFFFFF"),
                corners_square: corners("#000000"),
                clear_image: true,
            },
        },
        Preset {
            name: "Tech Blue",
            overlay: StyleOverlay {
                dots: dots(Paint::solid("#06B6D4")),
                background: background("#020203"),
                corners_square: corners("#06B6D4"),
                clear_image: true,
            },
        },
        Preset {
            name: "Ocean",
            overlay: StyleOverlay {
                dots: dots(Paint::gradient("#FFFFFF", Gradient::linear(0.0, "#00F260", "#0575E6"))),
                background: background("#FFFFFF"),
                corners_square: corners("#0575E6"),
                clear_image: true,
            },
        },
        Preset {
            name: "Graphite",
            overlay: StyleOverlay {
                dots: dots(Paint::gradient("#FFFFFF", Gradient::linear(0.0, "#333333", "#000000"))),
                background: background("#EEEEEE"),
                corners_square: corners("#111111"),
                clear_image: true,
            },
        },
        Preset {
            name: "Cyberpunk",
            overlay: StyleOverlay {
                dots: dots(Paint::gradient("#FFFFFF", Gradient::linear(2.356, "#00FFFF", "#FF00FF"))),
                background: background("#0A0014"),
                corners_square: corners("#FF00FF"),
                clear_image: true,
            },
        },
    ]
});

/// Look up a preset by name, ignoring ASCII case
pub fn find_preset(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::style::{EmbeddedImage, Fill};

    #[test]
    fn test_classic_overlay() {
        let base = StyleConfig::default().with_image(Some(EmbeddedImage::from_data_url("data:x")));
        let classic = find_preset("classic").unwrap();
        let next = classic.overlay.apply(&base);

        assert_eq!(next.dots.paint.effective(), Fill::Solid("#000000"));
        assert_eq!(next.background.paint.effective(), Fill::Solid("#FFFFFF"));
        assert!(next.image.is_none());
        assert!(Arc::ptr_eq(&base.corners_dot, &next.corners_dot));
        assert!(Arc::ptr_eq(&base.qr_options, &next.qr_options));
    }

    #[test]
    fn test_aurora_keeps_logo() {
        let base = StyleConfig::default().with_image(Some(EmbeddedImage::from_data_url("data:x")));
        let next = find_preset("Aurora").unwrap().overlay.apply(&base);
        assert!(next.image.is_some());
        // whole section replaced, so the default corner gradient is gone
        assert_eq!(next.corners_square.paint.effective(), Fill::Solid("#A76BFF"));
    }

    #[test]
    fn test_preset_names_unique() {
        let mut names: Vec<_> = PRESETS.iter().map(|p| p.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), PRESETS.len());
        assert_eq!(find_preset("Ocean").unwrap().swatch(), "#00F260");
    }
}
