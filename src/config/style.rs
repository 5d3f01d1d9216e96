//! Style configuration for QR rendering
//!
//! Each top-level section lives behind an `Arc` so that an update to one
//! section produces a new configuration sharing every untouched section with
//! its predecessor. See [`super::lens`] for the update API.

use std::f32::consts::FRAC_PI_4;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::constants::render::{DEFAULT_MARGIN, DEFAULT_SIZE};

/// Error-correction level handed to the encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCorrectionLevel {
    L,
    M,
    Q,
    H,
}

impl ErrorCorrectionLevel {
    pub const ALL: [ErrorCorrectionLevel; 4] = [Self::L, Self::M, Self::Q, Self::H];

    pub fn index(self) -> usize {
        match self {
            Self::L => 0,
            Self::M => 1,
            Self::Q => 2,
            Self::H => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::L => "L (7%)",
            Self::M => "M (15%)",
            Self::Q => "Q (25%)",
            Self::H => "H (30%)",
        }
    }
}

/// Segment mode used when building the bit stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncodingMode {
    /// Whole payload as one 8-bit byte segment
    Byte,
    /// Let the encoder pick optimal segments
    Auto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrOptions {
    /// 0 picks the smallest version that fits, 1..=40 forces a version
    pub type_number: u8,
    pub mode: EncodingMode,
    pub error_correction_level: ErrorCorrectionLevel,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            type_number: 0,
            mode: EncodingMode::Byte,
            error_correction_level: ErrorCorrectionLevel::H,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageOptions {
    pub hide_background_dots: bool,
    /// Fraction of the error-correction budget the logo may cover
    pub image_size: f32,
    /// Padding around the logo in pixels
    pub margin: u32,
    pub opacity: f32,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            hide_background_dots: true,
            image_size: 0.4,
            margin: 20,
            opacity: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradientType {
    Linear,
    Radial,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub offset: f32,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gradient {
    #[serde(rename = "type")]
    pub kind: GradientType,
    /// Radians, clockwise from the +x axis
    #[serde(default)]
    pub rotation: f32,
    pub color_stops: Vec<ColorStop>,
}

impl Gradient {
    pub fn linear(rotation: f32, from: &str, to: &str) -> Self {
        Self {
            kind: GradientType::Linear,
            rotation,
            color_stops: vec![
                ColorStop { offset: 0.0, color: from.to_string() },
                ColorStop { offset: 1.0, color: to.to_string() },
            ],
        }
    }

    /// Starting point offered when a region switches from solid to gradient
    pub fn starter() -> Self {
        Self::linear(0.0, "#A855F7", "#06B6D4")
    }
}

/// What a region is filled with
///
/// `gradient`, when present, is the effective paint and `color` is only kept
/// as the fallback shown when the gradient is switched off again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paint {
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient: Option<Gradient>,
}

/// Borrowed view of the paint that actually applies
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fill<'a> {
    Solid(&'a str),
    Gradient(&'a Gradient),
}

impl Paint {
    pub fn solid(color: &str) -> Self {
        Self { color: color.to_string(), gradient: None }
    }

    pub fn gradient(fallback: &str, gradient: Gradient) -> Self {
        Self { color: fallback.to_string(), gradient: Some(gradient) }
    }

    pub fn effective(&self) -> Fill<'_> {
        match &self.gradient {
            Some(g) => Fill::Gradient(g),
            None => Fill::Solid(&self.color),
        }
    }

    /// Writing a flat color makes it the effective paint
    pub fn set_color(&mut self, color: impl Into<String>) {
        self.color = color.into();
        self.gradient = None;
    }

    pub fn set_gradient(&mut self, gradient: Gradient) {
        self.gradient = Some(gradient);
    }

    /// Color used for swatches: first gradient stop, else the flat color
    pub fn swatch(&self) -> &str {
        match &self.gradient {
            Some(g) => g.color_stops.first().map(|s| s.color.as_str()).unwrap_or(&self.color),
            None => &self.color,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DotType {
    Square,
    Dots,
    Rounded,
    Classy,
    ExtraRounded,
}

impl DotType {
    pub const ALL: [DotType; 5] = [
        Self::Square,
        Self::Dots,
        Self::Rounded,
        Self::Classy,
        Self::ExtraRounded,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Square => "Square",
            Self::Dots => "Dots",
            Self::Rounded => "Rounded",
            Self::Classy => "Classy",
            Self::ExtraRounded => "Extra rounded",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CornerSquareType {
    Square,
    Dot,
    ExtraRounded,
}

impl CornerSquareType {
    pub const ALL: [CornerSquareType; 3] = [Self::Square, Self::Dot, Self::ExtraRounded];

    pub fn label(self) -> &'static str {
        match self {
            Self::Square => "Square",
            Self::Dot => "Dot",
            Self::ExtraRounded => "Extra rounded",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CornerDotType {
    Square,
    Dot,
}

impl CornerDotType {
    pub const ALL: [CornerDotType; 2] = [Self::Square, Self::Dot];

    pub fn label(self) -> &'static str {
        match self {
            Self::Square => "Square",
            Self::Dot => "Dot",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DotsOptions {
    #[serde(rename = "type")]
    pub kind: DotType,
    #[serde(flatten)]
    pub paint: Paint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CornersSquareOptions {
    #[serde(rename = "type")]
    pub kind: CornerSquareType,
    #[serde(flatten)]
    pub paint: Paint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CornersDotOptions {
    #[serde(rename = "type")]
    pub kind: CornerDotType,
    #[serde(flatten)]
    pub paint: Paint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundOptions {
    #[serde(flatten)]
    pub paint: Paint,
}

impl Default for DotsOptions {
    fn default() -> Self {
        Self {
            kind: DotType::Square,
            paint: Paint::gradient("#A76BFF", Gradient::linear(FRAC_PI_4, "#8A2EFF", "#46C6FF")),
        }
    }
}

impl Default for CornersSquareOptions {
    fn default() -> Self {
        Self {
            kind: CornerSquareType::Square,
            paint: Paint::gradient("#A76BFF", Gradient::linear(FRAC_PI_4, "#8A2EFF", "#FF4BC8")),
        }
    }
}

impl Default for CornersDotOptions {
    fn default() -> Self {
        Self {
            kind: CornerDotType::Square,
            paint: Paint::solid("#A76BFF"),
        }
    }
}

impl Default for BackgroundOptions {
    fn default() -> Self {
        Self { paint: Paint::solid(crate::color::TRANSPARENT) }
    }
}

/// Logo embedded in the middle of the code, kept as a data URL
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    data_url: Arc<str>,
}

impl EmbeddedImage {
    pub fn from_data_url(data_url: impl Into<Arc<str>>) -> Self {
        Self { data_url: data_url.into() }
    }

    pub fn data_url(&self) -> &str {
        &self.data_url
    }
}

impl PartialEq for EmbeddedImage {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data_url, &other.data_url) || self.data_url == other.data_url
    }
}

/// Complete rendering configuration
#[derive(Debug, Clone, PartialEq)]
pub struct StyleConfig {
    pub width: u32,
    pub height: u32,
    pub margin: u32,
    pub qr_options: Arc<QrOptions>,
    pub image_options: Arc<ImageOptions>,
    pub dots: Arc<DotsOptions>,
    pub corners_square: Arc<CornersSquareOptions>,
    pub corners_dot: Arc<CornersDotOptions>,
    pub background: Arc<BackgroundOptions>,
    pub image: Option<EmbeddedImage>,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_SIZE,
            height: DEFAULT_SIZE,
            margin: DEFAULT_MARGIN,
            qr_options: Arc::default(),
            image_options: Arc::default(),
            dots: Arc::default(),
            corners_square: Arc::default(),
            corners_dot: Arc::default(),
            background: Arc::default(),
            image: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_match_tool_defaults() {
        let style = StyleConfig::default();
        assert_eq!((style.width, style.height, style.margin), (1000, 1000, 40));
        assert_eq!(style.qr_options.error_correction_level, ErrorCorrectionLevel::H);
        assert_eq!(style.qr_options.mode, EncodingMode::Byte);
        assert!(style.image_options.hide_background_dots);
        assert!(matches!(style.dots.paint.effective(), Fill::Gradient(_)));
        assert_eq!(style.background.paint.effective(), Fill::Solid("transparent"));
    }

    #[test]
    fn test_section_json_shape() {
        let value = serde_json::to_value(DotsOptions::default()).unwrap();
        assert_eq!(value["type"], json!("square"));
        assert_eq!(value["color"], json!("#A76BFF"));
        assert_eq!(value["gradient"]["type"], json!("linear"));
        assert_eq!(value["gradient"]["colorStops"][1]["color"], json!("#46C6FF"));

        let corners: CornersSquareOptions =
            serde_json::from_value(json!({"type": "extra-rounded", "color": "#000000"})).unwrap();
        assert_eq!(corners.kind, CornerSquareType::ExtraRounded);
        assert!(corners.paint.gradient.is_none());
    }

    #[test]
    fn test_set_color_clears_gradient() {
        let mut paint = DotsOptions::default().paint;
        paint.set_color("#000000");
        assert_eq!(paint.effective(), Fill::Solid("#000000"));
    }

    #[test]
    fn test_swatch_prefers_first_stop() {
        assert_eq!(DotsOptions::default().paint.swatch(), "#8A2EFF");
        assert_eq!(CornersDotOptions::default().paint.swatch(), "#A76BFF");
    }
}
