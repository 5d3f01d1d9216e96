//! Text label drawn above or below the exported code

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelPosition {
    Top,
    Bottom,
    None,
}

impl LabelPosition {
    pub const ALL: [LabelPosition; 3] = [Self::Bottom, Self::Top, Self::None];

    pub fn label(self) -> &'static str {
        match self {
            Self::Top => "Top",
            Self::Bottom => "Bottom",
            Self::None => "Hidden",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelConfig {
    pub text: String,
    pub font: String,
    pub position: LabelPosition,
    /// Hex color the label text is drawn in, black unless the user picks another
    pub color: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            text: String::new(),
            font: "Poppins".to_string(),
            position: LabelPosition::Bottom,
            color: "#000000".to_string(),
        }
    }
}

impl LabelConfig {
    /// A label only takes part in exports when it has text and a position
    pub fn is_active(&self) -> bool {
        !self.text.is_empty() && self.position != LabelPosition::None
    }
}

/// Families offered in the label font picker
pub const FONT_PRESETS: &[&str] = &[
    "Poppins",
    "Roboto",
    "Open Sans",
    "Lato",
    "Montserrat",
    "Roboto Mono",
    "Lobster",
    "Pacifico",
    "Anton",
    "Oswald",
    "Source Code Pro",
    "Merriweather",
    "Playfair Display",
    "Lora",
    "Nunito",
    "Raleway",
    "Ubuntu",
    "Bebas Neue",
    "Caveat",
    "Shadows Into Light",
    "Major Mono Display",
    "Inconsolata",
    "Fira Code",
    "Zilla Slab",
    "Arvo",
    "Cormorant Garamond",
    "Exo 2",
    "Teko",
    "Crimson Text",
    "Cabin",
    "Josefin Sans",
];
