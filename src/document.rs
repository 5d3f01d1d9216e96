//! The editable state behind the controls: payload, style, label and the
//! preset marker

use tracing::debug;

use crate::config::{LabelConfig, Preset, StyleConfig};
use crate::constants::payload::DEFAULT_TEXT;

#[derive(Debug, Clone, PartialEq)]
pub struct QrDocument {
    pub text: String,
    style: StyleConfig,
    pub label: LabelConfig,
    selected_preset: Option<&'static str>,
}

impl Default for QrDocument {
    fn default() -> Self {
        Self {
            text: DEFAULT_TEXT.to_string(),
            style: StyleConfig::default(),
            label: LabelConfig::default(),
            selected_preset: None,
        }
    }
}

impl QrDocument {
    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    pub fn selected_preset(&self) -> Option<&'static str> {
        self.selected_preset
    }

    /// Overlay a preset and remember it as the current selection
    pub fn apply_preset(&mut self, preset: &'static Preset) {
        debug!(preset = preset.name, "Applying preset");
        self.style = preset.overlay.apply(&self.style);
        self.selected_preset = Some(preset.name);
    }

    /// Manual style edit; clears the preset marker
    pub fn edit_style(&mut self, edit: impl FnOnce(&StyleConfig) -> StyleConfig) {
        self.style = edit(&self.style);
        self.selected_preset = None;
    }

    /// Replace the style outright, e.g. after a fallible path update
    pub fn replace_style(&mut self, style: StyleConfig) {
        self.edit_style(|_| style);
    }

    /// Restore default style and label; the payload text is kept
    pub fn reset(&mut self) {
        debug!("Resetting style and label to defaults");
        self.style = StyleConfig::default();
        self.label = LabelConfig::default();
        self.selected_preset = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::find_preset;
    use crate::config::style::DotType;

    #[test]
    fn test_preset_marker_lifecycle() {
        let mut doc = QrDocument::default();
        assert_eq!(doc.selected_preset(), None);

        doc.apply_preset(find_preset("Ocean").unwrap());
        assert_eq!(doc.selected_preset(), Some("Ocean"));

        doc.edit_style(|s| s.with_dots(|d| d.kind = DotType::Dots));
        assert_eq!(doc.selected_preset(), None);
        assert_eq!(doc.style().dots.kind, DotType::Dots);
    }

    #[test]
    fn test_reset_keeps_text() {
        let mut doc = QrDocument::default();
        doc.text = "hello".into();
        doc.label.text = "SCAN ME".into();
        doc.apply_preset(find_preset("Classic").unwrap());

        doc.reset();
        assert_eq!(doc.text, "hello");
        assert_eq!(doc.style(), &StyleConfig::default());
        assert!(doc.label.text.is_empty());
        assert_eq!(doc.selected_preset(), None);
    }
}
