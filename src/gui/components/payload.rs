//! Payload tab: encoded text, presets and reset

use eframe::egui;

use super::color_input::{swatch, to_color32};
use crate::color::parse_hex_color;
use crate::config::PRESETS;
use crate::document::QrDocument;
use crate::gui::constants::*;

pub fn ui(ui: &mut egui::Ui, document: &mut QrDocument) -> bool {
    let mut changed = false;

    ui.group(|ui| {
        ui.label(egui::RichText::new("Input Data").strong());
        ui.add_space(ITEM_SPACING);
        let edit = egui::TextEdit::multiline(&mut document.text)
            .hint_text("Enter a URL or any text...")
            .desired_rows(3)
            .desired_width(f32::INFINITY);
        if ui.add(edit).changed() {
            changed = true;
        }
        ui.weak(format!("{} bytes", document.text.len()));
    });

    ui.add_space(SECTION_SPACING);

    ui.group(|ui| {
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("Design Presets").strong());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui
                    .button("\u{21BA} Reset All")
                    .on_hover_text("Restore default style and label")
                    .clicked()
                {
                    document.reset();
                    changed = true;
                }
            });
        });
        ui.add_space(ITEM_SPACING);

        ui.horizontal_wrapped(|ui| {
            for preset in PRESETS.iter() {
                let active = document.selected_preset() == Some(preset.name);
                let main = parse_hex_color(preset.swatch())
                    .map(to_color32)
                    .unwrap_or(ACCENT);
                ui.horizontal(|ui| {
                    swatch(ui, preset.swatch(), 10.0);
                    let text = egui::RichText::new(preset.name);
                    let text = if active { text.color(main).strong() } else { text };
                    if ui.add(egui::Button::new(text).selected(active)).clicked() {
                        document.apply_preset(preset);
                        changed = true;
                    }
                });
            }
        });
    });

    changed
}
