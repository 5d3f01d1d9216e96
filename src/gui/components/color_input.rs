//! Hex color field with picker button and the fixed palette

use eframe::egui;

use crate::color::{Rgba, format_hex_color, parse_hex_color};
use crate::gui::constants::*;

pub fn to_color32(color: Rgba) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
}

fn from_color32(color: egui::Color32) -> Rgba {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    Rgba { r, g, b, a }
}

/// Small clickable color square; transparent and invalid colors show a checkerboard
pub fn swatch(ui: &mut egui::Ui, color: &str, size: f32) -> egui::Response {
    let (rect, response) = ui.allocate_exact_size(egui::vec2(size, size), egui::Sense::click());
    let painter = ui.painter();
    match parse_hex_color(color) {
        Ok(c) if c.a == 255 => {
            painter.rect_filled(rect, 2.0, to_color32(c));
        }
        parsed => {
            let half = size / 2.0;
            for (i, (dx, dy)) in [(0.0, 0.0), (half, 0.0), (0.0, half), (half, half)].into_iter().enumerate() {
                let cell = egui::Rect::from_min_size(rect.min + egui::vec2(dx, dy), egui::vec2(half, half));
                let shade = if i == 0 || i == 3 { egui::Color32::GRAY } else { egui::Color32::DARK_GRAY };
                painter.rect_filled(cell, 0.0, shade);
            }
            if let Ok(c) = parsed {
                painter.rect_filled(rect, 2.0, to_color32(c));
            }
        }
    }
    painter.rect_stroke(
        rect,
        2.0,
        ui.visuals().widgets.noninteractive.bg_stroke,
        egui::StrokeKind::Inside,
    );
    response
}

/// Edit `value` in place; returns true once it holds a new, valid color.
///
/// The text buffer is kept in egui memory under `id_salt` so a half-typed
/// hex code survives frames without being committed.
pub fn ui(ui: &mut egui::Ui, id_salt: &str, value: &mut String) -> bool {
    let mut changed = false;
    let id = ui.make_persistent_id(id_salt);
    let (committed, mut buffer) = ui
        .data_mut(|d| d.get_temp::<(String, String)>(id))
        .unwrap_or_else(|| (value.clone(), value.clone()));
    if committed != *value {
        buffer = value.clone();
    }

    ui.horizontal(|ui| {
        let mut color = parse_hex_color(value)
            .map(to_color32)
            .unwrap_or(egui::Color32::BLACK);
        if ui.color_edit_button_srgba(&mut color).changed() {
            *value = format_hex_color(from_color32(color));
            buffer = value.clone();
            changed = true;
        }

        let edit = egui::TextEdit::singleline(&mut buffer)
            .id_salt(id_salt)
            .desired_width(100.0)
            .hint_text("#HEX");
        if ui.add(edit).changed() && parse_hex_color(&buffer).is_ok() {
            *value = buffer.trim().to_string();
            changed = true;
        }
        if parse_hex_color(&buffer).is_err() {
            ui.colored_label(STATUS_ERROR, "⚠")
                .on_hover_text("Use #RGB, #RRGGBB, #RRGGBBAA or transparent");
        }
    });

    ui.horizontal_wrapped(|ui| {
        ui.spacing_mut().item_spacing = egui::vec2(4.0, 4.0);
        for color in COLOR_PALETTE {
            if swatch(ui, color, SWATCH_SIZE).on_hover_text(color).clicked() {
                *value = color.to_string();
                buffer = value.clone();
                changed = true;
            }
        }
    });

    ui.data_mut(|d| d.insert_temp(id, (value.clone(), buffer)));
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opaque_color32_round_trip() {
        let c = Rgba { r: 10, g: 20, b: 30, a: 255 };
        assert_eq!(from_color32(to_color32(c)), c);
    }
}
