//! Patterns tab: module shapes, finder styling, error correction and geometry

use eframe::egui;

use crate::config::style::{CornerDotType, CornerSquareType, DotType, ErrorCorrectionLevel};
use crate::constants::render::{MAX_MARGIN, MAX_SIZE, MIN_SIZE};
use crate::document::QrDocument;
use crate::gui::constants::*;

fn combo<T: Copy + PartialEq>(
    ui: &mut egui::Ui,
    id: &str,
    current: T,
    all: &[T],
    label: impl Fn(T) -> &'static str,
) -> Option<T> {
    let mut selected = current;
    egui::ComboBox::from_id_salt(id)
        .selected_text(label(current))
        .width(160.0)
        .show_ui(ui, |ui| {
            for &option in all {
                ui.selectable_value(&mut selected, option, label(option));
            }
        });
    (selected != current).then_some(selected)
}

pub fn ui(ui: &mut egui::Ui, document: &mut QrDocument) -> bool {
    let mut changed = false;
    let style = document.style().clone();

    ui.group(|ui| {
        ui.label(egui::RichText::new("Geometric Architecture").strong());
        ui.add_space(ITEM_SPACING);

        egui::Grid::new("pattern_grid")
            .num_columns(2)
            .spacing([ITEM_SPACING * 2.0, ITEM_SPACING])
            .show(ui, |ui| {
                ui.label("Dot Pattern:");
                if let Some(kind) = combo(ui, "dot_type", style.dots.kind, &DotType::ALL, DotType::label) {
                    document.edit_style(|s| s.with_dots(|d| d.kind = kind));
                    changed = true;
                }
                ui.end_row();

                ui.label("Corner Style:");
                if let Some(kind) = combo(
                    ui,
                    "corner_square_type",
                    style.corners_square.kind,
                    &CornerSquareType::ALL,
                    CornerSquareType::label,
                ) {
                    document.edit_style(|s| s.with_corners_square(|c| c.kind = kind));
                    changed = true;
                }
                ui.end_row();

                ui.label("Corner Dot:");
                if let Some(kind) = combo(
                    ui,
                    "corner_dot_type",
                    style.corners_dot.kind,
                    &CornerDotType::ALL,
                    CornerDotType::label,
                ) {
                    document.edit_style(|s| s.with_corners_dot(|c| c.kind = kind));
                    changed = true;
                }
                ui.end_row();
            });
    });

    ui.add_space(SECTION_SPACING);

    ui.group(|ui| {
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("Error Resistance").strong());
            ui.colored_label(ACCENT, format!("{} Level", style.qr_options.error_correction_level.label()));
        });
        ui.add_space(ITEM_SPACING);
        ui.horizontal(|ui| {
            for level in ErrorCorrectionLevel::ALL {
                let active = style.qr_options.error_correction_level == level;
                if ui.selectable_label(active, level.label()).clicked() && !active {
                    document.edit_style(|s| s.with_qr_options(|q| q.error_correction_level = level));
                    changed = true;
                }
            }
        });
        ui.label(
            egui::RichText::new("Higher levels survive more damage and larger logos")
                .small()
                .weak(),
        );
    });

    ui.add_space(SECTION_SPACING);

    ui.group(|ui| {
        ui.label(egui::RichText::new("Canvas").strong());
        ui.add_space(ITEM_SPACING);

        let mut size = style.width;
        let mut margin = style.margin;
        ui.horizontal(|ui| {
            ui.label("Export Size:");
            ui.add(egui::Slider::new(&mut size, MIN_SIZE..=MAX_SIZE).step_by(50.0).suffix(" px"));
        });
        ui.horizontal(|ui| {
            ui.label("Quiet Zone:");
            ui.add(egui::Slider::new(&mut margin, 0..=MAX_MARGIN).suffix(" px"));
        });
        if size != style.width || margin != style.margin {
            document.edit_style(|s| s.with_dimensions(size, size, margin));
            changed = true;
        }
    });

    changed
}
