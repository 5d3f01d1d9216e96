//! Colors tab: foreground paint, finder colors and background

use eframe::egui;
use serde_json::{Value, json};
use tracing::warn;

use super::color_input;
use crate::config::style::{ColorStop, Gradient, GradientType, Paint};
use crate::document::QrDocument;
use crate::gui::constants::*;

/// Apply a dotted-path update, keeping the old style if it is rejected
fn set_path(document: &mut QrDocument, path: &str, value: Value) -> bool {
    match document.style().set_path(path, value) {
        Ok(next) => {
            document.replace_style(next);
            true
        }
        Err(err) => {
            warn!(path, error = %err, "Rejected style update");
            false
        }
    }
}

fn gradient_editor(ui: &mut egui::Ui, document: &mut QrDocument, gradient: &Gradient) -> bool {
    let mut changed = false;

    ui.horizontal(|ui| {
        ui.label("Type:");
        for (kind, label) in [(GradientType::Linear, "Linear"), (GradientType::Radial, "Radial")] {
            if ui.selectable_label(gradient.kind == kind, label).clicked() && gradient.kind != kind {
                changed |= set_path(document, "dotsOptions.gradient.type", json!(kind));
            }
        }
    });

    if gradient.kind == GradientType::Linear {
        let mut degrees = gradient.rotation.to_degrees().rem_euclid(360.0).round();
        ui.horizontal(|ui| {
            ui.label("Rotation:");
            if ui
                .add(egui::Slider::new(&mut degrees, 0.0..=360.0).step_by(5.0).suffix("°"))
                .changed()
            {
                changed |= set_path(document, "dotsOptions.gradient.rotation", json!(degrees.to_radians()));
            }
        });
    }

    for (i, stop) in gradient.color_stops.iter().enumerate() {
        ui.add_space(ITEM_SPACING / 2.0);
        ui.label(format!("Stop {} ({:.0}%)", i + 1, stop.offset * 100.0));
        let mut color = stop.color.clone();
        if color_input::ui(ui, &format!("dots_stop_{i}"), &mut color) {
            let mut stops: Vec<ColorStop> = gradient.color_stops.clone();
            stops[i].color = color;
            match serde_json::to_value(&stops) {
                Ok(value) => changed |= set_path(document, "dotsOptions.gradient.colorStops", value),
                Err(err) => warn!(error = %err, "Failed to serialize color stops"),
            }
        }
    }

    changed
}

/// Flat color editor for a region that may currently carry a gradient
fn flat_color(ui: &mut egui::Ui, id: &str, paint: &Paint) -> Option<String> {
    if paint.gradient.is_some() {
        ui.label(
            egui::RichText::new("Gradient active; picking a color makes it flat")
                .small()
                .weak(),
        );
    }
    let mut color = paint.color.clone();
    color_input::ui(ui, id, &mut color).then_some(color)
}

pub fn ui(ui: &mut egui::Ui, document: &mut QrDocument) -> bool {
    let mut changed = false;
    let style = document.style().clone();

    ui.group(|ui| {
        ui.label(egui::RichText::new("Foreground Elements").strong());
        ui.add_space(ITEM_SPACING);

        let gradient = style.dots.paint.gradient.clone();
        ui.horizontal(|ui| {
            if ui.selectable_label(gradient.is_none(), "Solid").clicked() && gradient.is_some() {
                changed |= set_path(document, "dotsOptions.gradient", Value::Null);
            }
            if ui.selectable_label(gradient.is_some(), "Gradient").clicked() && gradient.is_none() {
                document.edit_style(|s| s.with_dots(|d| d.paint.set_gradient(Gradient::starter())));
                changed = true;
            }
        });
        ui.add_space(ITEM_SPACING);

        match &gradient {
            None => {
                let mut color = style.dots.paint.color.clone();
                if color_input::ui(ui, "dots_color", &mut color) {
                    changed |= set_path(document, "dotsOptions.color", json!(color));
                }
            }
            Some(gradient) => {
                changed |= gradient_editor(ui, document, gradient);
            }
        }
    });

    ui.add_space(SECTION_SPACING);

    ui.group(|ui| {
        ui.label(egui::RichText::new("Finder Patterns").strong());
        ui.add_space(ITEM_SPACING);

        ui.label("Corner Squares:");
        if let Some(color) = flat_color(ui, "corner_square_color", &style.corners_square.paint) {
            document.edit_style(|s| s.with_corners_square(|c| c.paint.set_color(color)));
            changed = true;
        }
        ui.add_space(ITEM_SPACING);

        ui.label("Corner Dots:");
        if let Some(color) = flat_color(ui, "corner_dot_color", &style.corners_dot.paint) {
            document.edit_style(|s| s.with_corners_dot(|c| c.paint.set_color(color)));
            changed = true;
        }
    });

    ui.add_space(SECTION_SPACING);

    ui.group(|ui| {
        ui.label(egui::RichText::new("Background Canvas").strong());
        ui.add_space(ITEM_SPACING);
        if let Some(color) = flat_color(ui, "background_color", &style.background.paint) {
            document.edit_style(|s| s.with_background(|b| b.paint.set_color(color)));
            changed = true;
        }
        ui.label(
            egui::RichText::new("Transparent works best for layering")
                .small()
                .weak(),
        );
    });

    changed
}
