//! Export buttons under the preview

use eframe::egui;

use crate::document::QrDocument;
use crate::export::ExportKind;
use crate::gui::constants::*;

fn icon(kind: ExportKind) -> &'static str {
    match kind {
        ExportKind::Raster => "\u{1F5BC}",
        ExportKind::Vector => "\u{270F}",
        ExportKind::Document => "\u{1F4C4}",
        ExportKind::Clipboard => "\u{1F4CB}",
        ExportKind::Share => "\u{1F517}",
    }
}

/// Render the bar; returns the kind the user clicked, if any.
///
/// `busy` disables every button while an export is still running.
pub fn ui(ui: &mut egui::Ui, document: &QrDocument, busy: bool) -> Option<ExportKind> {
    let mut requested = None;
    let label_active = document.label.is_active();

    ui.horizontal_wrapped(|ui| {
        ui.spacing_mut().item_spacing.x = ITEM_SPACING;
        for kind in ExportKind::ALL {
            let blocked = kind == ExportKind::Vector && label_active;
            let button = egui::Button::new(format!("{} {}", icon(kind), kind.label()));
            let response = ui.add_enabled(!busy && !blocked, button);
            let response = if blocked {
                response.on_disabled_hover_text("SVG cannot include the label; clear the label text or hide it")
            } else {
                response
            };
            if response.clicked() {
                requested = Some(kind);
            }
        }
        if busy {
            ui.spinner();
            ui.colored_label(STATUS_BUSY, "Exporting...");
        }
    });

    requested
}
