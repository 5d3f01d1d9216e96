//! Signature tab: embedded logo and text label

use eframe::egui;
use tracing::{info, warn};

use super::color_input;
use crate::config::label::FONT_PRESETS;
use crate::config::LabelPosition;
use crate::document::QrDocument;
use crate::gui::constants::*;
use crate::render::logo::{decode_data_url, embed_file};

/// State for the signature tab
pub struct SignatureState {
    fonts: Vec<String>,
    font_load_error: Option<String>,
    logo_error: Option<String>,
    logo_texture: Option<(String, egui::TextureHandle)>,
}

impl SignatureState {
    pub fn new() -> Self {
        // Curated families first, then whatever else is installed
        let mut fonts: Vec<String> = FONT_PRESETS.iter().map(|f| f.to_string()).collect();
        let font_load_error = match crate::font::list_families() {
            Ok(installed) => {
                for family in installed {
                    if !fonts.iter().any(|f| f.eq_ignore_ascii_case(&family)) {
                        fonts.push(family);
                    }
                }
                None
            }
            Err(e) => {
                warn!(error = ?e, "Failed to load font list from fontconfig");
                Some(e.to_string())
            }
        };

        Self {
            fonts,
            font_load_error,
            logo_error: None,
            logo_texture: None,
        }
    }

    fn logo_texture(&mut self, ctx: &egui::Context, data_url: &str) -> Option<egui::TextureHandle> {
        if let Some((source, texture)) = &self.logo_texture {
            if source == data_url {
                return Some(texture.clone());
            }
        }
        let image = decode_data_url(data_url).ok()?;
        let size = [image.width() as usize, image.height() as usize];
        let color = egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw());
        let texture = ctx.load_texture("logo_thumbnail", color, egui::TextureOptions::LINEAR);
        self.logo_texture = Some((data_url.to_string(), texture.clone()));
        Some(texture)
    }
}

impl Default for SignatureState {
    fn default() -> Self {
        Self::new()
    }
}

fn pick_logo() -> Option<std::path::PathBuf> {
    rfd::FileDialog::new()
        .add_filter("Image", &["png", "jpg", "jpeg", "gif", "bmp", "webp"])
        .set_title("Choose a logo")
        .pick_file()
}

fn logo_section(ui: &mut egui::Ui, document: &mut QrDocument, state: &mut SignatureState) -> bool {
    let mut changed = false;
    let style = document.style().clone();

    ui.horizontal(|ui| {
        if let Some(image) = &style.image {
            if let Some(texture) = state.logo_texture(ui.ctx(), image.data_url()) {
                ui.add(
                    egui::Image::new(&texture)
                        .max_size(egui::vec2(64.0, 64.0))
                        .tint(egui::Color32::from_white_alpha(
                            (style.image_options.opacity.clamp(0.0, 1.0) * 255.0) as u8,
                        )),
                );
            }
        }

        let label = if style.image.is_some() { "Replace Logo" } else { "\u{1F5BC} Upload Logo" };
        if ui.button(label).clicked() {
            if let Some(path) = pick_logo() {
                match embed_file(&path) {
                    Ok(image) => {
                        info!(path = %path.display(), "Embedded logo");
                        document.edit_style(|s| s.with_image(Some(image)));
                        state.logo_error = None;
                        changed = true;
                    }
                    Err(err) => {
                        warn!(path = %path.display(), error = ?err, "Failed to embed logo");
                        state.logo_error = Some(format!("{err:#}"));
                    }
                }
            }
        }

        if style.image.is_some() && ui.button("\u{1F5D1} Purge Asset").clicked() {
            document.edit_style(|s| s.with_image(None));
            state.logo_texture = None;
            changed = true;
        }
    });

    if let Some(error) = &state.logo_error {
        ui.colored_label(STATUS_ERROR, error);
    }

    if style.image.is_some() {
        ui.add_space(ITEM_SPACING);
        let mut options = (*style.image_options).clone();

        ui.horizontal(|ui| {
            ui.label("Logo Scale:");
            let mut percent = (options.image_size * 100.0).round() as u32;
            if ui
                .add(egui::Slider::new(&mut percent, 10..=100).step_by(5.0).suffix("%"))
                .changed()
            {
                options.image_size = percent as f32 / 100.0;
            }
        });
        ui.horizontal(|ui| {
            ui.label("Alpha Blending:");
            let mut percent = (options.opacity * 100.0).round() as u32;
            if ui
                .add(egui::Slider::new(&mut percent, 0..=100).step_by(5.0).suffix("%"))
                .changed()
            {
                options.opacity = percent as f32 / 100.0;
            }
        });
        ui.horizontal(|ui| {
            ui.label("Logo Margin:");
            ui.add(egui::Slider::new(&mut options.margin, 0..=60).suffix(" px"));
        });
        ui.checkbox(&mut options.hide_background_dots, "Clear dots behind logo");

        if options != *style.image_options {
            document.edit_style(|s| s.with_image_options(|o| *o = options));
            changed = true;
        }
    }

    changed
}

fn label_section(ui: &mut egui::Ui, document: &mut QrDocument, state: &SignatureState) -> bool {
    let mut changed = false;
    let label = &mut document.label;

    let edit = egui::TextEdit::singleline(&mut label.text)
        .hint_text("Add label text...")
        .desired_width(f32::INFINITY);
    if ui.add(edit).changed() {
        changed = true;
    }
    ui.add_space(ITEM_SPACING);

    ui.horizontal(|ui| {
        ui.label("Font:");
        if let Some(ref error) = state.font_load_error {
            ui.colored_label(STATUS_ERROR, "⚠")
                .on_hover_text(format!("Failed to load fonts: {error}"));
        }
        egui::ComboBox::from_id_salt("label_font_family")
            .selected_text(&label.font)
            .width(200.0)
            .show_ui(ui, |ui| {
                for family in &state.fonts {
                    if ui
                        .selectable_value(&mut label.font, family.clone(), family)
                        .changed()
                    {
                        changed = true;
                    }
                }
            });
    });

    ui.horizontal(|ui| {
        ui.label("Position:");
        egui::ComboBox::from_id_salt("label_position")
            .selected_text(label.position.label())
            .show_ui(ui, |ui| {
                for position in LabelPosition::ALL {
                    if ui
                        .selectable_value(&mut label.position, position, position.label())
                        .changed()
                    {
                        changed = true;
                    }
                }
            });
    });

    ui.label("Text Color:");
    if color_input::ui(ui, "label_color", &mut label.color) {
        changed = true;
    }

    if label.is_active() {
        ui.label(
            egui::RichText::new("SVG export is unavailable while a label is shown")
                .small()
                .weak(),
        );
    }

    changed
}

pub fn ui(ui: &mut egui::Ui, document: &mut QrDocument, state: &mut SignatureState) -> bool {
    let mut changed = false;

    ui.group(|ui| {
        ui.label(egui::RichText::new("Asset Management").strong());
        ui.add_space(ITEM_SPACING);
        changed |= logo_section(ui, document, state);
    });

    ui.add_space(SECTION_SPACING);

    ui.group(|ui| {
        ui.label(egui::RichText::new("Typography Overlay").strong());
        ui.add_space(ITEM_SPACING);
        changed |= label_section(ui, document, state);
    });

    changed
}
