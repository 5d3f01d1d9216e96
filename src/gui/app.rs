//! The studio window: controls on the left, live preview and exports on the right

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};
use eframe::{CreationContext, NativeOptions, egui};
use tracing::{debug, error, info, warn};

use super::components::scanner_modal::ScannerModal;
use super::components::signature::SignatureState;
use super::components::{colors, export_bar, patterns, payload, signature};
use super::constants::*;
use crate::compositor::compose_or_raw;
use crate::config::{LabelConfig, Settings, StyleConfig, Theme};
use crate::document::QrDocument;
use crate::export::{ExportCoordinator, ExportKind, ExportOutcome, ExportReport, ExportServices};
use crate::font::FontSource;
use crate::render::{QrEngine, RendererAdapter, StyledQrEngine};
use crate::scanner::{CameraProvider, Decoder};

/// Everything the studio needs from the outside world, resolved once in `main`
#[derive(Clone)]
pub struct StudioServices {
    pub export: ExportServices,
    pub camera: Arc<dyn CameraProvider>,
    pub decoder: Arc<dyn Decoder>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Payload,
    Patterns,
    Colors,
    Signature,
}

impl Tab {
    const ALL: [Tab; 4] = [Tab::Payload, Tab::Patterns, Tab::Colors, Tab::Signature];

    fn label(self) -> &'static str {
        match self {
            Tab::Payload => "\u{270D} Payload",
            Tab::Patterns => "\u{25A6} Patterns",
            Tab::Colors => "\u{1F3A8} Colors",
            Tab::Signature => "\u{1F58B} Signature",
        }
    }
}

struct StatusMessage {
    text: String,
    color: egui::Color32,
    shown_at: Instant,
}

/// Preview texture and the inputs it was built from
struct PreviewTexture {
    revision: u64,
    label: LabelConfig,
    texture: egui::TextureHandle,
}

struct StudioApp {
    settings: Settings,
    document: QrDocument,
    adapter: RendererAdapter<StyledQrEngine>,
    fonts: Arc<dyn FontSource>,
    preview: Option<PreviewTexture>,
    exporter: ExportCoordinator,
    report_tx: Sender<ExportReport>,
    report_rx: Receiver<ExportReport>,
    exports_in_flight: usize,
    status: Option<StatusMessage>,
    tab: Tab,
    signature: SignatureState,
    scanner: ScannerModal,
    last_scanned: Option<String>,
}

impl StudioApp {
    fn new(cc: &CreationContext<'_>, settings: Settings, document: QrDocument, services: StudioServices) -> Self {
        info!(theme = ?settings.theme, "Initializing studio");
        apply_theme(&cc.egui_ctx, settings.theme);

        let (report_tx, report_rx) = mpsc::channel();
        Self {
            settings,
            document,
            adapter: RendererAdapter::new(Box::new(|text: &str, style: &StyleConfig| {
                StyledQrEngine::new(text, style)
            })),
            fonts: services.export.fonts.clone(),
            preview: None,
            exporter: ExportCoordinator::new(services.export),
            report_tx,
            report_rx,
            exports_in_flight: 0,
            status: None,
            tab: Tab::Payload,
            signature: SignatureState::new(),
            scanner: ScannerModal::new(services.camera, services.decoder),
            last_scanned: None,
        }
    }

    fn set_status(&mut self, text: impl Into<String>, color: egui::Color32) {
        self.status = Some(StatusMessage {
            text: text.into(),
            color,
            shown_at: Instant::now(),
        });
    }

    fn toggle_theme(&mut self, ctx: &egui::Context) {
        self.settings.theme = self.settings.theme.toggled();
        apply_theme(ctx, self.settings.theme);
        if let Err(err) = self.settings.save() {
            error!(error = ?err, "Failed to save settings after theme change");
            self.set_status(format!("Could not save settings: {err}"), STATUS_ERROR);
        }
    }

    fn request_export(&mut self, kind: ExportKind) {
        let doc = &self.document;
        let job = match self.exporter.prepare(kind, &doc.text, doc.style(), &doc.label) {
            Ok(job) => job,
            Err(err) => {
                warn!(kind = ?kind, error = %err, "Export rejected");
                self.set_status(err.to_string(), STATUS_ERROR);
                return;
            }
        };

        match self.exporter.spawn(job, self.report_tx.clone()) {
            Ok(()) => {
                self.exports_in_flight += 1;
                self.set_status(format!("Exporting {}...", kind.label()), STATUS_BUSY);
            }
            Err(err) => self.set_status(err.to_string(), STATUS_ERROR),
        }
    }

    fn poll_exports(&mut self) {
        let reports: Vec<ExportReport> = self.report_rx.try_iter().collect();
        for report in reports {
            self.exports_in_flight = self.exports_in_flight.saturating_sub(1);
            match report.result {
                Ok(ExportOutcome::Saved(path)) => {
                    self.set_status(format!("Saved {}", path.display()), STATUS_OK);
                }
                Ok(ExportOutcome::Copied) => self.set_status("Copied to clipboard", STATUS_OK),
                Ok(ExportOutcome::Shared) => self.set_status("Handed off for sharing", STATUS_OK),
                Err(err) if err.is_cancellation() => self.status = None,
                Err(err) => {
                    self.set_status(format!("{} failed: {err}", report.kind.label()), STATUS_ERROR);
                }
            }
        }
    }

    fn poll_scanner(&mut self, ctx: &egui::Context) {
        if let Some(text) = self.scanner.ui(ctx) {
            info!(len = text.len(), "Scanned payload applied");
            self.document.text = text.clone();
            self.last_scanned = Some(text);
            self.set_status("QR code scanned", STATUS_OK);
        }
    }

    fn refresh_preview(&mut self, ctx: &egui::Context) {
        let revision = self.adapter.revision();
        let label = &self.document.label;
        if matches!(&self.preview, Some(p) if p.revision == revision && p.label == *label) {
            return;
        }
        let Some(engine) = self.adapter.engine() else {
            return;
        };

        let image = compose_or_raw(engine.raster(), engine.margin(), label, self.fonts.as_ref());
        let size = [image.width() as usize, image.height() as usize];
        let color = egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw());
        let texture = match self.preview.take() {
            Some(mut preview) => {
                preview.texture.set(color, egui::TextureOptions::LINEAR);
                preview.texture
            }
            None => ctx.load_texture("qr_preview", color, egui::TextureOptions::LINEAR),
        };
        self.preview = Some(PreviewTexture {
            revision,
            label: label.clone(),
            texture,
        });
    }

    fn header(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.horizontal(|ui| {
            ui.heading("iLoveQR");
            ui.label(egui::RichText::new("Studio").weak());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let theme_icon = match self.settings.theme {
                    Theme::Dark => "\u{2600}",
                    Theme::Light => "\u{1F319}",
                };
                if ui.button(theme_icon).on_hover_text("Toggle theme").clicked() {
                    self.toggle_theme(ctx);
                }
                let scanning = self.scanner.is_open();
                if ui
                    .add_enabled(!scanning, egui::Button::new("\u{1F4F7} Scan"))
                    .on_hover_text("Read a QR code from the camera")
                    .clicked()
                {
                    self.scanner.start(ctx);
                }
            });
        });
    }

    fn last_scanned_banner(&mut self, ui: &mut egui::Ui) {
        let Some(text) = self.last_scanned.clone() else {
            return;
        };
        ui.group(|ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("Last Scanned").strong());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Clear").clicked() {
                        self.last_scanned = None;
                    }
                });
            });
            if is_web_link(&text) {
                if ui.link(&text).clicked() {
                    if let Err(err) = open::that(&text) {
                        warn!(url = %text, error = %err, "Failed to open scanned link");
                        self.set_status(format!("Could not open link: {err}"), STATUS_ERROR);
                    }
                }
            } else {
                ui.label(&text);
            }
        });
        ui.add_space(SECTION_SPACING);
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            for tab in Tab::ALL {
                ui.selectable_value(&mut self.tab, tab, tab.label());
            }
        });
        ui.separator();
        ui.add_space(ITEM_SPACING);

        egui::ScrollArea::vertical().show(ui, |ui| {
            self.last_scanned_banner(ui);
            let edited = match self.tab {
                Tab::Payload => payload::ui(ui, &mut self.document),
                Tab::Patterns => patterns::ui(ui, &mut self.document),
                Tab::Colors => colors::ui(ui, &mut self.document),
                Tab::Signature => signature::ui(ui, &mut self.document, &mut self.signature),
            };
            // The adapter already saw this frame's document; pick the edit up next frame
            if edited {
                debug!(tab = ?self.tab, "Document edited");
                ui.ctx().request_repaint();
            }
        });
    }

    fn preview_panel(&mut self, ui: &mut egui::Ui, now: Instant) {
        ui.add_space(PADDING);
        ui.label(egui::RichText::new("Live Preview").strong());
        ui.add_space(ITEM_SPACING);

        let side = ui.available_width().min(PREVIEW_PANEL_WIDTH - 2.0 * PADDING);
        match &self.preview {
            Some(preview) => {
                ui.scope(|ui| {
                    ui.set_opacity(self.adapter.opacity(now));
                    ui.add(egui::Image::new(&preview.texture).max_width(side).max_height(side * 1.3));
                });
            }
            None => {
                ui.allocate_ui(egui::vec2(side, side), |ui| {
                    ui.centered_and_justified(|ui| ui.spinner());
                });
            }
        }

        if let Some(err) = self.adapter.last_error() {
            ui.colored_label(STATUS_ERROR, format!("Render failed: {err}"));
        }

        ui.add_space(SECTION_SPACING);
        ui.label(egui::RichText::new("Export").strong());
        ui.add_space(ITEM_SPACING);
        if let Some(kind) = export_bar::ui(ui, &self.document, self.exports_in_flight > 0) {
            self.request_export(kind);
        }

        if let Some(status) = &self.status {
            ui.add_space(ITEM_SPACING);
            ui.colored_label(status.color, &status.text);
        }
    }

    fn expire_status(&mut self, now: Instant) -> Option<Duration> {
        let timeout = Duration::from_secs(STATUS_TIMEOUT_SECS);
        let status = self.status.as_ref()?;
        // Busy notices stay until the export reports back
        if status.color == STATUS_BUSY && self.exports_in_flight > 0 {
            return None;
        }
        let age = now.saturating_duration_since(status.shown_at);
        if age >= timeout {
            self.status = None;
            None
        } else {
            Some(timeout - age)
        }
    }
}

impl eframe::App for StudioApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.poll_exports();
        self.poll_scanner(ctx);

        self.adapter.request(&self.document.text, self.document.style(), now);
        self.adapter.tick(now);
        self.refresh_preview(ctx);

        egui::TopBottomPanel::top("studio_header").show(ctx, |ui| {
            ui.add_space(ITEM_SPACING / 2.0);
            self.header(ui, ctx);
            ui.add_space(ITEM_SPACING / 2.0);
        });

        egui::SidePanel::right("studio_preview")
            .resizable(false)
            .exact_width(PREVIEW_PANEL_WIDTH)
            .show(ctx, |ui| self.preview_panel(ui, now));

        egui::CentralPanel::default().show(ctx, |ui| self.controls(ui));

        let status_left = self.expire_status(now);
        if self.adapter.is_animating(now) {
            ctx.request_repaint();
        } else if self.exports_in_flight > 0 {
            ctx.request_repaint_after(Duration::from_millis(EXPORT_POLL_MS));
        } else if let Some(left) = status_left {
            ctx.request_repaint_after(left);
        }

        if let Some(rect) = ctx.input(|i| i.viewport().inner_rect) {
            self.settings.window_width = rect.width().round() as u16;
            self.settings.window_height = rect.height().round() as u16;
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.scanner.close();
        if let Err(err) = self.settings.save() {
            error!(error = ?err, "Failed to save settings during shutdown");
        }
        info!("Studio exiting");
    }
}

fn apply_theme(ctx: &egui::Context, theme: Theme) {
    match theme {
        Theme::Dark => ctx.set_visuals(egui::Visuals::dark()),
        Theme::Light => ctx.set_visuals(egui::Visuals::light()),
    }
}

fn is_web_link(text: &str) -> bool {
    let lower = text.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

pub fn run_gui(settings: Settings, document: QrDocument, services: StudioServices) -> Result<()> {
    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([settings.window_width as f32, settings.window_height as f32])
            .with_min_inner_size([WINDOW_MIN_WIDTH, WINDOW_MIN_HEIGHT])
            .with_title("iLoveQR"),
        ..Default::default()
    };

    eframe::run_native(
        "iLoveQR",
        options,
        Box::new(|cc| Ok(Box::new(StudioApp::new(cc, settings, document, services)))),
    )
    .map_err(|err| anyhow!("Failed to launch iLoveQR: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_web_link() {
        assert!(is_web_link("https://example.com/"));
        assert!(is_web_link("  HTTP://EXAMPLE.COM"));
        assert!(!is_web_link("mailto:someone@example.com"));
        assert!(!is_web_link("WIFI:S:home;T:WPA;P:secret;;"));
    }

    #[test]
    fn test_tabs_have_distinct_labels() {
        let mut labels: Vec<&str> = Tab::ALL.iter().map(|t| t.label()).collect();
        labels.dedup();
        assert_eq!(labels.len(), Tab::ALL.len());
    }
}
