//! Camera scanner dialog
//!
//! Owns the running [`ScannerHandle`] so closing the dialog (or the app)
//! always cancels the worker and releases the camera.

use std::sync::Arc;

use eframe::egui;
use tracing::{error, info};

use crate::gui::constants::*;
use crate::scanner::{
    CameraProvider, Decoder, Facing, Frame, ScanError, ScanEvent, ScanState, ScannerHandle,
};

pub struct ScannerModal {
    provider: Arc<dyn CameraProvider>,
    decoder: Arc<dyn Decoder>,
    open: bool,
    state: ScanState,
    handle: Option<ScannerHandle>,
    torch_on: bool,
    preview: Option<egui::TextureHandle>,
}

impl ScannerModal {
    pub fn new(provider: Arc<dyn CameraProvider>, decoder: Arc<dyn Decoder>) -> Self {
        Self {
            provider,
            decoder,
            open: false,
            state: ScanState::Idle,
            handle: None,
            torch_on: false,
            preview: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Open the dialog and request the camera
    pub fn start(&mut self, ctx: &egui::Context) {
        self.stop();
        self.open = true;
        self.torch_on = false;
        self.preview = None;
        self.state = ScanState::RequestingCamera;

        let repaint = ctx.clone();
        let wake = Arc::new(move || repaint.request_repaint());
        match ScannerHandle::spawn(self.provider.clone(), self.decoder.clone(), Facing::Environment, wake) {
            Ok(handle) => {
                info!("Scanner started");
                self.handle = Some(handle);
            }
            Err(err) => {
                error!(error = ?err, "Failed to start scanner");
                self.state = ScanState::CameraError(ScanError::DeviceUnavailable(format!("{err:#}")));
            }
        }
    }

    /// Cancel the session and release the camera; the dialog stays as it is
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.close();
        }
    }

    /// Close the dialog entirely
    pub fn close(&mut self) {
        self.stop();
        self.open = false;
        self.preview = None;
        if !self.state.is_terminal() {
            self.state = ScanState::Cancelled;
        }
    }

    fn drain_events(&mut self, ctx: &egui::Context) -> Option<String> {
        let events = self.handle.as_ref().map(|h| h.poll_events()).unwrap_or_default();
        let mut found = None;
        for event in events {
            match &event {
                ScanEvent::Preview(frame) => self.update_preview(ctx, frame),
                ScanEvent::Found(text) => found = Some(text.clone()),
                _ => {}
            }
            self.state.apply(&event);
        }
        if self.state.is_terminal() {
            self.stop();
        }
        found
    }

    fn update_preview(&mut self, ctx: &egui::Context, frame: &Frame) {
        let size = [frame.width as usize, frame.height as usize];
        if frame.rgba.len() != size[0] * size[1] * 4 {
            return;
        }
        let image = egui::ColorImage::from_rgba_unmultiplied(size, &frame.rgba);
        match &mut self.preview {
            Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
            None => {
                self.preview = Some(ctx.load_texture("scanner_preview", image, egui::TextureOptions::LINEAR));
            }
        }
    }

    /// Poll the worker and draw the dialog. Returns decoded text once, at the
    /// moment a code is found; the dialog closes itself in that case.
    pub fn ui(&mut self, ctx: &egui::Context) -> Option<String> {
        let found = self.drain_events(ctx);
        if found.is_some() {
            self.close();
            return found;
        }
        if !self.open {
            return None;
        }

        let mut close_requested = false;

        egui::Window::new("Scan QR Code")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.set_min_width(360.0);
                match &self.state {
                    ScanState::Idle | ScanState::RequestingCamera => {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label("Requesting camera...");
                        });
                    }
                    ScanState::Streaming { torch_supported } => {
                        let torch_supported = *torch_supported;
                        match &self.preview {
                            Some(texture) => {
                                ui.add(egui::Image::new(texture).max_width(360.0));
                            }
                            None => {
                                ui.spinner();
                            }
                        }
                        ui.label("Point the camera at a QR code");
                        if torch_supported {
                            let label = if self.torch_on { "\u{1F526} Torch Off" } else { "\u{1F526} Torch On" };
                            if ui.button(label).clicked() {
                                self.torch_on = !self.torch_on;
                                if let Some(handle) = &self.handle {
                                    handle.set_torch(self.torch_on);
                                }
                            }
                        }
                    }
                    ScanState::CameraError(err) => {
                        ui.colored_label(STATUS_ERROR, "Camera unavailable");
                        ui.label(err.to_string());
                        if matches!(err, ScanError::PermissionDenied(_)) {
                            ui.label(
                                egui::RichText::new("Check that your user can access the video device")
                                    .small()
                                    .weak(),
                            );
                        }
                    }
                    ScanState::Found(_) | ScanState::Cancelled => {}
                }

                ui.add_space(ITEM_SPACING);
                if ui.button("Cancel").clicked() {
                    close_requested = true;
                }
            });

        if close_requested {
            info!("Scanner closed by user");
            self.close();
        }
        None
    }
}
