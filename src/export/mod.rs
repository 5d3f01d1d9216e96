//! Export coordinator
//!
//! Every job snapshots the document, renders it with a fresh engine and hands
//! the result to one of the injected sinks. Jobs run on worker threads and
//! report back over an mpsc channel; the UI only ever polls the receiver.

pub mod pdf;
pub mod platform;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;

use image::RgbaImage;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::compositor::compose_or_raw;
use crate::config::{LabelConfig, StyleConfig};
use crate::constants::export::{FILE_STEM, SHARE_TITLE};
use crate::font::FontSource;
use crate::render::{QrEngine, RenderError, StyledQrEngine, png};

pub use pdf::PdfWriter;
pub use platform::{DirectorySink, FixedPathSink, SystemClipboard, SystemShare};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("{0}")]
    Unsupported(String),
    #[error("failed to render QR code: {0}")]
    Encode(#[from] RenderError),
    #[error("clipboard error: {0}")]
    Clipboard(String),
    #[error("share failed: {0}")]
    Share(String),
    #[error("failed to build PDF: {0}")]
    Document(String),
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to start export worker: {0}")]
    Worker(#[source] std::io::Error),
    #[error("share dismissed")]
    Cancelled,
}

impl ExportError {
    /// The user backed out; not worth a notice
    pub fn is_cancellation(&self) -> bool {
        matches!(self, ExportError::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Raster,
    Vector,
    Document,
    Clipboard,
    Share,
}

impl ExportKind {
    pub const ALL: [ExportKind; 5] = [
        ExportKind::Raster,
        ExportKind::Vector,
        ExportKind::Document,
        ExportKind::Clipboard,
        ExportKind::Share,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ExportKind::Raster => "PNG",
            ExportKind::Vector => "SVG",
            ExportKind::Document => "PDF",
            ExportKind::Clipboard => "Copy",
            ExportKind::Share => "Share",
        }
    }

    /// File name written for this kind; clipboard has none
    pub fn file_name(self) -> Option<String> {
        let ext = match self {
            ExportKind::Raster | ExportKind::Share => "png",
            ExportKind::Vector => "svg",
            ExportKind::Document => "pdf",
            ExportKind::Clipboard => return None,
        };
        Some(format!("{FILE_STEM}.{ext}"))
    }
}

/// Where exported files end up
pub trait FileSink: Send + Sync {
    fn write(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ExportError>;
}

pub trait ClipboardSink: Send + Sync {
    fn set_image(&self, image: &RgbaImage) -> Result<(), ExportError>;
}

pub trait ShareSink: Send + Sync {
    fn share(&self, file_name: &str, bytes: &[u8], title: &str) -> Result<(), ExportError>;
}

/// Places one image on a single page
pub trait DocumentWriter: Send + Sync {
    fn single_image_page(&self, image: &RgbaImage) -> Result<Vec<u8>, ExportError>;
}

pub type EngineBuilder =
    Arc<dyn Fn(&str, &StyleConfig) -> Result<Box<dyn QrEngine + Send>, RenderError> + Send + Sync>;

/// Production engine builder
pub fn styled_engine_builder() -> EngineBuilder {
    Arc::new(|text, style| {
        let engine = StyledQrEngine::new(text, style)?;
        Ok(Box::new(engine) as Box<dyn QrEngine + Send>)
    })
}

/// Snapshot of the document taken when the user asked for an export
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub kind: ExportKind,
    pub text: String,
    pub style: StyleConfig,
    pub label: LabelConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Saved(PathBuf),
    Copied,
    Shared,
}

#[derive(Debug)]
pub struct ExportReport {
    pub kind: ExportKind,
    pub result: Result<ExportOutcome, ExportError>,
}

/// Capabilities the coordinator dispatches to
#[derive(Clone)]
pub struct ExportServices {
    pub engines: EngineBuilder,
    pub files: Arc<dyn FileSink>,
    pub clipboard: Arc<dyn ClipboardSink>,
    pub share: Arc<dyn ShareSink>,
    pub documents: Arc<dyn DocumentWriter>,
    pub fonts: Arc<dyn FontSource>,
}

#[derive(Clone)]
pub struct ExportCoordinator {
    services: ExportServices,
}

impl ExportCoordinator {
    pub fn new(services: ExportServices) -> Self {
        Self { services }
    }

    /// Validate and snapshot a request. Vector output cannot carry the label,
    /// so it is refused here before any work is scheduled.
    pub fn prepare(
        &self,
        kind: ExportKind,
        text: &str,
        style: &StyleConfig,
        label: &LabelConfig,
    ) -> Result<ExportJob, ExportError> {
        check_supported(kind, label)?;
        Ok(ExportJob {
            kind,
            text: text.to_string(),
            style: style.clone(),
            label: label.clone(),
        })
    }

    /// Run a job to completion on the calling thread
    pub fn run(&self, job: &ExportJob) -> Result<ExportOutcome, ExportError> {
        check_supported(job.kind, &job.label)?;
        let engine = (self.services.engines)(&job.text, &job.style)?;

        match job.kind {
            ExportKind::Raster => {
                let bytes = self.composite_png(engine.as_ref(), &job.label)?;
                self.save(job.kind, &bytes)
            }
            ExportKind::Vector => {
                let svg = engine.export_svg()?;
                self.save(job.kind, svg.as_bytes())
            }
            ExportKind::Document => {
                let image = self.composite_image(engine.as_ref(), &job.label)?;
                let bytes = self.services.documents.single_image_page(&image)?;
                self.save(job.kind, &bytes)
            }
            ExportKind::Clipboard => {
                let image = self.composite_image(engine.as_ref(), &job.label)?;
                self.services.clipboard.set_image(&image)?;
                info!(width = image.width(), height = image.height(), "Copied QR code to clipboard");
                Ok(ExportOutcome::Copied)
            }
            ExportKind::Share => {
                let bytes = self.composite_png(engine.as_ref(), &job.label)?;
                let name = format!("{FILE_STEM}.png");
                self.services.share.share(&name, &bytes, SHARE_TITLE)?;
                Ok(ExportOutcome::Shared)
            }
        }
    }

    /// Run a job on a worker thread; the report arrives on `reports`.
    /// Fails only if the worker could not be started, in which case no
    /// report will follow.
    pub fn spawn(&self, job: ExportJob, reports: Sender<ExportReport>) -> Result<(), ExportError> {
        let coordinator = self.clone();
        let kind = job.kind;
        thread::Builder::new()
            .name(format!("export-{}", kind.label().to_lowercase()))
            .spawn(move || {
                let result = coordinator.run(&job);
                match &result {
                    Ok(outcome) => info!(kind = ?job.kind, outcome = ?outcome, "Export finished"),
                    Err(err) if err.is_cancellation() => info!(kind = ?job.kind, "Export dismissed"),
                    Err(err) => error!(kind = ?job.kind, error = %err, "Export failed"),
                }
                if reports.send(ExportReport { kind: job.kind, result }).is_err() {
                    warn!("Export finished after the UI went away");
                }
            })
            .map_err(|source| {
                error!(error = %source, "Failed to spawn export worker");
                ExportError::Worker(source)
            })?;
        Ok(())
    }

    fn composite_image(&self, engine: &dyn QrEngine, label: &LabelConfig) -> Result<RgbaImage, ExportError> {
        let raster = engine.raster();
        if raster.width() == 0 || raster.height() == 0 {
            return Err(RenderError::EmptyRaster.into());
        }
        Ok(compose_or_raw(raster, engine.margin(), label, self.services.fonts.as_ref()))
    }

    fn composite_png(&self, engine: &dyn QrEngine, label: &LabelConfig) -> Result<Vec<u8>, ExportError> {
        if !label.is_active() {
            return Ok(engine.export_png()?);
        }
        let image = self.composite_image(engine, label)?;
        Ok(png::encode_rgba(&image)?)
    }

    fn save(&self, kind: ExportKind, bytes: &[u8]) -> Result<ExportOutcome, ExportError> {
        let Some(name) = kind.file_name() else {
            return Err(ExportError::Unsupported(format!("{} has no file form", kind.label())));
        };
        let path = self.services.files.write(&name, bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), "Saved export");
        Ok(ExportOutcome::Saved(path))
    }
}

fn check_supported(kind: ExportKind, label: &LabelConfig) -> Result<(), ExportError> {
    if kind == ExportKind::Vector && label.is_active() {
        return Err(ExportError::Unsupported(
            "SVG export does not support labels; hide the label or export PNG/PDF".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::tests::BlockFonts;
    use crate::config::LabelPosition;
    use std::sync::Mutex;
    use std::sync::mpsc;

    #[derive(Default)]
    struct Recorder {
        files: Mutex<Vec<(String, Vec<u8>)>>,
        clipboard: Mutex<Vec<(u32, u32)>>,
        shared: Mutex<Vec<String>>,
        cancel_share: bool,
    }

    impl FileSink for Recorder {
        fn write(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ExportError> {
            self.files.lock().unwrap().push((file_name.to_string(), bytes.to_vec()));
            Ok(PathBuf::from("/exports").join(file_name))
        }
    }

    impl ClipboardSink for Recorder {
        fn set_image(&self, image: &RgbaImage) -> Result<(), ExportError> {
            self.clipboard.lock().unwrap().push(image.dimensions());
            Ok(())
        }
    }

    impl ShareSink for Recorder {
        fn share(&self, file_name: &str, _bytes: &[u8], _title: &str) -> Result<(), ExportError> {
            if self.cancel_share {
                return Err(ExportError::Cancelled);
            }
            self.shared.lock().unwrap().push(file_name.to_string());
            Ok(())
        }
    }

    impl DocumentWriter for Recorder {
        fn single_image_page(&self, image: &RgbaImage) -> Result<Vec<u8>, ExportError> {
            Ok(format!("page {}x{}", image.width(), image.height()).into_bytes())
        }
    }

    fn coordinator(recorder: Arc<Recorder>) -> ExportCoordinator {
        ExportCoordinator::new(ExportServices {
            engines: styled_engine_builder(),
            files: recorder.clone(),
            clipboard: recorder.clone(),
            share: recorder.clone(),
            documents: recorder,
            fonts: Arc::new(BlockFonts),
        })
    }

    fn scan_me() -> LabelConfig {
        LabelConfig {
            text: "SCAN ME".into(),
            position: LabelPosition::Bottom,
            ..LabelConfig::default()
        }
    }

    #[test]
    fn test_vector_with_label_is_rejected_without_writing() {
        let recorder = Arc::new(Recorder::default());
        let c = coordinator(recorder.clone());
        let style = StyleConfig::default();

        let err = c.prepare(ExportKind::Vector, "hello", &style, &scan_me()).unwrap_err();
        assert!(matches!(err, ExportError::Unsupported(_)));

        // A job built by hand is refused too
        let job = ExportJob {
            kind: ExportKind::Vector,
            text: "hello".into(),
            style,
            label: scan_me(),
        };
        assert!(matches!(c.run(&job), Err(ExportError::Unsupported(_))));
        assert!(recorder.files.lock().unwrap().is_empty());
    }

    #[test]
    fn test_vector_without_label_writes_svg() {
        let recorder = Arc::new(Recorder::default());
        let c = coordinator(recorder.clone());
        let job = c
            .prepare(ExportKind::Vector, "hello", &StyleConfig::default(), &LabelConfig::default())
            .unwrap();
        let outcome = c.run(&job).unwrap();

        assert_eq!(outcome, ExportOutcome::Saved(PathBuf::from("/exports/iLoveQR.svg")));
        let files = recorder.files.lock().unwrap();
        assert!(String::from_utf8_lossy(&files[0].1).starts_with("<svg"));
    }

    #[test]
    fn test_default_raster_export_is_1000_square() {
        let recorder = Arc::new(Recorder::default());
        let c = coordinator(recorder.clone());
        let job = c
            .prepare(ExportKind::Raster, "https://example.com/", &StyleConfig::default(), &LabelConfig::default())
            .unwrap();
        c.run(&job).unwrap();

        let files = recorder.files.lock().unwrap();
        assert_eq!(files[0].0, "iLoveQR.png");
        let decoded = image::load_from_memory(&files[0].1).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1000, 1000));
    }

    #[test]
    fn test_labelled_exports_are_taller() {
        let recorder = Arc::new(Recorder::default());
        let c = coordinator(recorder.clone());
        let style = StyleConfig::default();

        let job = c.prepare(ExportKind::Clipboard, "x", &style, &scan_me()).unwrap();
        assert_eq!(c.run(&job).unwrap(), ExportOutcome::Copied);
        let (w, h) = recorder.clipboard.lock().unwrap()[0];
        assert_eq!(w, 1000);
        assert!(h > 1000);

        let job = c.prepare(ExportKind::Document, "x", &style, &scan_me()).unwrap();
        c.run(&job).unwrap();
        let files = recorder.files.lock().unwrap();
        assert_eq!(files[0].0, "iLoveQR.pdf");
        assert_eq!(String::from_utf8_lossy(&files[0].1), format!("page 1000x{h}"));
    }

    #[test]
    fn test_share_cancellation_is_reported_as_such() {
        let recorder = Arc::new(Recorder { cancel_share: true, ..Recorder::default() });
        let c = coordinator(recorder);
        let job = c.prepare(ExportKind::Share, "x", &StyleConfig::default(), &scan_me()).unwrap();
        let err = c.run(&job).unwrap_err();
        assert!(err.is_cancellation());
    }

    #[test]
    fn test_spawn_reports_over_channel() {
        let recorder = Arc::new(Recorder::default());
        let c = coordinator(recorder.clone());
        let (tx, rx) = mpsc::channel();
        let job = c.prepare(ExportKind::Share, "x", &StyleConfig::default(), &LabelConfig::default()).unwrap();
        c.spawn(job, tx).unwrap();

        let report = rx.recv().unwrap();
        assert_eq!(report.kind, ExportKind::Share);
        assert_eq!(report.result.unwrap(), ExportOutcome::Shared);
        assert_eq!(*recorder.shared.lock().unwrap(), vec!["iLoveQR.png".to_string()]);
    }

    #[test]
    fn test_encode_failure_surfaces() {
        let recorder = Arc::new(Recorder::default());
        let c = coordinator(recorder.clone());
        let style = StyleConfig::default().with_qr_options(|q| q.type_number = 1);
        let job = c
            .prepare(ExportKind::Raster, &"x".repeat(500), &style, &LabelConfig::default())
            .unwrap();
        assert!(matches!(c.run(&job), Err(ExportError::Encode(_))));
        assert!(recorder.files.lock().unwrap().is_empty());
    }
}
