#![forbid(unsafe_code)]

mod cli;
mod color;
mod compositor;
mod config;
mod constants;
mod document;
mod export;
mod font;
mod gui;
mod render;
mod scanner;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{Level as TraceLevel, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use cli::{CliArgs, export_kind};
use config::Settings;
use document::QrDocument;
use export::{
    DirectorySink, ExportCoordinator, ExportOutcome, ExportServices, FileSink, FixedPathSink,
    PdfWriter, SystemClipboard, SystemShare, styled_engine_builder,
};
use font::SystemFonts;
use gui::StudioServices;
use scanner::{RqrrDecoder, V4l2Provider};

fn parse_level(value: &str) -> TraceLevel {
    match value.to_lowercase().as_str() {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    }
}

fn export_services(files: Arc<dyn FileSink>) -> ExportServices {
    ExportServices {
        engines: styled_engine_builder(),
        files,
        clipboard: Arc::new(SystemClipboard::new()),
        share: Arc::new(SystemShare::new()),
        documents: Arc::new(PdfWriter),
        fonts: Arc::new(SystemFonts::new()),
    }
}

/// Render the document once to `target` and return
fn export_headless(document: &QrDocument, target: &Path) -> Result<()> {
    let kind = export_kind(target)?;
    let coordinator = ExportCoordinator::new(export_services(Arc::new(FixedPathSink::new(target))));
    let job = coordinator.prepare(kind, &document.text, document.style(), &document.label)?;
    match coordinator.run(&job)? {
        ExportOutcome::Saved(path) => info!(path = %path.display(), kind = ?kind, "Exported"),
        other => info!(outcome = ?other, "Export finished"),
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Settings are read before logging is up so they can supply the level
    let loaded = Settings::load();

    let level_name = args
        .log_level
        .clone()
        .or_else(|| std::env::var("LOG_LEVEL").ok())
        .or_else(|| loaded.as_ref().ok().map(|s| s.log_level.clone()))
        .unwrap_or_else(|| "info".to_string());

    let subscriber = FmtSubscriber::builder()
        .with_max_level(parse_level(&level_name))
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let settings = match loaded {
        Ok(settings) => settings,
        Err(err) => {
            warn!(error = ?err, "Failed to load settings, using defaults");
            Settings::default()
        }
    };

    let document = args.to_document().context("Invalid command-line options")?;

    if let Some(target) = &args.export {
        if let Err(err) = export_headless(&document, target) {
            error!(path = %target.display(), error = ?err, "Export failed");
            return Err(err.into());
        }
        return Ok(());
    }

    let export_dir = settings.resolved_export_dir();
    info!(export_dir = %export_dir.display(), "Starting iLoveQR");

    let services = StudioServices {
        export: export_services(Arc::new(DirectorySink::new(export_dir))),
        camera: Arc::new(V4l2Provider::default()),
        decoder: Arc::new(RqrrDecoder),
    };

    gui::run_gui(settings, document, services)?;
    Ok(())
}
