//! Command-line arguments
//!
//! Every flag seeds the initial document; `--export` renders it once and
//! exits instead of opening the window.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, ValueEnum};
use serde_json::Value;

use crate::color::parse_hex_color;
use crate::config::{LabelPosition, PRESETS, find_preset};
use crate::document::QrDocument;
use crate::export::ExportKind;
use crate::render::logo::embed_file;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PositionArg {
    Top,
    Bottom,
    None,
}

impl From<PositionArg> for LabelPosition {
    fn from(arg: PositionArg) -> Self {
        match arg {
            PositionArg::Top => LabelPosition::Top,
            PositionArg::Bottom => LabelPosition::Bottom,
            PositionArg::None => LabelPosition::None,
        }
    }
}

/// Styled QR code studio
#[derive(Parser, Debug)]
#[command(name = "iloveqr", version, about = "Design QR codes with colors, logos and labels")]
pub struct CliArgs {
    /// Text or URL to encode
    #[arg(long)]
    pub text: Option<String>,

    /// Start from a named preset (e.g. "Ocean")
    #[arg(long)]
    pub preset: Option<String>,

    /// Label text drawn with exports
    #[arg(long)]
    pub label: Option<String>,

    #[arg(long, value_enum)]
    pub label_position: Option<PositionArg>,

    #[arg(long, value_name = "FAMILY")]
    pub label_font: Option<String>,

    /// Label color as #RGB, #RRGGBB or #RRGGBBAA
    #[arg(long, value_name = "HEX")]
    pub label_color: Option<String>,

    /// Image to embed in the center of the code
    #[arg(long, value_name = "PATH")]
    pub logo: Option<PathBuf>,

    /// Style override as PATH=VALUE, e.g. dotsOptions.type=dots (repeatable).
    /// VALUE is parsed as JSON and taken as a plain string otherwise.
    #[arg(long = "set", value_name = "PATH=VALUE")]
    pub overrides: Vec<String>,

    /// Render once to this file and exit; the format follows the extension
    /// (png, svg or pdf)
    #[arg(long, value_name = "PATH")]
    pub export: Option<PathBuf>,

    /// trace, debug, info, warn or error (overrides LOG_LEVEL)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Build the starting document from the flags
    pub fn to_document(&self) -> Result<QrDocument> {
        let mut document = QrDocument::default();

        if let Some(name) = &self.preset {
            let preset = find_preset(name).ok_or_else(|| {
                let known: Vec<&str> = PRESETS.iter().map(|p| p.name).collect();
                anyhow!("Unknown preset '{name}' (available: {})", known.join(", "))
            })?;
            document.apply_preset(preset);
        }

        if let Some(text) = &self.text {
            document.text = text.clone();
        }

        if let Some(path) = &self.logo {
            let image = embed_file(path)?;
            document.edit_style(|s| s.with_image(Some(image)));
        }

        for entry in &self.overrides {
            let (path, value) = parse_override(entry)?;
            let next = document
                .style()
                .set_path(&path, value)
                .with_context(|| format!("Invalid --set {entry}"))?;
            document.replace_style(next);
        }

        if let Some(text) = &self.label {
            document.label.text = text.clone();
        }
        if let Some(position) = self.label_position {
            document.label.position = position.into();
        }
        if let Some(font) = &self.label_font {
            document.label.font = font.clone();
        }
        if let Some(color) = &self.label_color {
            parse_hex_color(color).with_context(|| format!("Invalid --label-color {color}"))?;
            document.label.color = color.clone();
        }

        Ok(document)
    }
}

/// Split `PATH=VALUE`; VALUE falls back to a JSON string when it is not JSON
pub fn parse_override(entry: &str) -> Result<(String, Value)> {
    let Some((path, raw)) = entry.split_once('=') else {
        bail!("Expected PATH=VALUE, got '{entry}'");
    };
    let path = path.trim();
    if path.is_empty() {
        bail!("Empty path in '{entry}'");
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((path.to_string(), value))
}

/// Export kind for a headless target, chosen by file extension
pub fn export_kind(path: &Path) -> Result<ExportKind> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => Ok(ExportKind::Raster),
        Some("svg") => Ok(ExportKind::Vector),
        Some("pdf") => Ok(ExportKind::Document),
        _ => bail!("Cannot infer export format from {} (use .png, .svg or .pdf)", path.display()),
    }
}
