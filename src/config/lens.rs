//! Immutable, identity-preserving updates to [`StyleConfig`]
//!
//! The typed `with_*` lenses are the primary API: each copies exactly one
//! section, applies the edit and returns a new configuration whose other
//! sections are the same `Arc`s as before. [`StyleConfig::set_path`] offers
//! the same contract for dotted field addresses such as
//! `"dotsOptions.gradient.colorStops"`.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::constants::render::{MAX_MARGIN, MAX_SIZE, MIN_SIZE};

use super::style::{
    BackgroundOptions, CornersDotOptions, CornersSquareOptions, DotsOptions, EmbeddedImage,
    ImageOptions, QrOptions, StyleConfig,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid field path '{0}'")]
    InvalidPath(String),
    #[error("unknown configuration section '{0}'")]
    UnknownSection(String),
    #[error("'{path}' is a scalar and has no field '{field}'")]
    NotAnObject { path: String, field: String },
    #[error("value rejected for '{path}': {source}")]
    InvalidValue {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Copy one section, edit the copy, wrap it in a fresh `Arc`
fn edit_section<T: Clone>(section: &Arc<T>, edit: impl FnOnce(&mut T)) -> Arc<T> {
    let mut next = T::clone(section);
    edit(&mut next);
    Arc::new(next)
}

impl StyleConfig {
    pub fn with_dots(&self, edit: impl FnOnce(&mut DotsOptions)) -> Self {
        Self { dots: edit_section(&self.dots, edit), ..self.clone() }
    }

    pub fn with_corners_square(&self, edit: impl FnOnce(&mut CornersSquareOptions)) -> Self {
        Self { corners_square: edit_section(&self.corners_square, edit), ..self.clone() }
    }

    pub fn with_corners_dot(&self, edit: impl FnOnce(&mut CornersDotOptions)) -> Self {
        Self { corners_dot: edit_section(&self.corners_dot, edit), ..self.clone() }
    }

    pub fn with_background(&self, edit: impl FnOnce(&mut BackgroundOptions)) -> Self {
        Self { background: edit_section(&self.background, edit), ..self.clone() }
    }

    pub fn with_image_options(&self, edit: impl FnOnce(&mut ImageOptions)) -> Self {
        Self { image_options: edit_section(&self.image_options, edit), ..self.clone() }
    }

    pub fn with_qr_options(&self, edit: impl FnOnce(&mut QrOptions)) -> Self {
        Self { qr_options: edit_section(&self.qr_options, edit), ..self.clone() }
    }

    pub fn with_image(&self, image: Option<EmbeddedImage>) -> Self {
        Self { image, ..self.clone() }
    }

    /// Size and margin are clamped to what the raster accepts
    pub fn with_dimensions(&self, width: u32, height: u32, margin: u32) -> Self {
        Self {
            width: clamp_size(width),
            height: clamp_size(height),
            margin: margin.min(MAX_MARGIN),
            ..self.clone()
        }
    }

    /// Replace the field addressed by a dot-delimited path
    ///
    /// The first segment names a section (`dotsOptions`, `qrOptions`, ...)
    /// or a top-level scalar (`width`, `height`, `margin`, `image`). Missing
    /// intermediate keys inside a section are created as empty objects. On
    /// error `self` is untouched and nothing is returned.
    pub fn set_path(&self, path: &str, value: Value) -> Result<Self, ConfigError> {
        let segments: Vec<&str> = path.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(ConfigError::InvalidPath(path.to_string()));
        }
        let (head, rest) = (segments[0], &segments[1..]);
        debug!(path, "Applying path update");

        let mut next = self.clone();
        match head {
            "qrOptions" => next.qr_options = write_section(&self.qr_options, path, rest, value)?,
            "imageOptions" => {
                next.image_options = write_section(&self.image_options, path, rest, value)?
            }
            "dotsOptions" => next.dots = write_section(&self.dots, path, rest, value)?,
            "cornersSquareOptions" => {
                next.corners_square = write_section(&self.corners_square, path, rest, value)?
            }
            "cornersDotOptions" => {
                next.corners_dot = write_section(&self.corners_dot, path, rest, value)?
            }
            "backgroundOptions" => {
                next.background = write_section(&self.background, path, rest, value)?
            }
            "width" | "height" | "margin" => {
                reject_nested(head, rest)?;
                let n: u32 = from_value(path, value)?;
                match head {
                    "width" => next.width = clamp_size(n),
                    "height" => next.height = clamp_size(n),
                    _ => next.margin = n.min(MAX_MARGIN),
                }
            }
            "image" => {
                reject_nested(head, rest)?;
                next.image = match from_value::<Option<String>>(path, value)? {
                    Some(url) if !url.is_empty() => Some(EmbeddedImage::from_data_url(url)),
                    _ => None,
                };
            }
            other => return Err(ConfigError::UnknownSection(other.to_string())),
        }
        Ok(next)
    }
}

fn clamp_size(n: u32) -> u32 {
    n.clamp(MIN_SIZE, MAX_SIZE)
}

fn reject_nested(head: &str, rest: &[&str]) -> Result<(), ConfigError> {
    match rest.first() {
        Some(field) => Err(ConfigError::NotAnObject {
            path: head.to_string(),
            field: field.to_string(),
        }),
        None => Ok(()),
    }
}

fn from_value<T: DeserializeOwned>(path: &str, value: Value) -> Result<T, ConfigError> {
    serde_json::from_value(value).map_err(|source| ConfigError::InvalidValue {
        path: path.to_string(),
        source,
    })
}

/// Write `value` at `rest` inside one section via its JSON form
fn write_section<T>(
    section: &Arc<T>,
    path: &str,
    rest: &[&str],
    value: Value,
) -> Result<Arc<T>, ConfigError>
where
    T: Serialize + DeserializeOwned,
{
    let mut tree = serde_json::to_value(section.as_ref()).map_err(|source| {
        ConfigError::InvalidValue { path: path.to_string(), source }
    })?;
    set_in_tree(&mut tree, rest, value, path)?;
    from_value(path, tree).map(Arc::new)
}

fn set_in_tree(tree: &mut Value, rest: &[&str], value: Value, path: &str) -> Result<(), ConfigError> {
    let Some((last, parents)) = rest.split_last() else {
        *tree = value;
        return Ok(());
    };

    let mut cursor = tree;
    let mut walked = String::new();
    for segment in parents {
        let map = as_object(cursor, &walked, segment)?;
        cursor = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if cursor.is_null() {
            *cursor = Value::Object(Map::new());
        }
        if !walked.is_empty() {
            walked.push('.');
        }
        walked.push_str(segment);
    }

    let map = as_object(cursor, &walked, last)?;
    // A flat color and a gradient are mutually exclusive on write
    if *last == "color" {
        map.remove("gradient");
    }
    if value.is_null() {
        map.remove(*last);
    } else {
        map.insert(last.to_string(), value);
    }
    debug!(path, "Path written");
    Ok(())
}

fn as_object<'a>(
    value: &'a mut Value,
    walked: &str,
    field: &str,
) -> Result<&'a mut Map<String, Value>, ConfigError> {
    value.as_object_mut().ok_or_else(|| ConfigError::NotAnObject {
        path: walked.to_string(),
        field: field.to_string(),
    })
}
