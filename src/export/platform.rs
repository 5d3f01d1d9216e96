//! Desktop sinks: export directory, system clipboard and OS hand-off

use std::borrow::Cow;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use image::RgbaImage;
use tracing::{debug, info};

use super::{ClipboardSink, ExportError, FileSink, ShareSink};
use crate::constants::config::APP_DIR;

/// Writes exports into a single directory, creating it on demand
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl FileSink for DirectorySink {
    fn write(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(&self.dir).map_err(|source| ExportError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.dir.join(file_name);
        fs::write(&path, bytes).map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

/// Writes every export to one exact path, whatever the kind's default name.
/// Used by headless `--export`.
#[derive(Debug, Clone)]
pub struct FixedPathSink {
    path: PathBuf,
}

impl FixedPathSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FileSink for FixedPathSink {
    fn write(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ExportError> {
        debug!(default_name = file_name, path = %self.path.display(), "Writing to fixed path");
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ExportError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&self.path, bytes).map_err(|source| ExportError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(self.path.clone())
    }
}

/// arboard clipboard, opened on first use and kept alive so the selection
/// survives on X11/Wayland after the copy returns
#[derive(Default)]
pub struct SystemClipboard {
    inner: Mutex<Option<arboard::Clipboard>>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClipboardSink for SystemClipboard {
    fn set_image(&self, image: &RgbaImage) -> Result<(), ExportError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| ExportError::Clipboard("clipboard lock poisoned".into()))?;
        if guard.is_none() {
            let clipboard = arboard::Clipboard::new()
                .map_err(|err| ExportError::Unsupported(format!("Clipboard unavailable: {err}")))?;
            *guard = Some(clipboard);
        }
        let Some(clipboard) = guard.as_mut() else {
            return Err(ExportError::Unsupported("Clipboard unavailable".into()));
        };

        clipboard
            .set_image(arboard::ImageData {
                width: image.width() as usize,
                height: image.height() as usize,
                bytes: Cow::Borrowed(image.as_raw()),
            })
            .map_err(|err| ExportError::Clipboard(err.to_string()))
    }
}

/// Writes the file under the temp dir and opens it with the desktop handler
#[derive(Debug, Clone)]
pub struct SystemShare {
    staging: PathBuf,
}

impl SystemShare {
    pub fn new() -> Self {
        Self::in_dir(std::env::temp_dir().join(APP_DIR))
    }

    pub fn in_dir(staging: impl Into<PathBuf>) -> Self {
        Self { staging: staging.into() }
    }

    /// Stage the file without opening it
    pub fn stage(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ExportError> {
        DirectorySink::new(&self.staging)
            .write(file_name, bytes)
            .map_err(|err| ExportError::Share(err.to_string()))
    }
}

impl Default for SystemShare {
    fn default() -> Self {
        Self::new()
    }
}

impl ShareSink for SystemShare {
    fn share(&self, file_name: &str, bytes: &[u8], title: &str) -> Result<(), ExportError> {
        let path = self.stage(file_name, bytes)?;
        debug!(path = %path.display(), title, "Handing export to the desktop");
        open::that(&path).map_err(|err| ExportError::Share(err.to_string()))?;
        info!(path = %path.display(), "Opened shared file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_directory_sink_creates_missing_dir() {
        let tmp = tempdir().unwrap();
        let sink = DirectorySink::new(tmp.path().join("nested/out"));
        let path = sink.write("iLoveQR.svg", b"<svg/>").unwrap();

        assert_eq!(path, tmp.path().join("nested/out/iLoveQR.svg"));
        assert_eq!(fs::read(&path).unwrap(), b"<svg/>");
    }

    #[test]
    fn test_directory_sink_overwrites() {
        let tmp = tempdir().unwrap();
        let sink = DirectorySink::new(tmp.path());
        sink.write("iLoveQR.png", b"one").unwrap();
        sink.write("iLoveQR.png", b"two").unwrap();
        assert_eq!(fs::read(tmp.path().join("iLoveQR.png")).unwrap(), b"two");
    }

    #[test]
    fn test_directory_sink_reports_io_errors() {
        let tmp = tempdir().unwrap();
        let blocker = tmp.path().join("file");
        fs::write(&blocker, b"x").unwrap();

        let err = DirectorySink::new(&blocker).write("iLoveQR.png", b"x").unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
    }

    #[test]
    fn test_fixed_path_sink_ignores_default_name() {
        let tmp = tempdir().unwrap();
        let target = tmp.path().join("out/badge.png");
        let sink = FixedPathSink::new(&target);
        let path = sink.write("iLoveQR.png", b"png").unwrap();

        assert_eq!(path, target);
        assert_eq!(fs::read(&target).unwrap(), b"png");
        assert!(!tmp.path().join("out/iLoveQR.png").exists());
    }

    #[test]
    fn test_share_stages_file() {
        let tmp = tempdir().unwrap();
        let share = SystemShare::in_dir(tmp.path());
        let path = share.stage("iLoveQR.png", b"png").unwrap();
        assert_eq!(fs::read(path).unwrap(), b"png");
    }
}
