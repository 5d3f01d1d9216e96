//! V4L2 camera via rscam (Linux only)
//!
//! Frames are captured as YUYV and converted to RGBA for the decoder and the
//! preview. There is no facing concept on V4L2; the configured device node
//! is used whatever the caller asks for.

use std::path::PathBuf;

use super::{CameraProvider, Facing, ScanError};
use crate::constants::scanner::DEFAULT_DEVICE;

#[inline]
fn yuv_to_rgb(y: f32, u: f32, v: f32) -> [u8; 3] {
    let c = 1.164 * (y - 16.0);
    let (d, e) = (u - 128.0, v - 128.0);
    [
        (c + 1.596 * e).clamp(0.0, 255.0) as u8,
        (c - 0.813 * e - 0.391 * d).clamp(0.0, 255.0) as u8,
        (c + 2.018 * d).clamp(0.0, 255.0) as u8,
    ]
}

/// Convert packed YUYV (Y0 U Y1 V per pixel pair) into RGBA
pub fn yuyv_to_rgba(yuyv: &[u8], width: u32, height: u32) -> Vec<u8> {
    let pixels = width as usize * height as usize;
    let mut rgba = Vec::with_capacity(pixels * 4);
    for chunk in yuyv.chunks_exact(4).take(pixels / 2) {
        let (y0, u, y1, v) = (chunk[0] as f32, chunk[1] as f32, chunk[2] as f32, chunk[3] as f32);
        for y in [y0, y1] {
            let [r, g, b] = yuv_to_rgb(y, u, v);
            rgba.extend_from_slice(&[r, g, b, 255]);
        }
    }
    rgba
}

fn map_open_error(device: &std::path::Path, err: std::io::Error) -> ScanError {
    let device = device.display().to_string();
    match err.kind() {
        std::io::ErrorKind::PermissionDenied => ScanError::PermissionDenied(device),
        std::io::ErrorKind::NotFound => ScanError::DeviceUnavailable(format!("{device} not found")),
        _ => ScanError::DeviceUnavailable(format!("{device}: {err}")),
    }
}

#[derive(Debug, Clone)]
pub struct V4l2Provider {
    device: PathBuf,
}

impl V4l2Provider {
    pub fn new(device: impl Into<PathBuf>) -> Self {
        Self { device: device.into() }
    }
}

impl Default for V4l2Provider {
    fn default() -> Self {
        Self::new(DEFAULT_DEVICE)
    }
}

#[cfg(target_os = "linux")]
mod linux {
    use tracing::{debug, info, warn};

    use super::{V4l2Provider, map_open_error, yuyv_to_rgba};
    use crate::constants::scanner::{
        CAPTURE_HEIGHT, CAPTURE_WIDTH, FLASH_LED_MODE_NONE, FLASH_LED_MODE_TORCH, FRAME_INTERVAL,
        V4L2_CID_FLASH_LED_MODE,
    };
    use crate::scanner::{Camera, CameraProvider, Facing, Frame, ScanError};

    pub struct V4l2Camera {
        camera: rscam::Camera,
        torch: bool,
        torch_on: bool,
    }

    impl Camera for V4l2Camera {
        fn poll_frame(&mut self) -> Result<Option<Frame>, ScanError> {
            let frame = self
                .camera
                .capture()
                .map_err(|err| ScanError::Capture(err.to_string()))?;
            let (width, height) = frame.resolution;
            Ok(Some(Frame {
                width,
                height,
                rgba: yuyv_to_rgba(&frame[..], width, height),
            }))
        }

        fn supports_torch(&self) -> bool {
            self.torch
        }

        fn set_torch(&mut self, on: bool) -> Result<(), ScanError> {
            if !self.torch {
                return Err(ScanError::DeviceUnavailable("camera has no torch".into()));
            }
            let mode = if on { FLASH_LED_MODE_TORCH } else { FLASH_LED_MODE_NONE };
            self.camera
                .set_control(V4L2_CID_FLASH_LED_MODE, &mode)
                .map_err(|err| ScanError::Capture(err.to_string()))?;
            self.torch_on = on;
            debug!(on, "Torch switched");
            Ok(())
        }

        fn stop(&mut self) {
            if self.torch_on {
                if let Err(err) = self.set_torch(false) {
                    warn!(error = %err, "Failed to switch torch off");
                }
            }
            if let Err(err) = self.camera.stop() {
                warn!(error = %err, "Failed to stop camera stream");
            }
        }
    }

    impl CameraProvider for V4l2Provider {
        fn open(&self, facing: Facing) -> Result<Box<dyn Camera>, ScanError> {
            let device = self.device.to_string_lossy();
            info!(device = %device, ?facing, "Opening camera");

            let mut camera = rscam::Camera::new(&device).map_err(|err| map_open_error(&self.device, err))?;
            camera
                .start(&rscam::Config {
                    interval: FRAME_INTERVAL,
                    resolution: (CAPTURE_WIDTH, CAPTURE_HEIGHT),
                    format: b"YUYV",
                    ..Default::default()
                })
                .map_err(|err| match err {
                    rscam::Error::Io(io) => map_open_error(&self.device, io),
                    other => ScanError::DeviceUnavailable(other.to_string()),
                })?;

            let torch = camera.get_control(V4L2_CID_FLASH_LED_MODE).is_ok();
            Ok(Box::new(V4l2Camera { camera, torch, torch_on: false }))
        }
    }
}

#[cfg(not(target_os = "linux"))]
impl CameraProvider for V4l2Provider {
    fn open(&self, _facing: Facing) -> Result<Box<dyn super::Camera>, ScanError> {
        Err(ScanError::DeviceUnavailable(format!(
            "camera capture is only supported on Linux ({})",
            self.device.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yuyv_grey_and_white() {
        // Y=16 is black, Y=235 is white with neutral chroma
        let rgba = yuyv_to_rgba(&[16, 128, 235, 128], 2, 1);
        assert_eq!(&rgba[..4], &[0, 0, 0, 255]);
        assert!(rgba[4..7].iter().all(|&c| c >= 254));
        assert_eq!(rgba[7], 255);
    }

    #[test]
    fn test_short_buffer_yields_partial_frame() {
        assert_eq!(yuyv_to_rgba(&[16, 128, 16, 128], 4, 1).len(), 8);
    }

    #[test]
    fn test_open_error_mapping() {
        let dev = std::path::Path::new("/dev/video9");
        let denied = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        assert!(matches!(map_open_error(dev, denied), ScanError::PermissionDenied(_)));
        let missing = std::io::Error::from(std::io::ErrorKind::NotFound);
        assert!(matches!(map_open_error(dev, missing), ScanError::DeviceUnavailable(_)));
    }

    #[test]
    fn test_missing_device_is_unavailable() {
        let provider = V4l2Provider::new("/dev/definitely-not-a-camera");
        let err = provider.open(Facing::Environment).err().unwrap();
        assert!(matches!(err, ScanError::DeviceUnavailable(_)));
    }
}
