//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the application, providing a single source of truth for constant values.

/// Default rendering geometry
pub mod render {
    /// Default raster width and height in pixels
    pub const DEFAULT_SIZE: u32 = 1000;

    /// Default quiet-zone margin in pixels
    pub const DEFAULT_MARGIN: u32 = 40;

    /// Accepted raster width and height in pixels
    pub const MIN_SIZE: u32 = 200;
    pub const MAX_SIZE: u32 = 2000;

    /// Largest accepted quiet-zone margin in pixels
    pub const MAX_MARGIN: u32 = 200;

    /// Side length of a finder pattern in modules
    pub const FINDER_MODULES: usize = 7;

    /// Modules that can never be covered by an embedded image (two finders wide)
    pub const IMAGE_AXIS_RESERVED: usize = 14;

    /// Error-correction budget (fraction of modules recoverable) per level L, M, Q, H
    pub const EC_RECOVERY: [f32; 4] = [0.07, 0.15, 0.25, 0.30];
}

/// Label compositing constants
pub mod label {
    /// Gap kept between the QR modules and the label text
    pub const VISIBLE_GAP: i64 = 4;

    /// Extra rows appended after the label block
    pub const FINAL_MARGIN: i64 = 5;

    /// Label font size as a fraction of the QR raster width
    pub const FONT_SIZE_RATIO: f32 = 0.06;

    /// Lower bound for the label font size in pixels
    pub const MIN_FONT_SIZE: f32 = 10.0;
}

/// Renderer adapter timing
pub mod timing {
    /// Delay before a style change is applied while the preview is faded out
    pub const STYLE_TRANSITION_MS: u64 = 80;

    /// Fade-in duration after a style change lands
    pub const FADE_IN_MS: u64 = 200;
}

/// Export targets
pub mod export {
    /// Base name used for every exported file
    pub const FILE_STEM: &str = "iLoveQR";

    /// Title handed to the share target
    pub const SHARE_TITLE: &str = "My QR Code";

    /// Side of the square box the QR occupies on the PDF page, in millimetres
    pub const PDF_IMAGE_MM: f32 = 75.0;

    /// A4 page size in PDF points
    pub const PDF_PAGE_WIDTH_PT: f32 = 595.28;
    pub const PDF_PAGE_HEIGHT_PT: f32 = 841.89;

    /// Points per millimetre
    pub const PT_PER_MM: f32 = 72.0 / 25.4;
}

/// Camera scanning constants
pub mod scanner {
    /// Device node opened by the V4L2 camera provider
    pub const DEFAULT_DEVICE: &str = "/dev/video0";

    /// Requested capture resolution
    pub const CAPTURE_WIDTH: u32 = 640;
    pub const CAPTURE_HEIGHT: u32 = 480;

    /// Requested frame interval (numerator, denominator) in seconds
    pub const FRAME_INTERVAL: (u32, u32) = (1, 30);

    /// Sleep between polls when the camera has no frame ready
    pub const IDLE_POLL_MS: u64 = 10;

    /// Only every Nth frame is forwarded to the UI as a preview
    pub const PREVIEW_EVERY_N_FRAMES: u64 = 3;

    /// V4L2_CID_FLASH_LED_MODE
    pub const V4L2_CID_FLASH_LED_MODE: u32 = 0x009c_0901;

    /// V4L2_FLASH_LED_MODE_NONE / V4L2_FLASH_LED_MODE_TORCH
    pub const FLASH_LED_MODE_NONE: i32 = 0;
    pub const FLASH_LED_MODE_TORCH: i32 = 2;
}

/// Persisted settings locations
pub mod config {
    /// Directory under the platform config dir
    pub const APP_DIR: &str = "iloveqr";

    /// Settings file name
    pub const FILENAME: &str = "settings.toml";
}

/// Payload defaults
pub mod payload {
    /// Text encoded when the application starts
    pub const DEFAULT_TEXT: &str = "https://example.com/";
}
