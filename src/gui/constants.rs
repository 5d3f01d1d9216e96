//! GUI-specific constants for layout, status colors and intervals

use egui;

/// Studio window dimensions
pub const WINDOW_WIDTH: f32 = 1100.0;
pub const WINDOW_HEIGHT: f32 = 820.0;
pub const WINDOW_MIN_WIDTH: f32 = 760.0;
pub const WINDOW_MIN_HEIGHT: f32 = 600.0;

/// Layout spacing
pub const PADDING: f32 = 10.0;
pub const SECTION_SPACING: f32 = 15.0;
pub const ITEM_SPACING: f32 = 8.0;

/// Width of the preview column
pub const PREVIEW_PANEL_WIDTH: f32 = 440.0;

/// Side of the square swatch buttons
pub const SWATCH_SIZE: f32 = 18.0;

/// Status colors
pub const STATUS_OK: egui::Color32 = egui::Color32::from_rgb(0, 200, 0);
pub const STATUS_ERROR: egui::Color32 = egui::Color32::from_rgb(200, 0, 0);
pub const STATUS_BUSY: egui::Color32 = egui::Color32::from_rgb(200, 200, 0);

/// Accent used for the selected preset and active toggles
pub const ACCENT: egui::Color32 = egui::Color32::from_rgb(34, 211, 238);

/// Repaint cadence while export jobs are in flight
pub const EXPORT_POLL_MS: u64 = 100;

/// Notices disappear after this long
pub const STATUS_TIMEOUT_SECS: u64 = 4;

/// Fixed palette offered by every color input; transparent stays last
pub const COLOR_PALETTE: [&str; 18] = [
    "#000000", "#444444", "#6B7280", "#9CA3AF", "#E5E7EB", "#FFFFFF", "#EF4444", "#F97316",
    "#FBBF24", "#84CC16", "#22C55E", "#14B8A6", "#06B6D4", "#3B82F6", "#8B5CF6", "#EC4899",
    "#F43F5E", "transparent",
];
