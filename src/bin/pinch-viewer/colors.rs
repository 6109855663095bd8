//! Color constants for the scene and overlays.

use eframe::egui::Color32;

// Image quad
pub const IMAGE_TINT: Color32 = Color32::WHITE;
pub const PLACEHOLDER_FILL: Color32 = Color32::from_rgb(90, 90, 90);
pub const PLACEHOLDER_TEXT: Color32 = Color32::from_rgba_premultiplied(255, 255, 255, 220);

// Debug overlay
pub const DEBUG_OVERLAY_FILL: Color32 = Color32::RED;
pub const DEBUG_OVERLAY_TEXT: Color32 = Color32::BLACK;
