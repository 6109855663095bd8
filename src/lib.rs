//! Core of the pinch viewer: view state, pinch-to-point math, gesture
//! interpretation, spring animation and configuration.
//!
//! Nothing in this crate draws; the `pinch-viewer` binary wires these pieces
//! into an eframe window.

pub mod animation;
pub mod config;
pub mod gesture;
pub mod scene;
pub mod transform;

use eframe::egui::Vec2;
use serde::{Deserialize, Serialize};

/// Intrinsic size of the displayed image, in scene units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: f32,
    pub height: f32,
}

impl Default for ImageDimensions {
    fn default() -> Self {
        Self {
            width: 5.0,
            height: 7.0,
        }
    }
}

/// Uniform scale and translate of the image, in scene units.
///
/// Replaced wholesale on every update; `scale` is always positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub scale: f32,
    pub position: Vec2,
}

impl ViewState {
    pub fn new(scale: f32, position: Vec2) -> Self {
        Self { scale, position }
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            position: Vec2::ZERO,
        }
    }
}

/// Pixel size of the canvas and its scene-unit-to-pixel factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Canvas size in pixels.
    pub size: Vec2,
    /// Pixels per scene unit on the image plane.
    pub aspect_factor: f32,
}
