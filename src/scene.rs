//! Camera model and fixed scene contents.

use serde::{Deserialize, Serialize};

/// Side length of the square background plane, in scene units.
pub const BACKGROUND_PLANE_SIZE: f32 = 10_000.0;

/// Perspective camera on the +Z axis looking at the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Camera {
    /// Distance from the camera to the image plane (z = 0).
    pub distance: f32,
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            distance: 5.0,
            fov_y_degrees: 75.0,
        }
    }
}

impl Camera {
    /// Height of the visible slice of the z = 0 plane, in scene units.
    pub fn visible_height(&self) -> f32 {
        2.0 * self.distance * (self.fov_y_degrees.to_radians() / 2.0).tan()
    }

    /// Pixels per scene unit on the z = 0 plane for a canvas `viewport_height` pixels tall.
    pub fn aspect_factor(&self, viewport_height: f32) -> f32 {
        viewport_height / self.visible_height()
    }

    /// Like [`Camera::aspect_factor`], but `None` for a canvas with no usable
    /// height (a minimized window lays out at zero size).
    pub fn usable_aspect_factor(&self, viewport_height: f32) -> Option<f32> {
        let factor = self.aspect_factor(viewport_height);
        (factor.is_finite() && factor > 0.0).then_some(factor)
    }
}
