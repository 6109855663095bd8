//! Screen-space geometry of the image and pinch-to-point translate compensation.
//!
//! Screen coordinates are pixels relative to the canvas top-left, Y down.
//! Scene coordinates are units relative to the canvas center, Y up.

use crate::ImageDimensions;
use eframe::egui::{Pos2, Vec2, pos2, vec2};

/// Where the image lands on screen for a given view state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenGeometry {
    pub image_width: f32,
    pub image_height: f32,
    pub image_top_left_x: f32,
    pub image_top_left_y: f32,
}

impl ScreenGeometry {
    pub fn top_left(&self) -> Pos2 {
        pos2(self.image_top_left_x, self.image_top_left_y)
    }

    pub fn size(&self) -> Vec2 {
        vec2(self.image_width, self.image_height)
    }

    pub fn center(&self) -> Pos2 {
        self.top_left() + self.size() / 2.0
    }

    /// Maps a screen point to image-local coordinates relative to the image
    /// center, normalized by `scale`.
    pub fn image_coord_at(&self, point: Pos2, scale: f32) -> Vec2 {
        (point - self.center()) / scale
    }

    /// Inverse of [`Self::image_coord_at`].
    pub fn screen_point_of(&self, image_coord: Vec2, scale: f32) -> Pos2 {
        self.center() + image_coord * scale
    }
}

/// Computes the rendered pixel size and top-left corner of the image.
///
/// The image is centered in the viewport and then offset by `translate`,
/// with the Y axis flipped. `aspect` converts scene units to pixels and is
/// applied to both the size and the offset.
pub fn calculate_screen_position(
    dimensions: ImageDimensions,
    scale: f32,
    translate: Vec2,
    aspect: f32,
    viewport_size: Vec2,
) -> ScreenGeometry {
    let image_width = dimensions.width * scale * aspect;
    let image_height = dimensions.height * scale * aspect;
    let image_top_left_x = translate.x * aspect + viewport_size.x / 2.0 - image_width / 2.0;
    let image_top_left_y = viewport_size.y / 2.0 - translate.y * aspect - image_height / 2.0;

    ScreenGeometry {
        image_width,
        image_height,
        image_top_left_x,
        image_top_left_y,
    }
}

/// Computes the translate that keeps the image point under `touch_origin`
/// fixed on screen while scale grows by `pinch_delta`.
///
/// A zero `pinch_delta` returns `current_translate` bit for bit.
pub fn get_translate_offsets_from_scale(
    geometry: &ScreenGeometry,
    scale: f32,
    pinch_delta: f32,
    touch_origin: Pos2,
    current_translate: Vec2,
    aspect: f32,
) -> Vec2 {
    debug_assert!(scale > 0.0, "scale must be positive, got {scale}");

    // Touch position relative to the image center at the current scale
    let image_coord_x =
        (touch_origin.x - geometry.image_top_left_x - geometry.image_width / 2.0) / scale;
    let image_coord_y =
        (touch_origin.y - geometry.image_top_left_y - geometry.image_height / 2.0) / scale;

    // Same as (-c * d + t * a) / a, arranged so d = 0 leaves t untouched
    let new_translate_x = current_translate.x - image_coord_x * pinch_delta / aspect;
    let new_translate_y = current_translate.y + image_coord_y * pinch_delta / aspect;

    vec2(new_translate_x, new_translate_y)
}
