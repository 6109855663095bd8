//! Canvas rendering and gesture wiring for the viewer.

use crate::ViewerApp;
use crate::assets::AssetLoadState;
use crate::colors;
use crate::constants::{DEBUG_OVERLAY_SIZE, MAX_ANIMATION_DT};
use eframe::egui;
use pinch_viewer::Viewport;
use pinch_viewer::animation::AnimatedValue;
use pinch_viewer::gesture::{PinchOutcome, WHEEL_PINCH_TIMEOUT};
use pinch_viewer::scene::BACKGROUND_PLANE_SIZE;
use pinch_viewer::transform::{ScreenGeometry, calculate_screen_position};
use std::time::Duration;

impl ViewerApp {
    /// Handles keyboard shortcuts.
    pub fn handle_keyboard_input(&mut self, ctx: &egui::Context) {
        if ctx.input(|i| i.key_pressed(egui::Key::Num0)) {
            self.reset_view();
        }
    }

    /// Remembers the last pointer position for the debug readout.
    pub fn track_mouse(&mut self, ctx: &egui::Context) {
        if let Some(pos) = ctx.input(|i| i.pointer.latest_pos()) {
            self.mouse_pos = pos;
        }
    }

    /// Renders the full-window canvas: background plane and image quad.
    pub fn show_canvas(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let (canvas_rect, response) =
                    ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
                // Nothing to map gestures or the scene onto until the canvas has a height
                let Some(viewport) = self.viewport_for(canvas_rect.size()) else {
                    return;
                };

                self.handle_pinch(ui, canvas_rect, viewport);
                self.handle_drag(ui, &response, viewport);
                if response.clicked() {
                    self.log_image_position(viewport);
                }
                self.advance_animation(ctx);

                let painter = ui.painter_at(canvas_rect);
                self.draw_background(&painter, canvas_rect, viewport);
                self.draw_image(ui, canvas_rect, viewport);
            });
    }

    /// Current canvas size with the aspect factor captured on the first
    /// layout that has a height.
    fn viewport_for(&mut self, size: egui::Vec2) -> Option<Viewport> {
        let aspect_factor = match self.aspect_factor {
            Some(factor) => factor,
            None => {
                let factor = self.config.camera.usable_aspect_factor(size.y)?;
                log::info!(
                    "Canvas created at {}x{} px, {factor:.3} px per scene unit",
                    size.x,
                    size.y
                );
                *self.aspect_factor.insert(factor)
            }
        };
        Some(Viewport {
            size,
            aspect_factor,
        })
    }

    fn geometry(&self, viewport: Viewport) -> ScreenGeometry {
        let state = self.view.get();
        calculate_screen_position(
            self.config.image_dimensions,
            state.scale,
            state.position,
            viewport.aspect_factor,
            viewport.size,
        )
    }

    fn handle_pinch(&mut self, ui: &egui::Ui, canvas_rect: egui::Rect, viewport: Viewport) {
        let (events, wheel_zoom, pointer, now) = ui.input(|i| {
            // Touch pinches are recognized from the raw touch events instead
            let wheel_zoom = if i.multi_touch().is_some() {
                1.0
            } else {
                i.zoom_delta()
            };
            (i.events.clone(), wheel_zoom, i.pointer.latest_pos(), i.time)
        });

        let outcomes = self.gestures.pinch_frame(
            &mut self.view,
            &events,
            wheel_zoom,
            pointer,
            now,
            canvas_rect.min,
            viewport,
        );
        for (sample, outcome) in outcomes {
            match outcome {
                PinchOutcome::Updated(state) => {
                    log::trace!("Pinch to scale {:.3} at {:?}", state.scale, state.position);
                }
                PinchOutcome::Finished => {
                    log::debug!("Pinch finished (canceled: {})", sample.canceled);
                }
            }
        }

        // Wake up to notice the end of a wheel pinch
        if self.gestures.is_pinching() {
            ui.ctx()
                .request_repaint_after(Duration::from_secs_f64(WHEEL_PINCH_TIMEOUT));
        }
    }

    fn handle_drag(&mut self, ui: &egui::Ui, response: &egui::Response, viewport: Viewport) {
        if response.drag_started() {
            self.gestures.drag_start(&self.view);
        } else if response.dragged() {
            let (origin, current) =
                ui.input(|i| (i.pointer.press_origin(), i.pointer.interact_pos()));
            if let (Some(origin), Some(current)) = (origin, current) {
                self.gestures
                    .drag_move(&mut self.view, current - origin, viewport.aspect_factor);
            }
        }

        if response.drag_stopped() {
            self.gestures.drag_stop();
        }
    }

    fn log_image_position(&self, viewport: Viewport) {
        let geometry = self.geometry(viewport);
        log::info!(
            "Image position relative to viewport: {} {}",
            geometry.image_top_left_y,
            geometry.image_top_left_x
        );
    }

    fn advance_animation(&mut self, ctx: &egui::Context) {
        let dt = ctx.input(|i| i.stable_dt).min(MAX_ANIMATION_DT);
        if self.view.tick(dt) {
            ctx.request_repaint();
        }
    }

    fn draw_background(&self, painter: &egui::Painter, canvas_rect: egui::Rect, viewport: Viewport) {
        let (r, g, b) = self.config.background_color;
        let side = BACKGROUND_PLANE_SIZE * viewport.aspect_factor;
        let plane = egui::Rect::from_center_size(canvas_rect.center(), egui::vec2(side, side));
        painter.rect_filled(plane, 0.0, egui::Color32::from_rgb(r, g, b));
    }

    fn draw_image(&mut self, ui: &mut egui::Ui, canvas_rect: egui::Rect, viewport: Viewport) {
        let geometry = self.geometry(viewport);
        let image_rect =
            egui::Rect::from_min_size(canvas_rect.min + geometry.top_left().to_vec2(), geometry.size());
        let painter = ui.painter_at(canvas_rect);

        match &self.image {
            AssetLoadState::Loading(_) | AssetLoadState::Ready(_) => {
                let spinner_rect =
                    egui::Rect::from_center_size(image_rect.center(), egui::vec2(24.0, 24.0));
                ui.put(spinner_rect, egui::Spinner::new());
            }
            AssetLoadState::Uploaded => {
                if let Some(texture) = &self.texture {
                    painter.image(
                        texture.id(),
                        image_rect,
                        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                        colors::IMAGE_TINT,
                    );
                }
            }
            AssetLoadState::Error(msg) => {
                painter.rect_filled(image_rect, 0.0, colors::PLACEHOLDER_FILL);
                painter.text(
                    image_rect.center() - egui::vec2(0.0, 16.0),
                    egui::Align2::CENTER_BOTTOM,
                    format!("Failed to load image: {msg}"),
                    egui::FontId::proportional(12.0),
                    colors::PLACEHOLDER_TEXT,
                );

                let button_rect =
                    egui::Rect::from_center_size(image_rect.center(), egui::vec2(64.0, 24.0));
                if ui.put(button_rect, egui::Button::new("Retry")).clicked() {
                    let ctx = ui.ctx().clone();
                    self.retry_image(&ctx);
                }
            }
        }
    }

    /// Renders the pointer readout pinned to the bottom-right corner.
    pub fn show_debug_overlay(&self, ctx: &egui::Context) {
        egui::Area::new(egui::Id::new("debug_overlay"))
            .anchor(egui::Align2::RIGHT_BOTTOM, egui::Vec2::ZERO)
            .order(egui::Order::Foreground)
            .interactable(false)
            .show(ctx, |ui| {
                let (rect, _) = ui.allocate_exact_size(
                    egui::vec2(DEBUG_OVERLAY_SIZE, DEBUG_OVERLAY_SIZE),
                    egui::Sense::hover(),
                );
                ui.painter().rect_filled(rect, 0.0, colors::DEBUG_OVERLAY_FILL);
                ui.painter().text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    format!("{:.0}| {:.0}", self.mouse_pos.x, self.mouse_pos.y),
                    egui::FontId::proportional(10.0),
                    colors::DEBUG_OVERLAY_TEXT,
                );
            });
    }
}
