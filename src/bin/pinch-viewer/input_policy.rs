//! Process-wide wheel suppression, held for the lifetime of the view.
//!
//! Without it, native scrolling reacts to the same wheel input that drives
//! the pinch gesture.

use eframe::egui;
use std::sync::atomic::{AtomicBool, Ordering};

static WHEEL_SUPPRESSED: AtomicBool = AtomicBool::new(false);

/// Guard that keeps wheel scrolling suppressed until dropped.
#[derive(Debug)]
pub struct InputPolicy {
    _private: (),
}

impl InputPolicy {
    /// Installs the policy. Returns `None` if another guard already holds it.
    pub fn acquire() -> Option<Self> {
        WHEEL_SUPPRESSED
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        log::info!("Wheel suppression acquired");
        Some(Self { _private: () })
    }

    pub fn is_active() -> bool {
        WHEEL_SUPPRESSED.load(Ordering::Acquire)
    }

    /// Strips this frame's scroll input before any widget can consume it.
    pub fn apply(&self, ctx: &egui::Context) {
        ctx.input_mut(suppress_scroll);
    }
}

impl Drop for InputPolicy {
    fn drop(&mut self) {
        WHEEL_SUPPRESSED.store(false, Ordering::Release);
        log::info!("Wheel suppression released");
    }
}

fn suppress_scroll(input: &mut egui::InputState) {
    input.raw_scroll_delta = egui::Vec2::ZERO;
    input.smooth_scroll_delta = egui::Vec2::ZERO;
    input
        .events
        .retain(|event| !matches!(event, egui::Event::MouseWheel { .. }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_is_exclusive_and_released_on_drop() {
        let guard = InputPolicy::acquire().expect("first acquire succeeds");
        assert!(InputPolicy::is_active());
        assert!(InputPolicy::acquire().is_none());

        drop(guard);
        assert!(!InputPolicy::is_active());

        let again = InputPolicy::acquire();
        assert!(again.is_some());
    }

    #[test]
    fn scroll_is_cleared_but_other_events_survive() {
        let mut input = egui::InputState::default();
        input.raw_scroll_delta = egui::vec2(0.0, 40.0);
        input.smooth_scroll_delta = egui::vec2(0.0, 12.0);
        input.events = vec![egui::Event::PointerGone, egui::Event::Zoom(1.1)];

        suppress_scroll(&mut input);

        assert_eq!(input.raw_scroll_delta, egui::Vec2::ZERO);
        assert_eq!(input.smooth_scroll_delta, egui::Vec2::ZERO);
        assert_eq!(
            input.events,
            vec![egui::Event::PointerGone, egui::Event::Zoom(1.1)]
        );
    }
}
