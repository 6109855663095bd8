//! Gesture recognition and the bridge from gestures to view state updates.
//!
//! [`GestureRecognizer`] turns raw egui touch events and zoom input into pinch
//! [`GestureSample`]s. [`PinchHandler`] and [`DragSession`] apply pinch and
//! drag samples to an [`AnimatedValue<ViewState>`]. [`CanvasGestures`] ties
//! them together for one canvas; a running pinch owns the view over a drag.

use crate::animation::{AnimatedValue, SetOptions};
use crate::transform::{calculate_screen_position, get_translate_offsets_from_scale};
use crate::{ImageDimensions, ViewState, Viewport};
use eframe::egui::{self, Pos2, TouchId, TouchPhase, Vec2, vec2};
use std::collections::BTreeMap;

/// Converts an egui zoom factor back into wheel pixels; egui maps
/// ctrl+scroll to `exp(pixels / 200)`.
const WHEEL_PIXELS_PER_ZOOM_LOG: f32 = 200.0;

/// Seconds without zoom events after which a wheel pinch ends.
pub const WHEEL_PINCH_TIMEOUT: f64 = 0.15;

/// One frame of a pinch or drag gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureSample {
    /// Movement since the gesture started. For pinches, `x` is the change in
    /// distance between the fingers (or the accumulated wheel pixels).
    pub movement: Vec2,
    /// Where the gesture is happening: the touch midpoint for pinches.
    pub origin: Pos2,
    /// Pointer position when the sample was taken, if known.
    pub pointer: Option<Pos2>,
    pub first: bool,
    pub last: bool,
    pub canceled: bool,
    /// Set for ctrl+wheel and trackpad pinches.
    pub ctrl_key: bool,
}

impl GestureSample {
    /// Re-expresses the positions relative to `origin`.
    pub fn relative_to(self, origin: Pos2) -> Self {
        let shift = origin.to_vec2();
        Self {
            origin: self.origin - shift,
            pointer: self.pointer.map(|p| p - shift),
            ..self
        }
    }

    /// The screen point the zoom should stay anchored to.
    pub fn anchor(&self) -> Pos2 {
        match self.pointer {
            Some(pointer) if self.ctrl_key => pointer,
            _ => self.origin,
        }
    }
}

/// Result of applying a pinch sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PinchOutcome {
    /// The view target was moved to this state.
    Updated(ViewState),
    /// Terminal frame; the view was left alone and the gesture is over.
    Finished,
}

/// Applies pinch samples to the view, keeping the zoom anchored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchHandler {
    pub dimensions: ImageDimensions,
    /// Pixels of pinch movement per unit of scale.
    pub scale_factor: f32,
    pub min_scale: f32,
    pub max_scale: f32,
}

impl PinchHandler {
    pub fn apply(
        &self,
        view: &mut impl AnimatedValue<ViewState>,
        sample: &GestureSample,
        viewport: Viewport,
    ) -> PinchOutcome {
        // No translate math on the final frame
        if sample.last {
            return PinchOutcome::Finished;
        }

        let ViewState { scale, position } = view.get();
        let aspect = viewport.aspect_factor;

        let pinch_scale =
            (scale + sample.movement.x / self.scale_factor).clamp(self.min_scale, self.max_scale);
        let pinch_delta = pinch_scale - scale;

        let geometry =
            calculate_screen_position(self.dimensions, scale, position, aspect, viewport.size);
        let new_translate = get_translate_offsets_from_scale(
            &geometry,
            scale,
            pinch_delta,
            sample.anchor(),
            position,
            aspect,
        );

        let next = ViewState::new(pinch_scale, new_translate);
        view.set(next, SetOptions::default());
        PinchOutcome::Updated(next)
    }
}

/// State of a single drag, from press to release.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    initial_translate: Vec2,
    movement_offset: Vec2,
}

impl DragSession {
    /// Starts a drag, remembering the translate at the first frame.
    pub fn begin(view: &impl AnimatedValue<ViewState>) -> Self {
        Self {
            initial_translate: view.get().position,
            movement_offset: Vec2::ZERO,
        }
    }

    /// Continues a drag that has already moved by `movement` pixels from the
    /// view's current target.
    pub fn rebase(view: &impl AnimatedValue<ViewState>, movement: Vec2) -> Self {
        Self {
            initial_translate: view.target().position,
            movement_offset: movement,
        }
    }

    pub fn initial_translate(&self) -> Vec2 {
        self.initial_translate
    }

    /// Moves the view by `movement` pixels since the drag started.
    pub fn update(
        &self,
        view: &mut impl AnimatedValue<ViewState>,
        movement: Vec2,
        aspect: f32,
    ) -> ViewState {
        let movement = movement - self.movement_offset;
        let position = vec2(
            self.initial_translate.x + movement.x / aspect,
            self.initial_translate.y - movement.y / aspect,
        );
        let next = ViewState::new(view.target().scale, position);
        view.set(next, SetOptions::default());
        next
    }
}

/// Pinch and drag handling for one canvas.
///
/// Touch screens also report the first finger as a pointer drag, so drag
/// movement is ignored while a pinch runs. A drag that outlives the pinch
/// continues from wherever the pinch left the view.
#[derive(Debug)]
pub struct CanvasGestures {
    pinch: PinchHandler,
    recognizer: GestureRecognizer,
    drag: Option<DragSession>,
    rebase_drag: bool,
}

impl CanvasGestures {
    pub fn new(pinch: PinchHandler) -> Self {
        Self {
            pinch,
            recognizer: GestureRecognizer::new(),
            drag: None,
            rebase_drag: false,
        }
    }

    pub fn is_pinching(&self) -> bool {
        self.recognizer.is_pinching()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Runs one frame of pinch input; see [`GestureRecognizer::process`].
    ///
    /// Samples are shifted into canvas space by `canvas_origin` before they
    /// are applied.
    #[allow(clippy::too_many_arguments)]
    pub fn pinch_frame(
        &mut self,
        view: &mut impl AnimatedValue<ViewState>,
        events: &[egui::Event],
        wheel_zoom: f32,
        pointer: Option<Pos2>,
        now: f64,
        canvas_origin: Pos2,
        viewport: Viewport,
    ) -> Vec<(GestureSample, PinchOutcome)> {
        let samples = self.recognizer.process(events, wheel_zoom, pointer, now);
        if !samples.is_empty() && self.drag.is_some() {
            self.rebase_drag = true;
        }

        samples
            .into_iter()
            .map(|sample| {
                let sample = sample.relative_to(canvas_origin);
                (sample, self.pinch.apply(view, &sample, viewport))
            })
            .collect()
    }

    pub fn drag_start(&mut self, view: &impl AnimatedValue<ViewState>) {
        self.drag = Some(DragSession::begin(view));
        self.rebase_drag = self.is_pinching();
    }

    /// Moves the view by the drag's `movement` since press, unless a pinch
    /// owns the view this frame.
    pub fn drag_move(
        &mut self,
        view: &mut impl AnimatedValue<ViewState>,
        movement: Vec2,
        aspect: f32,
    ) -> Option<ViewState> {
        if self.is_pinching() {
            self.rebase_drag |= self.drag.is_some();
            return None;
        }

        let session = self.drag.as_mut()?;
        if self.rebase_drag {
            *session = DragSession::rebase(view, movement);
            self.rebase_drag = false;
        }
        Some(session.update(view, movement, aspect))
    }

    pub fn drag_stop(&mut self) {
        self.drag = None;
        self.rebase_drag = false;
    }
}

#[derive(Debug, Clone, Copy)]
enum PinchSource {
    Touch {
        fingers: (TouchId, TouchId),
        start_distance: f32,
    },
    Wheel {
        last_event: f64,
    },
}

#[derive(Debug, Clone, Copy)]
struct PinchState {
    source: PinchSource,
    movement: Vec2,
    origin: Pos2,
}

/// Recognizes two-finger and wheel pinches from raw egui events.
#[derive(Debug, Default)]
pub struct GestureRecognizer {
    touches: BTreeMap<TouchId, Pos2>,
    pinch: Option<PinchState>,
}

impl GestureRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pinching(&self) -> bool {
        self.pinch.is_some()
    }

    /// Consumes one frame of input and returns the pinch samples it produced.
    ///
    /// `wheel_zoom` is the frame's non-touch zoom factor (ctrl+wheel or
    /// trackpad pinch, 1.0 for none). `now` is the input time in seconds; it
    /// drives the wheel pinch timeout.
    pub fn process(
        &mut self,
        events: &[egui::Event],
        wheel_zoom: f32,
        pointer: Option<Pos2>,
        now: f64,
    ) -> Vec<GestureSample> {
        let mut samples = Vec::new();

        for event in events {
            if let egui::Event::Touch { id, phase, pos, .. } = event {
                self.on_touch(*id, *phase, *pos, &mut samples);
            }
        }

        let zoomed = wheel_zoom != 1.0;
        if zoomed {
            self.on_zoom(wheel_zoom, pointer, now, &mut samples);
        }

        if !zoomed
            && let Some(state) = self.pinch
            && let PinchSource::Wheel { last_event } = state.source
            && now - last_event > WHEEL_PINCH_TIMEOUT
        {
            self.pinch = None;
            samples.push(GestureSample {
                movement: state.movement,
                origin: state.origin,
                pointer,
                first: false,
                last: true,
                canceled: false,
                ctrl_key: true,
            });
        }

        samples
    }

    fn on_touch(
        &mut self,
        id: TouchId,
        phase: TouchPhase,
        pos: Pos2,
        samples: &mut Vec<GestureSample>,
    ) {
        match phase {
            TouchPhase::Start | TouchPhase::Move => {
                self.touches.insert(id, pos);
            }
            TouchPhase::End | TouchPhase::Cancel => {
                self.touches.remove(&id);
            }
        }

        match self.pinch {
            Some(PinchState {
                source: PinchSource::Touch { fingers, .. },
                ..
            }) if id == fingers.0 || id == fingers.1 => {
                if matches!(phase, TouchPhase::End | TouchPhase::Cancel) {
                    let state = self.pinch.take();
                    if let Some(state) = state {
                        samples.push(GestureSample {
                            movement: state.movement,
                            origin: state.origin,
                            pointer: Some(state.origin),
                            first: false,
                            last: true,
                            canceled: phase == TouchPhase::Cancel,
                            ctrl_key: false,
                        });
                    }
                } else if let Some(sample) = self.track_fingers(fingers) {
                    samples.push(sample);
                }
            }
            None if phase == TouchPhase::Start && self.touches.len() == 2 => {
                let mut ids = self.touches.keys().copied();
                if let (Some(a), Some(b)) = (ids.next(), ids.next()) {
                    let (pa, pb) = (self.touches[&a], self.touches[&b]);
                    let origin = pa.lerp(pb, 0.5);
                    self.pinch = Some(PinchState {
                        source: PinchSource::Touch {
                            fingers: (a, b),
                            start_distance: pa.distance(pb),
                        },
                        movement: Vec2::ZERO,
                        origin,
                    });
                    samples.push(GestureSample {
                        movement: Vec2::ZERO,
                        origin,
                        pointer: Some(origin),
                        first: true,
                        last: false,
                        canceled: false,
                        ctrl_key: false,
                    });
                }
            }
            _ => {}
        }
    }

    fn track_fingers(&mut self, fingers: (TouchId, TouchId)) -> Option<GestureSample> {
        let pa = *self.touches.get(&fingers.0)?;
        let pb = *self.touches.get(&fingers.1)?;
        let state = self.pinch.as_mut()?;
        let PinchSource::Touch { start_distance, .. } = state.source else {
            return None;
        };

        state.movement = vec2(pa.distance(pb) - start_distance, 0.0);
        state.origin = pa.lerp(pb, 0.5);

        Some(GestureSample {
            movement: state.movement,
            origin: state.origin,
            pointer: Some(state.origin),
            first: false,
            last: false,
            canceled: false,
            ctrl_key: false,
        })
    }

    fn on_zoom(
        &mut self,
        factor: f32,
        pointer: Option<Pos2>,
        now: f64,
        samples: &mut Vec<GestureSample>,
    ) {
        if factor <= 0.0 || !factor.is_finite() {
            return;
        }
        let pixels = factor.ln() * WHEEL_PIXELS_PER_ZOOM_LOG;

        let first = match &mut self.pinch {
            Some(PinchState {
                source: PinchSource::Wheel { last_event },
                movement,
                origin,
            }) => {
                *last_event = now;
                movement.x += pixels;
                if let Some(pointer) = pointer {
                    *origin = pointer;
                }
                false
            }
            // A touch pinch owns the gesture until it ends
            Some(_) => return,
            None => {
                self.pinch = Some(PinchState {
                    source: PinchSource::Wheel { last_event: now },
                    movement: vec2(pixels, 0.0),
                    origin: pointer.unwrap_or(Pos2::ZERO),
                });
                true
            }
        };

        if let Some(state) = self.pinch {
            samples.push(GestureSample {
                movement: state.movement,
                origin: state.origin,
                pointer,
                first,
                last: false,
                canceled: false,
                ctrl_key: true,
            });
        }
    }
}
