//! Spring-smoothed values.
//!
//! [`AnimatedValue`] is the only contract the gesture code relies on: read the
//! current interpolated value, read the target, and start animating toward a
//! new target. [`Spring`] implements it with a damped harmonic oscillator.

use crate::ViewState;
use eframe::egui::Vec2;
use serde::{Deserialize, Serialize};

/// Fixed integration step in seconds.
const STEP: f32 = 0.001;

/// Longest frame gap simulated in one tick; larger gaps are truncated.
const MAX_FRAME_TIME: f32 = 0.064;

/// Values a spring can move through: a small vector space.
pub trait Animatable: Copy {
    fn zero() -> Self;
    fn add(self, other: Self) -> Self;
    fn sub(self, other: Self) -> Self;
    fn scale(self, factor: f32) -> Self;
    /// Largest absolute component, used for the rest check.
    fn magnitude(self) -> f32;
}

impl Animatable for f32 {
    fn zero() -> Self {
        0.0
    }

    fn add(self, other: Self) -> Self {
        self + other
    }

    fn sub(self, other: Self) -> Self {
        self - other
    }

    fn scale(self, factor: f32) -> Self {
        self * factor
    }

    fn magnitude(self) -> f32 {
        self.abs()
    }
}

impl Animatable for Vec2 {
    fn zero() -> Self {
        Vec2::ZERO
    }

    fn add(self, other: Self) -> Self {
        self + other
    }

    fn sub(self, other: Self) -> Self {
        self - other
    }

    fn scale(self, factor: f32) -> Self {
        self * factor
    }

    fn magnitude(self) -> f32 {
        self.abs().max_elem()
    }
}

impl Animatable for ViewState {
    fn zero() -> Self {
        ViewState::new(0.0, Vec2::ZERO)
    }

    fn add(self, other: Self) -> Self {
        ViewState::new(self.scale + other.scale, self.position + other.position)
    }

    fn sub(self, other: Self) -> Self {
        ViewState::new(self.scale - other.scale, self.position - other.position)
    }

    fn scale(self, factor: f32) -> Self {
        ViewState::new(self.scale * factor, self.position * factor)
    }

    fn magnitude(self) -> f32 {
        self.scale.abs().max(Animatable::magnitude(self.position))
    }
}

/// Options for [`AnimatedValue::set`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SetOptions {
    /// Jump to the target without animating.
    pub immediate: bool,
}

impl SetOptions {
    pub fn immediate() -> Self {
        Self { immediate: true }
    }
}

/// A value that is animated toward a target over time.
pub trait AnimatedValue<T> {
    /// The current interpolated value.
    fn get(&self) -> T;
    /// The value currently being animated toward.
    fn target(&self) -> T;
    /// Starts animating toward `target`.
    fn set(&mut self, target: T, options: SetOptions);
}

/// Physical constants of a [`Spring`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringConfig {
    pub tension: f32,
    pub friction: f32,
    pub mass: f32,
    /// Displacement and velocity below which the spring is at rest.
    pub precision: f32,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            tension: 170.0,
            friction: 26.0,
            mass: 1.0,
            precision: 0.001,
        }
    }
}

/// Damped spring moving a value toward its target.
#[derive(Debug, Clone)]
pub struct Spring<T> {
    config: SpringConfig,
    value: T,
    velocity: T,
    target: T,
    at_rest: bool,
}

impl<T: Animatable> Spring<T> {
    /// Creates a spring resting at `initial`.
    pub fn new(initial: T, config: SpringConfig) -> Self {
        Self {
            config,
            value: initial,
            velocity: T::zero(),
            target: initial,
            at_rest: true,
        }
    }

    pub fn is_animating(&self) -> bool {
        !self.at_rest
    }

    /// Advances the simulation by `dt` seconds. Returns `true` while moving.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.at_rest {
            return false;
        }

        let mut remaining = dt.clamp(0.0, MAX_FRAME_TIME);
        while remaining > 0.0 {
            let step = remaining.min(STEP);
            self.step(step);
            remaining -= step;

            if self.settled() {
                self.value = self.target;
                self.velocity = T::zero();
                self.at_rest = true;
                return false;
            }
        }

        true
    }

    fn step(&mut self, dt: f32) {
        let SpringConfig {
            tension,
            friction,
            mass,
            ..
        } = self.config;

        let displacement = self.value.sub(self.target);
        let spring_force = displacement.scale(-tension);
        let damping_force = self.velocity.scale(-friction);
        let acceleration = spring_force.add(damping_force).scale(1.0 / mass);

        self.velocity = self.velocity.add(acceleration.scale(dt));
        self.value = self.value.add(self.velocity.scale(dt));
    }

    fn settled(&self) -> bool {
        let precision = self.config.precision;
        self.value.sub(self.target).magnitude() < precision && self.velocity.magnitude() < precision
    }
}

impl<T: Animatable> AnimatedValue<T> for Spring<T> {
    fn get(&self) -> T {
        self.value
    }

    fn target(&self) -> T {
        self.target
    }

    fn set(&mut self, target: T, options: SetOptions) {
        self.target = target;
        if options.immediate {
            self.value = target;
            self.velocity = T::zero();
            self.at_rest = true;
        } else {
            self.at_rest = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::vec2;

    fn run_until_rest<T: Animatable>(spring: &mut Spring<T>) -> usize {
        let mut frames = 0;
        while spring.tick(1.0 / 60.0) {
            frames += 1;
            assert!(frames < 600, "spring did not settle");
        }
        frames
    }

    #[test]
    fn new_spring_is_at_rest() {
        let mut spring = Spring::new(3.0_f32, SpringConfig::default());
        assert!(!spring.is_animating());
        assert!(!spring.tick(0.016));
        assert_eq!(spring.get(), 3.0);
    }

    #[test]
    fn settles_exactly_on_target() {
        let mut spring = Spring::new(ViewState::default(), SpringConfig::default());
        let target = ViewState::new(2.5, vec2(-3.0, 1.25));
        spring.set(target, SetOptions::default());
        assert!(spring.is_animating());

        let frames = run_until_rest(&mut spring);
        assert!(frames > 1);
        assert_eq!(spring.get(), target);
        assert!(!spring.is_animating());
    }

    #[test]
    fn moves_toward_target_without_reaching_it_in_one_frame() {
        let mut spring = Spring::new(0.0_f32, SpringConfig::default());
        spring.set(10.0, SetOptions::default());
        spring.tick(1.0 / 60.0);
        let value = spring.get();
        assert!(value > 0.0 && value < 10.0, "{value}");
    }

    #[test]
    fn get_is_unchanged_until_ticked() {
        let mut spring = Spring::new(vec2(1.0, 1.0), SpringConfig::default());
        spring.set(vec2(5.0, -5.0), SetOptions::default());
        assert_eq!(spring.get(), vec2(1.0, 1.0));
        assert_eq!(spring.target(), vec2(5.0, -5.0));
    }

    #[test]
    fn immediate_jumps_to_target() {
        let mut spring = Spring::new(ViewState::default(), SpringConfig::default());
        spring.set(ViewState::new(1.5, vec2(1.0, 0.0)), SetOptions::default());
        spring.tick(0.016);

        let target = ViewState::new(4.0, vec2(-2.0, 2.0));
        spring.set(target, SetOptions::immediate());
        assert_eq!(spring.get(), target);
        assert!(!spring.is_animating());
        assert!(!spring.tick(0.016));
    }

    #[test]
    fn retargeting_mid_flight_keeps_momentum() {
        let mut spring = Spring::new(0.0_f32, SpringConfig::default());
        spring.set(10.0, SetOptions::default());
        for _ in 0..5 {
            spring.tick(1.0 / 60.0);
        }
        let before = spring.get();
        spring.set(before, SetOptions::default());
        spring.tick(1.0 / 60.0);
        // Velocity carried over pushes past the new target
        assert!(spring.get() > before);
        run_until_rest(&mut spring);
        assert_eq!(spring.get(), before);
    }

    #[test]
    fn huge_frame_gap_is_truncated() {
        let mut spring = Spring::new(0.0_f32, SpringConfig::default());
        spring.set(100.0, SetOptions::default());
        spring.tick(10.0);
        assert!(spring.is_animating());
        assert!(spring.get() < 100.0);
    }
}
