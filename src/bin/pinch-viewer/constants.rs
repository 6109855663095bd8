/// Side length of the pointer readout in the bottom-right corner, in pixels.
pub const DEBUG_OVERLAY_SIZE: f32 = 50.0;

/// How long error toasts stay up, in seconds.
pub const ERROR_TOAST_SECONDS: f64 = 10.0;

/// Largest frame time handed to the spring, in seconds.
pub const MAX_ANIMATION_DT: f32 = 1.0 / 30.0;
