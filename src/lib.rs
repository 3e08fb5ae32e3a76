//! Tilt Balls - balls on a canvas that fall wherever you tilt
//!
//! Core modules:
//! - `gravity`: Tilt/mouse to gravity mapping and input source selection
//! - `reset`: Shake/double-tap detection and the respawn countdown
//! - `sim`: Physics world (rapier2d) and per-frame stepping
//! - `settings`: Persisted user preferences
//! - `feedback`: Sound/haptic decisions for simulation events
//! - `persistence`: Key-value stores behind the settings
//! - `audio`: Procedural Web Audio sound effects
//! - `renderer`: WebGPU rendering pipeline
//! - `platform`: Browser/native platform abstraction
//! - `ui`: Countdown overlay and settings panel DOM glue

pub mod audio;
pub mod feedback;
pub mod gravity;
pub mod persistence;
pub mod platform;
pub mod renderer;
pub mod reset;
pub mod settings;
pub mod sim;
pub mod ui;

pub use gravity::{GravityController, InputSource};
pub use reset::{ResetEvent, ResetMachine, ResetTrigger};
pub use settings::Settings;

use glam::Vec2;

/// Tuning constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz for smooth physics)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Maximum magnitude of the normalized gravity vector
    pub const MAX_GRAVITY: f32 = 1.0;
    /// Acceleration applied to the world at full gravity (m/s²)
    pub const GRAVITY_ACCEL: f32 = 19.6;
    /// Tilt (degrees) that produces full gravity along an axis
    pub const TILT_RANGE_DEG: f32 = 45.0;
    /// Consecutive empty orientation events before falling back to the mouse
    pub const NULL_ORIENTATION_LIMIT: u32 = 10;

    /// Screen pixels per physics meter
    pub const PIXELS_PER_METER: f32 = 100.0;
    /// Wall thickness around the viewport (pixels)
    pub const WALL_THICKNESS: f32 = 200.0;

    /// Ball count limits
    pub const BALL_COUNT_MIN: u32 = 1;
    pub const BALL_COUNT_MAX: u32 = 30;
    pub const BALL_COUNT_DEFAULT: u32 = 12;

    /// Ball radius range (pixels, before small-screen scaling)
    pub const BALL_RADIUS_MIN: f32 = 18.0;
    pub const BALL_RADIUS_MAX: f32 = 44.0;
    /// Viewport short side at which radii are used unscaled
    pub const REFERENCE_SHORT_SIDE: f32 = 720.0;

    /// Acceleration delta between motion samples that counts as a shake (m/s²)
    pub const SHAKE_THRESHOLD: f32 = 18.0;
    /// Max gap between taps of a double tap
    pub const DOUBLE_TAP_MS: f64 = 300.0;
    /// Max distance between taps of a double tap (pixels)
    pub const DOUBLE_TAP_RADIUS: f32 = 60.0;

    /// Countdown ticks before respawn (3, 2, 1)
    pub const COUNTDOWN_STEPS: u8 = 3;
    /// Spacing between countdown ticks
    pub const COUNTDOWN_INTERVAL_MS: f64 = 1000.0;
    /// Minimum time after a respawn before another reset is accepted
    pub const RESET_COOLDOWN_MS: f64 = 1500.0;

    /// Contact force (N) that maps to a full-strength impact
    pub const IMPACT_FORCE_FULL: f32 = 400.0;
    /// Impacts weaker than this (normalized) are not reported
    pub const IMPACT_MIN_STRENGTH: f32 = 0.08;
    /// Minimum spacing between impact sounds/vibrations
    pub const IMPACT_FEEDBACK_INTERVAL_MS: f64 = 70.0;
}

/// Rotate a vector by an angle in degrees (counter-clockwise in y-down screen space)
#[inline]
pub fn rotate_deg(v: Vec2, degrees: f32) -> Vec2 {
    let (sin, cos) = degrees.to_radians().sin_cos();
    Vec2::new(v.x * cos + v.y * sin, -v.x * sin + v.y * cos)
}

/// Convert screen pixels to physics meters
#[inline]
pub fn px_to_m(px: f32) -> f32 {
    px / consts::PIXELS_PER_METER
}

/// Convert physics meters to screen pixels
#[inline]
pub fn m_to_px(m: f32) -> f32 {
    m * consts::PIXELS_PER_METER
}
