//! Gravity input mapping
//!
//! Turns device orientation angles or the pointer position into a clamped
//! two-component gravity vector. Pure functions plus one small controller that
//! tracks which input source currently owns gravity.

use glam::Vec2;

use crate::consts::*;
use crate::rotate_deg;

/// Device orientation angles (degrees)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tilt {
    /// Front-to-back tilt, [-180, 180)
    pub beta: f32,
    /// Left-to-right tilt, [-90, 90)
    pub gamma: f32,
}

impl Tilt {
    pub fn new(beta: f32, gamma: f32) -> Self {
        Self { beta, gamma }
    }

    /// Build from optional event fields (browsers report null without a sensor)
    pub fn from_event(beta: Option<f64>, gamma: Option<f64>) -> Option<Self> {
        Some(Self::new(beta? as f32, gamma? as f32))
    }
}

/// Limit a vector to `max` length, keeping its direction
pub fn clamp_magnitude(v: Vec2, max: f32) -> Vec2 {
    if !v.is_finite() || max <= 0.0 {
        return Vec2::ZERO;
    }
    let len = v.length();
    if len <= max {
        return v;
    }
    let mut out = v * (max / len);
    // Rescaling can round one ulp past `max`
    while out.length() > max {
        out *= 1.0 - f32::EPSILON;
    }
    out
}

/// Map device tilt to gravity, compensating for screen rotation
pub fn tilt_to_gravity(tilt: Tilt, screen_angle_deg: f32) -> Vec2 {
    let device = Vec2::new(tilt.gamma / TILT_RANGE_DEG, tilt.beta / TILT_RANGE_DEG);
    let screen = rotate_deg(device, screen_angle_deg);
    clamp_magnitude(screen * MAX_GRAVITY, MAX_GRAVITY)
}

/// Map a pointer position to gravity: pull toward the pointer, zero at the center
pub fn pointer_to_gravity(x: f32, y: f32, width: f32, height: f32) -> Vec2 {
    if width <= 0.0 || height <= 0.0 {
        return Vec2::ZERO;
    }
    let half = Vec2::new(width / 2.0, height / 2.0);
    let offset = (Vec2::new(x, y) - half) / half;
    clamp_magnitude(offset * MAX_GRAVITY, MAX_GRAVITY)
}

/// Which input currently steers gravity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    Gyroscope,
    Mouse,
}

/// Owns the gravity vector and decides which input source may write it
#[derive(Debug, Clone)]
pub struct GravityController {
    source: InputSource,
    latest: Vec2,
    null_events: u32,
    gyro_blocked: bool,
    /// Whether a real orientation reading has ever arrived
    gyro_seen: bool,
    /// Gravity held while a reset countdown runs
    held: Option<Vec2>,
}

impl Default for GravityController {
    fn default() -> Self {
        Self::new(InputSource::Mouse)
    }
}

impl GravityController {
    pub fn new(source: InputSource) -> Self {
        Self {
            source,
            latest: Vec2::new(0.0, MAX_GRAVITY),
            null_events: 0,
            gyro_blocked: false,
            gyro_seen: false,
            held: None,
        }
    }

    pub fn source(&self) -> InputSource {
        self.source
    }

    pub fn is_frozen(&self) -> bool {
        self.held.is_some()
    }

    /// Gravity to apply this frame (held at its pre-countdown value while frozen)
    pub fn gravity(&self) -> Vec2 {
        self.held.unwrap_or(self.latest)
    }

    /// Feed a deviceorientation event
    pub fn on_orientation(&mut self, beta: Option<f64>, gamma: Option<f64>, screen_angle: f32) {
        let Some(tilt) = Tilt::from_event(beta, gamma) else {
            self.null_events = self.null_events.saturating_add(1);
            if self.null_events == NULL_ORIENTATION_LIMIT && self.source == InputSource::Gyroscope {
                log::info!(
                    "No orientation data after {} events, switching to mouse",
                    NULL_ORIENTATION_LIMIT
                );
                self.source = InputSource::Mouse;
            }
            return;
        };

        self.null_events = 0;
        self.gyro_seen = true;
        if self.gyro_blocked {
            return;
        }
        if self.source != InputSource::Gyroscope {
            log::info!("Orientation data available, steering with gyroscope");
            self.source = InputSource::Gyroscope;
        }
        self.latest = tilt_to_gravity(tilt, screen_angle);
    }

    /// Feed a pointer position (CSS pixels within a `width` x `height` viewport).
    /// A mouse on a device whose gyroscope never reported takes over steering.
    pub fn on_pointer(&mut self, x: f32, y: f32, width: f32, height: f32) {
        if self.source != InputSource::Mouse {
            if self.gyro_seen {
                return;
            }
            log::info!("Pointer moved before any orientation data, steering with mouse");
            self.source = InputSource::Mouse;
        }
        self.latest = pointer_to_gravity(x, y, width, height);
    }

    /// Motion permission was refused; the gyroscope never takes over again
    pub fn on_permission_denied(&mut self) {
        log::warn!("Motion permission denied, using mouse control");
        self.gyro_blocked = true;
        self.source = InputSource::Mouse;
    }

    /// Hold the current gravity; input keeps updating underneath
    pub fn freeze(&mut self) {
        if self.held.is_none() {
            self.held = Some(self.latest);
        }
    }

    pub fn unfreeze(&mut self) {
        self.held = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_clamp_keeps_short_vectors() {
        let v = Vec2::new(0.3, -0.4);
        assert_eq!(clamp_magnitude(v, 1.0), v);
    }

    #[test]
    fn test_clamp_rescales_long_vectors() {
        let v = clamp_magnitude(Vec2::new(3.0, 4.0), 1.0);
        assert!((v.length() - 1.0).abs() < 1e-6);
        assert!((v.x - 0.6).abs() < 1e-6);
        assert!((v.y - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_clamp_non_finite_is_zero() {
        assert_eq!(clamp_magnitude(Vec2::new(f32::NAN, 1.0), 1.0), Vec2::ZERO);
        assert_eq!(clamp_magnitude(Vec2::new(f32::INFINITY, 0.0), 1.0), Vec2::ZERO);
    }

    #[test]
    fn test_flat_device_has_no_gravity() {
        assert_eq!(tilt_to_gravity(Tilt::new(0.0, 0.0), 0.0), Vec2::ZERO);
    }

    #[test]
    fn test_tilt_right_pulls_right() {
        let g = tilt_to_gravity(Tilt::new(0.0, 20.0), 0.0);
        assert!(g.x > 0.0);
        assert!(g.y.abs() < 1e-6);
    }

    #[test]
    fn test_upright_device_pulls_down() {
        let g = tilt_to_gravity(Tilt::new(90.0, 0.0), 0.0);
        assert!((g.y - MAX_GRAVITY).abs() < 1e-6);
    }

    #[test]
    fn test_landscape_rotation() {
        // Device turned counter-clockwise: beta now drives the horizontal axis
        // and gamma the vertical one
        let g = tilt_to_gravity(Tilt::new(-20.0, 0.0), 90.0);
        assert!(g.x < 0.0);
        let g = tilt_to_gravity(Tilt::new(0.0, 20.0), 90.0);
        assert!(g.y < 0.0);
    }

    #[test]
    fn test_pointer_center_is_zero() {
        assert_eq!(pointer_to_gravity(400.0, 300.0, 800.0, 600.0), Vec2::ZERO);
    }

    #[test]
    fn test_pointer_corner_is_clamped() {
        let g = pointer_to_gravity(800.0, 600.0, 800.0, 600.0);
        assert!((g.length() - MAX_GRAVITY).abs() < 1e-5);
        assert!(g.x > 0.0 && g.y > 0.0);
    }

    #[test]
    fn test_pointer_degenerate_viewport() {
        assert_eq!(pointer_to_gravity(10.0, 10.0, 0.0, 600.0), Vec2::ZERO);
    }

    #[test]
    fn test_null_events_fall_back_to_mouse() {
        let mut ctl = GravityController::new(InputSource::Gyroscope);
        for _ in 0..NULL_ORIENTATION_LIMIT - 1 {
            ctl.on_orientation(None, None, 0.0);
        }
        assert_eq!(ctl.source(), InputSource::Gyroscope);
        ctl.on_orientation(None, Some(3.0), 0.0);
        assert_eq!(ctl.source(), InputSource::Mouse);
    }

    #[test]
    fn test_real_data_resets_null_counter() {
        let mut ctl = GravityController::new(InputSource::Gyroscope);
        for _ in 0..NULL_ORIENTATION_LIMIT - 1 {
            ctl.on_orientation(None, None, 0.0);
        }
        ctl.on_orientation(Some(10.0), Some(0.0), 0.0);
        for _ in 0..NULL_ORIENTATION_LIMIT - 1 {
            ctl.on_orientation(None, None, 0.0);
        }
        assert_eq!(ctl.source(), InputSource::Gyroscope);
    }

    #[test]
    fn test_orientation_data_takes_over_from_mouse() {
        let mut ctl = GravityController::new(InputSource::Mouse);
        ctl.on_orientation(Some(0.0), Some(45.0), 0.0);
        assert_eq!(ctl.source(), InputSource::Gyroscope);
        assert!((ctl.gravity().x - MAX_GRAVITY).abs() < 1e-6);

        // Mouse no longer writes gravity
        ctl.on_pointer(0.0, 0.0, 800.0, 600.0);
        assert!((ctl.gravity().x - MAX_GRAVITY).abs() < 1e-6);
    }

    #[test]
    fn test_permission_denied_blocks_gyroscope() {
        let mut ctl = GravityController::new(InputSource::Gyroscope);
        ctl.on_permission_denied();
        ctl.on_orientation(Some(30.0), Some(30.0), 0.0);
        assert_eq!(ctl.source(), InputSource::Mouse);
        ctl.on_pointer(400.0, 300.0, 800.0, 600.0);
        assert_eq!(ctl.gravity(), Vec2::ZERO);
    }

    #[test]
    fn test_freeze_holds_and_unfreeze_resumes() {
        let mut ctl = GravityController::new(InputSource::Mouse);
        ctl.on_pointer(800.0, 300.0, 800.0, 600.0);
        let before = ctl.gravity();
        ctl.freeze();
        assert!(ctl.is_frozen());
        assert_eq!(ctl.gravity(), before);

        // Input keeps tracking while frozen
        ctl.on_pointer(0.0, 300.0, 800.0, 600.0);
        assert_eq!(ctl.gravity(), before);
        // A second freeze keeps the original hold
        ctl.freeze();
        assert_eq!(ctl.gravity(), before);

        ctl.unfreeze();
        assert!(!ctl.is_frozen());
        assert!((ctl.gravity().x + MAX_GRAVITY).abs() < 1e-6);
    }

    #[test]
    fn test_clamp_rounding_never_overshoots() {
        // Directions where v * (max / len) rounds one ulp long
        for v in [
            Vec2::new(0.9868174, -0.16183804) * 1.3,
            Vec2::new(1.0, -0.1640625),
            Vec2::new(3.0, 4.0),
            Vec2::new(-7.0, 0.3),
        ] {
            assert!(clamp_magnitude(v, MAX_GRAVITY).length() <= MAX_GRAVITY);
        }
        for x in 0..800 {
            assert!(pointer_to_gravity(x as f32, 0.0, 800.0, 600.0).length() <= MAX_GRAVITY);
            assert!(pointer_to_gravity(x as f32, 650.0, 800.0, 600.0).length() <= MAX_GRAVITY);
        }
    }

    #[test]
    fn test_mouse_takes_over_silent_gyroscope() {
        // Touchscreen laptops start on the gyroscope but never send orientation data
        let mut ctl = GravityController::new(InputSource::Gyroscope);
        ctl.on_orientation(None, None, 0.0);
        ctl.on_pointer(800.0, 300.0, 800.0, 600.0);
        assert_eq!(ctl.source(), InputSource::Mouse);
        assert!((ctl.gravity().x - MAX_GRAVITY).abs() < 1e-6);
    }

    #[test]
    fn test_mouse_ignored_once_gyroscope_reported() {
        let mut ctl = GravityController::new(InputSource::Gyroscope);
        ctl.on_orientation(Some(0.0), Some(0.0), 0.0);
        ctl.on_pointer(800.0, 300.0, 800.0, 600.0);
        assert_eq!(ctl.source(), InputSource::Gyroscope);
        assert_eq!(ctl.gravity(), Vec2::ZERO);
    }

    proptest! {
        #[test]
        fn prop_tilt_never_exceeds_max(
            beta in -180.0f32..180.0,
            gamma in -90.0f32..90.0,
            quarter in 0u32..4,
        ) {
            let g = tilt_to_gravity(Tilt::new(beta, gamma), quarter as f32 * 90.0);
            prop_assert!(g.length() <= MAX_GRAVITY);
        }

        #[test]
        fn prop_pointer_never_exceeds_max(
            x in -2000.0f32..4000.0,
            y in -2000.0f32..4000.0,
            w in 1.0f32..3000.0,
            h in 1.0f32..3000.0,
        ) {
            prop_assert!(pointer_to_gravity(x, y, w, h).length() <= MAX_GRAVITY);
        }

        #[test]
        fn prop_pointer_center_is_exactly_zero(w in 1u32..4000, h in 1u32..4000) {
            let (w, h) = (w as f32, h as f32);
            prop_assert_eq!(pointer_to_gravity(w / 2.0, h / 2.0, w, h), Vec2::ZERO);
        }
    }
}
