//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Haptics (navigator.vibrate)
//! - Motion sensor permission (iOS prompt)
//! - Screen orientation and touch capability

/// Vibration pattern: alternating on/off durations in milliseconds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VibrationPattern(pub Vec<u32>);

impl VibrationPattern {
    /// Short pulse scaled by impact strength (0-1)
    pub fn impact(strength: f32) -> Self {
        let ms = 8.0 + 22.0 * strength.clamp(0.0, 1.0);
        Self(vec![ms.round() as u32])
    }

    pub fn countdown_tick() -> Self {
        Self(vec![40])
    }

    pub fn respawn() -> Self {
        Self(vec![60, 40, 60])
    }
}

#[cfg(target_arch = "wasm32")]
mod web {
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::JsFuture;

    use super::VibrationPattern;

    // iOS 13+ gates motion events behind an explicit permission prompt
    #[wasm_bindgen(inline_js = "
        export function motion_permission_required() {
            return typeof DeviceOrientationEvent !== 'undefined'
                && typeof DeviceOrientationEvent.requestPermission === 'function';
        }

        export function request_motion_permission_js() {
            if (typeof DeviceOrientationEvent === 'undefined'
                || typeof DeviceOrientationEvent.requestPermission !== 'function') {
                return Promise.resolve(true);
            }
            return DeviceOrientationEvent.requestPermission()
                .then((state) => state === 'granted')
                .catch(() => false);
        }
    ")]
    extern "C" {
        pub fn motion_permission_required() -> bool;
        fn request_motion_permission_js() -> js_sys::Promise;
    }

    /// Ask for motion sensor access. iOS only shows the prompt inside a user
    /// gesture, so the request is issued here, synchronously; only the answer
    /// is awaited.
    pub fn request_motion_permission() -> impl Future<Output = bool> {
        let answer = JsFuture::from(request_motion_permission_js());
        async move {
            match answer.await {
                Ok(value) => value.as_bool().unwrap_or(false),
                Err(e) => {
                    log::warn!("Motion permission request failed: {:?}", e);
                    false
                }
            }
        }
    }

    /// Fire a vibration pattern; silently ignored where unsupported
    pub fn vibrate(pattern: &VibrationPattern) {
        let Some(window) = web_sys::window() else { return };
        let navigator = window.navigator();
        // Safari has no navigator.vibrate at all
        if !js_sys::Reflect::has(&navigator, &JsValue::from_str("vibrate")).unwrap_or(false) {
            return;
        }
        let array = js_sys::Array::new();
        for ms in &pattern.0 {
            array.push(&JsValue::from(*ms));
        }
        let _ = navigator.vibrate_with_pattern(&array);
    }

    /// Current screen rotation in degrees (0, 90, 180, 270)
    pub fn screen_angle() -> f32 {
        web_sys::window()
            .and_then(|w| w.screen().ok())
            .map(|s| s.orientation().angle().unwrap_or(0))
            .unwrap_or(0) as f32
    }

    /// Whether the device reports a touch screen
    pub fn is_touch_device() -> bool {
        web_sys::window()
            .map(|w| w.navigator().max_touch_points() > 0)
            .unwrap_or(false)
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::*;

/// Native stubs
#[cfg(not(target_arch = "wasm32"))]
pub fn vibrate(_pattern: &VibrationPattern) {
    // No-op for native
}

#[cfg(not(target_arch = "wasm32"))]
pub fn screen_angle() -> f32 {
    0.0
}

#[cfg(not(target_arch = "wasm32"))]
pub fn is_touch_device() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impact_pulse_scales_with_strength() {
        assert_eq!(VibrationPattern::impact(0.0), VibrationPattern(vec![8]));
        assert_eq!(VibrationPattern::impact(1.0), VibrationPattern(vec![30]));
        assert_eq!(VibrationPattern::impact(5.0), VibrationPattern(vec![30]));
    }

    #[test]
    fn test_respawn_pattern_is_buzz_pause_buzz() {
        assert_eq!(VibrationPattern::respawn(), VibrationPattern(vec![60, 40, 60]));
    }
}
