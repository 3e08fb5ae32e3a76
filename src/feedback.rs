//! Sound and haptic feedback decisions
//!
//! Turns simulation events into "play this, buzz that" requests so the web
//! layer only has to execute them.

use crate::audio::SoundEffect;
use crate::consts::IMPACT_FEEDBACK_INTERVAL_MS;
use crate::platform::VibrationPattern;
use crate::settings::Settings;
use crate::sim::ToyEvent;

/// What to play for one event
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeedbackPlan {
    /// Effect and its volume (0-1)
    pub sound: Option<(SoundEffect, f32)>,
    pub vibration: Option<VibrationPattern>,
}

#[cfg(test)]
impl FeedbackPlan {
    fn is_empty(&self) -> bool {
        self.sound.is_none() && self.vibration.is_none()
    }
}

/// Rate-limits impact feedback so a pile of balls doesn't buzz continuously
#[derive(Debug, Clone)]
pub struct FeedbackGate {
    last_impact_ms: f64,
}

impl Default for FeedbackGate {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedbackGate {
    pub fn new() -> Self {
        Self {
            last_impact_ms: f64::NEG_INFINITY,
        }
    }

    pub fn plan(&mut self, event: &ToyEvent, settings: &Settings, now_ms: f64) -> FeedbackPlan {
        let (sound, vibration) = match *event {
            ToyEvent::Countdown(_) => (
                Some((SoundEffect::CountdownTick, 1.0)),
                Some(VibrationPattern::countdown_tick()),
            ),
            ToyEvent::Respawned { .. } => (
                Some((SoundEffect::Respawn, 1.0)),
                Some(VibrationPattern::respawn()),
            ),
            ToyEvent::Impact { strength } => {
                if now_ms - self.last_impact_ms < IMPACT_FEEDBACK_INTERVAL_MS {
                    return FeedbackPlan::default();
                }
                self.last_impact_ms = now_ms;
                (
                    Some((SoundEffect::Clack, strength.clamp(0.0, 1.0))),
                    Some(VibrationPattern::impact(strength)),
                )
            }
        };

        FeedbackPlan {
            sound: sound.filter(|_| settings.sound_enabled),
            vibration: vibration.filter(|_| settings.vibration_enabled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_countdown_plays_tick() {
        let mut gate = FeedbackGate::new();
        let plan = gate.plan(&ToyEvent::Countdown(2), &Settings::default(), 0.0);
        assert_eq!(plan.sound, Some((SoundEffect::CountdownTick, 1.0)));
        assert_eq!(plan.vibration, Some(VibrationPattern::countdown_tick()));
    }

    #[test]
    fn test_disabled_channels_are_silent() {
        let mut gate = FeedbackGate::new();
        let settings = Settings {
            sound_enabled: false,
            vibration_enabled: false,
            ..Settings::default()
        };
        let plan = gate.plan(&ToyEvent::Respawned { count: 3 }, &settings, 0.0);
        assert!(plan.is_empty());

        let settings = Settings {
            sound_enabled: false,
            ..Settings::default()
        };
        let plan = gate.plan(&ToyEvent::Respawned { count: 3 }, &settings, 0.0);
        assert!(plan.sound.is_none());
        assert_eq!(plan.vibration, Some(VibrationPattern::respawn()));
    }

    #[test]
    fn test_impacts_are_rate_limited() {
        let mut gate = FeedbackGate::new();
        let settings = Settings::default();
        let hit = ToyEvent::Impact { strength: 0.5 };

        assert!(!gate.plan(&hit, &settings, 1000.0).is_empty());
        assert!(gate.plan(&hit, &settings, 1000.0 + IMPACT_FEEDBACK_INTERVAL_MS / 2.0).is_empty());
        let plan = gate.plan(&hit, &settings, 1000.0 + IMPACT_FEEDBACK_INTERVAL_MS);
        assert_eq!(plan.sound, Some((SoundEffect::Clack, 0.5)));
    }

    #[test]
    fn test_countdown_ignores_impact_rate_limit() {
        let mut gate = FeedbackGate::new();
        let settings = Settings::default();
        gate.plan(&ToyEvent::Impact { strength: 1.0 }, &settings, 0.0);
        assert!(!gate.plan(&ToyEvent::Countdown(1), &settings, 1.0).is_empty());
    }
}
