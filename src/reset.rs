//! Reset gestures and the respawn countdown
//!
//! A shake, double tap, or double click starts a three-step countdown during
//! which gravity is frozen; when it finishes every ball is respawned.
//! Time is passed in explicitly (milliseconds) so the machine is driven from
//! the frame loop instead of browser timers.

use glam::Vec2;

use crate::consts::*;

/// What started a reset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetTrigger {
    Shake,
    DoubleTap,
    DoubleClick,
}

/// Progress reported by the reset machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetEvent {
    /// Countdown number to display (3, 2, 1)
    Countdown(u8),
    /// Countdown finished, balls must be respawned
    Respawn,
}

/// Reset machine state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResetPhase {
    Idle { cooldown_until: f64 },
    CountingDown { started_at: f64, ticks_emitted: u8 },
}

/// Countdown state machine with a cooldown guard
#[derive(Debug, Clone)]
pub struct ResetMachine {
    phase: ResetPhase,
}

impl Default for ResetMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ResetMachine {
    pub fn new() -> Self {
        Self {
            phase: ResetPhase::Idle {
                cooldown_until: f64::NEG_INFINITY,
            },
        }
    }

    pub fn phase(&self) -> ResetPhase {
        self.phase
    }

    pub fn is_counting_down(&self) -> bool {
        matches!(self.phase, ResetPhase::CountingDown { .. })
    }

    /// Try to start a countdown. Returns the first tick when accepted.
    pub fn trigger(&mut self, now: f64, cause: ResetTrigger) -> Option<ResetEvent> {
        match self.phase {
            ResetPhase::CountingDown { .. } => None,
            ResetPhase::Idle { cooldown_until } if now < cooldown_until => {
                log::debug!("Reset ({:?}) ignored during cooldown", cause);
                None
            }
            ResetPhase::Idle { .. } => {
                log::info!("Reset triggered by {:?}", cause);
                self.phase = ResetPhase::CountingDown {
                    started_at: now,
                    ticks_emitted: 1,
                };
                Some(ResetEvent::Countdown(COUNTDOWN_STEPS))
            }
        }
    }

    /// Advance to `now`, returning every event that came due (in order)
    pub fn poll(&mut self, now: f64) -> Vec<ResetEvent> {
        let mut events = Vec::new();
        let ResetPhase::CountingDown {
            started_at,
            mut ticks_emitted,
        } = self.phase
        else {
            return events;
        };

        let elapsed_steps = ((now - started_at) / COUNTDOWN_INTERVAL_MS).floor().max(0.0) as u32;

        while (ticks_emitted as u32) < COUNTDOWN_STEPS as u32
            && (ticks_emitted as u32) <= elapsed_steps
        {
            events.push(ResetEvent::Countdown(COUNTDOWN_STEPS - ticks_emitted));
            ticks_emitted += 1;
        }

        if elapsed_steps >= COUNTDOWN_STEPS as u32 {
            events.push(ResetEvent::Respawn);
            self.phase = ResetPhase::Idle {
                cooldown_until: now + RESET_COOLDOWN_MS,
            };
        } else {
            self.phase = ResetPhase::CountingDown {
                started_at,
                ticks_emitted,
            };
        }

        events
    }
}

/// Detects shakes from accelerometer samples (acceleration including gravity)
#[derive(Debug, Clone, Default)]
pub struct ShakeDetector {
    last: Option<[f32; 3]>,
}

impl ShakeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one devicemotion sample; returns true when it looks like a shake
    pub fn sample(&mut self, x: Option<f64>, y: Option<f64>, z: Option<f64>) -> bool {
        let (Some(x), Some(y), Some(z)) = (x, y, z) else {
            return false;
        };
        let current = [x as f32, y as f32, z as f32];
        let Some(prev) = self.last.replace(current) else {
            return false;
        };

        let delta = (current[0] - prev[0]).abs()
            + (current[1] - prev[1]).abs()
            + (current[2] - prev[2]).abs();
        delta > SHAKE_THRESHOLD
    }
}

/// Detects double taps from touchstart positions and timestamps
#[derive(Debug, Clone, Default)]
pub struct TapDetector {
    last: Option<(f64, Vec2)>,
}

impl TapDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a tap; returns true when it completes a double tap
    pub fn tap(&mut self, now: f64, pos: Vec2) -> bool {
        if let Some((t, p)) = self.last {
            if now - t <= DOUBLE_TAP_MS && p.distance(pos) <= DOUBLE_TAP_RADIUS {
                self.last = None;
                return true;
            }
        }
        self.last = Some((now, pos));
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_countdown_sequence() {
        let mut m = ResetMachine::new();
        assert_eq!(m.trigger(0.0, ResetTrigger::Shake), Some(ResetEvent::Countdown(3)));
        assert!(m.poll(500.0).is_empty());
        assert_eq!(m.poll(1000.0), vec![ResetEvent::Countdown(2)]);
        assert_eq!(m.poll(2100.0), vec![ResetEvent::Countdown(1)]);
        assert!(m.poll(2900.0).is_empty());
        assert_eq!(m.poll(3000.0), vec![ResetEvent::Respawn]);
        assert!(!m.is_counting_down());
    }

    #[test]
    fn test_late_poll_emits_everything_in_order() {
        let mut m = ResetMachine::new();
        m.trigger(0.0, ResetTrigger::DoubleTap);
        assert_eq!(
            m.poll(5000.0),
            vec![
                ResetEvent::Countdown(2),
                ResetEvent::Countdown(1),
                ResetEvent::Respawn
            ]
        );
    }

    #[test]
    fn test_retrigger_ignored_while_counting_down() {
        let mut m = ResetMachine::new();
        m.trigger(0.0, ResetTrigger::Shake);
        assert_eq!(m.trigger(100.0, ResetTrigger::Shake), None);
        assert_eq!(m.trigger(1500.0, ResetTrigger::DoubleClick), None);

        // The countdown keeps its original schedule
        assert_eq!(m.poll(1000.0), vec![ResetEvent::Countdown(2)]);
        assert!(m.poll(1999.0).is_empty());
    }

    #[test]
    fn test_cooldown_after_respawn() {
        let mut m = ResetMachine::new();
        m.trigger(0.0, ResetTrigger::Shake);
        m.poll(3000.0);

        assert_eq!(m.trigger(3000.0 + RESET_COOLDOWN_MS - 1.0, ResetTrigger::Shake), None);
        assert_eq!(
            m.trigger(3000.0 + RESET_COOLDOWN_MS, ResetTrigger::Shake),
            Some(ResetEvent::Countdown(3))
        );
    }

    #[test]
    fn test_poll_when_idle_is_quiet() {
        let mut m = ResetMachine::new();
        assert!(m.poll(10_000.0).is_empty());
        assert!(matches!(m.phase(), ResetPhase::Idle { .. }));
    }

    #[test]
    fn test_shake_needs_two_samples() {
        let mut s = ShakeDetector::new();
        assert!(!s.sample(Some(30.0), Some(0.0), Some(0.0)));
        assert!(s.sample(Some(-10.0), Some(0.0), Some(0.0)));
    }

    #[test]
    fn test_gentle_motion_is_not_a_shake() {
        let mut s = ShakeDetector::new();
        s.sample(Some(0.0), Some(9.8), Some(0.0));
        assert!(!s.sample(Some(1.0), Some(9.0), Some(0.5)));
    }

    #[test]
    fn test_missing_motion_components_ignored() {
        let mut s = ShakeDetector::new();
        s.sample(Some(0.0), Some(0.0), Some(0.0));
        assert!(!s.sample(None, Some(50.0), Some(0.0)));
        // The incomplete sample did not replace the reference
        assert!(s.sample(Some(0.0), Some(50.0), Some(0.0)));
    }

    #[test]
    fn test_double_tap_detection() {
        let mut t = TapDetector::new();
        assert!(!t.tap(0.0, Vec2::new(100.0, 100.0)));
        assert!(t.tap(200.0, Vec2::new(110.0, 105.0)));
        // A third tap starts a new pair
        assert!(!t.tap(250.0, Vec2::new(110.0, 105.0)));
    }

    #[test]
    fn test_slow_or_far_taps_are_single() {
        let mut t = TapDetector::new();
        t.tap(0.0, Vec2::ZERO);
        assert!(!t.tap(DOUBLE_TAP_MS + 1.0, Vec2::ZERO));
        assert!(!t.tap(DOUBLE_TAP_MS + 50.0, Vec2::new(500.0, 0.0)));
    }
}
