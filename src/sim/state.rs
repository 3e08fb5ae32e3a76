//! Toy state: the physics world plus the inputs that steer it

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::ball::BallSpec;
use super::world::PhysicsWorld;
use crate::consts::*;
use crate::gravity::{GravityController, InputSource};
use crate::reset::{ResetEvent, ResetMachine, ResetTrigger};
use crate::settings::clamp_ball_count;

/// Something the frame loop should react to (sound, haptics, UI)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToyEvent {
    /// Countdown number to show
    Countdown(u8),
    /// Balls were respawned
    Respawned { count: u32 },
    /// A collision worth hearing, strength normalized to [0, 1]
    Impact { strength: f32 },
}

pub struct ToyState {
    pub world: PhysicsWorld,
    pub gravity: GravityController,
    pub reset: ResetMachine,
    rng: Pcg32,
    ball_count: u32,
    /// Unsimulated time carried into the next frame (seconds)
    pub(crate) accumulator: f32,
}

impl ToyState {
    /// Create a world of `ball_count` random balls in a `width` x `height` viewport
    pub fn new(seed: u64, width: f32, height: f32, ball_count: u32, source: InputSource) -> Self {
        let mut state = Self {
            world: PhysicsWorld::new(width, height),
            gravity: GravityController::new(source),
            reset: ResetMachine::new(),
            rng: Pcg32::seed_from_u64(seed),
            ball_count: clamp_ball_count(ball_count as i64),
            accumulator: 0.0,
        };
        state.respawn();
        state
    }

    pub fn ball_count(&self) -> u32 {
        self.ball_count
    }

    /// Replace every ball with a freshly rolled set
    pub fn respawn(&mut self) -> u32 {
        self.world.remove_balls();
        let (w, h) = self.world.size();
        for _ in 0..self.ball_count {
            let spec = BallSpec::random(&mut self.rng, w, h);
            self.world.spawn_ball(spec);
        }
        log::info!("Spawned {} balls", self.ball_count);
        self.ball_count
    }

    /// Change the ball count (clamped) and respawn right away
    pub fn set_ball_count(&mut self, count: u32) {
        let count = clamp_ball_count(count as i64);
        if count != self.ball_count {
            self.ball_count = count;
            self.respawn();
        }
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.world.resize(width, height);
        }
    }

    /// Start a reset countdown if allowed; freezes gravity on success
    pub fn request_reset(&mut self, now_ms: f64, cause: ResetTrigger) -> Option<ToyEvent> {
        match self.reset.trigger(now_ms, cause)? {
            ResetEvent::Countdown(n) => {
                self.gravity.freeze();
                Some(ToyEvent::Countdown(n))
            }
            ResetEvent::Respawn => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_spawns_requested_balls() {
        let state = ToyState::new(1, 800.0, 600.0, 7, InputSource::Mouse);
        assert_eq!(state.ball_count(), 7);
        assert_eq!(state.world.ball_count(), 7);
    }

    #[test]
    fn test_ball_count_is_clamped() {
        let state = ToyState::new(1, 800.0, 600.0, 500, InputSource::Mouse);
        assert_eq!(state.world.ball_count(), BALL_COUNT_MAX as usize);

        let mut state = ToyState::new(1, 800.0, 600.0, 0, InputSource::Mouse);
        assert_eq!(state.world.ball_count(), BALL_COUNT_MIN as usize);

        state.set_ball_count(64);
        assert_eq!(state.ball_count(), BALL_COUNT_MAX);
        assert_eq!(state.world.ball_count(), BALL_COUNT_MAX as usize);
    }

    #[test]
    fn test_respawn_replaces_balls() {
        let mut state = ToyState::new(3, 800.0, 600.0, 5, InputSource::Mouse);
        let before = state.world.balls();
        state.respawn();
        let after = state.world.balls();
        assert_eq!(after.len(), 5);
        assert_ne!(before, after);
    }

    #[test]
    fn test_request_reset_freezes_gravity() {
        let mut state = ToyState::new(1, 800.0, 600.0, 3, InputSource::Mouse);
        assert_eq!(
            state.request_reset(0.0, ResetTrigger::DoubleClick),
            Some(ToyEvent::Countdown(COUNTDOWN_STEPS))
        );
        assert!(state.gravity.is_frozen());
        assert_eq!(state.request_reset(10.0, ResetTrigger::Shake), None);
    }
}
