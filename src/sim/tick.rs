//! Frame advance
//!
//! Runs the reset machine and the fixed-timestep physics for one frame.

use super::state::{ToyEvent, ToyState};
use crate::consts::*;
use crate::reset::ResetEvent;

/// Step the world by one fixed timestep. Returns an impact event when a
/// collision was strong enough to be worth hearing.
pub fn tick(state: &mut ToyState, dt: f32) -> Option<ToyEvent> {
    let force = state.world.step(state.gravity.gravity(), dt);
    let strength = (force / IMPACT_FORCE_FULL).min(1.0);
    (strength >= IMPACT_MIN_STRENGTH).then_some(ToyEvent::Impact { strength })
}

/// Advance the toy by a frame of `frame_dt` seconds at wall-clock `now_ms`
pub fn advance(state: &mut ToyState, frame_dt: f32, now_ms: f64) -> Vec<ToyEvent> {
    let mut events = Vec::new();

    for event in state.reset.poll(now_ms) {
        match event {
            ResetEvent::Countdown(n) => events.push(ToyEvent::Countdown(n)),
            ResetEvent::Respawn => {
                let count = state.respawn();
                state.gravity.unfreeze();
                events.push(ToyEvent::Respawned { count });
            }
        }
    }

    // Clamp long frames (tab switches) so we don't simulate a backlog
    state.accumulator += frame_dt.clamp(0.0, 0.1);

    let mut substeps = 0;
    let mut strongest: Option<f32> = None;
    while state.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
        if let Some(ToyEvent::Impact { strength }) = tick(state, SIM_DT) {
            strongest = Some(strongest.map_or(strength, |s| s.max(strength)));
        }
        state.accumulator -= SIM_DT;
        substeps += 1;
    }
    if substeps == MAX_SUBSTEPS {
        state.accumulator = state.accumulator.min(SIM_DT);
    }

    // One impact per frame is plenty for feedback
    if let Some(strength) = strongest {
        events.push(ToyEvent::Impact { strength });
    }

    events
}
