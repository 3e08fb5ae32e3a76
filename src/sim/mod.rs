//! Simulation module
//!
//! Rigid-body physics is delegated to rapier2d. This module only decides
//! what goes into the world (randomized balls, walls) and which gravity the
//! world steps under.

pub mod ball;
pub mod state;
pub mod tick;
pub mod world;

pub use ball::{BallSpec, PALETTE};
pub use state::{ToyEvent, ToyState};
pub use tick::{advance, tick};
pub use world::{BALL_TAG, BallSnapshot, PhysicsWorld};
