//! Randomized ball parameters

use glam::Vec2;
use rand::Rng;

use crate::consts::*;

/// Ball palette (linear RGBA)
pub const PALETTE: [[f32; 4]; 8] = [
    [0.95, 0.33, 0.36, 1.0], // coral
    [0.98, 0.70, 0.22, 1.0], // amber
    [0.99, 0.90, 0.35, 1.0], // lemon
    [0.40, 0.85, 0.50, 1.0], // mint
    [0.25, 0.75, 0.95, 1.0], // sky
    [0.40, 0.45, 0.95, 1.0], // indigo
    [0.75, 0.45, 0.95, 1.0], // violet
    [0.98, 0.55, 0.80, 1.0], // pink
];

/// Material ranges
pub const DENSITY_RANGE: (f32, f32) = (0.6, 2.0);
pub const RESTITUTION_RANGE: (f32, f32) = (0.25, 0.75);
pub const FRICTION_RANGE: (f32, f32) = (0.05, 0.4);

/// Everything needed to spawn one ball (pixel units)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallSpec {
    pub pos: Vec2,
    pub radius: f32,
    pub density: f32,
    pub restitution: f32,
    pub friction: f32,
    pub color: [f32; 4],
}

/// Scale radii down on small screens so a full set of balls still fits
pub fn radius_scale(width: f32, height: f32) -> f32 {
    (width.min(height) / REFERENCE_SHORT_SIDE).clamp(0.4, 1.0)
}

impl BallSpec {
    /// Roll a random ball somewhere inside a `width` x `height` viewport
    pub fn random<R: Rng>(rng: &mut R, width: f32, height: f32) -> Self {
        let scale = radius_scale(width, height);
        let radius = rng.random_range(BALL_RADIUS_MIN..=BALL_RADIUS_MAX) * scale;

        // Keep the spawn point clear of the walls even in tiny viewports
        let max_x = (width - radius).max(radius + 1.0);
        let max_y = (height - radius).max(radius + 1.0);
        let pos = Vec2::new(
            rng.random_range(radius..max_x),
            rng.random_range(radius..max_y),
        );

        Self {
            pos,
            radius,
            density: rng.random_range(DENSITY_RANGE.0..=DENSITY_RANGE.1),
            restitution: rng.random_range(RESTITUTION_RANGE.0..=RESTITUTION_RANGE.1),
            friction: rng.random_range(FRICTION_RANGE.0..=FRICTION_RANGE.1),
            color: PALETTE[rng.random_range(0..PALETTE.len())],
        }
    }
}
