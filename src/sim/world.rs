//! rapier2d world wrapper
//!
//! The physics itself belongs to rapier; this owns the pipeline objects, the
//! walls around the viewport and the set of tagged ball bodies. Public API is
//! in screen pixels (y down), rapier runs in meters.

use std::collections::HashMap;

use crossbeam::channel::{Receiver, unbounded};
use glam::Vec2;
use rapier2d::prelude::*;

use super::ball::BallSpec;
use crate::consts::*;
use crate::{m_to_px, px_to_m};

/// `user_data` tag marking a rigid body as a ball
pub const BALL_TAG: u128 = 0xBA11;

/// Contact force below which rapier does not report an event (N)
const CONTACT_FORCE_THRESHOLD: f32 = 20.0;

/// A ball as seen by the renderer (pixels)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallSnapshot {
    pub pos: Vec2,
    pub radius: f32,
    pub color: [f32; 4],
}

pub struct PhysicsWorld {
    pipeline: PhysicsPipeline,
    integration_parameters: IntegrationParameters,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,

    events: ChannelEventCollector,
    collision_recv: Receiver<CollisionEvent>,
    contact_force_recv: Receiver<ContactForceEvent>,

    walls: Vec<ColliderHandle>,
    balls: HashMap<RigidBodyHandle, BallSpec>,
    size: (f32, f32),
}

impl PhysicsWorld {
    /// Create an empty world enclosed by walls around a `width` x `height` viewport
    pub fn new(width: f32, height: f32) -> Self {
        let (collision_send, collision_recv) = unbounded();
        let (contact_force_send, contact_force_recv) = unbounded();

        let mut world = Self {
            pipeline: PhysicsPipeline::new(),
            integration_parameters: IntegrationParameters::default(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            events: ChannelEventCollector::new(collision_send, contact_force_send),
            collision_recv,
            contact_force_recv,
            walls: Vec::new(),
            balls: HashMap::new(),
            size: (width, height),
        };
        world.build_walls();
        world
    }

    pub fn size(&self) -> (f32, f32) {
        self.size
    }

    /// Rebuild the walls for a new viewport, pulling escaped balls back inside
    pub fn resize(&mut self, width: f32, height: f32) {
        self.size = (width, height);
        for handle in self.walls.drain(..) {
            self.colliders
                .remove(handle, &mut self.islands, &mut self.bodies, true);
        }
        self.build_walls();

        for (handle, spec) in &self.balls {
            if let Some(body) = self.bodies.get_mut(*handle) {
                let p = body.translation();
                let r = px_to_m(spec.radius);
                let max_x = px_to_m(width).max(2.0 * r) - r;
                let max_y = px_to_m(height).max(2.0 * r) - r;
                let clamped = vector![p.x.clamp(r, max_x), p.y.clamp(r, max_y)];
                if clamped != *p {
                    body.set_translation(clamped, true);
                }
            }
        }
    }

    fn build_walls(&mut self) {
        let (w, h) = (px_to_m(self.size.0), px_to_m(self.size.1));
        let t = px_to_m(WALL_THICKNESS);
        let half_t = t / 2.0;

        // (half extents, center) for bottom, top, left, right
        let walls = [
            (vector![w / 2.0 + t, half_t], vector![w / 2.0, h + half_t]),
            (vector![w / 2.0 + t, half_t], vector![w / 2.0, -half_t]),
            (vector![half_t, h / 2.0 + t], vector![-half_t, h / 2.0]),
            (vector![half_t, h / 2.0 + t], vector![w + half_t, h / 2.0]),
        ];

        for (half_extents, center) in walls {
            let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y)
                .translation(center)
                .friction(0.3)
                .restitution(0.4)
                .build();
            self.walls.push(self.colliders.insert(collider));
        }
    }

    /// Add one ball, tagged with `BALL_TAG`
    pub fn spawn_ball(&mut self, spec: BallSpec) -> RigidBodyHandle {
        let body = RigidBodyBuilder::dynamic()
            .translation(vector![px_to_m(spec.pos.x), px_to_m(spec.pos.y)])
            .user_data(BALL_TAG)
            .can_sleep(false)
            .ccd_enabled(true)
            .build();
        let handle = self.bodies.insert(body);

        let collider = ColliderBuilder::ball(px_to_m(spec.radius))
            .density(spec.density)
            .restitution(spec.restitution)
            .friction(spec.friction)
            .active_events(ActiveEvents::CONTACT_FORCE_EVENTS)
            .contact_force_event_threshold(CONTACT_FORCE_THRESHOLD)
            .build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);

        self.balls.insert(handle, spec);
        handle
    }

    /// Remove every tagged ball body in one sweep; returns how many were removed
    pub fn remove_balls(&mut self) -> usize {
        let tagged: Vec<RigidBodyHandle> = self
            .bodies
            .iter()
            .filter(|(_, body)| body.user_data == BALL_TAG)
            .map(|(handle, _)| handle)
            .collect();

        for handle in &tagged {
            self.bodies.remove(
                *handle,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            );
            self.balls.remove(handle);
        }

        // Drop events that reference removed colliders
        while self.collision_recv.try_recv().is_ok() {}
        while self.contact_force_recv.try_recv().is_ok() {}

        tagged.len()
    }

    pub fn ball_count(&self) -> usize {
        self.bodies
            .iter()
            .filter(|(_, body)| body.user_data == BALL_TAG)
            .count()
    }

    /// Current ball positions for rendering (pixels)
    pub fn balls(&self) -> Vec<BallSnapshot> {
        let mut out: Vec<_> = self
            .balls
            .iter()
            .filter_map(|(handle, spec)| {
                let body = self.bodies.get(*handle)?;
                let p = body.translation();
                Some(BallSnapshot {
                    pos: Vec2::new(m_to_px(p.x), m_to_px(p.y)),
                    radius: spec.radius,
                    color: spec.color,
                })
            })
            .collect();
        // HashMap order is unstable; keep draw order stable frame to frame
        out.sort_by(|a, b| b.radius.total_cmp(&a.radius));
        out
    }

    /// Advance one step under `gravity` (normalized, y down).
    /// Returns the strongest contact force reported during the step.
    pub fn step(&mut self, gravity: Vec2, dt: f32) -> f32 {
        let g = vector![gravity.x, gravity.y] * GRAVITY_ACCEL;
        self.integration_parameters.dt = dt;

        self.pipeline.step(
            &g,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &self.events,
        );

        while self.collision_recv.try_recv().is_ok() {}
        let mut strongest = 0.0_f32;
        while let Ok(event) = self.contact_force_recv.try_recv() {
            strongest = strongest.max(event.total_force_magnitude);
        }
        strongest
    }
}
