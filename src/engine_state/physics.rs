//! # Physics World
//!
//! A thin wrapper over rapier that owns every set the pipeline needs. It exposes only the
//! operations the scene uses: adding one cube body per block, switching a body between
//! dynamic and kinematic mode, driving a kinematic target, stepping, and reading back
//! body transforms.
//!
//! Gravity is zero. Blocks drift only when pushed, and damping brings them to rest.
//! The rest of the engine works in `cgmath` types. Conversion to and from nalgebra
//! happens at this boundary only.

use cgmath::{Quaternion, Vector3};
use rapier3d::prelude::*;

/// Linear velocity damping applied to every block body.
pub const LINEAR_DAMPING: f32 = 1.5;
/// Angular velocity damping applied to every block body.
pub const ANGULAR_DAMPING: f32 = 1.5;
/// Fixed simulation step in seconds.
pub const PHYSICS_TIMESTEP: f32 = 1.0 / 60.0;
/// Upper bound on catch-up steps per frame, so a stalled tab does not spiral.
const MAX_STEPS_PER_FRAME: u32 = 4;

/// How a body is currently driven.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyMode {
    /// Driven by the simulation
    Dynamic,
    /// Driven by pointer input through kinematic targets
    Kinematic,
}

/// A body transform read back after a step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyTransform {
    /// World translation
    pub position: Vector3<f32>,
    /// World rotation
    pub rotation: Quaternion<f32>,
}

/// Owns the rapier pipeline and all body and collider sets.
pub struct PhysicsWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    /// Unsimulated time carried over from the previous frame
    accumulator: f32,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    /// Creates an empty, gravity-free world with a fixed timestep.
    pub fn new() -> Self {
        let integration_parameters = IntegrationParameters {
            dt: PHYSICS_TIMESTEP,
            ..Default::default()
        };

        Self {
            gravity: vector![0.0, 0.0, 0.0],
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            accumulator: 0.0,
        }
    }

    /// Adds a damped dynamic cube body with edge length `size` at `position`.
    ///
    /// # Returns
    /// The handle of the new body
    pub fn add_block(&mut self, position: Vector3<f32>, size: f32) -> RigidBodyHandle {
        let body = RigidBodyBuilder::dynamic()
            .translation(vector![position.x, position.y, position.z])
            .linear_damping(LINEAR_DAMPING)
            .angular_damping(ANGULAR_DAMPING)
            .build();
        let handle = self.bodies.insert(body);

        let half_extent = size / 2.0;
        let collider = ColliderBuilder::cuboid(half_extent, half_extent, half_extent).build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);

        handle
    }

    /// Number of bodies in the world.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Switches a body between dynamic and kinematic mode, waking it up.
    ///
    /// # Returns
    /// `false` if the handle no longer refers to a body
    pub fn set_mode(&mut self, handle: RigidBodyHandle, mode: BodyMode) -> bool {
        let Some(body) = self.bodies.get_mut(handle) else {
            return false;
        };

        let body_type = match mode {
            BodyMode::Dynamic => RigidBodyType::Dynamic,
            BodyMode::Kinematic => RigidBodyType::KinematicPositionBased,
        };
        body.set_body_type(body_type, true);
        true
    }

    /// Current mode of a body, if it exists.
    pub fn mode(&self, handle: RigidBodyHandle) -> Option<BodyMode> {
        self.bodies.get(handle).map(|body| {
            if body.is_kinematic() {
                BodyMode::Kinematic
            } else {
                BodyMode::Dynamic
            }
        })
    }

    /// Queues a kinematic translation for the next step.
    ///
    /// # Returns
    /// `false` if the handle is stale or the body is not kinematic
    pub fn set_kinematic_target(&mut self, handle: RigidBodyHandle, target: Vector3<f32>) -> bool {
        let Some(body) = self.bodies.get_mut(handle) else {
            return false;
        };
        if !body.is_kinematic() {
            return false;
        }

        body.wake_up(true);
        body.set_next_kinematic_translation(vector![target.x, target.y, target.z]);
        true
    }

    /// Reads the committed transform of a body.
    pub fn transform(&self, handle: RigidBodyHandle) -> Option<BodyTransform> {
        self.bodies.get(handle).map(|body| {
            let isometry = body.position();
            let translation = isometry.translation.vector;
            let rotation = isometry.rotation;
            BodyTransform {
                position: Vector3::new(translation.x, translation.y, translation.z),
                rotation: Quaternion::new(rotation.w, rotation.i, rotation.j, rotation.k),
            }
        })
    }

    /// Runs exactly one fixed step.
    pub fn step_once(&mut self) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
    }

    /// Advances the simulation by `dt` seconds in fixed steps.
    ///
    /// # Returns
    /// The number of steps taken, which may be zero for very short frames
    pub fn advance(&mut self, dt: f32) -> u32 {
        self.accumulator += dt.max(0.0);

        let mut steps = 0;
        while self.accumulator >= PHYSICS_TIMESTEP && steps < MAX_STEPS_PER_FRAME {
            self.step_once();
            self.accumulator -= PHYSICS_TIMESTEP;
            steps += 1;
        }

        if steps == MAX_STEPS_PER_FRAME {
            // Drop the backlog instead of trying to catch up forever.
            self.accumulator = 0.0;
        }
        steps
    }
}
