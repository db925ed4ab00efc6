//! Per-instance records and transforms.

use cgmath::{Matrix4, One, Quaternion, Vector3};
use rapier3d::prelude::RigidBodyHandle;

use crate::engine_state::{physics::BodyTransform, voxels::descriptor::BlockDescriptor};

/// Position, rotation and uniform scale of one view of an instance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InstanceTransform {
    /// World translation
    pub position: Vector3<f32>,
    /// World rotation
    pub rotation: Quaternion<f32>,
    /// Uniform scale, zero while hidden
    pub scale: f32,
}

impl InstanceTransform {
    /// An unrotated, full-size transform at `position`.
    pub fn at(position: Vector3<f32>) -> Self {
        Self {
            position,
            rotation: Quaternion::one(),
            scale: 1.0,
        }
    }

    /// A collapsed transform at `position`. It still occupies its slot but draws nothing.
    pub fn hidden(position: Vector3<f32>) -> Self {
        Self {
            scale: 0.0,
            ..Self::at(position)
        }
    }

    /// The full-size transform a physics body currently reports.
    pub fn from_body(body: BodyTransform) -> Self {
        Self {
            position: body.position,
            rotation: body.rotation,
            scale: 1.0,
        }
    }

    /// Model matrix: translate, then rotate, then scale.
    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation)
            * Matrix4::from_scale(self.scale)
    }
}

/// Lifecycle of one instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstanceState {
    /// Playing the reveal animation; physics does not drive the render transform yet
    Entering,
    /// Dynamic body, render and proxy follow the simulation
    Idle,
    /// Kinematic body, render and proxy follow the pointer
    Dragging,
}

/// The single authoritative record for one block.
///
/// The render slot, the picking proxy and the physics body are all derived from this
/// record and are only written through the scene.
#[derive(Clone, Debug)]
pub struct InstanceRecord {
    /// Immutable layout data
    pub descriptor: BlockDescriptor,
    /// Handle of the backing rigid body
    pub body: RigidBodyHandle,
    /// Transform of the invisible pickable box
    pub proxy: InstanceTransform,
    /// Transform written into the instance buffer
    pub render: InstanceTransform,
    /// Seconds spent in the entrance animation, including the stagger delay
    pub entrance_elapsed: f32,
    /// Current lifecycle state
    pub state: InstanceState,
}

impl InstanceRecord {
    /// Creates a record that starts hidden at its target position.
    pub fn new(descriptor: BlockDescriptor, body: RigidBodyHandle) -> Self {
        let target = descriptor.position_vec();
        Self {
            descriptor,
            body,
            proxy: InstanceTransform::at(target),
            render: InstanceTransform::hidden(target),
            entrance_elapsed: 0.0,
            state: InstanceState::Entering,
        }
    }
}
