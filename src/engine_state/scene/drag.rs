//! Pointer gesture tracking for block dragging.

use cgmath::{InnerSpace, Vector2, Vector3};
use rapier3d::prelude::RigidBodyHandle;

use super::picking::DragPlane;

/// Pointer travel, in pixels, before a press counts as a drag.
pub const DRAG_THRESHOLD_PX: f32 = 1.0;

/// A pointer press that has not been released yet.
#[derive(Clone, Copy, Debug)]
pub struct PointerGesture {
    origin: Vector2<f32>,
    intentional: bool,
}

impl PointerGesture {
    /// Starts a gesture at the press position, in pixels.
    pub fn new(origin: Vector2<f32>) -> Self {
        Self {
            origin,
            intentional: false,
        }
    }

    /// Feeds a new pointer position.
    ///
    /// # Returns
    /// `true` exactly once, on the move that first reaches the drag threshold
    pub fn cross_threshold(&mut self, position: Vector2<f32>) -> bool {
        if self.intentional {
            return false;
        }

        if (position - self.origin).magnitude() >= DRAG_THRESHOLD_PX {
            self.intentional = true;
            return true;
        }
        false
    }

    /// Whether the pointer has travelled past the threshold since the press.
    pub fn is_intentional(&self) -> bool {
        self.intentional
    }
}

/// The block currently held by the pointer.
#[derive(Clone, Copy, Debug)]
pub struct DragSession {
    /// Index of the dragged instance
    pub instance: usize,
    /// Body switched to kinematic for the duration of the drag
    pub body: RigidBodyHandle,
    /// Plane the block slides on
    pub plane: DragPlane,
}

/// What a pointer event did to the scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DragOutcome {
    /// Nothing changed
    Ignored,
    /// A block was picked up and moved to `target`
    Started { instance: usize, target: Vector3<f32> },
    /// The held block moved to `target`
    Moved { instance: usize, target: Vector3<f32> },
    /// The held block was let go
    Released { instance: usize },
}
