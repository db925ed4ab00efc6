//! # Voxel Scene
//!
//! Owns every instance record of the current image together with the physics world that
//! backs them, and is the only place that writes render transforms, proxy transforms or
//! kinematic targets.
//!
//! Each frame runs in a fixed order: pointer events, entrance animation, physics steps,
//! then a single reconciliation pass that copies body transforms back into the records.
//! The renderer reads the records afterwards through [`VoxelScene::write_instances`].

pub mod drag;
pub mod entrance;
pub mod instance;
pub mod picking;
pub mod scratch;

use cgmath::Vector2;

use crate::engine_state::{
    physics::{BodyMode, PhysicsWorld},
    rendering::vertex::InstanceRaw,
    voxels::layout::VoxelInstanceSet,
};

use drag::{DragOutcome, DragSession, PointerGesture};
use instance::{InstanceRecord, InstanceState, InstanceTransform};
use picking::{DragPlane, Ray};

/// The blocks of one image, their bodies and the pointer state acting on them.
pub struct VoxelScene {
    block_size: f32,
    records: Vec<InstanceRecord>,
    physics: PhysicsWorld,
    gesture: Option<PointerGesture>,
    session: Option<DragSession>,
    entrance_complete: bool,
}

impl Default for VoxelScene {
    fn default() -> Self {
        Self::new(&VoxelInstanceSet::default())
    }
}

impl VoxelScene {
    /// Builds one record and one dynamic body per block of `layout`.
    pub fn new(layout: &VoxelInstanceSet) -> Self {
        let mut physics = PhysicsWorld::new();
        let records = layout
            .iter()
            .map(|descriptor| {
                let body = physics.add_block(descriptor.position_vec(), layout.block_size);
                InstanceRecord::new(*descriptor, body)
            })
            .collect::<Vec<_>>();

        log::debug!("Scene created with {} instances", records.len());

        Self {
            block_size: layout.block_size,
            entrance_complete: records.is_empty(),
            records,
            physics,
            gesture: None,
            session: None,
        }
    }

    /// Number of blocks in the scene.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// `true` for a scene built from a fully transparent image.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All instance records, indexed like the layout they were built from.
    pub fn records(&self) -> &[InstanceRecord] {
        &self.records
    }

    /// Read access to the bodies behind the records.
    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    /// Whether every block has finished rising into place.
    ///
    /// Until then render transforms come from the entrance animation and pointer
    /// presses pick nothing.
    pub fn is_entrance_complete(&self) -> bool {
        self.entrance_complete
    }

    /// Index of the block currently held by the pointer.
    pub fn active_drag(&self) -> Option<usize> {
        self.session.map(|session| session.instance)
    }

    /// Starts tracking a press at `screen`, in pixels.
    pub fn pointer_down(&mut self, screen: Vector2<f32>) {
        self.gesture = Some(PointerGesture::new(screen));
    }

    /// Feeds a pointer move at `screen` whose world ray is `ray`.
    ///
    /// The first move past the drag threshold picks the nearest block under the pointer.
    /// Until the entrance animation has finished, presses never pick anything.
    pub fn pointer_move(&mut self, screen: Vector2<f32>, ray: &Ray) -> DragOutcome {
        if self.session.is_some() {
            return self.drag_to(ray);
        }

        let crossed = self
            .gesture
            .as_mut()
            .is_some_and(|gesture| gesture.cross_threshold(screen));
        if !crossed || !self.entrance_complete {
            return DragOutcome::Ignored;
        }

        if !self.begin_drag(ray) {
            return DragOutcome::Ignored;
        }

        match self.drag_to(ray) {
            DragOutcome::Moved { instance, target } => DragOutcome::Started { instance, target },
            other => other,
        }
    }

    /// Ends the current press, handing a held block back to the simulation.
    pub fn pointer_up(&mut self) -> DragOutcome {
        self.gesture = None;
        let Some(session) = self.session.take() else {
            return DragOutcome::Ignored;
        };

        self.physics.set_mode(session.body, BodyMode::Dynamic);
        if let Some(record) = self.records.get_mut(session.instance) {
            record.state = InstanceState::Idle;
        }

        log::debug!("Released block {}", session.instance);
        DragOutcome::Released {
            instance: session.instance,
        }
    }

    fn begin_drag(&mut self, ray: &Ray) -> bool {
        let Some((index, _)) =
            picking::pick_nearest(ray, self.records.iter().map(|r| &r.proxy), self.block_size)
        else {
            return false;
        };

        let record = &mut self.records[index];
        if !self.physics.set_mode(record.body, BodyMode::Kinematic) {
            log::warn!("Block {} has no body, not dragging", index);
            return false;
        }

        record.state = InstanceState::Dragging;
        self.session = Some(DragSession {
            instance: index,
            body: record.body,
            plane: DragPlane::through(record.proxy.position),
        });

        log::debug!("Picked up block {}", index);
        true
    }

    fn drag_to(&mut self, ray: &Ray) -> DragOutcome {
        let Some(session) = self.session else {
            return DragOutcome::Ignored;
        };
        let Some(target) = session.plane.intersect(ray) else {
            return DragOutcome::Ignored;
        };
        let Some(record) = self.records.get_mut(session.instance) else {
            self.session = None;
            return DragOutcome::Ignored;
        };

        record.proxy.position = target;
        record.render = InstanceTransform {
            position: target,
            rotation: record.proxy.rotation,
            scale: 1.0,
        };
        self.physics.set_kinematic_target(session.body, target);

        DragOutcome::Moved {
            instance: session.instance,
            target,
        }
    }

    /// Advances the scene by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        if !self.entrance_complete {
            self.entrance_complete = entrance::advance_entrance(&mut self.records, dt);
            if self.entrance_complete {
                for record in self.records.iter_mut() {
                    record.state = InstanceState::Idle;
                }
                log::info!("Entrance finished for {} blocks", self.records.len());
            }
        }

        if self.physics.advance(dt) > 0 {
            self.reconcile();
        }
    }

    /// Copies body transforms into every record that is not held by the pointer.
    ///
    /// Proxies always follow their body. Render transforms follow only once the entrance
    /// has finished.
    pub fn reconcile(&mut self) {
        let held = self.active_drag();

        for (index, record) in self.records.iter_mut().enumerate() {
            if Some(index) == held {
                continue;
            }
            let Some(body) = self.physics.transform(record.body) else {
                continue;
            };

            let synced = InstanceTransform::from_body(body);
            record.proxy = synced;
            if self.entrance_complete {
                record.render = synced;
            }
        }
    }

    /// Packs every render transform and color into `out`, in index order.
    pub fn write_instances(&self, out: &mut Vec<InstanceRaw>) {
        out.extend(
            self.records
                .iter()
                .map(|record| InstanceRaw::new(record.render.to_matrix(), record.descriptor.color)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::physics::PHYSICS_TIMESTEP;
    use crate::engine_state::voxels::layout::build_layout;
    use crate::image_pipeline::PixelBuffer;
    use cgmath::{InnerSpace, Point3, Vector3};

    fn settled_scene(width: u32, height: u32) -> VoxelScene {
        let buffer = PixelBuffer::filled(width, height, [200, 40, 40, 255]).unwrap();
        let mut scene = VoxelScene::new(&build_layout(&buffer, 1.0));
        while !scene.is_entrance_complete() {
            scene.tick(PHYSICS_TIMESTEP);
        }
        scene
    }

    fn ray_down_at(x: f32, z: f32) -> Ray {
        Ray::new(Point3::new(x, 10.0, z), Vector3::new(0.0, -1.0, 0.0))
    }

    #[test]
    fn instances_start_hidden() {
        let buffer = PixelBuffer::filled(4, 4, [0, 0, 0, 255]).unwrap();
        let scene = VoxelScene::new(&build_layout(&buffer, 1.0));

        assert_eq!(scene.len(), 16);
        assert_eq!(scene.physics().body_count(), 16);
        assert!(scene.records().iter().all(|r| r.render.scale == 0.0));
        assert!(!scene.is_entrance_complete());
    }

    #[test]
    fn body_motion_reaches_render_only_after_entrance() {
        let buffer = PixelBuffer::filled(4, 4, [0, 0, 0, 255]).unwrap();
        let mut scene = VoxelScene::new(&build_layout(&buffer, 1.0));
        // Block (0, 0) waits about 0.35 s before rising at (-2, 0, -2).
        let index = 0;
        let body = scene.records[index].body;
        let displaced = Vector3::new(-2.0, 0.5, 3.0);

        assert!(scene.physics.set_mode(body, BodyMode::Kinematic));
        assert!(scene.physics.set_kinematic_target(body, displaced));
        scene.tick(PHYSICS_TIMESTEP);
        assert!(!scene.is_entrance_complete());

        let record = &scene.records()[index];
        let phase = entrance::EntrancePhase::at(
            record.entrance_elapsed,
            record.descriptor.distance_from_center,
        );
        assert_eq!(
            record.render,
            entrance::entrance_transform(record.descriptor.position_vec(), phase)
        );
        assert!((record.proxy.position - displaced).magnitude() < 1e-4);
        assert!((record.render.position - displaced).magnitude() > 1.0);

        while !scene.is_entrance_complete() {
            scene.tick(PHYSICS_TIMESTEP);
        }

        let record = &scene.records()[index];
        let body_position = scene.physics().transform(body).unwrap().position;
        assert!((record.render.position - body_position).magnitude() < 1e-5);
        assert!((record.render.position - displaced).magnitude() < 1e-4);
        assert_eq!(record.render.scale, 1.0);
    }

    #[test]
    fn one_long_tick_finishes_the_entrance() {
        let buffer = PixelBuffer::filled(4, 4, [0, 0, 0, 255]).unwrap();
        let mut scene = VoxelScene::new(&build_layout(&buffer, 1.0));

        scene.tick(5.0);
        assert!(scene.is_entrance_complete());
        assert!(scene
            .records()
            .iter()
            .all(|record| record.state == InstanceState::Idle && record.render.scale == 1.0));
    }

    #[test]
    fn empty_scene_is_complete_and_ticks() {
        let mut scene = VoxelScene::default();
        assert!(scene.is_entrance_complete());
        scene.tick(0.1);

        let mut out = Vec::new();
        scene.write_instances(&mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn drag_is_ignored_during_entrance() {
        let buffer = PixelBuffer::filled(2, 2, [0, 0, 0, 255]).unwrap();
        let mut scene = VoxelScene::new(&build_layout(&buffer, 1.0));

        scene.pointer_down(Vector2::new(0.0, 0.0));
        let outcome = scene.pointer_move(Vector2::new(20.0, 0.0), &ray_down_at(0.0, 0.0));
        assert_eq!(outcome, DragOutcome::Ignored);
        assert_eq!(scene.active_drag(), None);
    }

    #[test]
    fn sub_threshold_motion_does_not_pick() {
        let mut scene = settled_scene(2, 2);

        scene.pointer_down(Vector2::new(50.0, 50.0));
        let outcome = scene.pointer_move(Vector2::new(50.0, 50.0), &ray_down_at(0.0, 0.0));

        assert_eq!(outcome, DragOutcome::Ignored);
        let body = scene.records()[0].body;
        assert_eq!(scene.physics().mode(body), Some(BodyMode::Dynamic));
        assert_eq!(scene.pointer_up(), DragOutcome::Ignored);
    }

    #[test]
    fn drag_moves_block_on_its_plane_and_release_restores_dynamics() {
        let mut scene = settled_scene(2, 2);
        // Block (0, 0) sits at (-1, 0, -1).
        let index = 0;

        scene.pointer_down(Vector2::new(10.0, 10.0));
        let outcome = scene.pointer_move(Vector2::new(15.0, 10.0), &ray_down_at(-1.0, -1.0));
        assert!(matches!(outcome, DragOutcome::Started { instance, .. } if instance == index));

        let body = scene.records()[index].body;
        assert_eq!(scene.physics().mode(body), Some(BodyMode::Kinematic));
        assert_eq!(scene.records()[index].state, InstanceState::Dragging);

        let expected = Vector3::new(-4.0, 0.0, 2.0);
        let outcome = scene.pointer_move(Vector2::new(60.0, 10.0), &ray_down_at(-4.0, 2.0));
        let DragOutcome::Moved { instance, target } = outcome else {
            panic!("expected a move, got {outcome:?}");
        };
        assert_eq!(instance, index);
        assert!((target - expected).magnitude() < 1e-4);
        assert!((scene.records()[index].render.position - expected).magnitude() < 1e-4);

        scene.tick(PHYSICS_TIMESTEP);
        // The held block keeps the pointer position even after a step.
        assert!((scene.records()[index].proxy.position - expected).magnitude() < 1e-4);

        assert_eq!(scene.pointer_up(), DragOutcome::Released { instance: index });
        assert_eq!(scene.physics().mode(body), Some(BodyMode::Dynamic));

        scene.tick(PHYSICS_TIMESTEP);
        let record = &scene.records()[index];
        let body_transform = scene.physics().transform(body).unwrap();
        assert!((record.render.position - body_transform.position).magnitude() < 1e-5);
        assert_eq!(record.state, InstanceState::Idle);
    }

    #[test]
    fn missing_the_plane_keeps_last_position() {
        let mut scene = settled_scene(1, 1);
        scene.pointer_down(Vector2::new(0.0, 0.0));
        scene.pointer_move(Vector2::new(5.0, 0.0), &ray_down_at(-0.5, -0.5));
        let before = scene.records()[0].render.position;

        let upward = Ray::new(Point3::new(0.0, 10.0, 0.0), Vector3::new(0.0, 1.0, 0.0));
        assert_eq!(scene.pointer_move(Vector2::new(9.0, 0.0), &upward), DragOutcome::Ignored);
        assert_eq!(scene.records()[0].render.position, before);
    }
}
