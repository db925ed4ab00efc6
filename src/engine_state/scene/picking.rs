//! # Picking
//!
//! Rays, the horizontal drag plane and ray versus oriented box tests against instance
//! proxies.

use cgmath::{EuclideanSpace, InnerSpace, Point3, Rotation, Vector2, Vector3};

use super::instance::InstanceTransform;

const PARALLEL_EPSILON: f32 = 1e-6;

/// A half-line in world space. The direction is always normalized.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Point3<f32>,
    pub direction: Vector3<f32>,
}

impl Ray {
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    pub fn point_at(&self, distance: f32) -> Point3<f32> {
        self.origin + self.direction * distance
    }
}

/// Converts a pixel position to normalized device coordinates.
///
/// `x` grows to the right and `y` grows upward, both in `-1.0..=1.0`.
pub fn screen_to_ndc(screen: Vector2<f32>, viewport: Vector2<f32>) -> Vector2<f32> {
    Vector2::new(
        (screen.x / viewport.x) * 2.0 - 1.0,
        -(screen.y / viewport.y) * 2.0 + 1.0,
    )
}

/// The horizontal plane a dragged block slides on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragPlane {
    /// World height of the plane
    pub height: f32,
}

impl DragPlane {
    /// A plane with up normal through `point`.
    pub fn through(point: Vector3<f32>) -> Self {
        Self { height: point.y }
    }

    /// Where the ray crosses the plane, if it does so in front of its origin.
    pub fn intersect(&self, ray: &Ray) -> Option<Vector3<f32>> {
        if ray.direction.y.abs() < PARALLEL_EPSILON {
            return None;
        }

        let distance = (self.height - ray.origin.y) / ray.direction.y;
        if distance < 0.0 {
            return None;
        }

        let hit = ray.point_at(distance);
        Some(Vector3::new(hit.x, self.height, hit.z))
    }
}

/// Distance along `ray` to the cube described by `transform`, if the ray hits it.
///
/// The cube has edge length `size * transform.scale`. A ray starting inside the cube hits
/// at distance zero.
pub fn intersect_box(ray: &Ray, transform: &InstanceTransform, size: f32) -> Option<f32> {
    let half_extent = size * transform.scale / 2.0;
    if half_extent <= 0.0 {
        return None;
    }

    // Work in the box's local frame, where it is axis aligned.
    let inverse = transform.rotation.invert();
    let origin = inverse.rotate_vector(ray.origin.to_vec() - transform.position);
    let direction = inverse.rotate_vector(ray.direction);

    let mut near = f32::NEG_INFINITY;
    let mut far = f32::INFINITY;

    for axis in 0..3 {
        let (o, d) = (origin[axis], direction[axis]);

        if d.abs() < PARALLEL_EPSILON {
            if o < -half_extent || o > half_extent {
                return None;
            }
            continue;
        }

        let inv = 1.0 / d;
        let (mut t0, mut t1) = ((-half_extent - o) * inv, (half_extent - o) * inv);
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }

        near = near.max(t0);
        far = far.min(t1);
        if near > far {
            return None;
        }
    }

    if far < 0.0 {
        return None;
    }
    Some(near.max(0.0))
}

/// Index and distance of the closest box the ray hits.
pub fn pick_nearest<'a>(
    ray: &Ray,
    proxies: impl IntoIterator<Item = &'a InstanceTransform>,
    size: f32,
) -> Option<(usize, f32)> {
    proxies
        .into_iter()
        .enumerate()
        .filter_map(|(index, proxy)| intersect_box(ray, proxy, size).map(|t| (index, t)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}
