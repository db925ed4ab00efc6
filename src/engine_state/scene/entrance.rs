//! # Entrance Animation
//!
//! Blocks grow out from the center: each one waits in proportion to its distance from
//! the image middle, then rises a short way into place with a steep ease-out.

use cgmath::Vector3;

use super::instance::{InstanceRecord, InstanceTransform};

/// Seconds of delay per unit of normalized distance from the center.
pub const ENTRANCE_DELAY_FACTOR: f32 = 0.25;
/// Seconds each block spends rising.
pub const ENTRANCE_DURATION: f32 = 1.0;
/// How far below its target a block starts, in world units.
pub const ENTRANCE_RISE: f32 = 0.25;

/// Ease-out with a sixth-power tail.
pub fn ease_out(progress: f32) -> f32 {
    1.0 - (1.0 - progress.clamp(0.0, 1.0)).powi(6)
}

/// Where one instance is in its entrance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EntrancePhase {
    /// Still inside its stagger delay
    Waiting,
    /// Rising, with linear progress in `0.0..1.0`
    Rising(f32),
    /// In place
    Done,
}

impl EntrancePhase {
    /// Phase for an instance that has spent `elapsed` seconds in the entrance.
    pub fn at(elapsed: f32, distance_from_center: f32) -> Self {
        let delay = distance_from_center * ENTRANCE_DELAY_FACTOR;
        if elapsed < delay {
            return Self::Waiting;
        }

        let progress = (elapsed - delay) / ENTRANCE_DURATION;
        if progress < 1.0 {
            Self::Rising(progress)
        } else {
            Self::Done
        }
    }
}

/// The render transform for an instance at `target` in the given phase.
pub fn entrance_transform(target: Vector3<f32>, phase: EntrancePhase) -> InstanceTransform {
    match phase {
        EntrancePhase::Waiting => InstanceTransform::hidden(target),
        EntrancePhase::Rising(progress) => {
            let start_y = target.y - ENTRANCE_RISE;
            let y = start_y + (target.y - start_y) * ease_out(progress);
            InstanceTransform::at(Vector3::new(target.x, y, target.z))
        }
        EntrancePhase::Done => InstanceTransform::at(target),
    }
}

/// Advances the entrance of every record by `dt` seconds and writes their render transforms.
///
/// # Returns
/// `true` once every record is in place. An empty slice is trivially complete.
pub fn advance_entrance(records: &mut [InstanceRecord], dt: f32) -> bool {
    let mut all_done = true;

    for record in records.iter_mut() {
        record.entrance_elapsed += dt;
        let target = record.descriptor.position_vec();
        let phase = EntrancePhase::at(record.entrance_elapsed, record.descriptor.distance_from_center);

        record.render = entrance_transform(target, phase);
        all_done &= phase == EntrancePhase::Done;
    }

    all_done
}
