//! Bounded-rate correction of extrapolated positions toward server truth

use crate::game::geometry::Vec2;

/// Distance under which a correction is applied in one step, and the
/// per-axis step used otherwise
pub const MAX_CORRECTION: f32 = 1.0;

/// Correction vector from `actual` toward `target`.
///
/// Closer than [`MAX_CORRECTION`] this is the exact difference
/// `actual - target`. Otherwise each axis gets a step of
/// `MAX_CORRECTION` pointing toward the target, or zero when that axis
/// already matches.
pub fn calculate_correction(actual: Vec2, target: Vec2) -> Vec2 {
    Reconciler::default().correction(actual, target)
}

/// Reconciliation parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reconciler {
    pub snap_threshold: f32,
    pub max_step: f32,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self {
            snap_threshold: MAX_CORRECTION,
            max_step: MAX_CORRECTION,
        }
    }
}

impl Reconciler {
    pub fn correction(&self, actual: Vec2, target: Vec2) -> Vec2 {
        if actual.distance(target) < self.snap_threshold {
            return actual - target;
        }
        Vec2::new(
            step_toward(actual.x, target.x, self.max_step),
            step_toward(actual.y, target.y, self.max_step),
        )
    }

    /// Position after one frame of correction. Inside the snap threshold the
    /// result is the target itself; further away it moves one step per axis.
    pub fn reconcile(&self, actual: Vec2, target: Vec2) -> Vec2 {
        if actual.distance(target) < self.snap_threshold {
            target
        } else {
            actual + self.correction(actual, target)
        }
    }
}

fn step_toward(actual: f32, target: f32, step: f32) -> f32 {
    if target > actual {
        step
    } else if target < actual {
        -step
    } else {
        0.0
    }
}
