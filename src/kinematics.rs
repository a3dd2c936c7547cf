//! Caller-supplied kinematics hooks.
//!
//! This crate never picks a concrete kinematic model — Cartesian, CoreXY,
//! delta, whatever the machine needs is the caller's job. What the planner
//! needs from the caller is exactly three operations, modeled here as a
//! trait so callers can plug in any transform without this crate depending
//! on one: `pt_to_actuator`, `actuator_to_pt`, `correct_step_overflow`.

use crate::axis::AxisFloats;
use crate::config::AxisConfig;

/// The caller-supplied forward/inverse kinematics contract.
///
/// `N` is the number of physical (stepper) axes.
pub trait Kinematics<const N: usize> {
    /// Converts a user-space target point to integer actuator step counts.
    ///
    /// Returns `true` if the target is within machine bounds (per
    /// `axis_params`); `false` signals an out-of-bounds target, which the
    /// planner surfaces as [`crate::error::PlannerError::OutOfBounds`].
    fn pt_to_actuator(
        &self,
        move_target: &AxisFloats<N>,
        out_actuator_steps: &mut [i32; N],
        axis_params: &[AxisConfig; N],
    ) -> bool;

    /// Inverse of [`Kinematics::pt_to_actuator`]: converts actuator step
    /// counts back to a user-space point.
    fn actuator_to_pt(
        &self,
        actuator_steps: &[i32; N],
        out_point: &mut AxisFloats<N>,
        axis_params: &[AxisConfig; N],
    );

    /// An opportunity to normalize step accumulators for continuously
    /// rotating axes (e.g. an axis with `units_per_rotation` wrap-around).
    /// The default implementation does nothing, which is correct for
    /// machines with no continuous-rotation axes.
    fn correct_step_overflow(&self, _axis_params: &[AxisConfig; N]) {}
}

/// A minimal identity kinematics model: stepper space equals user space,
/// scaled only by each axis's configured steps-per-unit.
///
/// This exists purely to exercise [`crate::planner::MotionPlanner`] in this
/// crate's own tests; it is test scaffolding, not a shipped kinematics
/// model.
#[derive(Debug, Default)]
pub struct IdentityKinematics;

impl<const N: usize> Kinematics<N> for IdentityKinematics {
    fn pt_to_actuator(
        &self,
        move_target: &AxisFloats<N>,
        out_actuator_steps: &mut [i32; N],
        axis_params: &[AxisConfig; N],
    ) -> bool {
        for i in 0..N {
            let cfg = &axis_params[i];
            if let (Some(min), Some(max)) = (cfg.min_val, cfg.max_val) {
                if move_target.get(i) < min || move_target.get(i) > max {
                    return false;
                }
            }
            out_actuator_steps[i] = round(move_target.get(i) * cfg.steps_per_unit()) as i32;
        }
        true
    }

    fn actuator_to_pt(
        &self,
        actuator_steps: &[i32; N],
        out_point: &mut AxisFloats<N>,
        axis_params: &[AxisConfig; N],
    ) {
        for i in 0..N {
            let cfg = &axis_params[i];
            out_point.set(i, actuator_steps[i] as f32 / cfg.steps_per_unit());
        }
    }
}

#[cfg(not(feature = "std"))]
fn round(v: f32) -> f32 {
    libm::roundf(v)
}
#[cfg(feature = "std")]
fn round(v: f32) -> f32 {
    v.round()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AxisConfig;

    fn cfg() -> AxisConfig {
        AxisConfig {
            max_speed: 100.0,
            max_acc: 500.0,
            steps_per_rotation: 200,
            units_per_rotation: 1.0,
            min_val: Some(-1000.0),
            max_val: Some(1000.0),
            home_offset_val: 0.0,
            home_offset_steps: 0,
        }
    }

    #[test]
    fn round_trips_through_steps() {
        let k = IdentityKinematics;
        let cfgs = [cfg(), cfg()];
        let target: AxisFloats<2> = AxisFloats::new([10.0, -5.0]);
        let mut steps = [0i32; 2];
        assert!(k.pt_to_actuator(&target, &mut steps, &cfgs));

        let mut back: AxisFloats<2> = AxisFloats::ZERO;
        k.actuator_to_pt(&steps, &mut back, &cfgs);
        assert!((back.get(0) - 10.0).abs() < 0.01);
        assert!((back.get(1) + 5.0).abs() < 0.01);
    }

    #[test]
    fn rejects_out_of_bounds_target() {
        let k = IdentityKinematics;
        let cfgs = [cfg(), cfg()];
        let target: AxisFloats<2> = AxisFloats::new([5000.0, 0.0]);
        let mut steps = [0i32; 2];
        assert!(!k.pt_to_actuator(&target, &mut steps, &cfgs));
    }
}
