//! [`MotionBlock`]: the unit of work queued in a [`crate::pipeline::MotionPipeline`].
//!
//! A block carries one linear move's step deltas plus the speed/trapezoid
//! state the look-ahead passes and [`crate::actuator::MotionActuator`]
//! need. The trapezoid math in [`MotionBlock::calculate_trapezoid`] follows
//! the MS-scaled integer schedule only; the alternate floating-point
//! accel/decel-per-tick schedule from the originating firmware is not
//! ported (see `DESIGN.md`, Open Question 2).

#[cfg(not(feature = "std"))]
use libm::{ceilf, powf, sqrtf};

use crate::axis::{AxisFloats, AxisInt32s};

/// Number of ticks accumulated per step-rate unit in the fixed-point step
/// schedule. Matches `K_VALUE` in the originating firmware.
pub const K_VALUE: u32 = 1_000_000_000;

/// Duration of one actuator tick, in nanoseconds.
pub const TICK_INTERVAL_NS: u32 = 1_000;

/// The smallest move distance the planner will bother queuing.
pub const MINIMUM_MOVE_DIST_MM: f32 = 0.0001;

/// Index of the acceleration phase in [`AxisStepData`].
pub const STEP_PHASE_ACCEL: usize = 0;
/// Index of the plateau (cruise) phase in [`AxisStepData`].
pub const STEP_PHASE_PLATEAU: usize = 1;
/// Index of the deceleration phase in [`AxisStepData`].
pub const STEP_PHASE_DECEL: usize = 2;

/// Per-move constants that don't vary block to block but are needed to
/// compute a single block's trapezoid: the master axis's acceleration limit
/// and its distance-per-step, both already resolved by the planner from
/// whichever physical axis has the most steps in this block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionParams {
    pub master_axis_max_acc_mm_per_s2: f32,
    pub master_axis_step_distance_mm: f32,
}

/// Fixed-point-per-tick step schedule for a single axis within a block.
///
/// `initial_step_rate_per_k_ticks` and `acc_steps_per_k_ticks_per_ms` are
/// scaled by [`K_VALUE`] the same way the originating firmware scales them,
/// so that the actuator's accumulator can stay in integer/fixed-point
/// arithmetic on the hot path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct AxisStepData {
    pub initial_step_rate_per_k_ticks: u32,
    pub acc_steps_per_k_ticks_per_ms: u32,
    pub steps_in_acc_phase: u32,
    pub steps_in_plateau_phase: u32,
    pub steps_in_decel_phase: u32,
}

/// A single planned linear move, queued into the pipeline and consumed by
/// the actuator once it reaches the front.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionBlock<const N: usize> {
    /// Speed this block would cruise at if entry and exit speed were both
    /// zero constraint (i.e. the feedrate-limited top speed).
    pub max_param_speed_mm_per_s: f32,
    /// Per-axis signed step counts to reach this block's target.
    pub axis_steps_to_target: AxisInt32s<N>,
    /// Pythagorean distance of the move considering the primary axes.
    pub move_dist_primary_axes_mm: f32,
    /// Maximum entry speed allowed by the junction with the previous block.
    pub max_entry_speed_mm_per_s: f32,
    /// Entry speed after look-ahead recalculation.
    pub entry_speed_mm_per_s: f32,
    /// Exit speed after look-ahead recalculation.
    pub exit_speed_mm_per_s: f32,
    /// Unit vector of travel direction, used for the junction-speed
    /// heuristic between consecutive blocks.
    pub unit_vectors: AxisFloats<N>,
    /// True once this block has been proven to reach `max_param_speed_mm_per_s`
    /// regardless of entry speed — skips reverse-pass recalculation.
    pub nominal_length_flag: bool,
    /// True while the reverse/forward passes may still need to revisit this
    /// block (cleared once entry speed saturates at the nominal speed).
    pub recalc_flag: bool,
    /// True once the actuator has started executing this block. A running
    /// block's speed/trapezoid fields are frozen.
    pub is_running: bool,
    /// True while [`MotionBlock::calculate_trapezoid`] is updating this
    /// block's step schedule; the actuator must not touch it meanwhile.
    pub change_in_progress: bool,
    /// Resulting per-axis step schedule, filled in by `calculate_trapezoid`.
    pub axis_step_data: [AxisStepData; N],
}

impl<const N: usize> MotionBlock<N> {
    pub fn new() -> Self {
        Self {
            max_param_speed_mm_per_s: 0.0,
            axis_steps_to_target: AxisInt32s::ZERO,
            move_dist_primary_axes_mm: 0.0,
            max_entry_speed_mm_per_s: 0.0,
            entry_speed_mm_per_s: 0.0,
            exit_speed_mm_per_s: 0.0,
            unit_vectors: AxisFloats::ZERO,
            nominal_length_flag: false,
            recalc_flag: false,
            is_running: false,
            change_in_progress: false,
            axis_step_data: [AxisStepData::default(); N],
        }
    }

    /// The axis with the most steps to take, and that step count. The
    /// trapezoid's per-axis ratios are always scaled against this "master
    /// axis".
    pub fn abs_max_steps_for_any_axis(&self) -> (usize, u32) {
        self.axis_steps_to_target.abs_max()
    }

    /// Reverse-pass recalculation: given the speed this block must have
    /// slowed to by its exit (because the *next* block already constrained
    /// it), tighten this block's entry speed so deceleration stays within
    /// `motion_params`'s acceleration limit.
    ///
    /// Returns the (possibly unchanged) entry speed.
    pub fn calc_max_speed_reverse(&mut self, exit_speed: f32, motion_params: &MotionParams) -> f32 {
        if self.entry_speed_mm_per_s != self.max_entry_speed_mm_per_s {
            if !self.nominal_length_flag && self.max_entry_speed_mm_per_s > exit_speed {
                let max_entry_speed = max_allowable_speed(
                    -motion_params.master_axis_max_acc_mm_per_s2,
                    exit_speed,
                    self.move_dist_primary_axes_mm,
                );
                self.entry_speed_mm_per_s = f32::min(max_entry_speed, self.max_entry_speed_mm_per_s);
            } else {
                self.entry_speed_mm_per_s = self.max_entry_speed_mm_per_s;
            }
        }
        self.entry_speed_mm_per_s
    }

    /// Forward-pass recalculation: given the maximum speed the previous
    /// block could actually reach by its own exit, raise this block's entry
    /// speed to match (capped by this block's own limits), then maximize
    /// this block's exit speed in turn.
    pub fn calc_max_speed_forward(&mut self, mut prev_max_exit_speed: f32, motion_params: &MotionParams) {
        if prev_max_exit_speed > self.max_param_speed_mm_per_s {
            prev_max_exit_speed = self.max_param_speed_mm_per_s;
        }
        if prev_max_exit_speed > self.max_entry_speed_mm_per_s {
            prev_max_exit_speed = self.max_entry_speed_mm_per_s;
        }
        if prev_max_exit_speed <= self.entry_speed_mm_per_s {
            self.entry_speed_mm_per_s = prev_max_exit_speed;
            if self.entry_speed_mm_per_s >= self.max_param_speed_mm_per_s {
                self.recalc_flag = false;
            }
        }
        self.maximize_exit_speed(motion_params);
    }

    /// Raises `exit_speed_mm_per_s` as high as entry speed and acceleration
    /// allow, capped at the nominal speed if this block is guaranteed to
    /// reach it. A no-op while the block is running.
    pub fn maximize_exit_speed(&mut self, motion_params: &MotionParams) {
        if self.is_running {
            return;
        }
        if self.nominal_length_flag {
            self.exit_speed_mm_per_s = f32::min(self.max_param_speed_mm_per_s, self.exit_speed_mm_per_s);
        }
        let max_exit_speed = max_allowable_speed(
            -motion_params.master_axis_max_acc_mm_per_s2,
            self.entry_speed_mm_per_s,
            self.move_dist_primary_axes_mm,
        );
        self.exit_speed_mm_per_s = f32::min(max_exit_speed, self.exit_speed_mm_per_s);
    }

    /// Computes the per-axis acceleration/plateau/deceleration step
    /// schedule for this block from its (already look-ahead-settled) entry
    /// and exit speeds. A no-op while the block is running, matching the
    /// originating firmware's "don't touch a block mid-flight" rule.
    pub fn calculate_trapezoid(&mut self, motion_params: &MotionParams) {
        if self.is_running {
            return;
        }
        self.change_in_progress = true;

        let initial_step_rate_per_sec =
            self.entry_speed_mm_per_s / motion_params.master_axis_step_distance_mm;

        let mut dist_accelerating = (pow2(self.exit_speed_mm_per_s) - pow2(self.entry_speed_mm_per_s))
            / 4.0
            / motion_params.master_axis_max_acc_mm_per_s2
            + self.move_dist_primary_axes_mm / 2.0;
        force_in_bounds(&mut dist_accelerating, 0.0, self.move_dist_primary_axes_mm);
        let mut dist_decelerating = self.move_dist_primary_axes_mm - dist_accelerating;
        let mut dist_plateau = 0.0f32;

        let dist_to_max_speed = (pow2(self.max_param_speed_mm_per_s) - pow2(self.entry_speed_mm_per_s))
            / 2.0
            / motion_params.master_axis_max_acc_mm_per_s2;
        if dist_to_max_speed < dist_accelerating {
            dist_accelerating = dist_to_max_speed;
            dist_decelerating = (pow2(self.max_param_speed_mm_per_s) - pow2(self.exit_speed_mm_per_s))
                / 2.0
                / motion_params.master_axis_max_acc_mm_per_s2;
            dist_plateau = self.move_dist_primary_axes_mm - dist_accelerating - dist_decelerating;
        }

        let dist_prop_accelerating = dist_accelerating / self.move_dist_primary_axes_mm;
        let dist_prop_plateau = dist_plateau / self.move_dist_primary_axes_mm;

        let (_axis_idx_with_max_steps, abs_max_steps_for_any_axis) = self.abs_max_steps_for_any_axis();
        let one_over_abs_max_steps_any_axis = if abs_max_steps_for_any_axis == 0 {
            0.0
        } else {
            1.0 / abs_max_steps_for_any_axis as f32
        };

        let ticks_per_sec = 1.0e9 / TICK_INTERVAL_NS as f32;
        let master_axis_max_acc_steps_per_sec2 =
            motion_params.master_axis_max_acc_mm_per_s2 / motion_params.master_axis_step_distance_mm;
        let master_axis_max_acc_steps_per_k_ticks_per_sec =
            (K_VALUE as f32 * master_axis_max_acc_steps_per_sec2) / ticks_per_sec;
        let master_axis_max_acc_steps_per_k_ticks_per_ms =
            master_axis_max_acc_steps_per_k_ticks_per_sec / 1000.0;

        for axis_idx in 0..N {
            let abs_steps_this_axis = self.axis_steps_to_target.get(axis_idx).unsigned_abs();
            let axis_factor = abs_steps_this_axis as f32 * one_over_abs_max_steps_any_axis;

            let axis_initial_step_rate_per_sec = initial_step_rate_per_sec * axis_factor;
            let axis_initial_step_rate_per_k_ticks_float =
                (K_VALUE as f32 * axis_initial_step_rate_per_sec) / ticks_per_sec;
            let axis_max_acc_steps_per_k_ticks_per_ms =
                master_axis_max_acc_steps_per_k_ticks_per_ms * axis_factor;

            let steps_accel = ceil(abs_steps_this_axis as f32 * dist_prop_accelerating) as u32;
            let steps_plateau = (abs_steps_this_axis as f32 * dist_prop_plateau) as u32;
            let steps_decel = abs_steps_this_axis.saturating_sub(steps_accel).saturating_sub(steps_plateau);

            debug_assert_eq!(
                steps_accel + steps_plateau + steps_decel,
                abs_steps_this_axis,
                "trapezoid phase split must close exactly over the commanded step count"
            );

            self.axis_step_data[axis_idx] = AxisStepData {
                initial_step_rate_per_k_ticks: (axis_initial_step_rate_per_k_ticks_float
                    + axis_max_acc_steps_per_k_ticks_per_ms) as u32,
                acc_steps_per_k_ticks_per_ms: axis_max_acc_steps_per_k_ticks_per_ms as u32,
                steps_in_acc_phase: steps_accel,
                steps_in_plateau_phase: steps_plateau,
                steps_in_decel_phase: steps_decel,
            };
        }

        self.change_in_progress = false;
    }
}

impl<const N: usize> Default for MotionBlock<N> {
    fn default() -> Self {
        Self::new()
    }
}

fn max_allowable_speed(acceleration: f32, target_velocity: f32, distance: f32) -> f32 {
    sqrt(pow2(target_velocity) - 2.0 * acceleration * distance)
}

fn force_in_bounds(val: &mut f32, low: f32, high: f32) {
    if *val < low {
        *val = low;
    }
    if *val > high {
        *val = high;
    }
}

fn pow2(v: f32) -> f32 {
    pow(v, 2.0)
}

#[cfg(not(feature = "std"))]
fn sqrt(v: f32) -> f32 {
    sqrtf(v)
}
#[cfg(feature = "std")]
fn sqrt(v: f32) -> f32 {
    v.sqrt()
}

#[cfg(not(feature = "std"))]
fn pow(v: f32, e: f32) -> f32 {
    powf(v, e)
}
#[cfg(feature = "std")]
fn pow(v: f32, e: f32) -> f32 {
    v.powf(e)
}

#[cfg(not(feature = "std"))]
fn ceil(v: f32) -> f32 {
    ceilf(v)
}
#[cfg(feature = "std")]
fn ceil(v: f32) -> f32 {
    v.ceil()
}
