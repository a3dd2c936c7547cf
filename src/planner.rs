//! [`MotionPlanner`]: turns already-parsed move commands into queued
//! [`MotionBlock`]s.
//!
//! GCode text parsing happens upstream of this crate — by the time a move
//! reaches `move_to`, it is already a [`RobotCommandArgs`] value. This
//! mirrors the boundary in the originating firmware, where `interpG` parses
//! `X`/`Y`/`Z`/`E`/`F`/`S` arguments into a `RobotCommandArgs` struct before
//! ever touching the motion pipeline.

use crate::actuator::MotionActuator;
use crate::axis::AxisFloats;
use crate::block::{MotionBlock, MotionParams, MINIMUM_MOVE_DIST_MM};
use crate::config::AxisConfig;
use crate::error::PlannerError;
use crate::kinematics::Kinematics;
use crate::pipeline::MotionPipeline;

/// Whether an endstop should be honored (and the move aborted/truncated on
/// contact) or ignored for the duration of a move. Enforcing this against
/// physical endstop inputs is outside this crate's scope; the flag is
/// carried through so callers implementing `Kinematics` can act on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum EndstopMode {
    Ignore,
    Check,
}

/// An already-parsed move command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RobotCommandArgs<const N: usize> {
    /// Target coordinate per axis, valid only where `axis_valid[i]` is set.
    pub axis_values: AxisFloats<N>,
    /// Per-axis flag for whether this command specifies that axis at all
    /// (an axis omitted from a GCode line keeps its current target).
    pub axis_valid: [bool; N],
    /// Commanded feedrate (units/s), if the command set one.
    pub feedrate: Option<f32>,
    /// Commanded extrusion amount, if any (carried through untouched; this
    /// crate treats extrusion as just another axis value if the caller
    /// chooses to model it that way).
    pub extrude: Option<f32>,
    pub endstop_mode: EndstopMode,
    pub move_rapid: bool,
}

impl<const N: usize> RobotCommandArgs<N> {
    pub fn new(axis_values: AxisFloats<N>) -> Self {
        Self {
            axis_values,
            axis_valid: [true; N],
            feedrate: None,
            extrude: None,
            endstop_mode: EndstopMode::Ignore,
            move_rapid: false,
        }
    }
}

/// Result of a successful `move_to` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// A block was queued.
    Moved,
    /// The target was indistinguishable from the current position; no
    /// block was queued. Not an error, per `MINIMUM_MOVE_DIST_MM`.
    ZeroLength,
}

/// Plans moves into a bounded pipeline of `N`-axis blocks, backed by a
/// caller-supplied [`Kinematics`] implementation.
///
/// `PIPE_N` is the pipeline's backing-array size (usable capacity is
/// `PIPE_N - 1`); `N` is the axis count.
pub struct MotionPlanner<K, const PIPE_N: usize, const N: usize>
where
    K: Kinematics<N>,
{
    kinematics: K,
    axis_config: [AxisConfig; N],
    pipeline: MotionPipeline<PIPE_N, N>,
    current_steps: [i32; N],
    current_unit_vectors: AxisFloats<N>,
    current_max_param_speed: f32,
}

impl<K, const PIPE_N: usize, const N: usize> MotionPlanner<K, PIPE_N, N>
where
    K: Kinematics<N>,
{
    pub fn new(kinematics: K, axis_config: [AxisConfig; N]) -> Self {
        Self {
            kinematics,
            axis_config,
            pipeline: MotionPipeline::new(),
            current_steps: [0; N],
            current_unit_vectors: AxisFloats::ZERO,
            current_max_param_speed: 0.0,
        }
    }

    pub fn pipeline(&self) -> &MotionPipeline<PIPE_N, N> {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut MotionPipeline<PIPE_N, N> {
        &mut self.pipeline
    }

    /// True iff the pipeline holds no blocks and the actuator has no block
    /// claimed — the machine has genuinely stopped moving, not just run out
    /// of queued work a tick early.
    pub fn is_idle(&self, actuator: &MotionActuator<N>) -> bool {
        self.pipeline.is_empty() && !actuator.is_running()
    }

    /// Plans one move. See spec step-by-step in the module doc comment of
    /// the crate root; numbered steps below follow the same order.
    pub fn move_to(&mut self, args: &RobotCommandArgs<N>) -> Result<MoveOutcome, PlannerError> {
        // 1. Forward transform to actuator steps, checked against bounds.
        let mut target_steps = self.current_steps;
        if !self
            .kinematics
            .pt_to_actuator(&args.axis_values, &mut target_steps, &self.axis_config)
        {
            return Err(PlannerError::OutOfBounds);
        }

        // 2. Per-axis step deltas; short-circuit on a no-op move.
        let mut axis_steps_to_target = [0i32; N];
        let mut any_nonzero = false;
        for i in 0..N {
            let delta = target_steps[i] - self.current_steps[i];
            axis_steps_to_target[i] = delta;
            if delta != 0 {
                any_nonzero = true;
            }
        }

        // 3. Distance in user-space units over the primary axes.
        let mut delta_units = [0f32; N];
        for i in 0..N {
            delta_units[i] = axis_steps_to_target[i] as f32 / self.axis_config[i].steps_per_unit();
        }
        let delta_units = AxisFloats::new(delta_units);
        let move_dist_primary_axes_mm = delta_units.magnitude();

        if !any_nonzero || move_dist_primary_axes_mm < MINIMUM_MOVE_DIST_MM {
            return Ok(MoveOutcome::ZeroLength);
        }

        // 4. Max parametric speed: the lesser of the slowest configured
        // axis that's actually moving and any explicit feedrate.
        let mut max_param_speed = f32::INFINITY;
        for i in 0..N {
            if axis_steps_to_target[i] != 0 {
                max_param_speed = f32::min(max_param_speed, self.axis_config[i].max_speed);
            }
        }
        if let Some(feedrate) = args.feedrate {
            max_param_speed = f32::min(max_param_speed, feedrate);
        }

        let master_axis_idx = axis_steps_to_target
            .iter()
            .enumerate()
            .max_by_key(|(_, v)| v.unsigned_abs())
            .map(|(i, _)| i)
            .unwrap_or(0);
        let master_axis_max_acc = self.axis_config[master_axis_idx].max_acc;
        let master_axis_step_distance_mm = 1.0 / self.axis_config[master_axis_idx].steps_per_unit();
        let motion_params = MotionParams {
            master_axis_max_acc_mm_per_s2: master_axis_max_acc,
            master_axis_step_distance_mm,
        };

        let unit_vectors = delta_units.normalized();

        // 5. Junction-speed heuristic: scale the smaller of the two max
        // parametric speeds by how aligned this move is with the previous
        // one. An idle pipeline has no predecessor to form a junction with
        // at all, so the first block queued after idle always starts at
        // zero entry speed, regardless of what direction/speed the machine
        // happened to move at before it went idle.
        let max_entry_speed_mm_per_s = if self.pipeline.is_empty() {
            self.current_max_param_speed = 0.0;
            self.current_unit_vectors = AxisFloats::ZERO;
            0.0
        } else {
            let cos_angle = unit_vectors.dot(&self.current_unit_vectors).clamp(0.0, 1.0);
            f32::min(max_param_speed, self.current_max_param_speed) * cos_angle
        };

        // 6. Nominal-length flag: true if the move is long enough to reach
        // max_param_speed from a standing start within its own length.
        let nominal_length_flag =
            max_param_speed * max_param_speed <= 2.0 * master_axis_max_acc * move_dist_primary_axes_mm;

        // 7. Initial entry/exit speed guesses, refined by look-ahead.
        let entry_speed_mm_per_s = f32::min(
            max_entry_speed_mm_per_s,
            sqrt(2.0 * master_axis_max_acc * move_dist_primary_axes_mm),
        );

        let mut block: MotionBlock<N> = MotionBlock::new();
        block.max_param_speed_mm_per_s = max_param_speed;
        block.axis_steps_to_target = crate::axis::AxisInt32s::new(axis_steps_to_target);
        block.move_dist_primary_axes_mm = move_dist_primary_axes_mm;
        block.max_entry_speed_mm_per_s = max_entry_speed_mm_per_s;
        block.entry_speed_mm_per_s = entry_speed_mm_per_s;
        block.exit_speed_mm_per_s = 0.0;
        block.unit_vectors = unit_vectors;
        block.nominal_length_flag = nominal_length_flag;
        block.recalc_flag = true;

        // 8. Queue and re-run look-ahead.
        self.pipeline.add(block).map_err(|_| PlannerError::PipelineFull)?;
        self.pipeline.recompute_lookahead(&motion_params);

        // 9. Commanded position advances immediately.
        self.current_steps = target_steps;
        self.current_unit_vectors = unit_vectors;
        self.current_max_param_speed = max_param_speed;

        Ok(MoveOutcome::Moved)
    }
}

#[cfg(not(feature = "std"))]
fn sqrt(v: f32) -> f32 {
    libm::sqrtf(v)
}
#[cfg(feature = "std")]
fn sqrt(v: f32) -> f32 {
    v.sqrt()
}
