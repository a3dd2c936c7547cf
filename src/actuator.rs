//! [`MotionActuator`]: the tick-driven consumer of the head pipeline block.
//!
//! Runs at a fixed high-frequency tick (~1 MHz, one tick per
//! [`crate::block::TICK_INTERVAL_NS`]). Structurally this follows the same
//! pipelined fetch-ahead discipline as `mcu-drivers::stepper::
//! StepperController::on_timer_interrupt` in the teacher pack — direction
//! pins are latched before the step pulse they apply to, and the tick's
//! critical work (accumulate, maybe step) happens before any bookkeeping —
//! but the phase/accumulator model itself (ACCEL/PLATEAU/DECEL against a
//! block's `axis_step_data`) comes from spec.md §4.6, which the teacher's
//! own ISR does not implement.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::block::{AxisStepData, K_VALUE};
use crate::pipeline::MotionPipeline;

/// Per-axis step phase, mirroring `STEP_PHASE_ACCEL`/`_PLATEAU`/`_DECEL` in
/// the originating firmware plus a terminal `Done` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Accel,
    Plateau,
    Decel,
    Done,
}

/// The pin-level action the actuator wants the caller to perform this tick
/// for one axis. This crate never touches GPIO itself (non-goal); `tick`
/// reports intents instead, the way [`crate::kinematics::Kinematics`]
/// reports intents rather than driving hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisPinState {
    /// Set once, the first time this axis moves in the current block.
    pub set_direction: Option<bool>,
    /// Whether the step pin should be driven high or low this tick.
    pub step_pin: Option<bool>,
}

impl AxisPinState {
    const NONE: Self = Self {
        set_direction: None,
        step_pin: None,
    };
}

/// What happened during one [`MotionActuator::tick`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing to do; the pipeline is empty.
    Idle,
    /// The head block's `change_in_progress` flag was set; the tick was
    /// skipped for that block, per spec.md §4.6 step 1.
    BlockChanging,
    /// At least one axis advanced or transitioned phase this tick.
    Stepped,
    /// The head block finished (every axis reached `Done`) and was popped.
    BlockComplete,
}

struct AxisState {
    accumulator: u64,
    current_step_rate_per_k_ticks: u32,
    steps_done_in_phase: u32,
    phase: Phase,
    pin_high_since: Option<u64>,
}

impl AxisState {
    const fn new() -> Self {
        Self {
            accumulator: 0,
            current_step_rate_per_k_ticks: 0,
            steps_done_in_phase: 0,
            phase: Phase::Done,
            pin_high_since: None,
        }
    }
}

const TICKS_PER_MS: u32 = 1_000_000 / crate::block::TICK_INTERVAL_NS;

/// Tick-driven per-axis accumulator and phase state machine for the head
/// pipeline block.
pub struct MotionActuator<const N: usize> {
    axes: [AxisState; N],
    is_running: AtomicBool,
    tick_count: u64,
    direction_latched: [bool; N],
}

impl<const N: usize> MotionActuator<N> {
    pub fn new() -> Self {
        Self {
            axes: core::array::from_fn(|_| AxisState::new()),
            is_running: AtomicBool::new(false),
            tick_count: 0,
            direction_latched: [false; N],
        }
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Acquire)
    }

    /// Advances the actuator by one tick against the pipeline's head block.
    /// `pin_out` receives this tick's per-axis pin intents.
    pub fn tick<const PIPE_N: usize>(
        &mut self,
        pipeline: &mut MotionPipeline<PIPE_N, N>,
        pin_out: &mut [AxisPinState; N],
    ) -> TickOutcome {
        self.tick_count += 1;
        *pin_out = [AxisPinState::NONE; N];

        let axis_step_data: [AxisStepData; N];
        {
            let Some(head) = pipeline.peek_mut(0) else {
                return TickOutcome::Idle;
            };

            if head.change_in_progress {
                return TickOutcome::BlockChanging;
            }

            if !head.is_running {
                head.is_running = true;
                self.is_running.store(true, Ordering::Release);
                for i in 0..N {
                    let steps = head.axis_steps_to_target.get(i);
                    let data = head.axis_step_data[i];
                    self.axes[i] = AxisState {
                        accumulator: 0,
                        current_step_rate_per_k_ticks: data.initial_step_rate_per_k_ticks,
                        steps_done_in_phase: 0,
                        phase: starting_phase(&data),
                        pin_high_since: None,
                    };
                    let forward = steps >= 0;
                    self.direction_latched[i] = forward;
                    pin_out[i].set_direction = Some(forward);
                }
            }

            axis_step_data = head.axis_step_data;
        }

        let mut any_stepped = false;
        let mut all_done = true;

        for i in 0..N {
            let data = axis_step_data[i];

            if let Some(since) = self.axes[i].pin_high_since {
                if since != self.tick_count {
                    pin_out[i].step_pin = Some(false);
                    self.axes[i].pin_high_since = None;
                }
            }

            if self.axes[i].phase == Phase::Done {
                continue;
            }
            all_done = false;

            self.axes[i].accumulator += self.axes[i].current_step_rate_per_k_ticks as u64;
            if self.axes[i].accumulator >= K_VALUE as u64 {
                self.axes[i].accumulator -= K_VALUE as u64;
                pin_out[i].step_pin = Some(true);
                self.axes[i].pin_high_since = Some(self.tick_count);
                self.axes[i].steps_done_in_phase += 1;
                any_stepped = true;
            }

            advance_phase(&mut self.axes[i], &data);
        }

        if all_done {
            pipeline.pop_head();
            self.is_running.store(false, Ordering::Release);
            return TickOutcome::BlockComplete;
        }

        if any_stepped {
            TickOutcome::Stepped
        } else {
            TickOutcome::Idle
        }
    }
}

impl<const N: usize> Default for MotionActuator<N> {
    fn default() -> Self {
        Self::new()
    }
}

fn starting_phase(data: &AxisStepData) -> Phase {
    if data.steps_in_acc_phase > 0 {
        Phase::Accel
    } else if data.steps_in_plateau_phase > 0 {
        Phase::Plateau
    } else if data.steps_in_decel_phase > 0 {
        Phase::Decel
    } else {
        Phase::Done
    }
}

fn advance_phase(axis: &mut AxisState, data: &AxisStepData) {
    let acc_per_tick = data.acc_steps_per_k_ticks_per_ms / TICKS_PER_MS.max(1);
    match axis.phase {
        Phase::Accel => {
            axis.current_step_rate_per_k_ticks += acc_per_tick;
            if axis.steps_done_in_phase >= data.steps_in_acc_phase {
                axis.steps_done_in_phase = 0;
                axis.phase = if data.steps_in_plateau_phase > 0 {
                    Phase::Plateau
                } else if data.steps_in_decel_phase > 0 {
                    Phase::Decel
                } else {
                    Phase::Done
                };
            }
        }
        Phase::Plateau => {
            if axis.steps_done_in_phase >= data.steps_in_plateau_phase {
                axis.steps_done_in_phase = 0;
                axis.phase = if data.steps_in_decel_phase > 0 {
                    Phase::Decel
                } else {
                    Phase::Done
                };
            }
        }
        Phase::Decel => {
            axis.current_step_rate_per_k_ticks = axis.current_step_rate_per_k_ticks.saturating_sub(acc_per_tick);
            if axis.steps_done_in_phase >= data.steps_in_decel_phase {
                axis.steps_done_in_phase = 0;
                axis.phase = Phase::Done;
            }
        }
        Phase::Done => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{MotionBlock, MotionParams};
    use crate::axis::AxisInt32s;
    use crate::pipeline::MotionPipeline;

    fn params() -> MotionParams {
        MotionParams {
            master_axis_max_acc_mm_per_s2: 500.0,
            master_axis_step_distance_mm: 1.0 / 80.0,
        }
    }

    fn block_with_steps(steps: i32) -> MotionBlock<1> {
        let mut b: MotionBlock<1> = MotionBlock::new();
        b.axis_steps_to_target = AxisInt32s::new([steps]);
        b.move_dist_primary_axes_mm = 100.0;
        b.max_param_speed_mm_per_s = 50.0;
        b.max_entry_speed_mm_per_s = 50.0;
        b.entry_speed_mm_per_s = 50.0;
        b.exit_speed_mm_per_s = 0.0;
        b.recalc_flag = false;
        b
    }

    #[test]
    fn full_block_execution_counts_exact_steps() {
        let mut pipe: MotionPipeline<4, 1> = MotionPipeline::new();
        let block = block_with_steps(400);
        pipe.add(block).unwrap();
        pipe.recompute_lookahead(&params());

        let mut actuator: MotionActuator<1> = MotionActuator::new();
        let mut pins = [AxisPinState::NONE; 1];
        let mut total_steps = 0u32;

        loop {
            match actuator.tick(&mut pipe, &mut pins) {
                TickOutcome::Idle => {
                    if pipe.is_empty() {
                        break;
                    }
                }
                TickOutcome::Stepped => {
                    if pins[0].step_pin == Some(true) {
                        total_steps += 1;
                    }
                }
                TickOutcome::BlockComplete => break,
                TickOutcome::BlockChanging => {}
            }
        }

        assert_eq!(total_steps, 400);
        assert!(pipe.is_empty());
    }

    #[test]
    fn direction_pin_latched_on_first_tick_of_block() {
        let mut pipe: MotionPipeline<4, 1> = MotionPipeline::new();
        pipe.add(block_with_steps(-100)).unwrap();
        pipe.recompute_lookahead(&params());

        let mut actuator: MotionActuator<1> = MotionActuator::new();
        let mut pins = [AxisPinState::NONE; 1];
        actuator.tick(&mut pipe, &mut pins);
        assert_eq!(pins[0].set_direction, Some(false));
    }

    #[test]
    fn idle_pipeline_produces_idle_tick() {
        let mut pipe: MotionPipeline<4, 1> = MotionPipeline::new();
        let mut actuator: MotionActuator<1> = MotionActuator::new();
        let mut pins = [AxisPinState::NONE; 1];
        assert_eq!(actuator.tick(&mut pipe, &mut pins), TickOutcome::Idle);
    }
}
