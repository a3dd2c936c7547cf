//! Bounded, look-ahead-aware queue of [`MotionBlock`]s.
//!
//! The pipeline holds every block that has been planned but not yet fully
//! executed. `recompute_lookahead` is the classic two-pass corner-speed
//! solver: a reverse pass (newest to oldest) tightens entry speeds so every
//! block can still decelerate in time for what follows it, then a forward
//! pass (oldest to newest) raises entry/exit speeds back up to whatever the
//! acceleration limit actually allows and recalculates each block's step
//! trapezoid.

use crate::block::{MotionBlock, MotionParams};
use crate::ring::RingBuffer;

/// A fixed-capacity, ordered queue of motion blocks with `N - 1` usable
/// slots (see [`RingBuffer`]) over `AXES` physical axes.
pub struct MotionPipeline<const N: usize, const AXES: usize> {
    blocks: RingBuffer<MotionBlock<AXES>, N>,
}

impl<const N: usize, const AXES: usize> MotionPipeline<N, AXES> {
    pub const fn new() -> Self {
        Self {
            blocks: RingBuffer::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.blocks.capacity()
    }

    /// Appends `block` at the tail. Returns the rejected block if the
    /// pipeline has no free slot.
    pub fn add(&mut self, block: MotionBlock<AXES>) -> Result<(), MotionBlock<AXES>> {
        self.blocks.push(block)
    }

    /// The `k`-th oldest block (`0` is the head, the one the actuator is
    /// executing or will execute next).
    pub fn peek(&self, k: usize) -> Option<&MotionBlock<AXES>> {
        self.blocks.peek_from_oldest(k)
    }

    pub fn peek_mut(&mut self, k: usize) -> Option<&mut MotionBlock<AXES>> {
        self.blocks.peek_from_oldest_mut(k)
    }

    /// Releases the head block, if any.
    pub fn pop_head(&mut self) -> Option<MotionBlock<AXES>> {
        self.blocks.pop()
    }

    /// Re-runs the reverse and forward look-ahead passes over every queued
    /// block. Call after every [`MotionPipeline::add`]; safe to call more
    /// often (e.g. periodically from a service loop) since a settled
    /// pipeline short-circuits quickly.
    pub fn recompute_lookahead(&mut self, motion_params: &MotionParams) {
        let len = self.blocks.len();
        if len == 0 {
            return;
        }

        // Force the tail-most (newest) block to plan for a full stop, since
        // the stream may end there.
        if let Some(newest) = self.blocks.peek_from_newest_mut(0) {
            if !newest.is_running {
                newest.exit_speed_mm_per_s = 0.0;
            }
        }

        // Reverse pass: newest -> oldest. offset 0 is newest.
        let mut next_entry_speed = 0.0f32;
        let mut have_next = false;
        for offset in 0..len {
            let is_running = match self.blocks.peek_from_newest(offset) {
                Some(b) => b.is_running,
                None => break,
            };
            if is_running {
                // A running block's exit speed is frozen; it feeds the
                // forward pass as-is but the reverse pass does not touch it.
                continue;
            }
            let Some(block) = self.blocks.peek_from_newest_mut(offset) else {
                break;
            };
            let entry = if have_next {
                block.calc_max_speed_reverse(next_entry_speed, motion_params)
            } else {
                block.calc_max_speed_reverse(0.0, motion_params)
            };
            let settled = entry == block.max_entry_speed_mm_per_s && !block.recalc_flag;
            next_entry_speed = entry;
            have_next = true;
            if settled {
                break;
            }
        }

        // Junction continuity: a block's exit speed must match the entry
        // speed the reverse pass just settled on for whatever follows it
        // (exit[i] = entry[i+1]), since the two blocks share a single
        // instant of travel at the junction. Seed this before the forward
        // pass so `maximize_exit_speed` has something to clamp down from
        // instead of always starting at zero. The tail-most block keeps the
        // full-stop exit speed forced above.
        for offset in 0..len {
            let is_running = match self.blocks.peek_from_oldest(offset) {
                Some(b) => b.is_running,
                None => break,
            };
            if is_running {
                continue;
            }
            let next_entry_speed = if offset + 1 < len {
                self.blocks
                    .peek_from_oldest(offset + 1)
                    .map(|b| b.entry_speed_mm_per_s)
                    .unwrap_or(0.0)
            } else {
                0.0
            };
            if let Some(block) = self.blocks.peek_from_oldest_mut(offset) {
                block.exit_speed_mm_per_s = next_entry_speed;
            }
        }

        // Forward pass: oldest -> newest. offset 0 is oldest (head).
        let mut prev_exit_speed = 0.0f32;
        for offset in 0..len {
            let is_running = match self.blocks.peek_from_oldest(offset) {
                Some(b) => b.is_running,
                None => break,
            };
            if is_running {
                prev_exit_speed = self
                    .blocks
                    .peek_from_oldest(offset)
                    .map(|b| b.exit_speed_mm_per_s)
                    .unwrap_or(0.0);
                continue;
            }
            let Some(block) = self.blocks.peek_from_oldest_mut(offset) else {
                break;
            };
            block.calc_max_speed_forward(prev_exit_speed, motion_params);
            block.calculate_trapezoid(motion_params);
            prev_exit_speed = block.exit_speed_mm_per_s;
        }
    }
}

impl<const N: usize, const AXES: usize> Default for MotionPipeline<N, AXES> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::AxisInt32s;

    fn params() -> MotionParams {
        MotionParams {
            master_axis_max_acc_mm_per_s2: 500.0,
            master_axis_step_distance_mm: 1.0 / 80.0,
        }
    }

    fn straight_block(steps: i32, dist_mm: f32, max_speed: f32) -> MotionBlock<1> {
        let mut b: MotionBlock<1> = MotionBlock::new();
        b.axis_steps_to_target = AxisInt32s::new([steps]);
        b.move_dist_primary_axes_mm = dist_mm;
        b.max_param_speed_mm_per_s = max_speed;
        b.max_entry_speed_mm_per_s = max_speed;
        b.entry_speed_mm_per_s = max_speed;
        b.exit_speed_mm_per_s = max_speed;
        b.recalc_flag = true;
        b
    }

    #[test]
    fn single_block_exits_at_zero() {
        let mut pipe: MotionPipeline<4, 1> = MotionPipeline::new();
        pipe.add(straight_block(8000, 100.0, 50.0)).unwrap();
        pipe.recompute_lookahead(&params());
        let head = pipe.peek(0).unwrap();
        assert_eq!(head.exit_speed_mm_per_s, 0.0);
    }

    #[test]
    fn two_collinear_blocks_cruise_through_junction() {
        let mut pipe: MotionPipeline<4, 1> = MotionPipeline::new();
        pipe.add(straight_block(8000, 100.0, 50.0)).unwrap();
        pipe.recompute_lookahead(&params());
        pipe.add(straight_block(8000, 100.0, 50.0)).unwrap();
        pipe.recompute_lookahead(&params());

        let head = pipe.peek(0).unwrap();
        assert!(head.exit_speed_mm_per_s > 0.0);
    }

    #[test]
    fn pipeline_full_rejects_add() {
        let mut pipe: MotionPipeline<3, 1> = MotionPipeline::new();
        pipe.add(straight_block(10, 1.0, 10.0)).unwrap();
        pipe.add(straight_block(10, 1.0, 10.0)).unwrap();
        assert!(pipe.add(straight_block(10, 1.0, 10.0)).is_err());
    }

    #[test]
    fn running_head_block_is_not_mutated_by_lookahead() {
        let mut pipe: MotionPipeline<4, 1> = MotionPipeline::new();
        let mut running = straight_block(8000, 100.0, 50.0);
        running.is_running = true;
        running.exit_speed_mm_per_s = 25.0;
        pipe.add(running).unwrap();
        pipe.add(straight_block(8000, 100.0, 50.0)).unwrap();

        pipe.recompute_lookahead(&params());
        assert_eq!(pipe.peek(0).unwrap().exit_speed_mm_per_s, 25.0);
    }
}
