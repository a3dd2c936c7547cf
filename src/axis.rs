//! Fixed-width, per-axis value tuples shared by the planner and the actuator.
//!
//! These mirror `AxisFloats`/`AxisInt32s` from the original robot firmware:
//! plain arrays of one value per physical axis, generic here over the axis
//! count `N` instead of a compile-time `MAX_AXES` constant.

#[cfg(not(feature = "std"))]
use libm::sqrtf;

/// One `f32` value per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct AxisFloats<const N: usize> {
    vals: [f32; N],
}

impl<const N: usize> AxisFloats<N> {
    pub const ZERO: Self = Self { vals: [0.0; N] };

    pub fn new(vals: [f32; N]) -> Self {
        Self { vals }
    }

    pub fn get(&self, axis: usize) -> f32 {
        self.vals[axis]
    }

    pub fn set(&mut self, axis: usize, val: f32) {
        self.vals[axis] = val;
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.vals
    }

    pub fn map(&self, mut f: impl FnMut(f32) -> f32) -> Self {
        let mut out = [0.0; N];
        for i in 0..N {
            out[i] = f(self.vals[i]);
        }
        Self { vals: out }
    }

    pub fn zip_map(&self, other: &Self, mut f: impl FnMut(f32, f32) -> f32) -> Self {
        let mut out = [0.0; N];
        for i in 0..N {
            out[i] = f(self.vals[i], other.vals[i]);
        }
        Self { vals: out }
    }

    /// Sum of squares across all axes.
    pub fn magnitude_sq(&self) -> f32 {
        self.vals.iter().fold(0.0, |acc, v| acc + v * v)
    }

    /// Euclidean length across all axes.
    pub fn magnitude(&self) -> f32 {
        sqrt(self.magnitude_sq())
    }

    /// A unit vector in the same direction, or `Self::ZERO` if the magnitude
    /// is zero (a degenerate zero-length move has no direction).
    pub fn normalized(&self) -> Self {
        let mag = self.magnitude();
        if mag <= f32::EPSILON {
            Self::ZERO
        } else {
            self.map(|v| v / mag)
        }
    }

    pub fn dot(&self, other: &Self) -> f32 {
        let mut acc = 0.0;
        for i in 0..N {
            acc += self.vals[i] * other.vals[i];
        }
        acc
    }

    /// The largest absolute value across all axes, and its index.
    pub fn abs_max(&self) -> (usize, f32) {
        let mut max_idx = 0;
        let mut max_val = 0.0f32;
        for (i, v) in self.vals.iter().enumerate() {
            let abs_v = if *v < 0.0 { -*v } else { *v };
            if abs_v > max_val {
                max_val = abs_v;
                max_idx = i;
            }
        }
        (max_idx, max_val)
    }
}

#[cfg(not(feature = "std"))]
fn sqrt(v: f32) -> f32 {
    sqrtf(v)
}

#[cfg(feature = "std")]
fn sqrt(v: f32) -> f32 {
    v.sqrt()
}

/// One signed step count per axis, as accumulated by [`crate::block::MotionBlock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct AxisInt32s<const N: usize> {
    vals: [i32; N],
}

impl<const N: usize> AxisInt32s<N> {
    pub const ZERO: Self = Self { vals: [0; N] };

    pub fn new(vals: [i32; N]) -> Self {
        Self { vals }
    }

    pub fn get(&self, axis: usize) -> i32 {
        self.vals[axis]
    }

    pub fn set(&mut self, axis: usize, val: i32) {
        self.vals[axis] = val;
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.vals
    }

    /// The axis with the largest absolute step count ("the master axis") and
    /// that count. Ties favor the lowest index, matching
    /// `getAbsMaxStepsForAnyAxis`'s linear scan.
    pub fn abs_max(&self) -> (usize, u32) {
        let mut max_idx = 0;
        let mut max_val = 0u32;
        for (i, v) in self.vals.iter().enumerate() {
            let abs_v = v.unsigned_abs();
            if abs_v > max_val {
                max_val = abs_v;
                max_idx = i;
            }
        }
        (max_idx, max_val)
    }
}
