//! Configuration data shapes.
//!
//! These types mirror the key-value document a machine is set up from (the
//! originating firmware's JSON config: pin names, step-enable behavior,
//! per-axis limits). Parsing the document itself — JSON, TOML, whatever the
//! caller prefers — is outside this crate's scope; `serde-support` only
//! makes the types themselves (de)serializable so a caller's own parser can
//! deserialize straight into them.

use crate::error::ConfigError;

/// Top-level machine configuration.
///
/// `N` is the number of physical axes; pipeline capacity is a separate
/// compile-time constant (see [`crate::pipeline::MotionPipeline`]) rather
/// than a runtime field, since it sizes the pipeline's backing array.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct MotionConfig<const N: usize> {
    /// Opaque pin identifier for the shared stepper-driver enable line.
    pub step_enable_pin: AxisPin,
    /// Logic level that enables the drivers.
    pub step_enable_active_level: bool,
    /// Seconds of idleness after which the drivers are disabled.
    pub step_disable_secs: f32,
    /// Per-axis configuration, in the same order as every other per-axis
    /// array in this crate.
    pub axes: [AxisConfig; N],
    /// Maximum number of commands the caller's own queue should hold before
    /// applying backpressure (not enforced by this crate; carried through
    /// so the whole document round-trips).
    pub cmd_queue_max_len: u32,
}

impl<const N: usize> MotionConfig<N> {
    /// Validates the document. Checked once at setup, never on the hot
    /// path.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (i, axis) in self.axes.iter().enumerate() {
            axis.validate(i)?;
        }
        Ok(())
    }
}

/// An opaque pin identifier. This crate never drives GPIO directly — the
/// actual pin type (a name, a number, a HAL handle) is the caller's
/// concern — so this is carried as a small fixed-capacity string to keep
/// the config type `no_std`-friendly while still round-tripping through
/// `serde`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct AxisPin {
    bytes: [u8; 8],
    len: u8,
}

impl AxisPin {
    pub fn new(name: &str) -> Self {
        let mut bytes = [0u8; 8];
        let n = name.len().min(8);
        bytes[..n].copy_from_slice(&name.as_bytes()[..n]);
        Self { bytes, len: n as u8 }
    }

    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or("")
    }
}

/// Per-axis physical and kinematic limits.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct AxisConfig {
    pub max_speed: f32,
    pub max_acc: f32,
    pub steps_per_rotation: u32,
    pub units_per_rotation: f32,
    pub min_val: Option<f32>,
    pub max_val: Option<f32>,
    pub home_offset_val: f32,
    pub home_offset_steps: i32,
}

impl AxisConfig {
    /// Steps per user-facing unit, derived from `steps_per_rotation` and
    /// `units_per_rotation` (the same derivation the original firmware's
    /// `AxisParams::stepsPerUnit()` performs).
    pub fn steps_per_unit(&self) -> f32 {
        self.steps_per_rotation as f32 / self.units_per_rotation
    }

    fn validate(&self, axis_idx: usize) -> Result<(), ConfigError> {
        if self.max_acc <= 0.0 {
            return Err(ConfigError::InvalidMaxAcc(axis_idx));
        }
        if self.max_speed <= 0.0 {
            return Err(ConfigError::InvalidMaxSpeed(axis_idx));
        }
        if self.steps_per_rotation == 0 {
            return Err(ConfigError::InvalidStepsPerRotation(axis_idx));
        }
        if self.units_per_rotation == 0.0 {
            return Err(ConfigError::InvalidUnitsPerRotation(axis_idx));
        }
        if let (Some(min), Some(max)) = (self.min_val, self.max_val) {
            if min > max {
                return Err(ConfigError::InvertedBounds(axis_idx));
            }
        }
        Ok(())
    }
}
