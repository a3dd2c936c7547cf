//! Error types for the motion planning crate.

use thiserror::Error;

/// Errors that can occur while planning a move or operating the pipeline.
///
/// A zero-length move is *not* an error — see [`crate::planner::MoveOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlannerError {
    /// The kinematics hook rejected the target as outside machine bounds.
    #[error("move target is out of machine bounds")]
    OutOfBounds,
    /// The pipeline has no free slot for another block.
    #[error("motion pipeline is full")]
    PipelineFull,
    /// The caller-supplied forward transform failed for a reason other than
    /// an out-of-bounds target (e.g. a singular kinematics solution).
    #[error("kinematics transform failed")]
    TransformFailed,
}

/// Errors raised while validating a [`crate::config::MotionConfig`] at setup
/// time. Never raised from the planner or actuator hot paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An axis's `max_acc` must be strictly positive.
    #[error("axis {0} has non-positive max_acc")]
    InvalidMaxAcc(usize),
    /// An axis's `max_speed` must be strictly positive.
    #[error("axis {0} has non-positive max_speed")]
    InvalidMaxSpeed(usize),
    /// `steps_per_rotation` must be nonzero or `stepsPerUnit()` divides by zero.
    #[error("axis {0} has zero steps_per_rotation")]
    InvalidStepsPerRotation(usize),
    /// `units_per_rotation` must be nonzero for the same reason.
    #[error("axis {0} has zero units_per_rotation")]
    InvalidUnitsPerRotation(usize),
    /// `min_val` must not exceed `max_val` when both are set.
    #[error("axis {0} has min_val greater than max_val")]
    InvertedBounds(usize),
}
