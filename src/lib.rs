//! # motion-core
//!
//! A deterministic look-ahead motion planner and tick-driven step actuator
//! for multi-axis CNC/robot firmware, usable on both host and MCU
//! (`no_std`-friendly).
//!
//! Provides the core motion pipeline:
//! - A bounded look-ahead queue of planned moves ([`pipeline::MotionPipeline`])
//! - Per-block trapezoidal (accel/plateau/decel) step scheduling ([`block`])
//! - A tick-driven per-axis step/direction pulse generator ([`actuator`])
//! - A caller-supplied kinematics hook contract ([`kinematics`])
//!
//! Concrete kinematics models, GCode parsing, GPIO/endstop drivers and
//! config-file parsing are outside this crate's scope — see each module's
//! doc comment for exactly where the boundary sits.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod actuator;
pub mod axis;
pub mod block;
pub mod config;
pub mod error;
pub mod kinematics;
pub mod pipeline;
pub mod planner;
pub mod ring;

pub use actuator::{MotionActuator, TickOutcome};
pub use axis::{AxisFloats, AxisInt32s};
pub use block::MotionBlock;
pub use config::{AxisConfig, MotionConfig};
pub use error::{ConfigError, PlannerError};
pub use kinematics::Kinematics;
pub use pipeline::MotionPipeline;
pub use planner::{EndstopMode, MotionPlanner, MoveOutcome, RobotCommandArgs};
