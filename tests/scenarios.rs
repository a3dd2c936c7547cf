//! End-to-end scenarios against the public `MotionPlanner`/`MotionActuator`
//! API, using a 2-axis XY machine: `maxSpeed=100 units/s`,
//! `maxAcc=100 units/s^2`, `stepsPerRotation=3200`, `unitsPerRotation=60`
//! (`stepsPerUnit ~= 53.333`).

use motion_core::actuator::{AxisPinState, MotionActuator, TickOutcome};
use motion_core::axis::AxisFloats;
use motion_core::config::AxisConfig;
use motion_core::kinematics::IdentityKinematics;
use motion_core::planner::{MotionPlanner, MoveOutcome, RobotCommandArgs};

const PIPE_CAP: usize = 101;

fn xy_axis() -> AxisConfig {
    AxisConfig {
        max_speed: 100.0,
        max_acc: 100.0,
        steps_per_rotation: 3200,
        units_per_rotation: 60.0,
        min_val: Some(-10_000.0),
        max_val: Some(10_000.0),
        home_offset_val: 0.0,
        home_offset_steps: 0,
    }
}

fn xy_planner() -> MotionPlanner<IdentityKinematics, PIPE_CAP, 2> {
    MotionPlanner::new(IdentityKinematics, [xy_axis(), xy_axis()])
}

#[test]
fn single_diagonal_move_matches_expected_trapezoid() {
    let mut planner = xy_planner();
    let outcome = planner
        .move_to(&RobotCommandArgs::new(AxisFloats::new([50.0, 50.0])))
        .unwrap();
    assert_eq!(outcome, MoveOutcome::Moved);

    let block = planner.pipeline().peek(0).unwrap();
    assert_eq!(block.axis_steps_to_target.get(0), 2667);
    assert_eq!(block.axis_steps_to_target.get(1), 2667);
    assert!((block.move_dist_primary_axes_mm - 70.71).abs() < 0.1);
    assert_eq!(block.entry_speed_mm_per_s, 0.0);
    assert_eq!(block.exit_speed_mm_per_s, 0.0);

    let x = block.axis_step_data[0];
    assert_eq!(x.steps_in_plateau_phase, 0);
    assert!((x.steps_in_acc_phase as i32 - 1334).abs() <= 2);
    assert!((x.steps_in_decel_phase as i32 - 1334).abs() <= 2);
}

#[test]
fn long_straight_move_reaches_plateau() {
    let mut planner = xy_planner();
    planner
        .move_to(&RobotCommandArgs::new(AxisFloats::new([500.0, 0.0])))
        .unwrap();

    let block = planner.pipeline().peek(0).unwrap();
    assert_eq!(block.axis_steps_to_target.get(1), 0);
    let x = block.axis_step_data[0];
    assert!((x.steps_in_acc_phase as i32 - 2667).abs() <= 3);
    assert!((x.steps_in_plateau_phase as i32 - 21333).abs() <= 5);
    assert!((x.steps_in_decel_phase as i32 - 2667).abs() <= 3);
}

#[test]
fn collinear_moves_cruise_through_the_junction() {
    let mut planner = xy_planner();
    planner
        .move_to(&RobotCommandArgs::new(AxisFloats::new([50.0, 0.0])))
        .unwrap();
    planner
        .move_to(&RobotCommandArgs::new(AxisFloats::new([150.0, 0.0])))
        .unwrap();

    let first = planner.pipeline().peek(0).unwrap();
    assert!((first.exit_speed_mm_per_s - 100.0).abs() < 1.0);
    let second = planner.pipeline().peek(1).unwrap();
    assert!((second.entry_speed_mm_per_s - 100.0).abs() < 1.0);
}

#[test]
fn orthogonal_turn_forces_a_full_stop_at_the_junction() {
    let mut planner = xy_planner();
    planner
        .move_to(&RobotCommandArgs::new(AxisFloats::new([50.0, 0.0])))
        .unwrap();
    planner
        .move_to(&RobotCommandArgs::new(AxisFloats::new([50.0, 50.0])))
        .unwrap();

    let first = planner.pipeline().peek(0).unwrap();
    assert_eq!(first.exit_speed_mm_per_s, 0.0);
    let second = planner.pipeline().peek(1).unwrap();
    assert_eq!(second.max_entry_speed_mm_per_s, 0.0);
}

#[test]
fn pipeline_fills_and_the_101st_push_is_rejected() {
    let mut planner = xy_planner();
    for i in 1..=100 {
        let outcome = planner
            .move_to(&RobotCommandArgs::new(AxisFloats::new([i as f32, 0.0])))
            .unwrap();
        assert_eq!(outcome, MoveOutcome::Moved);
    }
    let result = planner.move_to(&RobotCommandArgs::new(AxisFloats::new([200.0, 0.0])));
    assert!(result.is_err());
}

#[test]
fn actuator_emits_exactly_the_planned_step_counts() {
    let mut planner = xy_planner();
    planner
        .move_to(&RobotCommandArgs::new(AxisFloats::new([50.0, 50.0])))
        .unwrap();

    let expected_x = planner.pipeline().peek(0).unwrap().axis_steps_to_target.get(0);
    let expected_y = planner.pipeline().peek(0).unwrap().axis_steps_to_target.get(1);

    let mut actuator: MotionActuator<2> = MotionActuator::new();
    let mut pins = [AxisPinState { set_direction: None, step_pin: None }; 2];
    let mut rising_edges = [0u32; 2];
    let mut last_direction = [None; 2];

    loop {
        let outcome = actuator.tick(planner.pipeline_mut(), &mut pins);
        for axis in 0..2 {
            if let Some(dir) = pins[axis].set_direction {
                last_direction[axis] = Some(dir);
            }
            if pins[axis].step_pin == Some(true) {
                rising_edges[axis] += 1;
            }
        }
        if outcome == TickOutcome::BlockComplete {
            break;
        }
        if outcome == TickOutcome::Idle && planner.pipeline().is_empty() {
            break;
        }
    }

    assert_eq!(rising_edges[0], expected_x as u32);
    assert_eq!(rising_edges[1], expected_y as u32);
    assert_eq!(last_direction[0], Some(true));
    assert_eq!(last_direction[1], Some(true));
}

#[test]
fn zero_length_move_is_a_no_op() {
    let mut planner = xy_planner();
    let outcome = planner
        .move_to(&RobotCommandArgs::new(AxisFloats::new([0.0, 0.0])))
        .unwrap();
    assert_eq!(outcome, MoveOutcome::ZeroLength);
    assert_eq!(planner.pipeline().len(), 0);
}
