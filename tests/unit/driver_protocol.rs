//! Unit tests for the command protocol and startup state machine

use crate::common::test_utils::{create_mock_driver, create_ready_driver, MockDelay};
use mlx90393_force::device::{CMD_EXIT_MODE, CMD_RESET};
use mlx90393_force::{AxisMask, DeviceState, Error};

#[test]
fn test_startup_sequence_reaches_ready() {
    let (mut driver, bus) = create_mock_driver();
    assert_eq!(driver.state(), DeviceState::Uninitialized);

    driver.init(&mut MockDelay).unwrap();
    assert_eq!(driver.state(), DeviceState::Ready);

    // Exactly exit-mode then reset, in that order
    assert_eq!(bus.writes(), vec![vec![CMD_EXIT_MODE], vec![CMD_RESET]]);
}

#[test]
fn test_exit_mode_rejects_nonzero_status_nibble() {
    let (mut driver, bus) = create_mock_driver();
    bus.set_exit_status(0x10); // nibble 0x04

    let result = driver.exit_mode(&mut MockDelay);
    assert_eq!(result, Err(Error::UnexpectedStatus(0x10)));
    assert_eq!(driver.state(), DeviceState::Faulted);
}

#[test]
fn test_reset_expects_distinct_status_nibble() {
    let (mut driver, bus) = create_mock_driver();
    // The idle no-error code is wrong after a reset
    bus.set_reset_status(0x00);

    driver.exit_mode(&mut MockDelay).unwrap();
    let result = driver.reset(&mut MockDelay);
    assert_eq!(result, Err(Error::UnexpectedStatus(0x00)));
    assert_eq!(driver.state(), DeviceState::Faulted);
}

#[test]
fn test_init_aborts_remaining_steps_on_failure() {
    let (mut driver, bus) = create_mock_driver();
    bus.set_exit_status(0x10);

    assert!(driver.init(&mut MockDelay).is_err());
    assert_eq!(driver.state(), DeviceState::Faulted);
    // Only the exit-mode command went out; reset was never attempted
    assert_eq!(bus.writes(), vec![vec![CMD_EXIT_MODE]]);
}

#[test]
fn test_start_measurement_accepts_both_success_codes() {
    let (mut driver, bus) = create_ready_driver();

    bus.set_start_status(0x00); // idle, no error
    assert!(driver.start_measurement(AxisMask::ALL, &mut MockDelay).is_ok());

    bus.set_start_status(0x20); // nibble 0x08: measurement in progress
    assert!(driver.start_measurement(AxisMask::ALL, &mut MockDelay).is_ok());
}

#[test]
fn test_start_measurement_rejects_other_nibbles() {
    let (mut driver, bus) = create_ready_driver();
    bus.set_start_status(0x04); // nibble 0x01: reset code, wrong here

    let result = driver.start_measurement(AxisMask::ALL, &mut MockDelay);
    assert_eq!(result, Err(Error::UnexpectedStatus(0x04)));
}

#[test]
fn test_start_measurement_encodes_axis_mask() {
    let (mut driver, bus) = create_ready_driver();
    driver.start_measurement(AxisMask::ALL, &mut MockDelay).unwrap();
    assert_eq!(bus.writes(), vec![vec![0x3E]]);
}

#[test]
fn test_read_raw_decodes_big_endian_words() {
    let (mut driver, bus) = create_ready_driver();
    bus.set_raw_data(0x0102, -2, 100);

    let sample = driver.read_raw(AxisMask::ALL, &mut MockDelay).unwrap();
    assert_eq!(sample.x, 0x0102);
    assert_eq!(sample.y, -2);
    assert_eq!(sample.z, 100);
    assert_eq!(bus.writes(), vec![vec![0x4E]]);
}

#[test]
fn test_read_raw_single_axis_subset() {
    let (mut driver, bus) = create_ready_driver();
    bus.set_raw_data(111, 222, -333);

    let sample = driver.read_raw(AxisMask::Z, &mut MockDelay).unwrap();
    assert_eq!(sample.x, 0);
    assert_eq!(sample.y, 0);
    assert_eq!(sample.z, -333);
    assert_eq!(bus.writes(), vec![vec![0x48]]);
}

#[test]
fn test_read_raw_rejects_error_status() {
    let (mut driver, bus) = create_ready_driver();
    bus.set_read_status(0x10);

    let result = driver.read_raw(AxisMask::ALL, &mut MockDelay);
    assert_eq!(result, Err(Error::UnexpectedStatus(0x10)));
}

#[test]
fn test_read_field_requires_ready_state() {
    let (mut driver, bus) = create_mock_driver();

    let result = driver.read_field(&mut MockDelay);
    assert_eq!(result, Err(Error::NotInitialized));
    // No bus traffic before init
    assert!(bus.writes().is_empty());
}

#[test]
fn test_read_field_runs_two_phase_protocol() {
    let (mut driver, bus) = create_ready_driver();
    bus.set_z_raw(100);

    let field = driver.read_field(&mut MockDelay).unwrap();
    // 100 counts * 0.242 uT/LSB -> 0.0242 mT, plus the 20 mT offset
    assert!((field - 20.0242).abs() < 1e-4);
    // Start (SM | 0x0E) then read (RM | 0x0E)
    assert_eq!(bus.writes(), vec![vec![0x3E], vec![0x4E]]);
}
