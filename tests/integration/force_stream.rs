//! Integration tests for the full acquire/smooth/stream/calibrate flow

use crate::common::test_utils::{create_mock_driver, MockDelay, MockPin};
use mlx90393_force::{
    fit_force, ExpSmoother, ForceCalibration, Mlx90393Driver, SampleLoop,
};

#[test]
fn test_known_bytes_end_to_end() {
    // Gain 1x, 16-bit, HALLCONF 0xC, raw Z bytes [0x00, 0x64] = 100 counts,
    // +20 mT offset: 100 * 0.242 / 1000 + 20.0 = 20.0242 mT
    let (mut driver, bus) = create_mock_driver();
    driver.init(&mut MockDelay).unwrap();
    bus.set_z_bytes(0x00, 0x64);

    let mut stream = SampleLoop::new(driver, MockPin::new(), String::new());
    stream.run_cycle(&mut MockDelay);

    let smoothed = stream.smoothed().unwrap();
    assert!((smoothed - 20.0242).abs() < 1e-4);

    let (_, _, out) = stream.release();
    assert_eq!(out, "Z-axis(M1): 20.024 mT\n");
}

#[test]
fn test_bus_failure_emits_marker_and_keeps_liveness() {
    let (mut driver, bus) = create_mock_driver();
    driver.init(&mut MockDelay).unwrap();
    bus.set_z_raw(100);

    let pin = MockPin::new();
    let mut stream = SampleLoop::new(driver, pin.clone(), String::new());

    stream.run_cycle(&mut MockDelay);
    bus.fail_next_write();
    stream.run_cycle(&mut MockDelay);
    stream.run_cycle(&mut MockDelay);

    let (_, _, out) = stream.release();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "Z-axis(M1): 20.024 mT");
    assert_eq!(lines[1], "Z-axis(M1): ERROR");
    assert_eq!(lines[2], "Z-axis(M1): 20.024 mT");

    // The loop never wedged: three toggles for three cycles
    assert_eq!(pin.levels(), vec![true, false, true]);
}

#[test]
fn test_stream_converges_then_calibrates() {
    let (mut driver, bus) = create_mock_driver();
    driver.init(&mut MockDelay).unwrap();

    let mut stream = SampleLoop::new(driver, MockPin::new(), String::new())
        .with_filter(ExpSmoother::new(0.4));

    // Hold each known load long enough for the filter to settle, then
    // record (field, force) pairs the way the desktop tool does
    let loads: [(i16, f32); 4] = [(500, 0.0), (1500, 12.3), (3000, 30.7), (6000, 67.5)];
    let mut points = Vec::new();
    for (raw, force) in loads {
        bus.set_z_raw(raw);
        for _ in 0..100 {
            stream.run_cycle(&mut MockDelay);
        }
        points.push((stream.smoothed().unwrap(), force));
    }

    let fit = fit_force(&points).unwrap();
    assert!(fit.r_squared > 0.99);

    // Replaying the fit reproduces the heaviest load closely
    let cal = ForceCalibration::from(&fit);
    assert!((cal.force_newtons(points[3].0) - 67.5).abs() < 1.5);
}

#[test]
fn test_loop_survives_unplugged_sensor() {
    // Init fails outright (wiring fault); the loop must keep running and
    // keep saying so rather than crash or invent readings
    let (mut driver, bus) = create_mock_driver();
    bus.fail_next_write();
    assert!(driver.init(&mut MockDelay).is_err());

    let mut stream = SampleLoop::new(driver, MockPin::new(), String::new());
    for _ in 0..3 {
        stream.run_cycle(&mut MockDelay);
    }
    assert_eq!(stream.smoothed(), None);

    let (_, _, out) = stream.release();
    assert_eq!(out.lines().count(), 3);
    assert!(out.lines().all(|l| l == "Sensor not initialized"));
}

#[test]
fn test_recovery_after_rewiring() {
    let (mut driver, bus) = create_mock_driver();
    bus.set_exit_status(0x10);
    assert!(driver.init(&mut MockDelay).is_err());

    let mut stream = SampleLoop::new(driver, MockPin::new(), String::new());
    stream.run_cycle(&mut MockDelay);

    // Operator fixes the fault and re-runs init through the loop
    bus.set_exit_status(0x00);
    bus.set_z_raw(100);
    stream.driver_mut().init(&mut MockDelay).unwrap();
    stream.run_cycle(&mut MockDelay);

    let (_, _, out) = stream.release();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "Sensor not initialized");
    assert_eq!(lines[1], "Z-axis(M1): 20.024 mT");
}

#[test]
fn test_driver_release_returns_bus() {
    let (driver, _bus) = create_mock_driver();
    let bus = Mlx90393Driver::release(driver);
    // The interface comes back intact for reuse
    drop(bus);
}
