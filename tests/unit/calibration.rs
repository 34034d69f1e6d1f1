//! Unit tests for the field-to-force calibration math

use crate::common::test_utils::assert_float_eq;
use mlx90393_force::{fit_force, ForceCalibration};

const KG_TO_NEWTONS: f32 = 9.80665;

#[test]
fn test_fit_recovers_rig_like_mapping() {
    // Readings shaped like the reference rig: ~52 N/mT with a large
    // negative intercept from the 20 mT standing offset
    let slope = 51.94;
    let intercept = -692.99;
    let points: Vec<(f32, f32)> = [0.5, 1.0, 2.0, 5.0, 10.0]
        .iter()
        .map(|kg| {
            let force = kg * KG_TO_NEWTONS;
            let field = (force - intercept) / slope;
            (field, force)
        })
        .collect();

    let fit = fit_force(&points).unwrap();
    assert_float_eq(fit.slope, slope, 1e-2);
    assert_float_eq(fit.intercept, intercept, 1e-1);
    assert!(fit.r_squared > 0.999);
}

#[test]
fn test_fit_then_replay_round_trip() {
    let points = [(13.4, 4.9), (14.1, 41.2), (15.3, 103.0), (16.9, 186.4)];
    let fit = fit_force(&points).unwrap();
    let cal = ForceCalibration::from(&fit);

    for &(field, force) in &points {
        // Imperfect data, so allow the residual of the fit itself
        assert!((cal.force_newtons(field) - force).abs() < 5.0);
    }
}

#[test]
fn test_replay_never_reports_negative_force() {
    let cal = ForceCalibration::new(51.94, -692.99);
    // Unloaded rig sits near the standing offset, below the zero crossing
    assert_eq!(cal.force_newtons(12.0), 0.0);
    assert_eq!(cal.force_newtons(0.0), 0.0);
    assert!(cal.force_newtons(14.0) > 0.0);
}
