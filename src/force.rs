//! Field-to-force calibration math
//!
//! The desktop calibration tool regresses streamed field readings against
//! known reference weights; the resulting `(slope, intercept)` pair maps
//! millitesla to newtons. This module provides the closed-form
//! least-squares fit and the real-time replay of a finished fit. The
//! device never stores these constants; they live with whatever host
//! process consumes the stream.

/// Result of a least-squares line fit of force against field
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinearFit {
    /// Newtons per millitesla
    pub slope: f32,
    /// Newtons at zero field
    pub intercept: f32,
    /// Coefficient of determination of the fit, in `[0, 1]` for
    /// well-behaved data
    pub r_squared: f32,
}

/// Fit `force = slope * field + intercept` over `(field_mt, force_n)` pairs
///
/// Closed-form least squares. Returns `None` for fewer than two points or
/// when every field value is identical (the slope would be undefined).
/// `r_squared` is `1 - ss_res / ss_tot`, reported as 0 when the force
/// values carry no variance.
#[must_use]
pub fn fit_force(points: &[(f32, f32)]) -> Option<LinearFit> {
    if points.len() < 2 {
        return None;
    }

    let n = points.len() as f32;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    for &(x, y) in points {
        sum_x += x;
        sum_y += y;
    }
    let mean_x = sum_x / n;
    let mean_y = sum_y / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for &(x, y) in points {
        let dx = x - mean_x;
        sxx += dx * dx;
        sxy += dx * (y - mean_y);
    }
    if sxx == 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for &(x, y) in points {
        let residual = y - (slope * x + intercept);
        ss_res += residual * residual;
        let dy = y - mean_y;
        ss_tot += dy * dy;
    }
    let r_squared = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };

    Some(LinearFit {
        slope,
        intercept,
        r_squared,
    })
}

/// Real-time replay of a finished calibration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ForceCalibration {
    slope: f32,
    intercept: f32,
}

impl ForceCalibration {
    /// Create a calibration from known constants
    #[must_use]
    pub const fn new(slope: f32, intercept: f32) -> Self {
        Self { slope, intercept }
    }

    /// Newtons per millitesla
    #[must_use]
    pub const fn slope(&self) -> f32 {
        self.slope
    }

    /// Newtons at zero field
    #[must_use]
    pub const fn intercept(&self) -> f32 {
        self.intercept
    }

    /// Convert a field reading to force
    ///
    /// `force = slope * field + intercept`, clamped at zero like the field
    /// stream itself.
    #[must_use]
    pub fn force_newtons(&self, field_mt: f32) -> f32 {
        let force = self.slope * field_mt + self.intercept;
        if force < 0.0 {
            0.0
        } else {
            force
        }
    }
}

impl From<&LinearFit> for ForceCalibration {
    fn from(fit: &LinearFit) -> Self {
        Self::new(fit.slope, fit.intercept)
    }
}
