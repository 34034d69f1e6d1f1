//! Exponential smoothing of the field stream

/// Single-pole exponential filter over a scalar stream
///
/// `alpha` weights the history: `smoothed = sample * (1 - alpha) +
/// previous * alpha`. Alpha near 1 means heavier smoothing and slower
/// response; 0 disables smoothing. Alpha is documented as belonging to
/// `[0, 1)` but not enforced; an out-of-range value is a configuration
/// error, not a runtime fault.
///
/// The first sample passes through unchanged: there is no history to blend
/// against until one valid reading has arrived.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ExpSmoother {
    alpha: f32,
    state: Option<f32>,
}

impl ExpSmoother {
    /// Filter coefficient used by the reference force-sensing rig
    pub const DEFAULT_ALPHA: f32 = 0.4;

    /// Create a filter with the given coefficient and no history
    #[must_use]
    pub const fn new(alpha: f32) -> Self {
        Self { alpha, state: None }
    }

    /// Feed one sample, returning the new smoothed value
    ///
    /// The very first call returns exactly `sample`.
    pub fn update(&mut self, sample: f32) -> f32 {
        let smoothed = match self.state {
            None => sample,
            Some(previous) => sample * (1.0 - self.alpha) + previous * self.alpha,
        };
        self.state = Some(smoothed);
        smoothed
    }

    /// The current smoothed value, if any sample has been fed
    #[must_use]
    pub const fn value(&self) -> Option<f32> {
        self.state
    }

    /// The configured coefficient
    #[must_use]
    pub const fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Discard the history; the next sample bootstraps again
    pub fn reset(&mut self) {
        self.state = None;
    }
}

impl Default for ExpSmoother {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ALPHA)
    }
}
