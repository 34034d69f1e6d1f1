//! Raw-count to magnetic-field conversion
//!
//! The MLX90393 reports field strength as signed counts whose weight in
//! microtesla depends on the analog front-end configuration: HALLCONF,
//! gain, ADC resolution, and whether the axis is X/Y or Z. This module
//! holds the datasheet LSB lookup table, the 18/19-bit offset-binary bias
//! correction, and [`MeasurementConfig`], which turns a raw Z count into a
//! millitesla reading.

/// Hall-plate duty-cycle configuration (HALLCONF register field)
///
/// Affects the counts-to-field scale factor; selects the outer dimension of
/// the LSB lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HallConf {
    /// HALLCONF = 0xC, the power-on default
    C = 0,
    /// HALLCONF = 0x0
    Zero = 1,
}

/// Analog gain setting, trading sensitivity for range
///
/// Selects one row of the LSB lookup table. Encodings match the
/// GAIN_SEL register field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gain {
    /// 5x gain (most sensitive, smallest range)
    X5 = 0,
    /// 4x gain
    X4 = 1,
    /// 3x gain
    X3 = 2,
    /// 2.5x gain
    X2_5 = 3,
    /// 2x gain
    X2 = 4,
    /// 1.67x gain
    X1_67 = 5,
    /// 1.33x gain
    X1_33 = 6,
    /// 1x gain (least sensitive, widest range)
    X1 = 7,
}

/// ADC output resolution (RES register field)
///
/// Affects both the scale factor and, at 18/19 bits, a fixed decoding bias:
/// the device switches to an offset-binary encoding whose midpoint must be
/// subtracted before the count is meaningful as a signed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Resolution {
    /// 16-bit output
    Bits16 = 0,
    /// 17-bit output
    Bits17 = 1,
    /// 18-bit output
    Bits18 = 2,
    /// 19-bit output
    Bits19 = 3,
}

impl Resolution {
    /// Additive bias applied to a raw count before scaling
    ///
    /// Zero for 16/17-bit output. At 18 and 19 bits the wire value is
    /// offset-binary, so the midpoint (0x8000 and 0x4000 respectively) is
    /// removed with wrapping arithmetic.
    #[must_use]
    pub const fn bias(self) -> i16 {
        match self {
            Self::Bits16 | Self::Bits17 => 0,
            Self::Bits18 => i16::MIN, // -0x8000
            Self::Bits19 => -0x4000,
        }
    }
}

/// Axis grouping for the LSB lookup: the X/Y plane and the Z axis have
/// different scale factors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AxisClass {
    /// X or Y axis
    Xy = 0,
    /// Z axis
    Z = 1,
}

/// Microtesla-per-count factors, indexed \[HALLCONF\]\[gain\]\[resolution\]\[XY/Z\]
///
/// Values from the MLX90393 datasheet "Sensitivity" tables.
const LSB_LOOKUP: [[[[f32; 2]; 4]; 8]; 2] = [
    // HALLCONF = 0xC (default)
    [
        [[0.751, 1.210], [1.502, 2.420], [3.004, 4.840], [6.009, 9.680]], // gain 5x
        [[0.601, 0.968], [1.202, 1.936], [2.403, 3.872], [4.840, 7.744]], // gain 4x
        [[0.451, 0.726], [0.901, 1.452], [1.803, 2.904], [3.605, 5.808]], // gain 3x
        [[0.376, 0.605], [0.751, 1.210], [1.502, 2.420], [3.004, 4.840]], // gain 2.5x
        [[0.300, 0.484], [0.601, 0.968], [1.202, 1.936], [2.403, 3.872]], // gain 2x
        [[0.250, 0.403], [0.501, 0.807], [1.001, 1.613], [2.003, 3.227]], // gain 1.67x
        [[0.200, 0.323], [0.401, 0.645], [0.801, 1.291], [1.602, 2.581]], // gain 1.33x
        [[0.150, 0.242], [0.300, 0.484], [0.601, 0.968], [1.202, 1.936]], // gain 1x
    ],
    // HALLCONF = 0x0
    [
        [[0.787, 1.267], [1.573, 2.534], [3.146, 5.068], [6.292, 10.137]],
        [[0.629, 1.014], [1.258, 2.027], [2.517, 4.055], [5.034, 8.109]],
        [[0.472, 0.760], [0.944, 1.521], [1.888, 3.041], [3.775, 6.082]],
        [[0.393, 0.634], [0.787, 1.267], [1.573, 2.534], [3.146, 5.068]],
        [[0.315, 0.507], [0.629, 1.014], [1.258, 2.027], [2.517, 4.055]],
        [[0.262, 0.422], [0.524, 0.845], [1.049, 1.689], [2.097, 3.379]],
        [[0.210, 0.338], [0.419, 0.676], [0.839, 1.352], [1.678, 2.703]],
        [[0.157, 0.253], [0.315, 0.507], [0.629, 1.014], [1.258, 2.027]],
    ],
];

/// Look up the microtesla-per-count factor for a configuration
///
/// Pure and infallible: the exhaustive enums make an out-of-range index
/// unrepresentable.
#[must_use]
pub const fn lsb_per_count(
    hallconf: HallConf,
    gain: Gain,
    resolution: Resolution,
    axis: AxisClass,
) -> f32 {
    LSB_LOOKUP[hallconf as usize][gain as usize][resolution as usize][axis as usize]
}

/// Field conversion configuration
///
/// Config-time constants: the gain/resolution selection must match what the
/// device is actually programmed with, and `z_offset_mt` shifts the reading
/// so the steady-state stream stays non-negative.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MeasurementConfig {
    /// Hall-plate configuration
    pub hallconf: HallConf,
    /// Analog gain
    pub gain: Gain,
    /// ADC resolution for the Z axis
    pub resolution: Resolution,
    /// Additive offset in millitesla applied after scaling
    pub z_offset_mt: f32,
}

impl Default for MeasurementConfig {
    fn default() -> Self {
        Self {
            hallconf: HallConf::C,
            gain: Gain::X1,
            resolution: Resolution::Bits16,
            z_offset_mt: 20.0,
        }
    }
}

impl MeasurementConfig {
    /// Convert a raw Z-axis count to millitesla
    ///
    /// Applies the resolution bias, the LSB scale factor, the µT→mT
    /// division, and the configured offset. The result is clamped at zero:
    /// the streamed text stays representable as an unsigned value, which is
    /// a display convention, not a physical law.
    #[must_use]
    pub fn convert_z(&self, raw: i16) -> f32 {
        let corrected = raw.wrapping_add(self.resolution.bias());
        let z_ut =
            f32::from(corrected) * lsb_per_count(self.hallconf, self.gain, self.resolution, AxisClass::Z);
        let z_mt = z_ut / 1000.0 + self.z_offset_mt;
        if z_mt < 0.0 {
            0.0
        } else {
            z_mt
        }
    }
}
