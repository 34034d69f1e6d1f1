#![no_std]
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod device;
pub mod filter;
pub mod force;
pub mod interface;
pub mod sampler;
pub mod scale;

// Re-export main types
pub use device::{AxisMask, DeviceState, Mlx90393Driver, RawSample};
pub use filter::ExpSmoother;
pub use force::{fit_force, ForceCalibration, LinearFit};
pub use interface::I2cInterface;
pub use sampler::SampleLoop;
pub use scale::{lsb_per_count, AxisClass, Gain, HallConf, MeasurementConfig, Resolution};

/// MLX90393 I2C address with A0 and A1 tied low (default: 0x0C)
///
/// This is the most common breakout-board configuration. Use
/// [`I2cInterface::default()`] for this address, or [`I2cInterface::new()`]
/// when the address pins are strapped differently.
pub const I2C_ADDRESS: u8 = 0x0C;

/// Driver errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Communication error with the device (bus write or read did not complete)
    Bus(E),
    /// The status byte returned by the device did not carry the expected
    /// code for the command issued (contains the raw status byte)
    UnexpectedStatus(u8),
    /// A field read was attempted before the device reached [`DeviceState::Ready`]
    NotInitialized,
}

impl<E> From<E> for Error<E> {
    fn from(error: E) -> Self {
        Self::Bus(error)
    }
}
