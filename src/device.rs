//! High-level driver API for the MLX90393
//!
//! Implements the single-measurement command protocol: exit mode, reset,
//! start measurement, read measurement. The driver owns the bus interface
//! and a [`MeasurementConfig`]; delays are provided by the caller through
//! `embedded_hal::delay::DelayNs`, matching the datasheet settle times.
//!
//! Startup is strictly sequential:
//! `Uninitialized -> ExitedMode -> Reset -> Ready`, with any transceive
//! failure or unexpected status byte moving the driver to
//! [`DeviceState::Faulted`]. The driver never retries internally; recovery
//! is the caller's job via a fresh [`Mlx90393Driver::init`].

use crate::scale::MeasurementConfig;
use crate::Error;

#[cfg(feature = "async")]
use crate::interface::AsyncCommandInterface;
#[cfg(not(feature = "async"))]
use crate::interface::CommandInterface;

/// Exit mode command byte (EX)
pub const CMD_EXIT_MODE: u8 = 0x80;
/// Reset command byte (RT)
pub const CMD_RESET: u8 = 0xF0;
/// Start single measurement command byte (SM); OR with an [`AxisMask`]
pub const CMD_START_MEASUREMENT: u8 = 0x30;
/// Read measurement command byte (RM); OR with an [`AxisMask`]
pub const CMD_READ_MEASUREMENT: u8 = 0x40;

/// Status nibble reported when the device is idle with no error
pub const STATUS_NIBBLE_OK: u8 = 0x00;
/// Status nibble reported after a reset
pub const STATUS_NIBBLE_RESET: u8 = 0x01;
/// Status nibble reported while a single measurement is in progress
///
/// `start_measurement` treats this and [`STATUS_NIBBLE_OK`] as equivalent
/// acceptance of the trigger; whether the distinction matters for
/// downstream timing is unresolved in the original rig and preserved as-is.
pub const STATUS_NIBBLE_SM_ACTIVE: u8 = 0x08;

/// Extract the status nibble (the bits above the two lowest status bits)
#[must_use]
pub const fn status_nibble(status: u8) -> u8 {
    status >> 2
}

// Datasheet-driven settle times. The device is not ready to answer
// immediately after a command write, nor ready to be read immediately
// after a measurement trigger.
const INTER_PHASE_DELAY_MS: u32 = 10;
const RESET_SETTLE_MS: u32 = 5;
const POST_RESET_SETTLE_MS: u32 = 10;
const CONVERSION_DELAY_MS: u32 = 10;

/// Axis selection bits for the SM/RM commands
///
/// Bit 1 = X, bit 2 = Y, bit 3 = Z (bit 0 selects temperature, which this
/// driver does not request).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisMask(u8);

impl AxisMask {
    /// X axis only
    pub const X: Self = Self(0x02);
    /// Y axis only
    pub const Y: Self = Self(0x04);
    /// Z axis only
    pub const Z: Self = Self(0x08);
    /// All three magnetic axes
    pub const ALL: Self = Self(0x0E);

    /// Raw command bits
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Number of selected axes (two response bytes each)
    #[must_use]
    pub const fn count(self) -> usize {
        self.0.count_ones() as usize
    }

    const fn contains(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

/// Driver state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceState {
    /// No commands issued yet
    Uninitialized,
    /// Exit-mode command accepted
    ExitedMode,
    /// Reset command accepted, settle pending or complete
    Reset,
    /// Startup sequence complete; measurements may be read
    Ready,
    /// A startup step failed; re-run `init` to recover
    Faulted,
}

/// Raw measurement data (signed 16-bit counts, one word per axis)
///
/// Axes that were not requested read as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSample {
    /// X-axis field (raw counts)
    pub x: i16,
    /// Y-axis field (raw counts)
    pub y: i16,
    /// Z-axis field (raw counts)
    pub z: i16,
}

/// Main driver for the MLX90393
pub struct Mlx90393Driver<I> {
    interface: I,
    config: MeasurementConfig,
    state: DeviceState,
}

impl<I> Mlx90393Driver<I> {
    /// Create a new driver with the default [`MeasurementConfig`]
    ///
    /// No bus traffic happens here; call [`init`](Self::init) to run the
    /// startup sequence.
    pub fn new(interface: I) -> Self {
        Self::with_config(interface, MeasurementConfig::default())
    }

    /// Create a new driver with an explicit conversion configuration
    pub fn with_config(interface: I, config: MeasurementConfig) -> Self {
        Self {
            interface,
            config,
            state: DeviceState::Uninitialized,
        }
    }

    /// Current state of the startup state machine
    #[must_use]
    pub fn state(&self) -> DeviceState {
        self.state
    }

    /// The conversion configuration in use
    #[must_use]
    pub fn config(&self) -> &MeasurementConfig {
        &self.config
    }

    /// Consume the driver and return the bus interface
    pub fn release(self) -> I {
        self.interface
    }

    fn decode(frame: &[u8], axes: AxisMask) -> RawSample {
        let mut sample = RawSample { x: 0, y: 0, z: 0 };
        // Data words follow the status byte in X, Y, Z order for whichever
        // axes were requested, each big-endian.
        let mut at = 1;
        if axes.contains(AxisMask::X) {
            sample.x = i16::from_be_bytes([frame[at], frame[at + 1]]);
            at += 2;
        }
        if axes.contains(AxisMask::Y) {
            sample.y = i16::from_be_bytes([frame[at], frame[at + 1]]);
            at += 2;
        }
        if axes.contains(AxisMask::Z) {
            sample.z = i16::from_be_bytes([frame[at], frame[at + 1]]);
        }
        sample
    }
}

#[cfg(not(feature = "async"))]
impl<I> Mlx90393Driver<I>
where
    I: CommandInterface,
{
    /// Write a command, wait the inter-phase delay, read the response
    fn transceive<D>(&mut self, tx: &[u8], rx: &mut [u8], delay: &mut D) -> Result<(), Error<I::Error>>
    where
        D: embedded_hal::delay::DelayNs,
    {
        self.interface.write_command(tx)?;
        delay.delay_ms(INTER_PHASE_DELAY_MS);
        self.interface.read_response(rx)?;
        Ok(())
    }

    /// Run the full startup sequence: exit mode, reset, settle
    ///
    /// On success the driver is [`DeviceState::Ready`]. On failure the
    /// remaining steps are skipped, the state is [`DeviceState::Faulted`],
    /// and the error is returned; calling `init` again re-runs the whole
    /// sequence from scratch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] if a transceive fails, or
    /// [`Error::UnexpectedStatus`] if a status byte mismatches.
    pub fn init<D>(&mut self, delay: &mut D) -> Result<(), Error<I::Error>>
    where
        D: embedded_hal::delay::DelayNs,
    {
        self.exit_mode(delay)?;
        self.reset(delay)?;
        delay.delay_ms(POST_RESET_SETTLE_MS);
        self.state = DeviceState::Ready;
        Ok(())
    }

    /// Send the exit-mode command (EX)
    ///
    /// Expects the no-error status nibble.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] or [`Error::UnexpectedStatus`]; either one
    /// also moves the driver to [`DeviceState::Faulted`].
    pub fn exit_mode<D>(&mut self, delay: &mut D) -> Result<(), Error<I::Error>>
    where
        D: embedded_hal::delay::DelayNs,
    {
        let mut rx = [0u8; 1];
        if let Err(e) = self.transceive(&[CMD_EXIT_MODE], &mut rx, delay) {
            self.state = DeviceState::Faulted;
            return Err(e);
        }
        if status_nibble(rx[0]) != STATUS_NIBBLE_OK {
            self.state = DeviceState::Faulted;
            return Err(Error::UnexpectedStatus(rx[0]));
        }
        self.state = DeviceState::ExitedMode;
        Ok(())
    }

    /// Send the reset command (RT) and wait the post-reset settle time
    ///
    /// The device reports a distinct status nibble after a reset, not the
    /// idle no-error code.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] or [`Error::UnexpectedStatus`]; either one
    /// also moves the driver to [`DeviceState::Faulted`].
    pub fn reset<D>(&mut self, delay: &mut D) -> Result<(), Error<I::Error>>
    where
        D: embedded_hal::delay::DelayNs,
    {
        let mut rx = [0u8; 1];
        if let Err(e) = self.transceive(&[CMD_RESET], &mut rx, delay) {
            self.state = DeviceState::Faulted;
            return Err(e);
        }
        delay.delay_ms(RESET_SETTLE_MS);
        if status_nibble(rx[0]) != STATUS_NIBBLE_RESET {
            self.state = DeviceState::Faulted;
            return Err(Error::UnexpectedStatus(rx[0]));
        }
        self.state = DeviceState::Reset;
        Ok(())
    }

    /// Trigger a single measurement (SM) on the selected axes
    ///
    /// Both the idle and the measurement-in-progress status nibbles count
    /// as acceptance of the trigger.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] or [`Error::UnexpectedStatus`].
    pub fn start_measurement<D>(&mut self, axes: AxisMask, delay: &mut D) -> Result<(), Error<I::Error>>
    where
        D: embedded_hal::delay::DelayNs,
    {
        let mut rx = [0u8; 1];
        self.transceive(&[CMD_START_MEASUREMENT | axes.bits()], &mut rx, delay)?;
        match status_nibble(rx[0]) {
            STATUS_NIBBLE_OK | STATUS_NIBBLE_SM_ACTIVE => Ok(()),
            _ => Err(Error::UnexpectedStatus(rx[0])),
        }
    }

    /// Read a completed measurement (RM) on the selected axes
    ///
    /// Reads one status byte plus two bytes per requested axis and decodes
    /// each word as big-endian signed 16-bit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] or, for a non-zero status nibble,
    /// [`Error::UnexpectedStatus`].
    pub fn read_raw<D>(&mut self, axes: AxisMask, delay: &mut D) -> Result<RawSample, Error<I::Error>>
    where
        D: embedded_hal::delay::DelayNs,
    {
        let mut rx = [0u8; 7];
        let frame = &mut rx[..1 + 2 * axes.count()];
        self.transceive(&[CMD_READ_MEASUREMENT | axes.bits()], frame, delay)?;
        if status_nibble(frame[0]) != STATUS_NIBBLE_OK {
            return Err(Error::UnexpectedStatus(frame[0]));
        }
        Ok(Self::decode(frame, axes))
    }

    /// Acquire one smoothing-ready Z-axis field sample in millitesla
    ///
    /// Composes `start_measurement`, the fixed conversion delay, and
    /// `read_raw`, then converts the Z count through the configured scale,
    /// offset, and clamp. The two-phase protocol is mandatory: the device
    /// is not ready for a read immediately after the trigger.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] unless the driver is
    /// [`DeviceState::Ready`], otherwise any error from the two protocol
    /// steps. No step is retried and no value is fabricated on failure.
    pub fn read_field<D>(&mut self, delay: &mut D) -> Result<f32, Error<I::Error>>
    where
        D: embedded_hal::delay::DelayNs,
    {
        if self.state != DeviceState::Ready {
            return Err(Error::NotInitialized);
        }
        self.start_measurement(AxisMask::ALL, delay)?;
        delay.delay_ms(CONVERSION_DELAY_MS);
        let raw = self.read_raw(AxisMask::ALL, delay)?;
        Ok(self.config.convert_z(raw.z))
    }
}

#[cfg(feature = "async")]
impl<I> Mlx90393Driver<I>
where
    I: AsyncCommandInterface,
{
    /// Write a command, wait the inter-phase delay, read the response
    async fn transceive<D>(
        &mut self,
        tx: &[u8],
        rx: &mut [u8],
        delay: &mut D,
    ) -> Result<(), Error<I::Error>>
    where
        D: embedded_hal_async::delay::DelayNs,
    {
        self.interface.write_command(tx).await?;
        delay.delay_ms(INTER_PHASE_DELAY_MS).await;
        self.interface.read_response(rx).await?;
        Ok(())
    }

    /// Run the full startup sequence: exit mode, reset, settle
    ///
    /// See the blocking variant for semantics.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] if a transceive fails, or
    /// [`Error::UnexpectedStatus`] if a status byte mismatches.
    pub async fn init<D>(&mut self, delay: &mut D) -> Result<(), Error<I::Error>>
    where
        D: embedded_hal_async::delay::DelayNs,
    {
        self.exit_mode(delay).await?;
        self.reset(delay).await?;
        delay.delay_ms(POST_RESET_SETTLE_MS).await;
        self.state = DeviceState::Ready;
        Ok(())
    }

    /// Send the exit-mode command (EX)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] or [`Error::UnexpectedStatus`]; either one
    /// also moves the driver to [`DeviceState::Faulted`].
    pub async fn exit_mode<D>(&mut self, delay: &mut D) -> Result<(), Error<I::Error>>
    where
        D: embedded_hal_async::delay::DelayNs,
    {
        let mut rx = [0u8; 1];
        if let Err(e) = self.transceive(&[CMD_EXIT_MODE], &mut rx, delay).await {
            self.state = DeviceState::Faulted;
            return Err(e);
        }
        if status_nibble(rx[0]) != STATUS_NIBBLE_OK {
            self.state = DeviceState::Faulted;
            return Err(Error::UnexpectedStatus(rx[0]));
        }
        self.state = DeviceState::ExitedMode;
        Ok(())
    }

    /// Send the reset command (RT) and wait the post-reset settle time
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] or [`Error::UnexpectedStatus`]; either one
    /// also moves the driver to [`DeviceState::Faulted`].
    pub async fn reset<D>(&mut self, delay: &mut D) -> Result<(), Error<I::Error>>
    where
        D: embedded_hal_async::delay::DelayNs,
    {
        let mut rx = [0u8; 1];
        if let Err(e) = self.transceive(&[CMD_RESET], &mut rx, delay).await {
            self.state = DeviceState::Faulted;
            return Err(e);
        }
        delay.delay_ms(RESET_SETTLE_MS).await;
        if status_nibble(rx[0]) != STATUS_NIBBLE_RESET {
            self.state = DeviceState::Faulted;
            return Err(Error::UnexpectedStatus(rx[0]));
        }
        self.state = DeviceState::Reset;
        Ok(())
    }

    /// Trigger a single measurement (SM) on the selected axes
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] or [`Error::UnexpectedStatus`].
    pub async fn start_measurement<D>(
        &mut self,
        axes: AxisMask,
        delay: &mut D,
    ) -> Result<(), Error<I::Error>>
    where
        D: embedded_hal_async::delay::DelayNs,
    {
        let mut rx = [0u8; 1];
        self.transceive(&[CMD_START_MEASUREMENT | axes.bits()], &mut rx, delay)
            .await?;
        match status_nibble(rx[0]) {
            STATUS_NIBBLE_OK | STATUS_NIBBLE_SM_ACTIVE => Ok(()),
            _ => Err(Error::UnexpectedStatus(rx[0])),
        }
    }

    /// Read a completed measurement (RM) on the selected axes
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] or, for a non-zero status nibble,
    /// [`Error::UnexpectedStatus`].
    pub async fn read_raw<D>(
        &mut self,
        axes: AxisMask,
        delay: &mut D,
    ) -> Result<RawSample, Error<I::Error>>
    where
        D: embedded_hal_async::delay::DelayNs,
    {
        let mut rx = [0u8; 7];
        let frame = &mut rx[..1 + 2 * axes.count()];
        self.transceive(&[CMD_READ_MEASUREMENT | axes.bits()], frame, delay)
            .await?;
        if status_nibble(frame[0]) != STATUS_NIBBLE_OK {
            return Err(Error::UnexpectedStatus(frame[0]));
        }
        Ok(Self::decode(frame, axes))
    }

    /// Acquire one smoothing-ready Z-axis field sample in millitesla
    ///
    /// Callers must keep at most one `read_field` in flight at a time; the
    /// start/read pair must not interleave with another transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] unless the driver is
    /// [`DeviceState::Ready`], otherwise any error from the two protocol
    /// steps.
    pub async fn read_field<D>(&mut self, delay: &mut D) -> Result<f32, Error<I::Error>>
    where
        D: embedded_hal_async::delay::DelayNs,
    {
        if self.state != DeviceState::Ready {
            return Err(Error::NotInitialized);
        }
        self.start_measurement(AxisMask::ALL, delay).await?;
        delay.delay_ms(CONVERSION_DELAY_MS).await;
        let raw = self.read_raw(AxisMask::ALL, delay).await?;
        Ok(self.config.convert_z(raw.z))
    }
}
