//! Bus interface implementations for the MLX90393
//!
//! The MLX90393 speaks a command protocol rather than a register map: the
//! host writes a single command byte (plus optional arguments) and reads
//! back a status byte followed by measurement data. This module defines the
//! [`CommandInterface`] seam for that exchange and provides an I2C
//! implementation over the `embedded-hal` traits.

use crate::I2C_ADDRESS;

/// Write/read halves of an MLX90393 command exchange
///
/// The driver calls `write_command` with the command bytes, waits the
/// datasheet inter-phase delay, then calls `read_response` with a buffer
/// sized for the expected status byte plus data. Implementations must be
/// blocking; the protocol is stateful and a command/response pair must not
/// be interleaved with another transaction.
pub trait CommandInterface {
    /// Bus error type
    type Error;

    /// Write the command bytes to the device
    fn write_command(&mut self, tx: &[u8]) -> Result<(), Self::Error>;

    /// Read the response (status byte first) into `rx`
    fn read_response(&mut self, rx: &mut [u8]) -> Result<(), Self::Error>;
}

/// Async variant of [`CommandInterface`]
///
/// The single-transaction-in-flight invariant still applies: callers must
/// not start a second command exchange while one is awaiting.
#[cfg(feature = "async")]
pub trait AsyncCommandInterface {
    /// Bus error type
    type Error;

    /// Write the command bytes to the device
    async fn write_command(&mut self, tx: &[u8]) -> Result<(), Self::Error>;

    /// Read the response (status byte first) into `rx`
    async fn read_response(&mut self, rx: &mut [u8]) -> Result<(), Self::Error>;
}

/// I2C interface for the MLX90393
pub struct I2cInterface<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> I2cInterface<I2C> {
    /// Create a new I2C interface with the default address (0x0C, A0/A1 LOW)
    ///
    /// # Arguments
    /// * `i2c` - The I2C peripheral
    ///
    /// # Example
    /// ```ignore
    /// let interface = I2cInterface::default(i2c);
    /// let mut sensor = Mlx90393Driver::new(interface);
    /// ```
    pub const fn default(i2c: I2C) -> Self {
        Self {
            i2c,
            address: I2C_ADDRESS,
        }
    }

    /// Create a new I2C interface with a custom device address
    ///
    /// The MLX90393 address pins A0/A1 select one of four addresses in
    /// 0x0C..=0x0F; pass whichever matches the strapping.
    pub const fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Consume the interface and return the I2C peripheral
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C, E> CommandInterface for I2cInterface<I2C>
where
    I2C: embedded_hal::i2c::I2c<Error = E>,
{
    type Error = E;

    fn write_command(&mut self, tx: &[u8]) -> Result<(), Self::Error> {
        self.i2c.write(self.address, tx)
    }

    fn read_response(&mut self, rx: &mut [u8]) -> Result<(), Self::Error> {
        self.i2c.read(self.address, rx)
    }
}

#[cfg(feature = "async")]
impl<I2C, E> AsyncCommandInterface for I2cInterface<I2C>
where
    I2C: embedded_hal_async::i2c::I2c<Error = E>,
{
    type Error = E;

    async fn write_command(&mut self, tx: &[u8]) -> Result<(), Self::Error> {
        self.i2c.write(self.address, tx).await
    }

    async fn read_response(&mut self, rx: &mut [u8]) -> Result<(), Self::Error> {
        self.i2c.read(self.address, rx).await
    }
}
