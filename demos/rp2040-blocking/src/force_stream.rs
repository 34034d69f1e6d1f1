//! Force-sensor streaming firmware for the Raspberry Pi Pico (Blocking version)
//!
//! Reads the MLX90393 Z-axis at 10 Hz, smooths it, and streams one line per
//! sample over UART0 for the desktop calibration/visualiser tools:
//!
//! ```text
//! Z-axis(M1): 12.693 mT
//! ```
//!
//! Hardware connections:
//! - SDA: GPIO4 (I2C0)
//! - SCL: GPIO5 (I2C0)
//! - VCC: GPIO3 driven high (or 3.3V directly)
//! - GND: GND
//! - UART TX: GPIO0, RX: GPIO1, 115200 baud
//! - Onboard LED (GPIO25) toggles every cycle as a liveness indicator

#![no_std]
#![no_main]

use core::fmt::Write as _;

use defmt::*;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::i2c::{Config as I2cConfig, I2c};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{Blocking, Config as UartConfig, Uart};
use embassy_time::Delay;
use mlx90393_force::{ExpSmoother, I2cInterface, MeasurementConfig, Mlx90393Driver, SampleLoop};
use panic_probe as _;

/// Adapts the blocking UART to the `core::fmt::Write` sink the loop expects
struct UartSink(Uart<'static, UART0, Blocking>);

impl core::fmt::Write for UartSink {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.0.blocking_write(s.as_bytes()).map_err(|_| core::fmt::Error)?;
        Ok(())
    }
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("MLX90393 force sensor stream");

    let p = embassy_rp::init(Default::default());

    // Sensor supply from GPIO3 keeps the breakout wiring to one header
    let _vcc = Output::new(p.PIN_3, Level::High);

    let led = Output::new(p.PIN_25, Level::Low);

    let mut i2c_config = I2cConfig::default();
    i2c_config.frequency = 400_000;
    let i2c = I2c::new_blocking(p.I2C0, p.PIN_5, p.PIN_4, i2c_config);

    let mut uart_config = UartConfig::default();
    uart_config.baudrate = 115_200;
    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let mut sink = UartSink(uart);

    // Sensor settle after power-up
    embassy_time::block_for(embassy_time::Duration::from_millis(2000));

    let mut delay = Delay;
    let mut sensor =
        Mlx90393Driver::with_config(I2cInterface::default(i2c), MeasurementConfig::default());

    let _ = writeln!(sink, "MLX90393 force sensor, raw Z-axis output");
    match sensor.init(&mut delay) {
        Ok(()) => {
            info!("MLX90393 initialized");
            let _ = writeln!(sink, "Sensor ready, format: Z-axis(M1): X.XXX mT");
        }
        Err(_) => {
            error!("MLX90393 initialization failed, check wiring and power");
            let _ = writeln!(sink, "Sensor init failed, check I2C wiring");
            // Keep going: the loop reports per-cycle state and a power
            // cycle or rewire can be retried from the host side
        }
    }

    let mut stream = SampleLoop::new(sensor, led, sink)
        .with_filter(ExpSmoother::new(ExpSmoother::DEFAULT_ALPHA));
    stream.run(&mut delay)
}
