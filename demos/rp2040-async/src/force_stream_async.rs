//! Force-sensor streaming firmware for the Raspberry Pi Pico (Async version)
//!
//! Same flow as the blocking demo over the async driver API. The whole
//! acquisition path lives in the one main task, which keeps at most one
//! bus transaction in flight — the start/read command pair must never
//! interleave with another caller.
//!
//! Hardware connections match the blocking demo:
//! - SDA: GPIO4, SCL: GPIO5 (I2C0), UART0 on GPIO0/1 at 115200
//! - Onboard LED (GPIO25) toggles every cycle

#![no_std]
#![no_main]

use core::fmt::Write as _;

use defmt::*;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::i2c::{Config as I2cConfig, I2c, InterruptHandler as I2cInterruptHandler};
use embassy_rp::peripherals::{I2C0, UART0};
use embassy_rp::uart::{Blocking, Config as UartConfig, Uart};
use embassy_rp::bind_interrupts;
use embassy_time::{Delay, Timer};
use mlx90393_force::{ExpSmoother, I2cInterface, Mlx90393Driver, SampleLoop};
use panic_probe as _;

bind_interrupts!(struct Irqs {
    I2C0_IRQ => I2cInterruptHandler<I2C0>;
});

/// Adapts the UART to the `core::fmt::Write` sink the loop expects
struct UartSink(Uart<'static, UART0, Blocking>);

impl core::fmt::Write for UartSink {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.0.blocking_write(s.as_bytes()).map_err(|_| core::fmt::Error)?;
        Ok(())
    }
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("MLX90393 force sensor stream (async)");

    let p = embassy_rp::init(Default::default());

    let _vcc = Output::new(p.PIN_3, Level::High);
    let led = Output::new(p.PIN_25, Level::Low);

    let mut i2c_config = I2cConfig::default();
    i2c_config.frequency = 400_000;
    let i2c = I2c::new_async(p.I2C0, p.PIN_5, p.PIN_4, Irqs, i2c_config);

    let mut uart_config = UartConfig::default();
    uart_config.baudrate = 115_200;
    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let mut sink = UartSink(uart);

    Timer::after_millis(2000).await;

    let mut delay = Delay;
    let mut sensor = Mlx90393Driver::new(I2cInterface::default(i2c));

    let _ = writeln!(sink, "MLX90393 force sensor, raw Z-axis output");
    if sensor.init(&mut delay).await.is_err() {
        error!("MLX90393 initialization failed, check wiring and power");
        let _ = writeln!(sink, "Sensor init failed, check I2C wiring");
    } else {
        info!("MLX90393 initialized");
        let _ = writeln!(sink, "Sensor ready, format: Z-axis(M1): X.XXX mT");
    }

    let mut stream = SampleLoop::new(sensor, led, sink)
        .with_filter(ExpSmoother::new(ExpSmoother::DEFAULT_ALPHA));
    stream.run(&mut delay).await
}
