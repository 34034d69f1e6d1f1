//! Periodic acquisition and streaming
//!
//! [`SampleLoop`] owns the driver, the smoothing filter, a liveness pin,
//! and a text sink, and runs the fixed-cadence acquire/smooth/emit cycle.
//! One line per cycle:
//!
//! ```text
//! Z-axis(M1): 12.693 mT
//! ```
//!
//! or an explicit `ERROR` marker when acquisition fails. A stale or
//! fabricated reading is never emitted. The loop is single-threaded by
//! construction: the bus, the filter state, and the pin have exactly one
//! writer, so at most one `read_field` is ever in flight.

use core::fmt::Write;

use embedded_hal::digital::{OutputPin, PinState};

use crate::device::{DeviceState, Mlx90393Driver};
use crate::filter::ExpSmoother;

#[cfg(feature = "async")]
use crate::interface::AsyncCommandInterface;
#[cfg(not(feature = "async"))]
use crate::interface::CommandInterface;

/// Default sampling period: 10 Hz
const DEFAULT_PERIOD_MS: u32 = 100;

/// Fixed-cadence sample loop over one MLX90393
///
/// `P` is the liveness indicator (an LED on the reference rig), `W` the
/// serial text sink the desktop collaborators parse. Write and pin errors
/// are deliberately ignored: telemetry must not take the loop down.
pub struct SampleLoop<I, P, W> {
    driver: Mlx90393Driver<I>,
    filter: ExpSmoother,
    liveness: P,
    sink: W,
    label: &'static str,
    period_ms: u32,
    liveness_on: bool,
}

impl<I, P, W> SampleLoop<I, P, W> {
    /// Create a loop with the default filter, label `M1`, and 10 Hz cadence
    pub fn new(driver: Mlx90393Driver<I>, liveness: P, sink: W) -> Self {
        Self {
            driver,
            filter: ExpSmoother::default(),
            liveness,
            sink,
            label: "M1",
            period_ms: DEFAULT_PERIOD_MS,
            liveness_on: false,
        }
    }

    /// Replace the smoothing filter
    #[must_use]
    pub fn with_filter(mut self, filter: ExpSmoother) -> Self {
        self.filter = filter;
        self
    }

    /// Set the sensor label embedded in every output line
    #[must_use]
    pub fn with_label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    /// Set the inter-cycle sleep in milliseconds
    ///
    /// The sleep is fixed; the time spent acquiring is not compensated for.
    #[must_use]
    pub fn with_period_ms(mut self, period_ms: u32) -> Self {
        self.period_ms = period_ms;
        self
    }

    /// The latest smoothed field value, if any sample has succeeded
    #[must_use]
    pub fn smoothed(&self) -> Option<f32> {
        self.filter.value()
    }

    /// Borrow the driver, e.g. to re-run `init` after fixing wiring
    pub fn driver_mut(&mut self) -> &mut Mlx90393Driver<I> {
        &mut self.driver
    }

    /// Tear the loop apart again
    pub fn release(self) -> (Mlx90393Driver<I>, P, W) {
        (self.driver, self.liveness, self.sink)
    }
}

#[cfg(not(feature = "async"))]
impl<I, P, W> SampleLoop<I, P, W>
where
    I: CommandInterface,
    P: OutputPin,
    W: Write,
{
    /// Run one acquisition cycle without the inter-cycle sleep
    ///
    /// Toggles the liveness pin, reads the field, feeds the filter, and
    /// emits one line. The pin toggles even when acquisition fails, so a
    /// wedged sensor still shows a live loop.
    pub fn run_cycle<D>(&mut self, delay: &mut D)
    where
        D: embedded_hal::delay::DelayNs,
    {
        self.liveness_on = !self.liveness_on;
        let _ = self.liveness.set_state(PinState::from(self.liveness_on));

        if self.driver.state() != DeviceState::Ready {
            let _ = writeln!(self.sink, "Sensor not initialized");
            return;
        }

        match self.driver.read_field(delay) {
            Ok(field_mt) => {
                let smoothed = self.filter.update(field_mt);
                let _ = writeln!(self.sink, "Z-axis({}): {:.3} mT", self.label, smoothed);
            }
            Err(_) => {
                let _ = writeln!(self.sink, "Z-axis({}): ERROR", self.label);
            }
        }
    }

    /// Run forever at the configured cadence
    pub fn run<D>(&mut self, delay: &mut D) -> !
    where
        D: embedded_hal::delay::DelayNs,
    {
        loop {
            self.run_cycle(delay);
            delay.delay_ms(self.period_ms);
        }
    }
}

#[cfg(feature = "async")]
impl<I, P, W> SampleLoop<I, P, W>
where
    I: AsyncCommandInterface,
    P: OutputPin,
    W: Write,
{
    /// Run one acquisition cycle without the inter-cycle sleep
    ///
    /// Async twin of the blocking variant; the caller must not run two
    /// cycles concurrently (the bus protocol is non-reentrant).
    pub async fn run_cycle<D>(&mut self, delay: &mut D)
    where
        D: embedded_hal_async::delay::DelayNs,
    {
        self.liveness_on = !self.liveness_on;
        let _ = self.liveness.set_state(PinState::from(self.liveness_on));

        if self.driver.state() != DeviceState::Ready {
            let _ = writeln!(self.sink, "Sensor not initialized");
            return;
        }

        match self.driver.read_field(delay).await {
            Ok(field_mt) => {
                let smoothed = self.filter.update(field_mt);
                let _ = writeln!(self.sink, "Z-axis({}): {:.3} mT", self.label, smoothed);
            }
            Err(_) => {
                let _ = writeln!(self.sink, "Z-axis({}): ERROR", self.label);
            }
        }
    }

    /// Run forever at the configured cadence; the future never resolves
    pub async fn run<D>(&mut self, delay: &mut D)
    where
        D: embedded_hal_async::delay::DelayNs,
    {
        loop {
            self.run_cycle(delay).await;
            delay.delay_ms(self.period_ms).await;
        }
    }
}
