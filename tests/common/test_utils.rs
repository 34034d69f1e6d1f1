//! Test utilities and helper functions

use std::cell::RefCell;
use std::rc::Rc;

use crate::common::mock_interface::MockBus;
use mlx90393_force::Mlx90393Driver;

/// Mock delay implementation for testing
///
/// No-op implementation of the embedded-hal `DelayNs` trait for tests
/// where actual settle times are irrelevant.
#[derive(Debug, Clone, Copy)]
pub struct MockDelay;

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, _ns: u32) {
        // No-op for testing
    }

    fn delay_us(&mut self, _us: u32) {
        // No-op for testing
    }

    fn delay_ms(&mut self, _ms: u32) {
        // No-op for testing
    }
}

/// Mock liveness pin that records every level it is driven to
#[derive(Debug, Clone, Default)]
pub struct MockPin {
    levels: Rc<RefCell<Vec<bool>>>,
}

impl MockPin {
    /// Create a pin with an empty level log
    pub fn new() -> Self {
        Self::default()
    }

    /// Every level the pin was set to, oldest first
    pub fn levels(&self) -> Vec<bool> {
        self.levels.borrow().clone()
    }
}

impl embedded_hal::digital::ErrorType for MockPin {
    type Error = core::convert::Infallible;
}

impl embedded_hal::digital::OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.levels.borrow_mut().push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.levels.borrow_mut().push(true);
        Ok(())
    }
}

/// Create a driver over a fresh mock bus
///
/// Returns (driver, bus) where the bus is a clone sharing state with the
/// one inside the driver.
pub fn create_mock_driver() -> (Mlx90393Driver<MockBus>, MockBus) {
    let bus = MockBus::new();
    let bus_clone = bus.clone();
    let driver = Mlx90393Driver::new(bus);
    (driver, bus_clone)
}

/// Create a driver that has already completed the startup sequence
pub fn create_ready_driver() -> (Mlx90393Driver<MockBus>, MockBus) {
    let (mut driver, bus) = create_mock_driver();
    driver
        .init(&mut MockDelay)
        .expect("mock startup sequence should succeed");
    bus.clear_writes();
    (driver, bus)
}

/// Assert that two floating point values are approximately equal
pub fn assert_float_eq(a: f32, b: f32, epsilon: f32) {
    let diff = (a - b).abs();
    assert!(
        diff < epsilon,
        "Values not equal within epsilon: {} vs {} (diff: {}, epsilon: {})",
        a,
        b,
        diff,
        epsilon
    );
}
