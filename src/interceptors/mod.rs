//! The interceptor chain: composable wrappers around `turn_on`/`turn_off`
//! that enforce hardware-concurrency, state and runtime-budget invariants.

mod budget;
mod concurrency;
mod state;

pub use budget::{RuntimeBudgetInterceptor, RuntimeWindow};
pub use concurrency::GlobalConcurrencyInterceptor;
pub use state::StateVerificationInterceptor;

use crate::driver::OutputDriver;
use crate::error::SprinklerError;

/// One link in the interceptor chain.
///
/// Each interceptor wraps the *next inner* interceptor (or, for the
/// innermost link, the driver sink directly). The controller composes these
/// outer-to-inner in registration order (see `controller::SprinklerController`).
pub trait Interceptor: Send {
    fn turn_on(&mut self, driver: &mut dyn OutputDriver) -> Result<(), SprinklerError>;
    fn turn_off(&mut self, driver: &mut dyn OutputDriver) -> Result<(), SprinklerError>;
}

/// The innermost link: calls the driver directly.
pub struct DriverSink;

impl Interceptor for DriverSink {
    fn turn_on(&mut self, driver: &mut dyn OutputDriver) -> Result<(), SprinklerError> {
        driver.on()
    }

    fn turn_off(&mut self, driver: &mut dyn OutputDriver) -> Result<(), SprinklerError> {
        driver.off()
    }
}
