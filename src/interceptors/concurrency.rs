use super::Interceptor;
use crate::driver::OutputDriver;
use crate::error::SprinklerError;

/// Rejects a `turn_on` once `active_count` reaches `max_active`; otherwise a
/// thin pass-through that tracks how many sprinklers are currently on.
pub struct GlobalConcurrencyInterceptor {
    next: Box<dyn Interceptor>,
    max_active: usize,
    active_count: usize,
}

impl GlobalConcurrencyInterceptor {
    pub fn new(next: Box<dyn Interceptor>, max_active: usize) -> Self {
        Self { next, max_active, active_count: 0 }
    }

    pub fn active_count(&self) -> usize {
        self.active_count
    }
}

impl Interceptor for GlobalConcurrencyInterceptor {
    fn turn_on(&mut self, driver: &mut dyn OutputDriver) -> Result<(), SprinklerError> {
        if self.active_count == self.max_active {
            return Err(SprinklerError::ConcurrencyExceeded);
        }
        self.next.turn_on(driver)?;
        self.active_count += 1;
        Ok(())
    }

    fn turn_off(&mut self, driver: &mut dyn OutputDriver) -> Result<(), SprinklerError> {
        self.next.turn_off(driver)?;
        assert!(self.active_count > 0, "active_count underflow: turn_off without a matching turn_on");
        self.active_count -= 1;
        Ok(())
    }
}
