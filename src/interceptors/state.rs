use std::collections::HashMap;

use super::Interceptor;
use crate::driver::OutputDriver;
use crate::error::SprinklerError;

/// Innermost interceptor before the driver sink: refuses a `turn_on` on a
/// sprinkler already recorded as on, and a `turn_off` on one already off.
/// Cheapest invariant check in the chain, so it runs last on the way in.
pub struct StateVerificationInterceptor {
    next: Box<dyn Interceptor>,
    is_on: HashMap<String, bool>,
}

impl StateVerificationInterceptor {
    pub fn new(next: Box<dyn Interceptor>) -> Self {
        Self { next, is_on: HashMap::new() }
    }
}

impl Interceptor for StateVerificationInterceptor {
    fn turn_on(&mut self, driver: &mut dyn OutputDriver) -> Result<(), SprinklerError> {
        let id = driver.sprinkler_id().to_string();
        if *self.is_on.get(&id).unwrap_or(&false) {
            return Err(SprinklerError::AlreadyOn(id));
        }
        self.next.turn_on(driver)?;
        self.is_on.insert(id, true);
        Ok(())
    }

    fn turn_off(&mut self, driver: &mut dyn OutputDriver) -> Result<(), SprinklerError> {
        let id = driver.sprinkler_id().to_string();
        if !*self.is_on.get(&id).unwrap_or(&false) {
            return Err(SprinklerError::AlreadyOff(id));
        }
        self.next.turn_off(driver)?;
        self.is_on.insert(id, false);
        Ok(())
    }
}
