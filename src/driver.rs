//! Output driver contract and the two concrete drivers the daemon ships with.

use std::fs;
use std::path::PathBuf;

use crate::error::SprinklerError;

/// One physical (or simulated) sprinkler output.
///
/// Implementations are not expected to dedupe repeated `on()`/`off()` calls —
/// that invariant is the `StateVerificationInterceptor`'s job, one layer up.
pub trait OutputDriver: Send {
    fn on(&mut self) -> Result<(), SprinklerError>;
    fn off(&mut self) -> Result<(), SprinklerError>;
    fn sprinkler_id(&self) -> &str;
}

/// Logs the transition instead of touching hardware. Used for `dummy`
/// sprinklers in the config and throughout the test suite.
pub struct DummyDriver {
    sprinkler_id: String,
}

impl DummyDriver {
    pub fn new(sprinkler_id: impl Into<String>) -> Self {
        Self { sprinkler_id: sprinkler_id.into() }
    }
}

impl OutputDriver for DummyDriver {
    fn on(&mut self) -> Result<(), SprinklerError> {
        tracing::info!(sprinkler_id = %self.sprinkler_id, "dummy driver turning on");
        Ok(())
    }

    fn off(&mut self) -> Result<(), SprinklerError> {
        tracing::info!(sprinkler_id = %self.sprinkler_id, "dummy driver turning off");
        Ok(())
    }

    fn sprinkler_id(&self) -> &str {
        &self.sprinkler_id
    }
}

/// Drives a Linux sysfs GPIO pin (`/sys/class/gpio/gpio<N>/value`).
///
/// `inverted` swaps active-high/active-low polarity both at export time
/// (`active_low`) and is otherwise transparent to callers: `on()` always
/// means "water flowing", regardless of the pin's electrical polarity.
pub struct GpioDriver {
    sprinkler_id: String,
    gpio_address: u32,
    inverted: bool,
    base_path: PathBuf,
    exported: bool,
}

impl GpioDriver {
    pub fn new(sprinkler_id: impl Into<String>, gpio_address: u32, inverted: bool) -> Self {
        Self {
            sprinkler_id: sprinkler_id.into(),
            gpio_address,
            inverted,
            base_path: PathBuf::from("/sys/class/gpio"),
            exported: false,
        }
    }

    #[cfg(test)]
    pub fn with_base_path(mut self, base_path: PathBuf) -> Self {
        self.base_path = base_path;
        self
    }

    fn port_path(&self) -> PathBuf {
        self.base_path.join(format!("gpio{}", self.gpio_address))
    }

    fn driver_error(&self, message: impl Into<String>) -> SprinklerError {
        SprinklerError::DriverError {
            sprinkler_id: self.sprinkler_id.clone(),
            message: message.into(),
        }
    }

    fn write_attr(&self, name: &str, value: &str) -> Result<(), SprinklerError> {
        fs::write(self.port_path().join(name), value)
            .map_err(|e| self.driver_error(format!("writing {name}: {e}")))
    }

    /// Export the pin and set its polarity. Idempotent: safe to call more than once.
    pub fn export(&mut self) -> Result<(), SprinklerError> {
        if self.exported {
            return Ok(());
        }
        fs::write(self.base_path.join("export"), self.gpio_address.to_string())
            .map_err(|e| self.driver_error(format!("exporting gpio{}: {e}", self.gpio_address)))?;
        self.write_attr("direction", if self.inverted { "high" } else { "low" })?;
        self.write_attr("active_low", if self.inverted { "1" } else { "0" })?;
        self.exported = true;
        Ok(())
    }

    pub fn is_exported(&self) -> bool {
        self.port_path().exists()
    }
}

impl OutputDriver for GpioDriver {
    fn on(&mut self) -> Result<(), SprinklerError> {
        self.export()?;
        tracing::info!(sprinkler_id = %self.sprinkler_id, gpio = self.gpio_address, "activating gpio port");
        self.write_attr("value", "1")
    }

    fn off(&mut self) -> Result<(), SprinklerError> {
        self.export()?;
        tracing::info!(sprinkler_id = %self.sprinkler_id, gpio = self.gpio_address, "deactivating gpio port");
        self.write_attr("value", "0")
    }

    fn sprinkler_id(&self) -> &str {
        &self.sprinkler_id
    }
}
