//! Startup configuration: CLI flags plus the TOML `[sprinklers]` table.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;

use crate::driver::{DummyDriver, GpioDriver, OutputDriver};
use crate::error::ConfigError;

#[derive(Debug, Parser)]
#[command(name = "sprinklerd", about = "Single-node irrigation-control daemon")]
pub struct CliArgs {
    /// TCP port the HTTP API listens on.
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// Path to the TOML sprinkler configuration file.
    #[arg(long)]
    pub config_file: PathBuf,

    /// Maximum number of sprinklers active at once.
    #[arg(long, default_value_t = 2)]
    pub max_active: usize,

    /// Maximum number of low-priority sprinklers active at once.
    #[arg(long, default_value_t = 1)]
    pub max_low_priority: usize,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    sprinklers: BTreeMap<String, String>,
}

/// Parses the `[sprinklers]` table into concrete drivers, in sorted order by
/// sprinkler name (the table is a `BTreeMap`, so key order is alphabetical,
/// not the order sprinklers appear in the file).
///
/// Entries are either `name = "dummy"` or `name = "gpio <address> <inverted>"`,
/// where `<inverted>` is `true`/`false` (or any of the usual boolean spellings).
pub fn load_sprinklers(path: &Path) -> Result<Vec<Box<dyn OutputDriver>>, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let parsed: RawConfig = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;

    let mut drivers: Vec<Box<dyn OutputDriver>> = Vec::new();
    for (name, spec) in parsed.sprinklers {
        drivers.push(parse_sprinkler_entry(&name, &spec)?);
    }
    Ok(drivers)
}

fn parse_sprinkler_entry(name: &str, spec: &str) -> Result<Box<dyn OutputDriver>, ConfigError> {
    let mut parts = spec.split_whitespace();
    let kind = parts.next().unwrap_or("");

    match kind {
        "dummy" => Ok(Box::new(DummyDriver::new(name))),
        "gpio" => {
            let address_str = parts.next().ok_or_else(|| ConfigError::MalformedGpioSpec {
                name: name.to_string(),
                reason: "missing gpio address".to_string(),
            })?;
            let address: u32 = address_str.parse().map_err(|_| ConfigError::MalformedGpioSpec {
                name: name.to_string(),
                reason: format!("gpio address \"{address_str}\" is not a number"),
            })?;

            let inverted_str = parts.next().ok_or_else(|| ConfigError::MalformedGpioSpec {
                name: name.to_string(),
                reason: "missing inverted flag".to_string(),
            })?;
            let inverted = parse_bool(inverted_str).ok_or_else(|| ConfigError::MalformedGpioSpec {
                name: name.to_string(),
                reason: format!("\"{inverted_str}\" is not a boolean"),
            })?;

            Ok(Box::new(GpioDriver::new(name, address, inverted)))
        }
        other => Err(ConfigError::UnknownDriverKind { name: name.to_string(), kind: other.to_string() }),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
