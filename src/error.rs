//! Error types shared by the scheduling core and the HTTP adapter.

use thiserror::Error;

/// Result alias used throughout the scheduling core.
pub type SprinklerResult<T> = Result<T, SprinklerError>;

/// Everything that can go wrong inside the scheduling core.
///
/// Variants map 1:1 onto the HTTP status codes the adapter returns; see
/// `api::dto::ErrorResponse`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SprinklerError {
    #[error("unknown sprinkler id: {0}")]
    UnknownSprinkler(String),

    #[error("invalid duration: {0}")]
    InvalidDuration(String),

    #[error("job not found: {0}")]
    NotFound(u64),

    #[error("maximum number of active sprinklers reached")]
    ConcurrencyExceeded,

    #[error("sprinkler {0} would exceed its runtime budget")]
    BudgetExceeded(String),

    #[error("sprinkler {0} is already on")]
    AlreadyOn(String),

    #[error("sprinkler {0} is already off")]
    AlreadyOff(String),

    #[error("driver error on {sprinkler_id}: {message}")]
    DriverError { sprinkler_id: String, message: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl SprinklerError {
    /// Short machine-readable kind, used as the `error` field of the HTTP error body.
    pub fn kind(&self) -> &'static str {
        match self {
            SprinklerError::UnknownSprinkler(_) => "unknown_sprinkler",
            SprinklerError::InvalidDuration(_) => "invalid_duration",
            SprinklerError::NotFound(_) => "not_found",
            SprinklerError::ConcurrencyExceeded => "concurrency_exceeded",
            SprinklerError::BudgetExceeded(_) => "budget_exceeded",
            SprinklerError::AlreadyOn(_) => "already_on",
            SprinklerError::AlreadyOff(_) => "already_off",
            SprinklerError::DriverError { .. } => "driver_error",
            SprinklerError::Internal(_) => "internal_error",
        }
    }
}

/// Configuration parsing/validation error, fatal at process startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("unknown sprinkler type \"{kind}\" for sprinkler \"{name}\"")]
    UnknownDriverKind { name: String, kind: String },

    #[error("malformed gpio spec for sprinkler \"{name}\": {reason}")]
    MalformedGpioSpec { name: String, reason: String },
}
