//! Error definitions for the mapping module

use thiserror::Error;

/// Errors raised while building the translation engine
#[derive(Debug, Error)]
pub enum MappingError {
    /// The static key table failed validation
    #[error("Invalid key table: {0}")]
    InvalidKeyTable(String),

    /// Engine settings outside their allowed range
    #[error("Configuration error: {0}")]
    ConfigError(String),
}
