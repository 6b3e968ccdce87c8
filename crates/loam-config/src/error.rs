//! Errors raised while loading, saving, or validating the terrain configuration.

use std::io;

/// Configuration failure.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("could not read terrain config: {0}")]
    ReadError(#[source] io::Error),

    /// The config directory or file could not be written.
    #[error("could not write terrain config: {0}")]
    WriteError(#[source] io::Error),

    /// The file is not valid RON for [`crate::Config`].
    #[error("malformed terrain config: {0}")]
    ParseError(#[source] ron::error::SpannedError),

    /// The config could not be encoded as RON.
    #[error("could not encode terrain config: {0}")]
    SerializeError(#[source] ron::Error),

    /// The values parse but describe an unusable world.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}
