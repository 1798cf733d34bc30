//! Crate error types
//!
//! Failures are contained at the level they occur: a bad client socket only
//! tears down that one viewer, a failed bind only disables streaming for the
//! camera that asked for it. The variants here are the errors that cross an
//! API boundary and need handling by the caller.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Convenience result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug, Error)]
pub enum Error {
    /// Could not bind or listen on the configured streaming port
    #[error("failed to bind stream socket on port {port}: {source}")]
    Bind {
        /// Requested port
        port: u16,
        /// Underlying socket error
        source: io::Error,
    },

    /// Generic socket I/O error
    #[error("socket error: {0}")]
    Io(#[from] io::Error),

    /// The capture source failed and cannot recover
    #[error("capture source failed: {0}")]
    Capture(String),

    /// JPEG encoding failed
    #[error("jpeg encoding failed: {0}")]
    Encode(String),

    /// Could not read the configuration file
    #[error("failed to read config file {}: {source}", path.display())]
    ConfigRead {
        /// File that was requested
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// The configuration file did not parse
    #[error("failed to parse config file {}: {source}", path.display())]
    ConfigParse {
        /// File that was parsed
        path: PathBuf,
        /// TOML parse error
        source: toml::de::Error,
    },
}
