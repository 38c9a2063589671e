//! Error types for the crypto module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while creating or locating TLS material.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// A CA output directory could not be listed.
    #[error("Failed to scan CA directory {path}: {source}")]
    ScanFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The openssl binary could not be found.
    #[error("openssl not found at path: {path}")]
    OpensslNotFound { path: PathBuf },

    /// An openssl invocation exited with a failure status.
    #[error("openssl {step} failed: {stderr}")]
    CommandFailed { step: String, stderr: String },

    /// I/O error while preparing CA directories.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CryptoError {
    pub fn command_failed(step: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::CommandFailed {
            step: step.into(),
            stderr: stderr.into(),
        }
    }
}
