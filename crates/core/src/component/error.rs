//! Error types for the component module.

use std::path::PathBuf;
use thiserror::Error;

use crate::odb::OdbError;

/// Errors that can occur while creating a component.
#[derive(Debug, Error)]
pub enum ComponentError {
    /// The component directory was not created beforehand.
    #[error("Component directory does not exist: {path}")]
    MissingDirectory { path: PathBuf },

    /// Failed to write a component file.
    #[error("Failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize a component config file.
    #[error("Failed to serialize {file}: {reason}")]
    SerializeFailed { file: String, reason: String },

    /// ODB error while registering the component.
    #[error(transparent)]
    Odb(#[from] OdbError),
}

impl ComponentError {
    pub fn write_failed(path: PathBuf, source: std::io::Error) -> Self {
        Self::WriteFailed { path, source }
    }
}
