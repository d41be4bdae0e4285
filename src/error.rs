//! Error types for sitebind operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while assembling or writing the combined document.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("stylesheet not found: {0}")]
    MissingStylesheet(PathBuf),

    #[error("typesetter failed: {0}")]
    Typeset(String),
}

pub type Result<T> = std::result::Result<T, Error>;
