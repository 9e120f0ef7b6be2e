//! Error types for the boundaries around the world core.
//!
//! Terrain generation, prop scattering and biome lookup are total and never
//! fail. Errors only arise where the sandbox touches the outside world:
//! configuration files, the terminal, and the journal endpoint.

use std::path::PathBuf;

use thiserror::Error;

use crate::journal::JournalError;

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("journal error: {0}")]
    Journal(#[from] JournalError),

    #[error("failed to start journal runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("terminal error: {0}")]
    Terminal(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SandboxError>;
