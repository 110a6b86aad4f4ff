/*
    errors.rs - Error types for the persistence layer

    Wraps archive, I/O and configuration failures so callers of the store
    see a single error type.
*/

use crate::archive::ArchiveError;
use crate::config::ConfigError;
use thiserror::Error;

/// Errors that can occur while loading or saving models
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The store cannot be built from the given settings
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A thread panicked while holding a store lock
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl StoreError {
    pub fn is_recoverable(&self) -> bool {
        match self {
            StoreError::Archive(e) => e.is_recoverable(),
            StoreError::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
