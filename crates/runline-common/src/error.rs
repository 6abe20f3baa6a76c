//! Error types for runline.

use thiserror::Error;

use crate::ids::AssetKey;

/// Top-level error type for runline operations.
#[derive(Debug, Error)]
pub enum RunlineError {
    /// Ring pool contract violations
    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),

    /// Asset loading errors
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Ring pool errors.
///
/// Both variants are programming-contract violations: the streaming engine
/// always checks capacity and emptiness before touching the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PoolError {
    /// Pool constructed with a non-positive capacity
    #[error("Invalid pool capacity: {capacity} (must be greater than zero)")]
    InvalidCapacity {
        /// Requested capacity
        capacity: usize,
    },

    /// Dequeue or peek on an empty pool
    #[error("Cannot take from an empty pool")]
    Empty,
}

/// Asset loading errors.
#[derive(Debug, Error)]
pub enum LoadError {
    /// No asset exists for the key
    #[error("Asset not found: {key}")]
    NotFound {
        /// Requested key
        key: AssetKey,
    },

    /// Reading the asset failed
    #[error("Failed to read asset {key}: {source}")]
    Io {
        /// Requested key
        key: AssetKey,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The asset exists but could not be parsed
    #[error("Failed to parse asset {key}: {message}")]
    Parse {
        /// Requested key
        key: AssetKey,
        /// Parser message
        message: String,
    },
}

impl LoadError {
    /// Returns the key of the asset that failed to load.
    #[must_use]
    pub fn key(&self) -> &AssetKey {
        match self {
            Self::NotFound { key } | Self::Io { key, .. } | Self::Parse { key, .. } => key,
        }
    }
}

/// Result type alias for runline operations.
pub type RunlineResult<T> = Result<T, RunlineError>;
