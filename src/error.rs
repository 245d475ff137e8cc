//! Error types for the Shrike library.
//!
//! All fallible operations in the crate return [`Result`], whose error type
//! is the [`ShrikeError`] enum.
//!
//! # Examples
//!
//! ```
//! use shrike::error::{Result, ShrikeError};
//!
//! fn example_operation() -> Result<()> {
//!     Err(ShrikeError::invalid_embedding("embedding contains NaN"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use anyhow;
use thiserror::Error;

/// The main error type for Shrike operations.
///
/// Uses the `thiserror` crate for the `Error` trait implementation and
/// provides constructor methods for the string-payload variants.
#[derive(Error, Debug)]
pub enum ShrikeError {
    /// I/O errors (file operations, fsync, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An embedding or query whose length does not match the index dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// An embedding that cannot be normalized (NaN, infinity, or zero norm).
    #[error("invalid embedding: {0}")]
    InvalidEmbedding(String),

    /// A top_k of zero makes the search request meaningless.
    #[error("invalid top_k: {0} (must be at least 1)")]
    InvalidTopK(usize),

    /// Index-related errors (corrupt entry log, bad manifest, id gaps)
    #[error("index error: {0}")]
    Index(String),

    /// Storage-related errors
    #[error("storage error: {0}")]
    Storage(String),

    /// Invalid operation
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic anyhow error
    #[error("error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with ShrikeError.
pub type Result<T> = std::result::Result<T, ShrikeError>;

impl ShrikeError {
    /// Create a new index error.
    pub fn index<S: Into<String>>(msg: S) -> Self {
        ShrikeError::Index(msg.into())
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        ShrikeError::Storage(msg.into())
    }

    /// Create a new invalid embedding error.
    pub fn invalid_embedding<S: Into<String>>(msg: S) -> Self {
        ShrikeError::InvalidEmbedding(msg.into())
    }

    /// Create a new invalid operation error.
    pub fn invalid_operation<S: Into<String>>(msg: S) -> Self {
        ShrikeError::InvalidOperation(msg.into())
    }

    /// Create a new dimension mismatch error.
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        ShrikeError::DimensionMismatch { expected, actual }
    }
}
