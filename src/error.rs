//! Error handling for the netvis-rs core
//!
//! This module defines custom error types and a Result alias for use
//! throughout the crate.

use crate::wire::ShapeError;
use thiserror::Error;

/// Main error type for netvis-rs operations
#[derive(Error, Debug)]
pub enum NetVisError {
    /// A wire payload field had an unexpected shape
    #[error("Shape error: {0}")]
    Shape(#[from] ShapeError),

    /// Errors surfaced from the transport layer
    #[error("Transport error: {0}")]
    Transport(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<NetVisError>,
    },
}

impl NetVisError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        NetVisError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Result type alias for netvis-rs operations
pub type Result<T> = std::result::Result<T, NetVisError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
