//! Error type for fallible operations
//!
//! The contact sweep itself never fails; per-pair problems degrade to
//! "no contact". Errors are reserved for caller-facing requests that can be
//! refused, like attaching a motor to a static object.

use thiserror::Error;

/// Error type for flatland operations.
#[derive(Debug, Error)]
pub enum PhysicsError {
    /// A joint that drives its object was requested for a static object.
    #[error("{operation} requires a dynamic object")]
    NotDynamic {
        /// Name of the rejected operation
        operation: &'static str,
    },
    /// Settings file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Settings could not be parsed or serialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, PhysicsError>;
