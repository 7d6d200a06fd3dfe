//! Domain errors for StartupOps operations
//!
//! Storage, parsing and other I/O failures travel as `anyhow::Error`;
//! this enum covers input the core refuses to apply.

use thiserror::Error;

/// Errors returned when an operation rejects its input
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OpsError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid rating {0}: expected a value between 1 and 5")]
    InvalidRating(u8),

    #[error("Unknown lane: {0}")]
    UnknownLane(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Only founders can {0}")]
    PermissionDenied(&'static str),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
