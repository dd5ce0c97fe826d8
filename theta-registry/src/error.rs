//! Error types for the handle registry.

use theta_model::ModelError;
use theta_types::Handle;
use thiserror::Error;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors raised by the handle registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Assign picked a handle that is already held. The registry's
    /// invariants were broken before this call.
    #[error("tracker desync: handle {handle} is already held")]
    TrackerDesync { handle: Handle },

    /// Free was called on a handle that is not held.
    #[error("double free: handle {handle} is not held")]
    DoubleFree { handle: Handle },

    /// Every assignable handle is in use.
    #[error("handle space exhausted")]
    HandleSpaceExhausted,

    /// A snapshot handed to restore is not a consistent allocation table.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// An entity could not be built from its record.
    #[error(transparent)]
    Model(#[from] ModelError),
}
