//! Error types for the object pool

use thiserror::Error;

/// Result type for pool operations
pub type Result<T> = std::result::Result<T, ObjectError>;

/// Errors raised by the object pool and handles
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObjectError {
    /// No free slot and the pool may not grow
    #[error("Object pool exhausted ({live} live objects, {capacity} slots)")]
    PoolExhausted { capacity: usize, live: usize },

    /// Handle is null, or its object has been destroyed
    #[error("Handle is stale (object destroyed)")]
    StaleHandle,

    /// The process-wide manager has not been initialized (or was shut down)
    #[error("Object manager is not initialized")]
    NotInitialized,

    /// The process-wide manager is already borrowed on this thread
    #[error("Object manager is busy (re-entrant access)")]
    PoolBusy,

    /// Component already has an owner
    #[error("Component is already attached to a game object")]
    AlreadyAttached,
}
