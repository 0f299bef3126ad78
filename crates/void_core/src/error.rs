//! Error types for the core library

use thiserror::Error;

/// Result type alias
pub type Result<T> = core::result::Result<T, ReflectError>;

/// Reflection and type registry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReflectError {
    /// Another type already uses this name
    #[error("Type name '{name}' already registered for {existing}")]
    DuplicateName { name: String, existing: String },
}
