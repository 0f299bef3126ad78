//! Serializer errors

use thiserror::Error;
use void_object::ObjectError;

/// Result type for serializer operations
pub type Result<T> = std::result::Result<T, SerializeError>;

/// Serializer errors
#[derive(Debug, Error)]
pub enum SerializeError {
    /// The object's runtime type has no registration
    #[error("Type not registered: {0}")]
    NotRegistered(String),
    /// Registered, but without a default constructor
    #[error("Type cannot be constructed: {0}")]
    NotConstructible(String),
    /// Document lacks a well-formed `properties` object
    #[error("Malformed document: {0}")]
    MalformedDocument(String),
    /// Document type differs from the target object's type
    #[error("Type mismatch: document is '{found}', object is '{expected}'")]
    TypeMismatch { expected: String, found: String },
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Text is not well-formed JSON (or not document-shaped)
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// The pool refused the instantiated object
    #[error("Object error: {0}")]
    Object(#[from] ObjectError),
}
