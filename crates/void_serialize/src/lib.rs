//! Void Serialize - Reflective Object Persistence
//!
//! This crate turns any registered object into a `{type, properties}` JSON
//! document and back, using only the properties the type declared through
//! [`void_core::Reflected`].
//!
//! # Features
//!
//! - Per-property best effort: unconvertible values are omitted or skipped
//! - Forward compatible reads: undeclared document entries are ignored
//! - Partial overwrite: declared properties missing from a document keep
//!   their current value
//! - Optional reports listing omitted, skipped and ignored properties
//! - Document files with stable 4-space indentation
//!
//! # Example
//!
//! ```ignore
//! use void_serialize::prelude::*;
//!
//! let serializer = JsonSerializer::new(&registry);
//! let document = serializer.serialize(&player)?;
//! save_to_file("player.json", &document);
//!
//! let document = load_from_file("player.json")?;
//! serializer.apply_document(&document, &mut other_player)?;
//! ```

pub mod convert;
pub mod document;
pub mod error;
pub mod file;
pub mod serializer;

pub mod prelude {
    pub use crate::document::Document;
    pub use crate::error::{Result, SerializeError};
    pub use crate::file::{load_from_file, save_to_file, save_to_file_with_indent};
    pub use crate::serializer::{DeserializeReport, JsonSerializer, SerializeReport, SerializerConfig};
}

pub use prelude::*;
