//! # void_core - Void Engine Core
//!
//! Core primitives shared by the object pool and the serializer:
//! - **Reflection**: runtime type descriptions with named, get/set-able properties
//! - **Dynamic values**: a variant container that property accessors speak
//! - **Generational slots**: the index + generation bookkeeping behind handles
//!
//! Nothing in here knows about game objects; `void_object` and
//! `void_serialize` build on top of these pieces.

pub mod error;
pub mod handle;
pub mod type_registry;
pub mod value;

pub use error::*;
pub use handle::*;
pub use type_registry::*;
pub use value::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{ReflectError, Result};
    pub use crate::handle::{SlotHandle, SlotTable};
    pub use crate::type_registry::{PropertyInfo, Reflected, TypeBuilder, TypeInfo, TypeRegistry};
    pub use crate::value::{FromValue, IntoValue, ObjectValue, Value, ValueKind};
}
