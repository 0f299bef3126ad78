//! Void Object - Object Lifetime Management
//!
//! This crate owns every live game object and hands out handles to them.
//!
//! # Features
//!
//! - Generational object pool with free-slot reuse
//! - Validity-checked, copyable handles (`ObjectPtr<T>`)
//! - Find-by-type queries backed by a type index
//! - GameObject / Component composition with weak owner links
//! - Optional process-wide pool with explicit init and shutdown
//!
//! # Example
//!
//! ```ignore
//! use void_object::prelude::*;
//!
//! #[derive(Default)]
//! struct Turret { base: ObjectBase, range: f32 }
//! impl_object!(Turret);
//!
//! let mut manager = ObjectManager::new();
//! let turret = manager.create(Turret::default())?;
//! assert!(turret.is_valid_in(&manager));
//!
//! manager.destroy(turret);
//! assert!(!turret.is_valid_in(&manager));
//! ```

pub mod component;
pub mod error;
pub mod global;
pub mod manager;
pub mod object;
pub mod ptr;
pub mod reflect;

pub mod prelude {
    pub use crate::component::{Component, ComponentBase, GameObject};
    pub use crate::error::{ObjectError, Result};
    pub use crate::manager::{ObjectManager, ObjectManagerConfig};
    pub use crate::object::{Object, ObjectBase, ObjectExt};
    pub use crate::ptr::{AnyObjectPtr, ObjectPtr};
    pub use crate::reflect::{register_builtin_types, register_object, ReflectObject};
    pub use crate::{impl_component, impl_object};
}

pub use prelude::*;
pub use object::ObjectAny;
