//! Reflection glue for pool objects

use std::fmt;

use void_core::{Reflected, TypeInfo, TypeRegistry};

use crate::component::GameObject;
use crate::object::Object;

/// Type data letting a [`TypeInfo`] construct a default instance of an
/// object type, so objects can be rebuilt from a type name alone
#[derive(Clone, Copy)]
pub struct ReflectObject {
    construct: fn() -> Box<dyn Object>,
}

impl ReflectObject {
    /// Type data for `T`
    pub fn of<T: Object + Default>() -> Self {
        Self {
            construct: construct_default::<T>,
        }
    }

    /// Build a default, unbound instance
    pub fn construct(&self) -> Box<dyn Object> {
        (self.construct)()
    }

    /// Type data attached to `info`, if it was registered as an object
    pub fn from_info(info: &TypeInfo) -> Option<&Self> {
        info.data::<Self>()
    }
}

impl fmt::Debug for ReflectObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReflectObject").finish_non_exhaustive()
    }
}

fn construct_default<T: Object + Default>() -> Box<dyn Object> {
    Box::new(T::default())
}

/// Register `T` and attach [`ReflectObject`] to it
pub fn register_object<T>(registry: &mut TypeRegistry) -> void_core::Result<()>
where
    T: Object + Reflected + Default,
{
    let info = registry.register::<T>()?;
    info.insert_data(ReflectObject::of::<T>());
    Ok(())
}

/// Register the object types this crate defines
pub fn register_builtin_types(registry: &mut TypeRegistry) -> void_core::Result<()> {
    register_object::<GameObject>(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_game_object() {
        let mut registry = TypeRegistry::new();
        register_builtin_types(&mut registry).unwrap();

        let info = registry.get_by_name("void_object::GameObject").unwrap();
        let reflect = ReflectObject::from_info(info).unwrap();
        let object = reflect.construct();

        assert!(object.is::<GameObject>());
        assert!(!object.base().is_bound());
        assert!(info.property("name").is_some());
    }
}
