//! GameObject / Component composition
//!
//! A [`GameObject`] aggregates components by handle. A [`Component`] is an
//! object that also remembers its owner through a weak
//! `ObjectPtr<GameObject>`; it never keeps the owner alive.
//!
//! The owner is written once, by [`ObjectManager::add_component`] or
//! [`ObjectManager::attach_component`], and is read-only afterwards.

use void_core::{Reflected, TypeBuilder};

use crate::error::{ObjectError, Result};
use crate::manager::ObjectManager;
use crate::object::{Object, ObjectBase};
use crate::ptr::{AnyObjectPtr, ObjectPtr};

/// A named container of components
#[derive(Debug, Default)]
pub struct GameObject {
    base: ObjectBase,
    name: String,
    pub(crate) components: Vec<AnyObjectPtr>,
}

crate::impl_object!(GameObject);

impl GameObject {
    /// Create an empty game object
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: ObjectBase::new(),
            name: name.into(),
            components: Vec::new(),
        }
    }

    /// Name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Attached components in attach order
    pub fn components(&self) -> &[AnyObjectPtr] {
        &self.components
    }
}

impl Reflected for GameObject {
    fn describe(builder: TypeBuilder<Self>) -> TypeBuilder<Self> {
        builder
            .name("void_object::GameObject")
            .property("name", |g| g.name.clone(), |g, v| g.name = v)
    }
}

/// Identity plus owner link embedded in every component
#[derive(Debug, Default)]
pub struct ComponentBase {
    object: ObjectBase,
    owner: ObjectPtr<GameObject>,
}

impl ComponentBase {
    /// Unbound and unattached
    pub const fn new() -> Self {
        Self {
            object: ObjectBase::new(),
            owner: ObjectPtr::null(),
        }
    }

    /// Owning game object, null until attached
    pub fn owner(&self) -> ObjectPtr<GameObject> {
        self.owner
    }

    /// Whether the component was ever attached
    pub fn is_attached(&self) -> bool {
        !self.owner.is_null()
    }

    pub(crate) fn set_owner(&mut self, owner: ObjectPtr<GameObject>) {
        self.owner = owner;
    }

    /// Pool identity
    pub fn object(&self) -> &ObjectBase {
        &self.object
    }

    /// Mutable pool identity
    pub fn object_mut(&mut self) -> &mut ObjectBase {
        &mut self.object
    }
}

/// A clone is a new, unattached component
impl Clone for ComponentBase {
    fn clone(&self) -> Self {
        Self::new()
    }
}

/// An object attached to a [`GameObject`].
///
/// Implement with [`impl_component!`](crate::impl_component).
pub trait Component: Object {
    fn component_base(&self) -> &ComponentBase;

    fn component_base_mut(&mut self) -> &mut ComponentBase;

    /// Owning game object (possibly stale)
    fn owner(&self) -> ObjectPtr<GameObject> {
        self.component_base().owner()
    }
}

/// Implement [`Object`] and [`Component`] for a struct holding a
/// [`ComponentBase`] field (named `component` unless given).
#[macro_export]
macro_rules! impl_component {
    ($ty:ty) => {
        $crate::impl_component!($ty, component);
    };
    ($ty:ty, $field:ident) => {
        impl $crate::Object for $ty {
            fn base(&self) -> &$crate::ObjectBase {
                self.$field.object()
            }

            fn base_mut(&mut self) -> &mut $crate::ObjectBase {
                self.$field.object_mut()
            }

            fn component_owner(&self) -> Option<$crate::ObjectPtr<$crate::GameObject>> {
                self.$field.is_attached().then(|| self.$field.owner())
            }
        }

        impl $crate::Component for $ty {
            fn component_base(&self) -> &$crate::ComponentBase {
                &self.$field
            }

            fn component_base_mut(&mut self) -> &mut $crate::ComponentBase {
                &mut self.$field
            }
        }
    };
}

impl ObjectManager {
    /// Create an empty game object
    pub fn create_game_object(&mut self, name: impl Into<String>) -> Result<ObjectPtr<GameObject>> {
        self.create(GameObject::new(name))
    }

    /// Create `component` in the pool, attached to `owner`
    pub fn add_component<C: Component>(&mut self, owner: ObjectPtr<GameObject>, mut component: C) -> Result<ObjectPtr<C>> {
        if !owner.is_valid_in(self) {
            return Err(ObjectError::StaleHandle);
        }
        if component.component_base().is_attached() {
            return Err(ObjectError::AlreadyAttached);
        }

        component.component_base_mut().set_owner(owner);
        let ptr = self.create(component)?;
        if let Some(game_object) = self.get_mut(owner) {
            game_object.components.push(ptr.erase());
        }
        Ok(ptr)
    }

    /// Attach a component that already lives in the pool
    pub fn attach_component<C: Component>(&mut self, owner: ObjectPtr<GameObject>, component: ObjectPtr<C>) -> Result<()> {
        if !owner.is_valid_in(self) {
            return Err(ObjectError::StaleHandle);
        }
        let target = self.get_mut(component).ok_or(ObjectError::StaleHandle)?;
        if target.component_base().is_attached() {
            return Err(ObjectError::AlreadyAttached);
        }
        target.component_base_mut().set_owner(owner);

        if let Some(game_object) = self.get_mut(owner) {
            game_object.components.push(component.erase());
        }
        Ok(())
    }

    /// First component of type `C` on `owner`
    pub fn get_component<C: Component>(&self, owner: ObjectPtr<GameObject>) -> Option<ObjectPtr<C>> {
        self.components_of(owner).iter().find_map(|&c| self.typed::<C>(c))
    }

    /// Every component of type `C` on `owner`, in attach order
    pub fn get_components<C: Component>(&self, owner: ObjectPtr<GameObject>) -> Vec<ObjectPtr<C>> {
        self.components_of(owner)
            .iter()
            .filter_map(|&c| self.typed::<C>(c))
            .collect()
    }

    /// All components on `owner`; empty if `owner` is stale
    pub fn components_of(&self, owner: ObjectPtr<GameObject>) -> &[AnyObjectPtr] {
        self.get(owner).map(GameObject::components).unwrap_or(&[])
    }

    /// Live owner of a component
    pub fn owner_of<C: Component>(&self, component: ObjectPtr<C>) -> Option<ObjectPtr<GameObject>> {
        let owner = self.get(component)?.owner();
        owner.is_valid_in(self).then_some(owner)
    }
}
