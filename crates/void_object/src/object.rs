//! The polymorphic root of everything the pool can hold
//!
//! An [`Object`] is any `'static` type that embeds an [`ObjectBase`]. The
//! base carries the slot index and generation the pool assigned to it, which
//! is what lets an object hand out handles to itself via
//! [`ObjectExt::self_ptr`].
//!
//! Objects are moved into the pool by [`ObjectManager::create`] and are
//! dropped by the pool only; outside code holds [`ObjectPtr`]s.
//!
//! [`ObjectManager::create`]: crate::ObjectManager::create

use std::any::Any;
use std::fmt;

use void_core::SlotHandle;

use crate::component::GameObject;
use crate::ptr::ObjectPtr;

/// Identity the pool stamps on every object it stores
pub struct ObjectBase {
    ptr_id: u32,
    ptr_generation: u32,
}

impl ObjectBase {
    /// An unbound identity (not stored in any pool)
    pub const fn new() -> Self {
        Self {
            ptr_id: u32::MAX,
            ptr_generation: 0,
        }
    }

    /// Slot index assigned by the pool
    #[inline]
    pub fn ptr_id(&self) -> u32 {
        self.ptr_id
    }

    /// Slot generation assigned by the pool
    #[inline]
    pub fn ptr_generation(&self) -> u32 {
        self.ptr_generation
    }

    /// Whether the object currently lives in a pool
    #[inline]
    pub fn is_bound(&self) -> bool {
        self.ptr_id != u32::MAX
    }

    pub(crate) fn bind(&mut self, handle: SlotHandle) {
        self.ptr_id = handle.index();
        self.ptr_generation = handle.generation();
    }

    pub(crate) fn unbind(&mut self) {
        *self = Self::new();
    }
}

impl Default for ObjectBase {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloning an object never clones its pool identity
impl Clone for ObjectBase {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl fmt::Debug for ObjectBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_bound() {
            write!(f, "ObjectBase({}v{})", self.ptr_id, self.ptr_generation)
        } else {
            write!(f, "ObjectBase(unbound)")
        }
    }
}

/// Downcasting support, implemented for every `'static` type
pub trait ObjectAny: Any {
    /// Get as Any reference (for downcasting)
    fn as_any(&self) -> &dyn Any;

    /// Get as mutable Any reference (for downcasting)
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Rust type path of the concrete type
    fn object_type_name(&self) -> &'static str;
}

impl<T: Any> ObjectAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn object_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Anything the object pool can store.
///
/// Implement it with [`impl_object!`](crate::impl_object) for plain objects
/// or [`impl_component!`](crate::impl_component) for components.
pub trait Object: ObjectAny + Send {
    /// Pool identity
    fn base(&self) -> &ObjectBase;

    /// Mutable pool identity
    fn base_mut(&mut self) -> &mut ObjectBase;

    /// Owning game object, for objects that are components
    fn component_owner(&self) -> Option<ObjectPtr<GameObject>> {
        None
    }
}

impl dyn Object {
    /// Downcast to a concrete type
    pub fn downcast_ref<T: Object>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    /// Downcast to a mutable concrete type
    pub fn downcast_mut<T: Object>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut()
    }

    /// Check the concrete type
    pub fn is<T: Object>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

impl fmt::Debug for dyn Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.object_type_name(), self.base())
    }
}

/// Handle minting for concrete objects
pub trait ObjectExt: Object + Sized {
    /// A handle to this very instance.
    ///
    /// Built from the identity stamped by the pool without touching the pool
    /// itself, so it is safe to call while the pool is borrowed. An object
    /// that is not stored in a pool yields the null handle.
    fn self_ptr(&self) -> ObjectPtr<Self> {
        let base = self.base();
        if !base.is_bound() {
            return ObjectPtr::null();
        }
        ObjectPtr::from_instance(self, SlotHandle::new(base.ptr_id(), base.ptr_generation()))
    }
}

impl<T: Object> ObjectExt for T {}

/// Address of an object's storage, used as a cache token in handles
#[inline]
pub(crate) fn address_of(object: &dyn Object) -> usize {
    object as *const dyn Object as *const () as usize
}

/// Implement [`Object`] for a struct holding an [`ObjectBase`] field.
///
/// ```ignore
/// struct Turret { base: ObjectBase, range: f32 }
/// impl_object!(Turret);          // field named `base`
/// impl_object!(Turret, base);    // explicit field
/// ```
#[macro_export]
macro_rules! impl_object {
    ($ty:ty) => {
        $crate::impl_object!($ty, base);
    };
    ($ty:ty, $field:ident) => {
        impl $crate::Object for $ty {
            fn base(&self) -> &$crate::ObjectBase {
                &self.$field
            }

            fn base_mut(&mut self) -> &mut $crate::ObjectBase {
                &mut self.$field
            }
        }
    };
}
