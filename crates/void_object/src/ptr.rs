//! Validity-checked, non-owning object handles
//!
//! An [`ObjectPtr`] is `(slot index, generation, cached address)`. It never
//! owns its referent and every access goes back through the pool, so a
//! handle to a destroyed object degrades to "invalid" instead of dangling.
//! The address is only a cache token compared during validation; it is
//! never dereferenced.

use std::any::type_name;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use void_core::{IntoValue, SlotHandle, Value};

use crate::error::{ObjectError, Result};
use crate::global;
use crate::manager::ObjectManager;
use crate::object::Object;

/// Type-erased handle
pub type AnyObjectPtr = ObjectPtr<dyn Object>;

/// Handle to an object stored in an [`ObjectManager`]
pub struct ObjectPtr<T: ?Sized> {
    index: u32,
    generation: u32,
    addr: usize,
    _marker: PhantomData<fn() -> *const T>,
}

impl<T: ?Sized> ObjectPtr<T> {
    /// A handle that never validates
    #[inline]
    pub const fn null() -> Self {
        Self {
            index: u32::MAX,
            generation: 0,
            addr: 0,
            _marker: PhantomData,
        }
    }

    pub(crate) fn from_parts(handle: SlotHandle, addr: usize) -> Self {
        Self {
            index: handle.index(),
            generation: handle.generation(),
            addr,
            _marker: PhantomData,
        }
    }

    pub(crate) fn from_instance<U: Object>(instance: &U, handle: SlotHandle) -> Self {
        Self::from_parts(handle, instance as *const U as *const () as usize)
    }

    /// Check if this is the null handle
    #[inline]
    pub fn is_null(&self) -> bool {
        self.index == u32::MAX
    }

    /// Slot index
    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Slot generation at the time the handle was minted
    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Index and generation as a [`SlotHandle`]
    #[inline]
    pub fn slot(&self) -> SlotHandle {
        SlotHandle::new(self.index, self.generation)
    }

    #[cfg(test)]
    pub(crate) fn addr(&self) -> usize {
        self.addr
    }

    /// Forget the static type
    #[inline]
    pub fn erase(self) -> AnyObjectPtr {
        self.cast()
    }

    #[inline]
    pub(crate) fn cast<U: ?Sized>(self) -> ObjectPtr<U> {
        ObjectPtr {
            index: self.index,
            generation: self.generation,
            addr: self.addr,
            _marker: PhantomData,
        }
    }

    /// Validate against an explicit manager
    #[inline]
    pub fn is_valid_in(&self, manager: &ObjectManager) -> bool {
        manager.is_valid_ptr(self.index, self.generation, self.addr)
    }

    /// Same slot and generation, and both handles still valid in `manager`
    pub fn is_same_object_in<U: ?Sized>(&self, other: &ObjectPtr<U>, manager: &ObjectManager) -> bool {
        self.slot() == other.slot() && self.is_valid_in(manager) && other.is_valid_in(manager)
    }

    /// Validate against the process-wide manager.
    ///
    /// Returns `false` when the manager is not initialized, or is mutably
    /// borrowed on this thread (use [`ObjectPtr::is_valid_in`] there).
    #[inline]
    pub fn is_valid(&self) -> bool {
        global::is_valid_ptr(self.index, self.generation, self.addr)
    }

    /// Same slot and generation, and both handles still valid in the
    /// process-wide manager
    pub fn is_same_object<U: ?Sized>(&self, other: &ObjectPtr<U>) -> bool {
        self.slot() == other.slot() && self.is_valid() && other.is_valid()
    }
}

impl<T: Object> ObjectPtr<T> {
    /// Borrow the referent from an explicit manager
    #[inline]
    pub fn get_in<'a>(&self, manager: &'a ObjectManager) -> Option<&'a T> {
        manager.get(*self)
    }

    /// Mutably borrow the referent from an explicit manager
    #[inline]
    pub fn get_mut_in<'a>(&self, manager: &'a mut ObjectManager) -> Option<&'a mut T> {
        manager.get_mut(*self)
    }

    /// Run `f` on the referent held by the process-wide manager.
    ///
    /// Fails with [`ObjectError::StaleHandle`] if the object is gone.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> Result<R> {
        global::with_manager(|manager| manager.get(*self).map(f).ok_or(ObjectError::StaleHandle))?
    }

    /// Run `f` on the referent held by the process-wide manager, mutably
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R> {
        global::with_manager_mut(|manager| manager.get_mut(*self).map(f).ok_or(ObjectError::StaleHandle))?
    }

    /// Like [`ObjectPtr::with`], with every failure folded into `None`
    pub fn try_with<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.with(f).ok()
    }

    /// Like [`ObjectPtr::with_mut`], with every failure folded into `None`
    pub fn try_with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.with_mut(f).ok()
    }
}

impl<T: ?Sized> Clone for ObjectPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for ObjectPtr<T> {}

/// Structural equality: slot and generation. Use
/// [`ObjectPtr::is_same_object`] to also require liveness.
impl<T: ?Sized> PartialEq for ObjectPtr<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T: ?Sized> Eq for ObjectPtr<T> {}

impl<T: ?Sized> Hash for ObjectPtr<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.slot().hash(state);
    }
}

impl<T: ?Sized> Default for ObjectPtr<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: ?Sized> fmt::Debug for ObjectPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "ObjectPtr<{}>(null)", type_name::<T>())
        } else {
            write!(f, "ObjectPtr<{}>({}v{})", type_name::<T>(), self.index, self.generation)
        }
    }
}

/// Handles are runtime-only; they reflect as [`Value::Opaque`] and are
/// left out of documents.
impl<T: ?Sized> IntoValue for ObjectPtr<T> {
    fn into_value(self) -> Value {
        Value::Opaque(format!("ObjectPtr<{}>", type_name::<T>()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectBase;

    #[derive(Default)]
    struct Marker {
        base: ObjectBase,
    }
    crate::impl_object!(Marker);

    #[test]
    fn test_null_handle() {
        let manager = ObjectManager::new();
        let ptr = ObjectPtr::<Marker>::null();
        assert!(ptr.is_null());
        assert!(!ptr.is_valid_in(&manager));
        assert_eq!(ptr, ObjectPtr::default());
    }

    #[test]
    fn test_equality_ignores_address() {
        let a = ObjectPtr::<Marker>::from_parts(SlotHandle::new(2, 5), 0x1000);
        let b = ObjectPtr::<Marker>::from_parts(SlotHandle::new(2, 5), 0x2000);
        let c = ObjectPtr::<Marker>::from_parts(SlotHandle::new(2, 6), 0x1000);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.erase().slot(), a.slot());
    }

    #[test]
    fn test_same_object_requires_liveness() {
        let mut manager = ObjectManager::new();
        let a = manager.create(Marker::default()).unwrap();
        let b = a;
        assert!(a.is_same_object_in(&b, &manager));

        manager.destroy(a);
        assert!(!a.is_same_object_in(&b, &manager));
    }

    #[test]
    fn test_reflects_as_opaque() {
        let value = ObjectPtr::<Marker>::null().into_value();
        assert!(matches!(value, Value::Opaque(name) if name.contains("Marker")));
    }
}
