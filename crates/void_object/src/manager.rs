//! The object pool
//!
//! [`ObjectManager`] is the sole owner of every live object. Objects sit in
//! boxed slots indexed by a [`SlotTable`]; freeing a slot bumps its
//! generation so that old handles stop validating, even once the slot has
//! been handed to a new object.

use std::any::{type_name, TypeId};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::Deserialize;
use void_core::{SlotHandle, SlotTable};

use crate::component::GameObject;
use crate::error::{ObjectError, Result};
use crate::object::{address_of, Object};
use crate::ptr::{AnyObjectPtr, ObjectPtr};

/// Pool configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ObjectManagerConfig {
    /// Slots reserved up front
    pub initial_capacity: usize,
    /// Hard slot limit, `None` to grow without bound
    pub max_objects: Option<usize>,
}

impl Default for ObjectManagerConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 256,
            max_objects: None,
        }
    }
}

impl ObjectManagerConfig {
    /// Set initial capacity
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Set the slot limit
    pub fn with_max_objects(mut self, max: usize) -> Self {
        self.max_objects = Some(max);
        self
    }
}

/// Owner of all live objects and arbiter of handle validity
pub struct ObjectManager {
    config: ObjectManagerConfig,
    slots: SlotTable,
    objects: Vec<Option<Box<dyn Object>>>,
    /// Occupied slot indices per concrete type
    type_index: HashMap<TypeId, BTreeSet<u32>>,
}

impl ObjectManager {
    /// Create a pool with default configuration
    pub fn new() -> Self {
        Self::with_config(ObjectManagerConfig::default())
    }

    /// Create a pool with the given configuration
    pub fn with_config(config: ObjectManagerConfig) -> Self {
        let capacity = match config.max_objects {
            Some(max) => config.initial_capacity.min(max),
            None => config.initial_capacity,
        };
        Self {
            slots: SlotTable::with_capacity(capacity, config.max_objects),
            objects: Vec::with_capacity(capacity),
            type_index: HashMap::new(),
            config,
        }
    }

    /// Current configuration
    pub fn config(&self) -> &ObjectManagerConfig {
        &self.config
    }

    /// Apply a new configuration. Live objects are kept even if they
    /// exceed a lowered limit; only further growth is refused.
    pub fn configure(&mut self, config: ObjectManagerConfig) {
        self.slots.set_max_slots(config.max_objects);
        self.config = config;
    }

    /// Move `object` into the pool and return a handle to it
    pub fn create<T: Object>(&mut self, object: T) -> Result<ObjectPtr<T>> {
        self.create_boxed(Box::new(object)).map(ObjectPtr::cast)
    }

    /// Move an already boxed object into the pool
    pub fn create_boxed(&mut self, mut object: Box<dyn Object>) -> Result<AnyObjectPtr> {
        let Some(handle) = self.slots.allocate() else {
            log::error!(
                "object pool exhausted creating {} ({} live, {} slots)",
                (*object).object_type_name(),
                self.slots.len(),
                self.slots.capacity()
            );
            return Err(ObjectError::PoolExhausted {
                capacity: self.slots.capacity(),
                live: self.slots.len(),
            });
        };

        object.base_mut().bind(handle);
        let type_id = (*object).as_any().type_id();
        let addr = address_of(&*object);

        let index = handle.index() as usize;
        if index >= self.objects.len() {
            self.objects.resize_with(index + 1, || None);
        }
        self.objects[index] = Some(object);
        self.type_index.entry(type_id).or_default().insert(handle.index());

        Ok(ObjectPtr::from_parts(handle, addr))
    }

    /// Destroy the object behind `ptr`.
    ///
    /// Destroying a stale handle is a logged no-op returning `false`.
    /// Destroying a [`GameObject`] also destroys its components.
    pub fn destroy<T: ?Sized>(&mut self, ptr: ObjectPtr<T>) -> bool {
        if !ptr.is_valid_in(self) {
            log::warn!("destroy on stale handle {:?}", ptr);
            return false;
        }
        self.destroy_slot(ptr.slot())
    }

    /// Destroy every live object, returning how many were destroyed.
    ///
    /// Generations are kept, so handles minted before stay invalid.
    pub fn destroy_all(&mut self) -> usize {
        let before = self.slots.len();
        let handles: Vec<SlotHandle> = self.slots.iter().collect();
        for handle in handles {
            if self.slots.is_valid(handle) {
                self.destroy_slot(handle);
            }
        }
        before - self.slots.len()
    }

    fn destroy_slot(&mut self, handle: SlotHandle) -> bool {
        let index = handle.index();
        let Some(mut object) = self.objects.get_mut(index as usize).and_then(Option::take) else {
            return false;
        };
        self.slots.free(handle);

        let type_id = (*object).as_any().type_id();
        if let Some(indices) = self.type_index.get_mut(&type_id) {
            indices.remove(&index);
            if indices.is_empty() {
                self.type_index.remove(&type_id);
            }
        }

        if let Some(game_object) = (*object).downcast_mut::<GameObject>() {
            for component in std::mem::take(&mut game_object.components) {
                if component.is_valid_in(self) {
                    self.destroy_slot(component.slot());
                }
            }
        } else if let Some(owner) = object.component_owner() {
            if let Some(game_object) = self.get_mut(owner) {
                game_object.components.retain(|c| c.slot() != handle);
            }
        }

        log::trace!("destroyed {} at {:?}", (*object).object_type_name(), handle);
        object.base_mut().unbind();
        true
    }

    /// The single source of truth for handle validity.
    ///
    /// Valid iff the slot is occupied at `generation` and holds the object
    /// stored at `addr`.
    pub fn is_valid_ptr(&self, index: u32, generation: u32, addr: usize) -> bool {
        if !self.slots.is_valid(SlotHandle::new(index, generation)) {
            return false;
        }
        self.objects
            .get(index as usize)
            .and_then(Option::as_deref)
            .map(|object| address_of(object) == addr)
            .unwrap_or(false)
    }

    /// Rebuild a handle for an object that knows its own identity.
    ///
    /// Does not scan the pool. In debug builds, asserts that `instance` is
    /// the very object stored at `index`.
    pub fn get_ptr_fast<T: Object>(&self, instance: &T, index: u32, generation: u32) -> ObjectPtr<T> {
        let ptr = ObjectPtr::from_instance(instance, SlotHandle::new(index, generation));
        debug_assert!(
            ptr.is_valid_in(self),
            "get_ptr_fast: {} is not the object stored at slot {}v{}",
            type_name::<T>(),
            index,
            generation
        );
        ptr
    }

    /// Borrow a live object
    pub fn get<T: Object>(&self, ptr: ObjectPtr<T>) -> Option<&T> {
        self.get_dyn(ptr)?.downcast_ref()
    }

    /// Mutably borrow a live object
    pub fn get_mut<T: Object>(&mut self, ptr: ObjectPtr<T>) -> Option<&mut T> {
        self.get_dyn_mut(ptr)?.downcast_mut()
    }

    /// Borrow a live object without knowing its type
    pub fn get_dyn<T: ?Sized>(&self, ptr: ObjectPtr<T>) -> Option<&(dyn Object + 'static)> {
        if !ptr.is_valid_in(self) {
            return None;
        }
        self.objects.get(ptr.index() as usize)?.as_deref()
    }

    /// Mutably borrow a live object without knowing its type
    pub fn get_dyn_mut<T: ?Sized>(&mut self, ptr: ObjectPtr<T>) -> Option<&mut (dyn Object + 'static)> {
        if !ptr.is_valid_in(self) {
            return None;
        }
        let object = self.objects.get_mut(ptr.index() as usize)?.as_mut()?;
        Some(&mut **object)
    }

    /// Recover a typed handle from an erased one
    pub fn typed<T: Object>(&self, ptr: AnyObjectPtr) -> Option<ObjectPtr<T>> {
        self.get_dyn(ptr)?.is::<T>().then(|| ptr.cast())
    }

    /// First live object of type `T` (lowest slot), or the null handle
    pub fn find_object_by_type<T: Object>(&self) -> ObjectPtr<T> {
        self.typed_handles::<T>().next().unwrap_or_default()
    }

    /// Every live object of type `T`, in ascending slot order
    pub fn find_objects_by_type<T: Object>(&self) -> Vec<ObjectPtr<T>> {
        self.typed_handles::<T>().collect()
    }

    fn typed_handles<T: Object>(&self) -> impl Iterator<Item = ObjectPtr<T>> + '_ {
        self.type_index
            .get(&TypeId::of::<T>())
            .into_iter()
            .flatten()
            .filter_map(move |&index| self.ptr_at(index))
            .map(ObjectPtr::cast)
    }

    fn ptr_at(&self, index: u32) -> Option<AnyObjectPtr> {
        let handle = self.slots.handle_at(index)?;
        let object = self.objects.get(index as usize)?.as_deref()?;
        Some(ObjectPtr::from_parts(handle, address_of(object)))
    }

    /// Iterate over all live objects in slot order
    pub fn iter(&self) -> impl Iterator<Item = (AnyObjectPtr, &(dyn Object + 'static))> + '_ {
        self.slots.iter().filter_map(move |handle| {
            let object = self.objects.get(handle.index() as usize)?.as_deref()?;
            Some((ObjectPtr::from_parts(handle, address_of(object)), object))
        })
    }

    /// Number of live objects
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if no object is alive
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots ever created
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Current generation of a slot
    pub fn generation_of(&self, index: u32) -> Option<u32> {
        self.slots.generation_of(index)
    }
}

impl Default for ObjectManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ObjectManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectManager")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("config", &self.config)
            .finish()
    }
}
