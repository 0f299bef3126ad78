//! Process-wide object manager
//!
//! The global pool must be brought up with [`initialize`] before the first
//! [`create`] and can be torn down with [`shutdown`], which destroys every
//! object. The generation table survives a shutdown, so handles minted
//! before it stay invalid after a later re-initialize.
//!
//! Access is funneled through [`with_manager`] / [`with_manager_mut`]. A
//! mutable access that re-enters the pool on the same thread (for example
//! from an object's `Drop`) fails with [`ObjectError::PoolBusy`] instead of
//! deadlocking.

use std::cell::RefCell;

use parking_lot::{const_reentrant_mutex, ReentrantMutex};

use crate::error::{ObjectError, Result};
use crate::manager::{ObjectManager, ObjectManagerConfig};
use crate::object::Object;
use crate::ptr::ObjectPtr;

struct GlobalState {
    /// Kept across shutdown for its generation table
    manager: Option<ObjectManager>,
    active: bool,
}

static GLOBAL: ReentrantMutex<RefCell<GlobalState>> = const_reentrant_mutex(RefCell::new(GlobalState {
    manager: None,
    active: false,
}));

/// Bring up the global pool.
///
/// Returns `false` (and leaves the running pool untouched) if it is already
/// initialized.
pub fn initialize(config: ObjectManagerConfig) -> bool {
    let guard = GLOBAL.lock();
    let Ok(mut state) = guard.try_borrow_mut() else {
        log::warn!("object manager initialize while the pool is borrowed");
        return false;
    };
    if state.active {
        log::debug!("object manager already initialized");
        return false;
    }

    match state.manager.as_mut() {
        Some(manager) => manager.configure(config),
        None => state.manager = Some(ObjectManager::with_config(config)),
    }
    state.active = true;
    log::info!("object manager initialized");
    true
}

/// Destroy every object and deactivate the global pool.
///
/// Returns the number of objects destroyed.
pub fn shutdown() -> usize {
    let guard = GLOBAL.lock();
    let Ok(mut state) = guard.try_borrow_mut() else {
        log::warn!("object manager shutdown while the pool is borrowed");
        return 0;
    };
    if !state.active {
        return 0;
    }
    state.active = false;

    let destroyed = state.manager.as_mut().map(ObjectManager::destroy_all).unwrap_or(0);
    log::info!("object manager shut down ({} objects destroyed)", destroyed);
    destroyed
}

/// Whether the global pool is up
pub fn is_initialized() -> bool {
    let guard = GLOBAL.lock();
    let initialized = guard.try_borrow().map(|state| state.active).unwrap_or(true);
    initialized
}

/// Run `f` with shared access to the global pool
pub fn with_manager<R>(f: impl FnOnce(&ObjectManager) -> R) -> Result<R> {
    let guard = GLOBAL.lock();
    let state = guard.try_borrow().map_err(|_| ObjectError::PoolBusy)?;
    match state.manager.as_ref() {
        Some(manager) if state.active => Ok(f(manager)),
        _ => Err(ObjectError::NotInitialized),
    }
}

/// Run `f` with exclusive access to the global pool
pub fn with_manager_mut<R>(f: impl FnOnce(&mut ObjectManager) -> R) -> Result<R> {
    let guard = GLOBAL.lock();
    let mut state = guard.try_borrow_mut().map_err(|_| ObjectError::PoolBusy)?;
    let state = &mut *state;
    match state.manager.as_mut() {
        Some(manager) if state.active => Ok(f(manager)),
        _ => Err(ObjectError::NotInitialized),
    }
}

/// Create an object in the global pool
pub fn create<T: Object>(object: T) -> Result<ObjectPtr<T>> {
    with_manager_mut(|manager| manager.create(object))?
}

/// Destroy an object in the global pool; `false` if the handle is stale
/// or the pool is unavailable
pub fn destroy<T: ?Sized>(ptr: ObjectPtr<T>) -> bool {
    with_manager_mut(|manager| manager.destroy(ptr)).unwrap_or_else(|err| {
        log::warn!("destroy {:?}: {}", ptr, err);
        false
    })
}

/// Validate a handle against the global pool
pub fn is_valid_ptr(index: u32, generation: u32, addr: usize) -> bool {
    with_manager(|manager| manager.is_valid_ptr(index, generation, addr)).unwrap_or(false)
}

/// First live object of type `T`, or the null handle
pub fn find_object_by_type<T: Object>() -> ObjectPtr<T> {
    with_manager(ObjectManager::find_object_by_type::<T>).unwrap_or_default()
}

/// Every live object of type `T`, in ascending slot order
pub fn find_objects_by_type<T: Object>() -> Vec<ObjectPtr<T>> {
    with_manager(ObjectManager::find_objects_by_type::<T>).unwrap_or_default()
}
