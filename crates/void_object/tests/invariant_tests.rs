//! Invariant tests for void_object
//!
//! Handle validity rules that must hold for every pool

use void_object::prelude::*;

#[derive(Default)]
struct Rock {
    base: ObjectBase,
    mass: u32,
}
impl_object!(Rock);

#[derive(Default)]
struct Tree {
    base: ObjectBase,
}
impl_object!(Tree);

struct Cloud {
    base: ObjectBase,
}
impl_object!(Cloud);

/// INVARIANT: a slot's generation strictly increases across create/destroy cycles
#[test]
fn invariant_generation_monotonic() {
    let mut manager = ObjectManager::new();
    let mut handles = Vec::new();

    for mass in 0..32 {
        let ptr = manager.create(Rock { mass, ..Default::default() }).unwrap();
        if let Some(last) = handles.last() {
            let last: &ObjectPtr<Rock> = last;
            assert_eq!(ptr.index(), last.index());
            assert!(ptr.generation() > last.generation());
        }
        assert!(manager.destroy(ptr));
        handles.push(ptr);
    }

    for ptr in &handles {
        assert!(!ptr.is_valid_in(&manager));
    }
}

/// INVARIANT: a handle from generation G never validates against generation G+1
#[test]
fn invariant_no_aliasing_across_generations() {
    let mut manager = ObjectManager::new();
    let old = manager.create(Rock { mass: 1, ..Default::default() }).unwrap();
    manager.destroy(old);
    let new = manager.create(Rock { mass: 2, ..Default::default() }).unwrap();

    assert_eq!(old.index(), new.index());
    assert!(!old.is_valid_in(&manager));
    assert!(manager.get(old).is_none());
    assert_eq!(manager.get(new).unwrap().mass, 2);
    assert!(!old.is_same_object_in(&new, &manager));
}

/// INVARIANT: self_ptr is valid and the same object as the creating handle
#[test]
fn invariant_self_ptr_identity() {
    let mut manager = ObjectManager::new();
    let _filler = manager.create(Tree::default()).unwrap();
    let ptr = manager.create(Rock::default()).unwrap();

    let self_ptr = manager.get(ptr).unwrap().self_ptr();
    assert!(self_ptr.is_valid_in(&manager));
    assert!(self_ptr.is_same_object_in(&ptr, &manager));
    assert!(ptr.is_same_object_in(&self_ptr, &manager));
}

/// INVARIANT: find-by-type returns exactly the live instances of that type
#[test]
fn invariant_find_by_type_complete() {
    let mut manager = ObjectManager::new();
    let a1 = manager.create(Rock::default()).unwrap();
    let b = manager.create(Tree::default()).unwrap();
    let a2 = manager.create(Rock::default()).unwrap();

    let rocks = manager.find_objects_by_type::<Rock>();
    assert_eq!(rocks.len(), 2);
    assert!(rocks.contains(&a1));
    assert!(rocks.contains(&a2));
    assert_eq!(manager.find_objects_by_type::<Tree>(), vec![b]);

    let cloud = manager.find_object_by_type::<Cloud>();
    assert!(!cloud.is_valid_in(&manager));
}

/// INVARIANT: destroying twice is harmless
#[test]
fn invariant_double_destroy_safe() {
    let mut manager = ObjectManager::new();
    let ptr = manager.create(Rock::default()).unwrap();
    let keep = manager.create(Tree::default()).unwrap();

    assert!(manager.destroy(ptr));
    for _ in 0..3 {
        assert!(!manager.destroy(ptr));
    }
    assert_eq!(manager.len(), 1);
    assert!(keep.is_valid_in(&manager));
}

/// INVARIANT: exhaustion is reported, never an invalid handle
#[test]
fn invariant_exhaustion_reported() {
    let config = ObjectManagerConfig::default().with_initial_capacity(1).with_max_objects(1);
    let mut manager = ObjectManager::with_config(config);
    manager.create(Tree::default()).unwrap();

    match manager.create(Tree::default()) {
        Err(ObjectError::PoolExhausted { .. }) => {}
        other => panic!("expected exhaustion, got {:?}", other.map(|p| p.index())),
    }
}

/// INVARIANT: handles never keep objects alive and are cheap copies
#[test]
fn invariant_handles_do_not_own() {
    let mut manager = ObjectManager::new();
    let ptr = manager.create(Rock::default()).unwrap();
    let copies = vec![ptr; 16];

    manager.destroy(ptr);
    assert!(manager.is_empty());
    assert!(copies.iter().all(|c| !c.is_valid_in(&manager)));
}
