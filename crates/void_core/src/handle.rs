//! Generational slot bookkeeping
//!
//! A [`SlotTable`] hands out `(index, generation)` pairs and tracks which
//! slots are occupied. Generations let holders of a stale pair detect that
//! the slot has since been freed (and possibly reused).
//!
//! Generation rules:
//! - fresh slots start at generation 1; generation 0 only appears in the
//!   null handle, so an all-zero handle never matches a live slot
//! - every free bumps the slot's generation
//! - a slot whose generation reaches `u32::MAX` is retired and never reused

use core::fmt;
use core::hash::{Hash, Hasher};

/// First generation given to a fresh slot
pub const FIRST_GENERATION: u32 = 1;

/// Untyped `(index, generation)` pair
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SlotHandle {
    index: u32,
    generation: u32,
}

impl SlotHandle {
    /// Create a handle from index and generation
    #[inline]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Create an invalid/null handle
    #[inline]
    pub const fn null() -> Self {
        Self {
            index: u32::MAX,
            generation: 0,
        }
    }

    /// Check if this handle is null
    #[inline]
    pub const fn is_null(&self) -> bool {
        self.index == u32::MAX
    }

    /// Get the index portion
    #[inline]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Get the generation portion
    #[inline]
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    /// Pack into 64 bits (generation high, index low)
    #[inline]
    pub const fn to_bits(&self) -> u64 {
        ((self.generation as u64) << 32) | (self.index as u64)
    }

    /// Unpack from [`SlotHandle::to_bits`]
    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        Self {
            index: bits as u32,
            generation: (bits >> 32) as u32,
        }
    }
}

impl Default for SlotHandle {
    fn default() -> Self {
        Self::null()
    }
}

impl Hash for SlotHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_bits().hash(state);
    }
}

impl fmt::Debug for SlotHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "SlotHandle(null)")
        } else {
            write!(f, "SlotHandle({}v{})", self.index, self.generation)
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Slot {
    generation: u32,
    occupied: bool,
}

impl Slot {
    #[inline]
    fn is_retired(&self) -> bool {
        self.generation == u32::MAX
    }
}

/// Generation table with free-list reuse
#[derive(Debug, Clone, Default)]
pub struct SlotTable {
    slots: Vec<Slot>,
    /// Free indices, reused LIFO
    free_list: Vec<u32>,
    len: usize,
    /// Upper bound on the number of slots, `None` for unbounded growth
    max_slots: Option<usize>,
}

impl SlotTable {
    /// Create an unbounded table
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with initial capacity and an optional slot limit
    pub fn with_capacity(capacity: usize, max_slots: Option<usize>) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            len: 0,
            max_slots,
        }
    }

    /// Change the slot limit. Existing slots are never dropped.
    pub fn set_max_slots(&mut self, max_slots: Option<usize>) {
        self.max_slots = max_slots;
    }

    /// Slot limit, if any
    pub fn max_slots(&self) -> Option<usize> {
        self.max_slots
    }

    /// Occupy a slot, reusing a freed one when available.
    ///
    /// Returns `None` when no slot is free and the table may not grow.
    pub fn allocate(&mut self) -> Option<SlotHandle> {
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            debug_assert!(!slot.occupied && !slot.is_retired());
            slot.occupied = true;
            self.len += 1;
            return Some(SlotHandle::new(index, slot.generation));
        }

        let index = self.slots.len();
        // u32::MAX is the null index
        if index >= u32::MAX as usize {
            return None;
        }
        if let Some(max) = self.max_slots {
            if index >= max {
                return None;
            }
        }

        self.slots.push(Slot {
            generation: FIRST_GENERATION,
            occupied: true,
        });
        self.len += 1;
        Some(SlotHandle::new(index as u32, FIRST_GENERATION))
    }

    /// Free a slot and bump its generation.
    ///
    /// Returns `false` if the handle was already stale.
    pub fn free(&mut self, handle: SlotHandle) -> bool {
        if !self.is_valid(handle) {
            return false;
        }

        let slot = &mut self.slots[handle.index() as usize];
        slot.occupied = false;
        slot.generation += 1;
        self.len -= 1;

        if slot.is_retired() {
            log::debug!("slot {} retired after exhausting its generations", handle.index());
        } else {
            self.free_list.push(handle.index());
        }
        true
    }

    /// Check if a handle refers to an occupied slot at the same generation
    #[inline]
    pub fn is_valid(&self, handle: SlotHandle) -> bool {
        if handle.is_null() {
            return false;
        }
        self.slots
            .get(handle.index() as usize)
            .map(|s| s.occupied && s.generation == handle.generation())
            .unwrap_or(false)
    }

    /// Current generation of a slot
    pub fn generation_of(&self, index: u32) -> Option<u32> {
        self.slots.get(index as usize).map(|s| s.generation)
    }

    /// Whether a slot is currently occupied
    pub fn is_occupied(&self, index: u32) -> bool {
        self.slots
            .get(index as usize)
            .map(|s| s.occupied)
            .unwrap_or(false)
    }

    /// Live handle for an occupied slot
    pub fn handle_at(&self, index: u32) -> Option<SlotHandle> {
        let slot = self.slots.get(index as usize)?;
        slot.occupied.then(|| SlotHandle::new(index, slot.generation))
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if no slot is occupied
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total number of slots ever created (occupied, free or retired)
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Iterate over handles of occupied slots in index order
    pub fn iter(&self) -> impl Iterator<Item = SlotHandle> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.occupied)
            .map(|(i, s)| SlotHandle::new(i as u32, s.generation))
    }
}
