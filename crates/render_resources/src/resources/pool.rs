//! Generation-Validated Slot Pool
//!
//! Stores native resources in array slots tagged with a per-slot generation
//! counter. This is the only place where slot reuse and generation bumping
//! happens; everything above it works in terms of [`PoolHandle`]s.
//!
//! # Architecture
//!
//! ```text
//! SlotPool<T>
//!     ├── slots:     [Slot { resource: Option<T>, generation }]
//!     ├── free list: VecDeque<u32>   (FIFO reuse)
//!     └── high water cursor          (highest index ever handed out + 1)
//!
//! allocated + free == high_water <= capacity
//! ```
//!
//! # Usage
//!
//! ```rust
//! use render_resources::resources::pool::SlotPool;
//!
//! let mut pool = SlotPool::with_capacity(4);
//! let handle = pool.allocate("vertex buffer");
//! assert_eq!(pool.try_get(handle), Some(&"vertex buffer"));
//!
//! assert!(pool.release(handle));
//! assert!(pool.try_get(handle).is_none());
//! assert!(!pool.release(handle));
//! ```

use std::collections::VecDeque;
use std::fmt;

/// Capacity used by [`SlotPool::new`]
pub const DEFAULT_POOL_CAPACITY: usize = 16;

/// Internal pool handle: slot index plus the generation it was issued with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolHandle {
    /// Slot index in the pool
    pub index: u32,
    /// Generation of the slot when this handle was issued
    pub generation: u32,
}

impl PoolHandle {
    /// Index value reserved for the "never allocated" sentinel
    pub const SENTINEL_INDEX: u32 = u32::MAX;

    /// Create a pool handle from raw parts
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// The sentinel handle, which never resolves in any pool
    pub const fn invalid() -> Self {
        Self {
            index: Self::SENTINEL_INDEX,
            generation: 0,
        }
    }

    /// Whether this is the sentinel handle
    pub const fn is_sentinel(&self) -> bool {
        self.index == Self::SENTINEL_INDEX
    }
}

impl Default for PoolHandle {
    fn default() -> Self {
        Self::invalid()
    }
}

/// One array position in the pool
#[derive(Debug)]
struct Slot<T> {
    resource: Option<T>,
    generation: u32,
}

impl<T> Slot<T> {
    const fn vacant() -> Self {
        Self {
            resource: None,
            generation: 0,
        }
    }

    /// Store a resource and advance the generation. Generation 0 is never issued.
    fn occupy(&mut self, resource: T) -> u32 {
        debug_assert!(self.resource.is_none(), "occupying a slot that still holds a resource");
        self.generation = self.generation.wrapping_add(1).max(1);
        self.resource = Some(resource);
        self.generation
    }
}

/// Occupancy snapshot of a [`SlotPool`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Slots currently holding a resource
    pub allocated: usize,
    /// Released slots waiting for reuse
    pub free: usize,
    /// Highest index ever handed out + 1 (since the last clear)
    pub high_water: usize,
    /// Slots the pool can hold before its next doubling
    pub capacity: usize,
}

impl fmt::Display for PoolStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} allocated, {} free, high water {}, capacity {}",
            self.allocated, self.free, self.high_water, self.capacity
        )
    }
}

/// Single-owner generational container for native resources
///
/// Lookups and releases are total: a stale, out-of-range or sentinel handle
/// yields `None`/`false` and never panics.
pub struct SlotPool<T> {
    slots: Vec<Slot<T>>,
    free_list: VecDeque<u32>,
    high_water: u32,
    capacity: usize,
    allocated: usize,
}

impl<T> SlotPool<T> {
    /// Create a pool with [`DEFAULT_POOL_CAPACITY`] slots
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_POOL_CAPACITY)
    }

    /// Create a pool with room for `capacity` resources before the first doubling
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: VecDeque::new(),
            high_water: 0,
            capacity,
            allocated: 0,
        }
    }

    /// Take ownership of `resource` and return a handle to it
    ///
    /// Reuses the oldest released slot if there is one, bumping its
    /// generation. Otherwise appends at the high water cursor, doubling the
    /// capacity first when the pool is full.
    pub fn allocate(&mut self, resource: T) -> PoolHandle {
        if let Some(index) = self.free_list.pop_front() {
            let generation = self.slots[index as usize].occupy(resource);
            self.allocated += 1;
            return PoolHandle::new(index, generation);
        }

        if self.high_water as usize == self.capacity {
            self.grow();
        }

        let index = self.high_water;
        assert!(index != PoolHandle::SENTINEL_INDEX, "slot pool index space exhausted");

        // Slots past the cursor survive `clear`, so their generation carries on.
        if index as usize == self.slots.len() {
            self.slots.push(Slot::vacant());
        }
        let generation = self.slots[index as usize].occupy(resource);
        self.high_water += 1;
        self.allocated += 1;

        PoolHandle::new(index, generation)
    }

    fn grow(&mut self) {
        let new_capacity = self.capacity * 2;
        self.slots.reserve_exact(new_capacity - self.slots.len());
        log::trace!("SlotPool grew from {} to {} slots", self.capacity, new_capacity);
        self.capacity = new_capacity;
    }

    fn live_slot(&self, handle: PoolHandle) -> Option<&Slot<T>> {
        if handle.is_sentinel() || handle.index >= self.high_water {
            return None;
        }
        let slot = &self.slots[handle.index as usize];
        (slot.generation == handle.generation && slot.resource.is_some()).then_some(slot)
    }

    /// Whether `handle` currently resolves to a resource in this pool
    pub fn is_valid(&self, handle: PoolHandle) -> bool {
        self.live_slot(handle).is_some()
    }

    /// Resolve `handle`, or `None` if it is sentinel, out of range, stale or released
    pub fn try_get(&self, handle: PoolHandle) -> Option<&T> {
        self.live_slot(handle)?.resource.as_ref()
    }

    /// Mutable variant of [`SlotPool::try_get`]
    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        if !self.is_valid(handle) {
            return None;
        }
        self.slots[handle.index as usize].resource.as_mut()
    }

    /// Generation currently stored at `index`, if the index is below the high water cursor
    pub fn slot_generation(&self, index: u32) -> Option<u32> {
        (index < self.high_water).then(|| self.slots[index as usize].generation)
    }

    /// Whether the slot at `index` currently holds a resource
    pub fn is_occupied(&self, index: u32) -> bool {
        index < self.high_water && self.slots[index as usize].resource.is_some()
    }

    /// Remove the resource behind `handle` and hand ownership back to the caller
    ///
    /// The slot's generation is left untouched; it is bumped by the next
    /// [`SlotPool::allocate`] that reuses the slot.
    pub fn remove(&mut self, handle: PoolHandle) -> Option<T> {
        if !self.is_valid(handle) {
            return None;
        }
        let resource = self.slots[handle.index as usize].resource.take();
        self.free_list.push_back(handle.index);
        self.allocated -= 1;
        resource
    }

    /// Release `handle`, passing its resource to `dispose`
    ///
    /// Returns `false` and does nothing if the handle does not resolve.
    pub fn release_with(&mut self, handle: PoolHandle, dispose: impl FnOnce(T)) -> bool {
        match self.remove(handle) {
            Some(resource) => {
                dispose(resource);
                true
            }
            None => false,
        }
    }

    /// Release `handle`, disposing its resource by dropping it
    pub fn release(&mut self, handle: PoolHandle) -> bool {
        self.release_with(handle, drop)
    }

    /// Dispose every live resource through `dispose` and reset the cursor
    ///
    /// The backing array and the per-slot generations are kept, so handles
    /// issued before the clear never resolve again.
    pub fn clear_with(&mut self, mut dispose: impl FnMut(T)) {
        for slot in &mut self.slots[..self.high_water as usize] {
            if let Some(resource) = slot.resource.take() {
                dispose(resource);
            }
        }
        self.free_list.clear();
        self.high_water = 0;
        self.allocated = 0;
    }

    /// Drop every live resource and reset the cursor
    pub fn clear(&mut self) {
        self.clear_with(drop);
    }

    /// Iterate over live resources with their handles
    pub fn iter(&self) -> impl Iterator<Item = (PoolHandle, &T)> + '_ {
        self.slots[..self.high_water as usize]
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                slot.resource
                    .as_ref()
                    .map(|resource| (PoolHandle::new(index as u32, slot.generation), resource))
            })
    }

    /// Number of slots currently holding a resource
    pub fn allocated_count(&self) -> usize {
        self.allocated
    }

    /// Number of released slots queued for reuse
    pub fn free_slot_count(&self) -> usize {
        self.free_list.len()
    }

    /// Highest index ever handed out + 1, since the last clear
    pub fn high_water(&self) -> usize {
        self.high_water as usize
    }

    /// Slots available before the next doubling
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether no slot currently holds a resource
    pub fn is_empty(&self) -> bool {
        self.allocated == 0
    }

    /// Occupancy snapshot
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            allocated: self.allocated_count(),
            free: self.free_slot_count(),
            high_water: self.high_water(),
            capacity: self.capacity(),
        }
    }
}

impl<T> Default for SlotPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SlotPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotPool").field("stats", &self.stats()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Counts how many times it has been dropped
    struct DropCounter(Rc<Cell<usize>>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    fn assert_accounting<T>(pool: &SlotPool<T>) {
        assert_eq!(pool.allocated_count() + pool.free_slot_count(), pool.high_water());
        assert!(pool.high_water() <= pool.capacity());
    }

    #[test]
    fn test_allocate_then_get() {
        let mut pool = SlotPool::new();
        let a = pool.allocate(10);
        let b = pool.allocate(20);

        assert_eq!(a, PoolHandle::new(0, 1));
        assert_eq!(b, PoolHandle::new(1, 1));
        assert_eq!(pool.try_get(a), Some(&10));
        assert_eq!(pool.try_get(b), Some(&20));
        assert_accounting(&pool);
    }

    #[test]
    fn test_reuse_bumps_generation() {
        let mut pool = SlotPool::new();
        let old = pool.allocate("old");
        assert!(pool.release(old));

        let new = pool.allocate("new");
        assert_eq!(new.index, old.index);
        assert!(new.generation > old.generation);
        assert_ne!(old, new);

        assert!(pool.try_get(old).is_none());
        assert_eq!(pool.try_get(new), Some(&"new"));
    }

    #[test]
    fn test_release_does_not_bump_generation() {
        let mut pool = SlotPool::new();
        let handle = pool.allocate(1u8);
        assert!(pool.release(handle));
        assert_eq!(pool.slot_generation(handle.index), Some(1));
        assert!(!pool.is_occupied(handle.index));
    }

    #[test]
    fn test_generation_wraps_past_zero() {
        let mut pool = SlotPool::new();
        let first = pool.allocate("first");
        pool.release(first);
        pool.slots[first.index as usize].generation = u32::MAX - 1;

        let last = pool.allocate("last");
        assert_eq!(last.generation, u32::MAX);
        pool.release(last);

        let wrapped = pool.allocate("wrapped");
        assert_eq!(wrapped.index, last.index);
        assert_eq!(wrapped.generation, 1);
        assert!(pool.try_get(last).is_none());
        assert!(!pool.is_valid(PoolHandle::new(last.index, 0)));
        assert_eq!(pool.try_get(wrapped), Some(&"wrapped"));
    }

    #[test]
    fn test_double_release_disposes_once() {
        let drops = Rc::new(Cell::new(0));
        let mut pool = SlotPool::new();
        let handle = pool.allocate(DropCounter(drops.clone()));

        assert!(pool.release(handle));
        assert_eq!(drops.get(), 1);
        assert!(!pool.release(handle));
        assert_eq!(drops.get(), 1);
        assert_accounting(&pool);
    }

    #[test]
    fn test_release_with_hands_over_resource() {
        let mut pool = SlotPool::new();
        let handle = pool.allocate(String::from("texture"));
        let mut disposed = Vec::new();

        assert!(pool.release_with(handle, |res| disposed.push(res)));
        assert!(!pool.release_with(handle, |res| disposed.push(res)));
        assert_eq!(disposed, vec![String::from("texture")]);
    }

    #[test]
    fn test_sentinel_never_resolves() {
        let mut pool = SlotPool::new();
        assert!(pool.try_get(PoolHandle::invalid()).is_none());

        for value in 0..5 {
            pool.allocate(value);
        }
        assert!(pool.try_get(PoolHandle::invalid()).is_none());
        assert!(!pool.is_valid(PoolHandle::invalid()));
        assert!(!pool.release(PoolHandle::invalid()));
    }

    #[test]
    fn test_out_of_range_handle() {
        let mut pool = SlotPool::with_capacity(2);
        pool.allocate(1);
        assert!(pool.try_get(PoolHandle::new(1, 1)).is_none());
        assert!(pool.try_get(PoolHandle::new(500, 1)).is_none());
        assert!(!pool.release(PoolHandle::new(500, 1)));
    }

    #[test]
    fn test_growth_doubles_once_and_preserves_handles() {
        let mut pool = SlotPool::with_capacity(4);
        let handles: Vec<_> = (0..4).map(|value| pool.allocate(value)).collect();
        assert_eq!(pool.capacity(), 4);

        let extra = pool.allocate(4);
        assert_eq!(pool.capacity(), 8);

        for (value, handle) in handles.iter().enumerate() {
            assert_eq!(pool.try_get(*handle), Some(&value));
        }
        assert_eq!(pool.try_get(extra), Some(&4));
        assert_accounting(&pool);
    }

    #[test]
    fn test_free_list_is_fifo() {
        let mut pool = SlotPool::new();
        let handles: Vec<_> = (0..3).map(|value| pool.allocate(value)).collect();
        pool.release(handles[2]);
        pool.release(handles[0]);

        assert_eq!(pool.allocate(7).index, 2);
        assert_eq!(pool.allocate(8).index, 0);
        assert_eq!(pool.allocate(9).index, 3);
    }

    #[test]
    fn test_clear_disposes_and_keeps_generations() {
        let drops = Rc::new(Cell::new(0));
        let mut pool = SlotPool::with_capacity(2);
        let first = pool.allocate(DropCounter(drops.clone()));
        let second = pool.allocate(DropCounter(drops.clone()));
        let third = pool.allocate(DropCounter(drops.clone()));
        pool.release(second);
        assert_eq!(drops.get(), 1);

        pool.clear();
        assert_eq!(drops.get(), 3);
        assert_eq!(pool.high_water(), 0);
        assert_eq!(pool.free_slot_count(), 0);
        assert_eq!(pool.capacity(), 4);
        assert!(pool.is_empty());

        let reused = pool.allocate(DropCounter(drops.clone()));
        assert_eq!(reused.index, first.index);
        assert!(reused.generation > first.generation);
        assert!(pool.try_get(first).is_none());
        assert!(pool.try_get(third).is_none());
        assert_accounting(&pool);
    }

    #[test]
    fn test_iter_skips_released_slots() {
        let mut pool = SlotPool::new();
        let a = pool.allocate('a');
        let b = pool.allocate('b');
        let c = pool.allocate('c');
        pool.release(b);

        let live: Vec<_> = pool.iter().collect();
        assert_eq!(live, vec![(a, &'a'), (c, &'c')]);
    }

    #[test]
    fn test_get_mut_respects_generation() {
        let mut pool = SlotPool::new();
        let old = pool.allocate(1);
        pool.release(old);
        let new = pool.allocate(2);

        assert!(pool.get_mut(old).is_none());
        *pool.get_mut(new).unwrap() = 3;
        assert_eq!(pool.try_get(new), Some(&3));
    }

    #[test]
    fn test_accounting_after_mixed_operations() {
        let mut pool = SlotPool::with_capacity(1);
        let mut live = Vec::new();

        for step in 0..64u32 {
            if step % 3 == 2 {
                let handle = live.remove((step as usize * 7) % live.len());
                assert!(pool.release(handle));
            } else {
                live.push(pool.allocate(step));
            }
            assert_accounting(&pool);
            assert_eq!(pool.allocated_count(), live.len());
            assert!(live.iter().all(|handle| pool.is_valid(*handle)));
        }
    }
}
