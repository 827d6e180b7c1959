//! Fixed-capacity ring buffer with rotate-and-overwrite aging.

use stabkit_core::{Result, StabError};

/// Fixed-capacity circular buffer over pre-allocated slots.
///
/// `current()` is the head slot, `at(offset)` looks `offset` positions
/// behind the head. `age()` rotates the head forward one position so the
/// evicted oldest slot becomes the next write target. Slots are only ever
/// overwritten in place; nothing allocates after construction.
///
/// Not thread-safe; the pipeline owns its buffers exclusively.
#[derive(Debug)]
pub struct RingBuffer<T> {
    slots: Vec<T>,
    head: usize,
}

impl<T> RingBuffer<T> {
    /// Allocate `capacity` slots, each initialized by `init`.
    pub fn new(capacity: usize, mut init: impl FnMut() -> T) -> Result<Self> {
        if capacity == 0 {
            return Err(StabError::Configuration(
                "ring buffer capacity must be at least 1".into(),
            ));
        }
        Ok(Self {
            slots: (0..capacity).map(|_| init()).collect(),
            head: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Head slot (the newest write target).
    pub fn current(&self) -> &T {
        &self.slots[self.head]
    }

    pub fn current_mut(&mut self) -> &mut T {
        &mut self.slots[self.head]
    }

    /// Slot `offset` positions behind the head, `0 <= offset < capacity`.
    pub fn at(&self, offset: usize) -> Result<&T> {
        let capacity = self.slots.len();
        if offset >= capacity {
            return Err(StabError::OutOfRange { offset, capacity });
        }
        Ok(&self.slots[(self.head + capacity - offset) % capacity])
    }

    /// Advance the head by one slot.
    ///
    /// The oldest slot's content is logically evicted; its storage becomes
    /// the new head, to be overwritten by the next write.
    pub fn age(&mut self) {
        self.head = (self.head + 1) % self.slots.len();
    }
}
