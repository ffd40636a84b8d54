//! Fixed-capacity sliding window.
//!
//! Backs both the RSSI filter buffer and the lap counter's delta window.
//! Storage is allocated once at construction; pushing past capacity
//! overwrites the oldest slot in O(1).

use std::num::NonZeroUsize;

/// Ring buffer holding at most `capacity` of the most recent values.
#[derive(Debug, Clone)]
pub struct SlidingWindow<T> {
    slots: Vec<T>,
    /// Index of the oldest value once the window is full. Always 0 before that.
    head: usize,
    capacity: NonZeroUsize,
}

impl<T: Copy> SlidingWindow<T> {
    /// Creates an empty window.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity.get()),
            head: 0,
            capacity,
        }
    }

    /// Appends `value`, returning the evicted oldest value if the window was full.
    pub fn push(&mut self, value: T) -> Option<T> {
        if self.slots.len() < self.capacity.get() {
            self.slots.push(value);
            return None;
        }

        let evicted = std::mem::replace(&mut self.slots[self.head], value);
        self.head = (self.head + 1) % self.capacity.get();
        Some(evicted)
    }

    /// Iterates from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        let (newer, older) = self.slots.split_at(self.head);
        older.iter().chain(newer.iter()).copied()
    }

    /// Removes every value. Capacity is retained.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.head = 0;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.slots.len() == self.capacity.get()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }
}

impl SlidingWindow<f64> {
    /// Sum of the values in the window; 0 when empty.
    pub fn sum(&self) -> f64 {
        self.iter().sum()
    }
}
