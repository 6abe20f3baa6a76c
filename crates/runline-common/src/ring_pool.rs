//! Fixed-capacity ring pool for idle, reusable instances.
//!
//! The pool is a circular buffer that never grows. Enqueueing into a full
//! pool overwrites the oldest item instead of failing, which gives callers a
//! hard upper bound on how many instances it can hold. Taking from an empty
//! pool is a contract violation and reported as [`PoolError::Empty`].

use std::fmt;

use crate::error::PoolError;

/// Fixed-capacity FIFO ring buffer.
#[derive(Clone)]
pub struct RingPool<T> {
    /// Slot storage, `capacity` long for the lifetime of the pool
    slots: Box<[Option<T>]>,
    /// Index of the oldest item
    head: usize,
    /// Index of the next free slot
    tail: usize,
    /// Number of items held
    count: usize,
}

impl<T> RingPool<T> {
    /// Creates an empty pool holding at most `capacity` items.
    pub fn new(capacity: usize) -> Result<Self, PoolError> {
        if capacity == 0 {
            return Err(PoolError::InvalidCapacity { capacity });
        }
        Ok(Self {
            slots: std::iter::repeat_with(|| None).take(capacity).collect(),
            head: 0,
            tail: 0,
            count: 0,
        })
    }

    /// Maximum number of items the pool can hold.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of items currently held.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.count
    }

    /// Returns true if the pool holds no items.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns true if the next enqueue will overwrite the oldest item.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.count == self.capacity()
    }

    /// Appends an item.
    ///
    /// When the pool is full the oldest item is dropped first. No
    /// notification is given for the dropped item.
    pub fn enqueue(&mut self, item: T) {
        let full = self.is_full();
        self.slots[self.tail] = Some(item);
        if full {
            self.head = self.wrap(self.head + 1);
        } else {
            self.count += 1;
        }
        self.tail = self.wrap(self.tail + 1);
    }

    /// Removes and returns the oldest item.
    pub fn dequeue(&mut self) -> Result<T, PoolError> {
        if self.is_empty() {
            return Err(PoolError::Empty);
        }
        let item = self.slots[self.head].take().ok_or(PoolError::Empty)?;
        self.head = self.wrap(self.head + 1);
        self.count -= 1;
        Ok(item)
    }

    /// Returns the oldest item without removing it.
    pub fn peek(&self) -> Result<&T, PoolError> {
        if self.is_empty() {
            return Err(PoolError::Empty);
        }
        self.slots[self.head].as_ref().ok_or(PoolError::Empty)
    }

    /// Drops every held item and resets the indices.
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
        self.head = 0;
        self.tail = 0;
        self.count = 0;
    }

    /// Iterates held items from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        (0..self.count).filter_map(move |i| self.slots[self.wrap(self.head + i)].as_ref())
    }

    /// Returns true if any held item equals `item`.
    #[must_use]
    pub fn contains(&self, item: &T) -> bool
    where
        T: PartialEq,
    {
        self.iter().any(|held| held == item)
    }

    /// Copies held items, oldest first, into a new vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.iter().cloned().collect()
    }

    fn wrap(&self, index: usize) -> usize {
        index % self.slots.len()
    }
}

impl<T: fmt::Debug> fmt::Debug for RingPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingPool")
            .field("capacity", &self.capacity())
            .field("len", &self.count)
            .field("items", &self.iter().collect::<Vec<_>>())
            .finish()
    }
}
