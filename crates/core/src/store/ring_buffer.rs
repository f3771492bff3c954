//! Fixed-capacity, timestamp-ordered buffer.

use std::collections::VecDeque;

/// Records that carry a millisecond timestamp usable as a cursor.
pub trait Stamped {
    fn ts(&self) -> i64;
}

impl Stamped for rp_protocol::LogLine {
    fn ts(&self) -> i64 {
        self.ts
    }
}

impl Stamped for rp_protocol::Event {
    fn ts(&self) -> i64 {
        self.ts
    }
}

/// The RingBuffer keeps the `capacity` most recently appended items.
/// Appending past the capacity discards the oldest items first (FIFO).
/// Items are expected to be appended in non-decreasing timestamp order.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    /// Maximum number of retained items.
    capacity: usize,
    /// The retained items, oldest first.
    items: VecDeque<T>,
    /// Number of items evicted to enforce the capacity.
    num_discarded: usize,
}

impl<T: Stamped + Clone> RingBuffer<T> {
    /// Construct an empty buffer. A capacity of 0 retains nothing.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: VecDeque::with_capacity(capacity.min(4096)),
            num_discarded: 0,
        }
    }

    /// Append an item, evicting the oldest ones while over capacity.
    pub fn push(&mut self, item: T) {
        self.items.push_back(item);
        while self.items.len() > self.capacity {
            self.items.pop_front();
            self.num_discarded += 1;
        }
    }

    /// All items with a timestamp strictly greater than `since`, in insertion order.
    pub fn since(&self, since: i64) -> Vec<T> {
        // Timestamps are non-decreasing, so the matching items form a suffix.
        let start = self.items.partition_point(|item| item.ts() <= since);
        self.items.range(start..).cloned().collect()
    }

    /// Timestamp of the most recent item, if any.
    pub fn last_ts(&self) -> Option<i64> {
        self.items.back().map(Stamped::ts)
    }

    /// Retrieves the retained items, oldest first.
    pub fn items(&self) -> &VecDeque<T> {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Retrieves the number of items discarded due to capacity enforcement.
    pub fn num_discarded(&self) -> usize {
        self.num_discarded
    }
}
