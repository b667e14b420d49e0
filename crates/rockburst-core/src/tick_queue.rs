//! Priority-ordered per-frame update schedule.
//!
//! Every live entity is registered in the [`TickQueue`] exactly once. Each
//! sub-step the game walks the queue front to back: lower priorities update
//! first, and entries with the same priority update in registration order.
//!
//! # Determinism
//!
//! Ordering is fully described by `(priority, registration sequence)` and is
//! stored in a `BTreeMap`, so the update order never depends on hashing or
//! allocation addresses.
//!
//! # Example
//!
//! ```
//! use rockburst_core::tick_queue::{TickPriority, TickQueue};
//!
//! let mut queue = TickQueue::new();
//! queue.register("rock", TickPriority::new(2));
//! queue.register("ship", TickPriority::new(0));
//! queue.register("bullet", TickPriority::new(3));
//!
//! assert_eq!(queue.snapshot(), vec!["ship", "rock", "bullet"]);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Update priority. Lower values update earlier in a sub-step.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TickPriority(u8);

impl TickPriority {
    /// Creates a priority from its raw rank.
    #[must_use]
    pub const fn new(rank: u8) -> Self {
        Self(rank)
    }

    /// Returns the raw rank.
    #[must_use]
    pub const fn rank(self) -> u8 {
        self.0
    }
}

/// Ordered schedule of keys.
///
/// `K` is usually an [`EntityId`](crate::entity::EntityId).
#[derive(Clone)]
pub struct TickQueue<K: Ord + Copy> {
    order: BTreeMap<(TickPriority, u64), K>,
    slots: BTreeMap<K, (TickPriority, u64)>,
    next_sequence: u64,
}

impl<K: Ord + Copy> TickQueue<K> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            order: BTreeMap::new(),
            slots: BTreeMap::new(),
            next_sequence: 0,
        }
    }

    /// Registers `key` at `priority`.
    ///
    /// Returns `false` and leaves the queue untouched if `key` is already
    /// registered.
    pub fn register(&mut self, key: K, priority: TickPriority) -> bool {
        if self.slots.contains_key(&key) {
            return false;
        }
        let slot = (priority, self.next_sequence);
        self.next_sequence += 1;
        self.order.insert(slot, key);
        self.slots.insert(key, slot);
        true
    }

    /// Removes `key` from the schedule.
    ///
    /// Returns `false` if it was not registered, so calling this twice is
    /// harmless.
    pub fn unregister(&mut self, key: K) -> bool {
        match self.slots.remove(&key) {
            Some(slot) => {
                self.order.remove(&slot);
                true
            }
            None => false,
        }
    }

    /// Returns `true` if `key` is registered.
    #[must_use]
    pub fn contains(&self, key: K) -> bool {
        self.slots.contains_key(&key)
    }

    /// Returns the priority `key` was registered at.
    #[must_use]
    pub fn priority_of(&self, key: K) -> Option<TickPriority> {
        self.slots.get(&key).map(|(priority, _)| *priority)
    }

    /// Iterates keys in update order.
    pub fn iter(&self) -> impl Iterator<Item = K> + '_ {
        self.order.values().copied()
    }

    /// Copies the current update order.
    ///
    /// The game walks a snapshot so entities can be created and destroyed
    /// while the sub-step is running.
    #[must_use]
    pub fn snapshot(&self) -> Vec<K> {
        self.iter().collect()
    }

    /// Returns the number of registered keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Removes every key.
    ///
    /// The sequence counter is kept so that registration order stays
    /// monotonic across a clear.
    pub fn clear(&mut self) {
        self.order.clear();
        self.slots.clear();
    }
}

impl<K: Ord + Copy> Default for TickQueue<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Copy> fmt::Debug for TickQueue<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickQueue")
            .field("entries", &format!("[{} entries]", self.len()))
            .field("next_sequence", &self.next_sequence)
            .finish()
    }
}
