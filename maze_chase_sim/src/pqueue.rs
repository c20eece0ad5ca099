// Decrease-key min priority queue.
//
// `BinaryHeap` (as used by the event queue pattern elsewhere) cannot change
// the priority of an element already in the heap, so path search would have
// to push duplicates. `MinPQueue` instead keeps distinct keys in a binary
// heap array paired with a key -> slot side table, which makes
// `add_or_update` an O(log n) decrease-key (or increase-key).
//
// Invariants, checked by `assert_invariants` in debug builds after every
// mutation:
// - heap order: `heap[(i - 1) / 2].1 <= heap[i].1` for every `i >= 1`;
// - the side table maps exactly the keys present in `heap` to their slots.
//
// See also: `pathfinding.rs`, the only consumer.
//
// **Critical constraint: determinism.** `FxHashMap` has a fixed hash, and
// the map is only used for lookups, never iterated, so ordering never leaks
// out of it.

use crate::error::{Result, SimError};
use rustc_hash::FxHashMap;
use std::hash::Hash;

/// A min priority queue of distinct keys with mutable `f64` priorities.
#[derive(Clone, Debug)]
pub struct MinPQueue<K> {
    /// Binary min-heap of `(key, priority)` pairs.
    heap: Vec<(K, f64)>,
    /// Slot of each present key in `heap`.
    index: FxHashMap<K, usize>,
}

impl<K> Default for MinPQueue<K> {
    fn default() -> Self {
        Self {
            heap: Vec::new(),
            index: FxHashMap::default(),
        }
    }
}

impl<K: Copy + Eq + Hash> MinPQueue<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn contains(&self, key: K) -> bool {
        self.index.contains_key(&key)
    }

    /// The key that `remove()` would return next.
    pub fn peek(&self) -> Result<K> {
        self.heap.first().map(|&(key, _)| key).ok_or(SimError::EmptyQueue)
    }

    /// The smallest priority currently in the queue.
    pub fn min_priority(&self) -> Result<f64> {
        self.heap
            .first()
            .map(|&(_, priority)| priority)
            .ok_or(SimError::EmptyQueue)
    }

    /// Insert `key` with `priority`, or change its priority if already present.
    pub fn add_or_update(&mut self, key: K, priority: f64) {
        match self.index.get(&key) {
            Some(&slot) => {
                let old = self.heap[slot].1;
                self.heap[slot].1 = priority;
                if priority < old {
                    self.bubble_up(slot);
                } else {
                    self.bubble_down(slot);
                }
            }
            None => {
                let slot = self.heap.len();
                self.heap.push((key, priority));
                self.index.insert(key, slot);
                self.bubble_up(slot);
            }
        }
        self.assert_invariants();
    }

    /// Remove and return a key with the smallest priority. Ties are broken
    /// arbitrarily.
    pub fn remove(&mut self) -> Result<K> {
        if self.heap.is_empty() {
            return Err(SimError::EmptyQueue);
        }
        let last = self.heap.len() - 1;
        self.swap(0, last);
        let (min, _) = self.heap.pop().ok_or(SimError::EmptyQueue)?;
        self.index.remove(&min);
        if !self.heap.is_empty() {
            self.bubble_down(0);
        }
        self.assert_invariants();
        Ok(min)
    }

    /// Swap slots `a` and `b`, keeping the side table in step.
    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.index.insert(self.heap[a].0, a);
        self.index.insert(self.heap[b].0, b);
    }

    /// Move the entry at `slot` toward the root until its parent is no larger.
    fn bubble_up(&mut self, mut slot: usize) {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if self.heap[slot].1 < self.heap[parent].1 {
                self.swap(slot, parent);
                slot = parent;
            } else {
                break;
            }
        }
    }

    /// Move the entry at `slot` toward the leaves until no child is smaller.
    fn bubble_down(&mut self, mut slot: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * slot + 1;
            let right = left + 1;
            let mut smallest = slot;
            if left < len && self.heap[left].1 < self.heap[smallest].1 {
                smallest = left;
            }
            if right < len && self.heap[right].1 < self.heap[smallest].1 {
                smallest = right;
            }
            if smallest == slot {
                break;
            }
            self.swap(slot, smallest);
            slot = smallest;
        }
    }

    fn assert_invariants(&self) {
        if cfg!(debug_assertions) {
            for i in 1..self.heap.len() {
                debug_assert!(self.heap[(i - 1) / 2].1 <= self.heap[i].1);
            }
            debug_assert_eq!(self.heap.len(), self.index.len());
            for (key, &slot) in &self.index {
                debug_assert!(slot < self.heap.len() && self.heap[slot].0 == *key);
            }
        }
    }
}
