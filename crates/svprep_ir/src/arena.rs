//! Generic arena for dense, ID-indexed storage of graph entities.
//!
//! Nodes, values and blocks live in arenas so that back references (a value's
//! defining node, a use's owning node) are plain copyable IDs instead of
//! pointers. Entries are never removed; erased nodes are tombstoned by their
//! owner.

use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// Trait for opaque ID types used as arena keys.
pub trait ArenaId: Copy {
    /// Creates an ID from a raw `u32` index.
    fn from_raw(index: u32) -> Self;

    /// Returns the raw `u32` index.
    fn as_raw(self) -> u32;
}

/// A dense, append-only, ID-indexed container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arena<I: ArenaId, T> {
    items: Vec<T>,
    #[serde(skip)]
    _marker: PhantomData<I>,
}

impl<I: ArenaId, T> Default for Arena<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: ArenaId, T> Arena<I, T> {
    /// Creates a new, empty arena.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Allocates a new item in the arena and returns its ID.
    pub fn alloc(&mut self, item: T) -> I {
        let id = I::from_raw(self.items.len() as u32);
        self.items.push(item);
        id
    }

    /// Returns the ID the next [`alloc`](Self::alloc) will hand out.
    pub fn next_id(&self) -> I {
        I::from_raw(self.items.len() as u32)
    }

    /// Returns a reference to the item with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if the ID is out of bounds.
    pub fn get(&self, id: I) -> &T {
        &self.items[id.as_raw() as usize]
    }

    /// Returns a mutable reference to the item with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if the ID is out of bounds.
    pub fn get_mut(&mut self, id: I) -> &mut T {
        &mut self.items[id.as_raw() as usize]
    }

    /// Returns the number of items in the arena.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the arena contains no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over `(ID, &T)` pairs in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| (I::from_raw(i as u32), item))
    }

    /// Iterates over references to items in allocation order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Returns the items as a mutable slice, for handing disjoint entries to
    /// parallel workers.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.items
    }
}

impl<I: ArenaId, T> Index<I> for Arena<I, T> {
    type Output = T;

    fn index(&self, id: I) -> &T {
        self.get(id)
    }
}

impl<I: ArenaId, T> IndexMut<I> for Arena<I, T> {
    fn index_mut(&mut self, id: I) -> &mut T {
        self.get_mut(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::NodeId;

    #[test]
    fn alloc_and_get() {
        let mut arena: Arena<NodeId, &str> = Arena::new();
        let a = arena.alloc("wire");
        let b = arena.alloc("assign");
        assert_eq!(arena[a], "wire");
        assert_eq!(arena[b], "assign");
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn next_id_predicts_alloc() {
        let mut arena: Arena<NodeId, u32> = Arena::new();
        let predicted = arena.next_id();
        assert_eq!(arena.alloc(7), predicted);
    }

    #[test]
    fn get_mut_modifies() {
        let mut arena: Arena<NodeId, u32> = Arena::new();
        let id = arena.alloc(1);
        arena[id] += 41;
        assert_eq!(arena[id], 42);
    }

    #[test]
    fn mut_slice_covers_all_items() {
        let mut arena: Arena<NodeId, u32> = Arena::default();
        arena.alloc(1);
        arena.alloc(2);
        for item in arena.as_mut_slice() {
            *item *= 10;
        }
        let collected: Vec<u32> = arena.values().copied().collect();
        assert_eq!(collected, vec![10, 20]);
    }

    #[test]
    fn serde_roundtrip() {
        let mut arena: Arena<NodeId, String> = Arena::new();
        arena.alloc("first".to_string());
        let json = serde_json::to_string(&arena).unwrap();
        let restored: Arena<NodeId, String> = serde_json::from_str(&json).unwrap();
        assert_eq!(restored[NodeId::from_raw(0)], "first");
    }
}
