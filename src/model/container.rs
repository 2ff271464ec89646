//! Id-sorted entity containers.
//!
//! Entities are kept in a `Vec` sorted by id so lookups are a binary search
//! and ordered iteration (needed for deterministic writing) is free. Records
//! in a `.mdpa` block are almost always in ascending id order, so inserts hit
//! the push fast path.

use serde::{Deserialize, Serialize};

/// Anything addressed by a 1-based integer id.
pub trait Identified {
    fn id(&self) -> u64;
}

/// Sorted, unique-by-id entity storage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityContainer<T> {
    items: Vec<T>,
}

impl<T> Default for EntityContainer<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Identified> EntityContainer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn position(&self, id: u64) -> Result<usize, usize> {
        self.items.binary_search_by_key(&id, |item| item.id())
    }

    /// Returns the entity with `id`, if present.
    pub fn get(&self, id: u64) -> Option<&T> {
        self.position(id).ok().map(|idx| &self.items[idx])
    }

    /// Mutable access to the entity with `id`, if present.
    pub fn get_mut(&mut self, id: u64) -> Option<&mut T> {
        match self.position(id) {
            Ok(idx) => Some(&mut self.items[idx]),
            Err(_) => None,
        }
    }

    pub fn contains(&self, id: u64) -> bool {
        self.position(id).is_ok()
    }

    /// Insert or replace by id. Returns the replaced entity.
    pub fn insert(&mut self, item: T) -> Option<T> {
        if self.items.last().is_none_or(|last| last.id() < item.id()) {
            self.items.push(item);
            return None;
        }
        match self.position(item.id()) {
            Ok(idx) => Some(std::mem::replace(&mut self.items[idx], item)),
            Err(idx) => {
                self.items.insert(idx, item);
                None
            }
        }
    }

    /// Insert only if no entity with the same id exists. Returns `false` when
    /// the existing entity was kept.
    pub fn insert_if_absent(&mut self, item: T) -> bool {
        if self.items.last().is_none_or(|last| last.id() < item.id()) {
            self.items.push(item);
            return true;
        }
        match self.position(item.id()) {
            Ok(_) => false,
            Err(idx) => {
                self.items.insert(idx, item);
                true
            }
        }
    }

    /// Merge a batch that is already sorted and unique by id, keeping existing
    /// entities on collision. Returns how many incoming entities were dropped.
    pub fn merge_sorted(&mut self, incoming: Vec<T>) -> usize {
        if self.items.is_empty() {
            self.items = incoming;
            return 0;
        }
        let mut dropped = 0;
        let existing = std::mem::take(&mut self.items);
        let mut merged = Vec::with_capacity(existing.len() + incoming.len());
        let mut left = existing.into_iter().peekable();
        let mut right = incoming.into_iter().peekable();
        loop {
            match (left.peek(), right.peek()) {
                (Some(a), Some(b)) => {
                    if a.id() < b.id() {
                        merged.extend(left.next());
                    } else if b.id() < a.id() {
                        merged.extend(right.next());
                    } else {
                        merged.extend(left.next());
                        right.next();
                        dropped += 1;
                    }
                }
                (Some(_), None) => merged.extend(left.by_ref()),
                (None, Some(_)) => merged.extend(right.by_ref()),
                (None, None) => break,
            }
        }
        self.items = merged;
        dropped
    }

    pub fn remove(&mut self, id: u64) -> Option<T> {
        self.position(id).ok().map(|idx| self.items.remove(idx))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    /// Ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.items.iter().map(Identified::id)
    }

    /// Largest id stored, if any.
    pub fn max_id(&self) -> Option<u64> {
        self.items.last().map(Identified::id)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<'a, T: Identified> IntoIterator for &'a EntityContainer<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Identified> FromIterator<T> for EntityContainer<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut container = Self::new();
        for item in iter {
            container.insert(item);
        }
        container
    }
}
