//! Growable buffer shared by the chunk's code, constant pool and line table.

use std::ops::Index;

/// Capacity of the first allocation.
pub const MIN_CAPACITY: usize = 8;

/// An append-only dynamic array with an explicit growth policy: the first
/// allocation holds `MIN_CAPACITY` elements and every later one doubles.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowableBuffer<T> {
    items: Vec<T>,
}

impl<T> GrowableBuffer<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::with_capacity(MIN_CAPACITY),
        }
    }

    /// Append an element and return the index it was stored at.
    pub fn push(&mut self, item: T) -> usize {
        if self.items.len() == self.items.capacity() {
            let target = (self.items.capacity() * 2).max(MIN_CAPACITY);
            self.items.reserve_exact(target - self.items.len());
        }
        let index = self.items.len();
        self.items.push(item);
        index
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Drop every element but keep the allocation.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<T> Default for GrowableBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<usize> for GrowableBuffer<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.items[index]
    }
}

impl<'a, T> IntoIterator for &'a GrowableBuffer<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
