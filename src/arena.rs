//! Slot storage addressed by stable indices.

use std::ops::{Index, IndexMut};

/// A `Vec` of slots which freelists the slots it vacates. An index handed
/// out by [`Arena::insert`] keeps pointing at the same value until that value
/// is removed, after which the index may be reused.
#[derive(Clone, Debug)]
pub(crate) struct Arena<T> {
    slots: Vec<Option<T>>,

    /// Vacated slots, reused before the storage grows.
    free: Vec<usize>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Number of occupied slots.
    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub(crate) fn insert(&mut self, value: T) -> usize {
        match self.free.pop() {
            Some(idx) => {
                debug_assert!(self.slots[idx].is_none());
                self.slots[idx] = Some(value);
                idx
            }
            None => {
                self.slots.push(Some(value));
                self.slots.len() - 1
            }
        }
    }

    /// Takes the value out of an occupied slot.
    ///
    /// # Panics
    ///
    /// Panics if the slot is vacant.
    pub(crate) fn remove(&mut self, idx: usize) -> T {
        let value = self
            .slots
            .get_mut(idx)
            .and_then(Option::take)
            .unwrap_or_else(|| panic!("Arena slot {} is vacant", idx));
        self.free.push(idx);
        value
    }

    pub(crate) fn get(&self, idx: usize) -> Option<&T> {
        self.slots.get(idx).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, idx: usize) -> Option<&mut T> {
        self.slots.get_mut(idx).and_then(Option::as_mut)
    }

    /// Drops all the values. Does not free the underlying buffers.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }

    /// Occupied slots in storage order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|value| (idx, value)))
    }

    /// Raw slot storage, vacant slots included.
    pub(crate) fn slots_mut(&mut self) -> &mut [Option<T>] {
        &mut self.slots
    }

    pub(crate) fn into_slots(self) -> Vec<Option<T>> {
        self.slots
    }
}

impl<T> Index<usize> for Arena<T> {
    type Output = T;

    fn index(&self, idx: usize) -> &Self::Output {
        self.get(idx)
            .unwrap_or_else(|| panic!("Arena slot {} is vacant", idx))
    }
}

impl<T> IndexMut<usize> for Arena<T> {
    fn index_mut(&mut self, idx: usize) -> &mut Self::Output {
        self.get_mut(idx)
            .unwrap_or_else(|| panic!("Arena slot {} is vacant", idx))
    }
}
