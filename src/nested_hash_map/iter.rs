//! NestedHashMap iterators.

use super::{seek, ArrayElement, ArrayId, EntryId, HashEntry, ROOT};
use crate::arena::Arena;
use std::{iter::FusedIterator, slice, vec};

/// Borrowing iterator in the depth-first order of the array tree.
pub struct Iter<'a, K, V> {
    arrays: &'a Arena<ArrayElement>,
    entries: &'a Arena<HashEntry<K, V>>,

    /// The entry to yield next, and the slot holding its chain.
    cursor: Option<(ArrayId, usize, EntryId)>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(super) fn new(
        arrays: &'a Arena<ArrayElement>,
        entries: &'a Arena<HashEntry<K, V>>,
        len: usize,
    ) -> Self {
        let cursor = if len == 0 {
            None
        } else {
            seek(arrays, ROOT, 0)
        };
        Self {
            arrays,
            entries,
            cursor,
            remaining: len,
        }
    }
}

impl<'a, K, V> Clone for Iter<'a, K, V> {
    fn clone(&self) -> Self {
        Self {
            arrays: self.arrays,
            entries: self.entries,
            cursor: self.cursor,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let (array, slot, id) = self.cursor?;
        let entry = &self.entries[id.0];
        self.cursor = match entry.next {
            Some(next) => Some((array, slot, next)),
            None => seek(self.arrays, array, slot + 1),
        };
        self.remaining -= 1;
        Some((&entry.key, &entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V> ExactSizeIterator for Iter<'a, K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<'a, K, V> FusedIterator for Iter<'a, K, V> {}

pub struct Keys<'a, K, V> {
    pub(super) iter: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    iterator_methods!(|(key, _)| key);
}

impl<'a, K, V> ExactSizeIterator for Keys<'a, K, V> {
    fn len(&self) -> usize {
        self.iter.len()
    }
}

pub struct Values<'a, K, V> {
    pub(super) iter: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    iterator_methods!(|(_, value)| value);
}

impl<'a, K, V> ExactSizeIterator for Values<'a, K, V> {
    fn len(&self) -> usize {
        self.iter.len()
    }
}

/// Iterator with mutable access to the values. Walks the entry storage
/// rather than the tree, so its order is unspecified.
pub struct IterMut<'a, K, V> {
    slots: slice::IterMut<'a, Option<HashEntry<K, V>>>,
    remaining: usize,
}

impl<'a, K, V> IterMut<'a, K, V> {
    pub(super) fn new(slots: &'a mut [Option<HashEntry<K, V>>], len: usize) -> Self {
        Self {
            slots: slots.iter_mut(),
            remaining: len,
        }
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.slots.by_ref().find_map(Option::as_mut)?;
        self.remaining -= 1;
        Some((&entry.key, &mut entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V> ExactSizeIterator for IterMut<'a, K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

pub struct ValuesMut<'a, K, V> {
    pub(super) iter: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    iterator_methods!(|(_, value)| value);
}

/// Owning iterator, in unspecified order.
pub struct IntoIter<K, V> {
    slots: vec::IntoIter<Option<HashEntry<K, V>>>,
    remaining: usize,
}

impl<K, V> IntoIter<K, V> {
    pub(super) fn new(slots: Vec<Option<HashEntry<K, V>>>, len: usize) -> Self {
        Self {
            slots: slots.into_iter(),
            remaining: len,
        }
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.slots.by_ref().find_map(|slot| slot)?;
        self.remaining -= 1;
        Some((entry.key, entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

#[cfg(test)]
mod test {
    use crate::{identity_hasher::BuildIdentityHasher, NestedHashMap};

    #[test]
    fn iterates_depth_first_in_slot_order() {
        let mut map = NestedHashMap::with_shift_bits_and_hasher(4, BuildIdentityHasher).unwrap();
        for key in &[3u64, 32, 1, 16, 0, 2] {
            map.insert(*key, ());
        }
        // Root slot 0 nests 0, 16 and 32 one level down.
        let keys: Vec<u64> = map.keys().copied().collect();
        assert_eq!(keys, [0, 16, 32, 1, 2, 3]);

        map.remove(&16);
        let keys: Vec<u64> = map.keys().copied().collect();
        assert_eq!(keys, [0, 32, 1, 2, 3]);
    }

    #[test]
    fn lengths_are_exact() {
        let map: NestedHashMap<u32, u32> = (0..50).map(|i| (i, i)).collect();
        let mut iter = map.iter();
        assert_eq!(iter.len(), 50);
        iter.next();
        assert_eq!(iter.len(), 49);
        assert_eq!(iter.clone().count(), 49);
        assert!(map.values().nth(49).is_some());
        assert_eq!(map.values().nth(50), None);
    }
}
