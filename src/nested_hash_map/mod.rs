//! A hash map which never rehashes.
//!
//! Entries live in a tree of fixed-size slot arrays. A slot is either empty,
//! holds a chain of entries sharing one full hash, or points at a child
//! array. When two different hashes meet in a slot, the slot is split into a
//! child array which looks at the next `shift_bits` bits of the hash; when a
//! child array drains down to a single entry, that entry is hoisted back into
//! the parent slot.

#[macro_use]
mod macros;

mod cursor;
pub mod iter;
mod serialize;

pub use cursor::MapCursor;
pub use iter::{IntoIter, Iter, IterMut, Keys, Values, ValuesMut};

use crate::{arena::Arena, config::MapConfig, error::Error};
use log::{debug, trace};
use std::{
    borrow::Borrow,
    collections::hash_map::{DefaultHasher, RandomState},
    fmt,
    hash::{BuildHasher, Hash, Hasher},
    iter::FromIterator,
    mem,
    ops::Index,
    sync::atomic::{AtomicU64, Ordering},
};

static NEXT_MAP_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a map, carried by its cursors.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct MapId(u64);

impl MapId {
    fn new() -> Self {
        MapId(NEXT_MAP_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Full (unshifted) hash of a key.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct HashValue(u64);

impl HashValue {
    /// Slot this hash selects in an array `shift` bits deep.
    #[inline]
    fn slot(self, shift: u32, mask: usize) -> usize {
        // Two different hashes always part ways before every bit is consumed.
        debug_assert!(shift < 64);
        (self.0 >> shift) as usize & mask
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct ArrayId(usize);

/// The root array is allocated first and never freed.
const ROOT: ArrayId = ArrayId(0);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct EntryId(usize);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Slot {
    Empty,
    /// Head of a chain of entries with equal full hashes.
    Chain(EntryId),
    Child(ArrayId),
}

#[derive(Clone, Debug)]
struct ArrayElement {
    slots: Box<[Slot]>,

    /// One per entry stored directly in this array, plus the array size for
    /// every child array.
    weight: usize,

    /// The array and slot this one hangs from. `None` for the root.
    parent: Option<(ArrayId, usize)>,
}

impl ArrayElement {
    fn new(size: usize, parent: Option<(ArrayId, usize)>) -> Self {
        Self {
            slots: vec![Slot::Empty; size].into_boxed_slice(),
            weight: 0,
            parent,
        }
    }
}

#[derive(Clone, Debug)]
struct HashEntry<K, V> {
    hash: HashValue,
    key: K,
    value: V,
    next: Option<EntryId>,
}

/// Where an entry sits: the slot holding its chain and its predecessor in
/// that chain.
#[derive(Copy, Clone, Debug)]
struct Found {
    array: ArrayId,
    slot: usize,
    prev: Option<EntryId>,
    entry: EntryId,
}

/// Depth-first walk starting at `slot` of `array`, climbing back to the
/// parent once an array is exhausted. Returns the first chain found along
/// with the array and slot holding it.
fn seek(
    arrays: &Arena<ArrayElement>,
    mut array: ArrayId,
    mut slot: usize,
) -> Option<(ArrayId, usize, EntryId)> {
    loop {
        let element = &arrays[array.0];
        match element.slots.get(slot) {
            Some(Slot::Empty) => slot += 1,
            Some(Slot::Chain(head)) => return Some((array, slot, *head)),
            Some(Slot::Child(child)) => {
                array = *child;
                slot = 0;
            }
            None => {
                let (parent, parent_slot) = element.parent?;
                array = parent;
                slot = parent_slot + 1;
            }
        }
    }
}

/// A hash map built from a tree of fixed-size slot arrays.
///
/// Keys and values may be any type, including `Option`s standing in for
/// absent keys or values. Iteration order is the depth-first order of the
/// array tree, which depends on the keys' hashes only.
pub struct NestedHashMap<K, V, S = RandomState> {
    arrays: Arena<ArrayElement>,
    entries: Arena<HashEntry<K, V>>,
    shift_bits: u32,
    len: usize,
    id: MapId,

    /// Bumped by every structural change, checked by [`MapCursor`]s.
    generation: u64,
    hash_builder: S,
}

impl<K, V> NestedHashMap<K, V, RandomState> {
    /// Creates an empty map with sixteen slots per array.
    pub fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }

    /// Creates an empty map with `2^shift_bits` slots per array.
    ///
    /// Fails unless `shift_bits` is within `[4, 8]`.
    pub fn with_shift_bits(shift_bits: u32) -> Result<Self, Error> {
        Self::with_shift_bits_and_hasher(shift_bits, RandomState::new())
    }

    pub fn with_config(config: MapConfig) -> Result<Self, Error> {
        Self::with_config_and_hasher(config, RandomState::new())
    }
}

impl<K, V, S> NestedHashMap<K, V, S> {
    /// Creates an empty map which hashes keys with `hash_builder`.
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::build(MapConfig::default(), hash_builder)
    }

    pub fn with_shift_bits_and_hasher(shift_bits: u32, hash_builder: S) -> Result<Self, Error> {
        Self::with_config_and_hasher(MapConfig { shift_bits }, hash_builder)
    }

    pub fn with_config_and_hasher(config: MapConfig, hash_builder: S) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self::build(config, hash_builder))
    }

    fn build(config: MapConfig, hash_builder: S) -> Self {
        let mut arrays = Arena::new();
        let root = arrays.insert(ArrayElement::new(config.array_size(), None));
        debug_assert_eq!(root, ROOT.0);
        Self {
            arrays,
            entries: Arena::new(),
            shift_bits: config.shift_bits,
            len: 0,
            id: MapId::new(),
            generation: 0,
            hash_builder,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of hash bits consumed per level.
    pub fn shift_bits(&self) -> u32 {
        self.shift_bits
    }

    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Number of array levels on the deepest path of the tree. A map without
    /// nested arrays has depth 1.
    pub fn depth(&self) -> usize {
        self.arrays
            .iter()
            .map(|(idx, _)| {
                let mut depth = 1;
                let mut array = ArrayId(idx);
                while let Some((parent, _)) = self.arrays[array.0].parent {
                    depth += 1;
                    array = parent;
                }
                depth
            })
            .max()
            .unwrap_or(1)
    }

    /// Number of live slot arrays, the root included.
    pub fn array_count(&self) -> usize {
        self.arrays.len()
    }

    #[inline]
    fn array_size(&self) -> usize {
        1 << self.shift_bits
    }

    #[inline]
    fn mask(&self) -> usize {
        self.array_size() - 1
    }

    /// Iterates over the entries in the depth-first order of the array tree.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.arrays, &self.entries, self.len)
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { iter: self.iter() }
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values { iter: self.iter() }
    }

    /// Iterates over the entries with mutable values, in no particular order.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut::new(self.entries.slots_mut(), self.len)
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            iter: self.iter_mut(),
        }
    }

    /// Starts a fail-fast cursor at the first entry.
    pub fn cursor(&self) -> MapCursor {
        MapCursor::new(self.id, self.generation, self.first_entry())
    }

    /// Returns `true` if some key maps to `value`.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.entries.iter().any(|(_, entry)| entry.value == *value)
    }

    /// Removes every entry and shrinks the tree back to a single array.
    pub fn clear(&mut self) {
        if !self.is_empty() {
            debug!(
                "Clearing {} entries held in {} arrays",
                self.len,
                self.arrays.len()
            );
        }
        let size = self.array_size();
        self.arrays.clear();
        self.entries.clear();
        self.arrays.insert(ArrayElement::new(size, None));
        self.len = 0;
        self.generation += 1;
    }

    fn first_entry(&self) -> Option<EntryId> {
        seek(&self.arrays, ROOT, 0).map(|(_, _, head)| head)
    }

    /// The entry a depth-first walk visits after `id`.
    fn successor(&self, id: EntryId) -> Option<EntryId> {
        let entry = &self.entries[id.0];
        if let Some(next) = entry.next {
            return Some(next);
        }
        let (array, slot, _) = self.locate(entry.hash)?;
        seek(&self.arrays, array, slot + 1).map(|(_, _, head)| head)
    }

    /// Descends to the chain holding entries with the given full hash.
    fn locate(&self, hash: HashValue) -> Option<(ArrayId, usize, EntryId)> {
        let mask = self.mask();
        let mut array = ROOT;
        let mut shift = 0;
        loop {
            let slot = hash.slot(shift, mask);
            match self.arrays[array.0].slots[slot] {
                Slot::Empty => return None,
                Slot::Child(child) => {
                    array = child;
                    shift += self.shift_bits;
                }
                Slot::Chain(head) if self.entries[head.0].hash == hash => {
                    return Some((array, slot, head))
                }
                Slot::Chain(_) => return None,
            }
        }
    }

    fn locate_entry(&self, id: EntryId) -> Option<Found> {
        let (array, slot, head) = self.locate(self.entries.get(id.0)?.hash)?;
        let mut prev = None;
        let mut cur = head;
        while cur != id {
            prev = Some(cur);
            cur = self.entries[cur.0].next?;
        }
        Some(Found {
            array,
            slot,
            prev,
            entry: id,
        })
    }

    fn new_entry(&mut self, hash: HashValue, key: K, value: V) -> EntryId {
        self.len += 1;
        self.generation += 1;
        EntryId(self.entries.insert(HashEntry {
            hash,
            key,
            value,
            next: None,
        }))
    }

    /// Replaces the chain in `slot` of `array` with a child array holding
    /// that chain, and returns the child.
    fn split(&mut self, array: ArrayId, slot: usize, shift: u32) -> ArrayId {
        let head = match self.arrays[array.0].slots[slot] {
            Slot::Chain(head) => head,
            other => unreachable!("Only a chain can be split, found {:?}", other),
        };
        let mut moved = 1;
        let mut cur = head;
        while let Some(next) = self.entries[cur.0].next {
            moved += 1;
            cur = next;
        }

        let size = self.array_size();
        let child_shift = shift + self.shift_bits;
        let mut child = ArrayElement::new(size, Some((array, slot)));
        child.slots[self.entries[head.0].hash.slot(child_shift, self.mask())] = Slot::Chain(head);
        child.weight = moved;
        let child = ArrayId(self.arrays.insert(child));

        let parent = &mut self.arrays[array.0];
        parent.slots[slot] = Slot::Child(child);
        parent.weight = parent.weight - moved + size;
        trace!(
            "Split slot {} of array {} into array {} at shift {}",
            slot,
            array.0,
            child.0,
            child_shift
        );
        child
    }

    /// Takes an entry out of its chain, then collapses the arrays it leaves
    /// nearly empty.
    fn unlink(&mut self, found: Found) -> (K, V) {
        let entry = self.entries.remove(found.entry.0);
        match found.prev {
            Some(prev) => self.entries[prev.0].next = entry.next,
            None => {
                self.arrays[found.array.0].slots[found.slot] =
                    entry.next.map_or(Slot::Empty, Slot::Chain)
            }
        }
        self.arrays[found.array.0].weight -= 1;
        self.len -= 1;
        self.generation += 1;
        self.collapse(found.array);
        (entry.key, entry.value)
    }

    /// Hoists the only remaining entry of a non-root array into its parent
    /// slot, freeing the array, and repeats on the parent.
    fn collapse(&mut self, mut array: ArrayId) {
        let size = self.array_size();
        while self.arrays[array.0].weight <= 1 {
            let (parent, parent_slot) = match self.arrays[array.0].parent {
                Some(parent) => parent,
                None => break,
            };
            let element = self.arrays.remove(array.0);
            debug_assert!(element
                .slots
                .iter()
                .all(|slot| !matches!(slot, Slot::Child(_))));
            let survivor = element.slots.iter().find_map(|slot| match slot {
                Slot::Chain(head) => Some(*head),
                _ => None,
            });

            let parent_element = &mut self.arrays[parent.0];
            parent_element.slots[parent_slot] = survivor.map_or(Slot::Empty, Slot::Chain);
            parent_element.weight = parent_element.weight - size + usize::from(survivor.is_some());
            trace!(
                "Collapsed array {} into slot {} of array {}",
                array.0,
                parent_slot,
                parent.0
            );
            array = parent;
        }
    }
}

impl<K, V, S> NestedHashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn hash_key<Q>(&self, key: &Q) -> HashValue
    where
        Q: Hash + ?Sized,
    {
        let mut h = self.hash_builder.build_hasher();
        key.hash(&mut h);
        HashValue(h.finish())
    }

    fn find<Q>(&self, key: &Q) -> Option<Found>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let (array, slot, head) = self.locate(self.hash_key(key))?;
        let mut prev = None;
        let mut cur = head;
        loop {
            let entry = &self.entries[cur.0];
            if entry.key.borrow() == key {
                return Some(Found {
                    array,
                    slot,
                    prev,
                    entry: cur,
                });
            }
            prev = Some(cur);
            cur = entry.next?;
        }
    }

    /// Inserts a key-value pair into the map, returning the previous value
    /// stored under that key.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.hash_key(&key);
        let mask = self.mask();
        let mut array = ROOT;
        let mut shift = 0;
        loop {
            let slot = hash.slot(shift, mask);
            match self.arrays[array.0].slots[slot] {
                Slot::Empty => {
                    let entry = self.new_entry(hash, key, value);
                    let element = &mut self.arrays[array.0];
                    element.slots[slot] = Slot::Chain(entry);
                    element.weight += 1;
                    return None;
                }
                Slot::Child(child) => {
                    array = child;
                    shift += self.shift_bits;
                }
                Slot::Chain(head) if self.entries[head.0].hash == hash => {
                    let mut last = head;
                    loop {
                        let entry = &mut self.entries[last.0];
                        if entry.key == key {
                            return Some(mem::replace(&mut entry.value, value));
                        }
                        match entry.next {
                            Some(next) => last = next,
                            None => break,
                        }
                    }
                    let entry = self.new_entry(hash, key, value);
                    self.entries[last.0].next = Some(entry);
                    self.arrays[array.0].weight += 1;
                    return None;
                }
                Slot::Chain(_) => {
                    array = self.split(array, slot, shift);
                    shift += self.shift_bits;
                }
            }
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_key_value(key).map(|(_, value)| value)
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let found = self.find(key)?;
        let entry = &self.entries[found.entry.0];
        Some((&entry.key, &entry.value))
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let found = self.find(key)?;
        Some(&mut self.entries[found.entry.0].value)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Removes a key from the map, returning the value stored under it.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_entry(key).map(|(_, value)| value)
    }

    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let found = self.find(key)?;
        Some(self.unlink(found))
    }

    /// Keeps only the entries for which `f` returns `true`.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let rejected: Vec<EntryId> = self
            .entries
            .slots_mut()
            .iter_mut()
            .enumerate()
            .filter_map(|(idx, slot)| {
                let entry = slot.as_mut()?;
                if f(&entry.key, &mut entry.value) {
                    None
                } else {
                    Some(EntryId(idx))
                }
            })
            .collect();
        for id in rejected {
            if let Some(found) = self.locate_entry(id) {
                self.unlink(found);
            }
        }
    }
}

impl<K, V> Default for NestedHashMap<K, V, RandomState> {
    fn default() -> Self {
        Self::new()
    }
}

/// Rebuilds the tree by replaying every insertion, so the clone shares no
/// arrays or entries with the original.
impl<K, V, S> Clone for NestedHashMap<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher + Clone,
{
    fn clone(&self) -> Self {
        let mut map = Self::build(
            MapConfig {
                shift_bits: self.shift_bits,
            },
            self.hash_builder.clone(),
        );
        for (key, value) in self.iter() {
            map.insert(key.clone(), value.clone());
        }
        map
    }
}

/// Maps are equal when they hold the same entries, whatever the shape of
/// their trees.
impl<K, V, S> PartialEq for NestedHashMap<K, V, S>
where
    K: Hash + Eq,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key).map_or(false, |v| *value == *v))
    }
}

impl<K, V, S> Eq for NestedHashMap<K, V, S>
where
    K: Hash + Eq,
    V: Eq,
    S: BuildHasher,
{
}

/// Order-independent: the per-entry hashes are summed.
impl<K, V, S> Hash for NestedHashMap<K, V, S>
where
    K: Hash,
    V: Hash,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        let sum = self.iter().fold(0u64, |acc, (key, value)| {
            let mut h = DefaultHasher::new();
            key.hash(&mut h);
            value.hash(&mut h);
            acc.wrapping_add(h.finish())
        });
        state.write_usize(self.len);
        state.write_u64(sum);
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for NestedHashMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, Q, V, S> Index<&Q> for NestedHashMap<K, V, S>
where
    K: Hash + Eq + Borrow<Q>,
    Q: Hash + Eq + ?Sized,
    S: BuildHasher,
{
    type Output = V;

    fn index(&self, key: &Q) -> &Self::Output {
        self.get(key).expect("Key is not present in the map")
    }
}

impl<K, V, S> FromIterator<(K, V)> for NestedHashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::with_hasher(S::default());
        map.extend(iter);
        map
    }
}

impl<K, V, S> Extend<(K, V)> for NestedHashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a NestedHashMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut NestedHashMap<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V, S> IntoIterator for NestedHashMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self.entries.into_slots(), self.len)
    }
}
