//! Fail-fast cursor over a [`NestedHashMap`].

use super::{EntryId, MapId, NestedHashMap};
use crate::error::{ConcurrentModification, Error, ForeignCursor, NoCurrentElement};
use snafu::{ensure, OptionExt};

/// A cursor which does not borrow the map it walks, so entries can be
/// removed through it between steps.
///
/// The cursor remembers the map's generation. Any structural change made to
/// the map other than through [`MapCursor::remove`] makes every later call
/// fail with [`Error::ConcurrentModification`]. Using it on a map other than
/// the one that created it fails with [`Error::ForeignCursor`].
#[derive(Debug, Clone)]
pub struct MapCursor {
    map: MapId,
    generation: u64,
    next: Option<EntryId>,

    /// The entry returned by the latest `next`, if not removed yet.
    last: Option<EntryId>,
}

impl MapCursor {
    pub(super) fn new(map: MapId, generation: u64, next: Option<EntryId>) -> Self {
        Self {
            map,
            generation,
            next,
            last: None,
        }
    }

    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    fn check<K, V, S>(&self, map: &NestedHashMap<K, V, S>) -> Result<(), Error> {
        ensure!(self.map == map.id, ForeignCursor);
        ensure!(self.generation == map.generation, ConcurrentModification);
        Ok(())
    }

    /// Advances the cursor, returning `Ok(None)` once every entry was seen.
    pub fn next<'a, K, V, S>(
        &mut self,
        map: &'a NestedHashMap<K, V, S>,
    ) -> Result<Option<(&'a K, &'a V)>, Error> {
        self.check(map)?;
        let id = match self.next {
            Some(id) => id,
            None => return Ok(None),
        };
        let entry = map.entries.get(id.0).context(ConcurrentModification)?;
        self.next = map.successor(id);
        self.last = Some(id);
        Ok(Some((&entry.key, &entry.value)))
    }

    /// Removes the entry returned by the latest [`MapCursor::next`].
    ///
    /// The rest of the walk is unaffected, even when the removal collapses
    /// the arrays around it.
    pub fn remove<K, V, S>(&mut self, map: &mut NestedHashMap<K, V, S>) -> Result<(K, V), Error> {
        self.check(map)?;
        let last = self.last.take().context(NoCurrentElement)?;
        let found = map.locate_entry(last).context(ConcurrentModification)?;
        let removed = map.unlink(found);
        self.generation = map.generation;
        Ok(removed)
    }
}
