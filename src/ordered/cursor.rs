//! Fail-fast list cursor.

use super::{
    identity::Identity,
    index::ListIndex,
    list::OrderedList,
    node::{ListId, NodeHandle},
};
use crate::error::{ConcurrentModification, Error, ForeignCursor, NoCurrentElement, Unsupported};
use snafu::{ensure, OptionExt};

/// A bidirectional cursor which does not borrow its list.
///
/// The cursor sits between two items. Changing the list other than through
/// [`ListCursor::remove`] invalidates it, and using it on a list other than
/// the one that created it is an error.
#[derive(Debug, Clone)]
pub struct ListCursor {
    list: ListId,
    generation: u64,

    /// The node `next` returns; `None` past the end.
    next: Option<NodeHandle>,
    next_index: usize,

    /// The node returned by the latest `next` or `previous`.
    last: Option<NodeHandle>,
}

impl ListCursor {
    pub(super) fn new(
        list: ListId,
        generation: u64,
        next: Option<NodeHandle>,
        next_index: usize,
    ) -> Self {
        Self {
            list,
            generation,
            next,
            next_index,
            last: None,
        }
    }

    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn has_previous(&self) -> bool {
        self.next_index > 0
    }

    /// Position of the item `next` would return.
    pub fn next_index(&self) -> usize {
        self.next_index
    }

    /// Position of the item `previous` would return, if any.
    pub fn previous_index(&self) -> Option<usize> {
        self.next_index.checked_sub(1)
    }

    fn check<T, X>(&self, list: &OrderedList<T, X>) -> Result<(), Error>
    where
        T: Identity + Ord,
        X: ListIndex<T>,
    {
        ensure!(self.list == list.id(), ForeignCursor);
        ensure!(self.generation == list.generation, ConcurrentModification);
        Ok(())
    }

    pub fn next<'a, T, X>(&mut self, list: &'a OrderedList<T, X>) -> Result<Option<&'a T>, Error>
    where
        T: Identity + Ord,
        X: ListIndex<T>,
    {
        self.check(list)?;
        let node = match self.next {
            Some(node) => node,
            None => return Ok(None),
        };
        self.next = list.links.next_of(node);
        self.next_index += 1;
        self.last = Some(node);
        Ok(Some(list.links.item(node)))
    }

    pub fn previous<'a, T, X>(
        &mut self,
        list: &'a OrderedList<T, X>,
    ) -> Result<Option<&'a T>, Error>
    where
        T: Identity + Ord,
        X: ListIndex<T>,
    {
        self.check(list)?;
        let prev = match self.next {
            Some(node) => list.links.prev_of(node),
            None => list.links.tail(),
        };
        let node = match prev {
            Some(node) => node,
            None => return Ok(None),
        };
        self.next = Some(node);
        self.next_index -= 1;
        self.last = Some(node);
        Ok(Some(list.links.item(node)))
    }

    /// Removes the item returned by the latest `next` or `previous`.
    pub fn remove<T, X>(&mut self, list: &mut OrderedList<T, X>) -> Result<T, Error>
    where
        T: Identity + Ord,
        X: ListIndex<T>,
    {
        self.check(list)?;
        let last = self.last.take().context(NoCurrentElement)?;
        if self.next == Some(last) {
            self.next = list.links.next_of(last);
        } else {
            self.next_index -= 1;
        }
        let item = list.remove_node(last);
        self.generation = list.generation;
        Ok(item)
    }

    /// Items are placed by their order, so they can't be replaced in place.
    pub fn set<T>(&mut self, _item: T) -> Result<(), Error> {
        Unsupported { operation: "set" }.fail()
    }

    /// Items are placed by their order, so they can't be added at the cursor.
    pub fn add<T>(&mut self, _item: T) -> Result<(), Error> {
        Unsupported { operation: "add" }.fail()
    }
}
