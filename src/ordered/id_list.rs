//! An ordered list whose items can also be looked up by id.

use super::{
    identity::Identity,
    index::OrderedIdIndex,
    list::OrderedList,
};
use crate::{config::ListConfig, error::Error, NestedHashMap};
use std::{
    fmt,
    hash::Hash,
    ops::{Deref, DerefMut},
};

/// An [`OrderedList`] which also keys its items by an id taken from each
/// item, typically a stable field that is not part of the sort key.
///
/// Ids are unique: adding an item whose id is already present fails the same
/// way adding a duplicate item does.
pub struct OrderedIdList<I, T>
where
    T: Identity,
{
    list: OrderedList<T, OrderedIdIndex<I, T>>,
}

impl<I, T> OrderedIdList<I, T>
where
    I: Hash + Eq,
    T: Identity + Ord,
{
    pub fn new(id_of: fn(&T) -> I) -> Self {
        Self {
            list: OrderedList::with_index(OrderedIdIndex::new(id_of)),
        }
    }

    pub fn with_granularity(granularity: usize, id_of: fn(&T) -> I) -> Result<Self, Error> {
        Self::with_config(ListConfig { granularity }, id_of)
    }

    pub fn with_config(config: ListConfig, id_of: fn(&T) -> I) -> Result<Self, Error> {
        Ok(Self {
            list: OrderedList::with_index(OrderedIdIndex::with_config(config, id_of)?),
        })
    }

    pub fn find_item_by_id(&self, id: &I) -> Option<&T> {
        let node = self.list.index().node_for_id(id)?;
        Some(self.list.links().item(node))
    }

    pub fn contains_id(&self, id: &I) -> bool {
        self.list.index().contains_id(id)
    }

    /// A snapshot of the items keyed by their ids.
    pub fn id_map(&self) -> NestedHashMap<I, &T>
    where
        I: Clone,
    {
        let links = self.list.links();
        self.list
            .index()
            .ids()
            .map(|(id, node)| (id.clone(), links.item(node)))
            .collect()
    }

    pub fn into_inner(self) -> OrderedList<T, OrderedIdIndex<I, T>> {
        self.list
    }
}

impl<I, T> Deref for OrderedIdList<I, T>
where
    T: Identity,
{
    type Target = OrderedList<T, OrderedIdIndex<I, T>>;

    fn deref(&self) -> &Self::Target {
        &self.list
    }
}

impl<I, T> DerefMut for OrderedIdList<I, T>
where
    T: Identity,
{
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.list
    }
}

impl<I, T> Clone for OrderedIdList<I, T>
where
    I: Hash + Eq,
    T: Identity + Ord + Clone,
{
    fn clone(&self) -> Self {
        Self {
            list: self.list.clone(),
        }
    }
}

impl<I, T> fmt::Debug for OrderedIdList<I, T>
where
    I: Hash + Eq,
    T: Identity + Ord + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.list, f)
    }
}
