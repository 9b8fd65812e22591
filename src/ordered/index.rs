//! Identity and position lookups for ordered lists.
//!
//! An [`OrderedList`](crate::OrderedList) owns its nodes but never searches
//! them itself: finding an item, an insertion point or a position is up to
//! its [`ListIndex`]. The index is told about every node that is linked or
//! unlinked so it can keep its own bookkeeping current.

use super::{
    identity::Identity,
    node::{Links, ListId, NodeHandle},
};
use crate::{config::ListConfig, error::Error, NestedHashMap};
use std::hash::Hash;

/// Lookup structure backing an ordered list.
///
/// Every method gets the list's links, so an index holds no reference to
/// its list. Identity lookups must stay correct when the list is dirty, i.e.
/// when some items changed their sort key after being added. The
/// comparison-based searches may then return a stale insertion point.
pub trait ListIndex<T> {
    /// Binds the index to a list. Called once, before any other method.
    fn declare_list(&mut self, list: ListId);

    /// The node holding `item`, found by identity.
    fn find_node_for_object(&self, links: &Links<T>, item: &T) -> Option<NodeHandle>;

    /// Finds `item` without relying on the list being sorted.
    fn find_unsorted_node_for_object(&self, links: &Links<T>, item: &T) -> Option<NodeHandle>
    where
        T: Identity,
    {
        let id = item.identity();
        links.handles().find(|node| links.item(*node).identity() == id)
    }

    /// A node which keeps `item` out of the list, if any. Defaults to the
    /// identity lookup.
    fn find_duplicate_node(&self, links: &Links<T>, item: &T) -> Option<NodeHandle> {
        self.find_node_for_object(links, item)
    }

    /// Insertion point of the unlinked `node` searched from the tail: the
    /// last node not greater than it. `None` means the head.
    fn find_node_before(&self, links: &Links<T>, node: NodeHandle) -> Option<NodeHandle>;

    /// Insertion point of the unlinked `node` searched by comparison: the
    /// first node greater than it. `None` means the tail.
    fn find_node_after(&self, links: &Links<T>, node: NodeHandle) -> Option<NodeHandle>;

    fn node_at_index(&self, links: &Links<T>, index: usize) -> Option<NodeHandle>;

    /// Records a newly allocated node. Called before the node is linked.
    fn register_link(&mut self, links: &Links<T>, node: NodeHandle);

    /// Forgets a node. Called while the node is still allocated.
    fn deregister_link(&mut self, links: &Links<T>, node: NodeHandle);

    /// Updates position bookkeeping after `node` was linked.
    fn insert_node(&mut self, links: &Links<T>, node: NodeHandle);

    /// Updates position bookkeeping after `node` was unlinked. The node still
    /// carries the position it was unlinked from.
    fn remove_node(&mut self, links: &Links<T>, node: NodeHandle);

    fn clear(&mut self);

    /// An empty index with the same settings, for a new list.
    fn new_index(&self) -> Self
    where
        Self: Sized;
}

/// Index backed by a [`NestedHashMap`] from identity to node, plus a table
/// of every `granularity`-th node for positional lookups.
pub struct OrderedIndex<T: Identity> {
    nodes: NestedHashMap<T::Id, NodeHandle>,

    /// `samples[k]` is the node at position `k * granularity`.
    samples: Vec<NodeHandle>,
    granularity: usize,
    list: Option<ListId>,
}

impl<T: Identity> OrderedIndex<T> {
    pub fn new() -> Self {
        Self::build(ListConfig::default())
    }

    pub fn with_granularity(granularity: usize) -> Result<Self, Error> {
        Self::with_config(ListConfig { granularity })
    }

    pub fn with_config(config: ListConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: ListConfig) -> Self {
        Self {
            nodes: NestedHashMap::new(),
            samples: Vec::new(),
            granularity: config.granularity,
            list: None,
        }
    }

    pub fn granularity(&self) -> usize {
        self.granularity
    }

    /// The list this index was declared for.
    pub fn list(&self) -> Option<ListId> {
        self.list
    }

    /// Rebuilds the samples from the one covering `position` to the tail.
    fn resample_from(&mut self, links: &Links<T>, position: usize) {
        let first = position / self.granularity;
        self.samples.truncate(first);
        let mut cur = match first {
            0 => links.head(),
            _ => links.advance(self.samples[first - 1], self.granularity),
        };
        while let Some(node) = cur {
            self.samples.push(node);
            cur = links.advance(node, self.granularity);
        }
    }

    #[cfg(test)]
    pub(crate) fn samples_consistent(&self, links: &Links<T>) -> bool {
        let expected: Vec<NodeHandle> = links.handles().step_by(self.granularity).collect();
        self.samples == expected
    }
}

impl<T: Identity> Default for OrderedIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Identity + Ord> ListIndex<T> for OrderedIndex<T> {
    fn declare_list(&mut self, list: ListId) {
        debug_assert!(self.list.is_none(), "Index is already bound to a list");
        self.list = Some(list);
    }

    fn find_node_for_object(&self, _links: &Links<T>, item: &T) -> Option<NodeHandle> {
        self.nodes.get(&item.identity()).copied()
    }

    fn find_unsorted_node_for_object(&self, links: &Links<T>, item: &T) -> Option<NodeHandle> {
        self.find_node_for_object(links, item)
    }

    fn find_node_before(&self, links: &Links<T>, node: NodeHandle) -> Option<NodeHandle> {
        let item = links.item(node);
        let mut cur = links.tail();
        while let Some(candidate) = cur {
            if links.item(candidate) <= item {
                return Some(candidate);
            }
            cur = links.prev_of(candidate);
        }
        None
    }

    fn find_node_after(&self, links: &Links<T>, node: NodeHandle) -> Option<NodeHandle> {
        let item = links.item(node);
        let first = self
            .samples
            .partition_point(|sample| links.item(*sample) <= item);
        let mut cur = match first {
            0 => links.head(),
            _ => Some(self.samples[first - 1]),
        };
        while let Some(candidate) = cur {
            if links.item(candidate) > item {
                return Some(candidate);
            }
            cur = links.next_of(candidate);
        }
        None
    }

    fn node_at_index(&self, links: &Links<T>, index: usize) -> Option<NodeHandle> {
        if index >= links.len() {
            return None;
        }
        let sample = *self.samples.get(index / self.granularity)?;
        links.advance(sample, index % self.granularity)
    }

    fn register_link(&mut self, links: &Links<T>, node: NodeHandle) {
        self.nodes.insert(links.item(node).identity(), node);
    }

    fn deregister_link(&mut self, links: &Links<T>, node: NodeHandle) {
        self.nodes.remove(&links.item(node).identity());
    }

    fn insert_node(&mut self, links: &Links<T>, node: NodeHandle) {
        debug_assert_eq!(
            self.list,
            Some(links.node(node).owner()),
            "Node belongs to a different list"
        );
        self.resample_from(links, links.position(node));
    }

    fn remove_node(&mut self, links: &Links<T>, node: NodeHandle) {
        debug_assert_eq!(
            self.list,
            Some(links.node(node).owner()),
            "Node belongs to a different list"
        );
        self.resample_from(links, links.position(node));
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.samples.clear();
    }

    fn new_index(&self) -> Self {
        Self::build(ListConfig {
            granularity: self.granularity,
        })
    }
}

/// An [`OrderedIndex`] which also keys every node by an id taken from its
/// item. Ids are unique within a list.
pub struct OrderedIdIndex<I, T: Identity> {
    inner: OrderedIndex<T>,
    ids: NestedHashMap<I, NodeHandle>,
    id_of: fn(&T) -> I,
}

impl<I, T> OrderedIdIndex<I, T>
where
    I: Hash + Eq,
    T: Identity,
{
    pub fn new(id_of: fn(&T) -> I) -> Self {
        Self::from_inner(OrderedIndex::new(), id_of)
    }

    pub fn with_config(config: ListConfig, id_of: fn(&T) -> I) -> Result<Self, Error> {
        Ok(Self::from_inner(OrderedIndex::with_config(config)?, id_of))
    }

    fn from_inner(inner: OrderedIndex<T>, id_of: fn(&T) -> I) -> Self {
        Self {
            inner,
            ids: NestedHashMap::new(),
            id_of,
        }
    }

    pub fn granularity(&self) -> usize {
        self.inner.granularity()
    }

    pub fn list(&self) -> Option<ListId> {
        self.inner.list()
    }

    pub fn id_of(&self, item: &T) -> I {
        (self.id_of)(item)
    }

    pub fn node_for_id(&self, id: &I) -> Option<NodeHandle> {
        self.ids.get(id).copied()
    }

    pub fn contains_id(&self, id: &I) -> bool {
        self.ids.contains_key(id)
    }

    /// Every id along with its node.
    pub fn ids(&self) -> impl Iterator<Item = (&I, NodeHandle)> + '_ {
        self.ids.iter().map(|(id, node)| (id, *node))
    }

    #[cfg(test)]
    pub(crate) fn samples_consistent(&self, links: &Links<T>) -> bool {
        self.inner.samples_consistent(links)
    }
}

impl<I, T> ListIndex<T> for OrderedIdIndex<I, T>
where
    I: Hash + Eq,
    T: Identity + Ord,
{
    fn declare_list(&mut self, list: ListId) {
        self.inner.declare_list(list)
    }

    fn find_node_for_object(&self, links: &Links<T>, item: &T) -> Option<NodeHandle> {
        self.inner.find_node_for_object(links, item)
    }

    fn find_unsorted_node_for_object(&self, links: &Links<T>, item: &T) -> Option<NodeHandle> {
        self.inner.find_unsorted_node_for_object(links, item)
    }

    /// An item clashes with the list either by identity or by id.
    fn find_duplicate_node(&self, links: &Links<T>, item: &T) -> Option<NodeHandle> {
        self.inner
            .find_node_for_object(links, item)
            .or_else(|| self.node_for_id(&self.id_of(item)))
    }

    fn find_node_before(&self, links: &Links<T>, node: NodeHandle) -> Option<NodeHandle> {
        self.inner.find_node_before(links, node)
    }

    fn find_node_after(&self, links: &Links<T>, node: NodeHandle) -> Option<NodeHandle> {
        self.inner.find_node_after(links, node)
    }

    fn node_at_index(&self, links: &Links<T>, index: usize) -> Option<NodeHandle> {
        self.inner.node_at_index(links, index)
    }

    fn register_link(&mut self, links: &Links<T>, node: NodeHandle) {
        self.inner.register_link(links, node);
        self.ids.insert((self.id_of)(links.item(node)), node);
    }

    fn deregister_link(&mut self, links: &Links<T>, node: NodeHandle) {
        self.inner.deregister_link(links, node);
        self.ids.remove(&(self.id_of)(links.item(node)));
    }

    fn insert_node(&mut self, links: &Links<T>, node: NodeHandle) {
        self.inner.insert_node(links, node)
    }

    fn remove_node(&mut self, links: &Links<T>, node: NodeHandle) {
        self.inner.remove_node(links, node)
    }

    fn clear(&mut self) {
        self.inner.clear();
        self.ids.clear();
    }

    fn new_index(&self) -> Self {
        Self::from_inner(self.inner.new_index(), self.id_of)
    }
}
