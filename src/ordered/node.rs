//! List nodes and the links between them.

use crate::arena::Arena;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_LIST_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a list. Nodes and cursors carry it to tell
/// which list they belong to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListId(u64);

impl ListId {
    pub fn new() -> Self {
        ListId(NEXT_LIST_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ListId {
    fn default() -> Self {
        Self::new()
    }
}

/// Stable address of a node within its list. A handle stays valid until its
/// node is released, after which it may be handed out again.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeHandle(usize);

/// An item together with its links and its cached position.
///
/// A node starts unlinked, is linked once, and is released after being
/// unlinked. Moving an item always goes through a fresh node.
#[derive(Debug, Clone)]
pub struct OrderedNode<T> {
    item: T,
    prev: Option<NodeHandle>,
    next: Option<NodeHandle>,

    /// Rank of the node in link order while it's linked.
    position: usize,
    owner: ListId,
    linked: bool,
}

impl<T> OrderedNode<T> {
    pub fn item(&self) -> &T {
        &self.item
    }

    pub fn prev(&self) -> Option<NodeHandle> {
        self.prev
    }

    pub fn next(&self) -> Option<NodeHandle> {
        self.next
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn owner(&self) -> ListId {
        self.owner
    }

    pub fn is_linked(&self) -> bool {
        self.linked
    }
}

/// The node chain of one list.
///
/// Every node stored here belongs to the same list. The nodes reachable from
/// `head` are exactly the linked ones, and their positions run from 0 to
/// `len - 1` in link order.
#[derive(Debug)]
pub struct Links<T> {
    nodes: Arena<OrderedNode<T>>,
    head: Option<NodeHandle>,
    tail: Option<NodeHandle>,
    len: usize,
    owner: ListId,
}

impl<T> Links<T> {
    pub(crate) fn new(owner: ListId) -> Self {
        Self {
            nodes: Arena::new(),
            head: None,
            tail: None,
            len: 0,
            owner,
        }
    }

    /// Number of linked nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn owner(&self) -> ListId {
        self.owner
    }

    pub fn head(&self) -> Option<NodeHandle> {
        self.head
    }

    pub fn tail(&self) -> Option<NodeHandle> {
        self.tail
    }

    /// # Panics
    ///
    /// Panics if the node was released.
    pub fn node(&self, node: NodeHandle) -> &OrderedNode<T> {
        &self.nodes[node.0]
    }

    pub fn item(&self, node: NodeHandle) -> &T {
        &self.node(node).item
    }

    pub fn next_of(&self, node: NodeHandle) -> Option<NodeHandle> {
        self.node(node).next
    }

    pub fn prev_of(&self, node: NodeHandle) -> Option<NodeHandle> {
        self.node(node).prev
    }

    /// Cached position of a linked node. An unlinked node keeps the position
    /// it had when it was unlinked.
    pub fn position(&self, node: NodeHandle) -> usize {
        self.node(node).position
    }

    /// Walks `steps` links forward, or returns `None` past the tail.
    pub fn advance(&self, mut node: NodeHandle, steps: usize) -> Option<NodeHandle> {
        for _ in 0..steps {
            node = self.next_of(node)?;
        }
        Some(node)
    }

    /// Linked nodes in order.
    pub fn handles(&self) -> impl Iterator<Item = NodeHandle> + '_ {
        let mut cur = self.head;
        std::iter::from_fn(move || {
            let node = cur?;
            cur = self.next_of(node);
            Some(node)
        })
    }

    /// Stores an item in a new, unlinked node.
    pub(crate) fn allocate(&mut self, item: T) -> NodeHandle {
        NodeHandle(self.nodes.insert(OrderedNode {
            item,
            prev: None,
            next: None,
            position: 0,
            owner: self.owner,
            linked: false,
        }))
    }

    /// Links `node` in front of `successor`, or at the tail when there is no
    /// successor.
    pub(crate) fn link_before(&mut self, node: NodeHandle, successor: Option<NodeHandle>) {
        let prev = match successor {
            Some(successor) => self.prev_of(successor),
            None => self.tail,
        };
        self.splice(node, prev, successor)
    }

    /// Links `node` behind `predecessor`, or at the head when there is no
    /// predecessor.
    pub(crate) fn link_after(&mut self, node: NodeHandle, predecessor: Option<NodeHandle>) {
        let next = match predecessor {
            Some(predecessor) => self.next_of(predecessor),
            None => self.head,
        };
        self.splice(node, predecessor, next)
    }

    fn splice(&mut self, node: NodeHandle, prev: Option<NodeHandle>, next: Option<NodeHandle>) {
        let position = prev.map_or(0, |prev| self.position(prev) + 1);
        {
            let owner = self.owner;
            let entry = &mut self.nodes[node.0];
            assert!(!entry.linked, "Node {:?} is already linked", node);
            debug_assert_eq!(entry.owner, owner);
            entry.prev = prev;
            entry.next = next;
            entry.position = position;
            entry.linked = true;
        }
        match prev {
            Some(prev) => self.nodes[prev.0].next = Some(node),
            None => self.head = Some(node),
        }
        match next {
            Some(next) => self.nodes[next.0].prev = Some(node),
            None => self.tail = Some(node),
        }
        self.len += 1;
        self.shift_positions_from(next, true);
    }

    /// Takes a node out of the chain. The node stays allocated until it's
    /// released.
    pub(crate) fn unlink(&mut self, node: NodeHandle) {
        let (prev, next) = {
            let entry = &mut self.nodes[node.0];
            assert!(entry.linked, "Node {:?} is not linked", node);
            entry.linked = false;
            (entry.prev.take(), entry.next.take())
        };
        match prev {
            Some(prev) => self.nodes[prev.0].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.nodes[next.0].prev = prev,
            None => self.tail = prev,
        }
        self.len -= 1;
        self.shift_positions_from(next, false);
    }

    /// Moves every position from `node` up to the tail one step up or down.
    fn shift_positions_from(&mut self, mut node: Option<NodeHandle>, up: bool) {
        while let Some(cur) = node {
            let entry = &mut self.nodes[cur.0];
            if up {
                entry.position += 1;
            } else {
                entry.position -= 1;
            }
            node = entry.next;
        }
    }

    /// Frees an unlinked node and hands its item back.
    pub(crate) fn release(&mut self, node: NodeHandle) -> T {
        debug_assert!(!self.nodes[node.0].linked);
        self.nodes.remove(node.0).item
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    /// Items in link order.
    pub(crate) fn into_items(mut self) -> Vec<T> {
        let handles: Vec<NodeHandle> = self.handles().collect();
        handles
            .into_iter()
            .map(|node| self.nodes.remove(node.0).item)
            .collect()
    }

    /// Checks that links, positions and the length agree.
    pub fn positions_consistent(&self) -> bool {
        let mut prev = None;
        let mut count = 0;
        for node in self.handles() {
            let entry = self.node(node);
            if !entry.linked || entry.prev != prev || entry.position != count {
                return false;
            }
            prev = Some(node);
            count += 1;
        }
        count == self.len && self.tail == prev
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn items<T: Clone>(links: &Links<T>) -> Vec<T> {
        links.handles().map(|h| links.item(h).clone()).collect()
    }

    #[test]
    fn lists_get_distinct_ids() {
        assert_ne!(ListId::new(), ListId::new());
    }

    #[test]
    fn splicing_renumbers_the_tail() {
        let mut links = Links::new(ListId::new());
        let b = links.allocate('b');
        links.link_before(b, None);
        let d = links.allocate('d');
        links.link_after(d, Some(b));
        let a = links.allocate('a');
        links.link_after(a, None);
        let c = links.allocate('c');
        links.link_before(c, Some(d));

        assert_eq!(items(&links), ['a', 'b', 'c', 'd']);
        assert_eq!(links.position(d), 3);
        assert_eq!(links.head(), Some(a));
        assert_eq!(links.tail(), Some(d));
        assert_eq!(links.advance(a, 2), Some(c));
        assert_eq!(links.advance(a, 4), None);
        assert!(links.positions_consistent());

        links.unlink(b);
        assert!(!links.node(b).is_linked());
        assert_eq!(links.release(b), 'b');
        assert_eq!(items(&links), ['a', 'c', 'd']);
        assert_eq!(links.position(d), 2);
        assert!(links.positions_consistent());

        links.unlink(a);
        links.unlink(d);
        assert_eq!(links.head(), Some(c));
        assert_eq!(links.tail(), Some(c));
        assert_eq!(links.position(c), 0);
        assert!(links.positions_consistent());
        assert_eq!(links.node(c).owner(), links.owner());
    }

    #[test]
    #[should_panic(expected = "already linked")]
    fn nodes_link_once() {
        let mut links = Links::new(ListId::new());
        let a = links.allocate(1);
        links.link_before(a, None);
        links.link_before(a, None);
    }

    #[test]
    fn into_items_follows_links() {
        let mut links = Links::new(ListId::new());
        for item in &[3, 1, 2] {
            let node = links.allocate(*item);
            links.link_after(node, None);
        }
        assert_eq!(links.into_items(), [2, 1, 3]);
    }
}
