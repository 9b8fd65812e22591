//! A linked list which keeps its items in their natural order.

use super::{
    cursor::ListCursor,
    identity::Identity,
    index::{ListIndex, OrderedIndex},
    iter::{IntoIter, Iter},
    node::{Links, ListId, NodeHandle},
};
use crate::{
    config::ListConfig,
    error::{Error, OutOfBounds, Unsupported},
    NestedHashMap,
};
use log::debug;
use snafu::{ensure, OptionExt};
use std::{fmt, iter::FromIterator, ops::Index};

/// A doubly linked list sorted by `Ord`, where items are found by
/// [`Identity`] and every node caches its position.
///
/// Positions follow from the items, so there is no way to put an item at a
/// chosen position. An item whose sort key changes while in the list stays
/// where it was, and stays reachable by identity, until [`re_sort`] moves it.
///
/// [`re_sort`]: OrderedList::re_sort
pub struct OrderedList<T, X = OrderedIndex<T>>
where
    T: Identity,
{
    pub(super) links: Links<T>,
    pub(super) index: X,

    /// Bumped by every structural change, checked by [`ListCursor`]s.
    pub(super) generation: u64,
}

impl<T> OrderedList<T, OrderedIndex<T>>
where
    T: Identity + Ord,
{
    pub fn new() -> Self {
        Self::with_index(OrderedIndex::new())
    }

    /// Fails if `granularity` is zero.
    pub fn with_granularity(granularity: usize) -> Result<Self, Error> {
        Ok(Self::with_index(OrderedIndex::with_granularity(granularity)?))
    }

    pub fn with_config(config: ListConfig) -> Result<Self, Error> {
        Ok(Self::with_index(OrderedIndex::with_config(config)?))
    }
}

impl<T, X> OrderedList<T, X>
where
    T: Identity + Ord,
    X: ListIndex<T>,
{
    /// Creates an empty list driven by a fresh `index`.
    pub fn with_index(mut index: X) -> Self {
        let links = Links::new(ListId::new());
        index.declare_list(links.owner());
        Self {
            links,
            index,
            generation: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn id(&self) -> ListId {
        self.links.owner()
    }

    pub fn links(&self) -> &Links<T> {
        &self.links
    }

    pub fn index(&self) -> &X {
        &self.index
    }

    /// Adds an item at its sorted position, searching from the head. Items
    /// equal to existing ones go behind them.
    ///
    /// Returns `false`, leaving the list as is, when the item is already in.
    pub fn add(&mut self, item: T) -> bool {
        if self.index.find_duplicate_node(&self.links, &item).is_some() {
            return false;
        }
        self.link(item, false);
        true
    }

    /// Like [`add`](OrderedList::add), but searches from the tail, which is
    /// faster when items arrive mostly in order.
    pub fn add_at_end(&mut self, item: T) -> bool {
        if self.index.find_duplicate_node(&self.links, &item).is_some() {
            return false;
        }
        self.link(item, true);
        true
    }

    fn link(&mut self, item: T, from_tail: bool) -> NodeHandle {
        let node = self.links.allocate(item);
        self.index.register_link(&self.links, node);
        if from_tail {
            let predecessor = self.index.find_node_before(&self.links, node);
            self.links.link_after(node, predecessor);
        } else {
            let successor = self.index.find_node_after(&self.links, node);
            self.links.link_before(node, successor);
        }
        self.index.insert_node(&self.links, node);
        self.generation += 1;
        node
    }

    pub(super) fn remove_node(&mut self, node: NodeHandle) -> T {
        self.index.deregister_link(&self.links, node);
        self.links.unlink(node);
        self.index.remove_node(&self.links, node);
        self.generation += 1;
        self.links.release(node)
    }

    /// Removes the item with the same identity as `item`.
    pub fn remove(&mut self, item: &T) -> Option<T> {
        let node = self.index.find_node_for_object(&self.links, item)?;
        Some(self.remove_node(node))
    }

    pub fn remove_at(&mut self, index: usize) -> Result<T, Error> {
        let len = self.len();
        ensure!(index < len, OutOfBounds { index, len });
        let node = self
            .index
            .node_at_index(&self.links, index)
            .context(OutOfBounds { index, len })?;
        Ok(self.remove_node(node))
    }

    pub fn contains(&self, item: &T) -> bool {
        self.index.find_node_for_object(&self.links, item).is_some()
    }

    /// Position of the item with the same identity as `item`.
    pub fn index_of(&self, item: &T) -> Option<usize> {
        let node = self.index.find_node_for_object(&self.links, item)?;
        Some(self.links.position(node))
    }

    /// Same as [`index_of`](OrderedList::index_of), as an item is never in
    /// a list twice.
    pub fn last_index_of(&self, item: &T) -> Option<usize> {
        self.index_of(item)
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        let node = self.index.node_at_index(&self.links, index)?;
        Some(self.links.item(node))
    }

    pub fn first(&self) -> Option<&T> {
        self.links.head().map(|node| self.links.item(node))
    }

    pub fn last(&self) -> Option<&T> {
        self.links.tail().map(|node| self.links.item(node))
    }

    /// Moves an item whose sort key changed to its new sorted position.
    ///
    /// Returns `false` when the item is not in the list.
    pub fn re_sort(&mut self, item: &T) -> bool {
        let node = match self.index.find_unsorted_node_for_object(&self.links, item) {
            Some(node) => node,
            None => return false,
        };
        let from = self.links.position(node);
        let item = self.remove_node(node);
        let node = self.link(item, false);
        debug!(
            "Re-sorted an item from position {} to {}",
            from,
            self.links.position(node)
        );
        true
    }

    pub fn clear(&mut self) {
        if !self.is_empty() {
            debug!("Clearing {} items", self.len());
        }
        self.links.clear();
        self.index.clear();
        self.generation += 1;
    }

    /// Adds every item, returning whether anything was added.
    pub fn add_all<I: IntoIterator<Item = T>>(&mut self, items: I) -> bool {
        let generation = self.generation;
        for item in items {
            self.add(item);
        }
        generation != self.generation
    }

    /// Removes every item with the identity of one of `items`, returning
    /// whether anything was removed.
    pub fn remove_all<'a, I>(&mut self, items: I) -> bool
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let generation = self.generation;
        for item in items {
            self.remove(item);
        }
        generation != self.generation
    }

    /// Keeps only the items with the identity of one of `items`, returning
    /// whether anything was removed.
    pub fn retain_all<'a, I>(&mut self, items: I) -> bool
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let keep: NestedHashMap<T::Id, ()> =
            items.into_iter().map(|item| (item.identity(), ())).collect();
        let generation = self.generation;
        self.retain(|item| keep.contains_key(&item.identity()));
        generation != self.generation
    }

    /// Keeps only the items for which `f` returns `true`.
    pub fn retain<F: FnMut(&T) -> bool>(&mut self, mut f: F) {
        let rejected: Vec<NodeHandle> = self
            .links
            .handles()
            .filter(|node| !f(self.links.item(*node)))
            .collect();
        for node in rejected {
            self.remove_node(node);
        }
    }

    pub fn insert(&mut self, _index: usize, _item: T) -> Result<(), Error> {
        Unsupported { operation: "insert" }.fail()
    }

    pub fn set(&mut self, _index: usize, _item: T) -> Result<T, Error> {
        Unsupported { operation: "set" }.fail()
    }

    pub fn insert_all<I: IntoIterator<Item = T>>(
        &mut self,
        _index: usize,
        _items: I,
    ) -> Result<bool, Error> {
        Unsupported {
            operation: "insert_all",
        }
        .fail()
    }

    pub fn sub_list(&self, _from: usize, _to: usize) -> Result<Iter<'_, T>, Error> {
        Unsupported {
            operation: "sub_list",
        }
        .fail()
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(&self.links)
    }

    /// Starts a fail-fast cursor in front of the first item.
    pub fn cursor(&self) -> ListCursor {
        ListCursor::new(self.id(), self.generation, self.links.head(), 0)
    }

    /// Starts a fail-fast cursor in front of the item at `index`, or past the
    /// last item when `index` equals the length.
    pub fn cursor_at(&self, index: usize) -> Result<ListCursor, Error> {
        let len = self.len();
        ensure!(index <= len, OutOfBounds { index, len });
        let next = self.index.node_at_index(&self.links, index);
        Ok(ListCursor::new(self.id(), self.generation, next, index))
    }

    /// Checks that every cached position matches the node's rank.
    pub fn positions_consistent(&self) -> bool {
        self.links.positions_consistent()
    }
}

impl<T> Default for OrderedList<T, OrderedIndex<T>>
where
    T: Identity + Ord,
{
    fn default() -> Self {
        Self::new()
    }
}

/// The clone gets a fresh index of the same kind and its own nodes.
impl<T, X> Clone for OrderedList<T, X>
where
    T: Identity + Ord + Clone,
    X: ListIndex<T>,
{
    fn clone(&self) -> Self {
        let mut list = Self::with_index(self.index.new_index());
        for item in self.iter() {
            list.add_at_end(item.clone());
        }
        list
    }
}

impl<T, X> PartialEq for OrderedList<T, X>
where
    T: Identity + Ord,
    X: ListIndex<T>,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T, X> fmt::Debug for OrderedList<T, X>
where
    T: Identity + Ord + fmt::Debug,
    X: ListIndex<T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T, X> Index<usize> for OrderedList<T, X>
where
    T: Identity + Ord,
    X: ListIndex<T>,
{
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(item) => item,
            None => panic!(
                "Index {} is out of bounds (length = {})",
                index,
                self.len()
            ),
        }
    }
}

impl<T> FromIterator<T> for OrderedList<T, OrderedIndex<T>>
where
    T: Identity + Ord,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::new();
        list.add_all(iter);
        list
    }
}

impl<T, X> Extend<T> for OrderedList<T, X>
where
    T: Identity + Ord,
    X: ListIndex<T>,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.add_all(iter);
    }
}

impl<'a, T, X> IntoIterator for &'a OrderedList<T, X>
where
    T: Identity + Ord,
    X: ListIndex<T>,
{
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T, X> IntoIterator for OrderedList<T, X>
where
    T: Identity,
{
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            items: self.links.into_items().into_iter(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;
    use rand::Rng;
    use std::{cell::RefCell, cmp::Ordering, rc::Rc};

    /// Sorted by a name which can change behind the list's back.
    #[derive(Debug)]
    struct Account {
        name: RefCell<String>,
    }

    impl Account {
        fn new(name: &str) -> Rc<Self> {
            Rc::new(Self {
                name: RefCell::new(name.to_string()),
            })
        }

        fn rename(&self, name: &str) {
            *self.name.borrow_mut() = name.to_string();
        }
    }

    impl PartialEq for Account {
        fn eq(&self, other: &Self) -> bool {
            *self.name.borrow() == *other.name.borrow()
        }
    }

    impl Eq for Account {}

    impl PartialOrd for Account {
        fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
            Some(self.cmp(other))
        }
    }

    impl Ord for Account {
        fn cmp(&self, other: &Self) -> Ordering {
            self.name.borrow().cmp(&*other.name.borrow())
        }
    }

    fn names(list: &OrderedList<Rc<Account>>) -> Vec<String> {
        list.iter().map(|a| a.name.borrow().clone()).collect()
    }

    #[test]
    fn keeps_natural_order() {
        let mut list = OrderedList::new();
        for item in &[5, 3, 9, 1, 7] {
            assert!(list.add(*item));
        }
        assert!(list.add_at_end(10));
        assert!(list.add_at_end(0));
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), [0, 1, 3, 5, 7, 9, 10]);
        assert_eq!(list.index_of(&7), Some(4));
        assert_eq!(list.last_index_of(&7), Some(4));
        assert_eq!(list.first(), Some(&0));
        assert_eq!(list.last(), Some(&10));
        assert_eq!(list[2], 3);
        assert_eq!(list.iter().rev().next(), Some(&10));
        assert!(list.positions_consistent());
    }

    #[test]
    fn duplicates_are_rejected() {
        let mut list = OrderedList::new();
        assert!(list.add(1));
        assert!(!list.add(1));
        assert!(!list.add_at_end(1));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn equal_items_keep_insertion_order() {
        let first = Rc::new(5);
        let second = Rc::new(5);
        let third = Rc::new(5);
        let mut list = OrderedList::new();
        list.add(Rc::new(9));
        list.add(Rc::clone(&first));
        list.add(Rc::clone(&second));
        list.add_at_end(Rc::clone(&third));
        list.add(Rc::new(1));

        assert_eq!(list.len(), 5);
        assert_eq!(list.index_of(&first), Some(1));
        assert_eq!(list.index_of(&second), Some(2));
        assert_eq!(list.index_of(&third), Some(3));

        // Equal but not identical.
        assert!(!list.contains(&Rc::new(5)));
        assert_eq!(list.remove(&second), Some(second));
        assert_eq!(list.index_of(&third), Some(2));
        assert!(list.positions_consistent());
    }

    #[test]
    fn removing_renumbers() {
        let mut list: OrderedList<u32> = (0..10).collect();
        assert_eq!(list.remove(&3), Some(3));
        assert_eq!(list.remove_at(0), Ok(0));
        assert_eq!(list.remove(&3), None);
        assert_eq!(
            list.remove_at(8),
            Err(Error::OutOfBounds { index: 8, len: 8 })
        );
        assert!(list.positions_consistent());
        for (position, item) in list.iter().enumerate() {
            assert_eq!(list.index_of(item), Some(position));
        }
    }

    #[test]
    fn dirty_list_is_tolerated() {
        let bravo = Account::new("bravo");
        let mut list = OrderedList::new();
        list.add(Account::new("alpha"));
        list.add(Rc::clone(&bravo));
        list.add(Account::new("delta"));
        assert_eq!(names(&list), ["alpha", "bravo", "delta"]);

        bravo.rename("zulu");
        assert!(list.contains(&bravo));
        assert_eq!(list.index_of(&bravo), Some(1));
        assert_eq!(names(&list), ["alpha", "zulu", "delta"]);

        assert!(list.re_sort(&bravo));
        assert_eq!(list.index_of(&bravo), Some(2));
        assert_eq!(names(&list), ["alpha", "delta", "zulu"]);
        assert!(list.positions_consistent());

        bravo.rename("aardvark");
        assert_eq!(list.remove(&bravo).map(|a| Rc::ptr_eq(&a, &bravo)), Some(true));
        assert_eq!(names(&list), ["alpha", "delta"]);
        assert!(!list.re_sort(&bravo));
    }

    #[test]
    fn positional_mutation_is_unsupported() {
        let mut list: OrderedList<u32> = (0..3).collect();
        assert_eq!(
            list.insert(0, 7),
            Err(Error::Unsupported {
                operation: "insert"
            })
        );
        assert!(list.set(1, 7).is_err());
        assert!(list.insert_all(0, vec![8, 9]).is_err());
        assert!(list.sub_list(0, 1).is_err());
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), [0, 1, 2]);
    }

    #[test]
    fn bulk_operations_report_changes() {
        let mut list = OrderedList::new();
        assert!(list.add_all(vec![4, 2, 6]));
        assert!(!list.add_all(vec![4, 2]));
        assert!(list.remove_all(&[2, 3]));
        assert!(!list.remove_all(&[3]));
        assert!(list.add_all(vec![1, 8]));
        assert!(list.retain_all(&[1, 6, 7]));
        assert!(!list.retain_all(&[1, 6]));
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), [1, 6]);

        list.retain(|item| *item > 1);
        assert_eq!(list.len(), 1);
        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.get(0), None);
    }

    #[test]
    fn clones_are_independent() {
        let mut original: OrderedList<u32> = OrderedList::with_granularity(3).unwrap();
        original.extend(0..20);
        let mut copy = original.clone();
        assert_eq!(copy, original);
        assert_ne!(copy.id(), original.id());
        assert_eq!(copy.index().granularity(), 3);

        copy.remove(&5);
        assert_eq!(original.len(), 20);
        assert_eq!(original.index_of(&6), Some(6));
        assert_eq!(copy.index_of(&6), Some(5));
        assert!(copy.positions_consistent());
        assert!(copy.index().samples_consistent(copy.links()));
    }

    #[test]
    fn rejects_zero_granularity() {
        assert_eq!(
            OrderedList::<u32>::with_granularity(0).err(),
            Some(Error::InvalidGranularity { granularity: 0 })
        );
    }

    #[test]
    fn owned_iteration_and_debug() {
        let list: OrderedList<&'static str> = vec!["b", "c", "a"].into_iter().collect();
        assert_eq!(format!("{:?}", list), r#"["a", "b", "c"]"#);
        assert_eq!(list.into_iter().rev().collect::<Vec<_>>(), ["c", "b", "a"]);
    }

    #[test]
    #[should_panic(expected = "Index 3 is out of bounds (length = 3)")]
    fn indexing_past_the_end_panics() {
        let list: OrderedList<u32> = (0..3).collect();
        let _ = list[3];
    }

    #[derive(Debug, Clone)]
    enum Action {
        Add(u8),
        AddAtEnd(u8),
        Remove(u8),
        RemoveAt(usize),
        Get(usize),
    }

    impl Arbitrary for Action {
        fn arbitrary<G: Gen>(g: &mut G) -> Self {
            match g.gen_range(0, 5) {
                0 => Action::Add(u8::arbitrary(g)),
                1 => Action::AddAtEnd(u8::arbitrary(g)),
                2 => Action::Remove(u8::arbitrary(g)),
                3 => Action::RemoveAt(usize::arbitrary(g) % 64),
                4 => Action::Get(usize::arbitrary(g) % 64),
                _ => unreachable!(),
            }
        }
    }

    #[quickcheck]
    fn check_against_sorted_vec(granularity: u8, actions: Vec<Action>) {
        let granularity = usize::from(granularity % 8) + 1;
        let mut result = OrderedList::with_granularity(granularity).unwrap();
        let mut reference: Vec<u8> = Vec::new();

        for action in actions {
            match action {
                Action::Add(item) | Action::AddAtEnd(item) => {
                    let added = match action {
                        Action::Add(_) => result.add(item),
                        _ => result.add_at_end(item),
                    };
                    match reference.binary_search(&item) {
                        Ok(_) => assert!(!added),
                        Err(position) => {
                            assert!(added);
                            reference.insert(position, item);
                        }
                    }
                    assert_eq!(result.index_of(&item), reference.binary_search(&item).ok());
                }
                Action::Remove(item) => {
                    let expected = reference.binary_search(&item).ok().map(|position| {
                        reference.remove(position);
                        item
                    });
                    assert_eq!(result.remove(&item), expected);
                }
                Action::RemoveAt(index) => {
                    if index < reference.len() {
                        assert_eq!(result.remove_at(index), Ok(reference.remove(index)));
                    } else {
                        assert!(result.remove_at(index).is_err());
                    }
                }
                Action::Get(index) => {
                    assert_eq!(result.get(index), reference.get(index));
                }
            }
            assert_eq!(result.len(), reference.len());
            assert!(result.positions_consistent());
            assert!(result.index().samples_consistent(result.links()));
        }
        assert!(result.iter().eq(reference.iter()));
    }
}
