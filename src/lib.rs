//! Collections which restructure themselves in place.
//!
//! * [`NestedHashMap`] grows by nesting fixed-size slot arrays instead of
//!   rehashing, and collapses them again as entries are removed.
//! * [`OrderedList`] and [`OrderedIdList`] keep their items sorted, cache the
//!   position of every item, and find items by identity even after their
//!   sort key changed.

mod arena;
pub mod config;
pub mod error;
pub mod identity_hasher;
pub mod nested_hash_map;
pub mod ordered;

pub use config::{ListConfig, MapConfig};
pub use error::Error;
pub use identity_hasher::{BuildIdentityHasher, IdentityHasher};
pub use nested_hash_map::{MapCursor, NestedHashMap};
pub use ordered::{Identity, ListCursor, ListIndex, OrderedIdList, OrderedIndex, OrderedList};

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn list_over_map() {
        let mut list = OrderedList::new();
        let shared = Rc::new("shared");
        list.add(Rc::clone(&shared));
        list.add(Rc::new("another"));
        assert_eq!(list.index_of(&shared), Some(1));

        let map: NestedHashMap<&str, usize> =
            list.iter().enumerate().map(|(i, item)| (**item, i)).collect();
        assert_eq!(map["shared"], 1);
        assert_eq!(map.len(), list.len());
    }
}
