//! Self-ordering linked lists.
//!
//! [`OrderedList`] keeps its items sorted by `Ord` and caches every node's
//! position. Lookups by identity, by position and for insertion points are
//! delegated to a [`ListIndex`], by default an [`OrderedIndex`].
//! [`OrderedIdList`] adds lookups by a caller-defined id.

mod cursor;
pub mod id_list;
pub mod identity;
pub mod index;
pub mod iter;
pub mod list;
pub mod node;

pub use cursor::ListCursor;
pub use id_list::OrderedIdList;
pub use identity::Identity;
pub use index::{ListIndex, OrderedIdIndex, OrderedIndex};
pub use list::OrderedList;
pub use node::{Links, ListId, NodeHandle, OrderedNode};
