//! Object identity, as opposed to order.
//!
//! An [`OrderedList`](crate::OrderedList) sorts its items by `Ord` but finds
//! them by identity, so an item whose sort key changed in place can still be
//! located, removed and re-sorted.

use std::{hash::Hash, rc::Rc, sync::Arc};

pub trait Identity {
    type Id: Hash + Eq;

    /// Must not change for as long as the item is in a list.
    fn identity(&self) -> Self::Id;
}

/// Shared pointers are identified by the address of their allocation, so
/// two `Rc`s are the same item only when they point at the same value.
impl<T: ?Sized> Identity for Rc<T> {
    type Id = usize;

    fn identity(&self) -> usize {
        Rc::as_ptr(self) as *const () as usize
    }
}

impl<T: ?Sized> Identity for Arc<T> {
    type Id = usize;

    fn identity(&self) -> usize {
        Arc::as_ptr(self) as *const () as usize
    }
}

impl<T: ?Sized> Identity for Box<T> {
    type Id = usize;

    fn identity(&self) -> usize {
        &**self as *const T as *const () as usize
    }
}

macro_rules! value_identity {
    ($($ty:ty),*) => {
        $(
            impl Identity for $ty {
                type Id = $ty;

                fn identity(&self) -> $ty {
                    *self
                }
            }
        )*
    };
}

value_identity!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, char, bool, &'static str);

impl Identity for String {
    type Id = String;

    fn identity(&self) -> String {
        self.clone()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pointers_are_identified_by_address() {
        let a = Rc::new(5);
        let b = Rc::new(5);
        assert_eq!(a, b);
        assert_ne!(a.identity(), b.identity());
        assert_eq!(a.identity(), Rc::clone(&a).identity());

        let boxed = Box::new(1u8);
        let address = boxed.identity();
        let moved = boxed;
        assert_eq!(moved.identity(), address);
    }

    #[test]
    fn values_are_their_own_identity() {
        assert_eq!(7u32.identity(), 7);
        assert_eq!("x".identity(), "x");
        assert_eq!(String::from("y").identity(), "y");
    }
}
