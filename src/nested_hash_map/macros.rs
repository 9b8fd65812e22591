#[macro_export(local_inner_macros)]
/// Create a `NestedHashMap` from a list of key-value pairs
///
/// ## Example
///
/// ```
/// use nested_collections::nested_hash_map;
/// # fn main() {
///
/// let map = nested_hash_map!{
///     "a" => 1,
///     "b" => 2,
/// };
/// assert_eq!(map["a"], 1);
/// assert_eq!(map["b"], 2);
/// assert_eq!(map.get("c"), None);
/// assert_eq!(map.len(), 2);
/// # }
/// ```
macro_rules! nested_hash_map {
    ($($key:expr => $value:expr,)+) => { nested_hash_map!($($key => $value),+) };
    ($($key:expr => $value:expr),*) => {
        {
            let mut map = $crate::NestedHashMap::new();
            $(
                map.insert($key, $value);
            )*
            map
        }
    };
}

// Generates the Iterator methods of a view by forwarding to the underlying
// `self.iter` and mapping its element.
macro_rules! iterator_methods {
    ($map_elt:expr) => {
        fn next(&mut self) -> Option<Self::Item> {
            self.iter.next().map($map_elt)
        }

        fn size_hint(&self) -> (usize, Option<usize>) {
            self.iter.size_hint()
        }

        fn count(self) -> usize {
            self.iter.len()
        }

        fn nth(&mut self, n: usize) -> Option<Self::Item> {
            self.iter.nth(n).map($map_elt)
        }
    };
}
