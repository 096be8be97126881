use core::cmp::Ordering;

/// A total order over keys of type `K`.
///
/// Every tree invariant is defined relative to the comparator the tree was built with, so a
/// comparator must be consistent for the lifetime of the tree. Closures of the shape
/// `Fn(&K, &K) -> Ordering` are comparators.
///
/// ```
/// use belt_tree::{BPlusTree, TreeConfig};
///
/// let mut tree = BPlusTree::with_comparator(TreeConfig::default(), |a: &i32, b: &i32| b.cmp(a)).unwrap();
/// for k in [1, 5, 3] {
///     tree.insert(k, ()).unwrap();
/// }
/// assert_eq!(tree.keys().copied().collect::<Vec<_>>(), [5, 3, 1]);
/// ```
pub trait Comparator<K: ?Sized> {
    fn compare(&self, a: &K, b: &K) -> Ordering;
}

/// Orders keys by their [`Ord`] implementation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NaturalOrder;

impl<K: Ord + ?Sized> Comparator<K> for NaturalOrder {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}

impl<K: ?Sized, F> Comparator<K> for F
where
    F: Fn(&K, &K) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        self(a, b)
    }
}
