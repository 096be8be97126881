use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt;

use crate::config::TreeConfig;
use crate::error::{Result, TreeError};
use crate::export::TreeExport;
use crate::iter::{Iter, Keys, Range, Values};
use crate::order::{Comparator, NaturalOrder};
use crate::raw::RawBPlusTree;

/// An ordered map stored as a B+ tree.
///
/// Keys and values live only in leaves; internal nodes hold separator copies that route a
/// search. Leaves are linked into a doubly linked chain in key order, so ordered scans walk
/// the chain instead of the tree.
///
/// Inserts split any full node *before* descending into it and deletes top up any
/// minimum-occupancy node *before* descending into it, so neither ever walks back up.
///
/// The key order comes from the comparator `C` (by default [`NaturalOrder`], i.e. [`Ord`]).
/// Values default to `()` for key-only trees.
///
/// The tree has no internal locking. It is `Send`/`Sync` whenever its parts are, so hosts
/// that share it wrap it in a lock: readers may run together, a writer needs exclusive
/// access.
///
/// # Examples
///
/// ```
/// use belt_tree::{BPlusTree, TreeError};
///
/// let mut tree = BPlusTree::new();
/// for k in [10, 20, 5, 6, 12, 30, 7, 17] {
///     tree.insert(k, k * 100).unwrap();
/// }
///
/// assert_eq!(tree.get(&12), Some(&1200));
/// assert_eq!(tree.range(&6, &17), [6, 7, 10, 12, 17]);
/// assert_eq!(tree.scan_from(&7, 3), [7, 10, 12]);
///
/// assert_eq!(tree.insert(10, 0), Err(TreeError::DuplicateKey));
/// assert_eq!(tree.delete(&20), Ok(2000));
/// assert_eq!(tree.delete(&20), Err(TreeError::NotFound));
/// ```
#[derive(Clone)]
pub struct BPlusTree<K, V = (), C = NaturalOrder> {
    raw: RawBPlusTree<K, V, C>,
}

impl<K, V> BPlusTree<K, V> {
    /// Creates an empty, unbounded tree with minimum degree 2 ordered by [`Ord`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            raw: RawBPlusTree::new(TreeConfig::default(), NaturalOrder),
        }
    }

    /// Creates an empty tree ordered by [`Ord`].
    ///
    /// # Errors
    ///
    /// Fails if `config` does not [validate](TreeConfig::validate).
    pub fn with_config(config: TreeConfig) -> Result<Self> {
        Self::with_comparator(config, NaturalOrder)
    }
}

impl<K, V, C> BPlusTree<K, V, C> {
    /// Creates an empty tree ordered by `cmp`.
    ///
    /// # Errors
    ///
    /// Fails if `config` does not [validate](TreeConfig::validate).
    pub fn with_comparator(config: TreeConfig, cmp: C) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            raw: RawBPlusTree::new(config, cmp),
        })
    }

    /// Number of keys stored.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the tree holds no keys.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Number of nodes (internal and leaf) currently in the tree.
    #[must_use]
    pub const fn node_count(&self) -> usize {
        self.raw.node_count()
    }

    /// Number of levels from root to leaves; 0 for an empty tree.
    #[must_use]
    pub fn height(&self) -> usize {
        self.raw.height()
    }

    /// Number of leaves on the leaf chain.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.raw.leaf_count()
    }

    /// The configuration the tree was built with.
    #[must_use]
    pub const fn config(&self) -> &TreeConfig {
        self.raw.config()
    }

    /// The comparator ordering the keys.
    #[must_use]
    pub const fn comparator(&self) -> &C {
        self.raw.comparator()
    }

    /// Removes every key. Node ids keep counting from where they were.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Removes every key and restarts node ids at 1, for reproducible exports.
    pub fn reset(&mut self) {
        self.raw.reset();
    }

    /// Iterates over all entries in key order along the leaf chain.
    ///
    /// ```
    /// use belt_tree::BPlusTree;
    ///
    /// let mut tree = BPlusTree::new();
    /// for k in [3, 1, 2] {
    ///     tree.insert(k, k * 2).unwrap();
    /// }
    /// let pairs: Vec<_> = tree.iter().map(|(k, v)| (*k, *v)).collect();
    /// assert_eq!(pairs, [(1, 2), (2, 4), (3, 6)]);
    /// assert_eq!(tree.iter().rev().next(), Some((&3, &6)));
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        let nodes = self.raw.nodes();
        let front = self.raw.first_leaf().map(|leaf| (leaf, 0));
        let back = self
            .raw
            .last_leaf()
            .map(|leaf| (leaf, self.raw.node(leaf).key_count().saturating_sub(1)));
        Iter::new(Range::new(nodes, front, back), self.len())
    }

    /// Iterates over the keys in order.
    ///
    /// ```
    /// use belt_tree::BPlusTree;
    ///
    /// let mut tree = BPlusTree::new();
    /// for k in [2, 3, 1] {
    ///     tree.insert(k, ()).unwrap();
    /// }
    /// assert_eq!(tree.keys().copied().collect::<Vec<_>>(), [1, 2, 3]);
    /// ```
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Iterates over the values in key order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Smallest entry.
    #[must_use]
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.iter().next()
    }

    /// Largest entry.
    #[must_use]
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.iter().next_back()
    }
}

impl<K: Clone, V, C: Comparator<K>> BPlusTree<K, V, C> {
    /// Inserts a key that is not yet present.
    ///
    /// A full root is split before descending, which is the only way the tree grows taller.
    /// Each full child met on the way down is split before it is entered.
    ///
    /// # Errors
    ///
    /// - [`TreeError::DuplicateKey`] if `key` is already present.
    /// - [`TreeError::OutOfCapacity`] if the splits the insert needs would exceed
    ///   [`TreeConfig::max_nodes`].
    ///
    /// In both cases the tree is left untouched.
    pub fn insert(&mut self, key: K, value: V) -> Result<()> {
        self.raw.insert(key, value)
    }

    /// Inserts `key` with a default value; handy for key-only trees.
    ///
    /// # Errors
    ///
    /// Same as [`insert`](Self::insert).
    pub fn insert_key(&mut self, key: K) -> Result<()>
    where
        V: Default,
    {
        self.raw.insert(key, V::default())
    }

    /// Removes `key` and returns its value.
    ///
    /// Any minimum-occupancy child met on the way down borrows from a sibling or merges with
    /// one before it is entered. If the removed key was copied into ancestors as a separator,
    /// those copies are replaced by the leaf's new first key. An internal root left without
    /// separators hands the root to its only child.
    ///
    /// # Errors
    ///
    /// [`TreeError::NotFound`] if `key` is absent; the tree is left untouched.
    pub fn delete(&mut self, key: &K) -> Result<V> {
        self.raw.delete(key).map(|(_, value)| value)
    }

    /// Removes `key` and returns the stored key together with its value.
    ///
    /// # Errors
    ///
    /// [`TreeError::NotFound`] if `key` is absent.
    pub fn remove_entry(&mut self, key: &K) -> Result<(K, V)> {
        self.raw.delete(key)
    }

    /// Returns `true` if `key` is present.
    ///
    /// ```
    /// use belt_tree::BPlusTree;
    ///
    /// let mut tree = BPlusTree::new();
    /// tree.insert(4, ()).unwrap();
    /// assert!(tree.contains(&4));
    /// assert!(!tree.contains(&5));
    /// ```
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.raw.contains(key)
    }

    /// Value stored under `key`, or `None` if it is absent.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.raw.get(key)
    }

    /// Strict lookup.
    ///
    /// # Errors
    ///
    /// [`TreeError::NotFound`] if `key` is absent.
    pub fn try_get(&self, key: &K) -> Result<&V> {
        self.raw.get(key).ok_or(TreeError::NotFound)
    }

    /// Mutable access to the value stored under `key`. The key itself cannot change.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.raw.get_mut(key)
    }

    /// Keys in the closed interval between `from` and `to`, in order. The bounds may be
    /// given in either order.
    #[must_use]
    pub fn range(&self, from: &K, to: &K) -> Vec<K> {
        self.range_entries(from, to).map(|(k, _)| k.clone()).collect()
    }

    /// Lazy version of [`range`](Self::range) yielding entries.
    ///
    /// The first key is found by one descent; the rest are read off the leaf chain.
    ///
    /// ```
    /// use belt_tree::BPlusTree;
    ///
    /// let mut tree = BPlusTree::new();
    /// for k in 0..20 {
    ///     tree.insert(k, k.to_string()).unwrap();
    /// }
    /// let values: Vec<&str> = tree.range_entries(&12, &9).map(|(_, v)| v.as_str()).collect();
    /// assert_eq!(values, ["9", "10", "11", "12"]);
    /// ```
    pub fn range_entries(&self, from: &K, to: &K) -> Range<'_, K, V> {
        let cmp = self.raw.comparator();
        let (from, to) = if cmp.compare(from, to) == Ordering::Greater {
            (to, from)
        } else {
            (from, to)
        };

        let nodes = self.raw.nodes();
        match (self.raw.lower_bound(from), self.raw.upper_bound_inclusive(to)) {
            (Some(front @ (fh, fi)), Some(back @ (bh, bi)))
                if cmp.compare(&self.raw.node(fh).keys()[fi], &self.raw.node(bh).keys()[bi]) != Ordering::Greater =>
            {
                Range::new(nodes, Some(front), Some(back))
            }
            _ => Range::empty(nodes),
        }
    }

    /// Entries from the first key `>= start` to the end of the tree.
    pub fn range_from(&self, start: &K) -> Range<'_, K, V> {
        let nodes = self.raw.nodes();
        let back = self
            .raw
            .last_leaf()
            .map(|leaf| (leaf, self.raw.node(leaf).key_count().saturating_sub(1)));
        Range::new(nodes, self.raw.lower_bound(start), back)
    }

    /// Up to `limit` keys, starting at the first key `>= start`.
    #[must_use]
    pub fn scan_from(&self, start: &K, limit: usize) -> Vec<K> {
        self.range_from(start).take(limit).map(|(k, _)| k.clone()).collect()
    }

    /// Read-only hierarchy snapshot for renderers.
    #[must_use]
    pub fn export(&self) -> TreeExport<K> {
        self.raw.export()
    }

    /// Keys of every node, grouped by level, left to right.
    #[must_use]
    pub fn level_order(&self) -> Vec<Vec<Vec<K>>> {
        self.raw.level_order()
    }

    /// Keys collected by recursive descent of the tree rather than the leaf chain.
    #[must_use]
    pub fn in_order(&self) -> Vec<K> {
        self.raw.in_order()
    }

    /// Verifies the structural invariants of the tree.
    ///
    /// # Errors
    ///
    /// Returns a description of every violation found. A tree only modified through this
    /// API always passes.
    pub fn check_invariants(&self) -> Result<(), String> {
        self.raw.check_invariants()
    }
}

impl<K, V> Default for BPlusTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for BPlusTree<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V, C> IntoIterator for &'a BPlusTree<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}
