//! Iterators that walk the leaf chain.

use core::fmt;
use core::iter::FusedIterator;

use crate::raw::{Arena, Handle, Node};

/// A position in the leaf chain: leaf handle and slot.
type Position = (Handle, usize);

/// An iterator over a contiguous run of entries in key order.
///
/// Created by [`BPlusTree::range_entries`](crate::BPlusTree::range_entries) and
/// [`BPlusTree::range_from`](crate::BPlusTree::range_from). It follows `next`/`prev` leaf
/// links and never re-descends the tree.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Range<'a, K, V> {
    nodes: &'a Arena<Node<K, V>>,
    front: Option<Position>,
    back: Option<Position>,
}

impl<'a, K, V> Range<'a, K, V> {
    /// `front` and `back` are inclusive; both must be `Some` or both `None`.
    pub(crate) fn new(nodes: &'a Arena<Node<K, V>>, front: Option<Position>, back: Option<Position>) -> Self {
        match (front, back) {
            (Some(_), Some(_)) => Self { nodes, front, back },
            _ => Self::empty(nodes),
        }
    }

    pub(crate) fn empty(nodes: &'a Arena<Node<K, V>>) -> Self {
        Self {
            nodes,
            front: None,
            back: None,
        }
    }

    fn entry(&self, (handle, index): Position) -> Option<(&'a K, &'a V)> {
        let nodes = self.nodes;
        match nodes.get(handle) {
            Node::Leaf(leaf) => Some((leaf.key(index), leaf.value(index))),
            Node::Internal(_) => None,
        }
    }

    fn finish(&mut self) {
        self.front = None;
        self.back = None;
    }
}

impl<'a, K, V> Iterator for Range<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let position @ (handle, index) = self.front?;
        let Some(item) = self.entry(position) else {
            self.finish();
            return None;
        };

        if self.front == self.back {
            self.finish();
        } else if let Node::Leaf(leaf) = self.nodes.get(handle) {
            self.front = if index + 1 < leaf.key_count() {
                Some((handle, index + 1))
            } else {
                leaf.next().map(|next| (next, 0))
            };
            if self.front.is_none() {
                self.finish();
            }
        }
        Some(item)
    }
}

impl<K, V> DoubleEndedIterator for Range<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let position @ (handle, index) = self.back?;
        let Some(item) = self.entry(position) else {
            self.finish();
            return None;
        };

        if self.front == self.back {
            self.finish();
        } else if let Node::Leaf(leaf) = self.nodes.get(handle) {
            self.back = if index > 0 {
                Some((handle, index - 1))
            } else {
                leaf.prev().map(|prev| (prev, self.nodes.get(prev).key_count().saturating_sub(1)))
            };
            if self.back.is_none() {
                self.finish();
            }
        }
        Some(item)
    }
}

impl<K, V> FusedIterator for Range<'_, K, V> {}

impl<K, V> Clone for Range<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes,
            front: self.front,
            back: self.back,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Range<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

/// An iterator over every entry of a tree, in key order.
///
/// Created by [`BPlusTree::iter`](crate::BPlusTree::iter).
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, K, V> {
    range: Range<'a, K, V>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(range: Range<'a, K, V>, len: usize) -> Self {
        Self { range, remaining: len }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.range.next()?;
        self.remaining -= 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let item = self.range.next_back()?;
        self.remaining -= 1;
        Some(item)
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            range: self.range.clone(),
            remaining: self.remaining,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Iter<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

/// An iterator over the keys of a tree, in key order.
#[must_use = "iterators are lazy and do nothing unless consumed"]
#[derive(Clone)]
pub struct Keys<'a, K, V> {
    pub(crate) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Keys<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

impl<K, V> FusedIterator for Keys<'_, K, V> {}

/// An iterator over the values of a tree, in key order.
#[must_use = "iterators are lazy and do nothing unless consumed"]
#[derive(Clone)]
pub struct Values<'a, K, V> {
    pub(crate) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Values<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

impl<K, V> FusedIterator for Values<'_, K, V> {}
