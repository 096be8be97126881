use core::cmp::Ordering;
use core::ops::Range;

use smallvec::SmallVec;

use super::handle::{Handle, NodeId};
use crate::error::InvariantViolation;
use crate::order::Comparator;

/// Keys kept inline before a node spills to the heap; covers `2t` for `t <= 4`.
pub(crate) const INLINE_KEYS: usize = 8;

pub(crate) type KeyVec<K> = SmallVec<[K; INLINE_KEYS]>;
pub(crate) type ChildVec = SmallVec<[Handle; INLINE_KEYS + 1]>;

#[allow(clippy::large_enum_variant)]
#[derive(Clone, Debug)]
pub(crate) enum Node<K, V> {
    Internal(InternalNode<K>),
    Leaf(LeafNode<K, V>),
}

// Separators: keys[i] is a copy of the first key of the leftmost leaf under children[i + 1].
#[derive(Clone, Debug)]
pub(crate) struct InternalNode<K> {
    id: NodeId,
    parent: Option<Handle>,
    keys: KeyVec<K>,
    children: ChildVec,
}

#[derive(Clone, Debug)]
pub(crate) struct LeafNode<K, V> {
    id: NodeId,
    parent: Option<Handle>,
    prev: Option<Handle>,
    next: Option<Handle>,
    keys: KeyVec<K>,
    values: SmallVec<[V; INLINE_KEYS]>,
}

/// Side of the sibling a key is borrowed from during redistribution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Direction {
    FromLeft,
    FromRight,
}

/// First index whose key is `>= key`.
#[inline]
fn lower_bound_in<K, C: Comparator<K>>(keys: &[K], key: &K, cmp: &C) -> usize {
    keys.partition_point(|k| cmp.compare(k, key) == Ordering::Less)
}

/// First index whose key is `> key`.
#[inline]
fn upper_bound_in<K, C: Comparator<K>>(keys: &[K], key: &K, cmp: &C) -> usize {
    keys.partition_point(|k| cmp.compare(k, key) != Ordering::Greater)
}

impl<K, V> Node<K, V> {
    pub(crate) fn new_leaf(id: NodeId) -> Self {
        Node::Leaf(LeafNode::new(id))
    }

    pub(crate) fn new_internal(id: NodeId) -> Self {
        Node::Internal(InternalNode::new(id))
    }

    pub(crate) fn id(&self) -> NodeId {
        match self {
            Node::Internal(internal) => internal.id,
            Node::Leaf(leaf) => leaf.id,
        }
    }

    pub(crate) fn parent(&self) -> Option<Handle> {
        match self {
            Node::Internal(internal) => internal.parent,
            Node::Leaf(leaf) => leaf.parent,
        }
    }

    pub(crate) fn set_parent(&mut self, parent: Option<Handle>) {
        match self {
            Node::Internal(internal) => internal.parent = parent,
            Node::Leaf(leaf) => leaf.parent = parent,
        }
    }

    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    pub(crate) fn keys(&self) -> &[K] {
        match self {
            Node::Internal(internal) => &internal.keys,
            Node::Leaf(leaf) => &leaf.keys,
        }
    }

    pub(crate) fn key_count(&self) -> usize {
        self.keys().len()
    }

    pub(crate) fn is_full(&self, max_keys: usize) -> bool {
        self.key_count() >= max_keys
    }

    pub(crate) fn leaf(&self) -> Result<&LeafNode<K, V>, InvariantViolation> {
        match self {
            Node::Leaf(leaf) => Ok(leaf),
            Node::Internal(_) => Err(InvariantViolation::UnexpectedKind { expected: "leaf" }),
        }
    }

    pub(crate) fn leaf_mut(&mut self) -> Result<&mut LeafNode<K, V>, InvariantViolation> {
        match self {
            Node::Leaf(leaf) => Ok(leaf),
            Node::Internal(_) => Err(InvariantViolation::UnexpectedKind { expected: "leaf" }),
        }
    }

    pub(crate) fn internal(&self) -> Result<&InternalNode<K>, InvariantViolation> {
        match self {
            Node::Internal(internal) => Ok(internal),
            Node::Leaf(_) => Err(InvariantViolation::UnexpectedKind { expected: "internal" }),
        }
    }

    pub(crate) fn internal_mut(&mut self) -> Result<&mut InternalNode<K>, InvariantViolation> {
        match self {
            Node::Internal(internal) => Ok(internal),
            Node::Leaf(_) => Err(InvariantViolation::UnexpectedKind { expected: "internal" }),
        }
    }

    /// Splits a full node at `max_keys / 2`, returning the separator for the parent and the
    /// new right sibling (which inherits this node's parent).
    pub(crate) fn split_full(&mut self, max_keys: usize, sibling_id: NodeId) -> Result<(K, Self), InvariantViolation>
    where
        K: Clone,
    {
        let len = self.key_count();
        if len != max_keys {
            return Err(InvariantViolation::SplitNotFull { len, max: max_keys });
        }
        let mid = max_keys / 2;
        match self {
            Node::Leaf(leaf) => leaf.split_at(mid, sibling_id).map(|(sep, right)| (sep, Node::Leaf(right))),
            Node::Internal(internal) => {
                internal.split_at(mid, sibling_id).map(|(sep, right)| (sep, Node::Internal(right)))
            }
        }
    }

    /// Absorbs the right sibling. Returns the index range of children adopted from it
    /// (empty for leaves).
    pub(crate) fn merge_with_right(
        &mut self,
        separator: K,
        right: Self,
        max_keys: usize,
    ) -> Result<Range<usize>, InvariantViolation> {
        match (self, right) {
            (Node::Leaf(left), Node::Leaf(right)) => left.merge_with_right(right, max_keys).map(|()| 0..0),
            (Node::Internal(left), Node::Internal(right)) => left.merge_with_right(separator, right, max_keys),
            _ => Err(InvariantViolation::MergeKindMismatch),
        }
    }

    /// Moves one entry from `sibling` into this node. Returns the separator the parent must
    /// adopt and, for internal nodes, the child that changed hands.
    pub(crate) fn redistribute_with(
        &mut self,
        sibling: &mut Self,
        separator: K,
        direction: Direction,
    ) -> Result<(K, Option<Handle>), InvariantViolation>
    where
        K: Clone,
    {
        match (self, sibling) {
            (Node::Leaf(node), Node::Leaf(sibling)) => node.redistribute_with(sibling, direction).map(|sep| (sep, None)),
            (Node::Internal(node), Node::Internal(sibling)) => node
                .redistribute_with(sibling, separator, direction)
                .map(|(sep, child)| (sep, Some(child))),
            _ => Err(InvariantViolation::RedistributeKindMismatch),
        }
    }
}

impl<K> InternalNode<K> {
    pub(crate) fn new(id: NodeId) -> Self {
        Self {
            id,
            parent: None,
            keys: SmallVec::new(),
            children: SmallVec::new(),
        }
    }

    pub(crate) fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn child_count(&self) -> usize {
        self.children.len()
    }

    #[inline]
    pub(crate) fn key(&self, index: usize) -> &K {
        &self.keys[index]
    }

    pub(crate) fn keys(&self) -> &[K] {
        &self.keys
    }

    #[inline]
    pub(crate) fn child(&self, index: usize) -> Handle {
        self.children[index]
    }

    pub(crate) fn children(&self) -> &[Handle] {
        &self.children
    }

    pub(crate) fn set_key(&mut self, index: usize, key: K) {
        self.keys[index] = key;
    }

    /// Sets the only child of a freshly grown root.
    pub(crate) fn push_first_child(&mut self, child: Handle) {
        debug_assert!(self.children.is_empty());
        self.children.push(child);
    }

    #[inline]
    pub(crate) fn lower_bound<C: Comparator<K>>(&self, key: &K, cmp: &C) -> usize {
        lower_bound_in(&self.keys, key, cmp)
    }

    #[inline]
    pub(crate) fn upper_bound<C: Comparator<K>>(&self, key: &K, cmp: &C) -> usize {
        upper_bound_in(&self.keys, key, cmp)
    }

    /// Child to descend into for `key`. A key equal to a separator goes right.
    #[inline]
    pub(crate) fn child_index_for<C: Comparator<K>>(&self, key: &K, cmp: &C) -> usize {
        self.upper_bound(key, cmp)
    }

    /// Inserts `key` at `index` with `child` as its right neighbour.
    pub(crate) fn insert_child(&mut self, index: usize, key: K, child: Handle) {
        self.keys.insert(index, key);
        self.children.insert(index + 1, child);
    }

    /// Removes `keys[index]` and its right child `children[index + 1]`.
    pub(crate) fn remove_child(&mut self, index: usize) -> (K, Handle) {
        let key = self.keys.remove(index);
        let child = self.children.remove(index + 1);
        (key, child)
    }

    /// Removes the sole child of a node left without separators.
    pub(crate) fn take_only_child(&mut self) -> Option<Handle> {
        if self.keys.is_empty() && self.children.len() == 1 {
            self.children.pop()
        } else {
            None
        }
    }

    /// Promotes `keys[mid]`, which leaves both halves.
    pub(crate) fn split_at(&mut self, mid: usize, sibling_id: NodeId) -> Result<(K, Self), InvariantViolation> {
        let len = self.keys.len();
        if mid == 0 || mid >= len {
            return Err(InvariantViolation::SplitOutOfRange { mid, len });
        }

        let mut right = InternalNode::new(sibling_id);
        right.parent = self.parent;
        right.keys = self.keys.drain(mid + 1..).collect();
        right.children = self.children.drain(mid + 1..).collect();

        let Some(separator) = self.keys.pop() else {
            return Err(InvariantViolation::SplitOutOfRange { mid, len });
        };
        Ok((separator, right))
    }

    /// Appends `separator` and the right sibling's runs.
    pub(crate) fn merge_with_right(
        &mut self,
        separator: K,
        mut right: InternalNode<K>,
        max_keys: usize,
    ) -> Result<Range<usize>, InvariantViolation> {
        let len = self.keys.len() + 1 + right.keys.len();
        if len > max_keys {
            return Err(InvariantViolation::MergeOverflow { len, max: max_keys });
        }
        let start = self.children.len();
        self.keys.push(separator);
        self.keys.append(&mut right.keys);
        self.children.append(&mut right.children);
        Ok(start..self.children.len())
    }

    /// Rotates one key and one child through the parent separator.
    pub(crate) fn redistribute_with(
        &mut self,
        sibling: &mut InternalNode<K>,
        separator: K,
        direction: Direction,
    ) -> Result<(K, Handle), InvariantViolation> {
        if sibling.keys.is_empty() || sibling.children.len() < 2 {
            return Err(InvariantViolation::EmptySibling);
        }
        match direction {
            Direction::FromLeft => {
                let (Some(key), Some(child)) = (sibling.keys.pop(), sibling.children.pop()) else {
                    return Err(InvariantViolation::EmptySibling);
                };
                self.keys.insert(0, separator);
                self.children.insert(0, child);
                Ok((key, child))
            }
            Direction::FromRight => {
                let key = sibling.keys.remove(0);
                let child = sibling.children.remove(0);
                self.keys.push(separator);
                self.children.push(child);
                Ok((key, child))
            }
        }
    }
}

impl<K, V> LeafNode<K, V> {
    pub(crate) fn new(id: NodeId) -> Self {
        Self {
            id,
            parent: None,
            prev: None,
            next: None,
            keys: SmallVec::new(),
            values: SmallVec::new(),
        }
    }

    pub(crate) fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn prev(&self) -> Option<Handle> {
        self.prev
    }

    pub(crate) fn set_prev(&mut self, prev: Option<Handle>) {
        self.prev = prev;
    }

    pub(crate) fn next(&self) -> Option<Handle> {
        self.next
    }

    pub(crate) fn set_next(&mut self, next: Option<Handle>) {
        self.next = next;
    }

    #[inline]
    pub(crate) fn key(&self, index: usize) -> &K {
        &self.keys[index]
    }

    pub(crate) fn keys(&self) -> &[K] {
        &self.keys
    }

    #[inline]
    pub(crate) fn value(&self, index: usize) -> &V {
        &self.values[index]
    }

    #[inline]
    pub(crate) fn value_mut(&mut self, index: usize) -> &mut V {
        &mut self.values[index]
    }

    pub(crate) fn first_key(&self) -> Option<&K> {
        self.keys.first()
    }

    #[inline]
    pub(crate) fn lower_bound<C: Comparator<K>>(&self, key: &K, cmp: &C) -> usize {
        lower_bound_in(&self.keys, key, cmp)
    }

    #[inline]
    pub(crate) fn upper_bound<C: Comparator<K>>(&self, key: &K, cmp: &C) -> usize {
        upper_bound_in(&self.keys, key, cmp)
    }

    /// Exact-match position of `key`.
    pub(crate) fn search<C: Comparator<K>>(&self, key: &K, cmp: &C) -> Option<usize> {
        let index = self.lower_bound(key, cmp);
        (index < self.keys.len() && cmp.compare(&self.keys[index], key) == Ordering::Equal).then_some(index)
    }

    /// Inserts at the sorted position and returns it.
    pub(crate) fn insert_ordered<C: Comparator<K>>(
        &mut self,
        key: K,
        value: V,
        cmp: &C,
    ) -> Result<usize, InvariantViolation> {
        let index = self.lower_bound(&key, cmp);
        if index < self.keys.len() && cmp.compare(&self.keys[index], &key) == Ordering::Equal {
            return Err(InvariantViolation::DuplicateInLeaf);
        }
        self.keys.insert(index, key);
        self.values.insert(index, value);
        Ok(index)
    }

    pub(crate) fn remove(&mut self, index: usize) -> (K, V) {
        let key = self.keys.remove(index);
        let value = self.values.remove(index);
        (key, value)
    }

    /// Moves `keys[mid..]` into a new right leaf and returns a copy of its first key.
    ///
    /// The right leaf takes over this leaf's `next` link; the caller threads the rest of the
    /// chain once the right leaf has a handle.
    pub(crate) fn split_at(&mut self, mid: usize, sibling_id: NodeId) -> Result<(K, Self), InvariantViolation>
    where
        K: Clone,
    {
        let len = self.keys.len();
        if mid == 0 || mid >= len {
            return Err(InvariantViolation::SplitOutOfRange { mid, len });
        }

        let mut right = LeafNode::new(sibling_id);
        right.parent = self.parent;
        right.next = self.next;
        right.keys = self.keys.drain(mid..).collect();
        right.values = self.values.drain(mid..).collect();

        let separator = right.keys[0].clone();
        Ok((separator, right))
    }

    /// Appends the right sibling's entries and unlinks it from the chain on this side.
    pub(crate) fn merge_with_right(&mut self, mut right: LeafNode<K, V>, max_keys: usize) -> Result<(), InvariantViolation> {
        let len = self.keys.len() + right.keys.len();
        if len > max_keys {
            return Err(InvariantViolation::MergeOverflow { len, max: max_keys });
        }
        self.keys.append(&mut right.keys);
        self.values.append(&mut right.values);
        self.next = right.next;
        Ok(())
    }

    /// Borrows one entry from an adjacent leaf and returns the separator between the two.
    pub(crate) fn redistribute_with(
        &mut self,
        sibling: &mut LeafNode<K, V>,
        direction: Direction,
    ) -> Result<K, InvariantViolation>
    where
        K: Clone,
    {
        if sibling.keys.len() < 2 {
            return Err(InvariantViolation::EmptySibling);
        }
        match direction {
            Direction::FromLeft => {
                let (Some(key), Some(value)) = (sibling.keys.pop(), sibling.values.pop()) else {
                    return Err(InvariantViolation::EmptySibling);
                };
                self.keys.insert(0, key);
                self.values.insert(0, value);
                Ok(self.keys[0].clone())
            }
            Direction::FromRight => {
                let (key, value) = sibling.remove(0);
                self.keys.push(key);
                self.values.push(value);
                Ok(sibling.keys[0].clone())
            }
        }
    }
}
