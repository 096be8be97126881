use core::cmp::Ordering;

use super::arena::Arena;
use super::handle::{Handle, NodeId};
use super::node::{ChildVec, Direction, Node};
use crate::config::TreeConfig;
use crate::error::{InvariantViolation, Result, TreeError};
use crate::order::Comparator;
use crate::tracing_helpers::{debug_log, trace_log};

/// The core B+ tree backing `BPlusTree`.
#[derive(Clone, Debug)]
pub(crate) struct RawBPlusTree<K, V, C> {
    /// Arena storing all tree nodes; its length is the node count.
    nodes: Arena<Node<K, V>>,
    /// Handle to the root node, if the tree is non-empty.
    root: Option<Handle>,
    /// Leftmost leaf, head of the leaf chain.
    first_leaf: Option<Handle>,
    /// Rightmost leaf, tail of the leaf chain.
    last_leaf: Option<Handle>,
    /// Number of keys stored.
    len: usize,
    /// Id handed to the next node created.
    next_id: NodeId,
    config: TreeConfig,
    cmp: C,
}

impl<K, V, C> RawBPlusTree<K, V, C> {
    /// Creates an empty tree. `config` must already be validated.
    pub(crate) fn new(config: TreeConfig, cmp: C) -> Self {
        Self {
            // Reserve for small bounded trees only; large limits grow on demand.
            nodes: match config.max_nodes {
                Some(limit) if limit <= TreeConfig::NODE_LIMIT_REFERENCE => Arena::with_capacity(limit),
                _ => Arena::new(),
            },
            root: None,
            first_leaf: None,
            last_leaf: None,
            len: 0,
            next_id: NodeId::FIRST,
            config,
            cmp,
        }
    }

    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) const fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) const fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub(crate) const fn comparator(&self) -> &C {
        &self.cmp
    }

    pub(crate) fn root(&self) -> Option<Handle> {
        self.root
    }

    pub(crate) fn first_leaf(&self) -> Option<Handle> {
        self.first_leaf
    }

    pub(crate) fn last_leaf(&self) -> Option<Handle> {
        self.last_leaf
    }

    pub(crate) fn node(&self, handle: Handle) -> &Node<K, V> {
        self.nodes.get(handle)
    }

    pub(crate) fn nodes(&self) -> &Arena<Node<K, V>> {
        &self.nodes
    }

    /// Drops every node. Node ids keep counting up.
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.first_leaf = None;
        self.last_leaf = None;
        self.len = 0;
        debug_log!("tree cleared");
    }

    /// Drops every node and restarts node ids at 1.
    pub(crate) fn reset(&mut self) {
        self.clear();
        self.next_id = NodeId::FIRST;
    }

    /// Number of levels; 0 for an empty tree.
    pub(crate) fn height(&self) -> usize {
        let mut height = 0;
        let mut current = self.root;
        while let Some(handle) = current {
            height += 1;
            current = match self.nodes.get(handle) {
                Node::Internal(internal) => Some(internal.child(0)),
                Node::Leaf(_) => None,
            };
        }
        height
    }

    /// Number of leaves, counted along the leaf chain.
    pub(crate) fn leaf_count(&self) -> usize {
        let mut count = 0;
        let mut current = self.first_leaf;
        while let Some(handle) = current {
            count += 1;
            current = match self.nodes.get(handle) {
                Node::Leaf(leaf) => leaf.next(),
                Node::Internal(_) => None,
            };
        }
        count
    }

    fn fresh_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id = id.next();
        id
    }
}

impl<K: Clone, V, C: Comparator<K>> RawBPlusTree<K, V, C> {
    /// Descends to the only leaf that may hold `key`.
    fn find_leaf(&self, key: &K) -> Option<Handle> {
        let mut current = self.root?;
        loop {
            match self.nodes.get(current) {
                Node::Internal(internal) => current = internal.child(internal.child_index_for(key, &self.cmp)),
                Node::Leaf(_) => return Some(current),
            }
        }
    }

    /// Leaf handle and slot of `key`, if present.
    pub(crate) fn search(&self, key: &K) -> Option<(Handle, usize)> {
        let leaf_handle = self.find_leaf(key)?;
        let index = self.nodes.get(leaf_handle).leaf().ok()?.search(key, &self.cmp)?;
        Some((leaf_handle, index))
    }

    pub(crate) fn contains(&self, key: &K) -> bool {
        self.search(key).is_some()
    }

    pub(crate) fn get(&self, key: &K) -> Option<&V> {
        let (leaf_handle, index) = self.search(key)?;
        let leaf = self.nodes.get(leaf_handle).leaf().ok()?;
        Some(leaf.value(index))
    }

    pub(crate) fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let (leaf_handle, index) = self.search(key)?;
        let leaf = self.nodes.get_mut(leaf_handle).leaf_mut().ok()?;
        Some(leaf.value_mut(index))
    }

    /// Position of the first key `>= key`.
    pub(crate) fn lower_bound(&self, key: &K) -> Option<(Handle, usize)> {
        let leaf_handle = self.find_leaf(key)?;
        let leaf = self.nodes.get(leaf_handle).leaf().ok()?;
        let index = leaf.lower_bound(key, &self.cmp);
        if index < leaf.key_count() {
            return Some((leaf_handle, index));
        }
        // Everything in this leaf is smaller; the answer opens the next leaf.
        leaf.next().map(|next| (next, 0))
    }

    /// Position of the last key `<= key`.
    pub(crate) fn upper_bound_inclusive(&self, key: &K) -> Option<(Handle, usize)> {
        let leaf_handle = self.find_leaf(key)?;
        let leaf = self.nodes.get(leaf_handle).leaf().ok()?;
        let index = leaf.upper_bound(key, &self.cmp);
        if index > 0 {
            return Some((leaf_handle, index - 1));
        }
        let prev = leaf.prev()?;
        let count = self.nodes.get(prev).key_count();
        (count > 0).then(|| (prev, count - 1))
    }

    /// Inserts a new key. Duplicate and capacity checks run before any node is touched.
    pub(crate) fn insert(&mut self, key: K, value: V) -> Result<()> {
        if self.contains(&key) {
            return Err(TreeError::DuplicateKey);
        }
        self.check_capacity(&key)?;

        let Some(root) = self.root else {
            let id = self.fresh_id();
            let mut leaf = Node::new_leaf(id);
            leaf.leaf_mut()?.insert_ordered(key, value, &self.cmp)?;
            let handle = self.nodes.alloc(leaf);
            self.root = Some(handle);
            self.first_leaf = Some(handle);
            self.last_leaf = Some(handle);
            self.len = 1;
            debug_log!(root = %id, "planted root leaf");
            return Ok(());
        };

        let max_keys = self.config.max_keys();
        let mut current = root;
        if self.nodes.get(root).is_full(max_keys) {
            current = self.grow_root(root)?;
        }

        // Every node entered below has room, so a split never has to travel back up.
        loop {
            let mut index = match self.nodes.get(current) {
                Node::Leaf(_) => break,
                Node::Internal(internal) => internal.child_index_for(&key, &self.cmp),
            };
            let child = self.nodes.get(current).internal()?.child(index);
            if self.nodes.get(child).is_full(max_keys) {
                self.split_child(current, index)?;
                let separator = self.nodes.get(current).internal()?.key(index);
                if self.cmp.compare(&key, separator) != Ordering::Less {
                    index += 1;
                }
            }
            current = self.nodes.get(current).internal()?.child(index);
        }

        self.nodes.get_mut(current).leaf_mut()?.insert_ordered(key, value, &self.cmp)?;
        self.len += 1;
        trace_log!(len = self.len, "inserted key");
        Ok(())
    }

    /// Fails with `OutOfCapacity` if inserting `key` would exceed the node ceiling.
    fn check_capacity(&self, key: &K) -> Result<()> {
        let Some(limit) = self.config.max_nodes else {
            return Ok(());
        };
        let required = self.nodes.len() + self.nodes_needed_for_insert(key);
        if required > limit {
            return Err(TreeError::OutOfCapacity { limit, required });
        }
        Ok(())
    }

    /// Nodes an insert of `key` would create: one per full node on its descent path, plus a
    /// new root when the root itself is full.
    ///
    /// Splitting a parent keeps the child chosen for `key` unchanged, so the path can be
    /// measured on the tree as it stands.
    fn nodes_needed_for_insert(&self, key: &K) -> usize {
        let Some(root) = self.root else {
            return 1;
        };
        let max_keys = self.config.max_keys();
        let mut needed = usize::from(self.nodes.get(root).is_full(max_keys));
        let mut current = root;
        loop {
            let node = self.nodes.get(current);
            if node.is_full(max_keys) {
                needed += 1;
            }
            match node {
                Node::Internal(internal) => current = internal.child(internal.child_index_for(key, &self.cmp)),
                Node::Leaf(_) => return needed,
            }
        }
    }

    /// Puts a new internal root above `old_root` and splits the old root under it.
    fn grow_root(&mut self, old_root: Handle) -> Result<Handle> {
        let id = self.fresh_id();
        let mut new_root = Node::new_internal(id);
        new_root.internal_mut()?.push_first_child(old_root);
        let new_root = self.nodes.alloc(new_root);
        self.nodes.get_mut(old_root).set_parent(Some(new_root));
        self.root = Some(new_root);
        self.split_child(new_root, 0)?;
        debug_log!(root = %id, "root split, tree grew one level");
        Ok(new_root)
    }

    /// Splits the full child at `index` of `parent` and hangs the new sibling at `index + 1`.
    fn split_child(&mut self, parent: Handle, index: usize) -> Result<()> {
        let max_keys = self.config.max_keys();
        let child = self.nodes.get(parent).internal()?.child(index);
        let sibling_id = self.fresh_id();
        let (separator, sibling) = self.nodes.get_mut(child).split_full(max_keys, sibling_id)?;
        let sibling = self.nodes.alloc(sibling);

        let moved: Option<ChildVec> = match self.nodes.get(sibling) {
            Node::Leaf(_) => None,
            Node::Internal(internal) => Some(internal.children().iter().copied().collect()),
        };
        match moved {
            None => self.link_leaf_after(child, sibling)?,
            Some(moved) => {
                for handle in moved {
                    self.nodes.get_mut(handle).set_parent(Some(sibling));
                }
            }
        }

        self.nodes.get_mut(parent).internal_mut()?.insert_child(index, separator, sibling);
        debug_log!(node = %self.nodes.get(child).id(), sibling = %sibling_id, "split node");
        Ok(())
    }

    /// Threads the fresh leaf `right` into the chain directly after `left`.
    fn link_leaf_after(&mut self, left: Handle, right: Handle) -> Result<(), InvariantViolation> {
        let next = {
            let (left_node, right_node) = self.nodes.get_pair_mut(left, right);
            let (left_leaf, right_leaf) = (left_node.leaf_mut()?, right_node.leaf_mut()?);
            left_leaf.set_next(Some(right));
            right_leaf.set_prev(Some(left));
            right_leaf.next()
        };
        match next {
            Some(next) => self.nodes.get_mut(next).leaf_mut()?.set_prev(Some(right)),
            None => self.last_leaf = Some(right),
        }
        Ok(())
    }

    /// Removes `key`. Presence is checked before any node is touched.
    pub(crate) fn delete(&mut self, key: &K) -> Result<(K, V)> {
        if !self.contains(key) {
            return Err(TreeError::NotFound);
        }
        let Some(root) = self.root else {
            return Err(TreeError::NotFound);
        };

        let min_keys = self.config.min_keys();
        let mut current = root;

        // Every child entered below holds more than the minimum, so removing one key from the
        // leaf, or one separator from a parent, never underflows.
        loop {
            let mut index = match self.nodes.get(current) {
                Node::Leaf(_) => break,
                Node::Internal(internal) => internal.child_index_for(key, &self.cmp),
            };
            let child = self.nodes.get(current).internal()?.child(index);
            if self.nodes.get(child).key_count() <= min_keys {
                index = self.fix_child(current, index)?;
            }
            current = self.nodes.get(current).internal()?.child(index);
        }

        let leaf = self.nodes.get_mut(current).leaf_mut()?;
        let Some(index) = leaf.search(key, &self.cmp) else {
            return Err(TreeError::NotFound);
        };
        let (removed_key, value) = leaf.remove(index);
        let new_first = if index == 0 { leaf.first_key().cloned() } else { None };
        self.len -= 1;

        if let Some(new_first) = new_first {
            self.update_separators_upward(current, &removed_key, &new_first)?;
        }
        self.collapse_root()?;
        trace_log!(len = self.len, "deleted key");
        Ok((removed_key, value))
    }

    /// Brings the minimum-occupancy child at `index` above the minimum by borrowing from a
    /// sibling or merging with one. Returns the index of the node now covering that child's
    /// key range.
    fn fix_child(&mut self, parent: Handle, index: usize) -> Result<usize> {
        let min_keys = self.config.min_keys();
        let (left, right) = {
            let parent = self.nodes.get(parent).internal()?;
            let left = (index > 0).then(|| parent.child(index - 1));
            let right = (index < parent.key_count()).then(|| parent.child(index + 1));
            (left, right)
        };

        if let Some(left) = left
            && self.nodes.get(left).key_count() > min_keys
        {
            self.redistribute(parent, index, left, Direction::FromLeft)?;
            return Ok(index);
        }
        if let Some(right) = right
            && self.nodes.get(right).key_count() > min_keys
        {
            self.redistribute(parent, index, right, Direction::FromRight)?;
            return Ok(index);
        }

        match (left, right) {
            (_, Some(_)) => {
                self.merge_children(parent, index)?;
                Ok(index)
            }
            (Some(_), None) => {
                self.merge_children(parent, index - 1)?;
                Ok(index - 1)
            }
            (None, None) => Err(InvariantViolation::EmptySibling.into()),
        }
    }

    /// Moves one entry from `sibling` into the child at `index` and updates the separator
    /// between them.
    fn redistribute(&mut self, parent: Handle, index: usize, sibling: Handle, direction: Direction) -> Result<()> {
        let separator_index = match direction {
            Direction::FromLeft => index - 1,
            Direction::FromRight => index,
        };
        let (child, separator) = {
            let parent = self.nodes.get(parent).internal()?;
            (parent.child(index), parent.key(separator_index).clone())
        };

        let (new_separator, moved) = {
            let (node, sibling) = self.nodes.get_pair_mut(child, sibling);
            node.redistribute_with(sibling, separator, direction)?
        };
        self.nodes.get_mut(parent).internal_mut()?.set_key(separator_index, new_separator);
        if let Some(moved) = moved {
            self.nodes.get_mut(moved).set_parent(Some(child));
        }
        debug_log!(node = %self.nodes.get(child).id(), ?direction, "redistributed one entry");
        Ok(())
    }

    /// Merges the children at `left_index` and `left_index + 1`; the left one survives.
    fn merge_children(&mut self, parent: Handle, left_index: usize) -> Result<()> {
        let max_keys = self.config.max_keys();
        let (left, separator, right) = {
            let parent = self.nodes.get_mut(parent).internal_mut()?;
            let (separator, right) = parent.remove_child(left_index);
            (parent.child(left_index), separator, right)
        };

        let right_node = self.nodes.take(right);
        debug_log!(node = %self.nodes.get(left).id(), absorbed = %right_node.id(), "merging siblings");
        let adopted = self.nodes.get_mut(left).merge_with_right(separator, right_node, max_keys)?;

        let next = match self.nodes.get(left) {
            Node::Leaf(leaf) => Some(leaf.next()),
            Node::Internal(_) => None,
        };
        match next {
            // Leaf merge: the chain skips the absorbed leaf.
            Some(Some(next)) => self.nodes.get_mut(next).leaf_mut()?.set_prev(Some(left)),
            Some(None) => self.last_leaf = Some(left),
            None => {
                let adopted: ChildVec = self.nodes.get(left).internal()?.children()[adopted].iter().copied().collect();
                for handle in adopted {
                    self.nodes.get_mut(handle).set_parent(Some(left));
                }
            }
        }
        Ok(())
    }

    /// Replaces every ancestor separator equal to `old` with `new`, walking parent links up
    /// from `leaf`.
    fn update_separators_upward(&mut self, leaf: Handle, old: &K, new: &K) -> Result<()> {
        let mut current = self.nodes.get(leaf).parent();
        while let Some(handle) = current {
            let node = self.nodes.get_mut(handle).internal_mut()?;
            let index = node.lower_bound(old, &self.cmp);
            if index < node.key_count() && self.cmp.compare(node.key(index), old) == Ordering::Equal {
                node.set_key(index, new.clone());
            }
            current = self.nodes.get(handle).parent();
        }
        Ok(())
    }

    /// Shrinks the tree after a delete: an internal root without separators hands the root
    /// to its only child, and an empty root leaf empties the tree.
    fn collapse_root(&mut self) -> Result<()> {
        let Some(root) = self.root else {
            return Ok(());
        };
        let node = self.nodes.get_mut(root);
        let empty_leaf = node.is_leaf() && node.key_count() == 0;
        let only_child = match node {
            Node::Internal(internal) => internal.take_only_child(),
            Node::Leaf(_) => None,
        };

        if let Some(child) = only_child {
            self.nodes.free(root);
            self.nodes.get_mut(child).set_parent(None);
            self.root = Some(child);
            debug_log!(root = %self.nodes.get(child).id(), "root collapsed, tree shrank one level");
        } else if empty_leaf {
            self.nodes.free(root);
            self.root = None;
            self.first_leaf = None;
            self.last_leaf = None;
            debug_log!("last key removed, tree is empty");
        }
        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::order::NaturalOrder;
    use alloc::vec::Vec;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    type Tree = RawBPlusTree<i32, i32, NaturalOrder>;

    fn tree(t: usize) -> Tree {
        RawBPlusTree::new(TreeConfig::new(t), NaturalOrder)
    }

    fn chain_keys(tree: &Tree) -> Vec<i32> {
        let mut keys = Vec::new();
        let mut current = tree.first_leaf();
        while let Some(handle) = current {
            let leaf = tree.node(handle).leaf().unwrap();
            keys.extend_from_slice(leaf.keys());
            current = leaf.next();
        }
        keys
    }

    fn root_keys(tree: &Tree) -> Vec<i32> {
        tree.node(tree.root().unwrap()).keys().to_vec()
    }

    #[test]
    fn first_insert_plants_leaf_root() {
        let mut tree = tree(2);
        tree.insert(7, 70).unwrap();
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.first_leaf(), tree.root());
        assert_eq!(tree.last_leaf(), tree.root());
        assert_eq!(tree.get(&7), Some(&70));
    }

    #[test]
    fn full_root_splits_before_descending() {
        let mut tree = tree(2);
        for k in [10, 20, 30] {
            tree.insert(k, k).unwrap();
        }
        assert_eq!(tree.height(), 1);

        tree.insert(40, 40).unwrap();
        assert_eq!(tree.height(), 2);
        assert_eq!(tree.node_count(), 3);
        // Leaf split at mid = 1 copies the right leaf's first key upward.
        assert_eq!(root_keys(&tree), [20]);
        assert_eq!(chain_keys(&tree), [10, 20, 30, 40]);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn internal_split_promotes_middle_separator() {
        let mut tree = tree(2);
        for k in 1..=10 {
            tree.insert(k, k).unwrap();
            tree.check_invariants().unwrap();
        }
        assert_eq!(tree.height(), 3);
        assert_eq!(chain_keys(&tree), (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn duplicate_insert_leaves_tree_untouched() {
        let mut tree = tree(2);
        for k in [1, 2, 3] {
            tree.insert(k, k).unwrap();
        }
        let nodes = tree.node_count();
        assert_eq!(tree.insert(2, 99), Err(TreeError::DuplicateKey));
        assert_eq!(tree.node_count(), nodes);
        assert_eq!(tree.get(&2), Some(&2));
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn capacity_is_checked_before_mutation() {
        let mut tree = RawBPlusTree::new(TreeConfig::new(2).with_max_nodes(1), NaturalOrder);
        for k in [1, 2, 3] {
            tree.insert(k, k).unwrap();
        }
        // Root leaf is full: the next insert needs a new root and a sibling.
        assert_eq!(tree.insert(4, 4), Err(TreeError::OutOfCapacity { limit: 1, required: 3 }));
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.height(), 1);
        assert_eq!(chain_keys(&tree), [1, 2, 3]);
    }

    #[test]
    fn capacity_estimate_matches_actual_growth() {
        let mut tree = tree(2);
        let mut x: u64 = 12345;
        for _ in 0..500 {
            x = x.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            #[allow(clippy::cast_possible_truncation)]
            let key = (x >> 40) as i32;
            if tree.contains(&key) {
                continue;
            }
            let before = tree.node_count();
            let predicted = tree.nodes_needed_for_insert(&key);
            tree.insert(key, key).unwrap();
            assert_eq!(tree.node_count() - before, predicted);
        }
    }

    #[test]
    fn delete_borrows_from_left_leaf() {
        let mut tree = tree(2);
        for k in [10, 20, 30, 5, 6] {
            tree.insert(k, k).unwrap();
        }
        // Leaves: [5, 6, 10] [20, 30].
        tree.delete(&30).unwrap();
        assert_eq!(root_keys(&tree), [20]);
        // [20] is at the minimum, so it borrows 10 from the left before 20 goes.
        tree.delete(&20).unwrap();
        tree.check_invariants().unwrap();
        assert_eq!(root_keys(&tree), [10]);
        assert_eq!(chain_keys(&tree), [5, 6, 10]);
        assert_eq!(tree.node_count(), 3);
    }

    #[test]
    fn delete_merges_and_collapses_root() {
        let mut tree = tree(2);
        for k in [10, 20, 30, 40] {
            tree.insert(k, k).unwrap();
        }
        // Leaves: [10] [20, 30, 40].
        assert_eq!(tree.height(), 2);
        tree.delete(&40).unwrap();
        tree.delete(&30).unwrap();
        assert_eq!(tree.height(), 2);
        // Both leaves are at the minimum: they merge and the separator-less root goes.
        tree.delete(&20).unwrap();
        tree.check_invariants().unwrap();
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(chain_keys(&tree), [10]);
        assert_eq!(tree.node(tree.root().unwrap()).parent(), None);
    }

    #[test]
    fn deleting_a_separator_source_refreshes_ancestors() {
        let mut tree = tree(2);
        for k in 1..=20 {
            tree.insert(k, k).unwrap();
        }
        for k in [9, 5, 13, 17, 3] {
            tree.delete(&k).unwrap();
            tree.check_invariants().unwrap();
            assert!(!tree.contains(&k));
        }
    }

    #[test]
    fn deleting_everything_empties_the_tree() {
        let mut tree = tree(3);
        for k in 0..50 {
            tree.insert(k, k).unwrap();
        }
        for k in (0..50).rev() {
            assert_eq!(tree.delete(&k), Ok((k, k)));
            tree.check_invariants().unwrap();
        }
        assert!(tree.is_empty());
        assert_eq!(tree.node_count(), 0);
        assert_eq!(tree.root(), None);
        assert_eq!(tree.first_leaf(), None);
        assert_eq!(tree.delete(&0), Err(TreeError::NotFound));
    }

    #[test]
    fn bounds_cross_leaf_edges() {
        let mut tree = tree(2);
        for k in (0..40).step_by(2) {
            tree.insert(k, k).unwrap();
        }
        for probe in -1..41 {
            let lower = tree.lower_bound(&probe).map(|(h, i)| *tree.node(h).leaf().unwrap().key(i));
            let expected = (0..40).step_by(2).find(|&k| k >= probe);
            assert_eq!(lower, expected, "lower bound of {probe}");

            let upper = tree.upper_bound_inclusive(&probe).map(|(h, i)| *tree.node(h).leaf().unwrap().key(i));
            let expected = (0..40).step_by(2).filter(|&k| k <= probe).last();
            assert_eq!(upper, expected, "inclusive upper bound of {probe}");
        }
    }

    #[test]
    fn reset_restarts_node_ids() {
        let mut tree = tree(2);
        for k in 0..10 {
            tree.insert(k, k).unwrap();
        }
        tree.clear();
        tree.insert(1, 1).unwrap();
        assert!(tree.node(tree.root().unwrap()).id().get() > 1);

        tree.reset();
        tree.insert(1, 1).unwrap();
        assert_eq!(tree.node(tree.root().unwrap()).id().get(), 1);
    }

    #[test]
    fn clone_is_independent() {
        let mut tree = tree(2);
        for k in 0..30 {
            tree.insert(k, k).unwrap();
        }
        let mut copy = tree.clone();
        copy.check_invariants().unwrap();
        for k in 0..15 {
            copy.delete(&k).unwrap();
        }
        copy.insert(100, 100).unwrap();
        assert_eq!(chain_keys(&tree), (0..30).collect::<Vec<_>>());
        assert!(!tree.contains(&100));
        tree.check_invariants().unwrap();
        copy.check_invariants().unwrap();
    }

    #[derive(Clone, Debug)]
    enum Op {
        Insert(i32),
        Delete(i32),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (0i32..300).prop_map(Op::Insert),
            2 => (0i32..300).prop_map(Op::Delete),
        ]
    }

    proptest! {
        #[test]
        fn invariants_hold_after_every_operation(
            t in 2usize..6,
            ops in prop::collection::vec(op_strategy(), 0..400),
        ) {
            let mut tree = tree(t);
            let mut model = alloc::collections::BTreeMap::new();

            for op in ops {
                match op {
                    Op::Insert(k) => {
                        let expected = if model.contains_key(&k) { Err(TreeError::DuplicateKey) } else { Ok(()) };
                        prop_assert_eq!(tree.insert(k, -k), expected);
                        model.entry(k).or_insert(-k);
                    }
                    Op::Delete(k) => {
                        let expected = model.remove(&k).map(|v| (k, v)).ok_or(TreeError::NotFound);
                        prop_assert_eq!(tree.delete(&k), expected);
                    }
                }
                if let Err(errors) = tree.check_invariants() {
                    prop_assert!(false, "{}", errors);
                }
                prop_assert_eq!(tree.len(), model.len());
            }

            prop_assert_eq!(chain_keys(&tree), model.keys().copied().collect::<Vec<_>>());
        }
    }
}
