use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Ordering;

use super::handle::Handle;
use super::node::Node;
use super::raw_tree::RawBPlusTree;
use crate::order::Comparator;

/// Facts gathered about one subtree while validating it.
struct Subtree<'a, K> {
    /// First key of the leftmost leaf.
    min: Option<&'a K>,
    /// Last key of the rightmost leaf.
    max: Option<&'a K>,
    /// Nodes in the subtree.
    nodes: usize,
}

impl<K, V, C: Comparator<K>> RawBPlusTree<K, V, C> {
    /// Walks the whole tree and reports every broken structural invariant.
    pub(crate) fn check_invariants(&self) -> Result<(), String> {
        let mut errors: Vec<String> = Vec::new();

        let Some(root) = self.root() else {
            if self.first_leaf().is_some() || self.last_leaf().is_some() {
                errors.push("empty tree still points at a leaf".into());
            }
            if self.len() != 0 || !self.nodes().is_empty() {
                errors.push(format!("empty tree reports len={} nodes={}", self.len(), self.node_count()));
            }
            return finish(errors);
        };

        if self.node(root).parent().is_some() {
            errors.push("root has a parent".into());
        }
        if self.node(root).key_count() == 0 {
            errors.push("root holds no keys".into());
        }

        let mut leaves: Vec<Handle> = Vec::new();
        let mut leaf_depth = None;
        let subtree = self.check_node(root, 0, &mut leaf_depth, &mut leaves, &mut errors);
        if subtree.nodes != self.node_count() {
            errors.push(format!(
                "node count mismatch: reachable={}, tracked={}",
                subtree.nodes,
                self.node_count()
            ));
        }

        self.check_leaf_chain(&leaves, &mut errors);
        finish(errors)
    }

    fn check_node<'a>(
        &'a self,
        handle: Handle,
        depth: usize,
        leaf_depth: &mut Option<usize>,
        leaves: &mut Vec<Handle>,
        errors: &mut Vec<String>,
    ) -> Subtree<'a, K> {
        let node = self.node(handle);
        let id = node.id();
        let keys = node.keys();
        let is_root = Some(handle) == self.root();

        for i in 1..keys.len() {
            if self.comparator().compare(&keys[i - 1], &keys[i]) != Ordering::Less {
                errors.push(format!("{id}: keys not strictly increasing at {}..={}", i - 1, i));
            }
        }
        if keys.len() > self.config().max_keys() {
            errors.push(format!("{id}: {} keys exceed the maximum {}", keys.len(), self.config().max_keys()));
        }
        if !is_root && keys.len() < self.config().min_keys() {
            errors.push(format!("{id}: {} keys below the minimum {}", keys.len(), self.config().min_keys()));
        }

        match node {
            Node::Leaf(_) => {
                match *leaf_depth {
                    None => *leaf_depth = Some(depth),
                    Some(expected) if expected != depth => {
                        errors.push(format!("{id}: leaf at depth {depth}, expected {expected}"));
                    }
                    Some(_) => {}
                }
                leaves.push(handle);
                Subtree {
                    min: keys.first(),
                    max: keys.last(),
                    nodes: 1,
                }
            }
            Node::Internal(internal) => {
                if internal.child_count() != internal.key_count() + 1 {
                    errors.push(format!(
                        "{id}: {} children for {} keys",
                        internal.child_count(),
                        internal.key_count()
                    ));
                    return Subtree {
                        min: None,
                        max: None,
                        nodes: 1,
                    };
                }

                let mut result = Subtree {
                    min: None,
                    max: None,
                    nodes: 1,
                };
                for (i, &child) in internal.children().iter().enumerate() {
                    if self.node(child).parent() != Some(handle) {
                        errors.push(format!("{id}: child {i} does not point back at its parent"));
                    }
                    let sub = self.check_node(child, depth + 1, leaf_depth, leaves, errors);

                    if i > 0 {
                        let separator = internal.key(i - 1);
                        match sub.min {
                            Some(min) if self.comparator().compare(min, separator) == Ordering::Equal => {}
                            _ => errors.push(format!("{id}: separator {} is not the first key of child {i}", i - 1)),
                        }
                    }
                    if i < internal.key_count()
                        && let Some(max) = sub.max
                        && self.comparator().compare(max, internal.key(i)) != Ordering::Less
                    {
                        errors.push(format!("{id}: child {i} holds a key not below separator {i}"));
                    }

                    if i == 0 {
                        result.min = sub.min;
                    }
                    result.max = sub.max;
                    result.nodes += sub.nodes;
                }
                result
            }
        }
    }

    fn check_leaf_chain(&self, leaves: &[Handle], errors: &mut Vec<String>) {
        if self.first_leaf() != leaves.first().copied() {
            errors.push("first leaf is not the leftmost leaf".into());
        }
        if self.last_leaf() != leaves.last().copied() {
            errors.push("last leaf is not the rightmost leaf".into());
        }

        let mut count = 0;
        for (i, &handle) in leaves.iter().enumerate() {
            let Ok(leaf) = self.node(handle).leaf() else {
                errors.push(format!("leaf {i} is not a leaf"));
                continue;
            };
            count += leaf.key_count();

            let expected_prev = i.checked_sub(1).map(|p| leaves[p]);
            let expected_next = leaves.get(i + 1).copied();
            if leaf.prev() != expected_prev {
                errors.push(format!("leaf {i}: prev link out of order"));
            }
            if leaf.next() != expected_next {
                errors.push(format!("leaf {i}: next link out of order"));
            }
            if let (Some(next), Some(last)) = (expected_next, leaf.keys().last())
                && let Some(first) = self.node(next).keys().first()
                && self.comparator().compare(last, first) != Ordering::Less
            {
                errors.push(format!("leaf {i}: keys overlap the next leaf"));
            }
        }

        if count != self.len() {
            errors.push(format!("len mismatch: tracked={}, counted={count}", self.len()));
        }
    }
}

fn finish(errors: Vec<String>) -> Result<(), String> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(format!("tree invariant violations:\n{}", errors.join("\n")))
    }
}
