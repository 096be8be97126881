//! Read-only snapshots of the tree's shape for renderers and debugging.
//!
//! Everything here copies keys out of the tree; nothing stays linked to the live structure,
//! so a snapshot does not follow later mutations.

use alloc::vec::Vec;

use serde::Serialize;

use crate::raw::{Handle, Node, NodeId, RawBPlusTree};

/// Shape of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Internal,
    Leaf,
}

/// One node of a [`TreeExport`], with its subtree nested under `children`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeExport<K> {
    pub id: NodeId,
    pub kind: NodeKind,
    pub keys: Vec<K>,
    /// Child count for internal nodes, key count for leaves.
    pub degree: usize,
    /// Left neighbour on the leaf chain (leaves only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_leaf: Option<NodeId>,
    /// Right neighbour on the leaf chain (leaves only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_leaf: Option<NodeId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeExport<K>>,
}

/// A hierarchy snapshot of a whole tree.
///
/// # Examples
///
/// ```
/// use belt_tree::{BPlusTree, NodeKind};
///
/// let mut tree = BPlusTree::new();
/// for k in [10, 20, 30, 40] {
///     tree.insert(k, ()).unwrap();
/// }
///
/// let export = tree.export();
/// let root = export.root.as_ref().unwrap();
/// assert_eq!(root.kind, NodeKind::Internal);
/// assert_eq!(root.keys, [20]);
/// assert_eq!(root.children[0].next_leaf, Some(root.children[1].id));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeExport<K> {
    pub min_degree: usize,
    pub height: usize,
    pub len: usize,
    pub node_count: usize,
    pub leaf_count: usize,
    pub root: Option<NodeExport<K>>,
}

impl<K: Clone, V, C> RawBPlusTree<K, V, C> {
    pub(crate) fn export(&self) -> TreeExport<K> {
        TreeExport {
            min_degree: self.config().min_degree,
            height: self.height(),
            len: self.len(),
            node_count: self.node_count(),
            leaf_count: self.leaf_count(),
            root: self.root().map(|root| self.export_node(root)),
        }
    }

    fn export_node(&self, handle: Handle) -> NodeExport<K> {
        let node = self.node(handle);
        let keys = node.keys().to_vec();
        match node {
            Node::Internal(internal) => NodeExport {
                id: node.id(),
                kind: NodeKind::Internal,
                keys,
                degree: internal.child_count(),
                prev_leaf: None,
                next_leaf: None,
                children: internal.children().iter().map(|&child| self.export_node(child)).collect(),
            },
            Node::Leaf(leaf) => NodeExport {
                id: node.id(),
                kind: NodeKind::Leaf,
                degree: keys.len(),
                keys,
                prev_leaf: leaf.prev().map(|prev| self.node(prev).id()),
                next_leaf: leaf.next().map(|next| self.node(next).id()),
                children: Vec::new(),
            },
        }
    }

    /// Keys of every node, grouped by level and ordered left to right within a level.
    pub(crate) fn level_order(&self) -> Vec<Vec<Vec<K>>> {
        let mut levels = Vec::new();
        let mut frontier: Vec<Handle> = self.root().into_iter().collect();
        while !frontier.is_empty() {
            let mut next = Vec::new();
            let mut level = Vec::with_capacity(frontier.len());
            for handle in frontier {
                let node = self.node(handle);
                level.push(node.keys().to_vec());
                if let Node::Internal(internal) = node {
                    next.extend_from_slice(internal.children());
                }
            }
            levels.push(level);
            frontier = next;
        }
        levels
    }

    /// Keys gathered by recursive descent, leftmost subtree first. Independent of the leaf
    /// chain, so the two can be compared.
    pub(crate) fn in_order(&self) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.len());
        if let Some(root) = self.root() {
            self.collect_in_order(root, &mut keys);
        }
        keys
    }

    fn collect_in_order(&self, handle: Handle, keys: &mut Vec<K>) {
        match self.node(handle) {
            Node::Internal(internal) => {
                for &child in internal.children() {
                    self.collect_in_order(child, keys);
                }
            }
            Node::Leaf(leaf) => keys.extend_from_slice(leaf.keys()),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::config::TreeConfig;
    use crate::order::NaturalOrder;
    use alloc::vec;
    use pretty_assertions::assert_eq;

    fn build(keys: &[i32]) -> RawBPlusTree<i32, (), NaturalOrder> {
        let mut tree = RawBPlusTree::new(TreeConfig::new(2), NaturalOrder);
        for &k in keys {
            tree.insert(k, ()).unwrap();
        }
        tree
    }

    #[test]
    fn empty_tree_exports_no_root() {
        let tree = build(&[]);
        let export = tree.export();
        assert_eq!(export.root, None);
        assert_eq!(export.height, 0);
        assert_eq!(export.leaf_count, 0);
        assert!(tree.level_order().is_empty());
        assert!(tree.in_order().is_empty());
    }

    #[test]
    fn export_threads_leaf_neighbours() {
        let tree = build(&[10, 20, 30, 40, 50, 60]);
        let export = tree.export();
        assert_eq!(export.len, 6);
        assert_eq!(export.node_count, tree.node_count());

        let root = export.root.unwrap();
        assert_eq!(root.degree, root.children.len());
        let leaves: Vec<&NodeExport<i32>> = root.children.iter().collect();
        assert_eq!(leaves.len(), export.leaf_count);
        assert_eq!(leaves[0].prev_leaf, None);
        for pair in leaves.windows(2) {
            assert_eq!(pair[0].next_leaf, Some(pair[1].id));
            assert_eq!(pair[1].prev_leaf, Some(pair[0].id));
        }
        assert_eq!(leaves.last().unwrap().next_leaf, None);
        assert!(leaves.iter().all(|leaf| leaf.kind == NodeKind::Leaf && leaf.degree == leaf.keys.len()));
    }

    #[test]
    fn level_order_groups_by_depth() {
        let tree = build(&[10, 20, 30, 40]);
        assert_eq!(tree.level_order(), [vec![vec![20]], vec![vec![10], vec![20, 30, 40]]]);
    }

    #[test]
    fn in_order_matches_insertion_set() {
        let tree = build(&[5, 3, 9, 1, 7, 2, 8, 6, 4]);
        assert_eq!(tree.in_order(), (1..=9).collect::<Vec<_>>());
    }

    #[test]
    fn export_serializes_without_empty_fields() {
        let tree = build(&[1, 2]);
        let json = serde_json::to_value(tree.export()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "min_degree": 2,
                "height": 1,
                "len": 2,
                "node_count": 1,
                "leaf_count": 1,
                "root": { "id": 1, "kind": "leaf", "keys": [1, 2], "degree": 2 }
            })
        );
    }
}
