//! Tree configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TreeError};

/// Shape and capacity settings for a [`BPlusTree`](crate::BPlusTree).
///
/// With minimum degree `t`, every non-root node holds between `t - 1` and `2t - 1` keys and
/// every non-root internal node has between `t` and `2t` children.
///
/// # Examples
///
/// ```
/// use belt_tree::TreeConfig;
///
/// let config = TreeConfig::default().with_min_degree(4).with_max_nodes(1_000);
/// assert_eq!(config.max_keys(), 7);
/// assert_eq!(config.min_keys(), 3);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Minimum degree `t` (at least 2).
    pub min_degree: usize,
    /// Ceiling on the number of nodes the tree may hold, `None` for unbounded.
    pub max_nodes: Option<usize>,
}

impl TreeConfig {
    /// Node ceiling used by the interactive visualizer.
    pub const NODE_LIMIT_REFERENCE: usize = 150;

    /// Smallest legal minimum degree.
    pub const MIN_DEGREE: usize = 2;

    /// Creates an unbounded configuration with minimum degree `min_degree`.
    #[must_use]
    pub const fn new(min_degree: usize) -> Self {
        Self {
            min_degree,
            max_nodes: None,
        }
    }

    /// Configuration used by the visualizer: `t = 2` and at most 150 nodes.
    #[must_use]
    pub const fn visualizer() -> Self {
        Self {
            min_degree: Self::MIN_DEGREE,
            max_nodes: Some(Self::NODE_LIMIT_REFERENCE),
        }
    }

    #[must_use]
    pub const fn with_min_degree(mut self, min_degree: usize) -> Self {
        self.min_degree = min_degree;
        self
    }

    #[must_use]
    pub const fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = Some(max_nodes);
        self
    }

    /// Removes the node ceiling.
    #[must_use]
    pub const fn unbounded(mut self) -> Self {
        self.max_nodes = None;
        self
    }

    /// Maximum keys per node, `2t - 1`.
    #[must_use]
    pub const fn max_keys(&self) -> usize {
        2 * self.min_degree - 1
    }

    /// Minimum keys per non-root node, `t - 1`.
    #[must_use]
    pub const fn min_keys(&self) -> usize {
        self.min_degree - 1
    }

    /// Checks that the configuration describes a usable tree.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::InvalidMinDegree`] if `min_degree < 2` or `2t` overflows, and
    /// [`TreeError::InvalidNodeLimit`] if `max_nodes` is `Some(0)`.
    pub const fn validate(&self) -> Result<()> {
        if self.min_degree < Self::MIN_DEGREE || self.min_degree.checked_mul(2).is_none() {
            return Err(TreeError::InvalidMinDegree(self.min_degree));
        }
        if let Some(0) = self.max_nodes {
            return Err(TreeError::InvalidNodeLimit);
        }
        Ok(())
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self::new(Self::MIN_DEGREE)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn default_is_unbounded_degree_two() {
        let config = TreeConfig::default();
        assert_eq!(config.min_degree, 2);
        assert_eq!(config.max_nodes, None);
        assert_eq!(config.max_keys(), 3);
        assert_eq!(config.min_keys(), 1);
    }

    #[test]
    fn visualizer_preset_caps_nodes() {
        let config = TreeConfig::visualizer();
        assert_eq!(config.max_nodes, Some(150));
        assert_eq!(config.unbounded().max_nodes, None);
    }

    #[test]
    fn validate_rejects_bad_settings() {
        assert_eq!(TreeConfig::new(1).validate(), Err(TreeError::InvalidMinDegree(1)));
        assert_eq!(TreeConfig::new(0).validate(), Err(TreeError::InvalidMinDegree(0)));
        assert_eq!(TreeConfig::new(3).with_max_nodes(0).validate(), Err(TreeError::InvalidNodeLimit));
        assert_eq!(TreeConfig::new(3).with_max_nodes(1).validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_degree_that_overflows() {
        assert_eq!(TreeConfig::new(usize::MAX).validate(), Err(TreeError::InvalidMinDegree(usize::MAX)));
        let largest = usize::MAX / 2;
        assert_eq!(TreeConfig::new(largest).validate(), Ok(()));
        assert_eq!(TreeConfig::new(largest).max_keys(), usize::MAX - 2);
    }

    #[test]
    fn unbounded_node_limit_is_usable() {
        let config = TreeConfig::new(2).with_max_nodes(usize::MAX);
        let mut tree: crate::BPlusTree<i32> = crate::BPlusTree::with_config(config).unwrap();
        for k in 0..50 {
            tree.insert_key(k).unwrap();
        }
        assert_eq!(tree.len(), 50);
        assert!(tree.check_invariants().is_ok());
    }

    #[test]
    fn deserializes_with_missing_fields() {
        let config: TreeConfig = serde_json::from_str(r#"{"min_degree": 5}"#).unwrap();
        assert_eq!(config, TreeConfig::new(5));

        let config: TreeConfig = serde_json::from_str(r#"{"max_nodes": 150}"#).unwrap();
        assert_eq!(config, TreeConfig::visualizer());
    }
}
