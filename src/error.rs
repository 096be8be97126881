//! Error types for the B+ tree engine.

use thiserror::Error;

/// Result type alias using [`TreeError`].
pub type Result<T, E = TreeError> = core::result::Result<T, E>;

/// Errors returned by [`BPlusTree`](crate::BPlusTree) operations.
///
/// Every variant except [`TreeError::Invariant`] is raised before the tree is touched, so a
/// failed call leaves the tree exactly as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The key is already stored in the tree.
    #[error("key is already present in the tree")]
    DuplicateKey,

    /// The key is not stored in the tree.
    #[error("key is not present in the tree")]
    NotFound,

    /// The configured node ceiling would be exceeded by the operation.
    #[error("node limit of {limit} would be exceeded: the operation needs {required} nodes")]
    OutOfCapacity { limit: usize, required: usize },

    /// The minimum degree must be at least 2.
    #[error("minimum degree must be at least 2, got {0}")]
    InvalidMinDegree(usize),

    /// A node limit of zero can never hold a key.
    #[error("node limit must be greater than zero")]
    InvalidNodeLimit,

    /// A node primitive was called on a shape it does not accept.
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

/// Shape precondition broken by a node-level primitive.
///
/// These are programming errors in the tree's own orchestration, never the result of
/// caller input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("cannot split a node that is not full ({len} keys, {max} allowed)")]
    SplitNotFull { len: usize, max: usize },

    #[error("split position {mid} is out of range for a node with {len} keys")]
    SplitOutOfRange { mid: usize, len: usize },

    #[error("cannot merge a leaf with an internal node")]
    MergeKindMismatch,

    #[error("merged node would hold {len} keys, {max} allowed")]
    MergeOverflow { len: usize, max: usize },

    #[error("cannot redistribute across a leaf/internal boundary")]
    RedistributeKindMismatch,

    #[error("sibling has no key to lend")]
    EmptySibling,

    #[error("key is already present in the leaf")]
    DuplicateInLeaf,

    #[error("expected a {expected} node")]
    UnexpectedKind { expected: &'static str },
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn invariant_converts_into_tree_error() {
        let err: TreeError = InvariantViolation::EmptySibling.into();
        assert_eq!(err, TreeError::Invariant(InvariantViolation::EmptySibling));
        assert_eq!(err.to_string(), "sibling has no key to lend");
    }

    #[test]
    fn capacity_message_names_both_numbers() {
        let err = TreeError::OutOfCapacity {
            limit: 150,
            required: 152,
        };
        assert_eq!(err.to_string(), "node limit of 150 would be exceeded: the operation needs 152 nodes");
    }
}
