//! An arena-backed B+ tree with a linked leaf chain.
//!
//! [`BPlusTree`] keeps every key and value in its leaves and routes searches through
//! separator copies held by internal nodes. Leaves are chained in key order, so
//! [`range`](BPlusTree::range) and [`scan_from`](BPlusTree::scan_from) descend once and then
//! walk the chain.
//!
//! # Example
//!
//! ```
//! use belt_tree::{BPlusTree, TreeConfig, TreeError};
//!
//! let mut tree = BPlusTree::with_config(TreeConfig::new(3)).unwrap();
//! for k in 1..=20 {
//!     tree.insert(k, k * k).unwrap();
//! }
//!
//! assert_eq!(tree.get(&7), Some(&49));
//! assert_eq!(tree.range(&18, &15), [15, 16, 17, 18]);
//! assert_eq!(tree.delete(&7), Ok(49));
//! assert_eq!(tree.delete(&7), Err(TreeError::NotFound));
//! assert!(tree.check_invariants().is_ok());
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`
//! - **Single pass** - Inserts split and deletes rebalance on the way down, never on the way back up
//! - **All-or-nothing** - A failed insert or delete leaves the tree untouched
//! - **Bounded mode** - [`TreeConfig::max_nodes`] caps the node count for visualizers
//! - **`tracing`** - Optional structural event logging
//!
//! # Implementation
//!
//! Nodes live in an arena and refer to each other by index, including the parent and
//! sibling links, so every split, merge and borrow happens in place.

#![no_std]
// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod tracing_helpers;

mod bplus_tree;
mod config;
mod error;
mod export;
mod iter;
mod order;
mod raw;

pub use bplus_tree::BPlusTree;
pub use config::TreeConfig;
pub use error::{InvariantViolation, Result, TreeError};
pub use export::{NodeExport, NodeKind, TreeExport};
pub use iter::{Iter, Keys, Range, Values};
pub use order::{Comparator, NaturalOrder};
pub use raw::NodeId;
