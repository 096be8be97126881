mod arena;
mod handle;
mod node;
mod raw_tree;
mod validate;

pub(crate) use arena::Arena;
pub(crate) use handle::Handle;
pub use handle::NodeId;
pub(crate) use node::Node;
pub(crate) use raw_tree::RawBPlusTree;
