//! Zygote cache tree
//!
//! Each node is a warm process image that has imported its own packages on
//! top of everything its ancestors imported. The tree is immutable once
//! built; all per-run mutation lives in [`WarmState`].

pub mod description;
pub mod model;
pub mod node;
pub mod warm;

pub use description::TreeDescription;
pub use model::Tree;
pub use node::{CacheNode, CostParams, NodeId};
pub use warm::WarmState;
