//! Tree cost evaluation
//!
//! Picks the node that serves a requirement set under a [`LookupPolicy`]
//! and prices the full life cycle of the invocation.

pub mod policy;
pub mod task;

pub use policy::{LookupPolicy, NodeMatch};
pub use task::{Evaluator, TaskCost};
