//! Dependency closures
//!
//! Builds the "requires" graph from parsed manifests, computes transitive
//! dependency sets, and accumulates them into a persisted frequency map.

pub mod graph;
pub mod map;

pub use graph::DependencyGraph;
pub use map::{deps_key, DependencyMap};
