//! Serialized tree description
//!
//! The on-disk form of a cache tree is a nested record:
//!
//! ```json
//! {"packages": ["numpy==1.25.2"], "children": [ ... ]}
//! ```
//!
//! Written back out after a run it also carries each node's `hit_count`.

use crate::package::VersionedPackage;
use serde::{Deserialize, Serialize};

/// One node of a serialized cache tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeDescription {
    /// Packages this node imports on top of its parent
    #[serde(default)]
    pub packages: Vec<VersionedPackage>,

    /// Label assigned by the tree generator (kept for traceability)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_generation: Option<u64>,

    /// How many invocations this node served in the run that wrote it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hit_count: Option<u64>,

    #[serde(default)]
    pub children: Vec<TreeDescription>,
}

impl TreeDescription {
    /// A node importing `packages` with the given children
    pub fn node(packages: Vec<VersionedPackage>, children: Vec<TreeDescription>) -> Self {
        Self {
            packages,
            split_generation: None,
            hit_count: None,
            children,
        }
    }

    /// Number of nodes in this subtree
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Self::count).sum::<usize>()
    }
}
