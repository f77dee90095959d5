//! Cache nodes and their cost primitives

use crate::cost::CostSource;
use crate::error::ZygoteResult;
use crate::package::{RequirementSet, VersionedPackage};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Index of a node inside its tree; nodes are numbered in pre-order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Fixed costs that do not depend on package contents
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostParams {
    /// Cost of forking a warm process image
    pub fork_ms: f64,
    /// Cost of starting the root process from nothing
    pub cold_start_ms: f64,
}

impl Default for CostParams {
    fn default() -> Self {
        Self {
            fork_ms: 0.7,
            cold_start_ms: 0.0,
        }
    }
}

/// A pre-warmed execution environment in the cache tree
#[derive(Debug, Clone)]
pub struct CacheNode {
    pub id: NodeId,

    /// Non-owning back reference, used only for cost roll-up
    pub parent: Option<NodeId>,

    /// Packages this node imports on top of its parent
    pub packages: BTreeSet<VersionedPackage>,

    /// Union of every ancestor's packages, fixed at construction
    pub indirect_packages: BTreeSet<VersionedPackage>,

    pub children: Vec<NodeId>,

    pub depth: usize,

    pub split_generation: Option<u64>,
}

impl CacheNode {
    /// Whether `pkg` is importable in this node's image
    pub fn covers(&self, pkg: &VersionedPackage) -> bool {
        self.packages.contains(pkg) || self.indirect_packages.contains(pkg)
    }

    /// Own plus inherited packages
    pub fn image(&self) -> BTreeSet<VersionedPackage> {
        self.packages
            .union(&self.indirect_packages)
            .cloned()
            .collect()
    }

    /// A node may only serve requests that need everything it imports
    pub fn is_eligible(&self, reqs: &RequirementSet) -> bool {
        self.packages.is_subset(reqs)
    }

    /// Remove everything this node already covers from `reqs`, then price
    /// importing what is left.
    pub fn import_cost<C: CostSource>(
        &self,
        reqs: &mut RequirementSet,
        costs: &C,
    ) -> ZygoteResult<f64> {
        reqs.retain(|pkg| !self.covers(pkg));
        costs.import_ms_sum(reqs.iter())
    }

    /// Price importing `target` on top of this node without touching the caller's set
    pub fn bootstrap_cost<C: CostSource>(
        &self,
        target: &BTreeSet<VersionedPackage>,
        costs: &C,
    ) -> ZygoteResult<f64> {
        let mut working = target.clone();
        self.import_cost(&mut working, costs)
    }

    /// Duplicating a warm image costs the same regardless of its contents
    pub fn fork_cost(&self, params: &CostParams) -> f64 {
        params.fork_ms
    }
}
