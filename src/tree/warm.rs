//! Per-run warm state
//!
//! Which nodes have a materialized process image, and how often each node
//! served as the chosen node. One `WarmState` belongs to one simulation
//! run; a fresh run starts from a fresh state, so a tree can be shared by
//! any number of independent runs.

use super::node::NodeId;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct WarmState {
    warmed: HashSet<NodeId>,
    hits: HashMap<NodeId, u64>,
}

impl WarmState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_warm(&self, node: NodeId) -> bool {
        self.warmed.contains(&node)
    }

    /// Warmth only ever goes from cold to warm within a run
    pub fn mark_warm(&mut self, node: NodeId) {
        self.warmed.insert(node);
    }

    pub fn warmed_count(&self) -> usize {
        self.warmed.len()
    }

    pub fn record_hit(&mut self, node: NodeId) {
        *self.hits.entry(node).or_insert(0) += 1;
    }

    pub fn hit_count(&self, node: NodeId) -> u64 {
        self.hits.get(&node).copied().unwrap_or(0)
    }

    pub fn total_hits(&self) -> u64 {
        self.hits.values().sum()
    }
}
