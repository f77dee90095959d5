//! End-to-end invocation cost
//!
//! Serving one invocation means: make sure the chosen node is warm, fork a
//! leaf off it, and import whatever the invocation still needs.

use super::policy::{LookupPolicy, NodeMatch};
use crate::cost::CostSource;
use crate::error::{ZygoteError, ZygoteResult};
use crate::package::{display_set, RequirementSet};
use crate::tree::{CostParams, NodeId, Tree, WarmState};
use serde::Serialize;
use tracing::debug;

const COST_TOLERANCE: f64 = 1e-9;

/// Cost breakdown of one served invocation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TaskCost {
    /// Node that served the invocation
    pub node: NodeId,
    /// Pending warm-up of the node and its ancestors (zero once warm)
    pub warmup_ms: f64,
    /// Forking the leaf off the warm node
    pub fork_ms: f64,
    /// Importing what the node does not already provide
    pub import_ms: f64,
}

impl TaskCost {
    pub fn total_ms(&self) -> f64 {
        self.warmup_ms + self.fork_ms + self.import_ms
    }
}

/// Prices invocations against one tree
pub struct Evaluator<'a, C: CostSource> {
    tree: &'a Tree,
    costs: &'a C,
    params: CostParams,
    policy: LookupPolicy,
}

impl<'a, C: CostSource> Evaluator<'a, C> {
    pub fn new(tree: &'a Tree, costs: &'a C, params: CostParams) -> Self {
        Self {
            tree,
            costs,
            params,
            policy: LookupPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: LookupPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> LookupPolicy {
        self.policy
    }

    /// Choose the serving node without touching any run state
    pub fn lookup(&self, reqs: &RequirementSet) -> ZygoteResult<Option<NodeMatch>> {
        self.policy.lookup(self.tree, reqs, self.costs)
    }

    /// Price one invocation, warming nodes and counting the hit in `state`
    pub fn task_cost(
        &self,
        reqs: &RequirementSet,
        state: &mut WarmState,
    ) -> ZygoteResult<TaskCost> {
        let found = self
            .lookup(reqs)?
            .ok_or_else(|| ZygoteError::NoMatchingNode {
                requirements: display_set(reqs),
            })?;

        let node = self.tree.node(found.node);
        let warmup_ms = self
            .tree
            .warmup_cost(found.node, state, self.costs, &self.params)?;

        let mut remaining = reqs.clone();
        let import_ms = node.import_cost(&mut remaining, self.costs)?;
        if (import_ms - found.import_ms).abs() > COST_TOLERANCE {
            return Err(ZygoteError::CostMismatch {
                node: found.node.0,
                lookup_ms: found.import_ms,
                serve_ms: import_ms,
            });
        }

        state.record_hit(found.node);
        let cost = TaskCost {
            node: found.node,
            warmup_ms,
            fork_ms: node.fork_cost(&self.params),
            import_ms,
        };
        debug!(
            "Served by node {}: warmup {:.3}ms, import {:.3}ms ({} packages left)",
            cost.node,
            cost.warmup_ms,
            cost.import_ms,
            remaining.len()
        );
        Ok(cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::{CostTable, PackageCost};
    use crate::package::{requirement_set, VersionedPackage};
    use crate::tree::TreeDescription;

    fn pkg(s: &str) -> VersionedPackage {
        VersionedPackage::parse(s).unwrap()
    }

    /// root{A} -> child{B}; A = 10ms, B = 20ms
    fn two_level() -> (Tree, CostTable) {
        let tree = Tree::from_description(&TreeDescription::node(
            vec![pkg("A==1")],
            vec![TreeDescription::node(vec![pkg("B==1")], vec![])],
        ));
        let costs = [(pkg("A==1"), 10.0), (pkg("B==1"), 20.0)]
            .into_iter()
            .map(|(p, ms)| (p, PackageCost::new(ms, 0.0)))
            .collect();
        (tree, costs)
    }

    #[test]
    fn descends_to_child_and_pays_warmup() {
        let (tree, costs) = two_level();
        let params = CostParams::default();
        let eval = Evaluator::new(&tree, &costs, params);
        let mut state = WarmState::new();

        let reqs = requirement_set(["A==1", "B==1"]).unwrap();
        let cost = eval.task_cost(&reqs, &mut state).unwrap();

        assert_eq!(cost.node, NodeId(1));
        assert_eq!(cost.import_ms, 0.0);
        assert!((cost.warmup_ms - (params.fork_ms + 20.0)).abs() < 1e-9);
        assert_eq!(cost.fork_ms, params.fork_ms);
        // warming the child is fork + 20ms; serving the call forks a leaf
        // off the child on top of that, so the total carries a second fork
        assert!((cost.total_ms() - (2.0 * params.fork_ms + 20.0)).abs() < 1e-9);
    }

    #[test]
    fn root_serves_when_child_ineligible() {
        let (tree, costs) = two_level();
        let eval = Evaluator::new(&tree, &costs, CostParams::default());
        let mut state = WarmState::new();

        let cost = eval
            .task_cost(&requirement_set(["A==1"]).unwrap(), &mut state)
            .unwrap();
        assert_eq!(cost.node, NodeId::ROOT);
        assert_eq!(cost.import_ms, 0.0);
        assert_eq!(cost.warmup_ms, 0.0);
    }

    #[test]
    fn unknown_package_has_no_matching_node() {
        let (tree, costs) = two_level();
        for policy in [LookupPolicy::FirstMatch, LookupPolicy::BestOfSubtree] {
            let eval = Evaluator::new(&tree, &costs, CostParams::default()).with_policy(policy);
            let mut state = WarmState::new();
            let err = eval
                .task_cost(&requirement_set(["C==1"]).unwrap(), &mut state)
                .unwrap_err();
            assert!(matches!(err, ZygoteError::NoMatchingNode { .. }));
            assert_eq!(state.total_hits(), 0);
        }
    }

    #[test]
    fn second_call_skips_warmup() {
        let (tree, costs) = two_level();
        let eval = Evaluator::new(&tree, &costs, CostParams::default());
        let mut state = WarmState::new();
        let reqs = requirement_set(["A==1", "B==1"]).unwrap();

        let first = eval.task_cost(&reqs, &mut state).unwrap();
        let second = eval.task_cost(&reqs, &mut state).unwrap();
        assert!(first.warmup_ms > 0.0);
        assert_eq!(second.warmup_ms, 0.0);
        assert_eq!(state.hit_count(NodeId(1)), 2);
        assert!(state.is_warm(NodeId::ROOT));
    }

    #[test]
    fn cost_table_miss_is_fatal() {
        let (tree, costs) = two_level();
        let eval = Evaluator::new(&tree, &costs, CostParams::default());
        let mut state = WarmState::new();
        let reqs = requirement_set(["A==1", "Z==1"]).unwrap();

        let err = eval.task_cost(&reqs, &mut state).unwrap_err();
        assert!(matches!(err, ZygoteError::CostTableMiss(_)));
    }
}
