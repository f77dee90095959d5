//! Replaying a call trace against one or more trees

use super::workload::ResolvedWorkload;
use crate::cost::CostSource;
use crate::error::{ZygoteError, ZygoteResult};
use crate::eval::{Evaluator, LookupPolicy};
use crate::package::VersionedPackage;
use crate::tree::{CostParams, NodeId, Tree, WarmState};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Totals for one node that served at least one call
#[derive(Debug, Clone, Serialize)]
pub struct NodeReport {
    pub id: NodeId,
    pub depth: usize,
    pub packages: Vec<VersionedPackage>,
    pub hits: u64,
    /// Summed end-to-end cost of the calls this node served
    pub cost_ms: f64,
    pub memory_mb: f64,
}

/// Result of replaying a workload against one tree
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub tree: String,
    pub policy: LookupPolicy,
    pub invocations: usize,
    pub total_ms: f64,
    pub warmup_ms: f64,
    pub fork_ms: f64,
    pub import_ms: f64,
    pub nodes: Vec<NodeReport>,
    pub generated_at: DateTime<Utc>,
}

impl ReplayReport {
    pub fn mean_ms(&self) -> f64 {
        if self.invocations == 0 {
            0.0
        } else {
            self.total_ms / self.invocations as f64
        }
    }
}

/// A finished run: the report plus the warm state it left behind
#[derive(Debug, Clone)]
pub struct ReplayOutcome {
    pub report: ReplayReport,
    pub state: WarmState,
}

#[derive(Default)]
struct NodeTally {
    hits: u64,
    cost_ms: f64,
}

/// Replays workloads with fixed cost parameters and lookup policy
#[derive(Debug, Clone, Copy)]
pub struct Replayer {
    params: CostParams,
    policy: LookupPolicy,
}

impl Replayer {
    pub fn new(params: CostParams, policy: LookupPolicy) -> Self {
        Self { params, policy }
    }

    /// Replay every call in trace order against `tree`, starting cold
    pub fn run<C: CostSource>(
        &self,
        label: &str,
        tree: &Tree,
        costs: &C,
        workload: &ResolvedWorkload,
    ) -> ZygoteResult<ReplayOutcome> {
        let evaluator = Evaluator::new(tree, costs, self.params).with_policy(self.policy);
        let mut state = WarmState::new();
        let mut tallies: BTreeMap<NodeId, NodeTally> = BTreeMap::new();
        let (mut warmup_ms, mut fork_ms, mut import_ms) = (0.0, 0.0, 0.0);
        let mut invocations = 0;

        for (name, reqs) in workload.invocations() {
            let cost = evaluator.task_cost(reqs, &mut state)?;
            debug!("{}: call {} -> node {} ({:.3}ms)", label, name, cost.node, cost.total_ms());

            warmup_ms += cost.warmup_ms;
            fork_ms += cost.fork_ms;
            import_ms += cost.import_ms;
            invocations += 1;

            let tally = tallies.entry(cost.node).or_default();
            tally.hits += 1;
            tally.cost_ms += cost.total_ms();
        }

        let nodes = tallies
            .into_iter()
            .map(|(id, tally)| {
                let node = tree.node(id);
                Ok(NodeReport {
                    id,
                    depth: node.depth,
                    packages: node.packages.iter().cloned().collect(),
                    hits: tally.hits,
                    cost_ms: tally.cost_ms,
                    memory_mb: tree.memory_mb(id, costs)?,
                })
            })
            .collect::<ZygoteResult<Vec<_>>>()?;

        let report = ReplayReport {
            tree: label.to_string(),
            policy: self.policy,
            invocations,
            total_ms: warmup_ms + fork_ms + import_ms,
            warmup_ms,
            fork_ms,
            import_ms,
            nodes,
            generated_at: Utc::now(),
        };
        info!(
            "Replayed {} calls against {}: {:.3}ms total, {} nodes warmed",
            report.invocations,
            label,
            report.total_ms,
            state.warmed_count()
        );
        Ok(ReplayOutcome { report, state })
    }

    /// Replay the same workload against several trees, one blocking task per
    /// tree. Results come back in the order the trees were given, each with
    /// its own outcome: a tree that cannot serve the workload does not
    /// discard the others.
    pub async fn compare<C>(
        &self,
        trees: Vec<(String, Tree)>,
        costs: Arc<C>,
        workload: Arc<ResolvedWorkload>,
    ) -> ZygoteResult<Vec<(String, ZygoteResult<(Tree, ReplayOutcome)>)>>
    where
        C: CostSource + Send + Sync + 'static,
    {
        let handles: Vec<_> = trees
            .into_iter()
            .map(|(label, tree)| {
                let replayer = *self;
                let costs = Arc::clone(&costs);
                let workload = Arc::clone(&workload);
                let task_label = label.clone();
                let handle = tokio::task::spawn_blocking(
                    move || -> ZygoteResult<(Tree, ReplayOutcome)> {
                        let outcome = replayer.run(&task_label, &tree, &*costs, &workload)?;
                        Ok((tree, outcome))
                    },
                );
                (label, handle)
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (label, handle) in handles {
            let result = handle
                .await
                .map_err(|e| ZygoteError::Internal(format!("Replay task failed: {}", e)))?;
            if let Err(ref e) = result {
                warn!("Replay of {} failed: {}", label, e);
            }
            results.push((label, result));
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::{CostTable, PackageCost};
    use crate::manifest::ManifestParser;
    use crate::replay::Workload;
    use crate::tree::TreeDescription;

    fn pkg(s: &str) -> VersionedPackage {
        VersionedPackage::parse(s).unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    /// root{A} -> child{B}
    fn tree() -> Tree {
        Tree::from_description(&TreeDescription::node(
            vec![pkg("A==1")],
            vec![TreeDescription::node(vec![pkg("B==1")], vec![])],
        ))
    }

    fn costs() -> CostTable {
        [(pkg("A==1"), 10.0, 5.0), (pkg("B==1"), 20.0, 7.0)]
            .into_iter()
            .map(|(p, ms, mb)| (p, PackageCost::new(ms, mb)))
            .collect()
    }

    fn workload(calls: &[&str]) -> ResolvedWorkload {
        let calls: Vec<String> = calls
            .iter()
            .map(|c| format!(r#"{{"name": "{}"}}"#, c))
            .collect();
        let json = format!(
            r#"{{"functions": [
                {{"name": "ab", "packages": ["A==1", "B==1"]}},
                {{"name": "a", "packages": ["A==1"]}},
                {{"name": "c", "packages": ["C==1"]}}
            ], "calls": [{}]}}"#,
            calls.join(",")
        );
        serde_json::from_str::<Workload>(&json)
            .unwrap()
            .resolve(&ManifestParser::default(), None)
            .unwrap()
    }

    #[test]
    fn warmup_is_paid_once_per_run() {
        let outcome = Replayer::new(CostParams::default(), LookupPolicy::FirstMatch)
            .run("t", &tree(), &costs(), &workload(&["ab", "ab", "a"]))
            .unwrap();
        let report = &outcome.report;

        assert_eq!(report.invocations, 3);
        assert!(close(report.warmup_ms, 20.7));
        assert!(close(report.fork_ms, 2.1));
        assert!(close(report.import_ms, 0.0));
        assert!(close(report.total_ms, 22.8));

        assert_eq!(outcome.state.hit_count(NodeId(1)), 2);
        assert_eq!(outcome.state.hit_count(NodeId::ROOT), 1);

        let child = report.nodes.iter().find(|n| n.id == NodeId(1)).unwrap();
        assert_eq!(child.depth, 1);
        assert!(close(child.memory_mb, 12.0));
        assert!(close(child.cost_ms, 21.4 + 0.7));
    }

    #[test]
    fn runs_do_not_share_warm_state() {
        let replayer = Replayer::new(CostParams::default(), LookupPolicy::FirstMatch);
        let (tree, costs, workload) = (tree(), costs(), workload(&["ab"]));
        let first = replayer.run("t", &tree, &costs, &workload).unwrap();
        let second = replayer.run("t", &tree, &costs, &workload).unwrap();
        assert!(close(first.report.total_ms, second.report.total_ms));
    }

    #[test]
    fn unservable_call_aborts_the_run() {
        let err = Replayer::new(CostParams::default(), LookupPolicy::BestOfSubtree)
            .run("t", &tree(), &costs(), &workload(&["a", "c"]))
            .unwrap_err();
        assert!(matches!(err, ZygoteError::NoMatchingNode { .. }));
    }

    #[test]
    fn empty_trace_reports_zero() {
        let outcome = Replayer::new(CostParams::default(), LookupPolicy::FirstMatch)
            .run("t", &tree(), &costs(), &workload(&[]))
            .unwrap();
        assert_eq!(outcome.report.invocations, 0);
        assert_eq!(outcome.report.mean_ms(), 0.0);
        assert!(outcome.report.nodes.is_empty());
    }

    #[tokio::test]
    async fn compare_keeps_input_order() {
        let flat = Tree::from_description(&TreeDescription::node(vec![], vec![]));
        let trees = vec![("deep".to_string(), tree()), ("flat".to_string(), flat)];

        let results = Replayer::new(CostParams::default(), LookupPolicy::FirstMatch)
            .compare(trees, Arc::new(costs()), Arc::new(workload(&["ab", "a"])))
            .await
            .unwrap();

        let labels: Vec<&str> = results.iter().map(|(label, _)| label.as_str()).collect();
        assert_eq!(labels, vec!["deep", "flat"]);
        let (_, flat) = results[1].1.as_ref().unwrap();
        assert_eq!(flat.report.tree, "flat");
        // flat root imports everything on every call: 30 + 10 + two forks
        assert!(close(flat.report.total_ms, 41.4));
    }

    #[tokio::test]
    async fn compare_isolates_failing_tree() {
        let good = Tree::from_description(&TreeDescription::node(vec![], vec![]));
        let bad = Tree::from_description(&TreeDescription::node(vec![pkg("Z==1")], vec![]));
        let trees = vec![("good".to_string(), good), ("bad".to_string(), bad)];

        let results = Replayer::new(CostParams::default(), LookupPolicy::FirstMatch)
            .compare(trees, Arc::new(costs()), Arc::new(workload(&["a"])))
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        let (_, good) = results[0].1.as_ref().unwrap();
        assert_eq!(good.report.invocations, 1);
        assert!(close(good.report.total_ms, 10.7));

        assert_eq!(results[1].0, "bad");
        assert!(matches!(
            results[1].1,
            Err(ZygoteError::NoMatchingNode { .. })
        ));
    }
}
