//! Lookup policies
//!
//! Both policies share one eligibility rule: a node can serve a request
//! only if the request needs every package the node imports. An ineligible
//! node rules out its whole subtree.

use crate::cost::CostSource;
use crate::error::ZygoteResult;
use crate::package::RequirementSet;
use crate::tree::{NodeId, Tree};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the evaluator picks the node that serves a request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum LookupPolicy {
    /// Descend into the first eligible child at every level and stop at the
    /// deepest node on that path, even if a sibling subtree would be cheaper
    #[default]
    FirstMatch,

    /// Visit every eligible node and keep the cheapest one
    BestOfSubtree,
}

impl fmt::Display for LookupPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstMatch => f.write_str("first-match"),
            Self::BestOfSubtree => f.write_str("best-of-subtree"),
        }
    }
}

/// The node chosen to serve a request and what importing the rest costs there
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NodeMatch {
    pub node: NodeId,
    pub import_ms: f64,
}

impl LookupPolicy {
    /// Find the node that serves `reqs`, or `None` if no node is eligible
    pub fn lookup<C: CostSource>(
        &self,
        tree: &Tree,
        reqs: &RequirementSet,
        costs: &C,
    ) -> ZygoteResult<Option<NodeMatch>> {
        if tree.is_empty() {
            return Ok(None);
        }
        match self {
            Self::FirstMatch => first_match(tree, NodeId::ROOT, reqs, costs),
            Self::BestOfSubtree => best_of_subtree(tree, NodeId::ROOT, reqs, costs),
        }
    }
}

fn serve_here<C: CostSource>(
    tree: &Tree,
    id: NodeId,
    reqs: &RequirementSet,
    costs: &C,
) -> ZygoteResult<NodeMatch> {
    let mut working = reqs.clone();
    let import_ms = tree.node(id).import_cost(&mut working, costs)?;
    Ok(NodeMatch {
        node: id,
        import_ms,
    })
}

fn first_match<C: CostSource>(
    tree: &Tree,
    id: NodeId,
    reqs: &RequirementSet,
    costs: &C,
) -> ZygoteResult<Option<NodeMatch>> {
    let node = tree.node(id);
    if !node.is_eligible(reqs) {
        return Ok(None);
    }

    for &child in &node.children {
        if let Some(found) = first_match(tree, child, reqs, costs)? {
            return Ok(Some(found));
        }
    }

    serve_here(tree, id, reqs, costs).map(Some)
}

fn best_of_subtree<C: CostSource>(
    tree: &Tree,
    id: NodeId,
    reqs: &RequirementSet,
    costs: &C,
) -> ZygoteResult<Option<NodeMatch>> {
    let node = tree.node(id);
    if !node.is_eligible(reqs) {
        return Ok(None);
    }

    let mut best = serve_here(tree, id, reqs, costs)?;
    for &child in &node.children {
        if let Some(candidate) = best_of_subtree(tree, child, reqs, costs)? {
            // strict: on a tie the shallower, earlier node wins
            if candidate.import_ms < best.import_ms {
                best = candidate;
            }
        }
    }
    Ok(Some(best))
}
