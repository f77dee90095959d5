//! The cache tree
//!
//! Nodes live in an arena owned by the [`Tree`]; a node's children are
//! owned through its index list and the parent link is a plain index.

use super::description::TreeDescription;
use super::node::{CacheNode, CostParams, NodeId};
use super::warm::WarmState;
use crate::cost::CostSource;
use crate::error::{ZygoteError, ZygoteResult};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<CacheNode>,
}

impl Tree {
    /// Build a tree from its serialized description.
    ///
    /// Each node's inherited packages are computed here, once.
    pub fn from_description(desc: &TreeDescription) -> Self {
        let mut tree = Self {
            nodes: Vec::with_capacity(desc.count()),
        };
        tree.construct(desc, None);
        tree
    }

    fn construct(&mut self, desc: &TreeDescription, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        let (indirect_packages, depth) = match parent {
            Some(p) => {
                let parent = &self.nodes[p.0];
                (parent.image(), parent.depth + 1)
            }
            None => (BTreeSet::new(), 0),
        };

        self.nodes.push(CacheNode {
            id,
            parent,
            packages: desc.packages.iter().cloned().collect(),
            indirect_packages,
            children: Vec::with_capacity(desc.children.len()),
            depth,
            split_generation: desc.split_generation,
        });

        for child in &desc.children {
            let child_id = self.construct(child, Some(id));
            self.nodes[id.0].children.push(child_id);
        }
        id
    }

    /// Load and build a tree from a JSON file
    pub async fn load(path: &Path) -> ZygoteResult<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| ZygoteError::io(format!("reading tree {}", path.display()), e))?;
        let desc = parse_description(&content).map_err(|e| ZygoteError::InvalidTree {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let tree = Self::from_description(&desc);
        debug!("Loaded tree with {} nodes from {}", tree.len(), path.display());
        Ok(tree)
    }

    /// Write the tree back out, including hit counts from `state` if given
    pub async fn save(&self, path: &Path, state: Option<&WarmState>) -> ZygoteResult<()> {
        let content = serde_json::to_string_pretty(&self.to_description(state))?;
        fs::write(path, content)
            .await
            .map_err(|e| ZygoteError::io(format!("writing tree {}", path.display()), e))?;
        info!("Tree saved to {}", path.display());
        Ok(())
    }

    /// Serialize back into the nested description
    pub fn to_description(&self, state: Option<&WarmState>) -> TreeDescription {
        self.describe(NodeId::ROOT, state)
    }

    fn describe(&self, id: NodeId, state: Option<&WarmState>) -> TreeDescription {
        let node = self.node(id);
        TreeDescription {
            packages: node.packages.iter().cloned().collect(),
            split_generation: node.split_generation,
            hit_count: state.map(|s| s.hit_count(id)),
            children: node
                .children
                .iter()
                .map(|&child| self.describe(child, state))
                .collect(),
        }
    }

    pub fn root(&self) -> &CacheNode {
        &self.nodes[NodeId::ROOT.0]
    }

    /// Look up a node by id. Ids come from this tree, so they are always in range.
    pub fn node(&self, id: NodeId) -> &CacheNode {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&CacheNode> {
        self.nodes.get(id.0)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &CacheNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ancestors of `id`, nearest first
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.node(id).parent, move |&p| self.node(p).parent)
    }

    /// Cost of bringing `id`'s process image up, or zero if it is already warm.
    ///
    /// Warms the parent first, then forks it and imports this node's
    /// packages on top. Every node warmed on the way is marked in `state`.
    pub fn warmup_cost<C: CostSource>(
        &self,
        id: NodeId,
        state: &mut WarmState,
        costs: &C,
        params: &CostParams,
    ) -> ZygoteResult<f64> {
        if state.is_warm(id) {
            return Ok(0.0);
        }

        // cold nodes from `id` up to the first warm ancestor
        let mut cold = vec![id];
        while let Some(parent) = self.node(cold[cold.len() - 1]).parent {
            if state.is_warm(parent) {
                break;
            }
            cold.push(parent);
        }

        // price the whole chain before marking anything warm
        let mut total = 0.0;
        for &nid in cold.iter().rev() {
            let node = self.node(nid);
            total += match node.parent {
                None => params.cold_start_ms,
                Some(parent_id) => {
                    let parent = self.node(parent_id);
                    parent.fork_cost(params) + parent.bootstrap_cost(&node.packages, costs)?
                }
            };
        }

        for nid in cold {
            state.mark_warm(nid);
        }
        debug!("Warmed node {} for {:.3}ms", id, total);
        Ok(total)
    }

    /// Memory footprint of `id`'s process image
    pub fn memory_mb<C: CostSource>(&self, id: NodeId, costs: &C) -> ZygoteResult<f64> {
        costs.memory_mb_sum(self.node(id).image().iter())
    }
}

/// Parse a serialized tree without a nesting limit; chains can be arbitrarily deep
fn parse_description(content: &str) -> serde_json::Result<TreeDescription> {
    let mut de = serde_json::Deserializer::from_str(content);
    de.disable_recursion_limit();
    let desc = TreeDescription::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(desc)
}
