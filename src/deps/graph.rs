//! Package dependency graph and transitive closures
//!
//! Edges point from a dependent to the package it requires. Closures are
//! computed by breadth-first traversal along those edges.

use crate::manifest::ParsedManifest;
use crate::package::VersionedPackage;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

/// Directed "requires" relation over versioned packages
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<VersionedPackage, ()>,
    index: HashMap<VersionedPackage, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph for one parsed manifest
    pub fn from_manifest(manifest: &ParsedManifest) -> Self {
        let mut graph = Self::new();
        graph.extend_from_manifest(manifest);
        graph
    }

    /// Add every pinned package and every package-to-package requester edge
    pub fn extend_from_manifest(&mut self, manifest: &ParsedManifest) {
        for pin in manifest.pinned.values() {
            self.add_package(pin.versioned());
        }
        for (dependency, dependent) in manifest.edges() {
            self.add_requirement(dependent.clone(), dependency.clone());
        }
    }

    /// Insert a package node, returning the existing one if already present
    pub fn add_package(&mut self, pkg: VersionedPackage) -> NodeIndex {
        if let Some(&idx) = self.index.get(&pkg) {
            return idx;
        }
        let idx = self.graph.add_node(pkg.clone());
        self.index.insert(pkg, idx);
        idx
    }

    /// Record that `dependent` requires `dependency`
    pub fn add_requirement(&mut self, dependent: VersionedPackage, dependency: VersionedPackage) {
        let from = self.add_package(dependent);
        let to = self.add_package(dependency);
        self.graph.update_edge(from, to, ());
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains(&self, pkg: &VersionedPackage) -> bool {
        self.index.contains_key(pkg)
    }

    /// All packages, sorted
    pub fn packages(&self) -> Vec<&VersionedPackage> {
        let mut pkgs: Vec<_> = self.graph.node_weights().collect();
        pkgs.sort();
        pkgs
    }

    /// Whether `dependent` directly requires `dependency`
    pub fn requires(&self, dependent: &VersionedPackage, dependency: &VersionedPackage) -> bool {
        match (self.index.get(dependent), self.index.get(dependency)) {
            (Some(&from), Some(&to)) => self.graph.contains_edge(from, to),
            _ => false,
        }
    }

    /// Packages `pkg` requires directly
    pub fn direct_dependencies(&self, pkg: &VersionedPackage) -> BTreeSet<VersionedPackage> {
        let Some(&idx) = self.index.get(pkg) else {
            return BTreeSet::new();
        };
        self.graph
            .neighbors_directed(idx, Direction::Outgoing)
            .map(|n| self.graph[n].clone())
            .collect()
    }

    /// Everything reachable from `pkg` along "requires" edges.
    ///
    /// `pkg` itself is only included when a cycle leads back to it.
    pub fn closure(&self, pkg: &VersionedPackage) -> BTreeSet<VersionedPackage> {
        let mut reached = BTreeSet::new();
        let Some(&start) = self.index.get(pkg) else {
            return reached;
        };

        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            for next in self.graph.neighbors_directed(current, Direction::Outgoing) {
                reached.insert(self.graph[next].clone());
                if !visited.contains(&next) {
                    queue.push_back(next);
                }
            }
        }
        reached
    }

    /// Closure of every package in the graph
    pub fn closures(&self) -> BTreeMap<VersionedPackage, BTreeSet<VersionedPackage>> {
        self.graph
            .node_weights()
            .map(|pkg| (pkg.clone(), self.closure(pkg)))
            .collect()
    }

    /// Square adjacency relation over all packages in sorted order, where
    /// `matrix[dependency][dependent]` is set when `dependent` requires `dependency`
    pub fn adjacency(&self) -> (Vec<VersionedPackage>, Vec<Vec<bool>>) {
        let labels: Vec<VersionedPackage> = self.packages().into_iter().cloned().collect();
        let position: HashMap<&VersionedPackage, usize> =
            labels.iter().enumerate().map(|(i, p)| (p, i)).collect();

        let mut matrix = vec![vec![false; labels.len()]; labels.len()];
        for edge in self.graph.raw_edges() {
            let dependent = &self.graph[edge.source()];
            let dependency = &self.graph[edge.target()];
            matrix[position[dependency]][position[dependent]] = true;
        }
        (labels, matrix)
    }
}
