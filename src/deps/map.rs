//! Persisted dependency map
//!
//! Records, for each `name → version`, every distinct transitive dependency
//! set observed across a workload together with how often it was seen.
//! Dependency sets are keyed by their sorted, comma-joined `name==version`
//! strings.

use super::graph::DependencyGraph;
use crate::error::{ZygoteError, ZygoteResult};
use crate::manifest::ParsedManifest;
use crate::package::{RequirementSet, VersionedPackage};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

/// `name → version → deps_key → occurrences`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyMap {
    entries: BTreeMap<String, BTreeMap<String, BTreeMap<String, u64>>>,
}

/// Join a dependency set into its map key
pub fn deps_key<'a, I>(deps: I) -> String
where
    I: IntoIterator<Item = &'a VersionedPackage>,
{
    let mut keys: Vec<String> = deps.into_iter().map(VersionedPackage::key).collect();
    keys.sort();
    keys.join(",")
}

fn parse_deps_key(key: &str) -> ZygoteResult<BTreeSet<VersionedPackage>> {
    key.split(',')
        .filter(|s| !s.is_empty())
        .map(VersionedPackage::parse)
        .collect()
}

impl DependencyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn from a batch of manifests, one closure table per manifest
    pub fn learn<'a, I>(manifests: I) -> Self
    where
        I: IntoIterator<Item = &'a ParsedManifest>,
    {
        let mut map = Self::new();
        let mut count = 0usize;
        for manifest in manifests {
            map.observe(&DependencyGraph::from_manifest(manifest));
            count += 1;
        }
        debug!("Learned dependency map from {} manifests", count);
        map
    }

    /// Record the closure of every package in `graph` once
    pub fn observe(&mut self, graph: &DependencyGraph) {
        for (pkg, closure) in graph.closures() {
            self.record(&pkg, &closure);
        }
    }

    /// Count one observation of `deps` as the dependency set of `pkg`
    pub fn record(&mut self, pkg: &VersionedPackage, deps: &BTreeSet<VersionedPackage>) {
        *self
            .entries
            .entry(pkg.name.clone())
            .or_default()
            .entry(pkg.version.clone())
            .or_default()
            .entry(deps_key(deps))
            .or_insert(0) += 1;
    }

    /// All observed dependency sets of `pkg` with their counts
    pub fn observations(&self, pkg: &VersionedPackage) -> Option<&BTreeMap<String, u64>> {
        self.entries.get(&pkg.name)?.get(&pkg.version)
    }

    /// The dependency set seen most often for `pkg`; ties go to the smallest key
    pub fn most_frequent(
        &self,
        pkg: &VersionedPackage,
    ) -> ZygoteResult<Option<BTreeSet<VersionedPackage>>> {
        let Some(observed) = self.observations(pkg) else {
            return Ok(None);
        };
        // BTreeMap iterates keys ascending, so max_by keeps the last max; reverse to keep the first
        let best = observed
            .iter()
            .rev()
            .max_by_key(|(_, count)| **count)
            .map(|(key, _)| key.as_str());
        best.map(parse_deps_key).transpose()
    }

    /// Expand a set of packages with the most frequent dependencies of each
    pub fn expand(&self, packages: &RequirementSet) -> ZygoteResult<RequirementSet> {
        let mut expanded = packages.clone();
        for pkg in packages {
            match self.most_frequent(pkg)? {
                Some(deps) => expanded.extend(deps),
                None => debug!("No recorded dependencies for {}", pkg),
            }
        }
        Ok(expanded)
    }

    /// Number of distinct versioned packages recorded
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load a map from a JSON file
    pub async fn load(path: &Path) -> ZygoteResult<Self> {
        let content = fs::read_to_string(path).await.map_err(|e| {
            ZygoteError::io(format!("reading dependency map {}", path.display()), e)
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save the map as pretty JSON
    pub async fn save(&self, path: &Path) -> ZygoteResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await.map_err(|e| {
            ZygoteError::io(format!("writing dependency map {}", path.display()), e)
        })?;
        info!("Dependency map saved to {}", path.display());
        Ok(())
    }
}
