//! Cost table loading and lookup

use crate::error::{ZygoteError, ZygoteResult};
use crate::package::VersionedPackage;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// Standalone import cost of one package
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PackageCost {
    /// Import time in milliseconds
    #[serde(rename = "time_ms")]
    pub import_ms: f64,

    /// Resident memory added by the import, in megabytes
    #[serde(rename = "mem_mb", default)]
    pub import_mb: f64,
}

impl PackageCost {
    pub fn new(import_ms: f64, import_mb: f64) -> Self {
        Self {
            import_ms,
            import_mb,
        }
    }
}

/// Anything that can price a package import.
///
/// A missing package is an error, never a free import.
pub trait CostSource {
    fn cost(&self, pkg: &VersionedPackage) -> ZygoteResult<PackageCost>;

    fn import_ms(&self, pkg: &VersionedPackage) -> ZygoteResult<f64> {
        Ok(self.cost(pkg)?.import_ms)
    }

    /// Total import time of `pkgs`
    fn import_ms_sum<'a, I>(&self, pkgs: I) -> ZygoteResult<f64>
    where
        I: IntoIterator<Item = &'a VersionedPackage>,
        Self: Sized,
    {
        pkgs.into_iter()
            .try_fold(0.0, |acc, pkg| Ok(acc + self.import_ms(pkg)?))
    }

    /// Total import memory of `pkgs`
    fn memory_mb_sum<'a, I>(&self, pkgs: I) -> ZygoteResult<f64>
    where
        I: IntoIterator<Item = &'a VersionedPackage>,
        Self: Sized,
    {
        pkgs.into_iter()
            .try_fold(0.0, |acc, pkg| Ok(acc + self.cost(pkg)?.import_mb))
    }
}

/// Read-only table of measured package costs
#[derive(Debug, Clone, Default)]
pub struct CostTable {
    costs: HashMap<VersionedPackage, PackageCost>,
}

impl CostTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pkg: VersionedPackage, cost: PackageCost) {
        self.costs.insert(pkg, cost);
    }

    pub fn get(&self, pkg: &VersionedPackage) -> Option<&PackageCost> {
        self.costs.get(pkg)
    }

    pub fn len(&self) -> usize {
        self.costs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }

    /// Build from the nested `name → version → cost` layout
    pub fn from_nested(nested: BTreeMap<String, BTreeMap<String, PackageCost>>) -> Self {
        let costs = nested
            .into_iter()
            .flat_map(|(name, versions)| {
                versions
                    .into_iter()
                    .map(move |(version, cost)| (VersionedPackage::new(&name, version), cost))
            })
            .collect();
        Self { costs }
    }

    /// Parse the nested JSON layout
    pub fn from_json(content: &str) -> ZygoteResult<Self> {
        let nested: BTreeMap<String, BTreeMap<String, PackageCost>> =
            serde_json::from_str(content)?;
        Ok(Self::from_nested(nested))
    }

    /// Load a cost table from a JSON file
    pub async fn load(path: &Path) -> ZygoteResult<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| ZygoteError::io(format!("reading cost table {}", path.display()), e))?;
        let table = Self::from_json(&content)?;
        debug!("Loaded {} package costs from {}", table.len(), path.display());
        Ok(table)
    }
}

impl CostSource for CostTable {
    fn cost(&self, pkg: &VersionedPackage) -> ZygoteResult<PackageCost> {
        self.costs
            .get(pkg)
            .copied()
            .ok_or_else(|| ZygoteError::CostTableMiss(pkg.to_string()))
    }
}

impl FromIterator<(VersionedPackage, PackageCost)> for CostTable {
    fn from_iter<T: IntoIterator<Item = (VersionedPackage, PackageCost)>>(iter: T) -> Self {
        Self {
            costs: iter.into_iter().collect(),
        }
    }
}
