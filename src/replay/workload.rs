//! Workload traces
//!
//! A workload defines a set of functions, each with the packages it needs,
//! and an ordered trace of calls naming those functions.

use crate::deps::DependencyMap;
use crate::error::{ZygoteError, ZygoteResult};
use crate::manifest::ManifestParser;
use crate::package::{RequirementSet, VersionedPackage};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// Workload file as stored on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workload {
    pub functions: Vec<FunctionSpec>,
    #[serde(default)]
    pub calls: Vec<Call>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub name: String,
    #[serde(flatten)]
    pub source: FunctionSource,
}

/// Where a function's requirements come from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FunctionSource {
    /// Explicit list of pinned packages
    Packages { packages: Vec<VersionedPackage> },
    /// Pinned manifest text
    Manifest { manifest: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Call {
    pub name: String,
}

/// A workload with every function turned into a requirement set and every
/// call checked against the function list
#[derive(Debug, Clone, Default)]
pub struct ResolvedWorkload {
    functions: BTreeMap<String, RequirementSet>,
    calls: Vec<String>,
}

impl Workload {
    /// Load a workload from a JSON file
    pub async fn load(path: &Path) -> ZygoteResult<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| ZygoteError::io(format!("reading workload {}", path.display()), e))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Build requirement sets for all functions and validate the call trace.
    ///
    /// Explicit package lists are expanded with `deps` when a dependency map
    /// is given; manifests already carry their full closure.
    pub fn resolve(
        &self,
        parser: &ManifestParser,
        deps: Option<&DependencyMap>,
    ) -> ZygoteResult<ResolvedWorkload> {
        let mut functions = BTreeMap::new();
        for function in &self.functions {
            let reqs = match &function.source {
                FunctionSource::Packages { packages } => {
                    let listed: RequirementSet = packages.iter().cloned().collect();
                    match deps {
                        Some(map) => map.expand(&listed)?,
                        None => listed,
                    }
                }
                FunctionSource::Manifest { manifest } => {
                    parser.parse(manifest)?.requirement_set()
                }
            };
            debug!("Function {} needs {} packages", function.name, reqs.len());
            functions.insert(function.name.clone(), reqs);
        }

        let calls = self
            .calls
            .iter()
            .enumerate()
            .map(|(index, call)| {
                if functions.contains_key(&call.name) {
                    Ok(call.name.clone())
                } else {
                    Err(ZygoteError::UnknownFunction {
                        index,
                        name: call.name.clone(),
                    })
                }
            })
            .collect::<ZygoteResult<Vec<_>>>()?;

        Ok(ResolvedWorkload { functions, calls })
    }
}

impl ResolvedWorkload {
    pub fn function(&self, name: &str) -> Option<&RequirementSet> {
        self.functions.get(name)
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    /// Number of calls in the trace
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// The call trace in order, each call paired with its requirement set
    pub fn invocations(&self) -> impl Iterator<Item = (&str, &RequirementSet)> + '_ {
        self.calls.iter().filter_map(|name| {
            self.functions
                .get(name)
                .map(|reqs| (name.as_str(), reqs))
        })
    }
}
