//! Versioned package identity
//!
//! A [`VersionedPackage`] is the universal key into the cost table, the
//! dependency map and every requirement set. Its text form is `name==version`.

use crate::error::{ZygoteError, ZygoteResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A package pinned to one version
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionedPackage {
    pub name: String,
    pub version: String,
}

/// Everything one invocation needs importable.
///
/// Ordered so that iteration, cost sums and diagnostics are deterministic.
pub type RequirementSet = BTreeSet<VersionedPackage>;

impl VersionedPackage {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Parse `name==version`, stripping any bracketed extras from the name
    pub fn parse(s: &str) -> ZygoteResult<Self> {
        let (name, version) = s
            .trim()
            .split_once("==")
            .ok_or_else(|| ZygoteError::InvalidPackage(s.to_string()))?;
        let name = strip_extras(name).trim();
        let version = version.trim();
        if name.is_empty() || version.is_empty() || version.contains("==") {
            return Err(ZygoteError::InvalidPackage(s.to_string()));
        }
        Ok(Self::new(name, version))
    }

    /// The `name==version` key used in serialized data
    pub fn key(&self) -> String {
        self.to_string()
    }
}

/// Drop an install-option suffix such as `[security]` from a package name
pub fn strip_extras(name: &str) -> &str {
    name.split('[').next().unwrap_or(name)
}

/// Parse a list of `name==version` strings into a requirement set
pub fn requirement_set<I, S>(items: I) -> ZygoteResult<RequirementSet>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| VersionedPackage::parse(s.as_ref()))
        .collect()
}

/// Render a requirement set as a comma-separated list (for messages)
pub fn display_set(set: &RequirementSet) -> String {
    set.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for VersionedPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=={}", self.name, self.version)
    }
}

impl FromStr for VersionedPackage {
    type Err = ZygoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for VersionedPackage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VersionedPackage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
