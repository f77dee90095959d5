//! Package popularity across a batch of manifests

use crate::manifest::ParsedManifest;
use crate::package::VersionedPackage;
use std::collections::BTreeMap;
use tracing::debug;

/// How often each versioned package is pinned across a batch of manifests.
///
/// Manifests that reference any of `blacklist` (URL requirements) are skipped
/// entirely, since their packages cannot be measured.
pub fn count_packages<'a, I>(manifests: I, blacklist: &[String]) -> BTreeMap<VersionedPackage, usize>
where
    I: IntoIterator<Item = &'a ParsedManifest>,
{
    let mut counts = BTreeMap::new();
    let mut skipped = 0usize;

    for manifest in manifests {
        if manifest.references_any(blacklist) {
            skipped += 1;
            continue;
        }
        for pkg in manifest.requirement_set() {
            *counts.entry(pkg).or_insert(0) += 1;
        }
    }

    debug!(
        "Counted {} unique packages ({} manifests skipped)",
        counts.len(),
        skipped
    );
    counts
}

/// The `n` most frequent packages, most frequent first, ties by name
pub fn top_packages(
    counts: &BTreeMap<VersionedPackage, usize>,
    n: usize,
) -> Vec<(VersionedPackage, usize)> {
    let mut sorted: Vec<_> = counts.iter().map(|(p, c)| (p.clone(), *c)).collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted.truncate(n);
    sorted
}
