//! Pinned dependency manifests
//!
//! Parses resolver-generated manifests into pinned versions and
//! "required by" relations, and counts package popularity across batches.

pub mod frequency;
pub mod parser;

pub use frequency::{count_packages, top_packages};
pub use parser::{
    parse_manifest, ManifestParser, ParseDiagnostic, ParsedManifest, PinnedPackage, Requester,
    DIRECT_REQUIREMENT, UNSAFE_SENTINEL,
};
