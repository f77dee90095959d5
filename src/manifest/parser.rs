//! Pinned-manifest parsing
//!
//! Reads resolver output of the form
//!
//! ```text
//! numpy==1.25.2
//!     # via
//!     #   -r requirements.in
//!     #   scipy
//! scipy==1.11.2
//!     # via -r requirements.in
//! ```
//!
//! into the pinned version of every package plus, for each versioned
//! package, the ordered list of requesters that pulled it in.

use crate::config::ManifestConfig;
use crate::error::{ZygoteError, ZygoteResult};
use crate::package::{strip_extras, RequirementSet, VersionedPackage};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Marker recorded for packages requested directly by the input requirements
pub const DIRECT_REQUIREMENT: &str = "direct_req";

/// Line that ends the package section of a pip-compile manifest
pub const UNSAFE_SENTINEL: &str =
    "The following packages are considered to be unsafe in a requirements file";

lazy_static! {
    static ref RE_PINNED: Regex = Regex::new(
        r"^(?P<name>[A-Za-z0-9][A-Za-z0-9._\-]*(?:\[[^\]]*\])?)\s*(?P<op>===|==|~=|!=|<=|>=|<|>)\s*(?P<version>[^\s;#<>=!,\\]+)"
    )
    .unwrap();
}

/// One pinned line: `name<op>version`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PinnedPackage {
    pub name: String,
    pub operator: String,
    pub version: String,
}

impl PinnedPackage {
    pub fn versioned(&self) -> VersionedPackage {
        VersionedPackage::new(&self.name, &self.version)
    }
}

/// Who pulled a package into the manifest
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Requester {
    /// Another pinned package in the same manifest
    Package(VersionedPackage),
    /// The input requirements themselves (`-r requirements.in`)
    Direct,
    /// A reference that does not name a pinned package (VCS URL, extras, constraints file)
    Passthrough(String),
}

impl fmt::Display for Requester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Package(pkg) => write!(f, "{}", pkg),
            Self::Direct => f.write_str(DIRECT_REQUIREMENT),
            Self::Passthrough(s) => f.write_str(s),
        }
    }
}

impl Serialize for Requester {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Non-fatal problems found while parsing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseDiagnostic {
    /// A line that is neither a pinned package nor a comment; skipped
    MalformedLine { line: usize, content: String },
    /// A requester that could not be resolved to a pinned package; kept verbatim
    UnresolvedDependencyReference {
        package: VersionedPackage,
        reference: String,
    },
}

/// Parser output
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParsedManifest {
    /// Package name (extras stripped) to its pinned operator and version
    pub pinned: BTreeMap<String, PinnedPackage>,

    /// Versioned package to the requesters that pulled it in, in manifest order
    pub required_by: BTreeMap<VersionedPackage, Vec<Requester>>,

    /// Skipped lines and unresolved references
    pub diagnostics: Vec<ParseDiagnostic>,
}

impl ParsedManifest {
    /// Every pinned package as a requirement set
    pub fn requirement_set(&self) -> RequirementSet {
        self.pinned.values().map(PinnedPackage::versioned).collect()
    }

    /// Pinned packages requested directly by the input requirements
    pub fn direct(&self) -> RequirementSet {
        self.required_by
            .iter()
            .filter(|(_, requesters)| requesters.contains(&Requester::Direct))
            .map(|(pkg, _)| pkg.clone())
            .collect()
    }

    /// `(dependency, dependent)` pairs where both ends are pinned packages
    pub fn edges(&self) -> impl Iterator<Item = (&VersionedPackage, &VersionedPackage)> {
        self.required_by.iter().flat_map(|(dependency, requesters)| {
            requesters.iter().filter_map(move |r| match r {
                Requester::Package(dependent) => Some((dependency, dependent)),
                _ => None,
            })
        })
    }

    /// Check whether any skipped line or unresolved reference mentions one of `patterns`
    pub fn references_any(&self, patterns: &[String]) -> bool {
        let hit = |s: &str| patterns.iter().any(|p| s.contains(p.as_str()));
        self.diagnostics.iter().any(|d| match d {
            ParseDiagnostic::MalformedLine { content, .. } => hit(content),
            ParseDiagnostic::UnresolvedDependencyReference { reference, .. } => hit(reference),
        })
    }
}

/// Tolerant parser for pinned manifests
#[derive(Debug, Clone)]
pub struct ManifestParser {
    sentinel: String,
}

impl Default for ManifestParser {
    fn default() -> Self {
        Self {
            sentinel: UNSAFE_SENTINEL.to_string(),
        }
    }
}

impl ManifestParser {
    pub fn new(config: &ManifestConfig) -> Self {
        Self {
            sentinel: config.unsafe_sentinel.clone(),
        }
    }

    /// Parse manifest text. Empty input is an error; bad lines are skipped.
    pub fn parse(&self, text: &str) -> ZygoteResult<ParsedManifest> {
        if text.trim().is_empty() {
            return Err(ZygoteError::InvalidManifest(
                "manifest text is empty".to_string(),
            ));
        }

        let lines: Vec<&str> = text.lines().collect();
        let mut manifest = ParsedManifest::default();
        // package name -> raw requester tokens, resolved once every pin is known
        let mut raw: BTreeMap<String, Vec<String>> = BTreeMap::new();

        let mut i = 0;
        'lines: while i < lines.len() {
            let line = lines[i].trim();
            if line.contains(self.sentinel.as_str()) {
                debug!("Stopping at unsafe-packages sentinel on line {}", i + 1);
                break;
            }
            if line.is_empty() || line.starts_with('#') {
                i += 1;
                continue;
            }

            let Some(caps) = RE_PINNED.captures(line) else {
                debug!("Skipping malformed manifest line {}: {}", i + 1, line);
                manifest.diagnostics.push(ParseDiagnostic::MalformedLine {
                    line: i + 1,
                    content: line.to_string(),
                });
                i += 1;
                continue;
            };

            let name = strip_extras(&caps["name"]).to_string();
            manifest.pinned.insert(
                name.clone(),
                PinnedPackage {
                    name: name.clone(),
                    operator: caps["op"].to_string(),
                    version: caps["version"].to_string(),
                },
            );
            let tokens = raw.entry(name).or_default();

            i += 1;
            let mut first = true;
            while i < lines.len() {
                let comment = lines[i].trim();
                if !comment.starts_with('#') {
                    break;
                }
                if comment.contains(self.sentinel.as_str()) {
                    debug!("Stopping at unsafe-packages sentinel on line {}", i + 1);
                    break 'lines;
                }

                let token = requester_token(comment, first);
                first = false;
                if !token.is_empty() {
                    tokens.push(token.to_string());
                }
                i += 1;
            }
        }

        for (name, tokens) in raw {
            if tokens.is_empty() {
                continue;
            }
            let package = manifest.pinned[&name].versioned();
            let mut requesters = Vec::with_capacity(tokens.len());
            for token in tokens {
                let requester = resolve_requester(&manifest.pinned, &token);
                if let Requester::Passthrough(ref reference) = requester {
                    debug!("Unresolved requester '{}' for {}", reference, package);
                    manifest
                        .diagnostics
                        .push(ParseDiagnostic::UnresolvedDependencyReference {
                            package: package.clone(),
                            reference: reference.clone(),
                        });
                }
                requesters.push(requester);
            }
            manifest.required_by.insert(package, requesters);
        }

        Ok(manifest)
    }
}

/// Parse with default settings
pub fn parse_manifest(text: &str) -> ZygoteResult<ParsedManifest> {
    ManifestParser::default().parse(text)
}

/// Extract the requester named by one comment line.
///
/// Only the first comment after a pin carries the `via` keyword.
fn requester_token(comment: &str, first: bool) -> &str {
    let body = comment.trim_start_matches('#').trim();
    if first {
        if let Some(rest) = body.strip_prefix("via") {
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                return rest.trim();
            }
        }
    }
    body
}

fn resolve_requester(pinned: &BTreeMap<String, PinnedPackage>, token: &str) -> Requester {
    if token.starts_with("-r") {
        return Requester::Direct;
    }
    if let Some(pin) = pinned.get(token) {
        return Requester::Package(pin.versioned());
    }
    if let Ok(pkg) = VersionedPackage::parse(token) {
        // extras-qualified requesters stay opaque
        if !token.contains('[')
            && pinned
                .get(&pkg.name)
                .is_some_and(|pin| pin.version == pkg.version)
        {
            return Requester::Package(pkg);
        }
    }
    Requester::Passthrough(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkg(s: &str) -> VersionedPackage {
        VersionedPackage::parse(s).unwrap()
    }

    #[test]
    fn parses_pins_and_requesters() {
        let text = "foo==1.0\n# via -r requirements.in\nbar==2.0\n# via\n#   foo==1.0\n";
        let manifest = parse_manifest(text).unwrap();

        assert_eq!(manifest.pinned.len(), 2);
        assert_eq!(manifest.pinned["foo"].operator, "==");
        assert_eq!(manifest.pinned["foo"].version, "1.0");
        assert_eq!(manifest.pinned["bar"].version, "2.0");
        assert_eq!(
            manifest.required_by[&pkg("bar==2.0")],
            vec![Requester::Package(pkg("foo==1.0"))]
        );
        assert_eq!(manifest.required_by[&pkg("foo==1.0")], vec![Requester::Direct]);
        assert!(manifest.diagnostics.is_empty());
    }

    #[test]
    fn empty_manifest_is_invalid() {
        assert!(matches!(
            parse_manifest(""),
            Err(ZygoteError::InvalidManifest(_))
        ));
        assert!(matches!(
            parse_manifest("  \n\n"),
            Err(ZygoteError::InvalidManifest(_))
        ));
    }

    #[test]
    fn bare_names_resolve_to_pins() {
        let text = "\
numpy==1.25.2
    # via
    #   -r requirements.in
    #   scipy
scipy==1.11.2
    # via -r requirements.in
";
        let manifest = parse_manifest(text).unwrap();
        assert_eq!(
            manifest.required_by[&pkg("numpy==1.25.2")],
            vec![Requester::Direct, Requester::Package(pkg("scipy==1.11.2"))]
        );
        assert_eq!(manifest.direct().len(), 2);
    }

    #[test]
    fn extras_stripped_from_pinned_name() {
        let manifest = parse_manifest("requests[socks]==2.31.0\n# via -r in\n").unwrap();
        assert!(manifest.pinned.contains_key("requests"));
        assert!(manifest.required_by.contains_key(&pkg("requests==2.31.0")));
    }

    #[test]
    fn environment_marker_ignored() {
        let manifest =
            parse_manifest("colorama==0.4.6 ; platform_system == \"Windows\"\n").unwrap();
        assert_eq!(manifest.pinned["colorama"].version, "0.4.6");
    }

    #[test]
    fn malformed_lines_skipped() {
        let text = "parcon @ git+https://github.com/javawizard/parcon\nsix==1.16.0\n";
        let manifest = parse_manifest(text).unwrap();
        assert_eq!(manifest.pinned.len(), 1);
        assert!(matches!(
            &manifest.diagnostics[0],
            ParseDiagnostic::MalformedLine { line: 1, .. }
        ));
        assert!(manifest.references_any(&["https://".to_string()]));
    }

    #[test]
    fn unresolved_requester_kept_verbatim() {
        let text = "attrs==23.1.0\n# via\n#   jsonschema\n#   foo[bar]==1.0\n";
        let manifest = parse_manifest(text).unwrap();
        assert_eq!(
            manifest.required_by[&pkg("attrs==23.1.0")],
            vec![
                Requester::Passthrough("jsonschema".to_string()),
                Requester::Passthrough("foo[bar]==1.0".to_string()),
            ]
        );
        assert_eq!(manifest.diagnostics.len(), 2);
    }

    #[test]
    fn stops_at_sentinel() {
        let text = "\
six==1.16.0
    # via -r requirements.in

# The following packages are considered to be unsafe in a requirements file:
setuptools==68.0.0
";
        let manifest = parse_manifest(text).unwrap();
        assert_eq!(manifest.pinned.len(), 1);
        assert!(!manifest.pinned.contains_key("setuptools"));
    }

    #[test]
    fn sentinel_directly_after_comments() {
        let text = "six==1.16.0\n# via -r requirements.in\n# The following packages are considered to be unsafe in a requirements file:\nsetuptools==68.0.0\n";
        let manifest = parse_manifest(text).unwrap();
        assert_eq!(manifest.required_by[&pkg("six==1.16.0")], vec![Requester::Direct]);
        assert_eq!(manifest.pinned.len(), 1);
    }

    #[test]
    fn bare_via_has_no_requester() {
        let manifest = parse_manifest("six==1.16.0\n# via\n").unwrap();
        assert!(manifest.required_by.is_empty());
    }

    #[test]
    fn edges_only_between_pins() {
        let text = "foo==1.0\n# via -r requirements.in\nbar==2.0\n# via\n#   foo\n#   -r requirements.in\n";
        let manifest = parse_manifest(text).unwrap();
        let edges: Vec<_> = manifest.edges().collect();
        assert_eq!(edges, vec![(&pkg("bar==2.0"), &pkg("foo==1.0"))]);
    }

    #[test]
    fn requester_token_strips_via_once() {
        assert_eq!(requester_token("# via -r requirements.in", true), "-r requirements.in");
        assert_eq!(requester_token("# via", true), "");
        assert_eq!(requester_token("#   scipy", false), "scipy");
        assert_eq!(requester_token("# viable", true), "viable");
    }

    #[test]
    fn custom_sentinel_from_config() {
        let config = ManifestConfig {
            unsafe_sentinel: "STOP".to_string(),
            ..ManifestConfig::default()
        };
        let manifest = ManifestParser::new(&config)
            .parse("a==1\n# STOP\nb==2\n")
            .unwrap();
        assert_eq!(manifest.pinned.len(), 1);
    }
}
