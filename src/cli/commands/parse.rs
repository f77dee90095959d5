//! Parse command - show a manifest's packages and requesters

use super::read_manifest;
use crate::cli::args::{OutputFormat, ParseArgs};
use crate::config::Config;
use crate::deps::DependencyGraph;
use crate::error::ZygoteResult;
use crate::manifest::{ManifestParser, ParseDiagnostic, ParsedManifest};
use crate::package::{display_set, RequirementSet, VersionedPackage};
use crate::ui::{self, UiContext};
use console::style;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

type Closures = BTreeMap<VersionedPackage, BTreeSet<VersionedPackage>>;

#[derive(Serialize)]
struct ParseOutput<'a> {
    #[serde(flatten)]
    manifest: &'a ParsedManifest,
    direct: RequirementSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    closures: Option<&'a Closures>,
}

/// Execute the parse command
pub async fn execute(args: ParseArgs, config: &Config) -> ZygoteResult<()> {
    let text = read_manifest(&args.manifest).await?;
    let manifest = ManifestParser::new(&config.manifest).parse(&text)?;
    let closures = args
        .closure
        .then(|| DependencyGraph::from_manifest(&manifest).closures());

    match args.format {
        OutputFormat::Json => {
            let output = ParseOutput {
                manifest: &manifest,
                direct: manifest.direct(),
                closures: closures.as_ref(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            for pkg in manifest.requirement_set() {
                println!("{}", pkg);
            }
        }
        OutputFormat::Table => print_table(&manifest, closures.as_ref()),
    }

    Ok(())
}

fn print_table(manifest: &ParsedManifest, closures: Option<&Closures>) {
    let ctx = UiContext::detect();
    ui::intro(&ctx, "Manifest");

    println!(
        "{:<32} {:<4} {:<16} {}",
        style("PACKAGE").bold(),
        style("OP").bold(),
        style("VERSION").bold(),
        style("REQUIRED BY").bold()
    );
    println!("{}", "-".repeat(80));

    for pin in manifest.pinned.values() {
        let requesters = manifest
            .required_by
            .get(&pin.versioned())
            .map(|r| {
                r.iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        println!(
            "{:<32} {:<4} {:<16} {}",
            pin.name, pin.operator, pin.version, requesters
        );
    }

    println!();
    println!(
        "{} package(s), {} direct",
        manifest.pinned.len(),
        manifest.direct().len()
    );

    if let Some(closures) = closures {
        ui::section(&ctx, "Transitive dependencies");
        for (pkg, deps) in closures {
            let deps = if deps.is_empty() {
                style("(none)").dim().to_string()
            } else {
                display_set(deps)
            };
            ui::key_value(&ctx, &pkg.to_string(), &deps);
        }
    }

    if !manifest.diagnostics.is_empty() {
        ui::section(&ctx, "Diagnostics");
        for diagnostic in &manifest.diagnostics {
            match diagnostic {
                ParseDiagnostic::MalformedLine { line, content } => {
                    ui::remark(&ctx, &format!("line {}: skipped '{}'", line, content))
                }
                ParseDiagnostic::UnresolvedDependencyReference { package, reference } => ui::remark(
                    &ctx,
                    &format!("{}: unresolved requester '{}'", package, reference),
                ),
            }
        }
    }
}
