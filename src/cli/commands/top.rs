//! Top command - most common pinned packages

use super::load_manifests;
use crate::cli::args::{OutputFormat, TopArgs};
use crate::config::Config;
use crate::error::ZygoteResult;
use crate::manifest::{count_packages, top_packages, ManifestParser};
use crate::ui::{self, UiContext};
use console::style;
use serde::Serialize;

#[derive(Serialize)]
struct TopEntry {
    package: String,
    count: usize,
}

/// Execute the top command
pub async fn execute(args: TopArgs, config: &Config) -> ZygoteResult<()> {
    let ctx = UiContext::detect();
    let parser = ManifestParser::new(&config.manifest);
    let manifests = load_manifests(&args.manifests, &parser, &ctx).await?;

    let counts = count_packages(&manifests, &config.manifest.url_blacklist);
    let top = top_packages(&counts, args.count);

    match args.format {
        OutputFormat::Json => {
            let entries: Vec<_> = top
                .iter()
                .map(|(pkg, count)| TopEntry {
                    package: pkg.to_string(),
                    count: *count,
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Plain => {
            for (pkg, _) in &top {
                println!("{}", pkg);
            }
        }
        OutputFormat::Table => {
            ui::intro(&ctx, "Top packages");
            println!(
                "{:<40} {:>8}",
                style("PACKAGE").bold(),
                style("COUNT").bold()
            );
            println!("{}", "-".repeat(49));
            for (pkg, count) in &top {
                println!("{:<40} {:>8}", pkg.to_string(), count);
            }
            println!();
            println!(
                "{} unique package(s) across {} manifest(s)",
                counts.len(),
                manifests.len()
            );
        }
    }

    Ok(())
}
