//! Deps command - learn a dependency map from manifests

use super::load_manifests;
use crate::cli::args::DepsArgs;
use crate::config::Config;
use crate::deps::{DependencyGraph, DependencyMap};
use crate::error::ZygoteResult;
use crate::manifest::ManifestParser;
use crate::ui::{self, UiContext};
use tracing::debug;

/// Execute the deps command
pub async fn execute(args: DepsArgs, config: &Config) -> ZygoteResult<()> {
    let ctx = UiContext::detect();
    let parser = ManifestParser::new(&config.manifest);
    let manifests = load_manifests(&args.manifests, &parser, &ctx).await?;

    let mut map = match args.merge {
        Some(ref path) => DependencyMap::load(path).await?,
        None => DependencyMap::new(),
    };
    for manifest in &manifests {
        map.observe(&DependencyGraph::from_manifest(manifest));
    }
    debug!("Dependency map covers {} versioned packages", map.len());

    match args.output {
        Some(ref path) => {
            map.save(path).await?;
            ui::step_ok_detail(
                &ctx,
                &format!(
                    "Learned {} packages from {} manifest(s)",
                    map.len(),
                    manifests.len()
                ),
                &path.display().to_string(),
            );
        }
        None => println!("{}", serde_json::to_string_pretty(&map)?),
    }

    Ok(())
}
