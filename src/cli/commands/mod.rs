//! CLI command implementations

pub mod config;
pub mod deps;
pub mod lookup;
pub mod parse;
pub mod replay;
pub mod top;

pub use config::execute as config;
pub use deps::execute as deps;
pub use lookup::execute as lookup;
pub use parse::execute as parse;
pub use replay::execute as replay;
pub use top::execute as top;

use crate::error::{ZygoteError, ZygoteResult};
use crate::manifest::{ManifestParser, ParsedManifest};
use crate::ui::{self, BatchProgress, UiContext};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::warn;

/// Read a manifest file to text
pub(crate) async fn read_manifest(path: &Path) -> ZygoteResult<String> {
    fs::read_to_string(path)
        .await
        .map_err(|e| ZygoteError::io(format!("reading manifest {}", path.display()), e))
}

/// Parse a batch of manifests.
///
/// Unreadable files abort the batch; manifests that fail to parse are
/// skipped with a warning.
pub(crate) async fn load_manifests(
    paths: &[PathBuf],
    parser: &ManifestParser,
    ctx: &UiContext,
) -> ZygoteResult<Vec<ParsedManifest>> {
    let progress = BatchProgress::new(ctx, "manifests", paths.len() as u64);
    let mut manifests = Vec::with_capacity(paths.len());
    let mut skipped = 0usize;

    for path in paths {
        progress.inc(&path.display().to_string());
        let text = read_manifest(path).await?;
        match parser.parse(&text) {
            Ok(manifest) => manifests.push(manifest),
            Err(ZygoteError::InvalidManifest(reason)) => {
                warn!("Skipping {}: {}", path.display(), reason);
                skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }
    progress.finish();

    if skipped > 0 {
        ui::step_warn_hint(
            ctx,
            &format!("{} manifest(s) skipped", skipped),
            "Run with -v for details",
        );
    }
    Ok(manifests)
}
