//! Lookup command - price one requirement set against one tree

use super::read_manifest;
use crate::cli::args::{LookupArgs, OutputFormat};
use crate::config::Config;
use crate::cost::CostTable;
use crate::error::ZygoteResult;
use crate::eval::{Evaluator, LookupPolicy, TaskCost};
use crate::manifest::ManifestParser;
use crate::package::{display_set, requirement_set, VersionedPackage};
use crate::tree::{Tree, WarmState};
use crate::ui::{self, UiContext};
use serde::Serialize;

#[derive(Serialize)]
struct LookupOutput {
    policy: LookupPolicy,
    depth: usize,
    packages: Vec<VersionedPackage>,
    cost: TaskCost,
    total_ms: f64,
}

/// Execute the lookup command
pub async fn execute(args: LookupArgs, config: &Config) -> ZygoteResult<()> {
    let tree = Tree::load(&args.tree).await?;
    let costs = CostTable::load(&args.costs).await?;
    let reqs = match args.manifest {
        Some(ref path) => ManifestParser::new(&config.manifest)
            .parse(&read_manifest(path).await?)?
            .requirement_set(),
        None => requirement_set(&args.packages)?,
    };

    let policy = args.policy.unwrap_or(config.simulation.policy);
    let evaluator =
        Evaluator::new(&tree, &costs, config.simulation.cost_params()).with_policy(policy);
    // a cold tree: the reported warm-up is the full cost of reaching the node
    let cost = evaluator.task_cost(&reqs, &mut WarmState::new())?;
    let node = tree.node(cost.node);

    match args.format {
        OutputFormat::Json => {
            let output = LookupOutput {
                policy,
                depth: node.depth,
                packages: node.packages.iter().cloned().collect(),
                cost,
                total_ms: cost.total_ms(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => println!("{} {:.3}", cost.node, cost.total_ms()),
        OutputFormat::Table => {
            let ctx = UiContext::detect();
            ui::intro(&ctx, &format!("Lookup ({})", policy));
            ui::key_value(&ctx, "Requirements", &display_set(&reqs));
            ui::key_value(
                &ctx,
                "Node",
                &format!("{} at depth {} [{}]", cost.node, node.depth, display_set(&node.packages)),
            );
            ui::section(&ctx, "Cost");
            ui::key_value(&ctx, "Warm-up", &format!("{:.3} ms", cost.warmup_ms));
            ui::key_value(&ctx, "Fork", &format!("{:.3} ms", cost.fork_ms));
            ui::key_value(&ctx, "Import", &format!("{:.3} ms", cost.import_ms));
            ui::key_value(&ctx, "Total", &format!("{:.3} ms", cost.total_ms()));
        }
    }

    Ok(())
}
