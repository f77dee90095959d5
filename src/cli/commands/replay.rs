//! Replay command - compare trees on one workload

use crate::cli::args::{OutputFormat, ReplayArgs};
use crate::config::Config;
use crate::cost::CostTable;
use crate::deps::DependencyMap;
use crate::error::{ZygoteError, ZygoteResult};
use crate::manifest::ManifestParser;
use crate::package::display_set;
use crate::replay::{ReplayOutcome, ReplayReport, Replayer, Workload};
use crate::tree::Tree;
use crate::ui::{self, TaskSpinner, UiContext};
use console::style;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;

/// Nodes listed per tree in table output
const NODES_SHOWN: usize = 10;

/// Execute the replay command
pub async fn execute(args: ReplayArgs, config: &Config) -> ZygoteResult<()> {
    let ctx = UiContext::detect();
    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start("Loading workload and cost table...");

    let costs = CostTable::load(&args.costs).await?;
    let deps = match args.deps {
        Some(ref path) => Some(DependencyMap::load(path).await?),
        None => None,
    };
    let parser = ManifestParser::new(&config.manifest);
    let workload = Workload::load(&args.workload)
        .await?
        .resolve(&parser, deps.as_ref())?;

    let mut trees = Vec::with_capacity(args.trees.len());
    for path in &args.trees {
        trees.push((tree_label(path), Tree::load(path).await?));
    }

    let policy = args.policy.unwrap_or(config.simulation.policy);
    spinner.message(&format!(
        "Replaying {} calls against {} tree(s)...",
        workload.len(),
        trees.len()
    ));
    let results = match Replayer::new(config.simulation.cost_params(), policy)
        .compare(trees, Arc::new(costs), Arc::new(workload))
        .await
    {
        Ok(results) => results,
        Err(e) => {
            spinner.stop_error("Replay failed");
            return Err(e);
        }
    };
    let total = results.len();
    let mut succeeded = Vec::with_capacity(total);
    let mut first_error = None;
    for (label, result) in results {
        match result {
            Ok(run) => succeeded.push(run),
            Err(e) => {
                ui::step_warn_hint(
                    &ctx,
                    &format!("{}: {}", label, e),
                    e.hint().unwrap_or("The remaining trees are still reported"),
                );
                first_error.get_or_insert(e);
            }
        }
    }
    if succeeded.is_empty() {
        spinner.stop_error("Every tree failed to replay");
        return Err(first_error
            .unwrap_or_else(|| ZygoteError::User("No trees to replay".to_string())));
    }
    spinner.stop(&format!("Replayed {} of {} tree(s)", succeeded.len(), total));

    if let Some(ref dir) = args.save_trees {
        save_trees(dir, &succeeded).await?;
    }

    let reports: Vec<&ReplayReport> = succeeded.iter().map(|(_, o)| &o.report).collect();
    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
        OutputFormat::Plain => {
            for report in &reports {
                println!("{} {:.3}", report.tree, report.total_ms);
            }
        }
        OutputFormat::Table => print_table(&ctx, &reports),
    }

    Ok(())
}

fn tree_label(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}

async fn save_trees(dir: &Path, results: &[(Tree, ReplayOutcome)]) -> ZygoteResult<()> {
    fs::create_dir_all(dir)
        .await
        .map_err(|e| ZygoteError::io(format!("creating {}", dir.display()), e))?;
    for (tree, outcome) in results {
        let path = dir.join(format!("{}.json", outcome.report.tree));
        tree.save(&path, Some(&outcome.state)).await?;
    }
    Ok(())
}

fn print_table(ctx: &UiContext, reports: &[&ReplayReport]) {
    let Some(first) = reports.first() else {
        return;
    };
    ui::intro(ctx, &format!("Replay ({}, {} calls)", first.policy, first.invocations));

    println!(
        "{:<24} {:>12} {:>10} {:>12} {:>12} {:>12}",
        style("TREE").bold(),
        style("TOTAL ms").bold(),
        style("MEAN ms").bold(),
        style("WARMUP ms").bold(),
        style("FORK ms").bold(),
        style("IMPORT ms").bold()
    );
    println!("{}", "-".repeat(87));

    let best = reports
        .iter()
        .map(|r| r.total_ms)
        .fold(f64::INFINITY, f64::min);
    for report in reports {
        let total = format!("{:.3}", report.total_ms);
        let total = if report.total_ms == best && reports.len() > 1 {
            style(total).green().to_string()
        } else {
            total
        };
        println!(
            "{:<24} {:>12} {:>10.3} {:>12.3} {:>12.3} {:>12.3}",
            report.tree,
            total,
            report.mean_ms(),
            report.warmup_ms,
            report.fork_ms,
            report.import_ms
        );
    }

    for report in reports {
        ui::section(ctx, &format!("{}: busiest nodes", report.tree));
        let mut nodes: Vec<_> = report.nodes.iter().collect();
        nodes.sort_by(|a, b| b.hits.cmp(&a.hits).then(a.id.cmp(&b.id)));
        for node in nodes.iter().take(NODES_SHOWN) {
            let packages = if node.packages.is_empty() {
                "(empty)".to_string()
            } else {
                display_set(&node.packages.iter().cloned().collect())
            };
            ui::key_value(
                ctx,
                &format!("{} {}", node.id, packages),
                &format!(
                    "{} hit(s), {:.3} ms, {:.1} MB",
                    node.hits, node.cost_ms, node.memory_mb
                ),
            );
        }
        if nodes.len() > NODES_SHOWN {
            ui::remark(ctx, &format!("... and {} more", nodes.len() - NODES_SHOWN));
        }
    }
}
