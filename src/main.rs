//! Zygote - cache-tree cost simulator
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use zygote_sim::cli::{commands, Cli, Commands};
use zygote_sim::config::ConfigManager;
use zygote_sim::error::ZygoteResult;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> ZygoteResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    // 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("zygote_sim=warn"),
        1 => EnvFilter::new("zygote_sim=info"),
        _ => EnvFilter::new("zygote_sim=debug"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if config.general.log_format == "json" {
        subscriber.json().init();
    } else {
        subscriber.without_time().init();
    }
    debug!("Loaded configuration from {}", config_manager.path().display());

    match cli.command {
        Commands::Parse(args) => commands::parse(args, &config).await,
        Commands::Deps(args) => commands::deps(args, &config).await,
        Commands::Top(args) => commands::top(args, &config).await,
        Commands::Lookup(args) => commands::lookup(args, &config).await,
        Commands::Replay(args) => commands::replay(args, &config).await,
        Commands::Config(args) => commands::config(args, &config, &config_manager).await,
    }
}
