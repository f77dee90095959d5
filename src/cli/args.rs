//! CLI argument definitions using clap derive

use crate::eval::LookupPolicy;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Zygote - cache-tree cost simulator
///
/// Parses pinned manifests into dependency graphs and replays serverless
/// workloads against zygote trees to compare their start-up costs.
#[derive(Parser, Debug)]
#[command(name = "zygote")]
#[command(author, version, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "ZYGOTE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse a pinned manifest and show its packages and requesters
    Parse(ParseArgs),

    /// Learn a dependency map from a batch of manifests
    Deps(DepsArgs),

    /// Count the most common pinned packages across manifests
    Top(TopArgs),

    /// Find the node that serves one requirement set
    Lookup(LookupArgs),

    /// Replay a workload against one or more trees
    Replay(ReplayArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the parse command
#[derive(Parser, Debug)]
pub struct ParseArgs {
    /// Manifest file (pip-compile style)
    pub manifest: PathBuf,

    /// Also print each package's transitive dependencies
    #[arg(long)]
    pub closure: bool,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the deps command
#[derive(Parser, Debug)]
pub struct DepsArgs {
    /// Manifest files to learn from
    #[arg(required = true)]
    pub manifests: Vec<PathBuf>,

    /// Existing map to extend
    #[arg(long)]
    pub merge: Option<PathBuf>,

    /// Write the map here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the top command
#[derive(Parser, Debug)]
pub struct TopArgs {
    /// Manifest files to count
    #[arg(required = true)]
    pub manifests: Vec<PathBuf>,

    /// Number of packages to show
    #[arg(short = 'n', long, default_value = "10")]
    pub count: usize,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the lookup command
#[derive(Parser, Debug)]
pub struct LookupArgs {
    /// Tree description (JSON)
    #[arg(short, long)]
    pub tree: PathBuf,

    /// Cost table (JSON)
    #[arg(long)]
    pub costs: PathBuf,

    /// Lookup policy (default: from config)
    #[arg(short, long)]
    pub policy: Option<LookupPolicy>,

    /// Take the requirement set from a manifest instead
    #[arg(short, long, conflicts_with = "packages")]
    pub manifest: Option<PathBuf>,

    /// Required packages as name==version
    #[arg(required_unless_present = "manifest")]
    pub packages: Vec<String>,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the replay command
#[derive(Parser, Debug)]
pub struct ReplayArgs {
    /// Tree descriptions to compare (JSON)
    #[arg(required = true)]
    pub trees: Vec<PathBuf>,

    /// Workload definition (JSON)
    #[arg(short, long)]
    pub workload: PathBuf,

    /// Cost table (JSON)
    #[arg(long)]
    pub costs: PathBuf,

    /// Dependency map used to expand package lists
    #[arg(short, long)]
    pub deps: Option<PathBuf>,

    /// Lookup policy (default: from config)
    #[arg(short, long)]
    pub policy: Option<LookupPolicy>,

    /// Write each tree back out with hit counts into this directory
    #[arg(long)]
    pub save_trees: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., simulation.fork_ms)
        key: String,
        /// Value to set
        value: String,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_parse() {
        let cli = Cli::parse_from(["zygote", "parse", "requirements.txt", "--closure"]);
        match cli.command {
            Commands::Parse(args) => {
                assert_eq!(args.manifest, PathBuf::from("requirements.txt"));
                assert!(args.closure);
                assert!(matches!(args.format, OutputFormat::Table));
            }
            _ => panic!("expected Parse command"),
        }
    }

    #[test]
    fn cli_parses_lookup_packages() {
        let cli = Cli::parse_from([
            "zygote",
            "lookup",
            "--tree",
            "tree.json",
            "--costs",
            "costs.json",
            "--policy",
            "best-of-subtree",
            "numpy==1.25.2",
            "six==1.16.0",
        ]);
        match cli.command {
            Commands::Lookup(args) => {
                assert_eq!(args.policy, Some(LookupPolicy::BestOfSubtree));
                assert_eq!(args.packages, vec!["numpy==1.25.2", "six==1.16.0"]);
                assert!(args.manifest.is_none());
            }
            _ => panic!("expected Lookup command"),
        }
    }

    #[test]
    fn cli_lookup_needs_packages_or_manifest() {
        let result = Cli::try_parse_from([
            "zygote", "lookup", "--tree", "t.json", "--costs", "c.json",
        ]);
        assert!(result.is_err());

        let cli = Cli::try_parse_from([
            "zygote", "lookup", "--tree", "t.json", "--costs", "c.json", "-m", "req.txt",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Lookup(args) if args.packages.is_empty()));
    }

    #[test]
    fn cli_parses_replay() {
        let cli = Cli::parse_from([
            "zygote",
            "replay",
            "a.json",
            "b.json",
            "--workload",
            "w.json",
            "--costs",
            "c.json",
            "--save-trees",
            "out",
            "--format",
            "json",
        ]);
        match cli.command {
            Commands::Replay(args) => {
                assert_eq!(args.trees.len(), 2);
                assert!(args.policy.is_none());
                assert_eq!(args.save_trees, Some(PathBuf::from("out")));
                assert!(matches!(args.format, OutputFormat::Json));
            }
            _ => panic!("expected Replay command"),
        }
    }

    #[test]
    fn cli_parses_top_count() {
        let cli = Cli::parse_from(["zygote", "top", "-n", "3", "a.txt", "b.txt"]);
        match cli.command {
            Commands::Top(args) => {
                assert_eq!(args.count, 3);
                assert_eq!(args.manifests.len(), 2);
            }
            _ => panic!("expected Top command"),
        }
    }

    #[test]
    fn cli_parses_config_set() {
        let cli = Cli::parse_from(["zygote", "config", "set", "simulation.fork_ms", "1.5"]);
        match cli.command {
            Commands::Config(ConfigArgs {
                action: Some(ConfigAction::Set { key, value }),
            }) => {
                assert_eq!(key, "simulation.fork_ms");
                assert_eq!(value, "1.5");
            }
            _ => panic!("expected Config set command"),
        }
    }

    #[test]
    fn cli_verbose_levels() {
        let cli = Cli::parse_from(["zygote", "config", "path"]);
        assert_eq!(cli.verbose, 0);

        let cli = Cli::parse_from(["zygote", "-v", "config", "path"]);
        assert_eq!(cli.verbose, 1);

        let cli = Cli::parse_from(["zygote", "-vv", "config", "path"]);
        assert_eq!(cli.verbose, 2);
    }
}
