//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::{ZygoteError, ZygoteResult};
use crate::eval::LookupPolicy;
use crate::ui::{self, UiContext};
use clap::ValueEnum;

const VALID_KEYS: &[&str] = &[
    "general.log_format",
    "simulation.fork_ms",
    "simulation.cold_start_ms",
    "simulation.policy",
    "manifest.unsafe_sentinel",
    "manifest.url_blacklist",
];

/// Execute the config command
pub async fn execute(args: ConfigArgs, config: &Config, manager: &ConfigManager) -> ZygoteResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
        Some(ConfigAction::Set { key, value }) => {
            let mut config = config.clone();
            set_value(&mut config, &key, &value)?;
            manager.save(&config).await?;
            ui::step_ok(&UiContext::detect(), &format!("Set {} = {}", key, value));
        }
    }

    Ok(())
}

fn show_config(config: &Config) -> ZygoteResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool) -> ZygoteResult<()> {
    let ctx = UiContext::detect();
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn_hint(
            &ctx,
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    ui::step_ok_detail(
        &ctx,
        "Configuration initialized",
        &path.display().to_string(),
    );

    Ok(())
}

/// Apply a dot-separated key to `config`
fn set_value(config: &mut Config, key: &str, value: &str) -> ZygoteResult<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "log_format"] => match value {
            "text" | "json" => config.general.log_format = value.to_string(),
            _ => {
                return Err(ZygoteError::User(format!(
                    "Invalid log format: {}. Use text or json",
                    value
                )))
            }
        },
        ["simulation", "fork_ms"] => config.simulation.fork_ms = parse_ms(value)?,
        ["simulation", "cold_start_ms"] => config.simulation.cold_start_ms = parse_ms(value)?,
        ["simulation", "policy"] => {
            config.simulation.policy = LookupPolicy::from_str(value, true)
                .map_err(|_| ZygoteError::User(format!("Invalid policy: {}", value)))?
        }
        ["manifest", "unsafe_sentinel"] => config.manifest.unsafe_sentinel = value.to_string(),
        ["manifest", "url_blacklist"] => {
            config.manifest.url_blacklist = value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        _ => {
            return Err(ZygoteError::User(format!(
                "Unknown config key: {}. Valid keys: {}",
                key,
                VALID_KEYS.join(", ")
            )))
        }
    }

    Ok(())
}

fn parse_ms(value: &str) -> ZygoteResult<f64> {
    match value.parse::<f64>() {
        Ok(ms) if ms.is_finite() && ms >= 0.0 => Ok(ms),
        _ => Err(ZygoteError::User(format!(
            "Invalid duration: {}. Use a non-negative number of milliseconds",
            value
        ))),
    }
}
