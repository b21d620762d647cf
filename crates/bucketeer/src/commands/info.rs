//! Info command implementation

use bucketeer_core::config::{Config, ConfigSources};
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

/// Arguments for the `info` subcommand.
#[derive(Args, Debug, Default)]
pub struct InfoArgs {
    // No subcommand-specific arguments; uses global --json flag
}

#[derive(Serialize)]
struct PackageInfo {
    name: &'static str,
    version: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    description: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    repository: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    homepage: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    license: &'static str,
}

impl PackageInfo {
    const fn new() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            description: env!("CARGO_PKG_DESCRIPTION"),
            repository: env!("CARGO_PKG_REPOSITORY"),
            homepage: env!("CARGO_PKG_HOMEPAGE"),
            license: env!("CARGO_PKG_LICENSE"),
        }
    }
}

#[derive(Serialize)]
struct RuleInfo {
    pattern: String,
    match_kind: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    group: String,
    simplify_address: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    labels: Vec<String>,
}

#[derive(Serialize)]
struct ConfigInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    config_file: Option<String>,
    log_level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    catalog: Option<String>,
    allow_group_creation: bool,
    prune_empty_buckets: bool,
    rules: Vec<RuleInfo>,
}

impl ConfigInfo {
    fn from_config(config: &Config, sources: &ConfigSources) -> Self {
        let rules = config
            .rules
            .iter()
            .map(|r| RuleInfo {
                pattern: r.pattern.clone(),
                match_kind: r.match_kind.as_str(),
                group: r.group.clone(),
                simplify_address: r.simplify_address,
                labels: r.labels.clone(),
            })
            .collect();
        Self {
            config_file: sources.primary_file().map(|p| p.to_string()),
            log_level: config.log_level.as_str().to_string(),
            log_dir: config.log_dir.as_ref().map(|p| p.to_string()),
            catalog: config.catalog.as_ref().map(|p| p.to_string()),
            allow_group_creation: config.allow_group_creation,
            prune_empty_buckets: config.prune_empty_buckets,
            rules,
        }
    }
}

#[derive(Serialize)]
struct FullInfo {
    #[serde(flatten)]
    package: PackageInfo,
    config: ConfigInfo,
}

/// Print package information
///
/// # Arguments
/// * `global_json` - Global `--json` flag from CLI
/// * `config` - Loaded configuration
/// * `sources` - Config source metadata from loading
#[instrument(name = "cmd_info", skip_all, fields(json_output))]
pub fn cmd_info(
    _args: InfoArgs,
    global_json: bool,
    config: &Config,
    sources: &ConfigSources,
) -> anyhow::Result<()> {
    let info = PackageInfo::new();

    debug!(json_output = global_json, "executing info command");

    let config_info = ConfigInfo::from_config(config, sources);
    let full_info = FullInfo {
        package: info,
        config: config_info,
    };

    if global_json {
        println!("{}", serde_json::to_string_pretty(&full_info)?);
    } else {
        println!(
            "{} {}",
            full_info.package.name.bold(),
            full_info.package.version.green()
        );
        if !full_info.package.description.is_empty() {
            println!("{}", full_info.package.description);
        }
        if !full_info.package.license.is_empty() {
            println!("{}: {}", "License".dimmed(), full_info.package.license);
        }
        if !full_info.package.repository.is_empty() {
            println!(
                "{}: {}",
                "Repository".dimmed(),
                full_info.package.repository.cyan()
            );
        }
        if !full_info.package.homepage.is_empty() {
            println!(
                "{}: {}",
                "Homepage".dimmed(),
                full_info.package.homepage.cyan()
            );
        }

        // Configuration section
        println!();
        println!("{}", "Configuration".bold().underline());
        if let Some(ref path) = full_info.config.config_file {
            println!("{}: {}", "Config file".dimmed(), path.cyan());
        } else {
            println!("{}: {}", "Config file".dimmed(), "none loaded".yellow());
        }
        println!("{}: {}", "Log level".dimmed(), full_info.config.log_level);
        if let Some(ref dir) = full_info.config.log_dir {
            println!("{}: {}", "Log directory".dimmed(), dir);
        }

        if let Some(ref catalog) = full_info.config.catalog {
            println!("{}: {}", "Catalog".dimmed(), catalog.cyan());
        }
        print_flag("Group creation", full_info.config.allow_group_creation);
        print_flag("Prune empty groups", full_info.config.prune_empty_buckets);

        println!();
        println!("{}", "Rules".bold().underline());
        if full_info.config.rules.is_empty() {
            println!("{}", "(none configured)".dimmed());
        }
        for (i, rule) in full_info.config.rules.iter().enumerate() {
            let group = if rule.group.is_empty() {
                "(default group)".dimmed().to_string()
            } else {
                rule.group.cyan().to_string()
            };
            print!("{:>3}. {} [{}] -> {}", i, rule.pattern, rule.match_kind, group);
            if rule.simplify_address {
                print!(" {}", "simplify".dimmed());
            }
            if !rule.labels.is_empty() {
                print!(" [{}]", rule.labels.join(", "));
            }
            println!();
        }
    }

    Ok(())
}

/// Print an on/off setting.
fn print_flag(label: &str, value: bool) {
    let shown = if value {
        "on".green().to_string()
    } else {
        "off".yellow().to_string()
    };
    println!("{}: {}", label.dimmed(), shown);
}
