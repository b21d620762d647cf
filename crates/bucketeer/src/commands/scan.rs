//! Scan command: classify resource paths and register them in a catalog.

use std::io::IsTerminal;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tracing::{debug, instrument};

use bucketeer_core::batch::{BatchPolicy, process_batch};
use bucketeer_core::catalog::MemoryCatalog;
use bucketeer_core::config::Config;
use bucketeer_core::group::GroupLookup;
use bucketeer_core::report::BatchReport;
use bucketeer_core::rules::RuleSet;

use super::collect_paths;

/// Catalog file used when neither `--catalog` nor the config names one.
pub const DEFAULT_CATALOG_FILE: &str = "bucketeer-catalog.json";

/// Arguments for the `scan` subcommand.
#[derive(Args, Debug, Default)]
pub struct ScanArgs {
    /// Resource paths to classify (reads one per line from stdin when omitted or `-`)
    pub paths: Vec<String>,

    /// Catalog file to update (created if missing)
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<Utf8PathBuf>,

    /// Create groups that do not exist yet
    #[arg(long, overrides_with = "no_group_creation")]
    pub allow_group_creation: bool,

    /// Fail a rule instead of creating a missing group
    #[arg(long, overrides_with = "allow_group_creation")]
    pub no_group_creation: bool,

    /// Remove every empty group after the batch
    #[arg(long)]
    pub prune_empty: bool,
}

impl ScanArgs {
    fn policy(&self, config: &Config) -> BatchPolicy {
        let mut policy = BatchPolicy::from(config);
        if self.allow_group_creation {
            policy.allow_group_creation = true;
        }
        if self.no_group_creation {
            policy.allow_group_creation = false;
        }
        if self.prune_empty {
            policy.prune_empty_buckets = true;
        }
        policy
    }

    fn catalog_path(&self, config: &Config) -> Utf8PathBuf {
        self.catalog
            .clone()
            .or_else(|| config.catalog.clone())
            .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_CATALOG_FILE))
    }
}

/// Classify paths and register them in the catalog.
///
/// Exits non-zero when the catalog rejected a write. Rule-level failures are
/// reported but do not change the exit status.
#[instrument(name = "cmd_scan", skip_all, fields(paths = args.paths.len()))]
pub fn cmd_scan(args: ScanArgs, global_json: bool, config: &Config) -> anyhow::Result<()> {
    let paths = collect_paths(&args.paths, std::io::stdin().lock())?;
    let policy = args.policy(config);
    let catalog_path = args.catalog_path(config);
    debug!(
        catalog = %catalog_path,
        paths = paths.len(),
        allow_group_creation = policy.allow_group_creation,
        prune_empty_buckets = policy.prune_empty_buckets,
        "executing scan command"
    );

    if config.rules.is_empty() && !global_json {
        println!("{} no rules configured", "SKIP:".dimmed());
    }

    let mut catalog = MemoryCatalog::open(&catalog_path)
        .with_context(|| format!("failed to open catalog {catalog_path}"))?;
    let rules = RuleSet::compile(&config.rules);

    let spinner = spinner(global_json, paths.len());
    let result = process_batch(&mut catalog, &rules, &policy, &paths);
    spinner.finish_and_clear();

    let (report, failure) = match result {
        Ok(report) => (report, None),
        Err(err) => {
            let report = *err.report;
            (report, Some(err.source))
        }
    };

    if global_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, &catalog_path);
    }

    if let Some(source) = failure {
        return Err(anyhow::Error::new(source).context(format!(
            "catalog {catalog_path} rejected changes; {} of {} rule matches were registered",
            report.reconciled, report.matched
        )));
    }
    Ok(())
}

fn spinner(global_json: bool, paths: usize) -> ProgressBar {
    if global_json || paths < 2 || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.set_message(format!("Classifying {paths} paths"));
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}

fn print_report(report: &BatchReport, catalog_path: &Utf8Path) {
    for entry in &report.entries {
        let bucket = match entry.lookup {
            GroupLookup::Created => format!("{} {}", entry.bucket, "(new)".green()),
            _ => entry.bucket.clone(),
        };
        print!("{} {} -> {}", "OK:".green(), entry.path, bucket.cyan());
        if entry.address != entry.path {
            print!(" as {}", entry.address.bold());
        }
        if !entry.labels.is_empty() {
            print!(" [{}]", entry.labels.join(", ").dimmed());
        }
        println!();
    }

    for diag in &report.diagnostics {
        println!(
            "{} {} (rule {}: {}) {}",
            "FAIL:".red(),
            diag.path,
            diag.rule,
            diag.pattern.dimmed(),
            diag.message
        );
    }

    for bucket in &report.pruned_buckets {
        println!("{} removed empty group {}", "PRUNE:".yellow(), bucket.cyan());
    }

    println!();
    println!(
        "{} paths, {} matches, {} registered, {} failed",
        report.paths,
        report.matched,
        report.reconciled.to_string().green(),
        if report.failed > 0 {
            report.failed.to_string().red().to_string()
        } else {
            report.failed.to_string()
        }
    );
    if report.committed {
        println!("{}: {}", "Catalog".dimmed(), catalog_path.cyan());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bucketeer_core::config::Rule;

    #[test]
    fn flags_override_config_policy() {
        let config = Config {
            allow_group_creation: true,
            prune_empty_buckets: false,
            ..Config::default()
        };
        let args = ScanArgs {
            no_group_creation: true,
            prune_empty: true,
            ..ScanArgs::default()
        };
        let policy = args.policy(&config);
        assert!(!policy.allow_group_creation);
        assert!(policy.prune_empty_buckets);
    }

    #[test]
    fn config_policy_used_without_flags() {
        let config = Config {
            allow_group_creation: false,
            ..Config::default()
        };
        let policy = ScanArgs::default().policy(&config);
        assert!(!policy.allow_group_creation);
        assert!(!policy.prune_empty_buckets);
    }

    #[test]
    fn catalog_path_precedence() {
        let mut config = Config::default();
        assert_eq!(
            ScanArgs::default().catalog_path(&config),
            DEFAULT_CATALOG_FILE
        );

        config.catalog = Some(Utf8PathBuf::from("from-config.json"));
        assert_eq!(
            ScanArgs::default().catalog_path(&config),
            "from-config.json"
        );

        let args = ScanArgs {
            catalog: Some(Utf8PathBuf::from("from-flag.json")),
            ..ScanArgs::default()
        };
        assert_eq!(args.catalog_path(&config), "from-flag.json");
    }

    #[test]
    fn scan_writes_catalog() {
        let tmp = tempfile::TempDir::new().unwrap();
        let catalog = Utf8PathBuf::try_from(tmp.path().join("cat.json")).unwrap();
        let config = Config {
            rules: vec![Rule {
                pattern: "Assets/*".to_string(),
                group: "%PATH%[1]".to_string(),
                ..Rule::default()
            }],
            ..Config::default()
        };
        let args = ScanArgs {
            paths: vec!["Assets/Art/a.png".to_string()],
            catalog: Some(catalog.clone()),
            ..ScanArgs::default()
        };

        cmd_scan(args, true, &config).unwrap();

        let reopened = MemoryCatalog::open(&catalog).unwrap();
        assert_eq!(reopened.entry("Assets/Art/a.png").unwrap().bucket, "Art");
    }
}
