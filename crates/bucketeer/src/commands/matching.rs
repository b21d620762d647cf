//! Match command: dry-run a path against the configured rules.

use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use bucketeer_core::config::Config;
use bucketeer_core::rules::{MatchOutcome, RuleSet};

/// Arguments for the `match` subcommand.
#[derive(Args, Debug)]
pub struct MatchArgs {
    /// Resource path to test.
    pub path: String,
}

#[derive(Serialize)]
struct RuleFailure {
    rule: usize,
    kind: &'static str,
    message: String,
}

#[derive(Serialize)]
struct MatchReport {
    path: String,
    matches: Vec<MatchOutcome>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    failures: Vec<RuleFailure>,
}

fn evaluate(path: &str, config: &Config) -> MatchReport {
    let rules = RuleSet::compile(&config.rules);
    let mut matches = Vec::new();
    let mut failures = Vec::new();
    for result in rules.evaluate(path) {
        match result {
            Ok(outcome) => matches.push(outcome),
            Err((rule, err)) => failures.push(RuleFailure {
                rule,
                kind: err.kind(),
                message: err.to_string(),
            }),
        }
    }
    MatchReport {
        path: path.to_string(),
        matches,
        failures,
    }
}

/// Show every rule that matches a path and the group it would land in.
#[instrument(name = "cmd_match", skip_all, fields(path = %args.path))]
pub fn cmd_match(args: MatchArgs, global_json: bool, config: &Config) -> anyhow::Result<()> {
    debug!(rules = config.rules.len(), "executing match command");
    let report = evaluate(&args.path, config);

    if global_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", report.path.bold());
    if report.matches.is_empty() && report.failures.is_empty() {
        println!("  {} no rules match", "SKIP:".dimmed());
        return Ok(());
    }
    for m in &report.matches {
        let group = if m.group.trim().is_empty() {
            "(default group)".dimmed().to_string()
        } else {
            m.group.cyan().to_string()
        };
        print!("  {} rule {} {} -> {}", "MATCH:".green(), m.rule, m.pattern.dimmed(), group);
        if let Some(ref hint) = m.address_hint {
            print!(" as {}", hint.bold());
        }
        println!();
    }
    for f in &report.failures {
        println!("  {} rule {} {}", "FAIL:".red(), f.rule, f.message);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bucketeer_core::config::{MatchKind, Rule};

    fn config() -> Config {
        Config {
            rules: vec![
                Rule {
                    pattern: "Assets/Art".to_string(),
                    group: "Art-%PATH%[2]".to_string(),
                    simplify_address: true,
                    ..Rule::default()
                },
                Rule {
                    pattern: "[".to_string(),
                    match_kind: MatchKind::Regex,
                    ..Rule::default()
                },
            ],
            ..Config::default()
        }
    }

    #[test]
    fn evaluate_reports_matches_and_failures() {
        let report = evaluate("Assets/Art/Heroes/knight.png", &config());
        assert_eq!(report.matches.len(), 1);
        assert_eq!(report.matches[0].group, "Art-Heroes");
        assert_eq!(report.matches[0].address_hint.as_deref(), Some("knight"));
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].kind, "pattern-compile");
    }

    #[test]
    fn cmd_match_json_succeeds() {
        let args = MatchArgs {
            path: "Assets/Art/x.png".to_string(),
        };
        assert!(cmd_match(args, true, &config()).is_ok());
    }

    #[test]
    fn cmd_match_without_rules_succeeds() {
        let args = MatchArgs {
            path: "anything".to_string(),
        };
        assert!(cmd_match(args, false, &Config::default()).is_ok());
    }
}
