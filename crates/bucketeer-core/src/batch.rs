//! Batch orchestration.
//!
//! For each path, every rule is tried in declaration order. A pair that
//! matches flows through template resolution, group resolution, and entry
//! reconciliation. Failures are scoped to their pair and recorded in the
//! report; catalog write failures additionally fail the batch once every
//! pair has been attempted. Empty buckets are pruned afterwards when the
//! policy asks for it, and the catalog is committed exactly once.

use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::{BatchError, BatchResult, CatalogError, PipelineError};
use crate::group::{GroupLookup, resolve_group};
use crate::reconcile::reconcile_entry;
use crate::report::{BatchReport, Diagnostic, ReconciledEntry};
use crate::rules::{CompiledRule, RuleSet};

/// Catalog-wide switches for a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPolicy {
    /// Create missing buckets instead of failing the pair.
    pub allow_group_creation: bool,
    /// Remove buckets with no entries after the batch.
    pub prune_empty_buckets: bool,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            allow_group_creation: true,
            prune_empty_buckets: false,
        }
    }
}

impl From<&Config> for BatchPolicy {
    fn from(config: &Config) -> Self {
        Self {
            allow_group_creation: config.allow_group_creation,
            prune_empty_buckets: config.prune_empty_buckets,
        }
    }
}

struct PairFailure {
    matched: bool,
    group: Option<String>,
    /// Bucket created for this pair before the failure.
    created: Option<String>,
    error: PipelineError,
}

impl PairFailure {
    const fn matched(group: Option<String>, error: PipelineError) -> Self {
        Self {
            matched: true,
            group,
            created: None,
            error,
        }
    }
}

/// Classify `paths` with `rules` and register them in `catalog`.
///
/// With no rules the batch does nothing: no entries, no pruning, no commit.
///
/// # Errors
///
/// Returns [`BatchError`] if the catalog rejected any write or the final
/// commit. The error carries the report of everything that was attempted.
#[tracing::instrument(skip_all, fields(paths = paths.len(), rules = rules.len()))]
pub fn process_batch<C, S>(
    catalog: &mut C,
    rules: &RuleSet,
    policy: &BatchPolicy,
    paths: &[S],
) -> BatchResult<BatchReport>
where
    C: Catalog + ?Sized,
    S: AsRef<str>,
{
    let mut report = BatchReport {
        paths: paths.len(),
        ..BatchReport::default()
    };

    if rules.is_empty() {
        tracing::debug!("no rules configured, nothing to do");
        return Ok(report);
    }

    let mut catalog_error: Option<CatalogError> = None;

    for path in paths {
        let path = path.as_ref();
        for rule in rules.iter() {
            match process_pair(catalog, rule, policy, path) {
                Ok(None) => {}
                Ok(Some(entry)) => {
                    report.matched += 1;
                    report.reconciled += 1;
                    if entry.lookup == GroupLookup::Created {
                        report.created_buckets.push(entry.bucket.clone());
                    }
                    if rule.rule().has_labels() {
                        tracing::info!(
                            path = %entry.path,
                            bucket = %entry.bucket,
                            labels = ?entry.labels,
                            "entry registered with labels"
                        );
                    } else {
                        tracing::info!(path = %entry.path, bucket = %entry.bucket, "entry registered");
                    }
                    report.entries.push(entry);
                }
                Err(failure) => {
                    if failure.matched {
                        report.matched += 1;
                    }
                    report.failed += 1;
                    if let Some(bucket) = failure.created {
                        report.created_buckets.push(bucket);
                    }
                    tracing::warn!(
                        path,
                        rule = rule.index(),
                        kind = failure.error.kind(),
                        error = %failure.error,
                        "rule failed for path"
                    );
                    report.diagnostics.push(Diagnostic {
                        path: path.to_string(),
                        rule: rule.index(),
                        pattern: rule.rule().pattern.clone(),
                        group: failure.group,
                        kind: failure.error.kind().to_string(),
                        message: failure.error.to_string(),
                    });
                    if let PipelineError::Catalog(e) = failure.error {
                        catalog_error.get_or_insert(e);
                    }
                }
            }
        }
    }

    if policy.prune_empty_buckets {
        report.pruned_buckets = catalog.remove_buckets_where(&mut |bucket| bucket.is_empty());
        if !report.pruned_buckets.is_empty() {
            tracing::info!(buckets = ?report.pruned_buckets, "pruned empty groups");
        }
    }

    match catalog.commit() {
        Ok(()) => report.committed = true,
        Err(e) => {
            tracing::error!(error = %e, "catalog commit failed");
            if catalog_error.is_none() {
                catalog_error = Some(e);
            }
        }
    }

    tracing::info!(
        matched = report.matched,
        reconciled = report.reconciled,
        failed = report.failed,
        "batch complete"
    );

    match catalog_error {
        Some(source) => Err(BatchError {
            source,
            report: Box::new(report),
        }),
        None => Ok(report),
    }
}

fn process_pair<C: Catalog + ?Sized>(
    catalog: &mut C,
    rule: &CompiledRule,
    policy: &BatchPolicy,
    path: &str,
) -> Result<Option<ReconciledEntry>, PairFailure> {
    let Some(outcome) = rule.evaluate(path).map_err(|error| PairFailure {
        matched: !matches!(error, PipelineError::PatternCompile(_)),
        group: None,
        created: None,
        error,
    })?
    else {
        return Ok(None);
    };

    let group = Some(outcome.group.clone());
    let resolution = resolve_group(catalog, &outcome.group, policy.allow_group_creation)
        .map_err(|error| PairFailure::matched(group.clone(), error))?;
    let entry = reconcile_entry(catalog, &resolution.bucket, path, rule.rule()).map_err(|error| {
        let mut failure = PairFailure::matched(group, error);
        if resolution.lookup == GroupLookup::Created {
            failure.created = Some(resolution.bucket.clone());
        }
        failure
    })?;

    Ok(Some(ReconciledEntry::new(
        rule.index(),
        resolution.lookup,
        entry,
    )))
}
