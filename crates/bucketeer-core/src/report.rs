//! Batch report types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::catalog::Entry;
use crate::group::GroupLookup;

/// An entry registered by one rule during a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReconciledEntry {
    /// Resource path.
    pub path: String,
    /// Position of the matching rule in the rule set.
    pub rule: usize,
    /// Bucket the entry now belongs to.
    pub bucket: String,
    /// How the bucket was obtained.
    pub lookup: GroupLookup,
    /// Address after reconciliation.
    pub address: String,
    /// Labels after reconciliation, sorted.
    pub labels: Vec<String>,
}

impl ReconciledEntry {
    pub(crate) fn new(rule: usize, lookup: GroupLookup, entry: Entry) -> Self {
        Self {
            path: entry.id,
            rule,
            bucket: entry.bucket,
            lookup,
            address: entry.address,
            labels: entry.labels.into_iter().collect(),
        }
    }
}

/// A (path, rule) pair that did not produce an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Diagnostic {
    /// Resource path.
    pub path: String,
    /// Position of the rule in the rule set.
    pub rule: usize,
    /// The rule's pattern.
    pub pattern: String,
    /// Intended bucket, when the template resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Failure kind, e.g. `group-not-found`.
    pub kind: String,
    /// Human-readable message.
    pub message: String,
}

/// Summary of one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BatchReport {
    /// Number of paths in the batch.
    pub paths: usize,
    /// (path, rule) pairs whose pattern matched.
    pub matched: usize,
    /// Pairs that produced an entry.
    pub reconciled: usize,
    /// Pairs that failed, including pattern compile failures.
    pub failed: usize,
    /// Buckets created during the batch, in creation order.
    pub created_buckets: Vec<String>,
    /// Empty buckets removed after the batch.
    pub pruned_buckets: Vec<String>,
    /// Every entry registered, in processing order.
    pub entries: Vec<ReconciledEntry>,
    /// One record per failed pair.
    pub diagnostics: Vec<Diagnostic>,
    /// Whether the end-of-batch commit succeeded.
    pub committed: bool,
}

impl BatchReport {
    /// Returns `true` if no pair failed.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}
