//! Error types for bucketeer-core.

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::report::BatchReport;

/// Errors that can occur when working with configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),

    /// Configuration file not found after searching all locations.
    #[error("no configuration file found")]
    NotFound,
}

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// A rule pattern that could not be compiled.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid pattern `{pattern}`: {message}")]
pub struct PatternError {
    /// The pattern as written in the rule.
    pub pattern: String,
    /// Compiler message from the regex engine.
    pub message: String,
}

/// Errors raised while expanding a group template.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// A nonzero placeholder index was applied to a path with a single segment.
    ///
    /// Wrapping by a segment span of zero never converges, so this is rejected
    /// up front.
    #[error("placeholder index {index} cannot wrap over single-segment path `{path}`")]
    IndexDegenerate {
        /// The placeholder index as written.
        index: i64,
        /// The path the template was evaluated against.
        path: String,
    },

    /// A placeholder index does not fit in a signed 64-bit integer.
    #[error("placeholder index `{raw}` is out of range")]
    IndexOutOfRange {
        /// The digits found between the brackets.
        raw: String,
    },
}

/// Result type alias using [`TemplateError`].
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors raised by a [`Catalog`](crate::catalog::Catalog) implementation.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The catalog rejected a mutation or could not be flushed.
    #[error("catalog write failed: {0}")]
    Write(String),

    /// The catalog file could not be read or written.
    #[error("catalog file {path}: {source}")]
    Io {
        /// Backing file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The catalog file is not valid catalog JSON.
    #[error("catalog file {path} is malformed: {source}")]
    Parse {
        /// Backing file.
        path: Utf8PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// A bucket referenced by name does not exist in the catalog.
    #[error("bucket `{0}` does not exist")]
    UnknownBucket(String),
}

/// Result type alias using [`CatalogError`].
pub type CatalogResult<T> = Result<T, CatalogError>;

/// A failure scoped to a single (path, rule) pair.
///
/// None of these abort a batch; the orchestrator records them as
/// diagnostics and moves on to the next pair.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The rule's regex pattern is malformed.
    #[error(transparent)]
    PatternCompile(#[from] PatternError),

    /// The group template could not be resolved against the path.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// The target bucket does not exist and group creation is disabled.
    #[error("group `{name}` not found and group creation is disabled")]
    GroupNotFound {
        /// The trimmed bucket name that was looked up.
        name: String,
    },

    /// The catalog refused an upsert or bucket creation.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl PipelineError {
    /// Stable machine-readable name for the failure kind.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::PatternCompile(_) => "pattern-compile",
            Self::Template(TemplateError::IndexDegenerate { .. }) => "template-index-degenerate",
            Self::Template(TemplateError::IndexOutOfRange { .. }) => "template-index-out-of-range",
            Self::GroupNotFound { .. } => "group-not-found",
            Self::Catalog(_) => "catalog-write",
        }
    }

    /// Returns `true` if the failure came from the catalog rather than from rule
    /// evaluation.
    pub const fn is_catalog_write(&self) -> bool {
        matches!(self, Self::Catalog(_))
    }
}

/// Batch-level failure.
///
/// Raised only after every (path, rule) pair has been attempted. The partial
/// report is carried along so callers can still show what happened.
#[derive(Error, Debug)]
#[error("batch finished with catalog failures: {source}")]
pub struct BatchError {
    /// The first catalog error encountered (or the commit failure).
    pub source: CatalogError,
    /// Everything the batch managed to do before failing.
    pub report: Box<BatchReport>,
}

/// Result type alias using [`BatchError`].
pub type BatchResult<T> = Result<T, BatchError>;
