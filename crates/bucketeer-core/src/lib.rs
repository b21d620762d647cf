//! Core library for bucketeer.
//!
//! Bucketeer classifies resource paths into named buckets of a catalog using
//! an ordered list of rules. Each rule pairs a path pattern with a group-name
//! template, an address policy, and a label set.
//!
//! # Modules
//!
//! - [`config`] - Configuration loading and rule definitions
//! - [`error`] - Error types and result aliases
//! - [`matcher`] - Wildcard, prefix, and regex path matching
//! - [`template`] - `%PATH%[n]` group-name expansion
//! - [`rules`] - Compiled rule sets and per-path evaluation
//! - [`catalog`] - The catalog abstraction and a JSON-backed implementation
//! - [`group`] - Group-to-bucket resolution
//! - [`reconcile`] - Entry upsert with address and label policy
//! - [`batch`] - Batch orchestration
//! - [`report`] - Batch report types
//!
//! # Quick Start
//!
//! ```no_run
//! use bucketeer_core::{BatchPolicy, ConfigLoader, MemoryCatalog, RuleSet, process_batch};
//!
//! let (config, _sources) = ConfigLoader::new()
//!     .with_user_config(true)
//!     .load()
//!     .expect("Failed to load configuration");
//!
//! let rules = RuleSet::compile(&config.rules);
//! let path = config.catalog.clone().unwrap_or_else(|| "bucketeer-catalog.json".into());
//! let mut catalog = MemoryCatalog::open(&path).expect("Failed to open catalog");
//! let report = process_batch(
//!     &mut catalog,
//!     &rules,
//!     &BatchPolicy::from(&config),
//!     &["Assets/Art/hero.png"],
//! )
//! .expect("Batch failed");
//!
//! println!("registered {} entries", report.reconciled);
//! ```
#![deny(unsafe_code)]

pub mod batch;
pub mod catalog;
pub mod config;
pub mod error;
pub mod group;
pub mod matcher;
pub mod reconcile;
pub mod report;
pub mod rules;
pub mod template;

pub use batch::{BatchPolicy, process_batch};
pub use catalog::{Bucket, Catalog, DEFAULT_BUCKET_NAME, Entry, MemoryCatalog};
pub use config::{Config, ConfigLoader, LogLevel, MatchKind, Rule};
pub use error::{
    BatchError, BatchResult, CatalogError, CatalogResult, ConfigError, ConfigResult,
    PatternError, PipelineError, TemplateError, TemplateResult,
};
pub use group::{GroupLookup, GroupResolution, resolve_group};
pub use matcher::PatternMatcher;
pub use reconcile::reconcile_entry;
pub use report::{BatchReport, Diagnostic, ReconciledEntry};
pub use rules::{CompiledRule, MatchOutcome, RuleSet};
