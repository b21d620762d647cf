//! Resolve a group name to a bucket, creating it when allowed.

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::error::PipelineError;

/// How a bucket was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum GroupLookup {
    /// The name was blank, so the catalog's default bucket was used.
    Default,
    /// An existing bucket had the name.
    Found,
    /// No bucket had the name and one was created.
    Created,
}

/// Result of resolving a group name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupResolution {
    /// Name of the bucket to register into.
    pub bucket: String,
    /// How the bucket was obtained.
    pub lookup: GroupLookup,
}

/// Map `name` to a bucket in `catalog`.
///
/// A blank name selects the default bucket. Otherwise the trimmed name must
/// match an existing bucket exactly; if none does, a bucket is created with
/// the default bucket's schema when `allow_create` is set, and
/// [`PipelineError::GroupNotFound`] is returned when it is not.
pub fn resolve_group<C: Catalog + ?Sized>(
    catalog: &mut C,
    name: &str,
    allow_create: bool,
) -> Result<GroupResolution, PipelineError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Ok(GroupResolution {
            bucket: catalog.default_bucket().name.clone(),
            lookup: GroupLookup::Default,
        });
    }

    if let Some(bucket) = catalog.find_bucket(trimmed) {
        return Ok(GroupResolution {
            bucket: bucket.name.clone(),
            lookup: GroupLookup::Found,
        });
    }

    if !allow_create {
        return Err(PipelineError::GroupNotFound {
            name: trimmed.to_string(),
        });
    }

    let schema_source = catalog.default_bucket().name.clone();
    let created = catalog.create_bucket(trimmed, &schema_source)?;
    tracing::info!(bucket = %created.name, "created group");
    Ok(GroupResolution {
        bucket: created.name.clone(),
        lookup: GroupLookup::Created,
    })
}
