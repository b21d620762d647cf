//! The catalog that owns buckets and entries.
//!
//! The classification engine never stores state of its own. Everything it
//! learns is written through the [`Catalog`] trait, and the host decides where
//! that ends up. [`MemoryCatalog`] is the bundled implementation: an in-memory
//! store that can be bound to a JSON file and flushed on [`Catalog::commit`].
//!
//! Callers must give the engine exclusive access to a catalog for the length
//! of a batch; nothing here takes locks.

use std::collections::{BTreeMap, BTreeSet};

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};

/// A named group of entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    /// Unique, case-sensitive name.
    pub name: String,
    /// Opaque group settings, copied from the default bucket on creation.
    #[serde(default)]
    pub schema: serde_json::Value,
    /// Ids of the entries currently assigned here.
    #[serde(default)]
    pub entries: BTreeSet<String>,
}

impl Bucket {
    /// Returns `true` if no entry is assigned to this bucket.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A resource registered in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Resource identifier (the path).
    pub id: String,
    /// Name of the owning bucket.
    pub bucket: String,
    /// Display address. New entries start with the full resource path.
    pub address: String,
    /// Labels, kept sorted and unique.
    #[serde(default)]
    pub labels: BTreeSet<String>,
}

/// Storage operations the classification engine relies on.
pub trait Catalog {
    /// Look up a bucket by exact name.
    fn find_bucket(&self, name: &str) -> Option<&Bucket>;

    /// The bucket used when a rule resolves to an empty group name.
    fn default_bucket(&self) -> &Bucket;

    /// Create a bucket named `name` whose schema is copied from the bucket
    /// named `schema_source`.
    fn create_bucket(&mut self, name: &str, schema_source: &str) -> CatalogResult<&Bucket>;

    /// Remove every bucket for which `predicate` returns `true`, returning the
    /// removed names.
    fn remove_buckets_where(&mut self, predicate: &mut dyn FnMut(&Bucket) -> bool) -> Vec<String>;

    /// Create the entry for `resource` in `bucket`, or move it there if it
    /// already lives elsewhere.
    ///
    /// Only a new entry or a move counts as a pending change. Callers that
    /// edit the returned entry must report it with [`Catalog::mark_dirty`].
    fn upsert_entry(&mut self, resource: &str, bucket: &str) -> CatalogResult<&mut Entry>;

    /// Record that an entry was edited in place.
    fn mark_dirty(&mut self);

    /// Flush all pending mutations as one batch.
    fn commit(&mut self) -> CatalogResult<()>;
}

/// Name of the default bucket in a fresh [`MemoryCatalog`].
pub const DEFAULT_BUCKET_NAME: &str = "Default";

/// Persisted part of a [`MemoryCatalog`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogState {
    /// Name of the default bucket.
    pub default_bucket: String,
    /// Buckets in creation order.
    pub buckets: Vec<Bucket>,
    /// Entries keyed by resource id.
    #[serde(default)]
    pub entries: BTreeMap<String, Entry>,
}

impl Default for CatalogState {
    fn default() -> Self {
        Self {
            default_bucket: DEFAULT_BUCKET_NAME.to_string(),
            buckets: vec![Bucket {
                name: DEFAULT_BUCKET_NAME.to_string(),
                schema: serde_json::json!({}),
                entries: BTreeSet::new(),
            }],
            entries: BTreeMap::new(),
        }
    }
}

/// In-memory catalog, optionally backed by a JSON file.
///
/// The default bucket is never removed by [`Catalog::remove_buckets_where`].
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    state: CatalogState,
    path: Option<Utf8PathBuf>,
    dirty: bool,
    commits: usize,
}

impl MemoryCatalog {
    /// Create an empty catalog holding only the default bucket.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty catalog whose default bucket has the given name and
    /// schema.
    pub fn with_default_bucket(name: &str, schema: serde_json::Value) -> Self {
        Self {
            state: CatalogState {
                default_bucket: name.to_string(),
                buckets: vec![Bucket {
                    name: name.to_string(),
                    schema,
                    entries: BTreeSet::new(),
                }],
                entries: BTreeMap::new(),
            },
            ..Self::default()
        }
    }

    /// Open the catalog stored at `path`.
    ///
    /// A missing file yields a fresh catalog that will be written to `path` on
    /// the first commit.
    #[tracing::instrument]
    pub fn open(path: &Utf8Path) -> CatalogResult<Self> {
        if !path.exists() {
            tracing::debug!("catalog file missing, starting fresh");
            return Ok(Self {
                path: Some(path.to_path_buf()),
                ..Self::default()
            });
        }

        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let state: CatalogState =
            serde_json::from_str(&raw).map_err(|source| CatalogError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        if !state.buckets.iter().any(|b| b.name == state.default_bucket) {
            return Err(CatalogError::UnknownBucket(state.default_bucket));
        }

        tracing::debug!(
            buckets = state.buckets.len(),
            entries = state.entries.len(),
            "catalog loaded"
        );
        Ok(Self {
            state,
            path: Some(path.to_path_buf()),
            dirty: false,
            commits: 0,
        })
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Utf8Path> {
        self.path.as_deref()
    }

    /// The persisted state.
    pub const fn state(&self) -> &CatalogState {
        &self.state
    }

    /// All buckets in creation order.
    pub fn buckets(&self) -> &[Bucket] {
        &self.state.buckets
    }

    /// Look up an entry by resource id.
    pub fn entry(&self, id: &str) -> Option<&Entry> {
        self.state.entries.get(id)
    }

    /// Iterate over all entries, ordered by resource id.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.state.entries.values()
    }

    /// Number of commits that actually flushed changes.
    pub const fn commit_count(&self) -> usize {
        self.commits
    }

    /// Returns `true` if there are mutations not yet committed.
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn bucket_mut(&mut self, name: &str) -> CatalogResult<&mut Bucket> {
        self.state
            .buckets
            .iter_mut()
            .find(|b| b.name == name)
            .ok_or_else(|| CatalogError::UnknownBucket(name.to_string()))
    }

    fn write_to(&self, path: &Utf8Path) -> CatalogResult<()> {
        let io_err = |source: std::io::Error| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        };
        let json = serde_json::to_string_pretty(&self.state)
            .map_err(|e| CatalogError::Write(e.to_string()))?;

        // Rename over the old file so readers never see a partial write.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json + "\n").map_err(io_err)?;
        std::fs::rename(&tmp, path).map_err(io_err)
    }
}

impl Catalog for MemoryCatalog {
    fn find_bucket(&self, name: &str) -> Option<&Bucket> {
        self.state.buckets.iter().find(|b| b.name == name)
    }

    fn default_bucket(&self) -> &Bucket {
        // `open` and the constructors guarantee the default bucket exists and
        // `remove_buckets_where` never removes it.
        self.state
            .buckets
            .iter()
            .find(|b| b.name == self.state.default_bucket)
            .unwrap_or(&self.state.buckets[0])
    }

    fn create_bucket(&mut self, name: &str, schema_source: &str) -> CatalogResult<&Bucket> {
        if self.find_bucket(name).is_some() {
            return Err(CatalogError::Write(format!("bucket `{name}` already exists")));
        }
        let schema = self
            .find_bucket(schema_source)
            .map(|b| b.schema.clone())
            .ok_or_else(|| CatalogError::UnknownBucket(schema_source.to_string()))?;

        self.state.buckets.push(Bucket {
            name: name.to_string(),
            schema,
            entries: BTreeSet::new(),
        });
        self.dirty = true;
        Ok(&self.state.buckets[self.state.buckets.len() - 1])
    }

    fn remove_buckets_where(&mut self, predicate: &mut dyn FnMut(&Bucket) -> bool) -> Vec<String> {
        let default = self.state.default_bucket.clone();
        let mut removed = Vec::new();
        self.state.buckets.retain(|b| {
            let drop = b.name != default && predicate(b);
            if drop {
                removed.push(b.name.clone());
            }
            !drop
        });

        if !removed.is_empty() {
            self.state
                .entries
                .retain(|_, entry| !removed.contains(&entry.bucket));
            self.dirty = true;
        }
        removed
    }

    fn upsert_entry(&mut self, resource: &str, bucket: &str) -> CatalogResult<&mut Entry> {
        let inserted = self.bucket_mut(bucket)?.entries.insert(resource.to_string());

        let current = self.state.entries.get(resource).map(|e| e.bucket.clone());
        if let Some(ref old) = current
            && old != bucket
        {
            // The old bucket may have been removed out from under the entry.
            if let Ok(old_bucket) = self.bucket_mut(old) {
                old_bucket.entries.remove(resource);
            }
        }

        if inserted || current.as_deref() != Some(bucket) {
            self.dirty = true;
        }
        let entry = self
            .state
            .entries
            .entry(resource.to_string())
            .or_insert_with(|| Entry {
                id: resource.to_string(),
                bucket: bucket.to_string(),
                address: resource.to_string(),
                labels: BTreeSet::new(),
            });
        entry.bucket = bucket.to_string();
        Ok(entry)
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn commit(&mut self) -> CatalogResult<()> {
        if !self.dirty {
            tracing::debug!("nothing to commit");
            return Ok(());
        }
        if let Some(ref path) = self.path {
            self.write_to(path)?;
            tracing::debug!(path = %path, "catalog written");
        }
        self.dirty = false;
        self.commits += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn utf8_dir(tmp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap()
    }

    #[test]
    fn fresh_catalog_has_default_bucket() {
        let catalog = MemoryCatalog::new();
        assert_eq!(catalog.default_bucket().name, DEFAULT_BUCKET_NAME);
        assert_eq!(catalog.buckets().len(), 1);
        assert!(!catalog.is_dirty());
    }

    #[test]
    fn create_bucket_copies_schema_from_source() {
        let schema = serde_json::json!({"packing": "separate"});
        let mut catalog = MemoryCatalog::with_default_bucket("Main", schema.clone());

        let created = catalog.create_bucket("Audio", "Main").unwrap();
        assert_eq!(created.name, "Audio");
        assert_eq!(created.schema, schema);
        assert!(created.is_empty());
    }

    #[test]
    fn create_bucket_rejects_duplicates() {
        let mut catalog = MemoryCatalog::new();
        catalog.create_bucket("Audio", DEFAULT_BUCKET_NAME).unwrap();
        assert!(catalog.create_bucket("Audio", DEFAULT_BUCKET_NAME).is_err());
    }

    #[test]
    fn bucket_lookup_is_case_sensitive() {
        let mut catalog = MemoryCatalog::new();
        catalog.create_bucket("Audio", DEFAULT_BUCKET_NAME).unwrap();
        assert!(catalog.find_bucket("Audio").is_some());
        assert!(catalog.find_bucket("audio").is_none());
    }

    #[test]
    fn upsert_creates_entry_with_full_path_address() {
        let mut catalog = MemoryCatalog::new();
        let entry = catalog.upsert_entry("Assets/a.png", DEFAULT_BUCKET_NAME).unwrap();
        assert_eq!(entry.address, "Assets/a.png");
        assert!(entry.labels.is_empty());
        assert!(catalog.default_bucket().entries.contains("Assets/a.png"));
    }

    #[test]
    fn upsert_moves_entry_between_buckets() {
        let mut catalog = MemoryCatalog::new();
        catalog.create_bucket("Art", DEFAULT_BUCKET_NAME).unwrap();
        catalog
            .upsert_entry("Assets/a.png", DEFAULT_BUCKET_NAME)
            .unwrap()
            .address = "hero".to_string();

        let moved = catalog.upsert_entry("Assets/a.png", "Art").unwrap();
        assert_eq!(moved.bucket, "Art");
        assert_eq!(moved.address, "hero");
        assert!(catalog.default_bucket().is_empty());
        assert!(catalog.find_bucket("Art").unwrap().entries.contains("Assets/a.png"));
        assert_eq!(catalog.entries().count(), 1);
    }

    #[test]
    fn upsert_into_unknown_bucket_fails() {
        let mut catalog = MemoryCatalog::new();
        let err = catalog.upsert_entry("a", "Missing").unwrap_err();
        assert!(matches!(err, CatalogError::UnknownBucket(name) if name == "Missing"));
        assert!(catalog.entry("a").is_none());
    }

    #[test]
    fn remove_buckets_where_keeps_default() {
        let mut catalog = MemoryCatalog::new();
        catalog.create_bucket("A", DEFAULT_BUCKET_NAME).unwrap();
        catalog.create_bucket("B", DEFAULT_BUCKET_NAME).unwrap();
        catalog.upsert_entry("x", "B").unwrap();

        let removed = catalog.remove_buckets_where(&mut |b| b.is_empty());
        assert_eq!(removed, vec!["A".to_string()]);
        assert!(catalog.find_bucket(DEFAULT_BUCKET_NAME).is_some());
        assert!(catalog.find_bucket("B").is_some());
    }

    #[test]
    fn removing_populated_bucket_drops_its_entries() {
        let mut catalog = MemoryCatalog::new();
        catalog.create_bucket("B", DEFAULT_BUCKET_NAME).unwrap();
        catalog.upsert_entry("x", "B").unwrap();

        catalog.remove_buckets_where(&mut |b| b.name == "B");
        assert!(catalog.entry("x").is_none());
    }

    #[test]
    fn commit_without_changes_is_noop() {
        let mut catalog = MemoryCatalog::new();
        catalog.commit().unwrap();
        assert_eq!(catalog.commit_count(), 0);

        catalog.upsert_entry("x", DEFAULT_BUCKET_NAME).unwrap();
        catalog.commit().unwrap();
        catalog.commit().unwrap();
        assert_eq!(catalog.commit_count(), 1);
    }

    #[test]
    fn upsert_of_unchanged_entry_is_not_a_change() {
        let mut catalog = MemoryCatalog::new();
        catalog.create_bucket("Art", DEFAULT_BUCKET_NAME).unwrap();
        catalog.upsert_entry("x", "Art").unwrap();
        catalog.commit().unwrap();

        catalog.upsert_entry("x", "Art").unwrap();
        assert!(!catalog.is_dirty());

        catalog.upsert_entry("x", DEFAULT_BUCKET_NAME).unwrap();
        assert!(catalog.is_dirty());
    }

    #[test]
    fn open_missing_file_then_commit_writes_it() {
        let tmp = TempDir::new().unwrap();
        let path = utf8_dir(&tmp).join("catalog.json");

        let mut catalog = MemoryCatalog::open(&path).unwrap();
        catalog.create_bucket("Art", DEFAULT_BUCKET_NAME).unwrap();
        catalog.upsert_entry("Assets/a.png", "Art").unwrap();
        catalog.commit().unwrap();
        assert!(path.is_file());

        let reopened = MemoryCatalog::open(&path).unwrap();
        assert_eq!(reopened.state(), catalog.state());
        assert!(!reopened.is_dirty());
    }

    #[test]
    fn commit_to_unwritable_location_fails() {
        let tmp = TempDir::new().unwrap();
        let path = utf8_dir(&tmp).join("missing-dir").join("catalog.json");

        let mut catalog = MemoryCatalog::open(&path).unwrap();
        catalog.upsert_entry("x", DEFAULT_BUCKET_NAME).unwrap();
        let err = catalog.commit().unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
        assert!(catalog.is_dirty());
    }

    #[test]
    fn open_rejects_malformed_json() {
        let tmp = TempDir::new().unwrap();
        let path = utf8_dir(&tmp).join("catalog.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = MemoryCatalog::open(&path).unwrap_err();
        assert!(matches!(err, CatalogError::Parse { .. }));
    }

    #[test]
    fn open_rejects_missing_default_bucket() {
        let tmp = TempDir::new().unwrap();
        let path = utf8_dir(&tmp).join("catalog.json");
        std::fs::write(&path, r#"{"default_bucket": "Main", "buckets": []}"#).unwrap();

        let err = MemoryCatalog::open(&path).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownBucket(name) if name == "Main"));
    }
}
