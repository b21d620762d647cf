//! Register a resource in its bucket and bring its metadata in line with the
//! rule that matched it.

use std::collections::BTreeSet;

use crate::catalog::{Catalog, Entry};
use crate::config::Rule;
use crate::error::PipelineError;

/// Upsert `resource` into `bucket` and apply `rule`'s address and labels.
///
/// - The entry is created, or moved if it lives in another bucket.
/// - With `simplify_address`, an address that is empty or still equal to the
///   full resource path becomes the file name without its extension. A custom
///   address is left alone.
/// - The label set is replaced by the rule's labels.
///
/// Running this twice with the same inputs leaves the catalog unchanged.
pub fn reconcile_entry<C: Catalog + ?Sized>(
    catalog: &mut C,
    bucket: &str,
    resource: &str,
    rule: &Rule,
) -> Result<Entry, PipelineError> {
    let entry = catalog.upsert_entry(resource, bucket)?;
    let mut edited = false;

    if rule.simplify_address && address_is_unset(&entry.address, resource) {
        let address = simplified_address(resource);
        if entry.address != address {
            entry.address = address;
            edited = true;
        }
    }

    let labels: BTreeSet<String> = rule.labels.iter().cloned().collect();
    if entry.labels != labels {
        entry.labels = labels;
        edited = true;
    }

    let entry = entry.clone();
    if edited {
        catalog.mark_dirty();
    }
    Ok(entry)
}

/// Last `/` segment of `resource` without its final extension.
///
/// `Assets/Art/hero.png` becomes `hero`, `a/archive.tar.gz` becomes
/// `archive.tar`. Only `/` separates segments, so a trailing `/` leaves an
/// empty name and a leading dot (`.gitignore`) is not an extension.
pub fn simplified_address(resource: &str) -> String {
    let name = resource.rsplit('/').next().unwrap_or(resource);
    match name.rfind('.') {
        Some(dot) if dot > 0 => name[..dot].to_string(),
        _ => name.to_string(),
    }
}

fn address_is_unset(address: &str, resource: &str) -> bool {
    address.is_empty() || address == resource
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{DEFAULT_BUCKET_NAME, MemoryCatalog};

    fn rule(labels: &[&str], simplify: bool) -> Rule {
        Rule {
            pattern: "Assets".to_string(),
            simplify_address: simplify,
            labels: labels.iter().map(|s| (*s).to_string()).collect(),
            ..Rule::default()
        }
    }

    #[test]
    fn new_entry_keeps_full_path_without_simplify() {
        let mut catalog = MemoryCatalog::new();
        let entry =
            reconcile_entry(&mut catalog, DEFAULT_BUCKET_NAME, "Assets/hero.png", &rule(&[], false))
                .unwrap();
        assert_eq!(entry.address, "Assets/hero.png");
    }

    #[test]
    fn simplify_replaces_default_address() {
        let mut catalog = MemoryCatalog::new();
        let entry =
            reconcile_entry(&mut catalog, DEFAULT_BUCKET_NAME, "Assets/hero.png", &rule(&[], true))
                .unwrap();
        assert_eq!(entry.address, "hero");
    }

    #[test]
    fn simplify_replaces_empty_address() {
        let mut catalog = MemoryCatalog::new();
        catalog
            .upsert_entry("Assets/hero.png", DEFAULT_BUCKET_NAME)
            .unwrap()
            .address
            .clear();

        let entry =
            reconcile_entry(&mut catalog, DEFAULT_BUCKET_NAME, "Assets/hero.png", &rule(&[], true))
                .unwrap();
        assert_eq!(entry.address, "hero");
    }

    #[test]
    fn simplify_keeps_custom_address() {
        let mut catalog = MemoryCatalog::new();
        catalog
            .upsert_entry("Assets/hero.png", DEFAULT_BUCKET_NAME)
            .unwrap()
            .address = "characters/hero".to_string();

        let entry =
            reconcile_entry(&mut catalog, DEFAULT_BUCKET_NAME, "Assets/hero.png", &rule(&[], true))
                .unwrap();
        assert_eq!(entry.address, "characters/hero");
    }

    #[test]
    fn labels_are_replaced_not_merged() {
        let mut catalog = MemoryCatalog::new();
        let path = "Assets/hero.png";
        reconcile_entry(&mut catalog, DEFAULT_BUCKET_NAME, path, &rule(&["A", "B"], false)).unwrap();

        let entry =
            reconcile_entry(&mut catalog, DEFAULT_BUCKET_NAME, path, &rule(&["C"], false)).unwrap();
        assert_eq!(entry.labels.iter().collect::<Vec<_>>(), vec!["C"]);
        assert_eq!(catalog.entry(path).unwrap().labels.len(), 1);
    }

    #[test]
    fn duplicate_labels_collapse() {
        let mut catalog = MemoryCatalog::new();
        let entry = reconcile_entry(
            &mut catalog,
            DEFAULT_BUCKET_NAME,
            "Assets/x",
            &rule(&["ui", "ui", "hd"], false),
        )
        .unwrap();
        assert_eq!(entry.labels.len(), 2);
    }

    #[test]
    fn reconcile_is_idempotent() {
        let mut catalog = MemoryCatalog::new();
        let r = rule(&["art"], true);
        let first = reconcile_entry(&mut catalog, DEFAULT_BUCKET_NAME, "Assets/a.png", &r).unwrap();
        let before = catalog.state().clone();
        let second = reconcile_entry(&mut catalog, DEFAULT_BUCKET_NAME, "Assets/a.png", &r).unwrap();
        assert_eq!(first, second);
        assert_eq!(&before, catalog.state());
    }

    #[test]
    fn unknown_bucket_surfaces_catalog_error() {
        let mut catalog = MemoryCatalog::new();
        let err = reconcile_entry(&mut catalog, "Nope", "Assets/a.png", &rule(&[], false))
            .unwrap_err();
        assert!(err.is_catalog_write());
    }

    #[test]
    fn simplified_address_strips_last_extension() {
        assert_eq!(simplified_address("Assets/Art/hero.png"), "hero");
        assert_eq!(simplified_address("a/archive.tar.gz"), "archive.tar");
        assert_eq!(simplified_address("Makefile"), "Makefile");
        assert_eq!(simplified_address("dir/noext"), "noext");
    }

    #[test]
    fn simplified_address_splits_on_slash_only() {
        assert_eq!(simplified_address("Assets/Art/"), "");
        assert_eq!(simplified_address(r"Assets\Art\hero.png"), r"Assets\Art\hero");
        assert_eq!(simplified_address("Assets/.gitignore"), ".gitignore");
        assert_eq!(simplified_address("Assets/v1.2/readme"), "readme");
    }

    #[test]
    fn reapplying_same_rule_leaves_catalog_clean() {
        let mut catalog = MemoryCatalog::new();
        let r = rule(&["art"], true);
        reconcile_entry(&mut catalog, DEFAULT_BUCKET_NAME, "Assets/a.png", &r).unwrap();
        catalog.commit().unwrap();

        reconcile_entry(&mut catalog, DEFAULT_BUCKET_NAME, "Assets/a.png", &r).unwrap();
        assert!(!catalog.is_dirty());

        reconcile_entry(&mut catalog, DEFAULT_BUCKET_NAME, "Assets/a.png", &rule(&["ui"], true))
            .unwrap();
        assert!(catalog.is_dirty());
    }
}
