// src/packages/mod.rs

//! Package reference migration.
//!
//! Legacy projects track NuGet dependencies in a side-car lock file
//! (`packages.config`); modern projects declare `PackageReference` items in
//! the descriptor itself. This module folds the side-car into the tree:
//! reading the lock goes through the [`PackageLockReader`] boundary so
//! parsing and I/O stay outside the engine.

use std::path::Path;

use tracing::{debug, info};

use crate::rules;
use crate::tree::{file_name, ItemGroup, ProjectItem, ProjectPart, ProjectRoot};
use crate::Result;

/// One dependency recorded in a package lock file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageEntry {
    pub id: String,
    pub version: String,
}

impl PackageEntry {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
        }
    }
}

/// Boundary to the host's package lock parsing
pub trait PackageLockReader {
    /// Read and parse the lock file at `path`
    fn read_package_lock(&self, path: &Path) -> Result<Vec<PackageEntry>>;
}

/// Reader for projects known to carry no package lock
///
/// Always reports an empty dependency set without touching the filesystem.
pub struct NoPackageLock;

impl PackageLockReader for NoPackageLock {
    fn read_package_lock(&self, _path: &Path) -> Result<Vec<PackageEntry>> {
        Ok(Vec::new())
    }
}

/// Add a package reference, replacing any existing reference to the same id
///
/// New references land in the first unconditioned group that already holds
/// package references; a fresh group is appended when none exists.
pub fn add_package(tree: &mut ProjectRoot, id: &str, version: &str) {
    for group in tree.item_groups_mut() {
        if let Some(existing) = group
            .items
            .iter_mut()
            .find(|i| i.is_type(rules::PACKAGE_REFERENCE) && i.path().eq_ignore_ascii_case(id))
        {
            debug!(package = id, version, "replacing existing package reference");
            existing.metadata.clear();
            existing
                .metadata
                .insert(rules::VERSION_METADATA.to_string(), version.to_string());
            return;
        }
    }
    debug!(package = id, version, "adding package reference");
    let item = ProjectItem::include(rules::PACKAGE_REFERENCE, id)
        .with_metadata(rules::VERSION_METADATA, version);
    ensure_package_group(tree).add(item);
}

/// Convert a package lock file into package references
///
/// Looks for an item pointing at the lock file; absence is not an error.
/// When present, the lock is read through `reader`, the lock item is removed,
/// and each recorded dependency becomes a package reference unless the
/// target framework already ships it. Returns the number of references
/// added. A reader failure leaves the tree untouched.
pub fn convert_package_lock(
    tree: &mut ProjectRoot,
    reader: &dyn PackageLockReader,
    target_framework: &str,
) -> Result<usize> {
    let Some(include) = find_lock_include(tree) else {
        return Ok(0);
    };
    let lock_path = tree.directory.join(include.replace('\\', "/"));
    let entries = reader.read_package_lock(&lock_path)?;

    for group in tree.item_groups_mut() {
        group.items.retain(|item| item.include_path() != Some(include.as_str()));
    }

    let mut added = 0;
    for entry in &entries {
        if entry.id.eq_ignore_ascii_case(rules::VALUE_TUPLE_PACKAGE)
            && rules::supplies_value_tuple(target_framework)
        {
            debug!(package = %entry.id, "target framework ships this package, skipping");
            continue;
        }
        if rules::is_unnecessary_include(&entry.id) {
            debug!(package = %entry.id, "package is superseded, skipping");
            continue;
        }
        add_package(tree, &entry.id, &entry.version);
        added += 1;
    }
    tree.remove_empty_groups();
    info!(
        recorded = entries.len(),
        added,
        lock = %include,
        "converted package lock to package references"
    );
    Ok(added)
}

/// Include path of the item referencing the lock file, if any
fn find_lock_include(tree: &ProjectRoot) -> Option<String> {
    tree.item_groups()
        .flat_map(|g| g.items.iter())
        .find_map(|item| {
            let path = item.include_path()?;
            if file_name(path).eq_ignore_ascii_case(rules::PACKAGES_CONFIG_FILE) {
                Some(path.to_string())
            } else {
                None
            }
        })
}

/// First unconditioned group holding package references, or a fresh one
fn ensure_package_group(tree: &mut ProjectRoot) -> &mut ItemGroup {
    let idx = tree.parts.iter().position(|p| {
        matches!(
            p,
            ProjectPart::ItemGroup(g) if g.condition.is_none()
                && g.items.iter().any(|i| i.is_type(rules::PACKAGE_REFERENCE))
        )
    });
    let idx = match idx {
        Some(i) => i,
        None => {
            tree.parts.push(ProjectPart::ItemGroup(ItemGroup::new()));
            tree.parts.len() - 1
        }
    };
    match &mut tree.parts[idx] {
        ProjectPart::ItemGroup(g) => g,
        _ => unreachable!("index points at an item group"),
    }
}
