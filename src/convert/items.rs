// src/convert/items.rs

//! Item reconciliation against the configuration diff.
//!
//! Each item group is rebuilt in place: items the SDK already provides are
//! dropped, references with package equivalents become package references,
//! and explicit includes the SDK globs implicitly either disappear (when
//! identical) or turn into update declarations (when they customize
//! metadata). Each item gets exactly one verdict; the checks run in fixed
//! order and the first match wins.

use std::mem;

use tracing::{debug, info};

use crate::convert::style::ProjectStyle;
use crate::diff::MigrationState;
use crate::packages::add_package;
use crate::rules;
use crate::tree::{ProjectItem, ProjectRoot};

/// Reconcile every item group against the frozen diff
///
/// Package references queued during the scan (for references with package
/// equivalents) are added only after all groups are rebuilt, so the scan
/// never observes its own insertions.
///
/// # Panics
///
/// Panics when a group condition names a configuration the migration state
/// never captured.
pub fn reconcile_items(
    tree: &mut ProjectRoot,
    state: &MigrationState,
    style: ProjectStyle,
    target_framework: &str,
) {
    let mut queued_packages: Vec<(String, String)> = Vec::new();
    let mut removed = 0usize;
    let mut updated = 0usize;

    for group in tree.item_groups_mut() {
        let diff = state.diff_for_condition(group.condition.as_deref());
        let items = mem::take(&mut group.items);
        for mut item in items {
            if item.is_type(rules::PACKAGE_REFERENCE) {
                group.items.push(item);
                continue;
            }

            if rules::metadata_is_fully_removable(&item.metadata) {
                debug!(item = %item.path(), "stripping decorative metadata");
                item.metadata.clear();
            }

            if item.is_type(rules::REFERENCE) {
                if let Some(include) = item.include_path() {
                    if rules::is_unnecessary_include(include) {
                        debug!(reference = include, "reference is implicit, removing");
                        removed += 1;
                        continue;
                    }
                    if include.eq_ignore_ascii_case(rules::VALUE_TUPLE_PACKAGE)
                        && rules::supplies_value_tuple(target_framework)
                    {
                        debug!(reference = include, "target framework ships this, removing");
                        removed += 1;
                        continue;
                    }
                    if let Some((id, version)) = rules::package_equivalent(include) {
                        debug!(
                            reference = include,
                            package = id,
                            "replacing reference with package equivalent"
                        );
                        queued_packages.push((id.to_string(), version.to_string()));
                        removed += 1;
                        continue;
                    }
                }
            }

            if style.is_desktop() && is_desktop_obsolete(&item) {
                debug!(
                    item_type = %item.item_type,
                    item = %item.path(),
                    "desktop SDK handles this item, removing"
                );
                removed += 1;
                continue;
            }

            if rules::metadata_is_wholly_unnecessary(&item.metadata) {
                debug!(item = %item.path(), "item is regenerated designer plumbing, removing");
                removed += 1;
                continue;
            }

            if let Some(include) = item.include_path() {
                if diff.items.is_defaulted(&item.item_type, include) {
                    debug!(
                        item_type = %item.item_type,
                        item = include,
                        "item matches an implicit one, removing"
                    );
                    removed += 1;
                    continue;
                }
                if diff.items.is_changed(&item.item_type, include) {
                    debug!(
                        item_type = %item.item_type,
                        item = include,
                        "item customizes an implicit one, rewriting as update"
                    );
                    item.convert_to_update();
                    updated += 1;
                }
            }

            group.items.push(item);
        }
    }

    tree.remove_empty_groups();
    for (id, version) in queued_packages {
        add_package(tree, &id, &version);
    }
    info!(removed, updated, "reconciled items");
}

/// True for items the desktop SDK's own targets take care of
///
/// Covers toolkit assembly references, XAML item declarations, designer
/// code-behind files, and the settings/resource files whose generated
/// companions the SDK wires up by convention.
fn is_desktop_obsolete(item: &ProjectItem) -> bool {
    if item.is_type(rules::REFERENCE) && rules::is_desktop_reference(item.path()) {
        return true;
    }
    if rules::is_wpf_item_type(&item.item_type) {
        return true;
    }
    let path = item.path().to_ascii_lowercase();
    if item.is_type("Compile") {
        if path.ends_with(".designer.cs") {
            return true;
        }
        if let Some(parent) = item.metadata_value("DependentUpon") {
            let parent = parent.to_ascii_lowercase();
            if parent.ends_with(".settings")
                || parent.ends_with(".resx")
                || parent.ends_with(".xaml")
            {
                return true;
            }
        }
    }
    if (item.is_type("None") || item.is_type("EmbeddedResource"))
        && (path.ends_with(".settings") || path.ends_with(".resx"))
    {
        return true;
    }
    false
}
