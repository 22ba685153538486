// src/evaluate.rs

//! Evaluated project state and the evaluation boundary.
//!
//! Evaluation itself (expanding variables, applying implicit imports,
//! globbing) belongs to the host build tooling; this crate only consumes its
//! result. An [`Evaluator`] turns a descriptor tree plus a configuration name
//! into an [`EvaluatedProject`]: the flat set of effective properties and
//! items after every default and import has been applied.

use std::collections::BTreeMap;

use crate::rules;
use crate::tree::{ProjectRoot, PropertyGroup};
use crate::Result;

/// Boundary to the host build engine's evaluation machinery
pub trait Evaluator {
    /// Evaluate a descriptor tree under the given configuration
    fn evaluate(&self, tree: &ProjectRoot, configuration: &str) -> Result<EvaluatedProject>;
}

/// Effective state of a project under one configuration
///
/// Properties and items are stored with case-folded keys so lookups match
/// the host tooling's case-insensitive name semantics, while the original
/// spellings are preserved for reporting.
#[derive(Debug, Clone, Default)]
pub struct EvaluatedProject {
    /// Case-folded name to (original spelling, effective value)
    properties: BTreeMap<String, (String, String)>,
    /// Case-folded item type to evaluated items
    items: BTreeMap<String, Vec<EvaluatedItem>>,
}

/// One evaluated item together with its effective metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluatedItem {
    pub include: String,
    pub metadata: BTreeMap<String, String>,
}

impl EvaluatedProject {
    /// Create an empty evaluated state
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an effective property value
    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.properties
            .insert(name.to_ascii_lowercase(), (name, value.into()));
    }

    /// Effective value of a property, if set
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .get(&name.to_ascii_lowercase())
            .map(|(_, value)| value.as_str())
    }

    /// Iterate `(original name, value)` pairs in case-folded name order
    pub fn properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .values()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// True when the property is present in this state
    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(&name.to_ascii_lowercase())
    }

    /// Record an evaluated item
    pub fn add_item(&mut self, item_type: &str, item: EvaluatedItem) {
        self.items
            .entry(item_type.to_ascii_lowercase())
            .or_default()
            .push(item);
    }

    /// Evaluated items of one type, empty for unknown types
    pub fn items_of_type(&self, item_type: &str) -> &[EvaluatedItem] {
        self.items
            .get(&item_type.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Iterate `(case-folded type, items)` pairs
    pub fn item_types(&self) -> impl Iterator<Item = (&str, &[EvaluatedItem])> {
        self.items
            .iter()
            .map(|(ty, items)| (ty.as_str(), items.as_slice()))
    }

    /// Find an evaluated item by type and include path
    pub fn find_item(&self, item_type: &str, include: &str) -> Option<&EvaluatedItem> {
        self.items_of_type(item_type)
            .iter()
            .find(|item| item.include.eq_ignore_ascii_case(include))
    }
}

impl EvaluatedItem {
    /// Create an item with no metadata
    pub fn new(include: impl Into<String>) -> Self {
        Self {
            include: include.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Attach a metadata entry (builder style)
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Derive the modern target framework moniker from a legacy evaluated state
///
/// Prefers an explicit `TargetFramework`, falls back to translating the
/// legacy `TargetFrameworkVersion`, and yields `None` when the state
/// declares neither.
pub fn derive_target_framework(state: &EvaluatedProject) -> Option<String> {
    if let Some(raw) = state.property(rules::TARGET_FRAMEWORK) {
        let raw = raw.trim();
        if !raw.is_empty() {
            return Some(
                rules::framework_from_version(raw)
                    .unwrap_or_else(|| rules::normalize_target_framework(raw)),
            );
        }
    }
    state
        .property(rules::TARGET_FRAMEWORK_VERSION)
        .and_then(rules::framework_from_version)
}

/// Build the minimal modern-style descriptor used as the comparison baseline
///
/// The baseline carries only the SDK attribute and the target framework;
/// everything else it exhibits under evaluation comes from the SDK's own
/// defaults, which is exactly what the differ needs to subtract.
pub fn baseline_project(name: &str, sdk: &str, target_framework: &str) -> ProjectRoot {
    let mut tree = ProjectRoot::new(name);
    tree.sdk = Some(sdk.to_string());
    let mut group = PropertyGroup::new();
    group.add("TargetFramework", target_framework);
    tree.add_property_group(group);
    tree
}
