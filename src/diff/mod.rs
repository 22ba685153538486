// src/diff/mod.rs

//! Per-configuration comparison of legacy and baseline evaluated state.
//!
//! The differ never inspects descriptor syntax. Both sides are evaluated
//! first, then compared name-by-name and item-by-item: anything the baseline
//! already exhibits with the same effective value is *defaulted* (safe to
//! delete from the descriptor), anything both sides have with different
//! values is *changed* (must survive, possibly rephrased), and the one-sided
//! remainders are kept for reporting.
//!
//! A [`MigrationState`] captures one diff per configuration up front, before
//! any mutation, so every transformation pass works against the same frozen
//! comparison.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::evaluate::{
    baseline_project, derive_target_framework, EvaluatedProject, Evaluator,
};
use crate::rules;
use crate::tree::{condition_target, ProjectRoot};

/// A property observed on one side of the comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyValue {
    pub name: String,
    pub value: String,
}

/// A property present on both sides with different effective values
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangedProperty {
    pub name: String,
    pub legacy: String,
    pub baseline: String,
}

/// Property-level comparison for one configuration
#[derive(Debug, Clone, Default, Serialize)]
pub struct PropertiesDiff {
    /// Same effective value on both sides; the declaration is redundant
    defaulted: BTreeMap<String, PropertyValue>,
    /// Present on both sides with different values; the declaration matters
    changed: BTreeMap<String, ChangedProperty>,
    /// Only the legacy project sets these
    legacy_only: BTreeMap<String, PropertyValue>,
    /// Only the baseline sets these (SDK-introduced defaults)
    baseline_only: BTreeMap<String, PropertyValue>,
}

impl PropertiesDiff {
    /// Compare two evaluated property sets
    pub fn compute(legacy: &EvaluatedProject, baseline: &EvaluatedProject) -> Self {
        let mut diff = Self::default();
        for (name, value) in legacy.properties() {
            let key = name.to_ascii_lowercase();
            match baseline.property(name) {
                Some(baseline_value) if baseline_value == value => {
                    diff.defaulted.insert(
                        key,
                        PropertyValue {
                            name: name.to_string(),
                            value: value.to_string(),
                        },
                    );
                }
                Some(baseline_value) => {
                    diff.changed.insert(
                        key,
                        ChangedProperty {
                            name: name.to_string(),
                            legacy: value.to_string(),
                            baseline: baseline_value.to_string(),
                        },
                    );
                }
                None => {
                    diff.legacy_only.insert(
                        key,
                        PropertyValue {
                            name: name.to_string(),
                            value: value.to_string(),
                        },
                    );
                }
            }
        }
        for (name, value) in baseline.properties() {
            if !legacy.has_property(name) {
                diff.baseline_only.insert(
                    name.to_ascii_lowercase(),
                    PropertyValue {
                        name: name.to_string(),
                        value: value.to_string(),
                    },
                );
            }
        }
        diff
    }

    /// True when the baseline exhibits the same effective value
    pub fn is_defaulted(&self, name: &str) -> bool {
        self.defaulted.contains_key(&name.to_ascii_lowercase())
    }

    /// True when both sides set the property to different values
    pub fn is_changed(&self, name: &str) -> bool {
        self.changed.contains_key(&name.to_ascii_lowercase())
    }

    pub fn defaulted(&self) -> impl Iterator<Item = &PropertyValue> {
        self.defaulted.values()
    }

    pub fn changed(&self) -> impl Iterator<Item = &ChangedProperty> {
        self.changed.values()
    }

    pub fn legacy_only(&self) -> impl Iterator<Item = &PropertyValue> {
        self.legacy_only.values()
    }

    pub fn baseline_only(&self) -> impl Iterator<Item = &PropertyValue> {
        self.baseline_only.values()
    }

    pub fn is_empty(&self) -> bool {
        self.defaulted.is_empty()
            && self.changed.is_empty()
            && self.legacy_only.is_empty()
            && self.baseline_only.is_empty()
    }
}

/// Item-level comparison for one configuration
///
/// Buckets are keyed by case-folded item type, then by case-folded include
/// path with the original spelling as the value.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ItemsDiff {
    /// The baseline includes an equal item (same path, same metadata)
    defaulted: BTreeMap<String, BTreeMap<String, String>>,
    /// The baseline includes the path but with different metadata
    changed: BTreeMap<String, BTreeMap<String, String>>,
    /// Only the legacy project includes these
    legacy_only: BTreeMap<String, BTreeMap<String, String>>,
    /// Only the baseline includes these (SDK implicit items)
    baseline_only: BTreeMap<String, BTreeMap<String, String>>,
}

impl ItemsDiff {
    /// Compare two evaluated item sets
    pub fn compute(legacy: &EvaluatedProject, baseline: &EvaluatedProject) -> Self {
        let mut diff = Self::default();
        for (item_type, items) in legacy.item_types() {
            for item in items {
                let bucket = match baseline.find_item(item_type, &item.include) {
                    Some(counterpart) if folded(&counterpart.metadata) == folded(&item.metadata) => {
                        &mut diff.defaulted
                    }
                    Some(_) => &mut diff.changed,
                    None => &mut diff.legacy_only,
                };
                bucket
                    .entry(item_type.to_string())
                    .or_default()
                    .insert(item.include.to_ascii_lowercase(), item.include.clone());
            }
        }
        for (item_type, items) in baseline.item_types() {
            for item in items {
                if legacy.find_item(item_type, &item.include).is_none() {
                    diff.baseline_only
                        .entry(item_type.to_string())
                        .or_default()
                        .insert(item.include.to_ascii_lowercase(), item.include.clone());
                }
            }
        }
        diff
    }

    /// True when the baseline carries an equal item of this type and path
    pub fn is_defaulted(&self, item_type: &str, include: &str) -> bool {
        Self::bucket_contains(&self.defaulted, item_type, include)
    }

    /// True when the baseline carries the path with different metadata
    pub fn is_changed(&self, item_type: &str, include: &str) -> bool {
        Self::bucket_contains(&self.changed, item_type, include)
    }

    fn bucket_contains(
        bucket: &BTreeMap<String, BTreeMap<String, String>>,
        item_type: &str,
        include: &str,
    ) -> bool {
        bucket
            .get(&item_type.to_ascii_lowercase())
            .is_some_and(|includes| includes.contains_key(&include.to_ascii_lowercase()))
    }

    /// Iterate `(type, original include)` pairs in one bucket
    fn bucket_entries(
        bucket: &BTreeMap<String, BTreeMap<String, String>>,
    ) -> impl Iterator<Item = (&str, &str)> {
        bucket.iter().flat_map(|(ty, includes)| {
            includes.values().map(move |inc| (ty.as_str(), inc.as_str()))
        })
    }

    pub fn defaulted(&self) -> impl Iterator<Item = (&str, &str)> {
        Self::bucket_entries(&self.defaulted)
    }

    pub fn changed(&self) -> impl Iterator<Item = (&str, &str)> {
        Self::bucket_entries(&self.changed)
    }

    pub fn legacy_only(&self) -> impl Iterator<Item = (&str, &str)> {
        Self::bucket_entries(&self.legacy_only)
    }

    pub fn baseline_only(&self) -> impl Iterator<Item = (&str, &str)> {
        Self::bucket_entries(&self.baseline_only)
    }

    pub fn is_empty(&self) -> bool {
        self.defaulted.is_empty()
            && self.changed.is_empty()
            && self.legacy_only.is_empty()
            && self.baseline_only.is_empty()
    }
}

/// Case-folded view of a metadata table for comparison
fn folded(metadata: &BTreeMap<String, String>) -> BTreeMap<String, &str> {
    metadata
        .iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), v.as_str()))
        .collect()
}

/// Complete comparison of one configuration
#[derive(Debug, Clone, Serialize)]
pub struct ProjectDiff {
    /// Configuration identifier as found in the descriptor (e.g. `Debug|AnyCPU`)
    pub configuration: String,
    pub properties: PropertiesDiff,
    pub items: ItemsDiff,
}

impl ProjectDiff {
    /// Compare legacy and baseline evaluated state for one configuration
    pub fn compute(
        configuration: impl Into<String>,
        legacy: &EvaluatedProject,
        baseline: &EvaluatedProject,
    ) -> Self {
        let configuration = configuration.into();
        let properties = PropertiesDiff::compute(legacy, baseline);
        let items = ItemsDiff::compute(legacy, baseline);
        debug!(
            configuration = %configuration,
            defaulted = properties.defaulted.len(),
            changed = properties.changed.len(),
            "computed configuration diff"
        );
        Self {
            configuration,
            properties,
            items,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.items.is_empty()
    }
}

/// Evaluated legacy state plus its diff for one configuration
#[derive(Debug, Clone)]
pub struct ConfigurationState {
    pub configuration: String,
    pub legacy: EvaluatedProject,
    pub diff: ProjectDiff,
}

/// Frozen pre-transformation comparison across every configuration
///
/// Built once before any pass mutates the tree. Lookups by configuration are
/// infallible by construction; asking for a configuration that was never
/// captured is a pipeline bug and panics.
#[derive(Debug, Clone)]
pub struct MigrationState {
    /// Case-folded configuration identifier to state
    states: BTreeMap<String, ConfigurationState>,
    default_configuration: String,
}

impl MigrationState {
    /// Assemble from already-evaluated `(configuration, legacy, baseline)` triples
    pub fn from_states(
        default_configuration: impl Into<String>,
        states: Vec<(String, EvaluatedProject, EvaluatedProject)>,
    ) -> Result<Self> {
        let default_configuration = default_configuration.into();
        if states.is_empty() {
            return Err(Error::InvalidInput(
                "at least one evaluated configuration is required".to_string(),
            ));
        }
        let mut map = BTreeMap::new();
        for (configuration, legacy, baseline) in states {
            let diff = ProjectDiff::compute(&configuration, &legacy, &baseline);
            map.insert(
                configuration.to_ascii_lowercase(),
                ConfigurationState {
                    configuration,
                    legacy,
                    diff,
                },
            );
        }
        if !map.contains_key(&default_configuration.to_ascii_lowercase()) {
            return Err(Error::InvalidInput(format!(
                "default configuration '{default_configuration}' was not among the evaluated states"
            )));
        }
        Ok(Self {
            states: map,
            default_configuration,
        })
    }

    /// Evaluate every configuration of a legacy tree against a synthesized
    /// minimal baseline and assemble the state
    ///
    /// The baseline's target framework is derived from the legacy project's
    /// own evaluated state under the default configuration.
    pub fn from_evaluator(
        evaluator: &dyn Evaluator,
        tree: &ProjectRoot,
        default_configuration: &str,
    ) -> Result<Self> {
        let default_legacy = evaluator.evaluate(tree, default_configuration)?;
        let target_framework = derive_target_framework(&default_legacy).unwrap_or_else(|| {
            warn!(
                fallback = rules::FALLBACK_TARGET_FRAMEWORK,
                "legacy project declares no target framework, assuming fallback"
            );
            rules::FALLBACK_TARGET_FRAMEWORK.to_string()
        });
        let baseline = baseline_project(&tree.name, rules::DEFAULT_SDK, &target_framework);
        Self::from_evaluator_with_baseline(evaluator, tree, &baseline, default_configuration)
    }

    /// Evaluate every configuration of a legacy tree against a caller-built
    /// baseline and assemble the state
    pub fn from_evaluator_with_baseline(
        evaluator: &dyn Evaluator,
        tree: &ProjectRoot,
        baseline: &ProjectRoot,
        default_configuration: &str,
    ) -> Result<Self> {
        let mut configurations = tree.configuration_conditions();
        if !configurations
            .iter()
            .any(|c| c.eq_ignore_ascii_case(default_configuration))
        {
            configurations.push(default_configuration.to_string());
        }
        info!(
            configurations = configurations.len(),
            project = %tree.name,
            "evaluating configurations for diff"
        );
        let mut states = Vec::with_capacity(configurations.len());
        for configuration in configurations {
            let legacy = evaluator.evaluate(tree, &configuration)?;
            let baseline_state = evaluator.evaluate(baseline, &configuration)?;
            states.push((configuration, legacy, baseline_state));
        }
        Self::from_states(default_configuration, states)
    }

    /// Configuration that unconditioned declarations diff against
    pub fn default_configuration(&self) -> &str {
        &self.default_configuration
    }

    /// State for the default configuration
    pub fn default_state(&self) -> &ConfigurationState {
        self.state_for(&self.default_configuration)
    }

    /// State for a configuration captured at diff time
    ///
    /// # Panics
    ///
    /// Panics when the configuration was never captured; the pipeline only
    /// asks for configurations the input tree named, so a miss is a bug.
    pub fn state_for(&self, configuration: &str) -> &ConfigurationState {
        self.states
            .get(&configuration.to_ascii_lowercase())
            .unwrap_or_else(|| {
                panic!("configuration '{configuration}' was not captured at diff time")
            })
    }

    /// Diff for a configuration captured at diff time
    pub fn diff_for(&self, configuration: &str) -> &ProjectDiff {
        &self.state_for(configuration).diff
    }

    /// Diff that governs a group with the given condition
    ///
    /// Unconditioned groups are judged against the default configuration.
    ///
    /// # Panics
    ///
    /// Panics when the condition does not name a configuration or names one
    /// that was never captured.
    pub fn diff_for_condition(&self, condition: Option<&str>) -> &ProjectDiff {
        match condition {
            None => self.diff_for(&self.default_configuration),
            Some(cond) => {
                let target = condition_target(cond).unwrap_or_else(|| {
                    panic!("group condition '{cond}' does not name a configuration")
                });
                self.diff_for(&target)
            }
        }
    }

    /// Legacy evaluated state under the default configuration
    pub fn default_legacy(&self) -> &EvaluatedProject {
        &self.default_state().legacy
    }

    /// Iterate captured states in case-folded configuration order
    pub fn configurations(&self) -> impl Iterator<Item = &ConfigurationState> {
        self.states.values()
    }
}
