// src/convert/mod.rs

//! Conversion pipeline.
//!
//! The [`Converter`] owns a legacy descriptor tree and a frozen
//! [`MigrationState`], and rewrites the tree in a fixed sequence of passes:
//! imports become an SDK attribute, defaulted and boilerplate properties
//! disappear, the target framework is restated in modern form, desktop and
//! assembly-info guards are injected, duplicate conditioned groups collapse,
//! the package lock is folded in, items are reconciled against the diff, and
//! legacy root attributes are cleared. Analysis happens before mutation;
//! passes never re-evaluate the tree they are editing.

pub mod items;
pub mod style;

use std::collections::{BTreeMap, HashSet};
use std::mem;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::diff::MigrationState;
use crate::error::{Error, Result};
use crate::evaluate::{derive_target_framework, Evaluator};
use crate::packages::{convert_package_lock, PackageLockReader};
use crate::rules;
use crate::tree::{ProjectPart, ProjectRoot, Property};

use items::reconcile_items;
use style::{detect_desktop_frameworks, detect_style, DesktopFrameworks, ProjectStyle};

/// Caller-supplied conversion settings
///
/// Forced properties model values the host injects from outside the
/// descriptor (command-line style). The pipeline neither removes a forced
/// property from the tree nor declares it there.
#[derive(Debug, Clone, Default)]
pub struct ConversionOptions {
    /// Case-folded property name to forced value
    forced_properties: BTreeMap<String, String>,
}

impl ConversionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a property value the host forces from outside the descriptor
    pub fn force_property(&mut self, name: &str, value: impl Into<String>) {
        self.forced_properties
            .insert(name.to_ascii_lowercase(), value.into());
    }

    /// Builder-style variant of [`force_property`](Self::force_property)
    pub fn with_forced_property(mut self, name: &str, value: impl Into<String>) -> Self {
        self.force_property(name, value);
        self
    }

    /// Forced value for a property, if the host supplied one
    pub fn forced(&self, name: &str) -> Option<&str> {
        self.forced_properties
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn is_forced(&self, name: &str) -> bool {
        self.forced_properties
            .contains_key(&name.to_ascii_lowercase())
    }
}

/// Boundary to the host's descriptor serialization
pub trait ProjectWriter {
    /// Serialize the tree to `path`
    fn save(&self, tree: &ProjectRoot, path: &Path) -> Result<()>;
}

/// Drives the conversion of one legacy project
pub struct Converter {
    tree: ProjectRoot,
    state: MigrationState,
    options: ConversionOptions,
    lock_reader: Box<dyn PackageLockReader>,
    writer: Box<dyn ProjectWriter>,
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("tree", &self.tree)
            .field("state", &self.state)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Converter {
    /// Create a converter over a tree and its pre-computed migration state
    pub fn new(
        tree: ProjectRoot,
        state: MigrationState,
        options: ConversionOptions,
        lock_reader: Box<dyn PackageLockReader>,
        writer: Box<dyn ProjectWriter>,
    ) -> Result<Self> {
        if tree.name.trim().is_empty() {
            return Err(Error::InvalidInput(
                "project name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            tree,
            state,
            options,
            lock_reader,
            writer,
        })
    }

    /// Evaluate the tree through `evaluator` and create a converter in one step
    pub fn from_evaluator(
        tree: ProjectRoot,
        evaluator: &dyn Evaluator,
        default_configuration: &str,
        options: ConversionOptions,
        lock_reader: Box<dyn PackageLockReader>,
        writer: Box<dyn ProjectWriter>,
    ) -> Result<Self> {
        let state = MigrationState::from_evaluator(evaluator, &tree, default_configuration)?;
        Self::new(tree, state, options, lock_reader, writer)
    }

    /// The tree in its current state
    pub fn tree(&self) -> &ProjectRoot {
        &self.tree
    }

    /// The frozen pre-transformation state
    pub fn state(&self) -> &MigrationState {
        &self.state
    }

    /// Consume the converter and keep the tree
    pub fn into_tree(self) -> ProjectRoot {
        self.tree
    }

    /// Run every transformation pass in order
    ///
    /// The tree is left in its converted form; nothing is written to disk.
    pub fn run(&mut self) -> Result<()> {
        let project_style = detect_style(&self.tree);
        let frameworks = detect_desktop_frameworks(&self.tree);
        info!(project = %self.tree.name, style = %project_style, "starting conversion");

        self.rewrite_imports(project_style);
        self.remove_defaulted_properties();
        self.remove_unnecessary_properties();
        let target_framework = self.resolve_target_framework(project_style);
        self.add_desktop_properties(project_style, frameworks);
        self.add_assembly_info_guard();
        self.consolidate_property_groups();
        convert_package_lock(&mut self.tree, self.lock_reader.as_ref(), &target_framework)?;
        reconcile_items(&mut self.tree, &self.state, project_style, &target_framework);
        self.normalize_root();

        info!(project = %self.tree.name, "conversion finished");
        Ok(())
    }

    /// Run the pipeline and save the converted tree to `output_path`
    ///
    /// Nothing is written when any pass or the serializer fails.
    pub fn convert(&mut self, output_path: &Path) -> Result<()> {
        self.run()?;
        self.writer.save(&self.tree, output_path)?;
        info!(path = %output_path.display(), "saved converted project");
        Ok(())
    }

    /// Replace explicit imports with the style's SDK attribute
    ///
    /// Projects with unrecognized imports keep their import structure; the
    /// SDK attribute would not reproduce whatever those imports do.
    fn rewrite_imports(&mut self, project_style: ProjectStyle) {
        if project_style == ProjectStyle::Custom {
            warn!("unrecognized imports present, keeping legacy import structure");
            return;
        }
        let count = self.tree.imports().count();
        self.tree.remove_imports();
        self.tree.sdk = Some(project_style.sdk().to_string());
        debug!(imports = count, sdk = project_style.sdk(), "replaced imports with SDK attribute");
    }

    /// Delete every property whose effective value matches the baseline
    fn remove_defaulted_properties(&mut self) {
        let state = &self.state;
        let options = &self.options;
        let mut removed = 0usize;
        for group in self.tree.property_groups_mut() {
            let diff = state.diff_for_condition(group.condition.as_deref());
            group.properties.retain(|property| {
                let drop = diff.properties.is_defaulted(&property.name)
                    && !options.is_forced(&property.name);
                if drop {
                    debug!(property = %property.name, "removing defaulted property");
                    removed += 1;
                }
                !drop
            });
        }
        self.tree.remove_empty_groups();
        info!(removed, "removed defaulted properties");
    }

    /// Delete boilerplate the SDK computes and stock template values
    fn remove_unnecessary_properties(&mut self) {
        let state = &self.state;
        let options = &self.options;
        let project_name = self.tree.name.clone();
        let mut removed = 0usize;
        for group in self.tree.property_groups_mut() {
            let configuration = state
                .diff_for_condition(group.condition.as_deref())
                .configuration
                .clone();
            group.properties.retain(|property| {
                let drop = !options.is_forced(&property.name)
                    && (rules::is_unnecessary_property(&property.name)
                        || rules::is_default_valued_property(
                            &property.name,
                            &property.value,
                            &configuration,
                            &project_name,
                        ));
                if drop {
                    debug!(property = %property.name, "removing unnecessary property");
                    removed += 1;
                }
                !drop
            });
        }
        self.tree.remove_empty_groups();
        info!(removed, "removed unnecessary properties");
    }

    /// Decide the modern target framework and declare it first in the
    /// top-level group
    ///
    /// A framework forced by the caller is honored but never declared in the
    /// descriptor. Desktop projects get the desktop SDK's floor framework;
    /// everything else keeps what the legacy project effectively targeted.
    fn resolve_target_framework(&mut self, project_style: ProjectStyle) -> String {
        if let Some(forced) = self.options.forced(rules::TARGET_FRAMEWORK) {
            let forced = forced.to_string();
            debug!(target_framework = %forced, "target framework forced by caller, not declaring");
            return forced;
        }
        let moniker = if project_style.is_desktop() {
            rules::DESKTOP_TARGET_FRAMEWORK.to_string()
        } else {
            derive_target_framework(self.state.default_legacy()).unwrap_or_else(|| {
                warn!(
                    fallback = rules::FALLBACK_TARGET_FRAMEWORK,
                    "legacy project declares no target framework, assuming fallback"
                );
                rules::FALLBACK_TARGET_FRAMEWORK.to_string()
            })
        };
        for group in self.tree.property_groups_mut() {
            group.remove_named(rules::TARGET_FRAMEWORK);
        }
        self.tree.remove_empty_groups();
        self.tree
            .ensure_top_level_group()
            .insert_front(rules::TARGET_FRAMEWORK, moniker.as_str());
        debug!(target_framework = %moniker, "declared target framework");
        moniker
    }

    /// Declare the desktop toolkit switches next to the target framework
    fn add_desktop_properties(
        &mut self,
        project_style: ProjectStyle,
        frameworks: DesktopFrameworks,
    ) {
        if !project_style.is_desktop() {
            return;
        }
        let options = &self.options;
        let wpf = frameworks.wpf && !options.is_forced(rules::USE_WPF);
        let winforms = frameworks.winforms && !options.is_forced(rules::USE_WINDOWS_FORMS);
        let group = self.tree.group_holding_or_top_level(rules::TARGET_FRAMEWORK);
        if wpf {
            group.set(rules::USE_WPF, "true");
            debug!("declared WPF toolkit");
        }
        if winforms {
            group.set(rules::USE_WINDOWS_FORMS, "true");
            debug!("declared Windows Forms toolkit");
        }
    }

    /// Keep existing assembly attribute files authoritative
    ///
    /// The SDK generates assembly attributes by default, which collides with
    /// the `AssemblyInfo.cs` every legacy project carries.
    fn add_assembly_info_guard(&mut self) {
        if self.options.is_forced(rules::GENERATE_ASSEMBLY_INFO) {
            return;
        }
        let group = self.tree.group_holding_or_top_level(rules::TARGET_FRAMEWORK);
        group.set(rules::GENERATE_ASSEMBLY_INFO, "false");
        debug!("disabled assembly info generation");
    }

    /// Collapse adjacent conditioned groups with identical content
    ///
    /// Applies only when more than two property groups survive the earlier
    /// passes. Merged properties move to the top-level group; each group
    /// takes part in at most one merge per run.
    fn consolidate_property_groups(&mut self) {
        let group_indices: Vec<usize> = self
            .tree
            .parts
            .iter()
            .enumerate()
            .filter_map(|(i, p)| matches!(p, ProjectPart::PropertyGroup(_)).then_some(i))
            .collect();
        if group_indices.len() < 3 {
            return;
        }

        let mut merged_parts: HashSet<usize> = HashSet::new();
        let mut hoisted: Vec<Property> = Vec::new();
        let mut i = 0;
        while i + 1 < group_indices.len() {
            let (a, b) = (group_indices[i], group_indices[i + 1]);
            let (first, second) = match (&self.tree.parts[a], &self.tree.parts[b]) {
                (ProjectPart::PropertyGroup(x), ProjectPart::PropertyGroup(y)) => (x, y),
                _ => unreachable!("indices point at property groups"),
            };
            if first.condition.is_none() || second.condition.is_none() {
                i += 1;
                continue;
            }
            let signature = first.signature();
            if !signature.is_empty() && signature == second.signature() {
                debug!(
                    properties = first.properties.len(),
                    "merging identical conditioned groups into top level"
                );
                hoisted.extend(first.properties.iter().cloned());
                merged_parts.insert(a);
                merged_parts.insert(b);
                i += 2;
            } else {
                i += 1;
            }
        }
        if merged_parts.is_empty() {
            return;
        }

        let parts = mem::take(&mut self.tree.parts);
        self.tree.parts = parts
            .into_iter()
            .enumerate()
            .filter_map(|(idx, part)| (!merged_parts.contains(&idx)).then_some(part))
            .collect();

        let merged = merged_parts.len();
        let top = self.tree.ensure_top_level_group();
        for property in hoisted {
            if !top.contains_pair(&property.name, &property.value) {
                top.properties.push(property);
            }
        }
        info!(groups = merged, "consolidated property groups");
    }

    /// Clear scheduling attributes the modern loader infers
    fn normalize_root(&mut self) {
        self.tree.tools_version = None;
        self.tree.default_targets = None;
    }
}
