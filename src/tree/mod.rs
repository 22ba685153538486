// src/tree/mod.rs

//! In-memory descriptor tree for MSBuild project files.
//!
//! The tree is the unit of work for the whole conversion: it is produced by
//! an external parser, mutated in place by the transformation pipeline, and
//! handed to an external serializer. It deliberately models only what the
//! pipeline edits (root attributes, imports, property groups, and item
//! groups), in document order.
//!
//! Two invariants are built into the types rather than checked at runtime:
//! a property belongs to exactly one group (groups own their properties by
//! value), and an item carries an include path or an update path but never
//! both ([`ItemSpec`] is a two-variant enum).

use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root of a project descriptor
///
/// Holds the top-level attributes and the ordered sequence of child parts.
/// Order is significant: the serializer writes parts in sequence, and the
/// consolidation pass reasons about group adjacency.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectRoot {
    /// Project file base name without extension (e.g. `MyApp` for `MyApp.csproj`)
    pub name: String,
    /// Directory containing the project file; package-lock paths resolve against it
    pub directory: PathBuf,
    /// SDK attribute (`Sdk="Microsoft.NET.Sdk"`); absent on legacy projects
    pub sdk: Option<String>,
    /// Legacy scheduling attribute, cleared during conversion
    pub tools_version: Option<String>,
    /// Legacy scheduling attribute, cleared during conversion
    pub default_targets: Option<String>,
    /// Ordered child parts
    pub parts: Vec<ProjectPart>,
}

/// One top-level child of the project root
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectPart {
    PropertyGroup(PropertyGroup),
    ItemGroup(ItemGroup),
    Import(Import),
}

/// An explicit `<Import Project="..."/>` declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub project: String,
}

/// A group of properties, optionally scoped to a configuration condition
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyGroup {
    /// Condition expression (e.g. `'$(Configuration)|$(Platform)'=='Debug|x64'`),
    /// or `None` for an unconditioned/top-level group
    pub condition: Option<String>,
    /// Properties in declaration order
    pub properties: Vec<Property>,
}

/// A single name/value property
///
/// Names compare case-insensitively, values exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub value: String,
}

/// A group of items, optionally scoped to a configuration condition
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemGroup {
    pub condition: Option<String>,
    /// Items in declaration order
    pub items: Vec<ProjectItem>,
}

/// A single item declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectItem {
    /// Item type tag (e.g. `Reference`, `PackageReference`, `Compile`)
    pub item_type: String,
    /// Include or update path
    pub spec: ItemSpec,
    /// Metadata entries; keys are unique, order is not significant
    pub metadata: BTreeMap<String, String>,
}

/// The path an item declares
///
/// An include declares a fresh inclusion; an update refines an item the SDK
/// already includes implicitly. An item is always exactly one of the two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemSpec {
    Include(String),
    Update(String),
}

impl ProjectRoot {
    /// Create an empty project tree with the given base name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            directory: PathBuf::from("."),
            sdk: None,
            tools_version: None,
            default_targets: None,
            parts: Vec::new(),
        }
    }

    /// Append a property group
    pub fn add_property_group(&mut self, group: PropertyGroup) {
        self.parts.push(ProjectPart::PropertyGroup(group));
    }

    /// Append an item group
    pub fn add_item_group(&mut self, group: ItemGroup) {
        self.parts.push(ProjectPart::ItemGroup(group));
    }

    /// Append an import declaration
    pub fn add_import(&mut self, project: impl Into<String>) {
        self.parts.push(ProjectPart::Import(Import {
            project: project.into(),
        }));
    }

    /// Iterate property groups in document order
    pub fn property_groups(&self) -> impl Iterator<Item = &PropertyGroup> {
        self.parts.iter().filter_map(|p| match p {
            ProjectPart::PropertyGroup(g) => Some(g),
            _ => None,
        })
    }

    /// Iterate property groups mutably in document order
    pub fn property_groups_mut(&mut self) -> impl Iterator<Item = &mut PropertyGroup> {
        self.parts.iter_mut().filter_map(|p| match p {
            ProjectPart::PropertyGroup(g) => Some(g),
            _ => None,
        })
    }

    /// Iterate item groups in document order
    pub fn item_groups(&self) -> impl Iterator<Item = &ItemGroup> {
        self.parts.iter().filter_map(|p| match p {
            ProjectPart::ItemGroup(g) => Some(g),
            _ => None,
        })
    }

    /// Iterate item groups mutably in document order
    pub fn item_groups_mut(&mut self) -> impl Iterator<Item = &mut ItemGroup> {
        self.parts.iter_mut().filter_map(|p| match p {
            ProjectPart::ItemGroup(g) => Some(g),
            _ => None,
        })
    }

    /// Iterate import declarations in document order
    pub fn imports(&self) -> impl Iterator<Item = &Import> {
        self.parts.iter().filter_map(|p| match p {
            ProjectPart::Import(i) => Some(i),
            _ => None,
        })
    }

    /// Remove every import declaration
    pub fn remove_imports(&mut self) {
        self.parts.retain(|p| !matches!(p, ProjectPart::Import(_)));
    }

    /// Remove every property group and item group with no children
    ///
    /// Imports are untouched; only the import-rewrite pass removes those.
    pub fn remove_empty_groups(&mut self) {
        self.parts.retain(|p| match p {
            ProjectPart::PropertyGroup(g) => !g.properties.is_empty(),
            ProjectPart::ItemGroup(g) => !g.items.is_empty(),
            ProjectPart::Import(_) => true,
        });
    }

    /// Return the first unconditioned property group, creating one at the
    /// front of the tree if none exists
    pub fn ensure_top_level_group(&mut self) -> &mut PropertyGroup {
        let idx = self.parts.iter().position(
            |p| matches!(p, ProjectPart::PropertyGroup(g) if g.condition.is_none()),
        );
        let idx = match idx {
            Some(i) => i,
            None => {
                self.parts
                    .insert(0, ProjectPart::PropertyGroup(PropertyGroup::default()));
                0
            }
        };
        match &mut self.parts[idx] {
            ProjectPart::PropertyGroup(g) => g,
            _ => unreachable!("index points at a property group"),
        }
    }

    /// Return the group holding a property with the given name, falling back
    /// to the top-level group (created if needed) when no group declares it
    pub fn group_holding_or_top_level(&mut self, property: &str) -> &mut PropertyGroup {
        let idx = self.parts.iter().position(
            |p| matches!(p, ProjectPart::PropertyGroup(g) if g.find(property).is_some()),
        );
        match idx {
            Some(i) => match &mut self.parts[i] {
                ProjectPart::PropertyGroup(g) => g,
                _ => unreachable!("index points at a property group"),
            },
            None => self.ensure_top_level_group(),
        }
    }

    /// Look up a property by name across all groups (first match wins)
    pub fn find_property(&self, name: &str) -> Option<&Property> {
        self.property_groups().find_map(|g| g.find(name))
    }

    /// Distinct configuration identifiers named by group conditions
    ///
    /// # Panics
    ///
    /// Panics if a group carries a condition that does not name a
    /// configuration; that is an upstream parser/evaluator contract
    /// violation, not a recoverable state.
    pub fn configuration_conditions(&self) -> Vec<String> {
        let mut seen = Vec::new();
        let conditions = self
            .property_groups()
            .filter_map(|g| g.condition.as_deref())
            .chain(self.item_groups().filter_map(|g| g.condition.as_deref()));
        for condition in conditions {
            let target = condition_target(condition).unwrap_or_else(|| {
                panic!("group condition '{condition}' does not name a configuration")
            });
            if !seen.iter().any(|s: &String| s.eq_ignore_ascii_case(&target)) {
                seen.push(target);
            }
        }
        seen
    }
}

impl PropertyGroup {
    /// Create an unconditioned group
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a group scoped to the given condition expression
    pub fn conditioned(condition: impl Into<String>) -> Self {
        Self {
            condition: Some(condition.into()),
            properties: Vec::new(),
        }
    }

    /// Append a property
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.properties.push(Property {
            name: name.into(),
            value: value.into(),
        });
    }

    /// Update an existing property's value in place, or append a new one
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        match self.properties.iter_mut().find(|p| p.name_matches(name)) {
            Some(prop) => prop.value = value.into(),
            None => self.add(name, value),
        }
    }

    /// Insert a property at the front of the group
    pub fn insert_front(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(
            0,
            Property {
                name: name.into(),
                value: value.into(),
            },
        );
    }

    /// Find a property by name
    pub fn find(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name_matches(name))
    }

    /// Remove every property with the given name
    pub fn remove_named(&mut self, name: &str) {
        self.properties.retain(|p| !p.name_matches(name));
    }

    /// True when a `(name, value)` pair is already present (name folded, value exact)
    pub fn contains_pair(&self, name: &str, value: &str) -> bool {
        self.properties
            .iter()
            .any(|p| p.name_matches(name) && p.value == value)
    }

    /// Order-insensitive content fingerprint for structural comparison
    ///
    /// Names are case-folded, values kept exact; duplicates are preserved so
    /// two groups compare equal only as multisets.
    pub fn signature(&self) -> Vec<(String, String)> {
        let mut sig: Vec<(String, String)> = self
            .properties
            .iter()
            .map(|p| (p.name.to_ascii_lowercase(), p.value.clone()))
            .collect();
        sig.sort();
        sig
    }
}

impl Property {
    /// Create a property
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Case-insensitive name comparison
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

impl ItemGroup {
    /// Create an unconditioned group
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a group scoped to the given condition expression
    pub fn conditioned(condition: impl Into<String>) -> Self {
        Self {
            condition: Some(condition.into()),
            items: Vec::new(),
        }
    }

    /// Append an item
    pub fn add(&mut self, item: ProjectItem) {
        self.items.push(item);
    }
}

impl ProjectItem {
    /// Create an include item
    pub fn include(item_type: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            item_type: item_type.into(),
            spec: ItemSpec::Include(path.into()),
            metadata: BTreeMap::new(),
        }
    }

    /// Create an update item
    pub fn update(item_type: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            item_type: item_type.into(),
            spec: ItemSpec::Update(path.into()),
            metadata: BTreeMap::new(),
        }
    }

    /// Attach a metadata entry (builder style)
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Case-insensitive item type comparison
    pub fn is_type(&self, item_type: &str) -> bool {
        self.item_type.eq_ignore_ascii_case(item_type)
    }

    /// The declared path, include or update alike
    pub fn path(&self) -> &str {
        match &self.spec {
            ItemSpec::Include(p) | ItemSpec::Update(p) => p,
        }
    }

    /// The include path, if this is an include declaration
    pub fn include_path(&self) -> Option<&str> {
        match &self.spec {
            ItemSpec::Include(p) => Some(p),
            ItemSpec::Update(_) => None,
        }
    }

    /// Convert an include declaration into an update declaration in place
    ///
    /// No-op for items that already are updates.
    pub fn convert_to_update(&mut self) {
        if let ItemSpec::Include(path) = &self.spec {
            self.spec = ItemSpec::Update(path.clone());
        }
    }

    /// Case-insensitive metadata lookup
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// Extract the configuration identifier a condition expression scopes to
///
/// Conditions follow the `'$(Configuration)|$(Platform)' == 'Debug|AnyCPU'`
/// shape; the right-hand side of the comparison names the configuration.
/// Returns `None` for expressions that do not fit that shape.
pub fn condition_target(condition: &str) -> Option<String> {
    let (_, rhs) = condition.split_once("==")?;
    let target = rhs.trim().trim_matches(|c| c == '\'' || c == '"');
    if target.is_empty() {
        None
    } else {
        Some(target.to_string())
    }
}

/// Last path component of an include/update path, either separator style
pub fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
