// tests/common/mod.rs

//! Shared fixtures and collaborator doubles for integration tests.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use sdkify::{
    Error, EvaluatedItem, EvaluatedProject, Evaluator, ItemGroup, ItemSpec, PackageEntry,
    PackageLockReader, ProjectItem, ProjectPart, ProjectRoot, ProjectWriter, PropertyGroup,
    Result,
};

pub const DEBUG: &str = "Debug|AnyCPU";
pub const RELEASE: &str = "Release|AnyCPU";

pub const DEBUG_CONDITION: &str = "'$(Configuration)|$(Platform)' == 'Debug|AnyCPU'";
pub const RELEASE_CONDITION: &str = "'$(Configuration)|$(Platform)' == 'Release|AnyCPU'";

/// Evaluator double with canned per-configuration states.
///
/// Tells the legacy tree apart from the synthesized baseline by the SDK
/// attribute, the same distinction a real evaluation host would see.
pub struct MockEvaluator {
    legacy: BTreeMap<String, EvaluatedProject>,
    baseline: BTreeMap<String, EvaluatedProject>,
}

impl MockEvaluator {
    pub fn new() -> Self {
        Self {
            legacy: BTreeMap::new(),
            baseline: BTreeMap::new(),
        }
    }

    pub fn with_legacy(mut self, configuration: &str, state: EvaluatedProject) -> Self {
        self.legacy
            .insert(configuration.to_ascii_lowercase(), state);
        self
    }

    pub fn with_baseline(mut self, configuration: &str, state: EvaluatedProject) -> Self {
        self.baseline
            .insert(configuration.to_ascii_lowercase(), state);
        self
    }
}

impl Evaluator for MockEvaluator {
    fn evaluate(&self, tree: &ProjectRoot, configuration: &str) -> Result<EvaluatedProject> {
        let side = if tree.sdk.is_some() {
            &self.baseline
        } else {
            &self.legacy
        };
        side.get(&configuration.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| Error::Evaluation {
                configuration: configuration.to_string(),
                message: "no canned state for configuration".to_string(),
            })
    }
}

/// Lock reader double returning a fixed entry list.
pub struct StaticLockReader(pub Vec<PackageEntry>);

impl PackageLockReader for StaticLockReader {
    fn read_package_lock(&self, _path: &Path) -> Result<Vec<PackageEntry>> {
        Ok(self.0.clone())
    }
}

/// Lock reader double that always fails.
pub struct FailingLockReader;

impl PackageLockReader for FailingLockReader {
    fn read_package_lock(&self, path: &Path) -> Result<Vec<PackageEntry>> {
        Err(Error::PackageLock {
            path: path.display().to_string(),
            message: "simulated parse failure".to_string(),
        })
    }
}

/// Writer double that records what would have been saved.
#[derive(Clone, Default)]
pub struct CapturingWriter {
    pub saved: Rc<RefCell<Option<(ProjectRoot, PathBuf)>>>,
}

impl ProjectWriter for CapturingWriter {
    fn save(&self, tree: &ProjectRoot, path: &Path) -> Result<()> {
        *self.saved.borrow_mut() = Some((tree.clone(), path.to_path_buf()));
        Ok(())
    }
}

/// Writer double that always fails.
pub struct FailingWriter;

impl ProjectWriter for FailingWriter {
    fn save(&self, _tree: &ProjectRoot, path: &Path) -> Result<()> {
        Err(Error::Save {
            path: path.display().to_string(),
            message: "simulated serializer failure".to_string(),
        })
    }
}

/// Writer that renders the tree as descriptor markup on disk.
pub struct TextWriter;

impl ProjectWriter for TextWriter {
    fn save(&self, tree: &ProjectRoot, path: &Path) -> Result<()> {
        std::fs::write(path, render_tree(tree)).map_err(|e| Error::Save {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }
}

/// Minimal descriptor markup rendering, enough to eyeball converted output.
pub fn render_tree(tree: &ProjectRoot) -> String {
    let mut out = String::new();
    let mut attrs = String::new();
    if let Some(sdk) = &tree.sdk {
        attrs.push_str(&format!(" Sdk=\"{sdk}\""));
    }
    if let Some(tools) = &tree.tools_version {
        attrs.push_str(&format!(" ToolsVersion=\"{tools}\""));
    }
    if let Some(targets) = &tree.default_targets {
        attrs.push_str(&format!(" DefaultTargets=\"{targets}\""));
    }
    out.push_str(&format!("<Project{attrs}>\n"));
    for part in &tree.parts {
        match part {
            ProjectPart::Import(import) => {
                out.push_str(&format!("  <Import Project=\"{}\" />\n", import.project));
            }
            ProjectPart::PropertyGroup(group) => {
                match &group.condition {
                    Some(c) => out.push_str(&format!("  <PropertyGroup Condition=\"{c}\">\n")),
                    None => out.push_str("  <PropertyGroup>\n"),
                }
                for property in &group.properties {
                    out.push_str(&format!(
                        "    <{0}>{1}</{0}>\n",
                        property.name, property.value
                    ));
                }
                out.push_str("  </PropertyGroup>\n");
            }
            ProjectPart::ItemGroup(group) => {
                match &group.condition {
                    Some(c) => out.push_str(&format!("  <ItemGroup Condition=\"{c}\">\n")),
                    None => out.push_str("  <ItemGroup>\n"),
                }
                for item in &group.items {
                    let (attr, path) = match &item.spec {
                        ItemSpec::Include(p) => ("Include", p),
                        ItemSpec::Update(p) => ("Update", p),
                    };
                    if item.metadata.is_empty() {
                        out.push_str(&format!(
                            "    <{} {}=\"{}\" />\n",
                            item.item_type, attr, path
                        ));
                    } else {
                        out.push_str(&format!(
                            "    <{} {}=\"{}\">\n",
                            item.item_type, attr, path
                        ));
                        for (key, value) in &item.metadata {
                            out.push_str(&format!("      <{key}>{value}</{key}>\n"));
                        }
                        out.push_str(&format!("    </{}>\n", item.item_type));
                    }
                }
                out.push_str("  </ItemGroup>\n");
            }
        }
    }
    out.push_str("</Project>\n");
    out
}

/// A representative legacy console project, wizard boilerplate included.
pub fn legacy_console_tree() -> ProjectRoot {
    let mut tree = ProjectRoot::new("TodoApp");
    tree.tools_version = Some("15.0".to_string());
    tree.default_targets = Some("Build".to_string());
    tree.add_import(r"$(MSBuildExtensionsPath)\$(MSBuildToolsVersion)\Microsoft.Common.props");

    let mut top = PropertyGroup::new();
    top.add("ProjectGuid", "{8F4A2C11-0F6E-4B4C-9E6F-3D1A1B2C3D4E}");
    top.add("OutputType", "Exe");
    top.add("RootNamespace", "TodoApp");
    top.add("AssemblyName", "TodoApp");
    top.add("TargetFrameworkVersion", "v4.7.2");
    top.add("FileAlignment", "512");
    tree.add_property_group(top);

    let mut debug = PropertyGroup::conditioned(DEBUG_CONDITION);
    debug.add("DebugSymbols", "true");
    debug.add("DebugType", "full");
    debug.add("Optimize", "false");
    debug.add("OutputPath", r"bin\Debug\");
    debug.add("DefineConstants", "DEBUG;TRACE");
    tree.add_property_group(debug);

    let mut release = PropertyGroup::conditioned(RELEASE_CONDITION);
    release.add("DebugType", "pdbonly");
    release.add("Optimize", "true");
    release.add("OutputPath", r"bin\Release\");
    release.add("DefineConstants", "TRACE");
    tree.add_property_group(release);

    let mut references = ItemGroup::new();
    references.add(ProjectItem::include("Reference", "System"));
    references.add(ProjectItem::include("Reference", "System.Core"));
    references.add(ProjectItem::include("Reference", "System.Xml"));
    references.add(ProjectItem::include("Reference", "System.Net.Http"));
    references.add(ProjectItem::include("Reference", "System.ValueTuple"));
    tree.add_item_group(references);

    let mut sources = ItemGroup::new();
    sources.add(ProjectItem::include("Compile", "Program.cs"));
    sources.add(ProjectItem::include("Compile", "Todo.cs"));
    sources.add(ProjectItem::include("Compile", r"Properties\AssemblyInfo.cs"));
    tree.add_item_group(sources);

    let mut extras = ItemGroup::new();
    extras.add(ProjectItem::include("None", "packages.config"));
    tree.add_item_group(extras);

    tree.add_import(r"$(MSBuildToolsPath)\Microsoft.CSharp.targets");
    tree
}

/// Evaluated legacy state matching [`legacy_console_tree`] for one configuration.
pub fn console_legacy_state(configuration: &str) -> EvaluatedProject {
    let debug = configuration.to_ascii_lowercase().starts_with("debug");
    let mut state = EvaluatedProject::new();
    state.set_property("OutputType", "Exe");
    state.set_property("RootNamespace", "TodoApp");
    state.set_property("AssemblyName", "TodoApp");
    state.set_property("TargetFrameworkVersion", "v4.7.2");
    state.set_property("FileAlignment", "512");
    if debug {
        state.set_property("DebugSymbols", "true");
        state.set_property("DebugType", "full");
        state.set_property("Optimize", "false");
        state.set_property("OutputPath", r"bin\Debug\");
        state.set_property("DefineConstants", "DEBUG;TRACE");
    } else {
        state.set_property("DebugType", "pdbonly");
        state.set_property("Optimize", "true");
        state.set_property("OutputPath", r"bin\Release\");
        state.set_property("DefineConstants", "TRACE");
    }
    for source in ["Program.cs", "Todo.cs", r"Properties\AssemblyInfo.cs"] {
        state.add_item("Compile", EvaluatedItem::new(source));
    }
    for reference in [
        "System",
        "System.Core",
        "System.Xml",
        "System.Net.Http",
        "System.ValueTuple",
    ] {
        state.add_item("Reference", EvaluatedItem::new(reference));
    }
    state.add_item("None", EvaluatedItem::new("packages.config"));
    state
}

/// Evaluated baseline state for the same project: what a minimal modern
/// descriptor exhibits once the SDK's defaults and implicit globs apply.
pub fn console_baseline_state(_configuration: &str) -> EvaluatedProject {
    let mut state = EvaluatedProject::new();
    state.set_property("OutputType", "Library");
    state.set_property("TargetFramework", "net472");
    state.set_property("RootNamespace", "TodoApp");
    state.set_property("AssemblyName", "TodoApp");
    state.set_property("FileAlignment", "512");
    state.set_property("DebugType", "portable");
    state.set_property("GenerateAssemblyInfo", "true");
    for source in ["Program.cs", "Todo.cs", r"Properties\AssemblyInfo.cs"] {
        state.add_item("Compile", EvaluatedItem::new(source));
    }
    state
}

/// `(configuration, legacy, baseline)` triples for the console fixture.
pub fn console_states() -> Vec<(String, EvaluatedProject, EvaluatedProject)> {
    [DEBUG, RELEASE]
        .iter()
        .map(|c| {
            (
                c.to_string(),
                console_legacy_state(c),
                console_baseline_state(c),
            )
        })
        .collect()
}

/// Lock entries matching the console fixture's `packages.config`.
pub fn console_lock_entries() -> Vec<PackageEntry> {
    vec![
        PackageEntry::new("Newtonsoft.Json", "13.0.1"),
        PackageEntry::new("System.ValueTuple", "4.5.0"),
    ]
}
