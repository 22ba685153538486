// src/rules/mod.rs

//! Static migration knowledge: deny lists, equivalence maps, and default-value
//! rules.
//!
//! Everything here is data, not policy. The tables encode what the modern SDK
//! already provides (properties it sets, assemblies it references, item
//! metadata it infers) so the transformation passes can consult them without
//! re-deriving SDK behavior. Names compare case-insensitively throughout;
//! table entries are stored case-folded.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

/// SDK identifier for ordinary projects
pub const DEFAULT_SDK: &str = "Microsoft.NET.Sdk";

/// SDK identifier for WPF and Windows Forms projects
pub const DESKTOP_SDK: &str = "Microsoft.NET.Sdk.WindowsDesktop";

/// Target framework the desktop SDK requires as a floor
pub const DESKTOP_TARGET_FRAMEWORK: &str = "netcoreapp3.0";

/// Last-resort target framework when the legacy project declares none
pub const FALLBACK_TARGET_FRAMEWORK: &str = "net472";

pub const TARGET_FRAMEWORK: &str = "TargetFramework";
pub const TARGET_FRAMEWORK_VERSION: &str = "TargetFrameworkVersion";
pub const USE_WPF: &str = "UseWPF";
pub const USE_WINDOWS_FORMS: &str = "UseWindowsForms";
pub const GENERATE_ASSEMBLY_INFO: &str = "GenerateAssemblyInfo";
pub const REFERENCE: &str = "Reference";
pub const PACKAGE_REFERENCE: &str = "PackageReference";
pub const VERSION_METADATA: &str = "Version";
pub const VALUE_TUPLE_PACKAGE: &str = "System.ValueTuple";
pub const PACKAGES_CONFIG_FILE: &str = "packages.config";

/// Properties the SDK computes itself; declaring them is never useful
static UNNECESSARY_PROPERTIES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "projectguid",
        "projecttypeguids",
        "targetframeworkidentifier",
        "targetframeworkversion",
        "targetframeworkprofile",
        "filealignment",
        "oldtoolsversion",
        "appdesignerfolder",
        "schemaversion",
        "productversion",
        "visualstudioversion",
        "vstoolspath",
    ])
});

/// Assembly references the SDK supplies implicitly, plus package ids that
/// modern frameworks ship in the box
static UNNECESSARY_INCLUDES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "mscorlib",
        "system",
        "system.core",
        "system.data",
        "system.drawing",
        "system.io.compression.filesystem",
        "system.numerics",
        "system.runtime.serialization",
        "system.xml",
        "system.xml.linq",
        "microsoft.csharp",
        "netstandard.library",
    ])
});

/// Assembly references that modern projects consume as packages instead,
/// mapped to the package id and the version matching the legacy assembly
static REFERENCE_PACKAGE_EQUIVALENTS: LazyLock<HashMap<&'static str, (&'static str, &'static str)>> =
    LazyLock::new(|| {
        HashMap::from([
            ("system.net.http", ("System.Net.Http", "4.3.4")),
            ("system.valuetuple", ("System.ValueTuple", "4.5.0")),
            ("system.buffers", ("System.Buffers", "4.5.1")),
            ("system.memory", ("System.Memory", "4.5.5")),
            ("system.numerics.vectors", ("System.Numerics.Vectors", "4.5.0")),
            (
                "system.runtime.compilerservices.unsafe",
                ("System.Runtime.CompilerServices.Unsafe", "4.5.3"),
            ),
        ])
    });

/// Metadata keys that are pure designer decoration; stripping them leaves the
/// item meaningful
static REMOVABLE_ITEM_METADATA: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| HashSet::from(["subtype", "designtime", "autogen"]));

/// Metadata keys whose presence marks the whole item as designer plumbing the
/// SDK regenerates on its own
static UNNECESSARY_ITEM_METADATA: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| HashSet::from(["generator", "lastgenoutput"]));

/// Framework assemblies that mark a WPF project
static KNOWN_WPF_REFERENCES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "presentationcore",
        "presentationframework",
        "windowsbase",
        "system.xaml",
    ])
});

/// Framework assemblies that mark a Windows Forms project
static KNOWN_WINFORMS_REFERENCES: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| HashSet::from(["system.windows.forms", "system.deployment"]));

/// Item types that only the WPF build targets understand
static KNOWN_WPF_ITEM_TYPES: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| HashSet::from(["page", "applicationdefinition"]));

/// Import path suffixes the SDK attribute subsumes
static CONVERTIBLE_IMPORT_SUFFIXES: &[&str] = &[
    "microsoft.csharp.targets",
    "microsoft.visualbasic.targets",
    "microsoft.common.props",
    "microsoft.common.targets",
];

/// True when the SDK computes this property itself
pub fn is_unnecessary_property(name: &str) -> bool {
    UNNECESSARY_PROPERTIES.contains(name.to_ascii_lowercase().as_str())
}

/// True when the SDK makes this include redundant
pub fn is_unnecessary_include(include: &str) -> bool {
    UNNECESSARY_INCLUDES.contains(include.to_ascii_lowercase().as_str())
}

/// Package replacement for a legacy assembly reference, if one exists
pub fn package_equivalent(reference: &str) -> Option<(&'static str, &'static str)> {
    REFERENCE_PACKAGE_EQUIVALENTS
        .get(reference.to_ascii_lowercase().as_str())
        .copied()
}

/// True when every metadata key is strippable decoration (and there is any)
pub fn metadata_is_fully_removable(metadata: &BTreeMap<String, String>) -> bool {
    !metadata.is_empty()
        && metadata
            .keys()
            .all(|k| REMOVABLE_ITEM_METADATA.contains(k.to_ascii_lowercase().as_str()))
}

/// True when every metadata key marks regenerated designer plumbing
pub fn metadata_is_wholly_unnecessary(metadata: &BTreeMap<String, String>) -> bool {
    !metadata.is_empty()
        && metadata
            .keys()
            .all(|k| UNNECESSARY_ITEM_METADATA.contains(k.to_ascii_lowercase().as_str()))
}

pub fn is_wpf_reference(name: &str) -> bool {
    KNOWN_WPF_REFERENCES.contains(name.to_ascii_lowercase().as_str())
}

pub fn is_winforms_reference(name: &str) -> bool {
    KNOWN_WINFORMS_REFERENCES.contains(name.to_ascii_lowercase().as_str())
}

/// True for references either desktop toolkit provides through its SDK
pub fn is_desktop_reference(name: &str) -> bool {
    is_wpf_reference(name) || is_winforms_reference(name)
}

pub fn is_wpf_item_type(item_type: &str) -> bool {
    KNOWN_WPF_ITEM_TYPES.contains(item_type.to_ascii_lowercase().as_str())
}

/// True when the SDK attribute replaces this explicit import
pub fn is_convertible_import(path: &str) -> bool {
    let path = path.trim().to_ascii_lowercase();
    CONVERTIBLE_IMPORT_SUFFIXES
        .iter()
        .any(|suffix| path.ends_with(suffix))
}

/// Configuration part of a `Config|Platform` identifier
pub fn configuration_name(identifier: &str) -> &str {
    identifier.split('|').next().unwrap_or(identifier)
}

/// True when a property declaration restates the stock template value for
/// its configuration
///
/// These are the values the legacy project wizard wrote into every new
/// project; an SDK project gets the same effect with no declaration at all.
pub fn is_default_valued_property(
    name: &str,
    value: &str,
    configuration: &str,
    project_name: &str,
) -> bool {
    let value = value.trim();
    let config = configuration_name(configuration);
    match name.to_ascii_lowercase().as_str() {
        "debugsymbols" => config.eq_ignore_ascii_case("Debug") && value.eq_ignore_ascii_case("true"),
        "debugtype" => {
            (config.eq_ignore_ascii_case("Debug") && value.eq_ignore_ascii_case("full"))
                || (config.eq_ignore_ascii_case("Release") && value.eq_ignore_ascii_case("pdbonly"))
        }
        "optimize" => {
            (config.eq_ignore_ascii_case("Debug") && value.eq_ignore_ascii_case("false"))
                || (config.eq_ignore_ascii_case("Release") && value.eq_ignore_ascii_case("true"))
        }
        "outputpath" => {
            normalize_path(value).eq_ignore_ascii_case(&format!("bin\\{config}"))
        }
        "platformtarget" => value.eq_ignore_ascii_case("AnyCPU"),
        "errorreport" => value.eq_ignore_ascii_case("prompt"),
        "warninglevel" => value == "4",
        "assemblyname" | "rootnamespace" => value.eq_ignore_ascii_case(project_name),
        "documentationfile" => {
            normalize_path(value).eq_ignore_ascii_case(&format!("bin\\{config}\\{project_name}.xml"))
        }
        "defineconstants" => {
            let declared: HashSet<String> = value
                .split(';')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_ascii_uppercase)
                .collect();
            let stock: HashSet<String> = if config.eq_ignore_ascii_case("Debug") {
                ["DEBUG", "TRACE"].iter().map(|s| s.to_string()).collect()
            } else if config.eq_ignore_ascii_case("Release") {
                ["TRACE"].iter().map(|s| s.to_string()).collect()
            } else {
                return false;
            };
            declared == stock
        }
        _ => false,
    }
}

fn normalize_path(path: &str) -> String {
    path.replace('/', "\\").trim_end_matches('\\').to_string()
}

/// True for monikers that target the classic desktop framework
///
/// Recognizes the compact `net472` style, the legacy `v4.7.2` style, and
/// spelled-out `.NETFramework` identifiers. Everything else (including
/// `net5.0` and later, which carry a dot) counts as modern.
pub fn is_framework_moniker(moniker: &str) -> bool {
    let m = moniker.trim().to_ascii_lowercase();
    if let Some(rest) = m.strip_prefix("net") {
        if !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()) {
            return true;
        }
    }
    if let Some(rest) = m.strip_prefix('v') {
        if !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit() || c == '.') {
            return true;
        }
    }
    m.contains("netframework")
}

/// Compact moniker for a legacy `v`-prefixed framework version
pub fn framework_from_version(version: &str) -> Option<String> {
    let rest = version.trim().strip_prefix(['v', 'V'])?;
    if rest.is_empty() || !rest.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    let digits: String = rest.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        None
    } else {
        Some(format!("net{digits}"))
    }
}

/// Canonical spelling of a target framework moniker
///
/// Classic framework monikers pass through unchanged. Modern monikers drop
/// separator dots while keeping the version dot (the one between two
/// digits), so `netcoreapp.3.1` becomes `netcoreapp3.1` and `net5.0` stays
/// as written.
pub fn normalize_target_framework(moniker: &str) -> String {
    let m = moniker.trim();
    if is_framework_moniker(m) {
        return m.to_string();
    }
    let chars: Vec<char> = m.chars().collect();
    let mut out = String::with_capacity(chars.len());
    for (i, &c) in chars.iter().enumerate() {
        if c == '.' {
            let between_digits = i > 0
                && chars[i - 1].is_ascii_digit()
                && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit());
            if !between_digits {
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// True when the target framework ships `System.ValueTuple` in the box
///
/// Modern frameworks always do; the classic framework gained it in 4.7.
pub fn supplies_value_tuple(moniker: &str) -> bool {
    let m = moniker.trim();
    if !is_framework_moniker(m) {
        return true;
    }
    let canonical = framework_from_version(m).unwrap_or_else(|| m.to_ascii_lowercase());
    let Some(rest) = canonical.strip_prefix("net") else {
        return false;
    };
    let digits: Vec<u32> = rest.chars().filter_map(|c| c.to_digit(10)).collect();
    match (digits.first(), digits.get(1)) {
        (Some(&major), Some(&minor)) => major > 4 || (major == 4 && minor >= 7),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unnecessary_property_lookup() {
        assert!(is_unnecessary_property("ProjectGuid"));
        assert!(is_unnecessary_property("TARGETFRAMEWORKVERSION"));
        assert!(!is_unnecessary_property("OutputType"));
    }

    #[test]
    fn test_unnecessary_include_lookup() {
        assert!(is_unnecessary_include("System.Core"));
        assert!(is_unnecessary_include("mscorlib"));
        assert!(!is_unnecessary_include("Newtonsoft.Json"));
    }

    #[test]
    fn test_package_equivalent_lookup() {
        assert_eq!(
            package_equivalent("System.Net.Http"),
            Some(("System.Net.Http", "4.3.4"))
        );
        assert_eq!(
            package_equivalent("system.valuetuple"),
            Some(("System.ValueTuple", "4.5.0"))
        );
        assert_eq!(package_equivalent("PresentationCore"), None);
    }

    #[test]
    fn test_metadata_classification() {
        let mut decoration = BTreeMap::new();
        decoration.insert("SubType".to_string(), "Designer".to_string());
        decoration.insert("AutoGen".to_string(), "True".to_string());
        assert!(metadata_is_fully_removable(&decoration));
        assert!(!metadata_is_wholly_unnecessary(&decoration));

        let mut plumbing = BTreeMap::new();
        plumbing.insert("Generator".to_string(), "ResXFileCodeGenerator".to_string());
        plumbing.insert("LastGenOutput".to_string(), "Resources.Designer.cs".to_string());
        assert!(metadata_is_wholly_unnecessary(&plumbing));
        assert!(!metadata_is_fully_removable(&plumbing));

        let mut mixed = BTreeMap::new();
        mixed.insert("SubType".to_string(), "Designer".to_string());
        mixed.insert("DependentUpon".to_string(), "Form1.cs".to_string());
        assert!(!metadata_is_fully_removable(&mixed));
        assert!(!metadata_is_wholly_unnecessary(&mixed));

        let empty = BTreeMap::new();
        assert!(!metadata_is_fully_removable(&empty));
        assert!(!metadata_is_wholly_unnecessary(&empty));
    }

    #[test]
    fn test_desktop_reference_tables() {
        assert!(is_wpf_reference("PresentationFramework"));
        assert!(is_winforms_reference("System.Windows.Forms"));
        assert!(is_desktop_reference("windowsbase"));
        assert!(!is_desktop_reference("System.Net.Http"));
    }

    #[test]
    fn test_convertible_import_matches_by_suffix() {
        assert!(is_convertible_import(
            r"$(MSBuildToolsPath)\Microsoft.CSharp.targets"
        ));
        assert!(is_convertible_import(
            r"$(MSBuildExtensionsPath)\$(MSBuildToolsVersion)\Microsoft.Common.props"
        ));
        assert!(!is_convertible_import(r"..\build\Custom.targets"));
    }

    #[test]
    fn test_configuration_name_strips_platform() {
        assert_eq!(configuration_name("Debug|AnyCPU"), "Debug");
        assert_eq!(configuration_name("Release"), "Release");
    }

    #[test]
    fn test_default_valued_debug_type() {
        assert!(is_default_valued_property("DebugType", "full", "Debug|AnyCPU", "App"));
        assert!(is_default_valued_property("DebugType", "pdbonly", "Release", "App"));
        assert!(!is_default_valued_property("DebugType", "pdbonly", "Debug", "App"));
        assert!(!is_default_valued_property("DebugType", "embedded", "Release", "App"));
    }

    #[test]
    fn test_default_valued_output_path() {
        assert!(is_default_valued_property("OutputPath", r"bin\Debug\", "Debug|AnyCPU", "App"));
        assert!(is_default_valued_property("OutputPath", "bin/Release/", "Release", "App"));
        assert!(is_default_valued_property("OutputPath", r"bin\debug", "Debug", "App"));
        assert!(!is_default_valued_property("OutputPath", r"out\Debug\", "Debug", "App"));
        assert!(!is_default_valued_property("OutputPath", r"bin\Release\", "Debug", "App"));
    }

    #[test]
    fn test_default_valued_identity_properties() {
        assert!(is_default_valued_property("AssemblyName", "MyApp", "Debug", "MyApp"));
        assert!(is_default_valued_property("RootNamespace", "myapp", "Release", "MyApp"));
        assert!(!is_default_valued_property("AssemblyName", "Other", "Debug", "MyApp"));
    }

    #[test]
    fn test_default_valued_documentation_file() {
        assert!(is_default_valued_property(
            "DocumentationFile",
            r"bin\Debug\MyApp.xml",
            "Debug|AnyCPU",
            "MyApp"
        ));
        assert!(is_default_valued_property(
            "DocumentationFile",
            "bin/Release/MyApp.XML",
            "Release",
            "MyApp"
        ));
        assert!(!is_default_valued_property(
            "DocumentationFile",
            r"docs\MyApp.xml",
            "Debug",
            "MyApp"
        ));
    }

    #[test]
    fn test_default_valued_define_constants() {
        assert!(is_default_valued_property(
            "DefineConstants",
            "DEBUG;TRACE",
            "Debug|AnyCPU",
            "App"
        ));
        assert!(is_default_valued_property(
            "DefineConstants",
            "TRACE; DEBUG",
            "Debug",
            "App"
        ));
        assert!(is_default_valued_property("DefineConstants", "TRACE", "Release", "App"));
        assert!(!is_default_valued_property(
            "DefineConstants",
            "DEBUG;TRACE;CUSTOM",
            "Debug",
            "App"
        ));
        assert!(!is_default_valued_property("DefineConstants", "TRACE", "Custom", "App"));
    }

    #[test]
    fn test_framework_moniker_detection() {
        assert!(is_framework_moniker("net472"));
        assert!(is_framework_moniker("net48"));
        assert!(is_framework_moniker("v4.7.2"));
        assert!(is_framework_moniker(".NETFramework,Version=v4.7.2"));
        assert!(!is_framework_moniker("net5.0"));
        assert!(!is_framework_moniker("netcoreapp3.1"));
        assert!(!is_framework_moniker("netstandard2.0"));
    }

    #[test]
    fn test_framework_from_version() {
        assert_eq!(framework_from_version("v4.7.2"), Some("net472".to_string()));
        assert_eq!(framework_from_version("v4.8"), Some("net48".to_string()));
        assert_eq!(framework_from_version("net472"), None);
        assert_eq!(framework_from_version("vNext"), None);
    }

    #[test]
    fn test_normalize_target_framework() {
        assert_eq!(normalize_target_framework("netcoreapp.3.1"), "netcoreapp3.1");
        assert_eq!(normalize_target_framework("net.standard.2.0"), "netstandard2.0");
        assert_eq!(normalize_target_framework("net5.0"), "net5.0");
        assert_eq!(normalize_target_framework("netcoreapp3.0"), "netcoreapp3.0");
        assert_eq!(normalize_target_framework("net472"), "net472");
    }

    #[test]
    fn test_supplies_value_tuple() {
        assert!(supplies_value_tuple("net472"));
        assert!(supplies_value_tuple("net48"));
        assert!(supplies_value_tuple("v4.7.1"));
        assert!(supplies_value_tuple("netcoreapp3.0"));
        assert!(supplies_value_tuple("netstandard2.0"));
        assert!(!supplies_value_tuple("net462"));
        assert!(!supplies_value_tuple("v4.6.2"));
    }
}
