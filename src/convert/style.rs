// src/convert/style.rs

//! Project style detection.
//!
//! Style is decided up front, from the untouched input tree, because the
//! import-rewrite pass destroys the evidence (the imports themselves) that
//! the decision rests on.

use std::fmt;

use tracing::debug;

use crate::rules;
use crate::tree::ProjectRoot;

/// SDK family a converted project belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectStyle {
    /// Plain library, console, or web-agnostic project
    Default,
    /// WPF or Windows Forms project
    WindowsDesktop,
    /// Carries imports the conversion does not understand; left untouched by
    /// the import-rewrite pass
    Custom,
}

impl ProjectStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::WindowsDesktop => "windows-desktop",
            Self::Custom => "custom",
        }
    }

    /// SDK identifier projects of this style declare
    pub fn sdk(&self) -> &'static str {
        match self {
            Self::WindowsDesktop => rules::DESKTOP_SDK,
            _ => rules::DEFAULT_SDK,
        }
    }

    pub fn is_desktop(&self) -> bool {
        matches!(self, Self::WindowsDesktop)
    }
}

impl fmt::Display for ProjectStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Desktop toolkits a project is detected to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DesktopFrameworks {
    pub wpf: bool,
    pub winforms: bool,
}

impl DesktopFrameworks {
    pub fn any(&self) -> bool {
        self.wpf || self.winforms
    }
}

/// Classify a legacy tree before any transformation touches it
pub fn detect_style(tree: &ProjectRoot) -> ProjectStyle {
    if let Some(import) = tree
        .imports()
        .find(|i| !rules::is_convertible_import(&i.project))
    {
        debug!(import = %import.project, "unrecognized import forces custom style");
        return ProjectStyle::Custom;
    }
    if detect_desktop_frameworks(tree).any() {
        ProjectStyle::WindowsDesktop
    } else {
        ProjectStyle::Default
    }
}

/// Scan references, item types, and properties for desktop toolkit markers
pub fn detect_desktop_frameworks(tree: &ProjectRoot) -> DesktopFrameworks {
    let mut frameworks = DesktopFrameworks::default();
    for group in tree.item_groups() {
        for item in &group.items {
            if item.is_type(rules::REFERENCE) {
                if rules::is_wpf_reference(item.path()) {
                    frameworks.wpf = true;
                }
                if rules::is_winforms_reference(item.path()) {
                    frameworks.winforms = true;
                }
            } else if rules::is_wpf_item_type(&item.item_type) {
                frameworks.wpf = true;
            }
        }
    }
    for group in tree.property_groups() {
        for property in &group.properties {
            let enabled = property.value.trim().eq_ignore_ascii_case("true");
            if property.name_matches(rules::USE_WPF) && enabled {
                frameworks.wpf = true;
            }
            if property.name_matches(rules::USE_WINDOWS_FORMS) && enabled {
                frameworks.winforms = true;
            }
        }
    }
    frameworks
}
