// src/report.rs

//! Conversion reports.
//!
//! A report is a serializable snapshot of the pre-transformation diff, one
//! section per configuration. It answers "what did the conversion consider
//! redundant, and why" without requiring the reader to re-run anything: the
//! text form is for humans skimming a migration, the JSON form for tooling
//! that audits conversions in bulk.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::diff::{MigrationState, ProjectDiff};
use crate::Result;

/// Snapshot of every per-configuration diff for one project
#[derive(Debug, Clone, Serialize)]
pub struct DiffReport {
    pub project: String,
    pub default_configuration: String,
    pub configurations: Vec<ProjectDiff>,
}

impl DiffReport {
    /// Capture the diffs held by a migration state
    pub fn from_state(project: impl Into<String>, state: &MigrationState) -> Self {
        Self {
            project: project.into(),
            default_configuration: state.default_configuration().to_string(),
            configurations: state.configurations().map(|cs| cs.diff.clone()).collect(),
        }
    }

    /// Render the report as human-readable text
    ///
    /// Empty sections are omitted; a configuration with an empty diff still
    /// gets its header so the reader can tell it was examined.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Project: {}\n", self.project));
        out.push_str(&format!(
            "Default configuration: {}\n",
            self.default_configuration
        ));
        for diff in &self.configurations {
            out.push('\n');
            out.push_str(&format!("Configuration: {}\n", diff.configuration));

            render_section(
                &mut out,
                "Defaulted properties",
                diff.properties
                    .defaulted()
                    .map(|p| format!("{} = {}", p.name, p.value)),
            );
            render_section(
                &mut out,
                "Changed properties",
                diff.properties
                    .changed()
                    .map(|p| format!("{}: {} -> {}", p.name, p.legacy, p.baseline)),
            );
            render_section(
                &mut out,
                "Properties only in the legacy project",
                diff.properties
                    .legacy_only()
                    .map(|p| format!("{} = {}", p.name, p.value)),
            );
            render_section(
                &mut out,
                "Properties introduced by the SDK",
                diff.properties
                    .baseline_only()
                    .map(|p| format!("{} = {}", p.name, p.value)),
            );
            render_section(
                &mut out,
                "Defaulted items",
                diff.items.defaulted().map(|(ty, inc)| format!("{ty}: {inc}")),
            );
            render_section(
                &mut out,
                "Items with changed metadata",
                diff.items.changed().map(|(ty, inc)| format!("{ty}: {inc}")),
            );
            render_section(
                &mut out,
                "Items only in the legacy project",
                diff.items
                    .legacy_only()
                    .map(|(ty, inc)| format!("{ty}: {inc}")),
            );
            render_section(
                &mut out,
                "Items introduced by the SDK",
                diff.items
                    .baseline_only()
                    .map(|(ty, inc)| format!("{ty}: {inc}")),
            );
        }
        out
    }

    /// Render the report as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the text form to `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.render())?;
        Ok(())
    }

    /// Write the JSON form to `path`
    pub fn save_json(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

fn render_section(out: &mut String, title: &str, lines: impl Iterator<Item = String>) {
    let mut lines = lines.peekable();
    if lines.peek().is_none() {
        return;
    }
    out.push_str(&format!("  {title}:\n"));
    for line in lines {
        out.push_str(&format!("    {line}\n"));
    }
}
