// src/lib.rs

//! Sdkify Project Converter
//!
//! Diff-driven migration of legacy MSBuild project descriptors to the
//! minimal, convention-driven SDK style.
//!
//! # Architecture
//!
//! - Diff-first: legacy and baseline projects are evaluated per
//!   configuration before any edit, and every removal is justified by that
//!   frozen comparison
//! - Tree edits only: the pipeline rewrites an in-memory descriptor tree;
//!   parsing, evaluation, lock reading, and serialization live behind traits
//! - Table-driven: SDK knowledge (implicit references, boilerplate
//!   properties, package equivalents) is static data, not scattered logic
//! - All-or-nothing output: a failing collaborator means nothing is written

pub mod convert;
pub mod diff;
mod error;
pub mod evaluate;
pub mod packages;
pub mod report;
pub mod rules;
pub mod tree;

pub use convert::style::{DesktopFrameworks, ProjectStyle};
pub use convert::{ConversionOptions, Converter, ProjectWriter};
pub use diff::{ItemsDiff, MigrationState, ProjectDiff, PropertiesDiff};
pub use error::{Error, Result};
pub use evaluate::{EvaluatedItem, EvaluatedProject, Evaluator};
pub use packages::{NoPackageLock, PackageEntry, PackageLockReader};
pub use report::DiffReport;
pub use tree::{
    ItemGroup, ItemSpec, ProjectItem, ProjectPart, ProjectRoot, Property, PropertyGroup,
};
