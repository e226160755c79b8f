//! Build-plan resolution.
//!
//! The pipeline for one target: compose each module's effective rule for
//! the context, build the dependency graph, order it, merge settings, and
//! validate the result into a [`BuildPlan`].

pub mod compose;
pub mod errors;
pub mod graph;
pub mod merge;
pub mod plan;
pub mod resolve;
pub mod validate;

pub use compose::{compose, ModuleSettings};
pub use errors::ResolutionError;
pub use graph::{DependencyKind, ModuleGraph};
pub use merge::{merge, MergedSettings, ModuleBuildSettings};
pub use plan::BuildPlan;
pub use resolve::{resolve, resolve_all};
pub use validate::validate;
