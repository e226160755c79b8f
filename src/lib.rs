//! Slipway - deterministic build-plan resolution for modular game projects
//!
//! This crate turns declarative module and target rules into concrete,
//! reproducible build plans: which modules a target builds, in what order,
//! and with what merged settings for a given build context.

pub mod core;
pub mod ops;
pub mod resolver;
pub mod util;

pub use crate::core::{
    Configuration, Context, ModuleRule, PchMode, Predicate, RuleRegistry, SharedSettings,
    TargetRule, TargetType,
};

pub use ops::load_rules;
pub use resolver::{resolve, resolve_all, BuildPlan, ResolutionError};
pub use util::{Diagnostic, Severity};
