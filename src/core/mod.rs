//! Core data structures for Slipway.
//!
//! This module contains the foundational types used throughout Slipway:
//! - Build request contexts and configurations
//! - Predicates for conditional rule evaluation
//! - Module and target rule descriptors
//! - The frozen rule registry

pub mod context;
pub mod module_rule;
pub mod predicate;
pub mod registry;
pub mod target_rule;

pub use context::{Configuration, Context};
pub use module_rule::{ConditionalRule, ModuleRule, PchMode, RuleEffect};
pub use predicate::{evaluate, Predicate, PredicateError};
pub use registry::{RegistryBuilder, RegistryError, RuleRegistry};
pub use target_rule::{SharedSettings, TargetEffect, TargetRule, TargetType};
