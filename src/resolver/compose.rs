//! Rule composition.
//!
//! Flattens a module rule against its base chain into one concrete
//! settings snapshot, then applies conditional effects against the active
//! context. This replaces constructor-order inheritance with an explicit,
//! acyclic fold: base declarations first, extending declarations layered
//! on top, conditionals last (inherited conditionals before the rule's
//! own, each list in declaration order).

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::core::context::Context;
use crate::core::module_rule::{ModuleRule, PchMode, RuleEffect};
use crate::core::predicate::evaluate;
use crate::core::registry::RuleRegistry;
use crate::resolver::errors::ResolutionError;

/// A module rule flattened to concrete values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleSettings {
    pub name: String,
    pub public_dependencies: Vec<String>,
    pub private_dependencies: Vec<String>,
    pub public_definitions: BTreeMap<String, String>,
    pub private_definitions: BTreeMap<String, String>,
    pub public_include_paths: Vec<PathBuf>,
    pub private_include_paths: Vec<PathBuf>,
    pub pch_mode: PchMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pch_header: Option<PathBuf>,
    pub use_unity_build: bool,
}

impl ModuleSettings {
    fn empty(name: &str) -> Self {
        ModuleSettings {
            name: name.to_string(),
            public_dependencies: Vec::new(),
            private_dependencies: Vec::new(),
            public_definitions: BTreeMap::new(),
            private_definitions: BTreeMap::new(),
            public_include_paths: Vec::new(),
            private_include_paths: Vec::new(),
            pch_mode: PchMode::default(),
            pch_header: None,
            use_unity_build: true,
        }
    }

    /// Direct dependencies, public first, in declaration order.
    pub fn all_dependencies(&self) -> impl Iterator<Item = &String> {
        self.public_dependencies
            .iter()
            .chain(self.private_dependencies.iter())
    }
}

/// Flatten a module rule for the given context.
///
/// The registry guarantees base chains are present and acyclic, so the walk
/// here terminates; a dangling reference is still reported rather than
/// panicking.
pub fn compose(
    registry: &RuleRegistry,
    ctx: &Context,
    name: &str,
) -> Result<ModuleSettings, ResolutionError> {
    // Collect the extension chain, base-most rule first.
    let mut chain: Vec<&ModuleRule> = Vec::new();
    let mut current = name;
    loop {
        let rule = registry
            .module(current)
            .ok_or_else(|| ResolutionError::UnknownModuleReference {
                referrer: name.to_string(),
                missing: current.to_string(),
            })?;
        chain.push(rule);
        match &rule.base_rule {
            Some(base) => current = base,
            None => break,
        }
    }
    chain.reverse();

    let mut settings = ModuleSettings::empty(name);

    // Layer declarations: dependency sets union, definitions override by
    // key, scalar policies override when declared.
    for rule in &chain {
        for dep in &rule.public_dependencies {
            push_unique(&mut settings.public_dependencies, dep);
        }
        for dep in &rule.private_dependencies {
            push_unique(&mut settings.private_dependencies, dep);
        }
        settings
            .public_definitions
            .extend(rule.public_definitions.clone());
        settings
            .private_definitions
            .extend(rule.private_definitions.clone());
        for path in &rule.public_include_paths {
            push_unique(&mut settings.public_include_paths, path);
        }
        for path in &rule.private_include_paths {
            push_unique(&mut settings.private_include_paths, path);
        }
        if let Some(mode) = rule.pch_mode {
            settings.pch_mode = mode;
        }
        if let Some(header) = &rule.pch_header {
            settings.pch_header = Some(header.clone());
        }
        if let Some(unity) = rule.use_unity_build {
            settings.use_unity_build = unity;
        }
    }

    // Conditionals run after all declarations, base rules first, so later
    // effects observe the cumulative state of earlier ones.
    for rule in &chain {
        for conditional in &rule.conditional_rules {
            let holds = evaluate(&conditional.predicate, ctx).map_err(|e| {
                ResolutionError::InvalidPredicate {
                    rule: rule.name.clone(),
                    reason: e.to_string(),
                }
            })?;
            if !holds {
                continue;
            }
            for effect in &conditional.effects {
                apply_effect(&mut settings, effect);
            }
        }
    }

    Ok(settings)
}

fn apply_effect(settings: &mut ModuleSettings, effect: &RuleEffect) {
    match effect {
        RuleEffect::AddPublicDependency(dep) => {
            push_unique(&mut settings.public_dependencies, dep);
        }
        RuleEffect::AddPrivateDependency(dep) => {
            push_unique(&mut settings.private_dependencies, dep);
        }
        RuleEffect::RemoveDependency(dep) => {
            settings.public_dependencies.retain(|d| d != dep);
            settings.private_dependencies.retain(|d| d != dep);
        }
        RuleEffect::AddPublicDefinition { name, value } => {
            settings
                .public_definitions
                .insert(name.clone(), value.clone());
        }
        RuleEffect::AddPrivateDefinition { name, value } => {
            settings
                .private_definitions
                .insert(name.clone(), value.clone());
        }
        RuleEffect::AddPublicIncludePath(path) => {
            push_unique(&mut settings.public_include_paths, path);
        }
        RuleEffect::AddPrivateIncludePath(path) => {
            push_unique(&mut settings.private_include_paths, path);
        }
        RuleEffect::SetPchMode(mode) => {
            settings.pch_mode = *mode;
        }
        RuleEffect::SetUnityBuild(enabled) => {
            settings.use_unity_build = *enabled;
        }
    }
}

fn push_unique<T: Clone + PartialEq>(items: &mut Vec<T>, item: &T) {
    if !items.contains(item) {
        items.push(item.clone());
    }
}
