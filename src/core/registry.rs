//! The rule registry.
//!
//! Holds all module and target rules plus shared settings groups. Built
//! once, validated, then frozen: resolution only ever reads it, which is
//! what makes per-target resolution safe to run in parallel.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::core::module_rule::ModuleRule;
use crate::core::target_rule::{SharedSettings, TargetRule};

/// Error raised while building a registry.
///
/// These are load-time errors: the registry refuses to freeze with any of
/// them present, before any target is resolved.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("duplicate module rule `{name}`")]
    DuplicateModule { name: String },

    #[error("duplicate target rule `{name}`")]
    DuplicateTarget { name: String },

    #[error("duplicate shared settings group `{name}`")]
    DuplicateSharedSettings { name: String },

    #[error("module rule `{rule}` extends unknown base rule `{base}`")]
    UnknownBaseRule { rule: String, base: String },

    #[error("target `{target}` references unknown shared settings group `{group}`")]
    UnknownSharedSettings { target: String, group: String },

    #[error("cyclic rule composition: {}", cycle.join(" -> "))]
    CyclicRuleComposition { cycle: Vec<String> },

    #[error("module rule `{name}` lists itself as a dependency")]
    SelfDependency { name: String },
}

/// Immutable, validated rule set.
#[derive(Debug, Clone)]
pub struct RuleRegistry {
    modules: Vec<ModuleRule>,
    module_index: BTreeMap<String, usize>,
    targets: Vec<TargetRule>,
    target_index: BTreeMap<String, usize>,
    shared_settings: BTreeMap<String, SharedSettings>,
}

impl RuleRegistry {
    /// Start building a registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Look up a module rule by name.
    pub fn module(&self, name: &str) -> Option<&ModuleRule> {
        self.module_index.get(name).map(|&i| &self.modules[i])
    }

    /// The position of a module in declaration order. Used as the
    /// deterministic tie-breaker for topological ordering.
    pub fn declaration_index(&self, name: &str) -> Option<usize> {
        self.module_index.get(name).copied()
    }

    /// All module rules in declaration order.
    pub fn modules(&self) -> &[ModuleRule] {
        &self.modules
    }

    /// Look up a target rule by name.
    pub fn target(&self, name: &str) -> Option<&TargetRule> {
        self.target_index.get(name).map(|&i| &self.targets[i])
    }

    /// All target rules in registration order.
    pub fn targets(&self) -> &[TargetRule] {
        &self.targets
    }

    /// Look up a shared settings group by name.
    pub fn shared_settings(&self, name: &str) -> Option<&SharedSettings> {
        self.shared_settings.get(name)
    }
}

/// Mutable accumulation stage of a [`RuleRegistry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    modules: Vec<ModuleRule>,
    targets: Vec<TargetRule>,
    shared_settings: Vec<SharedSettings>,
}

impl RegistryBuilder {
    /// Add a module rule.
    pub fn add_module(mut self, rule: ModuleRule) -> Self {
        self.modules.push(rule);
        self
    }

    /// Add a target rule.
    pub fn add_target(mut self, rule: TargetRule) -> Self {
        self.targets.push(rule);
        self
    }

    /// Add a shared settings group.
    pub fn add_shared_settings(mut self, settings: SharedSettings) -> Self {
        self.shared_settings.push(settings);
        self
    }

    /// Validate and freeze the registry.
    pub fn build(self) -> Result<RuleRegistry, RegistryError> {
        let mut module_index = BTreeMap::new();
        for (i, module) in self.modules.iter().enumerate() {
            if module_index.insert(module.name.clone(), i).is_some() {
                return Err(RegistryError::DuplicateModule {
                    name: module.name.clone(),
                });
            }
        }

        let mut target_index = BTreeMap::new();
        for (i, target) in self.targets.iter().enumerate() {
            if target_index.insert(target.name.clone(), i).is_some() {
                return Err(RegistryError::DuplicateTarget {
                    name: target.name.clone(),
                });
            }
        }

        let mut shared_settings = BTreeMap::new();
        for group in self.shared_settings {
            if shared_settings.contains_key(&group.name) {
                return Err(RegistryError::DuplicateSharedSettings { name: group.name });
            }
            shared_settings.insert(group.name.clone(), group);
        }

        for target in &self.targets {
            if let Some(group) = &target.shared_settings {
                if !shared_settings.contains_key(group) {
                    return Err(RegistryError::UnknownSharedSettings {
                        target: target.name.clone(),
                        group: group.clone(),
                    });
                }
            }
        }

        for module in &self.modules {
            if module.public_dependencies.iter().any(|d| *d == module.name)
                || module
                    .private_dependencies
                    .iter()
                    .any(|d| *d == module.name)
            {
                return Err(RegistryError::SelfDependency {
                    name: module.name.clone(),
                });
            }
        }

        check_base_chains(&self.modules, &module_index)?;

        tracing::debug!(
            modules = self.modules.len(),
            targets = self.targets.len(),
            "registry frozen"
        );

        Ok(RuleRegistry {
            modules: self.modules,
            module_index,
            targets: self.targets,
            target_index,
            shared_settings,
        })
    }
}

/// Verify every `base_rule` reference exists and no extension chain cycles.
fn check_base_chains(
    modules: &[ModuleRule],
    index: &BTreeMap<String, usize>,
) -> Result<(), RegistryError> {
    for module in modules {
        let mut chain = vec![module.name.clone()];
        let mut current = module;

        while let Some(base_name) = &current.base_rule {
            let Some(&base_idx) = index.get(base_name) else {
                return Err(RegistryError::UnknownBaseRule {
                    rule: current.name.clone(),
                    base: base_name.clone(),
                });
            };

            if chain.contains(base_name) {
                let start = chain.iter().position(|n| n == base_name).unwrap_or(0);
                let mut cycle: Vec<String> = chain[start..].to_vec();
                cycle.push(base_name.clone());
                return Err(RegistryError::CyclicRuleComposition { cycle });
            }

            chain.push(base_name.clone());
            current = &modules[base_idx];
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::target_rule::TargetType;

    #[test]
    fn test_duplicate_module_rejected() {
        let err = RuleRegistry::builder()
            .add_module(ModuleRule::new("Core"))
            .add_module(ModuleRule::new("Core"))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateModule {
                name: "Core".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_base_rule_rejected() {
        let err = RuleRegistry::builder()
            .add_module(ModuleRule::new("GameCore").extends("Missing"))
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownBaseRule { .. }));
    }

    #[test]
    fn test_cyclic_composition_rejected() {
        let err = RuleRegistry::builder()
            .add_module(ModuleRule::new("A").extends("B"))
            .add_module(ModuleRule::new("B").extends("A"))
            .build()
            .unwrap_err();

        match err {
            RegistryError::CyclicRuleComposition { cycle } => {
                assert_eq!(cycle, vec!["A", "B", "A"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_self_dependency_rejected() {
        let err = RuleRegistry::builder()
            .add_module(ModuleRule::new("Core").public_deps(["Core"]))
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::SelfDependency { .. }));
    }

    #[test]
    fn test_target_with_unknown_shared_settings_rejected() {
        let err = RuleRegistry::builder()
            .add_target(TargetRule::new("Game", TargetType::Game).shared("missing_group"))
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownSharedSettings { .. }));
    }

    #[test]
    fn test_declaration_index_follows_add_order() {
        let registry = RuleRegistry::builder()
            .add_module(ModuleRule::new("Zeta"))
            .add_module(ModuleRule::new("Alpha"))
            .build()
            .unwrap();

        assert_eq!(registry.declaration_index("Zeta"), Some(0));
        assert_eq!(registry.declaration_index("Alpha"), Some(1));
    }
}
