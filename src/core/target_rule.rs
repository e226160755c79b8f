//! Target rule descriptors and shared target settings.
//!
//! A target aggregates modules into one build artifact. Sibling targets of
//! a project (typically the game and its editor) reference a shared
//! settings group by name; the group is applied to a mutable draft of each
//! target before graph construction so the siblings cannot silently drift.

use serde::{Deserialize, Serialize};

use crate::core::context::Context;
use crate::core::predicate::{evaluate, Predicate, PredicateError};

/// The kind of artifact a target produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    Game,
    Editor,
    Server,
    Client,
}

/// A declarative target rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetRule {
    /// Unique target name within a registry.
    pub name: String,

    /// Artifact kind.
    #[serde(rename = "type")]
    pub target_type: TargetType,

    /// Modules pulled in regardless of dependency edges.
    #[serde(default)]
    pub extra_modules: Vec<String>,

    /// Name of a shared settings group applied before resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_settings: Option<String>,
}

impl TargetRule {
    /// Create a target with no extra modules.
    pub fn new(name: impl Into<String>, target_type: TargetType) -> Self {
        TargetRule {
            name: name.into(),
            target_type,
            extra_modules: Vec::new(),
            shared_settings: None,
        }
    }

    /// Add extra modules.
    pub fn modules<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_modules
            .extend(modules.into_iter().map(Into::into));
        self
    }

    /// Reference a shared settings group.
    pub fn shared(mut self, group: impl Into<String>) -> Self {
        self.shared_settings = Some(group.into());
        self
    }
}

/// A mutation a shared settings group may apply to a target draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetEffect {
    AddExtraModule(String),
    RemoveExtraModule(String),
}

/// A predicate paired with target effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalTargetRule {
    pub predicate: Predicate,
    pub effects: Vec<TargetEffect>,
}

/// Cross-cutting settings shared by a family of sibling targets.
///
/// Application is pure given the context and the target draft, and is run
/// exactly once per referencing target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SharedSettings {
    /// Group name targets reference via `TargetRule::shared_settings`.
    pub name: String,

    /// Modules added to every referencing target.
    #[serde(default)]
    pub extra_modules: Vec<String>,

    /// Conditional target mutations, applied in declaration order.
    #[serde(default, rename = "conditional")]
    pub conditional_rules: Vec<ConditionalTargetRule>,
}

impl SharedSettings {
    /// Create an empty group.
    pub fn new(name: impl Into<String>) -> Self {
        SharedSettings {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add modules to the group.
    pub fn modules<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_modules
            .extend(modules.into_iter().map(Into::into));
        self
    }

    /// Attach a conditional rule.
    pub fn when(mut self, predicate: Predicate, effects: Vec<TargetEffect>) -> Self {
        self.conditional_rules
            .push(ConditionalTargetRule { predicate, effects });
        self
    }

    /// Apply the group to a target draft.
    pub fn apply(&self, ctx: &Context, target: &mut TargetRule) -> Result<(), PredicateError> {
        for module in &self.extra_modules {
            if !target.extra_modules.contains(module) {
                target.extra_modules.push(module.clone());
            }
        }

        for conditional in &self.conditional_rules {
            if !evaluate(&conditional.predicate, ctx)? {
                continue;
            }
            for effect in &conditional.effects {
                match effect {
                    TargetEffect::AddExtraModule(name) => {
                        if !target.extra_modules.contains(name) {
                            target.extra_modules.push(name.clone());
                        }
                    }
                    TargetEffect::RemoveExtraModule(name) => {
                        target.extra_modules.retain(|m| m != name);
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::Configuration;

    #[test]
    fn test_apply_does_not_duplicate_modules() {
        let shared = SharedSettings::new("project_defaults").modules(["GameCore", "Telemetry"]);
        let ctx = Context::new(Configuration::Development, "linux");

        let mut target = TargetRule::new("Game", TargetType::Game).modules(["GameCore"]);
        shared.apply(&ctx, &mut target).unwrap();

        assert_eq!(target.extra_modules, vec!["GameCore", "Telemetry"]);
    }

    #[test]
    fn test_conditional_target_effect() {
        let shared = SharedSettings::new("project_defaults").when(
            Predicate::Not(Box::new(Predicate::ConfigurationIs(
                Configuration::Shipping,
            ))),
            vec![TargetEffect::AddExtraModule("DebugTools".into())],
        );

        let mut dev_target = TargetRule::new("Game", TargetType::Game);
        shared
            .apply(
                &Context::new(Configuration::Development, "linux"),
                &mut dev_target,
            )
            .unwrap();
        assert!(dev_target.extra_modules.contains(&"DebugTools".to_string()));

        let mut ship_target = TargetRule::new("Game", TargetType::Game);
        shared
            .apply(
                &Context::new(Configuration::Shipping, "linux"),
                &mut ship_target,
            )
            .unwrap();
        assert!(ship_target.extra_modules.is_empty());
    }

    #[test]
    fn test_siblings_stay_in_sync() {
        let shared = SharedSettings::new("family").modules(["GameCore", "SharedUi"]);
        let ctx = Context::new(Configuration::Development, "linux");

        let mut game = TargetRule::new("Game", TargetType::Game);
        let mut editor = TargetRule::new("GameEditor", TargetType::Editor).modules(["EditorShell"]);

        shared.apply(&ctx, &mut game).unwrap();
        shared.apply(&ctx, &mut editor).unwrap();

        for module in &shared.extra_modules {
            assert!(game.extra_modules.contains(module));
            assert!(editor.extra_modules.contains(module));
        }
    }
}
