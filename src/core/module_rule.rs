//! Module rule descriptors.
//!
//! A ModuleRule declares what a compilable module needs: its public and
//! private dependencies, preprocessor definitions, include paths, and
//! precompiled-header policy. Rules may extend a shared base rule by
//! composition and may carry conditional effects gated on predicates.
//!
//! Key principle: public declarations propagate to dependents, private don't.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::predicate::Predicate;

/// Precompiled-header policy for a module.
///
/// Ordered by restrictiveness: `None` is the most restrictive (every
/// translation unit carries its own includes), `Explicit` the least. A
/// target's effective mode is the minimum over its member modules.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum PchMode {
    /// No precompiled headers; forces include-what-you-use hygiene.
    None,
    /// Use the engine-wide shared PCH.
    #[default]
    Shared,
    /// Use a header designated by the module itself.
    Explicit,
}

impl fmt::Display for PchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PchMode::None => write!(f, "none"),
            PchMode::Shared => write!(f, "shared"),
            PchMode::Explicit => write!(f, "explicit"),
        }
    }
}

/// A declarative module rule.
///
/// Scalar policies (`pch_mode`, `use_unity_build`) are optional at the
/// declaration level: `None` means "inherit from the base rule, or the
/// engine default if there is no base". Dependency and definition sets are
/// additive across a base chain; definitions re-declared by an extending
/// rule override by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleRule {
    /// Unique module name within a registry.
    pub name: String,

    /// Optional base rule this rule extends (composition, not inheritance).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_rule: Option<String>,

    /// Dependencies whose public surface propagates to this module's dependents.
    #[serde(default)]
    pub public_dependencies: Vec<String>,

    /// Dependencies needed to build this module but invisible to dependents.
    #[serde(default)]
    pub private_dependencies: Vec<String>,

    /// Definitions exported to dependents.
    #[serde(default)]
    pub public_definitions: BTreeMap<String, String>,

    /// Definitions visible only when compiling this module.
    #[serde(default)]
    pub private_definitions: BTreeMap<String, String>,

    /// Include paths exported to dependents.
    #[serde(default)]
    pub public_include_paths: Vec<PathBuf>,

    /// Include paths visible only to this module.
    #[serde(default)]
    pub private_include_paths: Vec<PathBuf>,

    /// Precompiled-header policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pch_mode: Option<PchMode>,

    /// Designated header backing `PchMode::Explicit`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pch_header: Option<PathBuf>,

    /// Whether the module participates in unity builds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_unity_build: Option<bool>,

    /// Conditional effects, applied in declaration order after composition.
    #[serde(default, rename = "conditional")]
    pub conditional_rules: Vec<ConditionalRule>,
}

/// A predicate paired with the effects to apply when it holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalRule {
    pub predicate: Predicate,
    pub effects: Vec<RuleEffect>,
}

/// A single mutation a conditional rule may apply to a module's settings.
///
/// Later conditional rules observe the cumulative result of earlier ones
/// within the same composed rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleEffect {
    AddPublicDependency(String),
    AddPrivateDependency(String),
    /// Remove the named module from both dependency lists.
    RemoveDependency(String),
    AddPublicDefinition { name: String, value: String },
    AddPrivateDefinition { name: String, value: String },
    AddPublicIncludePath(PathBuf),
    AddPrivateIncludePath(PathBuf),
    SetPchMode(PchMode),
    SetUnityBuild(bool),
}

impl ModuleRule {
    /// Create an empty rule with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        ModuleRule {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the base rule this rule extends.
    pub fn extends(mut self, base: impl Into<String>) -> Self {
        self.base_rule = Some(base.into());
        self
    }

    /// Add public dependencies.
    pub fn public_deps<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.public_dependencies
            .extend(deps.into_iter().map(Into::into));
        self
    }

    /// Add private dependencies.
    pub fn private_deps<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.private_dependencies
            .extend(deps.into_iter().map(Into::into));
        self
    }

    /// Add a public definition.
    pub fn public_define(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.public_definitions.insert(name.into(), value.into());
        self
    }

    /// Add a private definition.
    pub fn private_define(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.private_definitions.insert(name.into(), value.into());
        self
    }

    /// Add a public include path.
    pub fn public_include(mut self, path: impl Into<PathBuf>) -> Self {
        self.public_include_paths.push(path.into());
        self
    }

    /// Add a private include path.
    pub fn private_include(mut self, path: impl Into<PathBuf>) -> Self {
        self.private_include_paths.push(path.into());
        self
    }

    /// Set the precompiled-header policy.
    pub fn pch(mut self, mode: PchMode) -> Self {
        self.pch_mode = Some(mode);
        self
    }

    /// Designate the header backing explicit PCH.
    pub fn with_pch_header(mut self, header: impl Into<PathBuf>) -> Self {
        self.pch_header = Some(header.into());
        self
    }

    /// Opt in or out of unity builds.
    pub fn unity(mut self, enabled: bool) -> Self {
        self.use_unity_build = Some(enabled);
        self
    }

    /// Attach a conditional rule.
    pub fn when(mut self, predicate: Predicate, effects: Vec<RuleEffect>) -> Self {
        self.conditional_rules
            .push(ConditionalRule { predicate, effects });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pch_restrictiveness_order() {
        assert!(PchMode::None < PchMode::Shared);
        assert!(PchMode::Shared < PchMode::Explicit);
        assert_eq!(
            [PchMode::Explicit, PchMode::None, PchMode::Shared]
                .into_iter()
                .min(),
            Some(PchMode::None)
        );
    }

    #[test]
    fn test_builder() {
        let rule = ModuleRule::new("GameCore")
            .extends("EngineModuleDefaults")
            .public_deps(["Core", "Gameplay"])
            .private_deps(["Slate"])
            .public_define("WITH_GAME_CORE", "1")
            .pch(PchMode::Explicit)
            .unity(false);

        assert_eq!(rule.name, "GameCore");
        assert_eq!(rule.base_rule.as_deref(), Some("EngineModuleDefaults"));
        assert_eq!(rule.public_dependencies, vec!["Core", "Gameplay"]);
        assert_eq!(rule.pch_mode, Some(PchMode::Explicit));
        assert_eq!(rule.use_unity_build, Some(false));
    }

    #[test]
    fn test_descriptor_toml() {
        let toml = r#"
            name = "DebugTools"
            private_dependencies = ["Core"]

            [[conditional]]
            predicate = "developer_tools"
            effects = [
                { add_private_dependency = "GameplayDebugger" },
                { add_public_definition = { name = "WITH_GAMEPLAY_DEBUGGER", value = "1" } },
            ]
        "#;

        let rule: ModuleRule = toml::from_str(toml).unwrap();
        assert_eq!(rule.name, "DebugTools");
        assert_eq!(rule.conditional_rules.len(), 1);
        assert_eq!(rule.conditional_rules[0].effects.len(), 2);
    }
}
