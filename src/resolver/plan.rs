//! Build plans.
//!
//! A BuildPlan is the output of resolving one target: the modules it
//! builds in dependency order, the merged settings the compiler driver
//! needs, and any non-fatal diagnostics gathered along the way. Plans are
//! produced fresh on every resolution call; nothing is cached between
//! calls.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use crate::core::module_rule::PchMode;
use crate::core::target_rule::TargetType;
use crate::resolver::merge::ModuleBuildSettings;
use crate::util::diagnostic::Diagnostic;

/// The resolved build plan for one target.
#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
    /// Target name
    pub target: String,

    /// Artifact kind
    pub target_type: TargetType,

    /// Module names in topological order (dependencies first)
    pub resolved_modules: Vec<String>,

    /// Per-module effective settings, same order as `resolved_modules`
    pub modules: Vec<ModuleBuildSettings>,

    /// Target-level merged definitions
    pub merged_definitions: BTreeMap<String, String>,

    /// Target-level merged include paths
    pub merged_include_paths: Vec<PathBuf>,

    /// Effective precompiled-header mode
    pub pch_mode: PchMode,

    /// Effective unity-build toggle
    pub use_unity_build: bool,

    /// Non-fatal findings from resolution
    pub diagnostics: Vec<Diagnostic>,
}

impl BuildPlan {
    /// Look up a module's effective settings.
    pub fn module(&self, name: &str) -> Option<&ModuleBuildSettings> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// Whether the plan includes a module.
    pub fn contains_module(&self, name: &str) -> bool {
        self.resolved_modules.iter().any(|m| m == name)
    }

    /// Number of modules in the plan.
    pub fn module_count(&self) -> usize {
        self.resolved_modules.len()
    }

    /// Serialize the plan as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_plan() -> BuildPlan {
        BuildPlan {
            target: "Game".to_string(),
            target_type: TargetType::Game,
            resolved_modules: vec!["Core".to_string(), "GameCore".to_string()],
            modules: vec![
                ModuleBuildSettings {
                    name: "Core".to_string(),
                    visible_modules: vec![],
                    definitions: BTreeMap::new(),
                    include_paths: vec![],
                },
                ModuleBuildSettings {
                    name: "GameCore".to_string(),
                    visible_modules: vec!["Core".to_string()],
                    definitions: BTreeMap::from([("WITH_CORE".to_string(), "1".to_string())]),
                    include_paths: vec![PathBuf::from("Core/Public")],
                },
            ],
            merged_definitions: BTreeMap::from([("WITH_CORE".to_string(), "1".to_string())]),
            merged_include_paths: vec![PathBuf::from("Core/Public")],
            pch_mode: PchMode::Shared,
            use_unity_build: true,
            diagnostics: vec![],
        }
    }

    #[test]
    fn test_module_lookup() {
        let plan = sample_plan();
        assert!(plan.contains_module("Core"));
        assert!(!plan.contains_module("Editor"));
        assert_eq!(plan.module_count(), 2);
        assert_eq!(
            plan.module("GameCore").unwrap().visible_modules,
            vec!["Core"]
        );
    }

    #[test]
    fn test_json_serialization_is_ordered() {
        let plan = sample_plan();
        let json = plan.to_json().unwrap();
        assert!(json.contains("\"resolved_modules\""));
        assert!(json.contains("\"pch_mode\": \"shared\""));

        // Identical plans must serialize identically.
        assert_eq!(json, sample_plan().to_json().unwrap());
    }
}
