//! Loading rule files from disk.
//!
//! Rules live in `*.rules.toml` files: each file carries `[[module]]`,
//! `[[target]]`, and `[[shared_settings]]` arrays. A directory of rule
//! files is loaded in sorted path order so the frozen registry (and every
//! declaration-order tie-break downstream) is independent of filesystem
//! iteration order.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use walkdir::WalkDir;

use crate::core::module_rule::ModuleRule;
use crate::core::registry::{RegistryBuilder, RuleRegistry};
use crate::core::target_rule::{SharedSettings, TargetRule};

const RULES_SUFFIX: &str = ".rules.toml";

/// Raw contents of one rules file.
#[derive(Debug, Default, Deserialize)]
struct RulesFile {
    #[serde(default, rename = "module")]
    modules: Vec<ModuleRule>,

    #[serde(default, rename = "target")]
    targets: Vec<TargetRule>,

    #[serde(default, rename = "shared_settings")]
    shared_settings: Vec<SharedSettings>,
}

/// Load every `*.rules.toml` under `dir` into a frozen registry.
pub fn load_rules_dir(dir: &Path) -> Result<RuleRegistry> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry =
            entry.with_context(|| format!("failed to walk rules directory: {}", dir.display()))?;
        if entry.file_type().is_file() && is_rules_file(entry.path()) {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort();

    if files.is_empty() {
        anyhow::bail!("no *.rules.toml files found under {}", dir.display());
    }

    let mut builder = RuleRegistry::builder();
    for path in &files {
        builder = load_into(builder, path)?;
    }

    tracing::debug!(files = files.len(), dir = %dir.display(), "rules loaded");

    builder
        .build()
        .with_context(|| format!("invalid rule set under {}", dir.display()))
}

/// Load a single rules file into a frozen registry.
pub fn load_rules_file(path: &Path) -> Result<RuleRegistry> {
    load_into(RuleRegistry::builder(), path)?
        .build()
        .with_context(|| format!("invalid rule set in {}", path.display()))
}

fn load_into(mut builder: RegistryBuilder, path: &Path) -> Result<RegistryBuilder> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read rules file: {}", path.display()))?;

    let file: RulesFile = toml::from_str(&content)
        .with_context(|| format!("failed to parse rules file: {}", path.display()))?;

    for module in file.modules {
        builder = builder.add_module(module);
    }
    for target in file.targets {
        builder = builder.add_target(target);
    }
    for group in file.shared_settings {
        builder = builder.add_shared_settings(group);
    }

    Ok(builder)
}

fn is_rules_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.ends_with(RULES_SUFFIX))
        .unwrap_or(false)
}

/// Resolve a rules location that may be a file or a directory.
pub fn load_rules(path: &Path) -> Result<RuleRegistry> {
    if path.is_file() {
        load_rules_file(path)
    } else {
        load_rules_dir(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const ENGINE_RULES: &str = r#"
[[module]]
name = "Core"
public_include_paths = ["Core/Public"]

[[module]]
name = "GameCore"
base_rule = "Core"
public_dependencies = ["Core"]

[[module.conditional]]
predicate = "developer_tools"
effects = [{ add_public_definition = { name = "WITH_TOOLS", value = "1" } }]
"#;

    const TARGET_RULES: &str = r#"
[[shared_settings]]
name = "project_family"
extra_modules = ["GameCore"]

[[target]]
name = "Game"
type = "game"
shared_settings = "project_family"
"#;

    #[test]
    fn test_load_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.rules.toml");
        fs::write(&path, ENGINE_RULES).unwrap();

        let registry = load_rules_file(&path).unwrap();
        assert!(registry.module("Core").is_some());
        assert!(registry.module("GameCore").is_some());
    }

    #[test]
    fn test_load_directory_is_sorted() {
        let dir = tempfile::tempdir().unwrap();
        // Written out of order; load order must still follow sorted paths.
        fs::write(dir.path().join("b_targets.rules.toml"), TARGET_RULES).unwrap();
        fs::write(dir.path().join("a_engine.rules.toml"), ENGINE_RULES).unwrap();

        let registry = load_rules_dir(dir.path()).unwrap();
        assert_eq!(registry.declaration_index("Core"), Some(0));
        assert_eq!(registry.declaration_index("GameCore"), Some(1));
        assert!(registry.target("Game").is_some());
        assert!(registry.shared_settings("project_family").is_some());
    }

    #[test]
    fn test_non_rules_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("engine.rules.toml"), ENGINE_RULES).unwrap();
        fs::write(dir.path().join("notes.toml"), "junk = true").unwrap();

        let registry = load_rules_dir(dir.path()).unwrap();
        assert!(registry.module("Core").is_some());
    }

    #[test]
    fn test_empty_directory_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_rules_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("no *.rules.toml files"));
    }

    #[test]
    fn test_invalid_toml_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.rules.toml");
        fs::write(&path, "[[module]]\nname = ").unwrap();

        let err = load_rules_file(&path).unwrap_err();
        assert!(err.to_string().contains("broken.rules.toml"));
    }
}
