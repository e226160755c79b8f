//! Resolution entry points.
//!
//! `resolve` computes the build plan for one target; `resolve_all` runs
//! every registered target, in parallel, with per-target failure
//! isolation. Both only read the frozen registry and the context, so a
//! plan is a pure function of its inputs.

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::core::context::Context;
use crate::core::registry::RuleRegistry;
use crate::core::target_rule::TargetRule;
use crate::resolver::errors::ResolutionError;
use crate::resolver::graph::ModuleGraph;
use crate::resolver::merge::merge;
use crate::resolver::plan::BuildPlan;
use crate::resolver::validate::validate;

/// Resolve the build plan for a single target.
pub fn resolve(
    registry: &RuleRegistry,
    ctx: &Context,
    target_name: &str,
) -> Result<BuildPlan, ResolutionError> {
    let target = registry
        .target(target_name)
        .ok_or_else(|| ResolutionError::UnknownTarget {
            target: target_name.to_string(),
        })?;

    let draft = apply_shared_settings(registry, ctx, target)?;

    let (graph, mut diagnostics) = ModuleGraph::build(registry, ctx, &draft)?;
    graph.check_cycles()?;
    let order = graph.topological_order();

    let merged = merge(&graph, &order, &draft.name)?;
    diagnostics.extend(merged.diagnostics.iter().cloned());
    diagnostics.extend(validate(&graph, &merged, &draft)?);

    tracing::debug!(
        target = %draft.name,
        modules = order.len(),
        diagnostics = diagnostics.len(),
        "target resolved"
    );

    Ok(BuildPlan {
        target: draft.name,
        target_type: draft.target_type,
        resolved_modules: order,
        modules: merged.modules,
        merged_definitions: merged.definitions,
        merged_include_paths: merged.include_paths,
        pch_mode: merged.pch_mode,
        use_unity_build: merged.use_unity_build,
        diagnostics,
    })
}

/// Resolve every registered target.
///
/// Targets are independent given the frozen registry, so they resolve in
/// parallel. One target failing never blocks its siblings; each entry in
/// the result carries its own outcome.
pub fn resolve_all(
    registry: &RuleRegistry,
    ctx: &Context,
) -> BTreeMap<String, Result<BuildPlan, ResolutionError>> {
    registry
        .targets()
        .par_iter()
        .map(|target| (target.name.clone(), resolve(registry, ctx, &target.name)))
        .collect()
}

/// Produce the target draft with its shared settings group applied.
///
/// The group reference was validated when the registry froze; application
/// itself can still fail on an invalid predicate.
fn apply_shared_settings(
    registry: &RuleRegistry,
    ctx: &Context,
    target: &TargetRule,
) -> Result<TargetRule, ResolutionError> {
    let mut draft = target.clone();
    if let Some(group_name) = &target.shared_settings {
        let group = registry.shared_settings(group_name).ok_or_else(|| {
            ResolutionError::UnknownTarget {
                target: group_name.clone(),
            }
        })?;
        group
            .apply(ctx, &mut draft)
            .map_err(|e| ResolutionError::InvalidPredicate {
                rule: format!("shared settings `{}`", group_name),
                reason: e.to_string(),
            })?;
    }
    Ok(draft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::Configuration;
    use crate::core::module_rule::{ModuleRule, PchMode, RuleEffect};
    use crate::core::predicate::Predicate;
    use crate::core::target_rule::{SharedSettings, TargetEffect, TargetType};

    /// A small project in the shape of the domain: a game target and its
    /// editor sibling, engine-style leaf modules, and a debugger module
    /// gated on developer tooling.
    fn project_registry() -> RuleRegistry {
        RuleRegistry::builder()
            .add_module(ModuleRule::new("Core").public_include("Core/Public"))
            .add_module(ModuleRule::new("Slate").private_deps(["Core"]).unity(false))
            .add_module(ModuleRule::new("GameplayDebugger").private_deps(["Core"]))
            .add_module(
                ModuleRule::new("EngineModuleDefaults")
                    .pch(PchMode::Explicit)
                    .with_pch_header("Engine/EnginePch.h")
                    .when(
                        Predicate::Any(vec![
                            Predicate::DeveloperTools,
                            Predicate::not_in_configurations(vec![
                                Configuration::Shipping,
                                Configuration::Test,
                            ]),
                        ]),
                        vec![
                            RuleEffect::AddPrivateDependency("GameplayDebugger".into()),
                            RuleEffect::AddPublicDefinition {
                                name: "WITH_GAMEPLAY_DEBUGGER".into(),
                                value: "1".into(),
                            },
                        ],
                    )
                    .when(
                        Predicate::All(vec![
                            Predicate::Not(Box::new(Predicate::DeveloperTools)),
                            Predicate::ConfigurationIn(vec![
                                Configuration::Shipping,
                                Configuration::Test,
                            ]),
                        ]),
                        vec![RuleEffect::AddPublicDefinition {
                            name: "WITH_GAMEPLAY_DEBUGGER".into(),
                            value: "0".into(),
                        }],
                    ),
            )
            .add_module(
                ModuleRule::new("GameCore")
                    .extends("EngineModuleDefaults")
                    .public_deps(["Core"])
                    .public_define("WITH_GAME_CORE", "1"),
            )
            .add_module(
                ModuleRule::new("EditorShell")
                    .extends("EngineModuleDefaults")
                    .public_deps(["GameCore"])
                    .private_deps(["Slate"]),
            )
            .add_shared_settings(
                SharedSettings::new("project_family")
                    .modules(["GameCore"])
                    .when(
                        Predicate::EditorTarget,
                        vec![TargetEffect::AddExtraModule("EditorShell".into())],
                    ),
            )
            .add_target(TargetRule::new("Game", TargetType::Game).shared("project_family"))
            .add_target(TargetRule::new("GameEditor", TargetType::Editor).shared("project_family"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let registry = project_registry();
        let ctx = Context::new(Configuration::Development, "linux").with_developer_tools(true);

        let first = resolve(&registry, &ctx, "Game").unwrap().to_json().unwrap();
        for _ in 0..5 {
            let again = resolve(&registry, &ctx, "Game").unwrap().to_json().unwrap();
            assert_eq!(first, again);
        }
    }

    #[test]
    fn test_conditional_dependency_follows_context() {
        let registry = project_registry();

        let dev = Context::new(Configuration::Development, "linux").with_developer_tools(true);
        let plan = resolve(&registry, &dev, "Game").unwrap();
        assert!(plan.contains_module("GameplayDebugger"));
        assert_eq!(plan.merged_definitions["WITH_GAMEPLAY_DEBUGGER"], "1");

        let ship = Context::new(Configuration::Shipping, "linux");
        let plan = resolve(&registry, &ship, "Game").unwrap();
        assert!(!plan.contains_module("GameplayDebugger"));
        assert_eq!(plan.merged_definitions["WITH_GAMEPLAY_DEBUGGER"], "0");
    }

    #[test]
    fn test_unknown_target() {
        let registry = project_registry();
        let ctx = Context::new(Configuration::Development, "linux");
        let err = resolve(&registry, &ctx, "Server").unwrap_err();
        assert_eq!(
            err,
            ResolutionError::UnknownTarget {
                target: "Server".to_string(),
            }
        );
    }

    #[test]
    fn test_editor_pulls_editor_shell_and_disables_unity() {
        let registry = project_registry();
        let ctx = Context::new(Configuration::Development, "linux").with_editor(true);

        let plan = resolve(&registry, &ctx, "GameEditor").unwrap();
        assert!(plan.contains_module("EditorShell"));
        assert!(plan.contains_module("Slate"));
        // Slate opts out of unity builds for the whole target.
        assert!(!plan.use_unity_build);

        // A non-editor request stays lean.
        let game_ctx = Context::new(Configuration::Development, "linux");
        let game = resolve(&registry, &game_ctx, "Game").unwrap();
        assert!(!game.contains_module("EditorShell"));
        assert!(!game.contains_module("Slate"));
        assert!(game.use_unity_build);
    }

    #[test]
    fn test_sibling_targets_share_applied_settings() {
        let registry = project_registry();
        let ctx = Context::new(Configuration::Development, "linux").with_editor(true);

        let all = resolve_all(&registry, &ctx);
        let game = all["Game"].as_ref().unwrap();
        let editor = all["GameEditor"].as_ref().unwrap();

        // Both siblings received the shared module list.
        assert!(game.contains_module("GameCore"));
        assert!(editor.contains_module("GameCore"));
        // Fields the applier touches agree across siblings.
        assert!(game.contains_module("EditorShell"));
        assert!(editor.contains_module("EditorShell"));
    }

    #[test]
    fn test_resolve_all_isolates_failures() {
        let registry = RuleRegistry::builder()
            .add_module(ModuleRule::new("Good"))
            .add_module(ModuleRule::new("Broken").public_deps(["Missing"]))
            .add_target(TargetRule::new("Game", TargetType::Game).modules(["Good"]))
            .add_target(TargetRule::new("Bad", TargetType::Game).modules(["Broken"]))
            .build()
            .unwrap();

        let ctx = Context::new(Configuration::Development, "linux");
        let all = resolve_all(&registry, &ctx);

        assert!(all["Game"].is_ok());
        assert!(matches!(
            all["Bad"],
            Err(ResolutionError::UnknownModuleReference { .. })
        ));
    }

    #[test]
    fn test_cycle_is_fatal_for_target() {
        let registry = RuleRegistry::builder()
            .add_module(ModuleRule::new("A").public_deps(["B"]))
            .add_module(ModuleRule::new("B").public_deps(["A"]))
            .add_target(TargetRule::new("Game", TargetType::Game).modules(["A"]))
            .build()
            .unwrap();

        let ctx = Context::new(Configuration::Development, "linux");
        let err = resolve(&registry, &ctx, "Game").unwrap_err();
        assert_eq!(
            err,
            ResolutionError::CyclicDependency {
                path: vec!["A".to_string(), "B".to_string(), "A".to_string()],
            }
        );
    }

    #[test]
    fn test_explicit_pch_carries_designated_header() {
        let registry = project_registry();
        let ctx = Context::new(Configuration::Shipping, "linux");

        let plan = resolve(&registry, &ctx, "Game").unwrap();
        assert_eq!(plan.pch_mode, PchMode::Shared); // Core and Slate default to shared
    }
}
