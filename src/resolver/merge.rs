//! Settings merging.
//!
//! Walks the topological order and folds each module's contributions into
//! target-level aggregates, respecting public/private propagation. A
//! definition disagreement between two visible modules is an error, never
//! silent last-wins: conflicting build flags are a classic source of
//! quiet breakage in this domain.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::core::module_rule::PchMode;
use crate::resolver::errors::ResolutionError;
use crate::resolver::graph::ModuleGraph;
use crate::util::diagnostic::Diagnostic;

/// The effective build surface of one module within a target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleBuildSettings {
    pub name: String,

    /// Modules whose public surface this module sees.
    pub visible_modules: Vec<String>,

    /// Own definitions plus public definitions of visible modules.
    pub definitions: BTreeMap<String, String>,

    /// Own include paths plus public include paths of visible modules.
    pub include_paths: Vec<PathBuf>,
}

/// Target-level aggregates produced by the merger.
#[derive(Debug, Clone)]
pub struct MergedSettings {
    /// Per-module effective settings, in topological order.
    pub modules: Vec<ModuleBuildSettings>,

    /// Union of all public definitions in the target.
    pub definitions: BTreeMap<String, String>,

    /// Union of all public include paths, in topological order.
    pub include_paths: Vec<PathBuf>,

    /// Most restrictive PCH mode among member modules.
    pub pch_mode: PchMode,

    /// Logical AND of member modules' unity-build flags.
    pub use_unity_build: bool,

    /// Non-fatal findings.
    pub diagnostics: Vec<Diagnostic>,
}

/// Merge per-module contributions for a target.
///
/// `order` must be the graph's topological order; it fixes the iteration
/// order everywhere so two runs over the same inputs produce identical
/// output.
pub fn merge(
    graph: &ModuleGraph,
    order: &[String],
    target_name: &str,
) -> Result<MergedSettings, ResolutionError> {
    let mut diagnostics = Vec::new();

    // Target-level definitions: public only, with conflict detection.
    let mut definitions: BTreeMap<String, (String, String)> = BTreeMap::new();
    for name in order {
        let Some(module) = graph.settings(name) else {
            continue;
        };
        for (key, value) in &module.public_definitions {
            merge_definition(&mut definitions, key, value, name)?;
        }
    }

    let mut include_paths: Vec<PathBuf> = Vec::new();
    for name in order {
        let Some(module) = graph.settings(name) else {
            continue;
        };
        for path in &module.public_include_paths {
            if !include_paths.contains(path) {
                include_paths.push(path.clone());
            }
        }
    }

    // PCH: most restrictive mode wins across the target.
    let modes: Vec<PchMode> = order
        .iter()
        .filter_map(|name| graph.settings(name).map(|m| m.pch_mode))
        .collect();
    let pch_mode = modes.iter().copied().min().unwrap_or_default();
    if pch_mode == PchMode::None && modes.iter().any(|m| *m != PchMode::None) {
        let culprit = order
            .iter()
            .find(|name| {
                graph
                    .settings(name)
                    .is_some_and(|m| m.pch_mode == PchMode::None)
            })
            .cloned()
            .unwrap_or_default();
        diagnostics.push(
            Diagnostic::warning(format!(
                "module `{}` disables precompiled headers, downgrading target `{}` to pch mode `none`",
                culprit, target_name
            ))
            .with_suggestion("Mandate explicit PCH for the target if build times regress".to_string()),
        );
    }

    // Unity: one opt-out disables the whole target.
    let mut use_unity_build = true;
    for name in order {
        let Some(module) = graph.settings(name) else {
            continue;
        };
        if !module.use_unity_build && use_unity_build {
            use_unity_build = false;
            diagnostics.push(Diagnostic::note(format!(
                "module `{}` opts out of unity builds, disabling them for target `{}`",
                name, target_name
            )));
        }
    }

    // Per-module effective surfaces.
    let mut modules = Vec::with_capacity(order.len());
    for name in order {
        let Some(own) = graph.settings(name) else {
            continue;
        };
        let visible = graph.visible_modules(name);

        let mut module_defs: BTreeMap<String, (String, String)> = BTreeMap::new();
        for (key, value) in own.public_definitions.iter().chain(&own.private_definitions) {
            merge_definition(&mut module_defs, key, value, name)?;
        }
        for dep in &visible {
            let Some(dep_settings) = graph.settings(dep) else {
                continue;
            };
            for (key, value) in &dep_settings.public_definitions {
                merge_definition(&mut module_defs, key, value, dep)?;
            }
        }

        let mut module_paths: Vec<PathBuf> = Vec::new();
        for path in own
            .public_include_paths
            .iter()
            .chain(&own.private_include_paths)
        {
            if !module_paths.contains(path) {
                module_paths.push(path.clone());
            }
        }
        for dep in &visible {
            let Some(dep_settings) = graph.settings(dep) else {
                continue;
            };
            for path in &dep_settings.public_include_paths {
                if !module_paths.contains(path) {
                    module_paths.push(path.clone());
                }
            }
        }

        modules.push(ModuleBuildSettings {
            name: name.clone(),
            visible_modules: visible,
            definitions: module_defs
                .into_iter()
                .map(|(k, (v, _))| (k, v))
                .collect(),
            include_paths: module_paths,
        });
    }

    Ok(MergedSettings {
        modules,
        definitions: definitions
            .into_iter()
            .map(|(k, (v, _))| (k, v))
            .collect(),
        include_paths,
        pch_mode,
        use_unity_build,
        diagnostics,
    })
}

/// Insert a definition, erroring on a value disagreement. Re-stating the
/// same value from another module is fine.
fn merge_definition(
    merged: &mut BTreeMap<String, (String, String)>,
    key: &str,
    value: &str,
    source: &str,
) -> Result<(), ResolutionError> {
    match merged.get(key) {
        Some((existing, first_source)) if existing != value => {
            Err(ResolutionError::ConflictingDefinition {
                name: key.to_string(),
                first_source: first_source.clone(),
                first_value: existing.clone(),
                second_source: source.to_string(),
                second_value: value.to_string(),
            })
        }
        Some(_) => Ok(()),
        None => {
            merged.insert(key.to_string(), (value.to_string(), source.to_string()));
            Ok(())
        }
    }
}
