//! Post-merge validation.
//!
//! Runs after the settings merger and decides whether the plan is usable.
//! Fatal findings become errors (the caller never sees a half-populated
//! plan); the rest accumulate as diagnostics on the plan.

use crate::core::module_rule::PchMode;
use crate::core::target_rule::TargetRule;
use crate::resolver::errors::ResolutionError;
use crate::resolver::graph::ModuleGraph;
use crate::resolver::merge::MergedSettings;
use crate::util::diagnostic::Diagnostic;

/// Validate merged settings for a target.
pub fn validate(
    graph: &ModuleGraph,
    merged: &MergedSettings,
    target: &TargetRule,
) -> Result<Vec<Diagnostic>, ResolutionError> {
    let mut diagnostics = Vec::new();

    // Explicit PCH needs a module that actually designates the header.
    if merged.pch_mode == PchMode::Explicit {
        let has_header = graph
            .module_names()
            .iter()
            .filter_map(|name| graph.settings(name))
            .any(|m| m.pch_header.is_some());
        if !has_header {
            return Err(ResolutionError::MissingPchHeader {
                target: target.name.clone(),
            });
        }
    }

    // A designated header on a module that ended up below Explicit is inert.
    for name in graph.module_names() {
        let Some(module) = graph.settings(name) else {
            continue;
        };
        if module.pch_header.is_some() && module.pch_mode != PchMode::Explicit {
            diagnostics.push(
                Diagnostic::warning(format!(
                    "module `{}` designates a PCH header but its pch mode is `{}`",
                    name, module.pch_mode
                ))
                .with_suggestion("Set the module's pch mode to `explicit` or drop the header".to_string()),
            );
        }
    }

    Ok(diagnostics)
}
