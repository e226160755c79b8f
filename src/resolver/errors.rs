//! Resolution error types and diagnostics.

use thiserror::Error;

use crate::util::diagnostic::Diagnostic;

/// Error during build-plan resolution.
///
/// Each variant is fatal for the affected target only: in `resolve_all`,
/// one target failing does not prevent its siblings from resolving.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolutionError {
    #[error("unknown target `{target}`")]
    UnknownTarget { target: String },

    #[error("invalid predicate in `{rule}`: {reason}")]
    InvalidPredicate { rule: String, reason: String },

    #[error("module `{referrer}` depends on unknown module `{missing}`")]
    UnknownModuleReference { referrer: String, missing: String },

    #[error("cyclic dependency: {}", path.join(" -> "))]
    CyclicDependency { path: Vec<String> },

    #[error("conflicting definition `{name}`")]
    ConflictingDefinition {
        name: String,
        first_source: String,
        first_value: String,
        second_source: String,
        second_value: String,
    },

    #[error("target `{target}` resolved to explicit PCH but no module designates a header")]
    MissingPchHeader { target: String },
}

impl ResolutionError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ResolutionError::UnknownTarget { target } => {
                Diagnostic::error(format!("unknown target `{}`", target))
                    .with_suggestion("Run `slipway targets` to list registered targets".to_string())
            }

            ResolutionError::InvalidPredicate { rule, reason } => {
                Diagnostic::error(format!("invalid predicate in `{}`", rule))
                    .with_context(reason.clone())
                    .with_suggestion(
                        "Define the flag in the build context or remove the reference".to_string(),
                    )
            }

            ResolutionError::UnknownModuleReference { referrer, missing } => {
                Diagnostic::error(format!(
                    "module `{}` depends on unknown module `{}`",
                    referrer, missing
                ))
                .with_suggestion(format!("Declare a module rule named `{}`", missing))
                .with_suggestion("Check the dependency name for typos".to_string())
            }

            ResolutionError::CyclicDependency { path } => {
                Diagnostic::error("cycle detected in module dependency graph")
                    .with_context(format!("cycle: {}", path.join(" -> ")))
                    .with_suggestion(
                        "Break the cycle by removing or restructuring dependencies".to_string(),
                    )
            }

            ResolutionError::ConflictingDefinition {
                name,
                first_source,
                first_value,
                second_source,
                second_value,
            } => Diagnostic::error(format!("conflicting values for definition `{}`", name))
                .with_context(format!("`{}` defines {}={}", first_source, name, first_value))
                .with_context(format!(
                    "`{}` defines {}={}",
                    second_source, name, second_value
                ))
                .with_suggestion(format!(
                    "Align the value of `{}` across both modules or make one private",
                    name
                )),

            ResolutionError::MissingPchHeader { target } => {
                Diagnostic::error(format!(
                    "target `{}` uses explicit PCH but no module designates a header",
                    target
                ))
                .with_suggestion(
                    "Set `pch_header` on the module that owns the precompiled header".to_string(),
                )
            }
        }
    }
}
