//! Conditional-rule predicates.
//!
//! Predicates are plain data evaluated against an immutable [`Context`] by
//! a pure evaluator. Rule descriptors attach them to conditional effects so
//! that "add this dependency outside shipping builds" is declarative and
//! testable without constructing a full rule graph.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::context::{Configuration, Context};

/// A boolean expression over [`Context`] fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Always true.
    Always,

    /// The configuration equals the given one.
    ConfigurationIs(Configuration),

    /// The configuration is one of the given set.
    ConfigurationIn(Vec<Configuration>),

    /// The platform name equals the given string.
    PlatformIs(String),

    /// The request targets an editor build.
    EditorTarget,

    /// Developer tooling is enabled.
    DeveloperTools,

    /// A named flag from `Context::extra_flags`. Referencing a flag that
    /// the context does not define is an evaluation error.
    Flag(String),

    /// Logical negation.
    Not(Box<Predicate>),

    /// All sub-predicates hold.
    All(Vec<Predicate>),

    /// At least one sub-predicate holds.
    Any(Vec<Predicate>),
}

/// Error produced while evaluating a predicate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredicateError {
    #[error("predicate references undefined flag `{name}`")]
    UndefinedFlag { name: String },
}

/// Evaluate a predicate against a context.
///
/// Pure: no side effects, no I/O. Compound predicates do not short-circuit,
/// so an undefined flag reference is reported regardless of operand order.
pub fn evaluate(predicate: &Predicate, ctx: &Context) -> Result<bool, PredicateError> {
    match predicate {
        Predicate::Always => Ok(true),
        Predicate::ConfigurationIs(cfg) => Ok(ctx.configuration == *cfg),
        Predicate::ConfigurationIn(set) => Ok(set.contains(&ctx.configuration)),
        Predicate::PlatformIs(platform) => Ok(ctx.platform == *platform),
        Predicate::EditorTarget => Ok(ctx.is_editor_target),
        Predicate::DeveloperTools => Ok(ctx.build_developer_tools),
        Predicate::Flag(name) => ctx
            .flag(name)
            .ok_or_else(|| PredicateError::UndefinedFlag { name: name.clone() }),
        Predicate::Not(inner) => Ok(!evaluate(inner, ctx)?),
        Predicate::All(parts) => {
            let mut result = true;
            for part in parts {
                if !evaluate(part, ctx)? {
                    result = false;
                }
            }
            Ok(result)
        }
        Predicate::Any(parts) => {
            let mut result = false;
            for part in parts {
                if evaluate(part, ctx)? {
                    result = true;
                }
            }
            Ok(result)
        }
    }
}

impl Predicate {
    /// Convenience for "configuration outside the given set" expressions
    /// used by debugger-tool rules.
    pub fn not_in_configurations(configs: impl Into<Vec<Configuration>>) -> Self {
        Predicate::Not(Box::new(Predicate::ConfigurationIn(configs.into())))
    }
}
