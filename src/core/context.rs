//! Build request context.
//!
//! A Context describes one resolution request: the build configuration,
//! the platform, and the flags that drive conditional rule evaluation.
//! It is constructed once per request and never mutated afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Build configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Configuration {
    Debug,
    DebugGame,
    Development,
    Shipping,
    Test,
}

impl Configuration {
    /// All configurations, in declaration order.
    pub const ALL: [Configuration; 5] = [
        Configuration::Debug,
        Configuration::DebugGame,
        Configuration::Development,
        Configuration::Shipping,
        Configuration::Test,
    ];

    /// The canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Configuration::Debug => "debug",
            Configuration::DebugGame => "debug_game",
            Configuration::Development => "development",
            Configuration::Shipping => "shipping",
            Configuration::Test => "test",
        }
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Configuration {
    type Err = UnknownConfiguration;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(Configuration::Debug),
            "debug_game" | "debuggame" => Ok(Configuration::DebugGame),
            "development" => Ok(Configuration::Development),
            "shipping" => Ok(Configuration::Shipping),
            "test" => Ok(Configuration::Test),
            _ => Err(UnknownConfiguration {
                name: s.to_string(),
            }),
        }
    }
}

/// Error returned when parsing an unrecognized configuration name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownConfiguration {
    pub name: String,
}

impl fmt::Display for UnknownConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown configuration `{}` (expected one of: debug, debug_game, development, shipping, test)",
            self.name
        )
    }
}

impl std::error::Error for UnknownConfiguration {}

/// Immutable description of one build request.
///
/// All conditional logic in the rule set is evaluated against a Context.
/// Extra flags are an open-ended name/bool mapping; referencing a flag that
/// is not present is a predicate error, not `false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    /// Build configuration.
    pub configuration: Configuration,

    /// Platform name (e.g. "win64", "linux", "mac").
    pub platform: String,

    /// Whether the resolved target is an editor target.
    #[serde(default)]
    pub is_editor_target: bool,

    /// Whether developer tooling is compiled in.
    #[serde(default)]
    pub build_developer_tools: bool,

    /// Project-specific boolean flags.
    #[serde(default)]
    pub extra_flags: BTreeMap<String, bool>,
}

impl Context {
    /// Create a context with all optional toggles off.
    pub fn new(configuration: Configuration, platform: impl Into<String>) -> Self {
        Context {
            configuration,
            platform: platform.into(),
            is_editor_target: false,
            build_developer_tools: false,
            extra_flags: BTreeMap::new(),
        }
    }

    /// Mark the request as targeting an editor build.
    pub fn with_editor(mut self, editor: bool) -> Self {
        self.is_editor_target = editor;
        self
    }

    /// Enable or disable developer tooling.
    pub fn with_developer_tools(mut self, enabled: bool) -> Self {
        self.build_developer_tools = enabled;
        self
    }

    /// Set an extra boolean flag.
    pub fn with_flag(mut self, name: impl Into<String>, value: bool) -> Self {
        self.extra_flags.insert(name.into(), value);
        self
    }

    /// Look up an extra flag. `None` means the flag was never defined.
    pub fn flag(&self, name: &str) -> Option<bool> {
        self.extra_flags.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_round_trip() {
        for cfg in Configuration::ALL {
            let parsed: Configuration = cfg.as_str().parse().unwrap();
            assert_eq!(parsed, cfg);
        }
    }

    #[test]
    fn test_configuration_unknown() {
        let err = "release".parse::<Configuration>().unwrap_err();
        assert!(err.to_string().contains("release"));
    }

    #[test]
    fn test_context_flags() {
        let ctx = Context::new(Configuration::Development, "linux")
            .with_developer_tools(true)
            .with_flag("with_telemetry", false);

        assert!(ctx.build_developer_tools);
        assert_eq!(ctx.flag("with_telemetry"), Some(false));
        assert_eq!(ctx.flag("undeclared"), None);
    }
}
