//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use slipway::core::{Configuration, Context};

/// Slipway - deterministic build-plan resolution for modular game projects
#[derive(Parser)]
#[command(name = "slipway")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve build plans for one or all targets
    Resolve(ResolveArgs),

    /// Display a target's module dependency graph
    Graph(GraphArgs),

    /// List registered targets
    Targets(TargetsArgs),
}

/// Where rules come from and what context they resolve against.
#[derive(Args)]
pub struct ContextArgs {
    /// Rules file or directory containing *.rules.toml files
    #[arg(long, default_value = ".")]
    pub rules: PathBuf,

    /// Build configuration
    #[arg(long, default_value = "development")]
    pub configuration: Configuration,

    /// Target platform
    #[arg(long, default_value = std::env::consts::OS)]
    pub platform: String,

    /// Resolve as an editor target
    #[arg(long)]
    pub editor: bool,

    /// Enable developer tooling
    #[arg(long)]
    pub developer_tools: bool,

    /// Extra context flag, as name=true or name=false (repeatable)
    #[arg(long = "flag", value_name = "NAME=BOOL", value_parser = parse_flag)]
    pub flags: Vec<(String, bool)>,
}

#[derive(Args)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub context: ContextArgs,

    /// Target to resolve (all registered targets if omitted)
    #[arg(long)]
    pub target: Option<String>,

    /// Emit plans as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct GraphArgs {
    #[command(flatten)]
    pub context: ContextArgs,

    /// Target whose graph to display
    pub target: String,
}

#[derive(Args)]
pub struct TargetsArgs {
    #[command(flatten)]
    pub context: ContextArgs,
}

impl ContextArgs {
    /// Build the resolution context these arguments describe.
    pub fn to_context(&self) -> Context {
        let mut ctx = Context::new(self.configuration, self.platform.clone())
            .with_editor(self.editor)
            .with_developer_tools(self.developer_tools);
        for (name, value) in &self.flags {
            ctx = ctx.with_flag(name.clone(), *value);
        }
        ctx
    }
}

fn parse_flag(s: &str) -> Result<(String, bool), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=BOOL, got `{s}`"))?;
    let value = value
        .parse::<bool>()
        .map_err(|_| format!("flag value must be `true` or `false`, got `{value}`"))?;
    Ok((name.to_string(), value))
}
