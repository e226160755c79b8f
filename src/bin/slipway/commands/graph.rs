//! `slipway graph` command

use anyhow::Result;

use crate::cli::GraphArgs;
use slipway::ops::load_rules;
use slipway::resolver::{DependencyKind, ModuleGraph};

pub fn execute(args: GraphArgs) -> Result<()> {
    let registry = load_rules(&args.context.rules)?;
    let ctx = args.context.to_context();

    let target = registry.target(&args.target).ok_or_else(|| {
        anyhow::anyhow!(
            "target `{}` not found\n\
             help: Run `slipway targets` to see registered targets",
            args.target
        )
    })?;

    let mut draft = target.clone();
    if let Some(group) = &target.shared_settings {
        let settings = registry
            .shared_settings(group)
            .ok_or_else(|| anyhow::anyhow!("unknown shared settings group `{group}`"))?;
        settings
            .apply(&ctx, &mut draft)
            .map_err(|e| anyhow::anyhow!("{e}"))?;
    }

    let (graph, diagnostics) = ModuleGraph::build(&registry, &ctx, &draft)
        .map_err(|e| anyhow::anyhow!("{}", e.to_diagnostic().format()))?;
    graph
        .check_cycles()
        .map_err(|e| anyhow::anyhow!("{}", e.to_diagnostic().format()))?;

    println!("Dependency graph for '{}':", args.target);
    println!();

    for name in graph.topological_order() {
        println!("  {}", name);
        for (from, to, kind) in graph.edges() {
            if from == name {
                let marker = match kind {
                    DependencyKind::Public => "pub",
                    DependencyKind::Private => "priv",
                };
                println!("    -> {} ({})", to, marker);
            }
        }
    }

    if !diagnostics.is_empty() {
        println!();
        for diagnostic in &diagnostics {
            println!("{}", diagnostic.format());
        }
    }

    Ok(())
}
