//! `slipway resolve` command

use anyhow::Result;

use crate::cli::ResolveArgs;
use slipway::ops::load_rules;
use slipway::resolver::{resolve, resolve_all, BuildPlan, ResolutionError};

pub fn execute(args: ResolveArgs) -> Result<()> {
    let registry = load_rules(&args.context.rules)?;
    let ctx = args.context.to_context();

    match &args.target {
        Some(target) => {
            let plan = resolve(&registry, &ctx, target).map_err(|e| report(&e))?;
            print_plan(&plan, args.json)?;
            Ok(())
        }
        None => {
            let mut failed = 0usize;
            for (name, outcome) in resolve_all(&registry, &ctx) {
                match outcome {
                    Ok(plan) => print_plan(&plan, args.json)?,
                    Err(e) => {
                        eprintln!("{}", e.to_diagnostic().format());
                        tracing::error!(target = %name, "resolution failed");
                        failed += 1;
                    }
                }
            }
            if failed > 0 {
                anyhow::bail!("{failed} target(s) failed to resolve");
            }
            Ok(())
        }
    }
}

fn report(err: &ResolutionError) -> anyhow::Error {
    anyhow::anyhow!("{}", err.to_diagnostic().format())
}

fn print_plan(plan: &BuildPlan, json: bool) -> Result<()> {
    if json {
        println!("{}", plan.to_json()?);
        return Ok(());
    }

    println!("Build plan for '{}' ({:?}):", plan.target, plan.target_type);
    println!();
    println!("  Modules ({} total, dependencies first):", plan.module_count());
    for (i, name) in plan.resolved_modules.iter().enumerate() {
        println!("    {}. {}", i + 1, name);
    }

    if !plan.merged_definitions.is_empty() {
        println!();
        println!("  Definitions:");
        for (name, value) in &plan.merged_definitions {
            println!("    {}={}", name, value);
        }
    }

    if !plan.merged_include_paths.is_empty() {
        println!();
        println!("  Include paths:");
        for path in &plan.merged_include_paths {
            println!("    {}", path.display());
        }
    }

    println!();
    println!("  PCH mode: {}", plan.pch_mode);
    println!("  Unity build: {}", plan.use_unity_build);

    if !plan.diagnostics.is_empty() {
        println!();
        for diagnostic in &plan.diagnostics {
            println!("{}", diagnostic.format());
        }
    }

    println!();
    Ok(())
}
