//! `slipway targets` command

use anyhow::Result;

use crate::cli::TargetsArgs;
use slipway::ops::load_rules;

pub fn execute(args: TargetsArgs) -> Result<()> {
    let registry = load_rules(&args.context.rules)?;

    println!("Registered targets:");
    for target in registry.targets() {
        let shared = target
            .shared_settings
            .as_deref()
            .map(|g| format!(" [shared: {g}]"))
            .unwrap_or_default();
        println!(
            "  {} ({:?}, {} root module(s)){}",
            target.name,
            target.target_type,
            target.extra_modules.len(),
            shared
        );
    }

    Ok(())
}
