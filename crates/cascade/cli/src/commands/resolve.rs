//! `cascade resolve`

use super::{load_profile, load_resolver};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::{print_error, print_resolved, OutputFormat};
use cascade_types::ResolvedConfig;
use clap::Args;
use std::path::PathBuf;
use tracing::info;

/// Resolve one or more profiles
#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Profile names (looked up in the profile directory) or files
    #[arg(required = true)]
    pub profiles: Vec<String>,

    /// Catalog file (TOML or YAML)
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Enable an optional rule bundle (repeatable)
    #[arg(short, long = "bundle")]
    pub bundles: Vec<String>,

    /// Output format, overriding --output
    #[arg(short, long)]
    pub format: Option<OutputFormat>,
}

/// Execute the resolve command.
///
/// Each profile resolves as an independent blocking task; results are
/// reported in argument order.
pub async fn execute(args: ResolveArgs, config: &CliConfig, format: OutputFormat) -> CliResult<()> {
    let format = args.format.unwrap_or(format);
    let resolver = load_resolver(args.catalog.as_deref(), config)?;

    let mut profiles = Vec::with_capacity(args.profiles.len());
    for arg in &args.profiles {
        profiles.push(load_profile(arg, config, &args.bundles)?);
    }

    let tasks: Vec<_> = profiles
        .into_iter()
        .map(|profile| {
            let resolver = resolver.clone();
            tokio::task::spawn_blocking(move || {
                let result = resolver.resolve(&profile);
                (profile.name, result)
            })
        })
        .collect();

    let total = tasks.len();
    let mut resolved: Vec<ResolvedConfig> = Vec::with_capacity(total);
    let mut failed = 0;
    for task in tasks {
        let (name, result) = task.await?;
        match result {
            Ok(config) => resolved.push(config),
            Err(e) => {
                failed += 1;
                print_error(&format!("{name}: {e}"));
            }
        }
    }

    info!(resolved = resolved.len(), failed, "Resolution finished");
    if !resolved.is_empty() {
        print_resolved(&resolved, format)?;
    }

    if failed > 0 {
        return Err(CliError::ProfilesFailed { failed, total });
    }
    Ok(())
}
