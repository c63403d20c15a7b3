//! `cascade check`

use super::{load_profile, load_resolver, merge_bundles};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::{print_error, print_info, print_success};
use cascade_engine::ProfileLoader;
use cascade_types::Profile;
use clap::Args;
use std::path::PathBuf;

/// Validate the catalog and optionally resolve profiles
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Profiles to resolve and verify
    pub profiles: Vec<String>,

    /// Check every profile in the profile directory
    #[arg(long, conflicts_with = "profiles")]
    pub all: bool,

    /// Catalog file (TOML or YAML)
    #[arg(long)]
    pub catalog: Option<PathBuf>,
}

/// Execute the check command
pub fn execute(args: CheckArgs, config: &CliConfig) -> CliResult<()> {
    let resolver = load_resolver(args.catalog.as_deref(), config)?;
    let engine = resolver.engine();
    print_success(&format!(
        "Catalog is valid: {} options, {} rules, {} bundles",
        engine.registry().len(),
        engine.rule_count(),
        engine.bundles().len()
    ));

    let profiles: Vec<Profile> = if args.all {
        ProfileLoader::load_dir(&config.profile_dir())?
            .into_iter()
            .map(|profile| merge_bundles(profile, config, &[]))
            .collect()
    } else {
        args.profiles
            .iter()
            .map(|arg| load_profile(arg, config, &[]))
            .collect::<CliResult<_>>()?
    };
    if profiles.is_empty() {
        print_info("No profiles to check");
        return Ok(());
    }

    let total = profiles.len();
    let mut failed = 0;
    for (profile, result) in profiles.iter().zip(resolver.resolve_many(&profiles)) {
        let verdict = result.and_then(|resolved| {
            resolver
                .check_fixed_point(&resolved)
                .map(|stable| (resolved, stable))
        });
        match verdict {
            Ok((resolved, true)) => print_success(&format!(
                "{}: {} of {} flags on, {} passes, fingerprint {}",
                profile.name,
                resolved.enabled_flags().count(),
                resolved.flags.len(),
                resolved.passes,
                &resolved.fingerprint()[..12]
            )),
            Ok((_, false)) => {
                failed += 1;
                print_error(&format!("{}: result is not a fixed point", profile.name));
            }
            Err(e) => {
                failed += 1;
                print_error(&format!("{}: {e}", profile.name));
            }
        }
    }

    if failed > 0 {
        return Err(CliError::ProfilesFailed { failed, total });
    }
    Ok(())
}
