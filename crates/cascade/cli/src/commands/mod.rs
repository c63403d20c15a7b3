//! CLI command implementations

pub mod check;
pub mod explain;
pub mod options;
pub mod resolve;

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use cascade_engine::{CatalogLoader, ProfileLoader, Resolver};
use cascade_types::Profile;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Load the catalog chosen by flag, config or default
pub fn load_resolver(catalog: Option<&Path>, config: &CliConfig) -> CliResult<Resolver> {
    let path = config.catalog_path(catalog);
    if !path.exists() {
        return Err(CliError::NotFound(format!("catalog {}", path.display())));
    }
    Ok(Resolver::new(CatalogLoader::load(&path)?))
}

/// A profile argument is either a file path or a name looked up in the
/// profile directory.
pub fn locate_profile(arg: &str, config: &CliConfig) -> CliResult<PathBuf> {
    let direct = PathBuf::from(arg);
    if direct.is_file() {
        return Ok(direct);
    }
    let dir = config.profile_dir();
    ProfileLoader::locate(&dir, arg).ok_or_else(|| {
        CliError::NotFound(format!("profile {arg} (searched {})", dir.display()))
    })
}

/// Add the bundles enabled by config and command line to a loaded profile
pub fn merge_bundles(mut profile: Profile, config: &CliConfig, bundles: &[String]) -> Profile {
    for bundle in config.bundles.iter().chain(bundles) {
        if !profile.bundles.contains(bundle) {
            profile.bundles.push(bundle.clone());
        }
    }
    debug!(profile = %profile.name, bundles = ?profile.bundles, "Profile ready");
    profile
}

/// Load a profile and add the bundles enabled by config and command line
pub fn load_profile(arg: &str, config: &CliConfig, bundles: &[String]) -> CliResult<Profile> {
    let path = locate_profile(arg, config)?;
    Ok(merge_bundles(ProfileLoader::load(&path)?, config, bundles))
}
