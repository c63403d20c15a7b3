//! CLI configuration

use crate::error::{CliError, CliResult};
use crate::output::OutputFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_CATALOG: &str = "catalogs/ocean.toml";
const DEFAULT_PROFILE_DIR: &str = "profiles";

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    /// Catalog used when `--catalog` is not given
    pub catalog: Option<PathBuf>,

    /// Directory searched for profiles given by name
    pub profile_dir: Option<PathBuf>,

    /// Output format used when none is given on the command line
    pub default_format: Option<OutputFormat>,

    /// Bundles enabled for every resolution
    #[serde(default)]
    pub bundles: Vec<String>,
}

impl CliConfig {
    /// Load configuration from file; a missing file means defaults
    pub fn load(path: Option<&str>) -> CliResult<Self> {
        let config_path = match path {
            Some(p) => PathBuf::from(p),
            None => match Self::default_config_path() {
                Some(p) => p,
                None => return Ok(CliConfig::default()),
            },
        };

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            let config: CliConfig =
                toml::from_str(&contents).map_err(|e| CliError::Config(e.to_string()))?;
            Ok(config)
        } else {
            Ok(CliConfig::default())
        }
    }

    /// `--catalog` > config file > built-in default
    pub fn catalog_path(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.catalog.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG))
    }

    pub fn profile_dir(&self) -> PathBuf {
        self.profile_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROFILE_DIR))
    }

    /// Get the default configuration file path
    fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("cascade").join("config.toml"))
    }
}
