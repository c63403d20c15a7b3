//! `cascade options`

use super::load_resolver;
use crate::config::CliConfig;
use crate::error::CliResult;
use crate::output::{print_output, OutputFormat};
use cascade_engine::OptionSpec;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use tabled::Tabled;

/// List the option registry
#[derive(Debug, Args)]
pub struct OptionsArgs {
    /// Catalog file (TOML or YAML)
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Only list options in this group
    #[arg(short, long)]
    pub group: Option<String>,
}

/// Table row for option display
#[derive(Debug, Serialize, Tabled)]
struct OptionRow {
    /// Option name
    name: String,
    /// Registry default
    default: String,
    /// Group
    group: String,
    /// Description
    description: String,
}

impl From<&OptionSpec> for OptionRow {
    fn from(spec: &OptionSpec) -> Self {
        Self {
            name: spec.name.to_string(),
            default: spec.default.to_string(),
            group: spec.group.clone().unwrap_or_default(),
            description: spec.description.clone().unwrap_or_default(),
        }
    }
}

/// Execute the options command
pub fn execute(args: OptionsArgs, config: &CliConfig, format: OutputFormat) -> CliResult<()> {
    let resolver = load_resolver(args.catalog.as_deref(), config)?;
    let rows: Vec<OptionRow> = resolver
        .engine()
        .registry()
        .iter()
        .filter(|spec| {
            args.group
                .as_deref()
                .map_or(true, |g| spec.group.as_deref() == Some(g))
        })
        .map(OptionRow::from)
        .collect();
    print_output(rows, format)
}
