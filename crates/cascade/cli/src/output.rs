//! Output formatting utilities

use crate::error::CliResult;
use cascade_engine::{
    DefineArgsReporter, HeaderReporter, JsonReporter, Reporter, TraceReporter,
};
use cascade_types::{Provenance, ResolvedConfig};
use colored::*;
use serde::{Deserialize, Serialize};
use tabled::{Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
    /// Compiler define arguments (`-DFLAG`)
    Defines,
    /// C header with `#define` / `#undef`
    Header,
    /// Value and provenance of every flag
    Trace,
}

/// Print a vector of items in the specified format.
///
/// Formats that only make sense for resolved configurations fall back to a
/// table.
pub fn print_output<T: Serialize + Tabled>(data: Vec<T>, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&data)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&data)?),
        _ => {
            if data.is_empty() {
                println!("{}", "No results".dimmed());
            } else {
                println!("{}", Table::new(data));
            }
        }
    }
    Ok(())
}

/// Print a single item as JSON or YAML
pub fn print_single<T: Serialize>(data: &T, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(data)?),
        _ => println!("{}", serde_json::to_string_pretty(data)?),
    }
    Ok(())
}

/// Table row for one resolved flag
#[derive(Debug, Serialize, Tabled)]
struct FlagRow {
    /// Flag name
    flag: String,
    /// Final value
    value: String,
    /// Where the value came from
    source: String,
}

fn flag_rows(config: &ResolvedConfig) -> Vec<FlagRow> {
    config
        .flags
        .iter()
        .map(|f| FlagRow {
            flag: f.name.to_string(),
            value: if f.value {
                "on".green().to_string()
            } else {
                "off".dimmed().to_string()
            },
            source: match &f.provenance {
                Provenance::Explicit => "explicit".bold().to_string(),
                other => other.to_string(),
            },
        })
        .collect()
}

/// Print resolved configurations in the specified format
pub fn print_resolved(configs: &[ResolvedConfig], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            if let [single] = configs {
                println!("{}", JsonReporter::default().render(single)?);
            } else {
                println!("{}", serde_json::to_string_pretty(configs)?);
            }
        }
        OutputFormat::Yaml => {
            if let [single] = configs {
                print!("{}", serde_yaml::to_string(single)?);
            } else {
                print!("{}", serde_yaml::to_string(configs)?);
            }
        }
        OutputFormat::Defines => {
            for config in configs {
                println!("{}", DefineArgsReporter::default().render(config)?);
            }
        }
        OutputFormat::Header => {
            for config in configs {
                print!("{}", HeaderReporter::default().render(config)?);
            }
        }
        OutputFormat::Trace => {
            for config in configs {
                print!("{}", TraceReporter::default().render(config)?);
            }
        }
        OutputFormat::Table => {
            for config in configs {
                println!(
                    "{} {} ({} on, {} passes)",
                    "Profile".bold(),
                    config.profile.cyan(),
                    config.enabled_flags().count(),
                    config.passes
                );
                println!("{}", Table::new(flag_rows(config)));
                for skipped in &config.skipped_overrides {
                    print_warning(&format!(
                        "{} kept explicit value; rule {} was skipped",
                        skipped.flag, skipped.rule
                    ));
                }
            }
        }
    }
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}
