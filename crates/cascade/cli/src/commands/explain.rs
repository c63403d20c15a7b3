//! `cascade explain`

use super::{load_profile, load_resolver};
use crate::config::CliConfig;
use crate::error::CliResult;
use crate::output::{print_single, OutputFormat};
use cascade_engine::{Rule, RuleEngine};
use cascade_types::{CascadeError, FlagName, Provenance, SkippedOverride};
use clap::Args;
use colored::*;
use serde::Serialize;
use std::path::PathBuf;

/// Show why a flag ended up on or off
#[derive(Debug, Args)]
pub struct ExplainArgs {
    /// Profile name or file
    pub profile: String,

    /// Flag to explain
    pub flag: String,

    /// Catalog file (TOML or YAML)
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Enable an optional rule bundle (repeatable)
    #[arg(short, long = "bundle")]
    pub bundles: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Explanation {
    profile: String,
    flag: FlagName,
    value: bool,
    provenance: Provenance,
    #[serde(skip_serializing_if = "Option::is_none")]
    rule: Option<Rule>,
    skipped_overrides: Vec<SkippedOverride>,
}

fn describe_rule(rule: &Rule) -> String {
    match rule {
        Rule::Implication(r) => format!("when {}", r.condition),
        Rule::Fallback(r) => format!(
            "when none of {} is decided",
            r.candidates
                .iter()
                .map(FlagName::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        ),
        Rule::Conflict(r) => format!(
            "at most one of {}",
            r.flags
                .iter()
                .map(FlagName::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

fn rule_description(rule: &Rule) -> Option<&str> {
    match rule {
        Rule::Implication(r) => r.description.as_deref(),
        Rule::Fallback(r) => r.description.as_deref(),
        Rule::Conflict(r) => r.description.as_deref(),
    }
}

fn print_explanation(explanation: &Explanation, engine: &RuleEngine) {
    let value = if explanation.value {
        "on".green()
    } else {
        "off".red()
    };
    println!("{} = {}  ({})", explanation.flag.as_str().bold(), value, explanation.profile);
    println!("  source: {}", explanation.provenance);

    if let Some(rule) = &explanation.rule {
        println!("  rule:   {} {}", rule.id(), describe_rule(rule).dimmed());
        if let Some(description) = rule_description(rule) {
            println!("          {description}");
        }
    } else if matches!(explanation.provenance, Provenance::Default) {
        if let Ok(spec) = engine.registry().lookup(explanation.flag.as_str()) {
            println!("  default: {}", spec.default);
        }
    }

    for skipped in &explanation.skipped_overrides {
        let attempted = if skipped.attempted { "on" } else { "off" };
        println!(
            "  {} rule {} wanted {}, explicit value kept",
            "skipped:".yellow(),
            skipped.rule,
            attempted
        );
    }
}

/// Execute the explain command
pub fn execute(args: ExplainArgs, config: &CliConfig, format: OutputFormat) -> CliResult<()> {
    let resolver = load_resolver(args.catalog.as_deref(), config)?;
    let engine = resolver.engine();
    let spec = engine.registry().lookup(&args.flag)?;

    let profile = load_profile(&args.profile, config, &args.bundles)?;
    let resolved = resolver.resolve(&profile)?;
    let flag = resolved
        .get(spec.name.as_str())
        .ok_or_else(|| CascadeError::UnknownOption {
            name: args.flag.clone(),
        })?;

    let explanation = Explanation {
        profile: resolved.profile.clone(),
        flag: flag.name.clone(),
        value: flag.value,
        provenance: flag.provenance.clone(),
        rule: flag
            .provenance
            .rule()
            .and_then(|id| engine.rule(id.as_str()))
            .cloned(),
        skipped_overrides: resolved.skipped_for(flag.name.as_str()).cloned().collect(),
    };

    match format {
        OutputFormat::Json | OutputFormat::Yaml => print_single(&explanation, format),
        _ => {
            print_explanation(&explanation, engine);
            Ok(())
        }
    }
}
