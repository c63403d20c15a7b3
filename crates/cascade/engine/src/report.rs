//! Reporters: pure renderings of a resolved configuration

use cascade_types::{CascadeError, ResolvedConfig, Result};
use std::fmt::Write as _;

/// Renders a resolved configuration as text
pub trait Reporter {
    fn render(&self, config: &ResolvedConfig) -> Result<String>;
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

/// Compiler define arguments, one `-DFLAG` per enabled flag
#[derive(Debug, Clone)]
pub struct DefineArgsReporter {
    pub prefix: String,
    pub separator: String,
}

impl Default for DefineArgsReporter {
    fn default() -> Self {
        Self {
            prefix: "-D".to_string(),
            separator: " ".to_string(),
        }
    }
}

impl DefineArgsReporter {
    /// One argument per line, for response files
    pub fn one_per_line() -> Self {
        Self {
            separator: "\n".to_string(),
            ..Self::default()
        }
    }
}

impl Reporter for DefineArgsReporter {
    fn render(&self, config: &ResolvedConfig) -> Result<String> {
        Ok(config
            .enabled_flags()
            .map(|flag| format!("{}{}", self.prefix, flag))
            .collect::<Vec<_>>()
            .join(&self.separator))
    }
}

/// C header with `#define` / `#undef` for every flag in registry order
#[derive(Debug, Clone, Default)]
pub struct HeaderReporter {
    pub guard: Option<String>,
}

impl HeaderReporter {
    pub fn with_guard(guard: impl Into<String>) -> Self {
        Self {
            guard: Some(guard.into()),
        }
    }
}

impl Reporter for HeaderReporter {
    fn render(&self, config: &ResolvedConfig) -> Result<String> {
        let mut out = String::new();
        let _ = writeln!(out, "/*");
        let _ = writeln!(out, "** Generated by cascade for profile {}", config.profile);
        let _ = writeln!(out, "** fingerprint {}", config.fingerprint());
        let _ = writeln!(out, "*/");
        if let Some(guard) = &self.guard {
            let _ = writeln!(out, "#ifndef {guard}");
            let _ = writeln!(out, "#define {guard}");
        }
        let _ = writeln!(out);
        for flag in &config.flags {
            if flag.value {
                let _ = writeln!(out, "#define {}", flag.name);
            } else {
                let _ = writeln!(out, "#undef {}", flag.name);
            }
        }
        if let Some(guard) = &self.guard {
            let _ = writeln!(out);
            let _ = writeln!(out, "#endif /* {guard} */");
        }
        Ok(out)
    }
}

/// The whole config as JSON, trace included
#[derive(Debug, Clone)]
pub struct JsonReporter {
    pub pretty: bool,
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl Reporter for JsonReporter {
    fn render(&self, config: &ResolvedConfig) -> Result<String> {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(config)
        } else {
            serde_json::to_string(config)
        };
        rendered.map_err(|e| CascadeError::Parse {
            source_name: config.profile.clone(),
            message: e.to_string(),
        })
    }
}

/// Human-readable trace: value and provenance per flag, then skipped overrides
#[derive(Debug, Clone, Default)]
pub struct TraceReporter {
    /// Only list flags that ended up on
    pub enabled_only: bool,
}

impl Reporter for TraceReporter {
    fn render(&self, config: &ResolvedConfig) -> Result<String> {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "profile {} ({} passes{})",
            config.profile,
            config.passes,
            if config.active_bundles.is_empty() {
                String::new()
            } else {
                format!(", bundles: {}", config.active_bundles.join(", "))
            }
        );

        let width = config
            .flags
            .iter()
            .map(|f| f.name.as_str().len())
            .max()
            .unwrap_or(0);
        for flag in config
            .flags
            .iter()
            .filter(|f| !self.enabled_only || f.value)
        {
            let _ = writeln!(
                out,
                "  {:<width$}  {:<3}  {}",
                flag.name.as_str(),
                on_off(flag.value),
                flag.provenance
            );
        }

        if !config.skipped_overrides.is_empty() {
            let _ = writeln!(out, "skipped overrides:");
            for skipped in &config.skipped_overrides {
                let _ = writeln!(
                    out,
                    "  {} wanted {} {} (kept explicit {})",
                    skipped.rule,
                    skipped.flag,
                    on_off(skipped.attempted),
                    on_off(!skipped.attempted)
                );
            }
        }
        Ok(out)
    }
}
