//! Catalog loading: options, bundles and the shared rule set from TOML/YAML
//!
//! ```toml
//! [[option]]
//! name = "GLS_MIXING"
//! default = "off"
//! group = "mixing"
//!
//! [[bundle]]
//! name = "bio-legacy"
//! enabled = false
//!
//! [[implication]]
//! id = "gls-closure"
//! when = "GLS_MIXING || MY25_MIXING"
//! on = ["N2S2_HORAVG", "RI_SPLINES"]
//!
//! [[conflict]]
//! id = "vertical-mixing"
//! flags = ["GLS_MIXING", "LMD_MIXING", "MY25_MIXING"]
//!
//! [[fallback]]
//! id = "analytic-vmix"
//! candidates = ["GLS_MIXING", "LMD_MIXING", "MY25_MIXING"]
//! on = ["ANA_VMIX"]
//! ```

use crate::condition::Condition;
use crate::engine::RuleEngine;
use crate::format::{read_source, SourceFormat};
use crate::registry::{OptionRegistry, OptionSpec};
use crate::rules::{Conflict, DefaultFallback, Effect, Implication, RuleBundle};
use cascade_types::{FlagName, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

/// Raw catalog document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogDocument {
    #[serde(default, rename = "option")]
    pub options: Vec<OptionSpec>,
    #[serde(default, rename = "bundle")]
    pub bundles: Vec<RuleBundle>,
    #[serde(default, rename = "implication")]
    pub implications: Vec<ImplicationEntry>,
    #[serde(default, rename = "conflict")]
    pub conflicts: Vec<ConflictEntry>,
    #[serde(default, rename = "fallback")]
    pub fallbacks: Vec<FallbackEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImplicationEntry {
    #[serde(default)]
    pub id: Option<String>,
    pub when: Condition,
    #[serde(default)]
    pub on: Vec<FlagName>,
    #[serde(default)]
    pub off: Vec<FlagName>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub bundle: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConflictEntry {
    #[serde(default)]
    pub id: Option<String>,
    pub flags: Vec<FlagName>,
    #[serde(default)]
    pub bundle: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FallbackEntry {
    #[serde(default)]
    pub id: Option<String>,
    pub candidates: Vec<FlagName>,
    #[serde(default)]
    pub on: Vec<FlagName>,
    #[serde(default)]
    pub off: Vec<FlagName>,
    #[serde(default)]
    pub bundle: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

fn effects(on: Vec<FlagName>, off: Vec<FlagName>) -> Vec<Effect> {
    on.into_iter()
        .map(Effect::on)
        .chain(off.into_iter().map(Effect::off))
        .collect()
}

impl CatalogDocument {
    /// Build the registry and rule engine described by this document.
    ///
    /// Rules are declared implications first, then conflicts, then
    /// fallbacks, each in document order. Generated ids never take an id
    /// declared anywhere in the document.
    pub fn into_engine(self) -> Result<RuleEngine> {
        let declared: BTreeSet<String> = self
            .implications
            .iter()
            .filter_map(|e| e.id.clone())
            .chain(self.conflicts.iter().filter_map(|e| e.id.clone()))
            .chain(self.fallbacks.iter().filter_map(|e| e.id.clone()))
            .collect();
        let reserved: BTreeSet<&str> = declared.iter().map(String::as_str).collect();

        let mut registry = OptionRegistry::new();
        for option in self.options {
            registry.register_option(option)?;
        }

        let mut engine = RuleEngine::new(registry);
        for bundle in self.bundles {
            engine.add_bundle(bundle)?;
        }

        for entry in self.implications {
            let id = entry
                .id
                .unwrap_or_else(|| engine.generate_id_avoiding("implication", &reserved));
            let mut rule = Implication::new(id, entry.when)
                .with_effects(effects(entry.on, entry.off))
                .with_priority(entry.priority);
            rule.bundle = entry.bundle;
            rule.description = entry.description;
            engine.add_rule(rule)?;
        }

        for entry in self.conflicts {
            let id = entry
                .id
                .unwrap_or_else(|| engine.generate_id_avoiding("conflict", &reserved));
            let mut rule = Conflict::new(id, entry.flags);
            rule.bundle = entry.bundle;
            rule.description = entry.description;
            engine.add_rule(rule)?;
        }

        for entry in self.fallbacks {
            let id = entry
                .id
                .unwrap_or_else(|| engine.generate_id_avoiding("fallback", &reserved));
            let mut rule = DefaultFallback::new(id, entry.candidates, effects(entry.on, entry.off));
            rule.bundle = entry.bundle;
            rule.description = entry.description;
            engine.add_rule(rule)?;
        }

        Ok(engine)
    }
}

/// Loads catalogs into a ready rule engine
pub struct CatalogLoader;

impl CatalogLoader {
    pub fn load(path: impl AsRef<Path>) -> Result<RuleEngine> {
        let path = path.as_ref();
        let format = SourceFormat::from_path(path)?;
        let text = read_source(path)?;
        let engine = Self::parse(&text, format, &path.display().to_string())?;
        info!(
            catalog = %path.display(),
            options = engine.registry().len(),
            rules = engine.rule_count(),
            bundles = engine.bundles().len(),
            "Loaded catalog"
        );
        Ok(engine)
    }

    pub fn parse(text: &str, format: SourceFormat, source_name: &str) -> Result<RuleEngine> {
        Self::parse_document(text, format, source_name)?.into_engine()
    }

    pub fn parse_document(
        text: &str,
        format: SourceFormat,
        source_name: &str,
    ) -> Result<CatalogDocument> {
        format.decode(source_name, text)
    }

    pub fn from_toml_str(text: &str) -> Result<RuleEngine> {
        Self::parse(text, SourceFormat::Toml, "<toml>")
    }

    pub fn from_yaml_str(text: &str) -> Result<RuleEngine> {
        Self::parse(text, SourceFormat::Yaml, "<yaml>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cascade_types::{CascadeError, FlagState};

    const SMALL: &str = r#"
[[option]]
name = "GLS_MIXING"
default = "off"
group = "mixing"

[[option]]
name = "LMD_MIXING"

[[option]]
name = "N2S2_HORAVG"
description = "Horizontal smoothing of buoyancy/shear"

[[option]]
name = "ANA_VMIX"

[[bundle]]
name = "extra"
enabled = true

[[implication]]
id = "gls-closure"
when = "GLS_MIXING"
on = ["N2S2_HORAVG"]
bundle = "extra"

[[conflict]]
flags = ["GLS_MIXING", "LMD_MIXING"]

[[fallback]]
candidates = ["GLS_MIXING", "LMD_MIXING"]
on = ["ANA_VMIX"]
"#;

    #[test]
    fn loads_toml_catalog() {
        let engine = CatalogLoader::from_toml_str(SMALL).unwrap();
        assert_eq!(engine.registry().len(), 4);
        assert_eq!(
            engine.registry().lookup("LMD_MIXING").unwrap().default,
            FlagState::Unset
        );
        assert_eq!(engine.rule_count(), 3);
        assert!(engine.rule("gls-closure").is_some());
        assert!(engine.rule("conflict-2").is_some());
        assert!(engine.rule("fallback-3").is_some());
        assert!(engine.bundle("extra").unwrap().enabled_by_default);
    }

    #[test]
    fn loads_yaml_catalog() {
        let yaml = r#"
option:
  - name: PERFECT_RESTART
  - name: AVERAGES
    default: "on"
  - name: OUT_DOUBLE
implication:
  - id: perfect-restart
    when: PERFECT_RESTART
    "on": [OUT_DOUBLE]
    "off": [AVERAGES]
    priority: 10
"#;
        let engine = CatalogLoader::from_yaml_str(yaml).unwrap();
        assert_eq!(engine.rule_count(), 1);
        assert_eq!(
            engine.registry().lookup("AVERAGES").unwrap().default,
            FlagState::On
        );
    }

    #[test]
    fn unknown_flag_in_rule_fails_fast() {
        let text = r#"
[[option]]
name = "A"

[[implication]]
when = "A"
on = ["B"]
"#;
        assert!(matches!(
            CatalogLoader::from_toml_str(text),
            Err(CascadeError::UnknownOption { name }) if name == "B"
        ));
    }

    #[test]
    fn bad_condition_is_parse_error() {
        let text = r#"
[[option]]
name = "A"

[[implication]]
when = "A &"
on = ["A"]
"#;
        assert!(matches!(
            CatalogLoader::from_toml_str(text),
            Err(CascadeError::Parse { .. })
        ));
    }

    #[test]
    fn generated_ids_skip_ids_declared_later() {
        let text = r#"
[[option]]
name = "A"

[[option]]
name = "B"

[[implication]]
when = "A"
on = ["B"]

[[implication]]
id = "implication-1"
when = "B"
on = ["A"]
"#;
        let engine = CatalogLoader::from_toml_str(text).unwrap();
        assert_eq!(engine.rule_count(), 2);
        assert!(engine.rule("implication-1").is_some());
        assert!(engine.rule("implication-2").is_some());
    }

    #[test]
    fn unknown_keys_rejected() {
        let text = r#"
[[option]]
name = "A"
defualt = "on"
"#;
        assert!(matches!(
            CatalogLoader::from_toml_str(text),
            Err(CascadeError::Parse { .. })
        ));
    }
}
