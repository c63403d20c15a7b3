//! Option registry
//!
//! The canonical universe of flags. Registration happens at startup; once
//! frozen the registry is read-only, and [`RuleEngine::new`] freezes the
//! registry it takes ownership of.
//!
//! [`RuleEngine::new`]: crate::RuleEngine::new

use cascade_types::{CascadeError, FlagName, FlagState, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Metadata for one registered option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionSpec {
    pub name: FlagName,
    #[serde(default)]
    pub default: FlagState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Free-form grouping used by listings (e.g. "mixing", "biology")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl OptionSpec {
    pub fn new(name: FlagName, default: FlagState) -> Self {
        Self {
            name,
            default,
            description: None,
            group: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

/// Registry of known options, kept in registration order
#[derive(Debug, Clone, Default)]
pub struct OptionRegistry {
    options: Vec<OptionSpec>,
    index: BTreeMap<FlagName, usize>,
    frozen: bool,
}

impl OptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an option with a default and no metadata
    pub fn register(&mut self, name: FlagName, default: FlagState) -> Result<()> {
        self.register_option(OptionSpec::new(name, default))
    }

    pub fn register_option(&mut self, spec: OptionSpec) -> Result<()> {
        if self.frozen {
            return Err(CascadeError::RegistryFrozen { name: spec.name });
        }
        if self.index.contains_key(&spec.name) {
            return Err(CascadeError::DuplicateOption { name: spec.name });
        }

        debug!(option = %spec.name, default = %spec.default, "Registered option");
        self.index.insert(spec.name.clone(), self.options.len());
        self.options.push(spec);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<&OptionSpec> {
        self.index_of(name).map(|i| &self.options[i])
    }

    /// Position of an option in registration order
    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| CascadeError::UnknownOption {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Stop accepting registrations
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OptionSpec> {
        self.options.iter()
    }

    pub(crate) fn spec_at(&self, index: usize) -> &OptionSpec {
        &self.options[index]
    }
}
