//! Application profiles: the explicit input of a resolution

use crate::error::Result;
use crate::flag::FlagName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One explicit `(flag, on|off)` choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub flag: FlagName,
    pub value: bool,
}

impl Assignment {
    pub fn on(flag: FlagName) -> Self {
        Self { flag, value: true }
    }

    pub fn off(flag: FlagName) -> Self {
        Self { flag, value: false }
    }
}

/// A named baseline of explicit flag assignments.
///
/// Assignments are ordered. When the same flag appears twice the later
/// assignment wins, like a `#define` followed by an `#undef`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional rule bundles to switch on for this profile
    #[serde(default)]
    pub bundles: Vec<String>,
    /// Default-enabled bundles to switch off for this profile
    #[serde(default)]
    pub disabled_bundles: Vec<String>,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
}

impl Profile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Explicitly switch a flag on
    pub fn define(self, flag: &str) -> Result<Self> {
        Ok(self.with_assignment(Assignment::on(FlagName::new(flag)?)))
    }

    /// Explicitly switch a flag off
    pub fn undef(self, flag: &str) -> Result<Self> {
        Ok(self.with_assignment(Assignment::off(FlagName::new(flag)?)))
    }

    pub fn with_assignment(mut self, assignment: Assignment) -> Self {
        self.assignments.push(assignment);
        self
    }

    pub fn with_bundle(mut self, bundle: impl Into<String>) -> Self {
        self.bundles.push(bundle.into());
        self
    }

    pub fn without_bundle(mut self, bundle: impl Into<String>) -> Self {
        self.disabled_bundles.push(bundle.into());
        self
    }

    /// Final explicit value per flag, later assignments replacing earlier ones.
    pub fn explicit_values(&self) -> BTreeMap<FlagName, bool> {
        self.assignments
            .iter()
            .map(|a| (a.flag.clone(), a.value))
            .collect()
    }

    /// Flags assigned more than once with differing values, in first-seen order.
    pub fn reassigned_flags(&self) -> Vec<&FlagName> {
        let mut seen: BTreeMap<&FlagName, bool> = BTreeMap::new();
        let mut reassigned = Vec::new();
        for a in &self.assignments {
            if let Some(previous) = seen.insert(&a.flag, a.value) {
                if previous != a.value && !reassigned.contains(&&a.flag) {
                    reassigned.push(&a.flag);
                }
            }
        }
        reassigned
    }

    pub fn explicitly_sets(&self, flag: &str) -> Option<bool> {
        self.assignments
            .iter()
            .rev()
            .find(|a| a.flag.as_str() == flag)
            .map(|a| a.value)
    }
}
