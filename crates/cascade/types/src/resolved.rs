//! Resolved configurations and their provenance trace

use crate::flag::FlagName;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Stable identifier of a rule
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(String);

impl RuleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for RuleId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a flag's current value came from.
///
/// Only `Explicit` is protected: rules may revise values of any other
/// provenance, never an explicit one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Provenance {
    /// Set by the profile
    Explicit,
    /// Set by an implication rule
    Implied { rule: RuleId },
    /// Set by a default-fallback rule
    Fallback { rule: RuleId },
    /// Taken from the option registry
    Default,
}

impl Provenance {
    pub fn is_explicit(&self) -> bool {
        matches!(self, Provenance::Explicit)
    }

    /// Rule that determined the value, if any
    pub fn rule(&self) -> Option<&RuleId> {
        match self {
            Provenance::Implied { rule } | Provenance::Fallback { rule } => Some(rule),
            Provenance::Explicit | Provenance::Default => None,
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Explicit => f.write_str("explicit"),
            Provenance::Implied { rule } => write!(f, "implied by {rule}"),
            Provenance::Fallback { rule } => write!(f, "fallback {rule}"),
            Provenance::Default => f.write_str("registry default"),
        }
    }
}

/// A rule tried to change an explicitly set flag and was ignored.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SkippedOverride {
    pub flag: FlagName,
    pub rule: RuleId,
    /// Value the rule wanted to apply
    pub attempted: bool,
}

/// Final value of one flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedFlag {
    pub name: FlagName,
    pub value: bool,
    pub provenance: Provenance,
}

/// Fully determined flag assignment for one profile.
///
/// Holds every registered option, in registry order. Only ever produced by a
/// successful resolution, so no conflict rule is violated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedConfig {
    pub profile: String,
    pub flags: Vec<ResolvedFlag>,
    #[serde(default)]
    pub skipped_overrides: Vec<SkippedOverride>,
    #[serde(default)]
    pub active_bundles: Vec<String>,
    /// Fixed-point passes used, settle phase included
    pub passes: usize,
}

impl ResolvedConfig {
    pub fn get(&self, flag: &str) -> Option<&ResolvedFlag> {
        self.flags.iter().find(|f| f.name.as_str() == flag)
    }

    /// Value of a flag; unknown flags read as off
    pub fn is_on(&self, flag: &str) -> bool {
        self.get(flag).is_some_and(|f| f.value)
    }

    pub fn provenance(&self, flag: &str) -> Option<&Provenance> {
        self.get(flag).map(|f| &f.provenance)
    }

    pub fn enabled_flags(&self) -> impl Iterator<Item = &FlagName> {
        self.flags.iter().filter(|f| f.value).map(|f| &f.name)
    }

    pub fn disabled_flags(&self) -> impl Iterator<Item = &FlagName> {
        self.flags.iter().filter(|f| !f.value).map(|f| &f.name)
    }

    pub fn skipped_for<'a>(
        &'a self,
        flag: &'a str,
    ) -> impl Iterator<Item = &'a SkippedOverride> + 'a {
        self.skipped_overrides
            .iter()
            .filter(move |s| s.flag.as_str() == flag)
    }

    /// BLAKE3 digest of the flag values, independent of provenance and
    /// registry order. Two configs with the same values share a fingerprint.
    pub fn fingerprint(&self) -> String {
        let mut entries: Vec<(&str, bool)> = self
            .flags
            .iter()
            .map(|f| (f.name.as_str(), f.value))
            .collect();
        entries.sort_unstable();

        let mut hasher = blake3::Hasher::new();
        for (name, value) in entries {
            hasher.update(name.as_bytes());
            hasher.update(if value { b"=1\n" } else { b"=0\n" });
        }
        hasher.finalize().to_hex().to_string()
    }
}
