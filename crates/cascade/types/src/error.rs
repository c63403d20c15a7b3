//! Error types for option registration and resolution

use crate::flag::FlagName;
use crate::resolved::RuleId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building a rule set or resolving a profile.
///
/// Registration-time variants (`DuplicateOption`, `UnknownOption`,
/// `DuplicateRule`, ...) are fatal to startup. `UnstableRuleSet` and
/// `ConflictViolation` are fatal to a single resolution only.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CascadeError {
    /// An option with this name is already registered
    #[error("Duplicate option: {name}")]
    DuplicateOption { name: FlagName },

    /// A rule or profile references an option the registry does not know
    #[error("Unknown option: {name}")]
    UnknownOption { name: String },

    /// The registry was frozen before this registration
    #[error("Option registry is frozen; cannot register {name}")]
    RegistryFrozen { name: FlagName },

    /// Not a valid flag identifier
    #[error("Invalid flag name: {name:?}")]
    InvalidFlagName { name: String },

    /// A rule with this id already exists
    #[error("Duplicate rule id: {rule}")]
    DuplicateRule { rule: RuleId },

    /// A bundle with this name already exists
    #[error("Duplicate bundle: {bundle}")]
    DuplicateBundle { bundle: String },

    /// A rule or profile references an undeclared bundle
    #[error("Unknown rule bundle: {bundle}")]
    UnknownBundle { bundle: String },

    /// A single rule sets the same flag both on and off
    #[error("Rule {rule} sets {flag} both on and off")]
    ContradictoryEffects { rule: RuleId, flag: FlagName },

    /// Structurally invalid rule
    #[error("Invalid rule {rule}: {reason}")]
    InvalidRule { rule: RuleId, reason: String },

    /// Condition expression could not be parsed
    #[error("Condition syntax error at offset {offset} in {input:?}: {message}")]
    ConditionSyntax {
        input: String,
        offset: usize,
        message: String,
    },

    /// Fixed-point iteration did not converge within its bound
    #[error(
        "Rule set did not reach a fixed point after {passes} passes; still changing: {}",
        join_flags(.flags)
    )]
    UnstableRuleSet { passes: usize, flags: Vec<FlagName> },

    /// More than one member of a conflict set resolved on
    #[error("Conflict rule {rule} violated: {} are enabled together", join_flags(.flags))]
    ConflictViolation { rule: RuleId, flags: Vec<FlagName> },

    /// Source file format not recognised
    #[error("Unsupported source format: {path}")]
    UnsupportedFormat { path: String },

    /// Catalog or profile document could not be decoded
    #[error("Failed to parse {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    /// Reading a source file failed
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },
}

fn join_flags(flags: &[FlagName]) -> String {
    flags
        .iter()
        .map(FlagName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for Cascade operations
pub type Result<T> = std::result::Result<T, CascadeError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn flag(name: &str) -> FlagName {
        FlagName::new(name).unwrap()
    }

    #[test]
    fn conflict_display_names_every_flag() {
        let err = CascadeError::ConflictViolation {
            rule: RuleId::new("vertical-mixing"),
            flags: vec![flag("GLS_MIXING"), flag("LMD_MIXING")],
        };
        let s = err.to_string();
        assert!(s.contains("vertical-mixing"));
        assert!(s.contains("GLS_MIXING, LMD_MIXING"));
    }

    #[test]
    fn unstable_display() {
        let err = CascadeError::UnstableRuleSet {
            passes: 5,
            flags: vec![flag("A"), flag("B")],
        };
        let s = err.to_string();
        assert!(s.contains("5 passes"));
        assert!(s.contains("A, B"));
    }
}
