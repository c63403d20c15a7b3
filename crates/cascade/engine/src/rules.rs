//! Rule definitions
//!
//! Three rule kinds make up a rule set:
//!
//! - [`Implication`]: `when <condition> then set {flag: on/off, ...}`
//! - [`Conflict`]: at most one member of the set may end up on
//! - [`DefaultFallback`]: when every candidate is still unset, apply a choice
//!
//! Rules without a bundle always apply. Rules in a [`RuleBundle`] apply only
//! when that bundle is active for the profile being resolved.

use crate::condition::Condition;
use cascade_types::{FlagName, RuleId};
use serde::{Deserialize, Serialize};

/// A single `flag := value` produced by a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    pub flag: FlagName,
    pub value: bool,
}

impl Effect {
    pub fn on(flag: FlagName) -> Self {
        Self { flag, value: true }
    }

    pub fn off(flag: FlagName) -> Self {
        Self { flag, value: false }
    }
}

/// Named group of optional rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleBundle {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Active unless a profile disables it
    #[serde(default, alias = "enabled")]
    pub enabled_by_default: bool,
}

impl RuleBundle {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            enabled_by_default: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn enabled(mut self) -> Self {
        self.enabled_by_default = true;
        self
    }
}

/// `when condition then effects`.
///
/// Within a pass implications apply in ascending `priority`, ties in
/// declaration order, so a higher priority rule has the last word on any
/// non-explicit flag it shares with a lower priority rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Implication {
    pub id: RuleId,
    pub condition: Condition,
    pub effects: Vec<Effect>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Implication {
    pub fn new(id: impl Into<String>, condition: Condition) -> Self {
        Self {
            id: RuleId::new(id),
            condition,
            effects: Vec::new(),
            priority: 0,
            bundle: None,
            description: None,
        }
    }

    pub fn set_on(mut self, flag: FlagName) -> Self {
        self.effects.push(Effect::on(flag));
        self
    }

    pub fn set_off(mut self, flag: FlagName) -> Self {
        self.effects.push(Effect::off(flag));
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn in_bundle(mut self, bundle: impl Into<String>) -> Self {
        self.bundle = Some(bundle.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Mutually exclusive flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub id: RuleId,
    pub flags: Vec<FlagName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Conflict {
    pub fn new(id: impl Into<String>, flags: Vec<FlagName>) -> Self {
        Self {
            id: RuleId::new(id),
            flags,
            bundle: None,
            description: None,
        }
    }

    pub fn in_bundle(mut self, bundle: impl Into<String>) -> Self {
        self.bundle = Some(bundle.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// `when all candidates are unset, apply chosen`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultFallback {
    pub id: RuleId,
    pub candidates: Vec<FlagName>,
    pub chosen: Vec<Effect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl DefaultFallback {
    pub fn new(id: impl Into<String>, candidates: Vec<FlagName>, chosen: Vec<Effect>) -> Self {
        Self {
            id: RuleId::new(id),
            candidates,
            chosen,
            bundle: None,
            description: None,
        }
    }

    pub fn in_bundle(mut self, bundle: impl Into<String>) -> Self {
        self.bundle = Some(bundle.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Any rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rule {
    Implication(Implication),
    Conflict(Conflict),
    Fallback(DefaultFallback),
}

impl Rule {
    pub fn id(&self) -> &RuleId {
        match self {
            Rule::Implication(r) => &r.id,
            Rule::Conflict(r) => &r.id,
            Rule::Fallback(r) => &r.id,
        }
    }

    pub fn bundle(&self) -> Option<&str> {
        match self {
            Rule::Implication(r) => r.bundle.as_deref(),
            Rule::Conflict(r) => r.bundle.as_deref(),
            Rule::Fallback(r) => r.bundle.as_deref(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Rule::Implication(_) => "implication",
            Rule::Conflict(_) => "conflict",
            Rule::Fallback(_) => "fallback",
        }
    }

    /// Every flag the rule reads or writes
    pub fn referenced_flags(&self) -> Vec<&FlagName> {
        match self {
            Rule::Implication(r) => {
                let mut flags = r.condition.flags();
                flags.extend(r.effects.iter().map(|e| &e.flag));
                flags
            }
            Rule::Conflict(r) => r.flags.iter().collect(),
            Rule::Fallback(r) => r
                .candidates
                .iter()
                .chain(r.chosen.iter().map(|e| &e.flag))
                .collect(),
        }
    }

    /// Effects written by the rule, empty for conflicts
    pub fn effects(&self) -> &[Effect] {
        match self {
            Rule::Implication(r) => &r.effects,
            Rule::Fallback(r) => &r.chosen,
            Rule::Conflict(_) => &[],
        }
    }
}

impl From<Implication> for Rule {
    fn from(value: Implication) -> Self {
        Rule::Implication(value)
    }
}

impl From<Conflict> for Rule {
    fn from(value: Conflict) -> Self {
        Rule::Conflict(value)
    }
}

impl From<DefaultFallback> for Rule {
    fn from(value: DefaultFallback) -> Self {
        Rule::Fallback(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flag(name: &str) -> FlagName {
        FlagName::new(name).unwrap()
    }

    #[test]
    fn implication_builder() {
        let rule = Implication::new("perfect-restart", Condition::is_on(flag("PERFECT_RESTART")))
            .set_off(flag("AVERAGES"))
            .set_on(flag("OUT_DOUBLE"))
            .with_priority(10);

        assert_eq!(rule.priority, 10);
        assert_eq!(rule.effects.len(), 2);
        assert!(!rule.effects[0].value);
        assert!(rule.effects[1].value);
    }

    #[test]
    fn referenced_flags_cover_condition_and_effects() {
        let rule: Rule = Implication::new("r", Condition::parse("A || B").unwrap())
            .set_on(flag("C"))
            .into();
        let names: Vec<&str> = rule
            .referenced_flags()
            .into_iter()
            .map(FlagName::as_str)
            .collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(rule.kind(), "implication");
    }

    #[test]
    fn fallback_accessors() {
        let rule: Rule = DefaultFallback::new(
            "analytic-vmix",
            vec![flag("GLS_MIXING"), flag("LMD_MIXING")],
            vec![Effect::on(flag("ANA_VMIX"))],
        )
        .in_bundle("legacy")
        .into();
        assert_eq!(rule.bundle(), Some("legacy"));
        assert_eq!(rule.effects().len(), 1);
        assert_eq!(rule.id().as_str(), "analytic-vmix");
    }
}
