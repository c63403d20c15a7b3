//! Rule engine and fixed-point evaluation
//!
//! The engine owns the (frozen) option registry and the shared rule set.
//! Every rule is validated against the registry when it is added, so
//! resolution never meets an unknown flag coming from a rule.

use crate::condition::Condition;
use crate::registry::OptionRegistry;
use crate::rules::{Conflict, DefaultFallback, Effect, Implication, Rule, RuleBundle};
use cascade_types::{
    CascadeError, FlagName, FlagState, Provenance, Result, RuleId, SkippedOverride,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Registry plus the shared, profile-independent rule set
#[derive(Debug, Clone)]
pub struct RuleEngine {
    registry: OptionRegistry,
    bundles: Vec<RuleBundle>,
    rules: Vec<Rule>,
    ids: BTreeSet<RuleId>,
}

impl RuleEngine {
    /// Take ownership of the registry and freeze it
    pub fn new(mut registry: OptionRegistry) -> Self {
        registry.freeze();
        Self {
            registry,
            bundles: Vec::new(),
            rules: Vec::new(),
            ids: BTreeSet::new(),
        }
    }

    pub fn registry(&self) -> &OptionRegistry {
        &self.registry
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id().as_str() == id)
    }

    pub fn bundles(&self) -> &[RuleBundle] {
        &self.bundles
    }

    pub fn bundle(&self, name: &str) -> Option<&RuleBundle> {
        self.bundles.iter().find(|b| b.name == name)
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn add_bundle(&mut self, bundle: RuleBundle) -> Result<()> {
        if self.bundle(&bundle.name).is_some() {
            return Err(CascadeError::DuplicateBundle {
                bundle: bundle.name,
            });
        }
        debug!(bundle = %bundle.name, enabled = bundle.enabled_by_default, "Declared rule bundle");
        self.bundles.push(bundle);
        Ok(())
    }

    /// `when condition then effects`, with a generated id
    pub fn add_implication(&mut self, condition: Condition, effects: Vec<Effect>) -> Result<RuleId> {
        let id = self.generate_id("implication");
        self.add_rule(Implication::new(id, condition).with_effects(effects))
    }

    /// At most one of `flags` may be on, with a generated id
    pub fn add_conflict(&mut self, flags: Vec<FlagName>) -> Result<RuleId> {
        let id = self.generate_id("conflict");
        self.add_rule(Conflict::new(id, flags))
    }

    /// Apply `chosen` when every candidate is unset, with a generated id
    pub fn add_default_fallback(
        &mut self,
        candidates: Vec<FlagName>,
        chosen: Vec<Effect>,
    ) -> Result<RuleId> {
        let id = self.generate_id("fallback");
        self.add_rule(DefaultFallback::new(id, candidates, chosen))
    }

    /// Validate and store a rule
    pub fn add_rule(&mut self, rule: impl Into<Rule>) -> Result<RuleId> {
        let mut rule = rule.into();

        if self.ids.contains(rule.id()) {
            return Err(CascadeError::DuplicateRule {
                rule: rule.id().clone(),
            });
        }
        if let Some(bundle) = rule.bundle() {
            if self.bundle(bundle).is_none() {
                return Err(CascadeError::UnknownBundle {
                    bundle: bundle.to_string(),
                });
            }
        }
        for flag in rule.referenced_flags() {
            self.registry.lookup(flag.as_str())?;
        }
        check_effects(rule.id(), rule.effects())?;

        match &mut rule {
            Rule::Implication(r) if r.effects.is_empty() => {
                return Err(invalid(&r.id, "implication has no effects"));
            }
            Rule::Fallback(r) if r.candidates.is_empty() || r.chosen.is_empty() => {
                return Err(invalid(&r.id, "fallback needs candidates and a choice"));
            }
            Rule::Conflict(r) => {
                let mut seen = BTreeSet::new();
                r.flags.retain(|f| seen.insert(f.clone()));
                if r.flags.len() < 2 {
                    return Err(invalid(&r.id, "conflict needs at least two distinct flags"));
                }
            }
            _ => {}
        }

        let id = rule.id().clone();
        debug!(rule = %id, kind = rule.kind(), bundle = ?rule.bundle(), "Added rule");
        self.ids.insert(id.clone());
        self.rules.push(rule);
        Ok(id)
    }

    pub(crate) fn generate_id(&self, kind: &str) -> String {
        self.generate_id_avoiding(kind, &BTreeSet::new())
    }

    /// Next free `<kind>-<n>` id that is neither registered nor in `reserved`
    pub(crate) fn generate_id_avoiding(&self, kind: &str, reserved: &BTreeSet<&str>) -> String {
        let mut n = self.rules.len() + 1;
        loop {
            let candidate = format!("{kind}-{n}");
            if !self.ids.contains(candidate.as_str()) && !reserved.contains(candidate.as_str()) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Rules participating for the given bundle selection.
    ///
    /// A bundle is active when it is enabled explicitly, or enabled by default
    /// and not disabled. Explicit enabling wins over disabling.
    pub(crate) fn active_rules(
        &self,
        enable: &[String],
        disable: &[String],
    ) -> Result<ActiveRules<'_>> {
        for name in enable.iter().chain(disable) {
            if self.bundle(name).is_none() {
                return Err(CascadeError::UnknownBundle {
                    bundle: name.clone(),
                });
            }
        }

        let bundles: Vec<String> = self
            .bundles
            .iter()
            .filter(|b| {
                enable.contains(&b.name) || (b.enabled_by_default && !disable.contains(&b.name))
            })
            .map(|b| b.name.clone())
            .collect();
        let is_active =
            |bundle: Option<&str>| bundle.map_or(true, |b| bundles.iter().any(|a| a == b));

        let mut implications: Vec<&Implication> = Vec::new();
        let mut conflicts: Vec<&Conflict> = Vec::new();
        let mut fallbacks: Vec<&DefaultFallback> = Vec::new();
        for rule in self.rules.iter().filter(|r| is_active(r.bundle())) {
            match rule {
                Rule::Implication(r) => implications.push(r),
                Rule::Conflict(r) => conflicts.push(r),
                Rule::Fallback(r) => fallbacks.push(r),
            }
        }
        implications.sort_by_key(|r| r.priority);

        Ok(ActiveRules {
            implications,
            conflicts,
            fallbacks,
            bundles,
        })
    }

    /// One pass: implications in priority order, then fallbacks.
    ///
    /// Fallbacks only run in a pass where no implication changed anything, so
    /// a candidate switched on by an implication chain is always seen first,
    /// whatever order the chain was declared in.
    pub(crate) fn run_pass(
        &self,
        rules: &ActiveRules<'_>,
        working: &mut WorkingSet,
        skipped: &mut BTreeSet<SkippedOverride>,
    ) {
        let before = working.clone();
        for implication in &rules.implications {
            let fires = implication
                .condition
                .evaluate(&|flag: &FlagName| working.state(&self.registry, flag));
            if fires != Some(true) {
                continue;
            }
            for effect in &implication.effects {
                working.apply(
                    &self.registry,
                    effect,
                    Provenance::Implied {
                        rule: implication.id.clone(),
                    },
                    skipped,
                );
            }
        }

        if *working != before {
            return;
        }

        for fallback in &rules.fallbacks {
            let untouched = fallback
                .candidates
                .iter()
                .all(|c| !working.state(&self.registry, c).is_set());
            if !untouched {
                continue;
            }
            for effect in &fallback.chosen {
                working.apply(
                    &self.registry,
                    effect,
                    Provenance::Fallback {
                        rule: fallback.id.clone(),
                    },
                    skipped,
                );
            }
        }
    }

    /// Repeat passes until one leaves the assignment unchanged.
    ///
    /// Bounded by `active rules + 1` passes; returns the number of passes run,
    /// the final quiet pass included.
    pub(crate) fn run_to_fixed_point(
        &self,
        rules: &ActiveRules<'_>,
        working: &mut WorkingSet,
        skipped: &mut BTreeSet<SkippedOverride>,
    ) -> Result<usize> {
        let bound = rules.len() + 1;
        let mut changing = Vec::new();

        for pass in 1..=bound {
            let before = working.clone();
            self.run_pass(rules, working, skipped);
            if *working == before {
                debug!(passes = pass, "Fixed point reached");
                return Ok(pass);
            }
            changing = before.changed_flags(working, &self.registry);
            debug!(pass, changed = changing.len(), "Pass changed assignment");
        }

        warn!(
            passes = bound,
            flags = ?changing.iter().map(FlagName::as_str).collect::<Vec<_>>(),
            "Rule set did not converge"
        );
        Err(CascadeError::UnstableRuleSet {
            passes: bound,
            flags: changing,
        })
    }

    /// Give every unset flag its registry default; returns how many were filled
    pub(crate) fn fill_defaults(&self, working: &mut WorkingSet) -> usize {
        let mut filled = 0;
        for (index, slot) in working.slots.iter_mut().enumerate() {
            if slot.state.is_set() {
                continue;
            }
            let default = self.registry.spec_at(index).default;
            slot.state = FlagState::from_bool(default.or_off());
            slot.provenance = Some(Provenance::Default);
            filled += 1;
        }
        filled
    }

    /// First violated conflict rule, in declaration order
    pub(crate) fn check_conflicts(
        &self,
        rules: &ActiveRules<'_>,
        working: &WorkingSet,
    ) -> Result<()> {
        for conflict in &rules.conflicts {
            let on: Vec<FlagName> = conflict
                .flags
                .iter()
                .filter(|f| working.state(&self.registry, f) == FlagState::On)
                .cloned()
                .collect();
            if on.len() > 1 {
                warn!(
                    rule = %conflict.id,
                    flags = ?on.iter().map(FlagName::as_str).collect::<Vec<_>>(),
                    "Conflict rule violated"
                );
                return Err(CascadeError::ConflictViolation {
                    rule: conflict.id.clone(),
                    flags: on,
                });
            }
        }
        Ok(())
    }
}

fn invalid(rule: &RuleId, reason: &str) -> CascadeError {
    CascadeError::InvalidRule {
        rule: rule.clone(),
        reason: reason.to_string(),
    }
}

fn check_effects(rule: &RuleId, effects: &[Effect]) -> Result<()> {
    let mut values: BTreeMap<&FlagName, bool> = BTreeMap::new();
    for effect in effects {
        if let Some(previous) = values.insert(&effect.flag, effect.value) {
            if previous != effect.value {
                return Err(CascadeError::ContradictoryEffects {
                    rule: rule.clone(),
                    flag: effect.flag.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Rules selected for one resolution
#[derive(Debug)]
pub(crate) struct ActiveRules<'a> {
    pub implications: Vec<&'a Implication>,
    pub conflicts: Vec<&'a Conflict>,
    pub fallbacks: Vec<&'a DefaultFallback>,
    pub bundles: Vec<String>,
}

impl ActiveRules<'_> {
    pub fn len(&self) -> usize {
        self.implications.len() + self.conflicts.len() + self.fallbacks.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Slot {
    pub state: FlagState,
    pub provenance: Option<Provenance>,
}

/// Working assignment local to one resolution, indexed like the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WorkingSet {
    pub slots: Vec<Slot>,
}

impl WorkingSet {
    pub fn unset(len: usize) -> Self {
        Self {
            slots: vec![
                Slot {
                    state: FlagState::Unset,
                    provenance: None,
                };
                len
            ],
        }
    }

    pub fn set(&mut self, index: usize, value: bool, provenance: Provenance) {
        self.slots[index] = Slot {
            state: FlagState::from_bool(value),
            provenance: Some(provenance),
        };
    }

    pub fn state(&self, registry: &OptionRegistry, flag: &FlagName) -> FlagState {
        registry
            .index_of(flag.as_str())
            .map_or(FlagState::Unset, |i| self.slots[i].state)
    }

    /// Write an effect unless the flag is explicit; explicit flags record a
    /// skipped override when the rule wanted the opposite value.
    fn apply(
        &mut self,
        registry: &OptionRegistry,
        effect: &Effect,
        provenance: Provenance,
        skipped: &mut BTreeSet<SkippedOverride>,
    ) {
        let Ok(index) = registry.index_of(effect.flag.as_str()) else {
            return;
        };
        let slot = &mut self.slots[index];

        if matches!(slot.provenance, Some(Provenance::Explicit)) {
            if slot.state.as_bool() != Some(effect.value) {
                if let Some(rule) = provenance.rule() {
                    let record = SkippedOverride {
                        flag: effect.flag.clone(),
                        rule: rule.clone(),
                        attempted: effect.value,
                    };
                    if skipped.insert(record) {
                        debug!(
                            flag = %effect.flag,
                            rule = %rule,
                            attempted = effect.value,
                            "Skipped override of explicit flag"
                        );
                    }
                }
            }
            return;
        }

        slot.state = FlagState::from_bool(effect.value);
        slot.provenance = Some(provenance);
    }

    fn changed_flags(&self, other: &WorkingSet, registry: &OptionRegistry) -> Vec<FlagName> {
        self.slots
            .iter()
            .zip(&other.slots)
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(i, _)| registry.spec_at(i).name.clone())
            .collect()
    }
}
