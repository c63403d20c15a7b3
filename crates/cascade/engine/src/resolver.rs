//! Resolver: profile in, fully determined configuration out
//!
//! Resolution is a pure function of (registry, rule set, profile). The
//! resolver holds the frozen engine behind an `Arc`, so clones are cheap and
//! independent resolutions can run on separate threads.

use crate::engine::{RuleEngine, WorkingSet};
use cascade_types::{
    CascadeError, FlagState, Profile, Provenance, ResolvedConfig, ResolvedFlag, Result,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Resolves profiles against a shared rule engine
#[derive(Debug, Clone)]
pub struct Resolver {
    engine: Arc<RuleEngine>,
}

impl Resolver {
    pub fn new(engine: RuleEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    pub fn from_shared(engine: Arc<RuleEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    /// Resolve one profile.
    ///
    /// Order of work: validate the profile, seed explicit values, run the
    /// rules to a fixed point, fill registry defaults, settle the rules again
    /// over the defaulted values, then check conflicts.
    #[instrument(skip(self, profile), fields(profile = %profile.name))]
    pub fn resolve(&self, profile: &Profile) -> Result<ResolvedConfig> {
        let registry = self.engine.registry();
        let rules = self
            .engine
            .active_rules(&profile.bundles, &profile.disabled_bundles)?;

        for assignment in &profile.assignments {
            registry.lookup(assignment.flag.as_str())?;
        }
        for flag in profile.reassigned_flags() {
            warn!(flag = %flag, "Profile assigns flag more than once; last assignment wins");
        }

        let mut working = WorkingSet::unset(registry.len());
        for (flag, value) in profile.explicit_values() {
            let index = registry.index_of(flag.as_str())?;
            working.set(index, value, Provenance::Explicit);
        }

        let mut skipped = BTreeSet::new();
        let mut passes = self
            .engine
            .run_to_fixed_point(&rules, &mut working, &mut skipped)?;

        let defaulted = self.engine.fill_defaults(&mut working);
        debug!(defaulted, "Filled registry defaults");
        if defaulted > 0 {
            passes += self
                .engine
                .run_to_fixed_point(&rules, &mut working, &mut skipped)?;
        }

        self.engine.check_conflicts(&rules, &working)?;

        let flags: Vec<ResolvedFlag> = registry
            .iter()
            .zip(working.slots)
            .map(|(spec, slot)| ResolvedFlag {
                name: spec.name.clone(),
                value: slot.state == FlagState::On,
                provenance: slot.provenance.unwrap_or(Provenance::Default),
            })
            .collect();

        let config = ResolvedConfig {
            profile: profile.name.clone(),
            flags,
            skipped_overrides: skipped.into_iter().collect(),
            active_bundles: rules.bundles,
            passes,
        };

        info!(
            enabled = config.enabled_flags().count(),
            total = config.flags.len(),
            passes = config.passes,
            skipped_overrides = config.skipped_overrides.len(),
            "Resolved profile"
        );
        Ok(config)
    }

    /// Resolve several profiles independently, keeping input order
    pub fn resolve_many<'a>(
        &self,
        profiles: impl IntoIterator<Item = &'a Profile>,
    ) -> Vec<Result<ResolvedConfig>> {
        profiles.into_iter().map(|p| self.resolve(p)).collect()
    }

    /// Run one more pass over a resolved configuration and report whether it
    /// is unchanged, i.e. still a fixed point of the active rules.
    pub fn check_fixed_point(&self, config: &ResolvedConfig) -> Result<bool> {
        let registry = self.engine.registry();
        let disabled: Vec<String> = self
            .engine
            .bundles()
            .iter()
            .filter(|b| !config.active_bundles.contains(&b.name))
            .map(|b| b.name.clone())
            .collect();
        let rules = self.engine.active_rules(&config.active_bundles, &disabled)?;

        let mut working = WorkingSet::unset(registry.len());
        for (index, spec) in registry.iter().enumerate() {
            let flag = config
                .get(spec.name.as_str())
                .ok_or_else(|| CascadeError::UnknownOption {
                    name: spec.name.to_string(),
                })?;
            working.set(index, flag.value, flag.provenance.clone());
        }

        let before = working.clone();
        let mut skipped = BTreeSet::new();
        self.engine.run_pass(&rules, &mut working, &mut skipped);
        Ok(working == before)
    }
}
