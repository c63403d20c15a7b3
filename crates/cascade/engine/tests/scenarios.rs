//! End-to-end resolution scenarios over small, hand-built rule sets.

use cascade_engine::{
    CascadeError, Condition, DefaultFallback, Effect, FlagName, FlagState, Implication,
    OptionRegistry, Profile, Provenance, Resolver, RuleBundle, RuleEngine,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn flag(name: &str) -> FlagName {
    FlagName::new(name).unwrap()
}

fn registry(options: &[(&str, FlagState)]) -> OptionRegistry {
    let mut registry = OptionRegistry::new();
    for (name, default) in options {
        registry.register(flag(name), *default).unwrap();
    }
    registry
}

fn rule_of(provenance: Option<&Provenance>) -> Option<&str> {
    provenance.and_then(Provenance::rule).map(|r| r.as_str())
}

/// GLS closure rule plus the GLS/LMD conflict
fn mixing_engine() -> RuleEngine {
    let mut engine = RuleEngine::new(registry(&[
        ("GLS_MIXING", FlagState::Off),
        ("LMD_MIXING", FlagState::Off),
        ("N2S2_HORAVG", FlagState::Off),
        ("RI_SPLINES", FlagState::Off),
    ]));
    engine
        .add_rule(
            Implication::new("gls-closure", Condition::is_on(flag("GLS_MIXING")))
                .set_on(flag("N2S2_HORAVG"))
                .set_on(flag("RI_SPLINES")),
        )
        .unwrap();
    engine
        .add_conflict(vec![flag("GLS_MIXING"), flag("LMD_MIXING")])
        .unwrap();
    engine
}

fn restart_engine() -> RuleEngine {
    let mut engine = RuleEngine::new(registry(&[
        ("PERFECT_RESTART", FlagState::Off),
        ("AVERAGES", FlagState::On),
        ("DIAGNOSTICS_TS", FlagState::On),
        ("OUT_DOUBLE", FlagState::Off),
    ]));
    engine
        .add_rule(
            Implication::new("perfect-restart", Condition::is_on(flag("PERFECT_RESTART")))
                .set_off(flag("AVERAGES"))
                .set_off(flag("DIAGNOSTICS_TS"))
                .set_on(flag("OUT_DOUBLE"))
                .with_priority(10),
        )
        .unwrap();
    engine
}

fn vmix_engine() -> RuleEngine {
    let mut engine = RuleEngine::new(registry(&[
        ("GLS_MIXING", FlagState::Unset),
        ("LMD_MIXING", FlagState::Unset),
        ("MY25_MIXING", FlagState::Unset),
        ("ANA_VMIX", FlagState::Off),
    ]));
    engine
        .add_rule(DefaultFallback::new(
            "analytic-vmix",
            vec![flag("GLS_MIXING"), flag("LMD_MIXING"), flag("MY25_MIXING")],
            vec![Effect::on(flag("ANA_VMIX"))],
        ))
        .unwrap();
    engine
        .add_conflict(vec![flag("GLS_MIXING"), flag("LMD_MIXING"), flag("MY25_MIXING")])
        .unwrap();
    engine
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn gls_closure_implies_smoothing_and_splines() {
    let resolver = Resolver::new(mixing_engine());
    let config = resolver
        .resolve(&Profile::new("gls").define("GLS_MIXING").unwrap())
        .unwrap();

    assert!(config.is_on("GLS_MIXING"));
    assert!(config.is_on("N2S2_HORAVG"));
    assert!(config.is_on("RI_SPLINES"));
    assert!(!config.is_on("LMD_MIXING"));
    assert_eq!(config.provenance("GLS_MIXING"), Some(&Provenance::Explicit));
    assert_eq!(rule_of(config.provenance("RI_SPLINES")), Some("gls-closure"));
    assert_eq!(config.provenance("LMD_MIXING"), Some(&Provenance::Default));
}

#[test]
fn two_mixing_schemes_violate_conflict() {
    let resolver = Resolver::new(mixing_engine());
    let profile = Profile::new("both")
        .define("GLS_MIXING")
        .unwrap()
        .define("LMD_MIXING")
        .unwrap();

    match resolver.resolve(&profile) {
        Err(CascadeError::ConflictViolation { flags, .. }) => {
            let names: Vec<&str> = flags.iter().map(FlagName::as_str).collect();
            assert_eq!(names, vec!["GLS_MIXING", "LMD_MIXING"]);
        }
        other => panic!("expected conflict violation, got {other:?}"),
    }
}

#[test]
fn perfect_restart_overrides_registry_defaults() {
    let resolver = Resolver::new(restart_engine());
    let config = resolver
        .resolve(&Profile::new("restart").define("PERFECT_RESTART").unwrap())
        .unwrap();

    assert!(!config.is_on("AVERAGES"));
    assert!(!config.is_on("DIAGNOSTICS_TS"));
    assert!(config.is_on("OUT_DOUBLE"));
    assert_eq!(rule_of(config.provenance("AVERAGES")), Some("perfect-restart"));
}

#[test]
fn explicit_value_survives_and_override_is_recorded() {
    let resolver = Resolver::new(restart_engine());
    let profile = Profile::new("restart")
        .define("PERFECT_RESTART")
        .unwrap()
        .define("AVERAGES")
        .unwrap();
    let config = resolver.resolve(&profile).unwrap();

    assert!(config.is_on("AVERAGES"));
    assert_eq!(config.provenance("AVERAGES"), Some(&Provenance::Explicit));

    let skipped: Vec<_> = config.skipped_for("AVERAGES").collect();
    assert_eq!(skipped.len(), 1, "skipped overrides are recorded once");
    assert_eq!(skipped[0].rule.as_str(), "perfect-restart");
    assert!(!skipped[0].attempted);
}

#[test]
fn fallback_applies_when_no_mixing_scheme_chosen() {
    let resolver = Resolver::new(vmix_engine());
    let config = resolver.resolve(&Profile::new("none")).unwrap();

    assert!(config.is_on("ANA_VMIX"));
    assert!(matches!(
        config.provenance("ANA_VMIX"),
        Some(Provenance::Fallback { .. })
    ));
    for name in ["GLS_MIXING", "LMD_MIXING", "MY25_MIXING"] {
        assert!(!config.is_on(name));
        assert_eq!(config.provenance(name), Some(&Provenance::Default));
    }
}

#[test]
fn fallback_does_not_fire_once_a_candidate_is_decided() {
    let resolver = Resolver::new(vmix_engine());
    let config = resolver
        .resolve(&Profile::new("lmd-off").undef("LMD_MIXING").unwrap())
        .unwrap();
    assert!(!config.is_on("ANA_VMIX"));
    assert_eq!(config.provenance("ANA_VMIX"), Some(&Provenance::Default));
}

#[test]
fn several_candidates_on_is_a_conflict_not_a_fallback() {
    let resolver = Resolver::new(vmix_engine());
    let profile = Profile::new("two")
        .define("GLS_MIXING")
        .unwrap()
        .define("MY25_MIXING")
        .unwrap();
    assert!(matches!(
        resolver.resolve(&profile),
        Err(CascadeError::ConflictViolation { .. })
    ));
}

#[test]
fn oscillating_rules_are_reported_unstable() {
    let mut engine = RuleEngine::new(registry(&[("A", FlagState::Off), ("B", FlagState::Off)]));
    engine
        .add_rule(DefaultFallback::new(
            "seed-b",
            vec![flag("B")],
            vec![Effect::on(flag("B"))],
        ))
        .unwrap();
    engine
        .add_rule(Implication::new("not-b-sets-a", Condition::is_off(flag("B"))).set_on(flag("A")))
        .unwrap();
    engine
        .add_rule(Implication::new("b-clears-a", Condition::is_on(flag("B"))).set_off(flag("A")))
        .unwrap();
    engine
        .add_rule(Implication::new("a-sets-b", Condition::is_on(flag("A"))).set_on(flag("B")))
        .unwrap();
    engine
        .add_rule(Implication::new("not-a-clears-b", Condition::is_off(flag("A"))).set_off(flag("B")))
        .unwrap();

    match Resolver::new(engine).resolve(&Profile::new("loop")) {
        Err(CascadeError::UnstableRuleSet { passes, flags }) => {
            assert_eq!(passes, 6);
            let names: Vec<&str> = flags.iter().map(FlagName::as_str).collect();
            assert_eq!(names, vec!["A", "B"]);
        }
        other => panic!("expected unstable rule set, got {other:?}"),
    }
}

#[test]
fn higher_priority_has_the_last_word() {
    let mut engine = RuleEngine::new(registry(&[
        ("TRIGGER", FlagState::Off),
        ("TARGET", FlagState::Off),
    ]));
    engine
        .add_rule(
            Implication::new("late", Condition::is_on(flag("TRIGGER")))
                .set_off(flag("TARGET"))
                .with_priority(5),
        )
        .unwrap();
    engine
        .add_rule(Implication::new("early", Condition::is_on(flag("TRIGGER"))).set_on(flag("TARGET")))
        .unwrap();

    let config = Resolver::new(engine)
        .resolve(&Profile::new("p").define("TRIGGER").unwrap())
        .unwrap();
    assert!(!config.is_on("TARGET"));
    assert_eq!(rule_of(config.provenance("TARGET")), Some("late"));
}

#[test]
fn bundles_select_optional_rules() {
    let mut engine = RuleEngine::new(registry(&[
        ("BIO_FENNEL", FlagState::Off),
        ("ANA_BIOLOGY", FlagState::Off),
        ("DIAGNOSTICS_BIO", FlagState::Off),
    ]));
    engine.add_bundle(RuleBundle::new("bio-legacy")).unwrap();
    engine
        .add_bundle(RuleBundle::new("fennel-diagnostics").enabled())
        .unwrap();
    engine
        .add_rule(
            Implication::new("legacy", Condition::is_on(flag("BIO_FENNEL")))
                .set_on(flag("ANA_BIOLOGY"))
                .in_bundle("bio-legacy"),
        )
        .unwrap();
    engine
        .add_rule(
            Implication::new("diagnostics", Condition::is_on(flag("BIO_FENNEL")))
                .set_on(flag("DIAGNOSTICS_BIO"))
                .in_bundle("fennel-diagnostics"),
        )
        .unwrap();
    let resolver = Resolver::new(engine);
    let fennel = Profile::new("fennel").define("BIO_FENNEL").unwrap();

    let plain = resolver.resolve(&fennel).unwrap();
    assert!(!plain.is_on("ANA_BIOLOGY"));
    assert!(plain.is_on("DIAGNOSTICS_BIO"));
    assert_eq!(plain.active_bundles, vec!["fennel-diagnostics"]);

    let tuned = resolver
        .resolve(
            &fennel
                .clone()
                .with_bundle("bio-legacy")
                .without_bundle("fennel-diagnostics"),
        )
        .unwrap();
    assert!(tuned.is_on("ANA_BIOLOGY"));
    assert!(!tuned.is_on("DIAGNOSTICS_BIO"));

    let both = resolver
        .resolve(
            &fennel
                .with_bundle("fennel-diagnostics")
                .without_bundle("fennel-diagnostics"),
        )
        .unwrap();
    assert!(both.is_on("DIAGNOSTICS_BIO"), "enabling wins over disabling");
}

#[test]
fn three_valued_or_fires_on_a_known_operand() {
    let mut engine = RuleEngine::new(registry(&[
        ("GLS_MIXING", FlagState::Off),
        ("MY25_MIXING", FlagState::Off),
        ("RI_SPLINES", FlagState::Off),
    ]));
    engine
        .add_implication(
            Condition::parse("GLS_MIXING || MY25_MIXING").unwrap(),
            vec![Effect::on(flag("RI_SPLINES"))],
        )
        .unwrap();
    let config = Resolver::new(engine)
        .resolve(&Profile::new("my25").define("MY25_MIXING").unwrap())
        .unwrap();
    assert!(config.is_on("RI_SPLINES"));
    // two passes before defaults, one quiet settle pass after
    assert_eq!(config.passes, 3);
}

#[test]
fn resolution_is_deterministic() {
    let resolver = Resolver::new(mixing_engine());
    let profile = Profile::new("gls").define("GLS_MIXING").unwrap();
    let first = resolver.resolve(&profile).unwrap();
    let second = resolver.resolve(&profile).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.fingerprint(), second.fingerprint());
}

#[test]
fn fallback_waits_for_implication_chains() {
    for reversed in [false, true] {
        let mut engine = RuleEngine::new(registry(&[
            ("UPWELLING", FlagState::Off),
            ("TURBULENCE", FlagState::Off),
            ("GLS_MIXING", FlagState::Off),
            ("ANA_VMIX", FlagState::Off),
        ]));
        let mut chain = vec![
            Implication::new("upwelling-turbulence", Condition::is_on(flag("UPWELLING")))
                .set_on(flag("TURBULENCE")),
            Implication::new("turbulence-gls", Condition::is_on(flag("TURBULENCE")))
                .set_on(flag("GLS_MIXING")),
        ];
        if reversed {
            chain.reverse();
        }
        for rule in chain {
            engine.add_rule(rule).unwrap();
        }
        engine
            .add_rule(DefaultFallback::new(
                "analytic-vmix",
                vec![flag("GLS_MIXING")],
                vec![Effect::on(flag("ANA_VMIX"))],
            ))
            .unwrap();

        let config = Resolver::new(engine)
            .resolve(&Profile::new("chain").define("UPWELLING").unwrap())
            .unwrap();
        assert!(config.is_on("GLS_MIXING"), "reversed: {reversed}");
        assert!(!config.is_on("ANA_VMIX"), "reversed: {reversed}");
        assert_eq!(config.provenance("ANA_VMIX"), Some(&Provenance::Default));
    }
}
