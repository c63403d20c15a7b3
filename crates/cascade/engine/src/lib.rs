//! # Cascade Engine
//!
//! Rule-based resolution of build options.
//!
//! ## Overview
//!
//! Legacy build headers encode option choices as nested `#ifdef` / `#define` /
//! `#undef` cascades whose meaning depends on textual order. This crate
//! replaces that with declared rules evaluated to a fixed point:
//!
//! - [`OptionRegistry`]: every known option with its default
//! - [`Condition`]: boolean expressions over flag states (`A && !B || C`)
//! - [`RuleEngine`]: implications, conflicts and default fallbacks, grouped in
//!   optional [`RuleBundle`]s
//! - [`Resolver`]: profile in, [`ResolvedConfig`] out, deterministically
//! - [`CatalogLoader`] / [`ProfileLoader`]: TOML and YAML sources
//! - [`Reporter`]: pure renderings (compiler defines, header, JSON, trace)
//!
//! ## Example
//!
//! ```rust,no_run
//! use cascade_engine::{Condition, Effect, OptionRegistry, Resolver, RuleEngine};
//! use cascade_types::{FlagName, FlagState, Profile};
//!
//! # fn main() -> cascade_types::Result<()> {
//! let mut registry = OptionRegistry::new();
//! for name in ["GLS_MIXING", "LMD_MIXING", "N2S2_HORAVG"] {
//!     registry.register(FlagName::new(name)?, FlagState::Off)?;
//! }
//!
//! let mut engine = RuleEngine::new(registry);
//! engine.add_implication(
//!     Condition::parse("GLS_MIXING")?,
//!     vec![Effect::on(FlagName::new("N2S2_HORAVG")?)],
//! )?;
//! engine.add_conflict(vec![FlagName::new("GLS_MIXING")?, FlagName::new("LMD_MIXING")?])?;
//!
//! let resolver = Resolver::new(engine);
//! let config = resolver.resolve(&Profile::new("demo").define("GLS_MIXING")?)?;
//! assert!(config.is_on("N2S2_HORAVG"));
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod catalog;
pub mod condition;
pub mod engine;
pub mod format;
pub mod profile;
pub mod registry;
pub mod report;
pub mod resolver;
pub mod rules;

pub use catalog::{CatalogDocument, CatalogLoader};
pub use condition::Condition;
pub use engine::RuleEngine;
pub use format::SourceFormat;
pub use profile::{ProfileDocument, ProfileLoader};
pub use registry::{OptionRegistry, OptionSpec};
pub use report::{
    DefineArgsReporter, HeaderReporter, JsonReporter, Reporter, TraceReporter,
};
pub use resolver::Resolver;
pub use rules::{Conflict, DefaultFallback, Effect, Implication, Rule, RuleBundle};

pub use cascade_types::{
    CascadeError, FlagName, FlagState, Profile, Provenance, ResolvedConfig, Result, RuleId,
};
