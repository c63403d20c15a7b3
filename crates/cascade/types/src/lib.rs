//! # Cascade Types
//!
//! Core types shared by the Cascade resolver and its command-line front end.
//!
//! ## Overview
//!
//! A build is configured by a set of named boolean options ("flags"). An
//! application profile states a handful of them explicitly; a shared rule set
//! derives the rest. The types here describe both ends of that process:
//!
//! - [`FlagName`] / [`FlagState`]: validated flag identifiers and the
//!   tri-state (on/off/unset) value model
//! - [`Profile`] / [`Assignment`]: the explicit, ordered input of one run
//! - [`ResolvedConfig`]: the fully determined output, with a [`Provenance`]
//!   for every flag and the list of [`SkippedOverride`]s
//! - [`CascadeError`]: every failure the resolver can report

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod error;
pub mod flag;
pub mod profile;
pub mod resolved;

pub use error::{CascadeError, Result};
pub use flag::{FlagName, FlagState};
pub use profile::{Assignment, Profile};
pub use resolved::{Provenance, ResolvedConfig, ResolvedFlag, RuleId, SkippedOverride};
