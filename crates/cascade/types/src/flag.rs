//! Flag identifiers and the tri-state value model

use crate::error::{CascadeError, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// Name of a build option.
///
/// Must look like a C identifier: a letter or underscore followed by
/// letters, digits or underscores. Case is preserved (`pCO2_RZ` is valid).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FlagName(String);

impl FlagName {
    /// Validate and wrap a flag name
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if is_valid_identifier(&name) {
            Ok(Self(name))
        } else {
            Err(CascadeError::InvalidFlagName { name })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl fmt::Display for FlagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for FlagName {
    type Err = CascadeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for FlagName {
    type Error = CascadeError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<FlagName> for String {
    fn from(value: FlagName) -> Self {
        value.0
    }
}

impl Borrow<str> for FlagName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for FlagName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Tri-state flag value.
///
/// `Unset` exists only while resolving and as a registry default; a
/// resolved configuration holds plain booleans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagState {
    On,
    Off,
    #[default]
    Unset,
}

impl FlagState {
    pub fn from_bool(value: bool) -> Self {
        if value {
            FlagState::On
        } else {
            FlagState::Off
        }
    }

    /// `Some(true/false)` when decided, `None` when unset
    pub fn as_bool(self) -> Option<bool> {
        match self {
            FlagState::On => Some(true),
            FlagState::Off => Some(false),
            FlagState::Unset => None,
        }
    }

    pub fn is_set(self) -> bool {
        self != FlagState::Unset
    }

    /// Value used when nothing else decided the flag. An unset default
    /// means "not defined", i.e. off.
    pub fn or_off(self) -> bool {
        self == FlagState::On
    }
}

impl From<bool> for FlagState {
    fn from(value: bool) -> Self {
        Self::from_bool(value)
    }
}

impl fmt::Display for FlagState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FlagState::On => "on",
            FlagState::Off => "off",
            FlagState::Unset => "unset",
        };
        f.write_str(s)
    }
}

impl FromStr for FlagState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "on" | "true" | "define" | "1" => Ok(FlagState::On),
            "off" | "false" | "undef" | "0" => Ok(FlagState::Off),
            "unset" => Ok(FlagState::Unset),
            other => Err(format!("invalid flag state: {other}")),
        }
    }
}
