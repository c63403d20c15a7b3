//! Source formats for catalogs and profiles

use cascade_types::{CascadeError, Result};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Declarative document format, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Toml,
    Yaml,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(SourceFormat::Toml),
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Ok(SourceFormat::Yaml)
            }
            _ => Err(CascadeError::UnsupportedFormat {
                path: path.display().to_string(),
            }),
        }
    }

    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            SourceFormat::Toml => &["toml"],
            SourceFormat::Yaml => &["yaml", "yml"],
        }
    }

    pub(crate) fn decode<T: DeserializeOwned>(self, source_name: &str, text: &str) -> Result<T> {
        let parsed = match self {
            SourceFormat::Toml => toml::from_str(text).map_err(|e| e.to_string()),
            SourceFormat::Yaml => serde_yaml::from_str(text).map_err(|e| e.to_string()),
        };
        parsed.map_err(|message| CascadeError::Parse {
            source_name: source_name.to_string(),
            message,
        })
    }
}

pub(crate) fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| CascadeError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}
