//! Profile loading from TOML/YAML
//!
//! ```toml
//! name = "upwelling"
//! description = "Upwelling Example"
//! bundles = ["bio-legacy"]
//! flags = [
//!     "UV_ADV",
//!     "!LMD_MIXING",
//!     { flag = "GLS_MIXING", value = "on" },
//! ]
//! ```

use crate::format::{read_source, SourceFormat};
use cascade_types::{
    Assignment, CascadeError, FlagName, FlagState, Profile, Result,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Raw profile document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileDocument {
    /// Defaults to the file stem when absent
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub bundles: Vec<String>,
    #[serde(default)]
    pub disabled_bundles: Vec<String>,
    #[serde(default, alias = "assignments")]
    pub flags: Vec<AssignmentEntry>,
}

/// One assignment as written in a profile file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssignmentEntry {
    /// `"FLAG"` (on) or `"!FLAG"` (off)
    Short(String),
    Long { flag: FlagName, value: FlagState },
}

impl AssignmentEntry {
    fn into_assignment(self, source_name: &str) -> Result<Assignment> {
        match self {
            AssignmentEntry::Short(text) => {
                let text = text.trim();
                match text.strip_prefix('!') {
                    Some(rest) => Ok(Assignment::off(FlagName::new(rest.trim())?)),
                    None => Ok(Assignment::on(FlagName::new(text)?)),
                }
            }
            AssignmentEntry::Long { flag, value } => match value.as_bool() {
                Some(value) => Ok(Assignment { flag, value }),
                None => Err(CascadeError::Parse {
                    source_name: source_name.to_string(),
                    message: format!("assignment of {flag} must be \"on\" or \"off\""),
                }),
            },
        }
    }
}

impl ProfileDocument {
    pub fn into_profile(self, fallback_name: &str, source_name: &str) -> Result<Profile> {
        let assignments = self
            .flags
            .into_iter()
            .map(|entry| entry.into_assignment(source_name))
            .collect::<Result<Vec<_>>>()?;

        Ok(Profile {
            name: self.name.unwrap_or_else(|| fallback_name.to_string()),
            description: self.description,
            bundles: self.bundles,
            disabled_bundles: self.disabled_bundles,
            assignments,
        })
    }
}

/// Loads profiles from files or strings
pub struct ProfileLoader;

impl ProfileLoader {
    pub fn load(path: impl AsRef<Path>) -> Result<Profile> {
        let path = path.as_ref();
        let format = SourceFormat::from_path(path)?;
        let text = read_source(path)?;
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("profile");
        let profile = Self::parse(&text, format, stem, &path.display().to_string())?;
        debug!(
            profile = %profile.name,
            path = %path.display(),
            assignments = profile.assignments.len(),
            "Loaded profile"
        );
        Ok(profile)
    }

    pub fn parse(
        text: &str,
        format: SourceFormat,
        fallback_name: &str,
        source_name: &str,
    ) -> Result<Profile> {
        let document: ProfileDocument = format.decode(source_name, text)?;
        document.into_profile(fallback_name, source_name)
    }

    pub fn from_toml_str(text: &str, fallback_name: &str) -> Result<Profile> {
        Self::parse(text, SourceFormat::Toml, fallback_name, "<toml>")
    }

    pub fn from_yaml_str(text: &str, fallback_name: &str) -> Result<Profile> {
        Self::parse(text, SourceFormat::Yaml, fallback_name, "<yaml>")
    }

    /// Find `<name>.toml`, `<name>.yaml` or `<name>.yml` in a directory
    pub fn locate(dir: &Path, name: &str) -> Option<PathBuf> {
        [SourceFormat::Toml, SourceFormat::Yaml]
            .iter()
            .flat_map(|format| format.extensions().iter())
            .map(|ext| dir.join(format!("{name}.{ext}")))
            .find(|candidate| candidate.is_file())
    }

    /// Load every profile in a directory, sorted by file name
    pub fn load_dir(dir: &Path) -> Result<Vec<Profile>> {
        let io_error = |e: std::io::Error| CascadeError::Io {
            path: dir.display().to_string(),
            message: e.to_string(),
        };

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_error)? {
            let path = entry.map_err(io_error)?.path();
            if path.is_file() && SourceFormat::from_path(&path).is_ok() {
                paths.push(path);
            }
        }
        paths.sort();

        paths.iter().map(Self::load).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_and_long_assignments() {
        let text = r#"
name = "ideal_2per"
bundles = ["analytic-bulk-forcing"]
flags = [
    "GLS_MIXING",
    "!LMD_MIXING",
    { flag = "BULK_FLUXES", value = "off" },
    { flag = "CANUTO_A", value = "on" },
]
"#;
        let profile = ProfileLoader::from_toml_str(text, "ignored").unwrap();
        assert_eq!(profile.name, "ideal_2per");
        assert_eq!(profile.bundles, vec!["analytic-bulk-forcing"]);
        assert_eq!(profile.explicitly_sets("GLS_MIXING"), Some(true));
        assert_eq!(profile.explicitly_sets("LMD_MIXING"), Some(false));
        assert_eq!(profile.explicitly_sets("BULK_FLUXES"), Some(false));
        assert_eq!(profile.explicitly_sets("CANUTO_A"), Some(true));
    }

    #[test]
    fn yaml_profile_takes_fallback_name() {
        let yaml = r#"
description: LiveOcean
disabled_bundles: [fennel-diagnostics]
flags:
  - BIO_FENNEL
  - "!RIVER_DON"
"#;
        let profile = ProfileLoader::from_yaml_str(yaml, "liveocean").unwrap();
        assert_eq!(profile.name, "liveocean");
        assert_eq!(profile.disabled_bundles, vec!["fennel-diagnostics"]);
        assert_eq!(profile.explicitly_sets("RIVER_DON"), Some(false));
    }

    #[test]
    fn unset_value_is_rejected() {
        let text = r#"flags = [{ flag = "A", value = "unset" }]"#;
        assert!(matches!(
            ProfileLoader::from_toml_str(text, "p"),
            Err(CascadeError::Parse { .. })
        ));
    }

    #[test]
    fn invalid_short_name_is_rejected() {
        let text = r#"flags = ["!9LIVES"]"#;
        assert!(matches!(
            ProfileLoader::from_toml_str(text, "p"),
            Err(CascadeError::InvalidFlagName { .. })
        ));
    }

    #[test]
    fn locate_and_load_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.yaml"), "flags: [A]\n").unwrap();
        std::fs::write(dir.path().join("a.toml"), "flags = [\"!A\"]\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        assert_eq!(
            ProfileLoader::locate(dir.path(), "b"),
            Some(dir.path().join("b.yaml"))
        );
        assert_eq!(ProfileLoader::locate(dir.path(), "c"), None);

        let profiles = ProfileLoader::load_dir(dir.path()).unwrap();
        let names: Vec<&str> = profiles.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn load_dir_reports_failures_instead_of_skipping() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ProfileLoader::load_dir(&dir.path().join("missing")),
            Err(CascadeError::Io { .. })
        ));

        std::fs::write(dir.path().join("good.toml"), "flags = [\"A\"]\n").unwrap();
        std::fs::write(dir.path().join("broken.toml"), "flags = [\n").unwrap();
        assert!(matches!(
            ProfileLoader::load_dir(dir.path()),
            Err(CascadeError::Parse { .. })
        ));
    }
}
