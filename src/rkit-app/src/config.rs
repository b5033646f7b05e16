// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;

const CONFIG_FILE_NAME: &str = "rkit.toml";
const CONFIG_DIR_NAME: &str = "rkit";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    ReadError(PathBuf, String),

    #[error("Failed to parse config file {0}: {1}")]
    ParseError(PathBuf, String),

    #[error("Config file {0} has no [{1}] section")]
    MissingSection(PathBuf, String),
}

/// Default search paths for `rkit.toml`
/// (current directory → XDG config → /etc).
fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));
    }
    paths.push(PathBuf::from("/etc").join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));
    paths
}

/// Deserialize the `key` section of an already-read TOML document.
fn parse_section<T: DeserializeOwned>(
    path: &Path,
    content: &str,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    let mut table: toml::Table = toml::from_str(content)
        .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;

    let Some(section) = table.remove(key) else {
        return Ok(None);
    };

    // Serde defaults apply because the section is deserialized on its own.
    section
        .try_into::<T>()
        .map(Some)
        .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))
}

fn load_section_from_file<T: DeserializeOwned>(
    path: &Path,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e.to_string()))?;
    parse_section(path, &content, key)
}

/// A configuration struct stored as one section of `rkit.toml`.
pub trait ConfigFile: Sized + Default + DeserializeOwned {
    /// Section key (e.g. `"rkit-console"`).
    fn section_key() -> &'static str;

    /// Parse the section out of a TOML string.
    fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let origin = PathBuf::from("<string>");
        parse_section::<Self>(&origin, content, Self::section_key())?
            .ok_or_else(|| ConfigError::MissingSection(origin, Self::section_key().to_string()))
    }

    /// Load the section from a specific file path. The file must contain
    /// the `[<section_key>]` table.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        load_section_from_file::<Self>(path, Self::section_key())?.ok_or_else(|| {
            ConfigError::MissingSection(path.to_path_buf(), Self::section_key().to_string())
        })
    }

    /// Load the first default-path file that contains the section.
    ///
    /// Returns `(Default::default(), None)` when none does.
    fn load_from_default_paths() -> Result<(Self, Option<PathBuf>), ConfigError> {
        for path in config_search_paths() {
            if path.exists() {
                if let Some(cfg) = load_section_from_file::<Self>(&path, Self::section_key())? {
                    return Ok((cfg, Some(path)));
                }
            }
        }
        Ok((Self::default(), None))
    }

    /// Explicit path when given, default search otherwise.
    fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        match explicit {
            Some(path) => Ok((Self::load_from_file(path)?, Some(path.to_path_buf()))),
            None => Self::load_from_default_paths(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(default)]
    struct Sample {
        name: String,
        period_ms: u64,
    }

    impl ConfigFile for Sample {
        fn section_key() -> &'static str {
            "sample"
        }
    }

    #[test]
    fn test_section_defaults_apply() {
        let cfg = Sample::from_toml_str("[sample]\nname = \"console\"\n").unwrap();
        assert_eq!(
            cfg,
            Sample {
                name: "console".to_string(),
                period_ms: 0
            }
        );
    }

    #[test]
    fn test_missing_section_is_an_error() {
        let err = Sample::from_toml_str("[other]\nname = \"x\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingSection(_, key) if key == "sample"));
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let err = Sample::from_toml_str("[sample\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_, _)));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("rkit-config-{}.toml", std::process::id()));
        std::fs::write(&path, "[sample]\nname = \"rig\"\nperiod_ms = 5\n").unwrap();
        let (cfg, found) = Sample::load(Some(&path)).unwrap();
        assert_eq!(cfg.name, "rig");
        assert_eq!(cfg.period_ms, 5);
        assert_eq!(found.as_deref(), Some(path.as_path()));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_unreadable_file_is_read_error() {
        let path = PathBuf::from("/nonexistent/rkit/rkit.toml");
        assert!(matches!(
            Sample::load_from_file(&path),
            Err(ConfigError::ReadError(_, _))
        ));
    }
}
