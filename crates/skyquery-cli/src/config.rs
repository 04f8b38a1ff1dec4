//! Runtime configuration.
//!
//! Environment variables:
//!   SKYQUERY_HOME          - base directory (default: `$HOME/ef_hackathon`)
//!   SKYQUERY_DATABASE_PATH - SQLite file (default: `{home}/satellite_data.db`)
//!   SKYQUERY_STORAGE_DIR   - request payload directory (default: `{home}/data_storage`)
//!   SKYQUERY_SEED_SAMPLES  - seed sample records into a fresh store (default: true)

use std::path::PathBuf;

use skyquery_core::defaults::{DATABASE_FILE_NAME, HOME_DIR_NAME, STORAGE_DIR_NAME};
use skyquery_core::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub home: PathBuf,
    pub database_path: PathBuf,
    pub storage_dir: PathBuf,
    pub seed_samples: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let home = match lookup("SKYQUERY_HOME") {
            Some(home) => PathBuf::from(home),
            None => lookup("HOME")
                .map(|h| PathBuf::from(h).join(HOME_DIR_NAME))
                .ok_or_else(|| Error::Config("neither SKYQUERY_HOME nor HOME is set".into()))?,
        };

        let database_path = lookup("SKYQUERY_DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join(DATABASE_FILE_NAME));
        let storage_dir = lookup("SKYQUERY_STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join(STORAGE_DIR_NAME));
        let seed_samples = match lookup("SKYQUERY_SEED_SAMPLES") {
            Some(v) => parse_flag("SKYQUERY_SEED_SAMPLES", &v)?,
            None => true,
        };

        Ok(Self {
            home,
            database_path,
            storage_dir,
            seed_samples,
        })
    }

    /// Apply command-line overrides.
    pub fn with_overrides(mut self, database: Option<PathBuf>, storage_dir: Option<PathBuf>) -> Self {
        if let Some(path) = database {
            self.database_path = path;
        }
        if let Some(dir) = storage_dir {
            self.storage_dir = dir;
        }
        self
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!("{name}: expected a boolean, got {other:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_derive_from_home() {
        let config = Config::from_lookup(lookup(&[("HOME", "/home/op")])).unwrap();
        assert_eq!(config.home, PathBuf::from("/home/op/ef_hackathon"));
        assert_eq!(
            config.database_path,
            PathBuf::from("/home/op/ef_hackathon/satellite_data.db")
        );
        assert_eq!(
            config.storage_dir,
            PathBuf::from("/home/op/ef_hackathon/data_storage")
        );
        assert!(config.seed_samples);
    }

    #[test]
    fn test_explicit_paths_win() {
        let config = Config::from_lookup(lookup(&[
            ("HOME", "/home/op"),
            ("SKYQUERY_HOME", "/srv/sky"),
            ("SKYQUERY_DATABASE_PATH", "/data/records.db"),
            ("SKYQUERY_SEED_SAMPLES", "false"),
        ]))
        .unwrap();
        assert_eq!(config.database_path, PathBuf::from("/data/records.db"));
        assert_eq!(config.storage_dir, PathBuf::from("/srv/sky/data_storage"));
        assert!(!config.seed_samples);
    }

    #[test]
    fn test_cli_overrides() {
        let config = Config::from_lookup(lookup(&[("SKYQUERY_HOME", "/srv/sky")]))
            .unwrap()
            .with_overrides(None, Some(PathBuf::from("/tmp/requests")));
        assert_eq!(config.database_path, PathBuf::from("/srv/sky/satellite_data.db"));
        assert_eq!(config.storage_dir, PathBuf::from("/tmp/requests"));
    }

    #[test]
    fn test_missing_home_is_a_config_error() {
        assert!(matches!(
            Config::from_lookup(lookup(&[])),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_bad_seed_flag_is_rejected() {
        let result = Config::from_lookup(lookup(&[
            ("SKYQUERY_HOME", "/srv/sky"),
            ("SKYQUERY_SEED_SAMPLES", "maybe"),
        ]));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
