use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// File name used when no explicit store path is configured.
pub const DEFAULT_FILE_NAME: &str = "store.json";

/// Where a [`Store`](crate::Store) keeps its persisted record.
///
/// Resolution order:
/// 1. `path`, if set, is used as-is.
/// 2. Otherwise `base_dir` joined with `file_name`.
/// 3. If `base_dir` is unset, the process working directory is used.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: Option<PathBuf>,
    pub base_dir: Option<PathBuf>,
    pub file_name: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            base_dir: None,
            file_name: DEFAULT_FILE_NAME.to_string(),
        }
    }
}

impl StoreConfig {
    /// Config pointing at an explicit file.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Config resolving `file_name` inside the given directory.
    pub fn in_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
            ..Self::default()
        }
    }

    pub fn from_toml_str(s: &str) -> StoreResult<Self> {
        toml::from_str(s).map_err(|e| StoreError::Config(e.to_string()))
    }

    pub fn from_toml_file(path: &Path) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Resolve the effective store file path.
    pub fn resolve_path(&self) -> StoreResult<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }
        if self.file_name.is_empty() {
            return Err(StoreError::Config("file_name must not be empty".into()));
        }
        let base = match &self.base_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().map_err(|e| {
                StoreError::Config(format!("cannot resolve working directory: {e}"))
            })?,
        };
        Ok(base.join(&self.file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = StoreConfig::default();
        assert!(c.path.is_none());
        assert!(c.base_dir.is_none());
        assert_eq!(c.file_name, "store.json");
    }

    #[test]
    fn explicit_path_wins() {
        let c = StoreConfig {
            path: Some("/data/custom.json".into()),
            base_dir: Some("/ignored".into()),
            file_name: "ignored.json".into(),
        };
        assert_eq!(c.resolve_path().unwrap(), PathBuf::from("/data/custom.json"));
    }

    #[test]
    fn base_dir_joins_file_name() {
        let c = StoreConfig::in_dir("/var/lib/app");
        assert_eq!(
            c.resolve_path().unwrap(),
            PathBuf::from("/var/lib/app/store.json")
        );
    }

    #[test]
    fn falls_back_to_working_directory() {
        let c = StoreConfig::default();
        let expected = std::env::current_dir().unwrap().join(DEFAULT_FILE_NAME);
        assert_eq!(c.resolve_path().unwrap(), expected);
    }

    #[test]
    fn empty_file_name_rejected() {
        let c = StoreConfig {
            file_name: String::new(),
            ..StoreConfig::default()
        };
        assert!(matches!(c.resolve_path(), Err(StoreError::Config(_))));
    }

    #[test]
    fn parses_partial_toml() {
        let c = StoreConfig::from_toml_str("base_dir = \"/srv/state\"\n").unwrap();
        assert_eq!(c.base_dir, Some(PathBuf::from("/srv/state")));
        assert_eq!(c.file_name, DEFAULT_FILE_NAME);
    }

    #[test]
    fn rejects_bad_toml() {
        assert!(matches!(
            StoreConfig::from_toml_str("file_name = ["),
            Err(StoreError::Config(_))
        ));
    }

    #[test]
    fn reads_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = dir.path().join("stash.toml");
        std::fs::write(&cfg, "path = \"/tmp/explicit.json\"\n").unwrap();
        let c = StoreConfig::from_toml_file(&cfg).unwrap();
        assert_eq!(c.path, Some(PathBuf::from("/tmp/explicit.json")));
    }
}
