use crate::app_dirs::AppDirs;
use crate::error::Result;
use crate::training::{load_list_file, AlgorithmId, TrainingList};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const DEFAULT_LIST: &str = "fundamentals";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub algorithm: AlgorithmId,
    pub algorithm_enabled: bool,
    pub active_list: String,
    /// Free-text or JSON list file; takes precedence over `active_list`
    pub custom_list: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            algorithm: AlgorithmId::default(),
            algorithm_enabled: true,
            active_list: DEFAULT_LIST.to_string(),
            custom_list: None,
        }
    }
}

impl Config {
    /// Resolve the list this config points at
    pub fn training_list(&self) -> Result<TrainingList> {
        match &self.custom_list {
            Some(path) => load_list_file(path),
            None => TrainingList::builtin(&self.active_list),
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "ignoring unreadable config");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            algorithm: AlgorithmId::SpacedRepetition,
            algorithm_enabled: false,
            active_list: "animals".into(),
            custom_list: Some(dir.path().join("mine.txt")),
        };
        store.save(&cfg).unwrap();
        assert_eq!(store.load(), cfg);
    }

    #[test]
    fn missing_or_corrupt_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        assert_eq!(store.load(), Config::default());

        fs::write(&path, b"{ not json").unwrap();
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{ "algorithm": "fresh-exploration" }"#).unwrap();
        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.algorithm, AlgorithmId::FreshExploration);
        assert!(cfg.algorithm_enabled);
        assert_eq!(cfg.active_list, DEFAULT_LIST);
    }

    #[test]
    fn custom_list_takes_precedence() {
        let dir = tempdir().unwrap();
        let list_path = dir.path().join("figures.txt");
        fs::write(&list_path, "pose\ngesture\n").unwrap();
        let cfg = Config {
            custom_list: Some(list_path),
            ..Config::default()
        };
        let list = cfg.training_list().unwrap();
        assert_eq!(list.id, "figures");
        assert_eq!(Config::default().training_list().unwrap().id, DEFAULT_LIST);
    }
}
