//! Application configuration management.
//!
//! Configuration lives at `~/.config/wwes/config.json` and names the API
//! host, where key pairs come from, and where snapshots and caches go.
//! A key pair in `WWES_KEY_ID`/`WWES_VCODE` (or a `.env` file) is tried
//! before any configured one.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::DEFAULT_API_HOST;
use crate::auth::{parse_key_file, KeyPair};
use crate::cache::ResponseCache;
use crate::snapshot::SnapshotStore;

/// Application name used for config/log directory paths
const APP_NAME: &str = "wwes";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const ENV_KEY_ID: &str = "WWES_KEY_ID";
const ENV_V_CODE: &str = "WWES_VCODE";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api_host: Option<String>,
    /// Files listing `keyID:vCode` pairs, tried in order.
    #[serde(default)]
    pub key_files: Vec<PathBuf>,
    #[serde(default)]
    pub keys: Vec<KeyPair>,
    #[serde(default)]
    pub snapshot_dir: Option<PathBuf>,
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn api_host(&self) -> &str {
        self.api_host.as_deref().unwrap_or(DEFAULT_API_HOST)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(ResponseCache::default_dir)
    }

    pub fn snapshot_dir(&self) -> Result<PathBuf> {
        match &self.snapshot_dir {
            Some(dir) => Ok(dir.clone()),
            None => SnapshotStore::default_root(),
        }
    }

    pub fn log_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME).join("logs"))
    }

    /// Every key pair to try, in order: environment, inline, key files.
    pub fn key_pairs(&self) -> Result<Vec<KeyPair>> {
        let mut pairs: Vec<KeyPair> = env_key_pair().into_iter().collect();
        pairs.extend(self.keys.iter().cloned());
        pairs.extend(self.file_key_pairs()?);
        Ok(pairs)
    }

    /// Key pairs from the configured key files. A key whose code cannot
    /// be found in the keychain is skipped.
    pub fn file_key_pairs(&self) -> Result<Vec<KeyPair>> {
        let mut pairs = Vec::new();
        for file in &self.key_files {
            let contents = std::fs::read_to_string(file)
                .with_context(|| format!("Failed to read key file {}", file.display()))?;
            for line in parse_key_file(&contents)
                .with_context(|| format!("Invalid key file {}", file.display()))?
            {
                match line.into_pair() {
                    Ok(pair) => pairs.push(pair),
                    Err(e) => warn!(file = %file.display(), error = %e, "Skipping key"),
                }
            }
        }
        Ok(pairs)
    }
}

fn env_key_pair() -> Option<KeyPair> {
    let key_id = std::env::var(ENV_KEY_ID).ok()?;
    let v_code = std::env::var(ENV_V_CODE).ok()?;
    match key_id.trim().parse() {
        Ok(key_id) => Some(KeyPair::new(key_id, v_code.trim())),
        Err(_) => {
            warn!(value = %key_id, "Ignoring invalid {}", ENV_KEY_ID);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert!(config.keys.is_empty());
        assert_eq!(config.api_host(), DEFAULT_API_HOST);
        assert_eq!(config.cache_dir(), ResponseCache::default_dir());
    }

    #[test]
    fn test_load_with_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"api_host":"https://api.test","keys":[{"key_id":5,"v_code":"five"}],"cache_dir":"/tmp/x"}"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api_host(), "https://api.test");
        assert_eq!(config.keys, vec![KeyPair::new(5, "five")]);
        assert_eq!(config.cache_dir(), PathBuf::from("/tmp/x"));
    }

    #[test]
    fn test_key_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.keys");
        let second = dir.path().join("second.keys");
        std::fs::write(&first, "1:one\n# skipped\n2:two\n").unwrap();
        std::fs::write(&second, "3:three\n").unwrap();

        let config = Config {
            key_files: vec![first, second],
            ..Config::default()
        };
        let ids: Vec<i64> = config
            .file_key_pairs()
            .unwrap()
            .iter()
            .map(|k| k.key_id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_missing_key_file_is_an_error() {
        let config = Config {
            key_files: vec![PathBuf::from("/nonexistent/wwes.keys")],
            ..Config::default()
        };
        assert!(config.file_key_pairs().is_err());
    }
}
