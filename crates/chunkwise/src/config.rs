//! Optional TOML defaults for the command line.
//!
//! ```toml
//! chunk_size = "100M"
//! index_width = 5
//! output_dir = "output_chunks"
//! version = "0.28"
//! base_url = "https://my-bucket.s3.amazonaws.com/releases/0.28"
//! download_dir = "downloads"
//! connect_timeout_secs = 30
//! sync = true
//! ```
//!
//! Explicit flags always win over the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::size::parse_size;

/// Environment variable naming a config file when `--config` is not given.
pub const CONFIG_ENV: &str = "CHUNKWISE_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub chunk_size:           Option<String>,
    pub index_width:          Option<usize>,
    pub output_dir:           Option<PathBuf>,
    pub version:              Option<String>,
    pub base_url:             Option<String>,
    pub download_dir:         Option<PathBuf>,
    pub connect_timeout_secs: Option<u64>,
    pub sync:                 Option<bool>,
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self> { toml::from_str(text).context("invalid config") }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Load the file named by `--config`, else by `CHUNKWISE_CONFIG`, else
    /// fall back to built-in defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => match std::env::var_os(CONFIG_ENV) {
                Some(path) => Self::load(Path::new(&path)),
                None => Ok(Self::default()),
            },
        }
    }

    pub fn chunk_size(&self) -> Result<Option<u64>> {
        self.chunk_size.as_deref().map(parse_size).transpose()
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_toml(
            r#"
            chunk_size = "200M"
            index_width = 6
            output_dir = "out"
            version = "0.28"
            base_url = "https://b/dir"
            connect_timeout_secs = 5
            sync = false
            "#,
        )
        .unwrap();
        assert_eq!(config.chunk_size().unwrap(), Some(200 * 1024 * 1024));
        assert_eq!(config.index_width, Some(6));
        assert_eq!(config.output_dir.as_deref(), Some(Path::new("out")));
        assert_eq!(config.connect_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.sync, Some(false));
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = Config::from_toml("").unwrap();
        assert!(config.chunk_size().unwrap().is_none());
        assert!(config.base_url.is_none());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(Config::from_toml("chunk_sise = \"1M\"").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chunkwise.toml");
        std::fs::write(&path, "version = \"1.2\"\n").unwrap();
        let config = Config::resolve(Some(&path)).unwrap();
        assert_eq!(config.version.as_deref(), Some("1.2"));
        assert!(Config::resolve(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
