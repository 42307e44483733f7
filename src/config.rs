//! User configuration.
//!
//! Loaded from `~/.virtualship/config.toml`. Every key is optional and a
//! missing file means defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Problem level used when `--prob-level` is not given.
pub const DEFAULT_PROB_LEVEL: u8 = 1;

/// VirtualShip configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Config {
    /// Problem level for `run`: 0 (none), 1 (some) or 2 (many).
    pub default_prob_level: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_prob_level: DEFAULT_PROB_LEVEL,
        }
    }
}

impl Config {
    /// Load config from `~/.virtualship/config.toml`, or defaults if there is
    /// none.
    pub fn load() -> Result<Self, String> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;

        let config: Self = toml::from_str(&contents)
            .map_err(|e| format!("invalid config at {}: {e}", path.display()))?;

        if config.default_prob_level > 2 {
            return Err(format!(
                "default-prob-level must be 0, 1 or 2 in {}",
                path.display()
            ));
        }

        Ok(config)
    }

    /// The config file path: `~/.virtualship/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".virtualship").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[test]
    fn missing_file_means_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.default_prob_level, 1);
    }

    #[test]
    fn reads_kebab_case_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "default-prob-level = 2\n").unwrap();
        assert_eq!(Config::load_from(&path).unwrap().default_prob_level, 2);
    }

    #[test]
    fn empty_file_means_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "").unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());
    }

    #[test]
    fn rejects_out_of_range_level() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "default-prob-level = 5\n").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.contains("default-prob-level"), "got: {err}");
    }

    #[test]
    fn rejects_unknown_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "default-identity = \"me\"\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
