//! Local persistence for one expedition directory.
//!
//! Everything an expedition produces lives next to its plan:
//!
//! ```text
//! <expedition>/
//!   expedition.yaml                    # schedule, instruments_config, ship_config
//!   checkpoint.yaml                    # present while paused
//!   problems_encountered/
//!     selected_problems_<hash>.json    # cached problem selection
//!     problem_<hash>.json              # one delay obligation per problem
//!     post_expedition_report.txt
//!   results/
//!     <instrument>.json
//!     cost.txt
//!   data/<region-hash>/                # downloaded fields and bathymetry
//! ```
//!
//! Files are always written whole: serialized into a temporary file in the
//! target directory, then renamed over the destination.

mod checkpoint;
mod expedition;
mod problems;
mod results;

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use io::Write;

use serde::{Serialize, de::DeserializeOwned};
use tempfile::NamedTempFile;

use crate::model::ValidationError;

pub const EXPEDITION_FILE: &str = "expedition.yaml";
pub const CHECKPOINT_FILE: &str = "checkpoint.yaml";
pub const PROBLEMS_DIR: &str = "problems_encountered";
pub const RESULTS_DIR: &str = "results";
pub const DATA_DIR: &str = "data";

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("no {EXPEDITION_FILE} found in {0}")]
    MissingExpedition(PathBuf),

    #[error("{0} already exists")]
    AlreadyExists(PathBuf),

    #[error("invalid expedition: {0}")]
    Invalid(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to move file into place: {0}")]
    Persist(#[from] tempfile::PersistError),
}

pub type Result<T> = core::result::Result<T, StorageError>;

/// File-based storage rooted at an expedition directory.
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Opens the expedition directory at `root`. Nothing is created.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn expedition_path(&self) -> PathBuf {
        self.root.join(EXPEDITION_FILE)
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.root.join(CHECKPOINT_FILE)
    }

    pub fn problems_dir(&self) -> PathBuf {
        self.root.join(PROBLEMS_DIR)
    }

    pub fn results_dir(&self) -> PathBuf {
        self.root.join(RESULTS_DIR)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join(DATA_DIR)
    }
}

// ── Whole-file IO ──

/// Writes `contents` to `path` via a sibling temporary file and a rename, so
/// readers see either the old file or the new one.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;
    log::debug!("wrote {}", path.display());
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    write_atomic(path, json.as_bytes())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

pub fn write_yaml<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let yaml = serde_yaml::to_string(value)?;
    write_atomic(path, yaml.as_bytes())
}

pub fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let yaml = fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&yaml)?)
}

/// Removes a file, treating "already gone" as success.
fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[test]
    fn write_atomic_creates_parents_and_replaces() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("file.txt");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        let leftovers = fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn json_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("v.json");
        write_json(&path, &vec![1, 2, 3]).unwrap();
        let back: Vec<i32> = read_json(&path).unwrap();
        assert_eq!(back, vec![1, 2, 3]);
    }

    #[test]
    fn remove_missing_file_is_ok() {
        let dir = TempDir::new().unwrap();
        remove_if_exists(&dir.path().join("nope")).unwrap();
    }
}
