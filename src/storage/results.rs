//! The results directory of a completed run.

use std::{fs, io, path::PathBuf};

use super::{Result, Storage, write_atomic};

impl Storage {
    /// Empties `results/`, creating it if needed.
    pub fn reset_results_dir(&self) -> Result<PathBuf> {
        let dir = self.results_dir();
        match fs::remove_dir_all(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Writes `results/cost.txt`.
    pub fn write_cost(&self, cost_usd: u64) -> Result<PathBuf> {
        let path = self.results_dir().join("cost.txt");
        write_atomic(&path, format!("cost: {cost_usd} US$\n").as_bytes())?;
        Ok(path)
    }
}
