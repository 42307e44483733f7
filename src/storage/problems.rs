//! Paths and records under `problems_encountered/`.

use std::path::PathBuf;

use crate::problems::ProblemRecord;

use super::{Result, Storage, read_json};

impl Storage {
    pub fn problem_record_path(&self, problem_hash: &str) -> PathBuf {
        self.problems_dir().join(format!("problem_{problem_hash}.json"))
    }

    pub fn selection_cache_path(&self, expedition_hash: &str) -> PathBuf {
        self.problems_dir()
            .join(format!("selected_problems_{expedition_hash}.json"))
    }

    pub fn report_path(&self) -> PathBuf {
        self.problems_dir().join("post_expedition_report.txt")
    }

    /// Loads the delay obligation for a problem, if one was ever written.
    pub fn load_problem_record(&self, problem_hash: &str) -> Result<Option<ProblemRecord>> {
        let path = self.problem_record_path(problem_hash);
        if !path.is_file() {
            return Ok(None);
        }
        read_json(&path).map(Some)
    }

    /// Every obligation written so far, in file-name order.
    pub fn problem_records(&self) -> Result<Vec<ProblemRecord>> {
        let dir = self.problems_dir();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_record = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("problem_") && n.ends_with(".json"));
            if is_record {
                paths.push(path);
            }
        }
        paths.sort();
        paths.iter().map(|p| read_json(p)).collect()
    }
}
