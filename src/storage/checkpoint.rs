//! Checkpoint file and the pause transaction.

use crate::checkpoint::Checkpoint;
use crate::problems::ProblemRecord;

use super::{Result, Storage, read_yaml, remove_if_exists, write_json, write_yaml};

impl Storage {
    /// Loads `checkpoint.yaml`, or `None` if no run has paused yet.
    pub fn load_checkpoint(&self) -> Result<Option<Checkpoint>> {
        let path = self.checkpoint_path();
        if !path.is_file() {
            return Ok(None);
        }
        read_yaml(&path).map(Some)
    }

    pub fn save_checkpoint(&self, checkpoint: &Checkpoint) -> Result<()> {
        write_yaml(&self.checkpoint_path(), checkpoint)
    }

    /// Removes the checkpoint once the expedition completes.
    pub fn clear_checkpoint(&self) -> Result<()> {
        remove_if_exists(&self.checkpoint_path())
    }

    /// Persists a pause: the checkpoint, then the delay obligation if the
    /// pause was caused by a problem.
    ///
    /// An interruption between the two writes leaves a checkpoint with no
    /// obligation; the next run meets the same problem again and pauses
    /// again, so the pair never disagrees.
    pub fn pause(&self, checkpoint: &Checkpoint, obligation: Option<&ProblemRecord>) -> Result<()> {
        self.save_checkpoint(checkpoint)?;
        if let Some(record) = obligation {
            write_json(&self.problem_record_path(&record.problem_hash), record)?;
        }
        Ok(())
    }
}
