//! Progress of a paused expedition and the rules for resuming it.
//!
//! A checkpoint stores the schedule as it was when the run paused and the
//! index of the first waypoint the ship did not reach. Resuming requires that
//! the past stays as it was and that every outstanding delay obligation in
//! `problems_encountered/` is absorbed by the edited schedule.

use std::path::{Path, PathBuf};
use std::{fmt, fs, io};

use jiff::SignedDuration;
use jiff::civil::DateTime;
use serde::{Deserialize, Serialize};

use crate::model::Schedule;
use crate::problems::ProblemRecord;
use crate::storage::{self, StorageError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub past_schedule: Schedule,

    /// First waypoint not reached. `None` when nothing has sailed yet or the
    /// run stopped before departure.
    #[serde(default)]
    pub failed_waypoint_i: Option<usize>,
}

/// Which waypoints an unresolved delay applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AffectedWaypoints {
    All,
    /// 1-based number of the first affected waypoint.
    From(usize),
}

impl fmt::Display for AffectedWaypoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all waypoints"),
            Self::From(n) => write!(f, "waypoints from {n} onwards"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error(
        "past waypoints in schedule have been changed! Restore past waypoints and only change \
         waypoints from number {} onwards",
        .failed_waypoint_i + 1
    )]
    PastWaypointsChanged { failed_waypoint_i: usize },

    #[error(
        "the problem encountered in the previous run has not been resolved in the schedule! \
         Please adjust the schedule to account for the delay. The problem was associated with \
         a delay duration of {delay_hours} hours affecting {affected}"
    )]
    ProblemUnresolved {
        delay_hours: f64,
        affected: AffectedWaypoints,
        record: PathBuf,
    },

    #[error("problem record {}: {source}", .path.display())]
    Record {
        path: PathBuf,
        #[source]
        source: StorageError,
    },
}

impl Checkpoint {
    /// The starting point of a first run.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A checkpoint for a run pausing before `failed_waypoint_i`.
    ///
    /// Untimed waypoints from `failed_waypoint_i` on take their simulated
    /// arrival, so a later delay can be measured against them.
    pub fn paused(
        schedule: &Schedule,
        failed_waypoint_i: Option<usize>,
        arrivals: &[DateTime],
    ) -> Self {
        let mut past_schedule = schedule.clone();
        let start = failed_waypoint_i.unwrap_or(0);
        for (wp, arrival) in past_schedule.waypoints.iter_mut().zip(arrivals).skip(start) {
            wp.time.get_or_insert(*arrival);
        }
        Self {
            past_schedule,
            failed_waypoint_i,
        }
    }

    /// Checks a resumed schedule against this checkpoint and resolves every
    /// delay obligation the schedule now absorbs.
    ///
    /// Obligations are scanned in file-name order; the first one still
    /// unresolved stops the scan.
    pub fn verify(&self, schedule: &Schedule, problems_dir: &Path) -> Result<(), CheckpointError> {
        if let Some(k) = self.failed_waypoint_i {
            let past = self.past_schedule.waypoints.get(..k);
            let new = schedule.waypoints.get(..k);
            let unchanged = match (past, new) {
                (Some(past), Some(new)) => past == new,
                (None, _) | (_, None) => false,
            };
            if !unchanged {
                return Err(CheckpointError::PastWaypointsChanged {
                    failed_waypoint_i: k,
                });
            }
        }

        for path in record_paths(problems_dir)? {
            let mut record: ProblemRecord =
                storage::read_json(&path).map_err(|source| CheckpointError::Record {
                    path: path.clone(),
                    source,
                })?;
            if record.resolved {
                continue;
            }

            if self.absorbs(schedule, record.delay()) {
                record.resolved = true;
                storage::write_json(&path, &record).map_err(|source| CheckpointError::Record {
                    path: path.clone(),
                    source,
                })?;
                log::info!("problem {} resolved by the schedule", path.display());
                continue;
            }

            return Err(CheckpointError::ProblemUnresolved {
                delay_hours: record.delay_duration_hours,
                affected: match self.failed_waypoint_i {
                    Some(k) => AffectedWaypoints::From(k + 1),
                    None => AffectedWaypoints::All,
                },
                record: path,
            });
        }

        Ok(())
    }

    /// Whether every affected waypoint of `schedule` is shifted by at least
    /// `delay` against the past schedule.
    ///
    /// The affected range runs from `failed_waypoint_i` (or the start) to the
    /// end of `schedule`. An untimed waypoint in range has no shift, and a
    /// range with nothing to compare absorbs nothing. Waypoints appended past
    /// the end of the past schedule have no baseline and are not compared.
    fn absorbs(&self, schedule: &Schedule, delay: SignedDuration) -> bool {
        let start = self.failed_waypoint_i.unwrap_or(0);
        let mut compared = 0;
        for (past, new) in self
            .past_schedule
            .waypoints
            .iter()
            .zip(&schedule.waypoints)
            .skip(start)
        {
            match (past.time, new.time) {
                (Some(before), Some(after)) if after.duration_since(before) >= delay => {
                    compared += 1;
                }
                _ => return false,
            }
        }
        compared > 0
    }
}

/// `problem_*.json` files in `dir`, sorted by name. A missing directory
/// holds no records.
fn record_paths(dir: &Path) -> Result<Vec<PathBuf>, CheckpointError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(CheckpointError::Record {
                path: dir.to_path_buf(),
                source: e.into(),
            });
        }
    };
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("problem_") && n.ends_with(".json"))
        })
        .collect();
    paths.sort();
    Ok(paths)
}
