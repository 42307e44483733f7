//! Delay obligations left behind when a problem pauses the expedition.

use jiff::SignedDuration;
use serde::{Deserialize, Serialize};

use super::Problem;

/// One `problem_<hash>.json` file.
///
/// The next run must shift every affected waypoint by at least the delay
/// before the record is marked resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemRecord {
    #[serde(default)]
    pub problem_hash: String,
    #[serde(default)]
    pub message: String,
    pub delay_duration_hours: f64,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default)]
    pub problem_waypoint_i: Option<usize>,
}

impl ProblemRecord {
    /// A fresh, unresolved obligation for `problem`.
    pub fn new(problem: &Problem, problem_hash: String, waypoint_i: Option<usize>) -> Self {
        Self {
            problem_hash,
            message: problem.message.to_string(),
            delay_duration_hours: problem.delay_hours(),
            resolved: false,
            problem_waypoint_i: waypoint_i,
        }
    }

    /// The delay to absorb. Negative or NaN hours count as no delay.
    pub fn delay(&self) -> SignedDuration {
        let hours = self.delay_duration_hours.max(0.0);
        SignedDuration::try_from_secs_f64(hours * 3600.0).unwrap_or(SignedDuration::MAX)
    }
}
