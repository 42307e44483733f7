//! Realistic setbacks: general and instrument problems injected into an
//! expedition, the obligations they leave behind, and the final report.

mod catalog;
mod record;
mod report;
mod select;

use sha2::{Digest, Sha256};

use crate::model::Expedition;

pub use catalog::{GENERAL_PROBLEMS, INSTRUMENT_PROBLEMS, Problem, ProblemKind, Registry};
pub use record::ProblemRecord;
pub use report::{post_expedition_report, render_report};
pub use select::{
    InvalidProbLevel, ProbLevel, ProblemSimulator, SelectedProblem, Selection, SelectionError,
    cache_selected_problems, load_selected_problems, problem_count,
};

/// Content hash of the route: waypoint locations and instruments, not times.
///
/// Shifting times to absorb a delay keeps the hash, and with it the cached
/// problem selection. Changing the route draws a new one.
pub fn expedition_hash(expedition: &Expedition) -> String {
    let mut hasher = Sha256::new();
    for wp in &expedition.schedule.waypoints {
        hasher.update(wp.location.latitude().to_le_bytes());
        hasher.update(wp.location.longitude().to_le_bytes());
        for kind in &wp.instrument {
            hasher.update(kind.as_str().as_bytes());
            hasher.update(b",");
        }
        hasher.update(b";");
    }
    hex::encode(hasher.finalize())
}

/// Identifies one problem striking one expedition at one waypoint.
pub fn problem_hash(expedition_hash: &str, problem: &Problem, waypoint_i: Option<usize>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(expedition_hash.as_bytes());
    hasher.update(b"/");
    hasher.update(problem.name.as_bytes());
    hasher.update(b"/");
    match waypoint_i {
        Some(i) => hasher.update(i.to_string().as_bytes()),
        None => hasher.update(b"pre-departure"),
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::SignedDuration;

    use crate::model::{EXAMPLE_EXPEDITION, InstrumentType};

    fn example() -> Expedition {
        serde_yaml::from_str(EXAMPLE_EXPEDITION).unwrap()
    }

    #[test]
    fn hash_ignores_times() {
        let e = example();
        let mut shifted = e.clone();
        for wp in &mut shifted.schedule.waypoints {
            wp.time = wp
                .time
                .map(|t| t.checked_add(SignedDuration::from_hours(5)).unwrap());
        }
        assert_eq!(expedition_hash(&e), expedition_hash(&shifted));
    }

    #[test]
    fn hash_follows_route_and_instruments() {
        let e = example();
        let mut moved = e.clone();
        moved.schedule.waypoints[1].instrument.push(InstrumentType::Xbt);
        assert_ne!(expedition_hash(&e), expedition_hash(&moved));
        assert_eq!(expedition_hash(&e).len(), 64);
    }

    #[test]
    fn problem_hash_distinguishes_waypoints() {
        let problem = &GENERAL_PROBLEMS[1];
        let a = problem_hash("abc", problem, Some(1));
        let b = problem_hash("abc", problem, Some(2));
        let c = problem_hash("abc", problem, None);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, problem_hash("abc", problem, Some(1)));
    }
}
