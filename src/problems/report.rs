//! The plain-text account of everything that went wrong.

use std::fmt::Write as _;
use std::path::Path;

use crate::storage;

use super::Selection;

/// Renders the report: one `Problem:` and one `Delay caused:` line per
/// selected problem, in the order they struck.
pub fn render_report(selection: &Selection) -> String {
    let mut out = String::from("Post-expedition report\n======================\n");
    if selection.is_empty() {
        out.push_str("\nThe expedition ran without incident.\n");
        return out;
    }
    for (n, selected) in selection.in_execution_order().iter().enumerate() {
        let place = match selected.waypoint_i {
            None => "in port, before departure".to_string(),
            Some(i) => format!("after waypoint {}", i + 1),
        };
        let _ = write!(
            out,
            "\n{}. {} ({place})\nProblem: {}\nDelay caused: {} hours\n",
            n + 1,
            selected.problem.name,
            selected.problem.message,
            selected.problem.delay_hours(),
        );
    }
    out
}

/// Writes the report to `path`.
pub fn post_expedition_report(selection: &Selection, path: &Path) -> storage::Result<()> {
    storage::write_atomic(path, render_report(selection).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    use crate::problems::{Registry, SelectedProblem};

    fn selection() -> Selection {
        let registry = Registry::builtin();
        Selection {
            problems: vec![
                SelectedProblem {
                    problem: registry.instrument[0],
                    waypoint_i: Some(2),
                },
                SelectedProblem {
                    problem: registry.general[0],
                    waypoint_i: None,
                },
                SelectedProblem {
                    problem: registry.general[4],
                    waypoint_i: Some(0),
                },
            ],
        }
    }

    #[test]
    fn one_pair_per_problem() {
        let report = render_report(&selection());
        let problems = report.lines().filter(|l| l.starts_with("Problem:")).count();
        let delays = report.lines().filter(|l| l.starts_with("Delay caused:")).count();
        assert_eq!(problems, 3);
        assert_eq!(delays, 3);
    }

    #[test]
    fn pre_departure_listed_first() {
        let report = render_report(&selection());
        let first = report.find("scheduled_food_delivery_delayed").unwrap();
        let last = report.find("ctd_cable_jammed").unwrap();
        assert!(first < last);
        assert!(report.contains("Delay caused: 5 hours"));
    }

    #[test]
    fn writes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.txt");
        post_expedition_report(&selection(), &path).unwrap();
        let written = std::fs::read_to_string(path).unwrap();
        assert_eq!(written, render_report(&selection()));
    }

    #[test]
    fn empty_selection() {
        let report = render_report(&Selection::default());
        assert!(!report.contains("Problem:"));
    }
}
