//! Choosing which problems strike, where, and whether the schedule already
//! absorbs them.

use std::collections::BTreeSet;
use std::path::Path;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::model::{Expedition, InstrumentType, InstrumentsConfig, Schedule};
use crate::navigation;
use crate::storage::{self, StorageError};
use crate::timeline;

use super::{Problem, ProblemKind, Registry};

/// How eventful an expedition should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProbLevel {
    /// No problems.
    Off,
    Low,
    High,
}

#[derive(Debug, thiserror::Error)]
#[error("problem level must be 0, 1 or 2, got {0}")]
pub struct InvalidProbLevel(pub u8);

impl TryFrom<u8> for ProbLevel {
    type Error = InvalidProbLevel;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            0 => Ok(Self::Off),
            1 => Ok(Self::Low),
            2 => Ok(Self::High),
            other => Err(InvalidProbLevel(other)),
        }
    }
}

/// How many problems to aim for. Non-decreasing in both arguments.
pub fn problem_count(level: ProbLevel, n_waypoints: usize) -> usize {
    match level {
        ProbLevel::Off => 0,
        ProbLevel::Low => 1 + n_waypoints / 10,
        ProbLevel::High => 2 + n_waypoints / 3,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectedProblem {
    pub problem: Problem,
    /// `None` for a pre-departure problem, else the waypoint at the start of
    /// the leg where it strikes.
    pub waypoint_i: Option<usize>,
}

/// The problems one expedition will meet, fixed for the life of its route.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub problems: Vec<SelectedProblem>,
}

impl Selection {
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    /// Drops problems the ship has already sailed past: pre-departure ones
    /// and those on legs before `failed_waypoint_i`.
    pub fn ahead_of(mut self, failed_waypoint_i: Option<usize>) -> Self {
        if let Some(k) = failed_waypoint_i {
            self.problems.retain(|p| p.waypoint_i.is_some_and(|i| i >= k));
        }
        self
    }

    /// Pre-departure problems first, then by waypoint.
    pub fn in_execution_order(&self) -> Vec<SelectedProblem> {
        let mut ordered = self.problems.clone();
        ordered.sort_by_key(|p| p.waypoint_i);
        ordered
    }
}

/// On-disk shape of the selection cache.
#[derive(Debug, Serialize, Deserialize)]
struct SelectionFile {
    problem_class: Vec<String>,
    waypoint_i: Vec<Option<usize>>,
}

#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    #[error("unknown problem '{0}' in selection cache")]
    UnknownProblem(String),

    #[error("selection cache lists {problems} problems but {waypoints} waypoints")]
    Mismatched { problems: usize, waypoints: usize },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub struct ProblemSimulator<'a> {
    schedule: &'a Schedule,
    instruments_config: &'a InstrumentsConfig,
    ship_speed_knots: f64,
    registry: &'a Registry,
    encountered: BTreeSet<String>,
}

impl<'a> ProblemSimulator<'a> {
    pub fn new(expedition: &'a Expedition, registry: &'a Registry) -> Self {
        Self {
            schedule: &expedition.schedule,
            instruments_config: &expedition.instruments_config,
            ship_speed_knots: expedition.ship_config.ship_speed_knots,
            registry,
            encountered: BTreeSet::new(),
        }
    }

    /// Names of problems already met in this expedition directory. Those that
    /// cannot reoccur are left out of new selections.
    pub fn with_encountered(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.encountered.extend(names);
        self
    }

    /// Draws the problems for this expedition, or `None` when problems are
    /// switched off.
    ///
    /// At most one pre-departure problem strikes. Every other problem gets
    /// its own waypoint: any leg start for ship-wide and underway problems,
    /// a leg start carrying the instrument for station instruments.
    /// Instrument problems only strike instruments in `instruments`.
    pub fn select_problems<R: Rng + ?Sized>(
        &self,
        instruments: &BTreeSet<InstrumentType>,
        level: ProbLevel,
        rng: &mut R,
    ) -> Option<Selection> {
        if level == ProbLevel::Off {
            return None;
        }
        let n = self.schedule.waypoints.len();
        let count = problem_count(level, n);

        let general = self
            .registry
            .general
            .iter()
            .filter(|p| p.is_pre_departure() || n >= 2);
        let instrument = self
            .registry
            .instrument
            .iter()
            .filter(|p| p.instrument().is_some_and(|k| instruments.contains(&k)));
        let mut candidates: Vec<Problem> = general
            .chain(instrument)
            .filter(|p| p.can_reoccur || !self.encountered.contains(p.name))
            .copied()
            .collect();
        candidates.shuffle(rng);

        let mut taken = BTreeSet::new();
        let mut pre_departure = false;
        let mut problems = Vec::new();
        for problem in candidates {
            if problems.len() == count {
                break;
            }
            if problem.is_pre_departure() {
                if !pre_departure {
                    pre_departure = true;
                    problems.push(SelectedProblem {
                        problem,
                        waypoint_i: None,
                    });
                }
                continue;
            }
            let free: Vec<usize> = self
                .hosts(&problem)
                .into_iter()
                .filter(|i| !taken.contains(i))
                .collect();
            let Some(&waypoint_i) = free.choose(rng) else {
                continue;
            };
            taken.insert(waypoint_i);
            problems.push(SelectedProblem {
                problem,
                waypoint_i: Some(waypoint_i),
            });
        }

        log::debug!("selected {} of {count} problems", problems.len());
        Some(Selection { problems })
    }

    /// Leg starts where `problem` can strike.
    fn hosts(&self, problem: &Problem) -> Vec<usize> {
        let legs = self.schedule.waypoints.len().saturating_sub(1);
        let waypoints = &self.schedule.waypoints[..legs];
        match problem.kind {
            ProblemKind::General { .. } => (0..legs).collect(),
            ProblemKind::Instrument(kind) if kind.is_underway() => (0..legs).collect(),
            ProblemKind::Instrument(kind) => waypoints
                .iter()
                .enumerate()
                .filter(|(_, wp)| wp.instrument.contains(&kind))
                .map(|(i, _)| i)
                .collect(),
        }
    }

    /// Whether the schedule already holds enough slack to absorb `problem`
    /// at `waypoint_i`.
    ///
    /// Slack is measured on the leg leaving the waypoint, or the leg
    /// arriving at it for the final waypoint: scheduled arrival minus the
    /// earliest possible arrival. Pre-departure problems and untimed legs
    /// never have contingency.
    pub fn has_contingency(&self, problem: &Problem, waypoint_i: Option<usize>) -> bool {
        let Some(i) = waypoint_i else { return false };
        if problem.is_pre_departure() {
            return false;
        }
        let waypoints = &self.schedule.waypoints;
        let (from, to) = if i + 1 < waypoints.len() {
            (i, i + 1)
        } else if i > 0 && i < waypoints.len() {
            (i - 1, i)
        } else {
            return false;
        };
        let (from, to) = (&waypoints[from], &waypoints[to]);
        let (Some(departure), Some(scheduled)) = (from.time, to.time) else {
            return false;
        };
        let Ok(travel) =
            navigation::travel_time_between(from.location, to.location, self.ship_speed_knots)
        else {
            return false;
        };
        let needed = timeline::stationkeeping_time(from, self.instruments_config) + travel;
        let slack = scheduled.duration_since(departure) - needed;
        slack >= problem.delay
    }
}

/// Writes the selection so the same narrative survives a pause.
pub fn cache_selected_problems(selection: &Selection, path: &Path) -> storage::Result<()> {
    let file = SelectionFile {
        problem_class: selection
            .problems
            .iter()
            .map(|p| p.problem.name.to_string())
            .collect(),
        waypoint_i: selection.problems.iter().map(|p| p.waypoint_i).collect(),
    };
    storage::write_json(path, &file)
}

/// Reads a cached selection back, resolving names against `registry`.
pub fn load_selected_problems(registry: &Registry, path: &Path) -> Result<Selection, SelectionError> {
    let file: SelectionFile = storage::read_json(path)?;
    if file.problem_class.len() != file.waypoint_i.len() {
        return Err(SelectionError::Mismatched {
            problems: file.problem_class.len(),
            waypoints: file.waypoint_i.len(),
        });
    }
    let problems = file
        .problem_class
        .iter()
        .zip(file.waypoint_i)
        .map(|(name, waypoint_i)| {
            registry
                .by_name(name)
                .map(|problem| SelectedProblem {
                    problem: *problem,
                    waypoint_i,
                })
                .ok_or_else(|| SelectionError::UnknownProblem(name.clone()))
        })
        .collect::<Result<_, _>>()?;
    Ok(Selection { problems })
}
