//! The expedition runner: one invocation of `virtualship run`.
//!
//! ```text
//! load expedition → verify instruments config → load checkpoint
//!   → verify checkpoint → verify schedule ──late──→ PAUSED
//!   → simulate timeline ──late──→ PAUSED
//!   → problems ──unabsorbed delay──→ PAUSED
//!   → measurements → cost → report → COMPLETE
//! ```
//!
//! PAUSED and COMPLETE are both successful outcomes. A paused run leaves a
//! checkpoint (and possibly a delay obligation) for the next invocation to
//! check the edited schedule against.

use std::fmt;
use std::path::{Path, PathBuf};

use jiff::SignedDuration;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::checkpoint::{Checkpoint, CheckpointError};
use crate::fetch::{self, BATHYMETRY_FILE, BathymetryGrid, FetchError};
use crate::measure::{self, MeasureError, MeasurementSimulator};
use crate::model::Expedition;
use crate::problems::{
    self, ProbLevel, ProblemRecord, ProblemSimulator, Registry, Selection, SelectionError,
};
use crate::storage::{EXPEDITION_FILE, Storage, StorageError};
use crate::timeline::{self, Timeline, TimelineError};
use crate::verify::{
    EnvironmentCheck, InstrumentsConfigError, ScheduleError, verify_instruments_config,
    verify_schedule,
};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub prob_level: ProbLevel,
    /// Seed for problem selection. Drawn at random when absent.
    pub seed: Option<u64>,
    /// Directory holding pre-downloaded data, used instead of `data/`.
    pub from_data: Option<PathBuf>,
}

/// Why a run stopped early.
#[derive(Debug, Clone, PartialEq)]
pub enum PauseCause {
    /// The schedule cannot make this waypoint on time. 1-based.
    LateArrival { waypoint_number: usize },
    Problem {
        name: &'static str,
        delay_hours: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed {
        duration: SignedDuration,
        cost_usd: u64,
        results_dir: PathBuf,
    },
    Paused {
        failed_waypoint_i: Option<usize>,
        cause: PauseCause,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    InstrumentsConfig(#[from] InstrumentsConfigError),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Measure(#[from] MeasureError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A failure no user edit can fix.
    #[error("internal error: {0}")]
    Internal(String),
}

// ── Narrative ──

const BANNER: &str = "\n\
╔═════════════════════════════════════════════════╗\n\
║          VIRTUALSHIP EXPEDITION STATUS          ║\n\
╚═════════════════════════════════════════════════╝";

const PROBLEM_AVOIDED: &str = "Phew! You had enough contingency time scheduled to avoid delays \
                               from this problem. The expedition can carry on.";

fn problem_alert(waypoint_i: Option<usize>, first: bool) -> String {
    match (waypoint_i, first) {
        (None, true) => "Hang on! There could be a pre-departure problem in-port...".to_string(),
        (None, false) => "Oh no, another pre-departure problem has occurred...!".to_string(),
        (Some(i), true) => format!("Oh no, a problem has occurred at waypoint {}...!", i + 1),
        (Some(i), false) => format!(
            "Another problem has occurred during the expedition... at waypoint {}!",
            i + 1
        ),
    }
}

fn resume_instructions(checkpoint_path: &Path) -> String {
    format!(
        "Please update your schedule (in {EXPEDITION_FILE}) and continue the expedition by \
         executing the `virtualship run` command again.\n\
         Checkpoint has been saved to {}.",
        checkpoint_path.display()
    )
}

// ── Runner ──

pub struct Runner<'a> {
    storage: &'a Storage,
    registry: &'a Registry,
    simulator: &'a dyn MeasurementSimulator,
    environment: Option<&'a dyn EnvironmentCheck>,
}

impl<'a> Runner<'a> {
    pub fn new(
        storage: &'a Storage,
        registry: &'a Registry,
        simulator: &'a dyn MeasurementSimulator,
    ) -> Self {
        Self {
            storage,
            registry,
            simulator,
            environment: None,
        }
    }

    /// Uses `environment` for the land check instead of bathymetry on disk.
    #[cfg(test)]
    pub fn with_environment(mut self, environment: &'a dyn EnvironmentCheck) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn run(&self, options: &RunOptions) -> Result<RunOutcome, RunError> {
        println!("{BANNER}");

        let mut expedition = self.storage.load_expedition()?;
        for kind in verify_instruments_config(&mut expedition)? {
            println!("{kind} configuration provided but not in schedule, ignoring it.");
        }

        let checkpoint = self
            .storage
            .load_checkpoint()?
            .unwrap_or_else(Checkpoint::empty);
        checkpoint.verify(&expedition.schedule, &self.storage.problems_dir())?;

        println!("\n---- WAYPOINT VERIFICATION ----");
        println!("\nVerifying route... ");
        let grid = self.bathymetry(&expedition, options)?;
        let environment: Option<&dyn EnvironmentCheck> = match (self.environment, &grid) {
            (Some(environment), _) => Some(environment),
            (None, Some(grid)) => Some(grid),
            (None, None) => None,
        };
        match verify_schedule(
            &expedition.schedule,
            expedition.ship_config.ship_speed_knots,
            environment,
            options.from_data.is_none(),
        ) {
            Ok(()) => println!("... All good to go!"),
            Err(e @ ScheduleError::ArrivesTooLate { waypoint_number, .. }) => {
                return self.pause_late(&expedition, waypoint_number - 1, &e);
            }
            Err(e) => return Err(e.into()),
        }

        let timeline = match timeline::simulate(&expedition) {
            Ok(timeline) => timeline,
            Err(e @ TimelineError::LateArrival {
                failed_waypoint_i, ..
            }) => return self.pause_late(&expedition, failed_waypoint_i, &e),
            Err(e) => {
                return Err(RunError::Internal(format!(
                    "simulating a verified schedule failed: {e}"
                )));
            }
        };

        let selection = if options.prob_level == ProbLevel::Off {
            None
        } else {
            let selection =
                self.selection(&expedition, options, checkpoint.failed_waypoint_i)?;
            if let Some(paused) = self.execute_problems(&expedition, &timeline, &selection)? {
                return Ok(paused);
            }
            Some(selection)
        };

        self.complete(&expedition, &timeline, selection.as_ref())
    }

    /// Bathymetry for the land check: `--from-data` first, then a previous
    /// download for the schedule's region. When neither is present the
    /// requests for the external fetcher are written to `data/`.
    fn bathymetry(
        &self,
        expedition: &Expedition,
        options: &RunOptions,
    ) -> Result<Option<BathymetryGrid>, RunError> {
        let grid = load_bathymetry(self.storage, expedition, options.from_data.as_deref())?;
        if grid.is_some() || options.from_data.is_some() {
            return Ok(grid);
        }
        if let Some(region) = &expedition.schedule.space_time_region {
            let path = fetch::write_requests(
                &self.storage.data_dir(),
                region,
                expedition.instruments(),
            )?;
            println!("No downloaded data for this region; requests written to {}", path.display());
        }
        Ok(None)
    }

    fn pause_late(
        &self,
        expedition: &Expedition,
        failed_waypoint_i: usize,
        reason: &dyn fmt::Display,
    ) -> Result<RunOutcome, RunError> {
        println!("\n{reason}");
        let checkpoint = Checkpoint {
            past_schedule: expedition.schedule.clone(),
            failed_waypoint_i: Some(failed_waypoint_i),
        };
        self.storage.pause(&checkpoint, None)?;
        println!("{}", resume_instructions(&self.storage.checkpoint_path()));
        Ok(RunOutcome::Paused {
            failed_waypoint_i: Some(failed_waypoint_i),
            cause: PauseCause::LateArrival {
                waypoint_number: failed_waypoint_i + 1,
            },
        })
    }

    // ── Problems ──

    /// The cached selection for this route, or a fresh one. A fresh draw on
    /// a resumed expedition only strikes from `failed_waypoint_i` on.
    fn selection(
        &self,
        expedition: &Expedition,
        options: &RunOptions,
        failed_waypoint_i: Option<usize>,
    ) -> Result<Selection, RunError> {
        let cache = self
            .storage
            .selection_cache_path(&problems::expedition_hash(expedition));
        if cache.is_file() {
            log::debug!("reusing problem selection {}", cache.display());
            return Ok(problems::load_selected_problems(self.registry, &cache)?);
        }

        let seed = options.seed.unwrap_or_else(rand::random);
        log::info!("problem selection seed: {seed}");
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let selection = ProblemSimulator::new(expedition, self.registry)
            .with_encountered(self.encountered()?)
            .select_problems(&expedition.instruments(), options.prob_level, &mut rng)
            .unwrap_or_default()
            .ahead_of(failed_waypoint_i);
        if !selection.is_empty() {
            problems::cache_selected_problems(&selection, &cache)?;
        }
        Ok(selection)
    }

    /// Names of problems met in earlier runs, from their obligation records.
    fn encountered(&self) -> Result<Vec<String>, RunError> {
        Ok(self
            .storage
            .problem_records()?
            .iter()
            .filter_map(|record| self.registry.by_message(&record.message))
            .map(|problem| problem.name.to_string())
            .collect())
    }

    /// Plays the selection in order. Returns the pause outcome if a problem
    /// is not absorbed by the schedule.
    fn execute_problems(
        &self,
        expedition: &Expedition,
        timeline: &Timeline,
        selection: &Selection,
    ) -> Result<Option<RunOutcome>, RunError> {
        let expedition_hash = problems::expedition_hash(expedition);
        let simulator = ProblemSimulator::new(expedition, self.registry);
        let (mut first_pre_departure, mut first_underway) = (true, true);

        for selected in selection.in_execution_order() {
            let problem = selected.problem;
            let hash = problems::problem_hash(&expedition_hash, &problem, selected.waypoint_i);
            if self
                .storage
                .load_problem_record(&hash)?
                .is_some_and(|record| record.resolved)
            {
                log::debug!("{} already resolved", problem.name);
                continue;
            }

            let first = if selected.waypoint_i.is_none() {
                std::mem::replace(&mut first_pre_departure, false)
            } else {
                std::mem::replace(&mut first_underway, false)
            };
            println!("\n{}\n", problem_alert(selected.waypoint_i, first));
            println!("{}", problem.message);
            println!("\nAssessing impact on expedition schedule...");

            if simulator.has_contingency(&problem, selected.waypoint_i) {
                log::info!("{} absorbed by contingency", problem.name);
                println!("\n{PROBLEM_AVOIDED}");
                continue;
            }
            println!(
                "\nNot enough contingency time scheduled to avoid delay of {} hours.",
                problem.delay_hours()
            );

            let failed_waypoint_i = selected.waypoint_i.map(|i| i + 1);
            let checkpoint =
                Checkpoint::paused(&expedition.schedule, failed_waypoint_i, &timeline.arrivals);
            let record = ProblemRecord::new(&problem, hash, selected.waypoint_i);
            self.storage.pause(&checkpoint, Some(&record))?;

            if failed_waypoint_i.is_none() {
                println!(
                    "\nThis problem will cause a delay of {} hours to the expedition schedule.",
                    problem.delay_hours()
                );
            }
            println!("\nSIMULATION PAUSED");
            println!("{}", resume_instructions(&self.storage.checkpoint_path()));
            return Ok(Some(RunOutcome::Paused {
                failed_waypoint_i,
                cause: PauseCause::Problem {
                    name: problem.name,
                    delay_hours: problem.delay_hours(),
                },
            }));
        }
        Ok(None)
    }

    // ── Completion ──

    fn complete(
        &self,
        expedition: &Expedition,
        timeline: &Timeline,
        selection: Option<&Selection>,
    ) -> Result<RunOutcome, RunError> {
        println!("\n--- MEASUREMENT SIMULATIONS ---");
        let results_dir = self.storage.reset_results_dir()?;
        for kind in expedition.instruments() {
            let deployments = timeline.deployments_of(kind);
            let path = self.simulator.simulate(
                kind,
                &deployments,
                &expedition.instruments_config,
                &results_dir,
            )?;
            log::debug!("{kind}: {} deployments -> {}", deployments.len(), path.display());
        }

        let duration = timeline.duration();
        let cost_usd = measure::expedition_cost(duration, &timeline.deployments);
        self.storage.write_cost(cost_usd)?;

        if let Some(selection) = selection {
            problems::post_expedition_report(selection, &self.storage.report_path())?;
        }
        self.storage.clear_checkpoint()?;

        Ok(RunOutcome::Completed {
            duration,
            cost_usd,
            results_dir,
        })
    }
}

/// Reads bathymetry from `from_data`, or from the download cached for the
/// schedule's region. `None` when there is none.
pub fn load_bathymetry(
    storage: &Storage,
    expedition: &Expedition,
    from_data: Option<&Path>,
) -> Result<Option<BathymetryGrid>, FetchError> {
    let dir = match (from_data, &expedition.schedule.space_time_region) {
        (Some(dir), _) => Some(dir.to_path_buf()),
        (None, Some(region)) => {
            fetch::existing_download(&storage.data_dir(), &fetch::region_hash(region))
        }
        (None, None) => None,
    };
    let Some(path) = dir.map(|d| d.join(BATHYMETRY_FILE)).filter(|p| p.is_file()) else {
        log::warn!("no bathymetry available, skipping land check");
        return Ok(None);
    };
    BathymetryGrid::load(&path).map(Some)
}
