//! CLI interface for VirtualShip.
//!
//! Each subcommand takes an expedition directory. `init` scaffolds one,
//! `verify` checks the plan without side effects, and `run` sails it,
//! pausing whenever the schedule needs another edit.

mod format;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::measure::DeploymentManifest;
use crate::problems::{ProbLevel, Registry};
use crate::run::{self, PauseCause, RunError, RunOptions, RunOutcome, Runner};
use crate::storage::Storage;
use crate::verify::{EnvironmentCheck, verify_instruments_config, verify_schedule};

use format::{format_cost, format_duration};

/// VirtualShip: plan and sail a virtual research expedition.
#[derive(Debug, Parser)]
#[command(name = "virtualship", version, after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    /// Show debug logging on stderr.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r"Workflow:
  1. virtualship init my_expedition
  2. edit my_expedition/expedition.yaml
  3. virtualship verify my_expedition
  4. virtualship run my_expedition
     → if the run pauses, adjust the schedule as instructed and run again";

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an expedition directory with an example `expedition.yaml`.
    Init {
        /// Expedition directory (created if missing).
        path: PathBuf,
    },

    /// Check the instruments configuration and the route without running.
    Verify {
        /// Expedition directory.
        path: PathBuf,

        /// Directory with pre-downloaded data (bathymetry for the land check).
        #[arg(long)]
        from_data: Option<PathBuf>,
    },

    /// Run the expedition, resuming from a checkpoint if one exists.
    Run {
        /// Expedition directory.
        path: PathBuf,

        /// How many problems strike: 0 none, 1 some, 2 many.
        /// Defaults to `default-prob-level` in the config.
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=2))]
        prob_level: Option<u8>,

        /// Seed for problem selection, for reproducible runs.
        #[arg(long)]
        seed: Option<u64>,

        /// Directory with pre-downloaded data, used instead of `data/`.
        #[arg(long)]
        from_data: Option<PathBuf>,
    },
}

/// Run the CLI, returning an error message on failure.
pub fn run(cli: Cli, config: &Config) -> Result<(), String> {
    match cli.command {
        Command::Init { path } => cmd_init(&path),
        Command::Verify { path, from_data } => cmd_verify(&path, from_data.as_deref()),
        Command::Run {
            path,
            prob_level,
            seed,
            from_data,
        } => {
            let level = prob_level.unwrap_or(config.default_prob_level);
            let options = RunOptions {
                prob_level: ProbLevel::try_from(level).map_err(|e| e.to_string())?,
                seed,
                from_data,
            };
            cmd_run(&path, &options)
        }
    }
}

fn cmd_init(path: &Path) -> Result<(), String> {
    let storage = Storage::new(path);
    storage
        .init()
        .map_err(|e| format!("failed to create expedition: {e}"))?;

    println!("Created {}", storage.expedition_path().display());
    Ok(())
}

fn cmd_verify(path: &Path, from_data: Option<&Path>) -> Result<(), String> {
    let storage = Storage::new(path);
    let mut expedition = storage
        .load_expedition()
        .map_err(|e| format!("failed to load expedition: {e}"))?;

    let pruned = verify_instruments_config(&mut expedition).map_err(|e| e.to_string())?;
    for kind in pruned {
        eprintln!("Note: {kind} configuration provided but not in schedule");
    }

    let grid = run::load_bathymetry(&storage, &expedition, from_data)
        .map_err(|e| format!("failed to load bathymetry: {e}"))?;
    if grid.is_none() {
        eprintln!("Note: no bathymetry available, land check skipped");
    }

    verify_schedule(
        &expedition.schedule,
        expedition.ship_config.ship_speed_knots,
        grid.as_ref().map(|g| g as &dyn EnvironmentCheck),
        from_data.is_none(),
    )
    .map_err(|e| e.to_string())?;

    println!(
        "Expedition is feasible: {} waypoints at {} knots",
        expedition.schedule.waypoints.len(),
        expedition.ship_config.ship_speed_knots
    );
    Ok(())
}

fn cmd_run(path: &Path, options: &RunOptions) -> Result<(), String> {
    let storage = Storage::new(path);
    let registry = Registry::builtin();
    let outcome = Runner::new(&storage, &registry, &DeploymentManifest)
        .run(options)
        .map_err(|e| {
            if let RunError::Internal(_) = e {
                log::error!("{e:?}");
            }
            e.to_string()
        })?;

    match outcome {
        RunOutcome::Completed {
            duration,
            cost_usd,
            results_dir,
        } => {
            println!("\n----- EXPEDITION RESULTS ------");
            println!("\nYour expedition has concluded successfully!");
            println!("Expedition duration: {}", format_duration(duration));
            println!("Expedition cost: {}", format_cost(cost_usd));
            println!("Results written to {}", results_dir.display());
        }
        RunOutcome::Paused {
            failed_waypoint_i,
            cause,
        } => match cause {
            PauseCause::LateArrival { waypoint_number } => {
                eprintln!("Paused: waypoint {waypoint_number} cannot be reached in time");
            }
            PauseCause::Problem { name, delay_hours } => {
                let at = failed_waypoint_i.map_or_else(
                    || "before departure".to_string(),
                    |i| format!("before waypoint {}", i + 1),
                );
                eprintln!("Paused {at}: {name} ({delay_hours} hours)");
            }
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_with_options() {
        let cli = Cli::try_parse_from([
            "virtualship",
            "run",
            "exp",
            "--prob-level",
            "2",
            "--seed",
            "9",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Command::Run {
                path,
                prob_level,
                seed,
                from_data,
            } => {
                assert_eq!(path, PathBuf::from("exp"));
                assert_eq!(prob_level, Some(2));
                assert_eq!(seed, Some(9));
                assert!(from_data.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn prob_level_is_range_checked() {
        assert!(Cli::try_parse_from(["virtualship", "run", "exp", "--prob-level", "3"]).is_err());
    }

    #[test]
    fn init_then_verify() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("exp");
        cmd_init(&path).unwrap();
        assert!(cmd_init(&path).is_err());
        cmd_verify(&path, None).unwrap();
        assert!(!path.join("checkpoint.yaml").exists());
    }
}
