//! Route feasibility: ordering, land, and reachability at ship speed.

use std::fmt::Write as _;

use jiff::SignedDuration;
use jiff::civil::DateTime;

use crate::model::{InstrumentType, Location, Schedule};
use crate::navigation::{self, InvalidInputError};

/// Time held on station for a CTD cast while checking reachability.
pub const CTD_STATIONKEEPING_PAD: SignedDuration = SignedDuration::from_mins(20);

/// Answers whether a location is dry land, typically from bathymetry.
pub trait EnvironmentCheck {
    fn is_on_land(&self, location: Location) -> bool;
}

impl<F> EnvironmentCheck for F
where
    F: Fn(Location) -> bool,
{
    fn is_on_land(&self, location: Location) -> bool {
        self(location)
    }
}

/// A schedule the ship cannot sail. Waypoint numbers are 1-based.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("space_time_region not found in schedule, please define it to fetch the data")]
    MissingSpaceTimeRegion,

    #[error("at least one waypoint must be provided")]
    NoWaypoints,

    #[error("first waypoint must have a specified time")]
    FirstWaypointUntimed,

    #[error(
        "waypoint(s) {}: each waypoint should be timed after all previous waypoints",
        numbered(.waypoints)
    )]
    OutOfOrder { waypoints: Vec<usize> },

    #[error("the following waypoints are on land: {}", on_land(.waypoints))]
    OnLand { waypoints: Vec<(usize, Location)> },

    #[error(
        "waypoint planning is not valid: would arrive too late at waypoint number {waypoint_number} \
         (earliest arrival {arrival}, scheduled {scheduled})"
    )]
    ArrivesTooLate {
        waypoint_number: usize,
        arrival: DateTime,
        scheduled: DateTime,
    },

    #[error(transparent)]
    Navigation(#[from] InvalidInputError),
}

fn numbered(waypoints: &[usize]) -> String {
    waypoints
        .iter()
        .map(|n| format!("#{n}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn on_land(waypoints: &[(usize, Location)]) -> String {
    let mut out = String::new();
    for (n, location) in waypoints {
        let _ = write!(out, "\n  #{n} {location}");
    }
    out
}

/// Checks that a schedule can be sailed at `ship_speed_knots`.
///
/// Checks run in a fixed order and the first failure is returned. Land is
/// the exception within its own step: every waypoint on land is reported at
/// once. Untimed waypoints take the earliest possible arrival; an early ship
/// waits for the scheduled time.
pub fn verify_schedule(
    schedule: &Schedule,
    ship_speed_knots: f64,
    environment: Option<&dyn EnvironmentCheck>,
    require_space_time_region: bool,
) -> Result<(), ScheduleError> {
    if require_space_time_region && schedule.space_time_region.is_none() {
        return Err(ScheduleError::MissingSpaceTimeRegion);
    }

    let waypoints = &schedule.waypoints;
    let Some(first) = waypoints.first() else {
        return Err(ScheduleError::NoWaypoints);
    };
    let Some(start) = first.time else {
        return Err(ScheduleError::FirstWaypointUntimed);
    };

    // ── Ordering ──

    let mut out_of_order = Vec::new();
    let mut latest = start;
    for (i, wp) in waypoints.iter().enumerate().skip(1) {
        let Some(time) = wp.time else { continue };
        if time < latest {
            out_of_order.push(i + 1);
        } else {
            latest = time;
        }
    }
    if !out_of_order.is_empty() {
        return Err(ScheduleError::OutOfOrder {
            waypoints: out_of_order,
        });
    }

    // ── Land ──

    if let Some(env) = environment {
        let dry: Vec<_> = waypoints
            .iter()
            .enumerate()
            .filter(|(_, wp)| env.is_on_land(wp.location))
            .map(|(i, wp)| (i + 1, wp.location))
            .collect();
        if !dry.is_empty() {
            return Err(ScheduleError::OnLand { waypoints: dry });
        }
    } else {
        log::debug!("no environment data, skipping land check");
    }

    // ── Reachability ──

    let mut time = start;
    for (i, pair) in waypoints.windows(2).enumerate() {
        let (cur, next) = (&pair[0], &pair[1]);
        if cur.instrument.contains(&InstrumentType::Ctd) {
            time = add(time, CTD_STATIONKEEPING_PAD)?;
        }
        let travel = navigation::travel_time_between(cur.location, next.location, ship_speed_knots)?;
        let arrival = add(time, travel)?;
        time = match next.time {
            None => arrival,
            Some(scheduled) if arrival > scheduled => {
                return Err(ScheduleError::ArrivesTooLate {
                    waypoint_number: i + 2,
                    arrival,
                    scheduled,
                });
            }
            Some(scheduled) => scheduled,
        };
    }

    Ok(())
}

fn add(time: DateTime, duration: SignedDuration) -> Result<DateTime, InvalidInputError> {
    time.checked_add(duration)
        .map_err(|_| InvalidInputError::TravelTime(duration.as_secs_f64()))
}
