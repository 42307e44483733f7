//! Sails a verified schedule: resolves every arrival time and lists every
//! deployment and underway sample along the way.

use jiff::SignedDuration;
use jiff::civil::DateTime;
use serde::Serialize;

use crate::model::timefmt::datetime;
use crate::model::{Expedition, InstrumentType, InstrumentsConfig, Location, Waypoint};
use crate::navigation::{self, InvalidInputError};

/// One instrument measurement request: a cast, a release, or an underway
/// sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Deployment {
    pub instrument: InstrumentType,
    /// Station waypoint, or the start of the leg for underway samples.
    pub waypoint_i: usize,
    pub location: Location,
    #[serde(with = "datetime")]
    pub time: DateTime,
}

#[derive(Debug, Clone)]
pub struct Timeline {
    /// Resolved arrival time at each waypoint.
    pub arrivals: Vec<DateTime>,
    pub deployments: Vec<Deployment>,
    /// Departure from the final waypoint.
    pub end_time: DateTime,
}

impl Timeline {
    pub fn start_time(&self) -> Option<DateTime> {
        self.arrivals.first().copied()
    }

    pub fn duration(&self) -> SignedDuration {
        self.start_time()
            .map_or(SignedDuration::ZERO, |start| self.end_time.duration_since(start))
    }

    pub fn deployments_of(&self, kind: InstrumentType) -> Vec<Deployment> {
        self.deployments
            .iter()
            .filter(|d| d.instrument == kind)
            .cloned()
            .collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    /// The ship cannot make a scheduled time. Index is 0-based.
    #[error(
        "the ship would arrive too late at waypoint number {} (earliest arrival {arrival}, scheduled {scheduled})",
        .failed_waypoint_i + 1
    )]
    LateArrival {
        failed_waypoint_i: usize,
        arrival: DateTime,
        scheduled: DateTime,
    },

    #[error("schedule has no timed first waypoint")]
    Unanchored,

    #[error(transparent)]
    Navigation(#[from] InvalidInputError),

    #[error("time out of range: {0}")]
    Time(#[from] jiff::Error),
}

/// How long the ship holds position at `waypoint`: the longest cast among its
/// instruments.
pub fn stationkeeping_time(waypoint: &Waypoint, config: &InstrumentsConfig) -> SignedDuration {
    waypoint
        .instrument
        .iter()
        .map(|kind| config.stationkeeping_time(*kind))
        .max()
        .unwrap_or(SignedDuration::ZERO)
}

/// Walks the schedule at the configured ship speed.
///
/// Untimed waypoints adopt the earliest arrival and early arrivals wait for
/// the scheduled time. Station deployments happen on arrival; underway
/// samples are spread along each leg at their configured period.
pub fn simulate(expedition: &Expedition) -> Result<Timeline, TimelineError> {
    let waypoints = &expedition.schedule.waypoints;
    let config = &expedition.instruments_config;
    let speed = expedition.ship_config.ship_speed_knots;
    let underway: Vec<_> = config
        .enabled_underway()
        .into_iter()
        .filter_map(|kind| config.underway_period(kind).map(|p| (kind, p)))
        .collect();

    let mut arrival = waypoints
        .first()
        .and_then(|wp| wp.time)
        .ok_or(TimelineError::Unanchored)?;

    let mut arrivals = Vec::with_capacity(waypoints.len());
    let mut deployments = Vec::new();

    for (i, wp) in waypoints.iter().enumerate() {
        arrivals.push(arrival);
        for kind in wp.instrument.iter().filter(|k| !k.is_underway()) {
            deployments.push(Deployment {
                instrument: *kind,
                waypoint_i: i,
                location: wp.location,
                time: arrival,
            });
        }

        let departure = arrival.checked_add(stationkeeping_time(wp, config))?;
        let Some(next) = waypoints.get(i + 1) else {
            return Ok(Timeline {
                arrivals,
                deployments,
                end_time: departure,
            });
        };

        let distance = navigation::distance(wp.location, next.location);
        let travel = navigation::travel_time(distance, speed)?;
        for (kind, period) in &underway {
            sample_leg(
                &mut deployments,
                *kind,
                *period,
                (i, wp.location, next.location),
                departure,
                (distance, travel),
            )?;
        }

        let eta = departure.checked_add(travel)?;
        arrival = match next.time {
            None => eta,
            Some(scheduled) if eta > scheduled => {
                return Err(TimelineError::LateArrival {
                    failed_waypoint_i: i + 1,
                    arrival: eta,
                    scheduled,
                });
            }
            Some(scheduled) => scheduled,
        };
    }

    Err(TimelineError::Unanchored)
}

fn sample_leg(
    deployments: &mut Vec<Deployment>,
    kind: InstrumentType,
    period: SignedDuration,
    (waypoint_i, from, to): (usize, Location, Location),
    departure: DateTime,
    (distance, travel): (f64, SignedDuration),
) -> Result<(), TimelineError> {
    let travel_secs = travel.as_secs_f64();
    let period_secs = period.as_secs_f64();
    if period_secs <= 0.0 {
        return Ok(());
    }
    let mut offset = 0.0;
    while offset < travel_secs {
        let location = navigation::along(from, to, distance * offset / travel_secs)?;
        let time = departure.checked_add(SignedDuration::try_from_secs_f64(offset)?)?;
        deployments.push(Deployment {
            instrument: kind,
            waypoint_i,
            location,
            time,
        });
        offset += period_secs;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::civil::date;

    use crate::model::{
        CtdBgcConfig, CtdConfig, Schedule, ShipConfig, ShipUnderwaterStConfig,
    };

    fn loc(lat: f64, lon: f64) -> Location {
        Location::new(lat, lon).unwrap()
    }

    fn t0() -> DateTime {
        date(2023, 1, 1).at(0, 0, 0, 0)
    }

    fn expedition(waypoints: Vec<Waypoint>, config: InstrumentsConfig) -> Expedition {
        Expedition {
            schedule: Schedule {
                waypoints,
                space_time_region: None,
            },
            instruments_config: config,
            ship_config: ShipConfig {
                ship_speed_knots: 10.0,
            },
        }
    }

    fn casts() -> InstrumentsConfig {
        InstrumentsConfig {
            ctd_config: Some(CtdConfig {
                stationkeeping_time: SignedDuration::from_mins(20),
                min_depth_meter: -11.0,
                max_depth_meter: -2000.0,
            }),
            ctd_bgc_config: Some(CtdBgcConfig {
                stationkeeping_time: SignedDuration::from_mins(50),
                min_depth_meter: -11.0,
                max_depth_meter: -2000.0,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn single_waypoint_ends_after_station_keeping() {
        let e = expedition(
            vec![Waypoint::new(loc(0.0, 0.0), Some(t0())).with_instruments([InstrumentType::Ctd])],
            casts(),
        );
        let timeline = simulate(&e).unwrap();
        assert_eq!(timeline.arrivals, vec![t0()]);
        assert_eq!(timeline.duration(), SignedDuration::from_mins(20));
        assert_eq!(timeline.deployments.len(), 1);
    }

    #[test]
    fn station_keeping_is_the_longest_cast() {
        let wp = Waypoint::new(loc(0.0, 0.0), None).with_instruments([
            InstrumentType::Ctd,
            InstrumentType::CtdBgc,
            InstrumentType::Drifter,
        ]);
        assert_eq!(
            stationkeeping_time(&wp, &casts()),
            SignedDuration::from_mins(50)
        );
    }

    #[test]
    fn untimed_waypoint_gets_earliest_arrival() {
        let e = expedition(
            vec![
                Waypoint::new(loc(0.0, 0.0), Some(t0())),
                Waypoint::new(loc(1.0, 0.0), None),
            ],
            InstrumentsConfig::default(),
        );
        let timeline = simulate(&e).unwrap();
        let travel = navigation::travel_time_between(loc(0.0, 0.0), loc(1.0, 0.0), 10.0).unwrap();
        assert_eq!(timeline.arrivals[1], t0().checked_add(travel).unwrap());
    }

    #[test]
    fn early_ship_waits_for_schedule() {
        let scheduled = date(2023, 1, 2).at(0, 0, 0, 0);
        let e = expedition(
            vec![
                Waypoint::new(loc(0.0, 0.0), Some(t0())),
                Waypoint::new(loc(1.0, 0.0), Some(scheduled))
                    .with_instruments([InstrumentType::Drifter, InstrumentType::Drifter]),
            ],
            InstrumentsConfig::default(),
        );
        let timeline = simulate(&e).unwrap();
        assert_eq!(timeline.arrivals[1], scheduled);
        let drifters = timeline.deployments_of(InstrumentType::Drifter);
        assert_eq!(drifters.len(), 2);
        assert!(drifters.iter().all(|d| d.time == scheduled && d.waypoint_i == 1));
    }

    #[test]
    fn late_arrival_reports_zero_based_index() {
        // The 50 minute cast at the second waypoint makes the third late.
        let one_leg = navigation::travel_time_between(loc(0.0, 0.0), loc(0.5, 0.0), 10.0).unwrap();
        let second = t0().checked_add(one_leg).unwrap();
        let third = second
            .checked_add(one_leg + SignedDuration::from_mins(30))
            .unwrap();
        let e = expedition(
            vec![
                Waypoint::new(loc(0.0, 0.0), Some(t0())),
                Waypoint::new(loc(0.5, 0.0), Some(second))
                    .with_instruments([InstrumentType::CtdBgc]),
                Waypoint::new(loc(1.0, 0.0), Some(third)),
            ],
            casts(),
        );
        let err = simulate(&e).unwrap_err();
        assert!(matches!(
            err,
            TimelineError::LateArrival {
                failed_waypoint_i: 2,
                ..
            }
        ));
    }

    #[test]
    fn underway_samples_along_each_leg() {
        let config = InstrumentsConfig {
            ship_underwater_st_config: Some(ShipUnderwaterStConfig {
                enabled: true,
                period: SignedDuration::from_mins(60),
            }),
            ..Default::default()
        };
        let e = expedition(
            vec![
                Waypoint::new(loc(0.0, 0.0), Some(t0())),
                Waypoint::new(loc(1.0, 0.0), None),
            ],
            config,
        );
        let timeline = simulate(&e).unwrap();
        let samples = timeline.deployments_of(InstrumentType::UnderwaterSt);

        // About six hours of steaming, sampled hourly from departure.
        assert_eq!(samples.len(), 6);
        assert_eq!(samples[0].location, loc(0.0, 0.0));
        assert!(samples.windows(2).all(|w| w[0].location.latitude() < w[1].location.latitude()));
        assert!(samples.iter().all(|s| s.time < timeline.arrivals[1]));
    }

    #[test]
    fn switched_off_underway_takes_no_samples() {
        let config = InstrumentsConfig {
            ship_underwater_st_config: Some(ShipUnderwaterStConfig {
                enabled: false,
                period: SignedDuration::from_mins(60),
            }),
            ..Default::default()
        };
        let e = expedition(
            vec![
                Waypoint::new(loc(0.0, 0.0), Some(t0())),
                Waypoint::new(loc(1.0, 0.0), None),
            ],
            config,
        );
        assert!(simulate(&e).unwrap().deployments.is_empty());
    }

    #[test]
    fn no_waypoints_is_unanchored() {
        let e = expedition(vec![], InstrumentsConfig::default());
        assert!(matches!(simulate(&e), Err(TimelineError::Unanchored)));
    }
}
