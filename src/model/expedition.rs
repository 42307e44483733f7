//! The expedition file: schedule, instruments and ship.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{InstrumentType, InstrumentsConfig, Schedule, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipConfig {
    pub ship_speed_knots: f64,
}

/// Everything `expedition.yaml` describes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Expedition {
    pub schedule: Schedule,
    pub instruments_config: InstrumentsConfig,
    pub ship_config: ShipConfig,
}

impl Expedition {
    /// Instrument kinds in use: every kind deployed at a waypoint plus the
    /// underway kinds switched on in `instruments_config`.
    pub fn instruments(&self) -> BTreeSet<InstrumentType> {
        let mut kinds = self.schedule.instruments();
        kinds.extend(self.instruments_config.enabled_underway());
        kinds
    }

    /// Field-level checks that hold regardless of the route.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let speed = self.ship_config.ship_speed_knots;
        if !(speed.is_finite() && speed > 0.0) {
            return Err(ValidationError::new(
                "ship_config.ship_speed_knots",
                "must be greater than 0",
            ));
        }
        if let Some(region) = &self.schedule.space_time_region {
            region.validate()?;
        }
        self.instruments_config.validate()
    }
}

/// Written by `virtualship init`.
pub const EXAMPLE_EXPEDITION: &str = "\
schedule:
  space_time_region:
    spatial_range:
      minimum_longitude: -5.0
      maximum_longitude: 0.0
      minimum_latitude: -5.0
      maximum_latitude: 0.0
      minimum_depth: 0
      maximum_depth: 2000
    time_range:
      start_time: 2023-01-01 00:00:00
      end_time: 2023-02-01 00:00:00
  waypoints:
    - location:
        latitude: -1.0
        longitude: -1.0
      time: 2023-01-01 00:00:00
      instrument:
        - CTD
        - DRIFTER
    - location:
        latitude: -2.0
        longitude: -1.0
      time: 2023-01-01 12:00:00
      instrument: [CTD, ARGO_FLOAT]
    - location:
        latitude: -2.0
        longitude: -2.5
      time: 2023-01-02 06:00:00
      instrument: XBT
    - location:
        latitude: -3.5
        longitude: -2.5
      time: 2023-01-03 00:00:00
      instrument:
        - CTD
        - CTD_BGC
        - DRIFTER
instruments_config:
  adcp_config:
    max_depth_meter: -1000.0
    num_bins: 40
    period_minutes: 5.0
  argo_float_config:
    cycle_days: 10.0
    drift_days: 9.0
    drift_depth_meter: -1000.0
    max_depth_meter: -2000.0
    min_depth_meter: 0.0
    vertical_speed_meter_per_second: -0.1
  ctd_config:
    max_depth_meter: -2000.0
    min_depth_meter: -11.0
    stationkeeping_time_minutes: 20.0
  ctd_bgc_config:
    max_depth_meter: -2000.0
    min_depth_meter: -11.0
    stationkeeping_time_minutes: 20.0
  drifter_config:
    depth_meter: 0.0
    lifetime_minutes: 60480.0
  xbt_config:
    max_depth_meter: -285.0
    min_depth_meter: -2.0
    fall_speed_meter_per_second: 6.7
    deceleration_coefficient: 0.00225
  ship_underwater_st_config:
    period_minutes: 5.0
ship_config:
  ship_speed_knots: 10.0
";
