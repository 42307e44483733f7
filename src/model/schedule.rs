//! Schedules: the ordered waypoints a ship visits.

use std::collections::BTreeSet;

use jiff::civil::DateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::timefmt::{datetime, optional_datetime};
use super::{InstrumentType, Location, ValidationError};

/// A scheduled stop or pass-through.
///
/// Only the first waypoint of a schedule needs a time; the rest may be left
/// open and are filled in with the earliest possible arrival. `instrument`
/// may repeat a kind to deploy several at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub location: Location,

    #[serde(default, with = "optional_datetime")]
    pub time: Option<DateTime>,

    #[serde(
        default,
        deserialize_with = "deserialize_instruments",
        serialize_with = "serialize_instruments"
    )]
    pub instrument: Vec<InstrumentType>,
}

#[cfg(test)]
impl Waypoint {
    pub fn new(location: Location, time: Option<DateTime>) -> Self {
        Self {
            location,
            time,
            instrument: Vec::new(),
        }
    }

    pub fn with_instruments(mut self, instruments: impl IntoIterator<Item = InstrumentType>) -> Self {
        self.instrument.extend(instruments);
        self
    }
}

/// `instrument:` accepts a single kind, a list, or null.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(InstrumentType),
    Many(Vec<InstrumentType>),
}

fn deserialize_instruments<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<InstrumentType>, D::Error> {
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(kind)) => vec![kind],
        Some(OneOrMany::Many(kinds)) => kinds,
    })
}

fn serialize_instruments<S: Serializer>(
    instruments: &[InstrumentType],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    if instruments.is_empty() {
        serializer.serialize_none()
    } else {
        serializer.collect_seq(instruments)
    }
}

/// Horizontal and vertical extent of the data an expedition needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialRange {
    pub minimum_longitude: f64,
    pub maximum_longitude: f64,
    pub minimum_latitude: f64,
    pub maximum_latitude: f64,
    /// Meters below the surface.
    #[serde(default)]
    pub minimum_depth: f64,
    pub maximum_depth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    #[serde(with = "datetime")]
    pub start_time: DateTime,
    #[serde(with = "datetime")]
    pub end_time: DateTime,
}

/// The bounding box used for data fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceTimeRegion {
    pub spatial_range: SpatialRange,
    pub time_range: TimeRange,
}

impl SpaceTimeRegion {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let s = &self.spatial_range;
        if !(-180.0..=180.0).contains(&s.minimum_longitude)
            || !(-180.0..=180.0).contains(&s.maximum_longitude)
            || s.minimum_longitude > s.maximum_longitude
        {
            return Err(ValidationError::new(
                "space_time_region.spatial_range",
                "longitudes must lie in [-180, 180] with minimum <= maximum",
            ));
        }
        if !(-90.0..=90.0).contains(&s.minimum_latitude)
            || !(-90.0..=90.0).contains(&s.maximum_latitude)
            || s.minimum_latitude > s.maximum_latitude
        {
            return Err(ValidationError::new(
                "space_time_region.spatial_range",
                "latitudes must lie in [-90, 90] with minimum <= maximum",
            ));
        }
        if s.minimum_depth < 0.0 || s.minimum_depth > s.maximum_depth {
            return Err(ValidationError::new(
                "space_time_region.spatial_range",
                "depths must satisfy 0 <= minimum_depth <= maximum_depth",
            ));
        }
        if self.time_range.start_time > self.time_range.end_time {
            return Err(ValidationError::new(
                "space_time_region.time_range",
                "start_time must not be after end_time",
            ));
        }
        Ok(())
    }
}

/// Ordered waypoints plus the optional data region.
///
/// Feasibility (ordering, reachability, land) is checked by
/// [`crate::verify::verify_schedule`], not on construction, so a user can
/// load and fix an infeasible plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub waypoints: Vec<Waypoint>,

    #[serde(default)]
    pub space_time_region: Option<SpaceTimeRegion>,
}

impl Schedule {
    /// Every instrument kind deployed at some waypoint.
    pub fn instruments(&self) -> BTreeSet<InstrumentType> {
        self.waypoints
            .iter()
            .flat_map(|wp| wp.instrument.iter().copied())
            .collect()
    }
}
