//! Distances and travel times over the WGS84 ellipsoid.

use geo::{Bearing, Destination, Distance, Geodesic, Point};
use jiff::SignedDuration;

use crate::model::Location;

pub const METERS_PER_NAUTICAL_MILE: f64 = 1852.0;

/// Input that geodesic math cannot work with.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidInputError {
    #[error(
        "invalid location (latitude {latitude}, longitude {longitude}): \
         latitude must be within [-90, 90] and longitude within [-180, 180]"
    )]
    Location { latitude: f64, longitude: f64 },

    #[error("invalid distance {0} m: must be a finite, non-negative number")]
    Distance(f64),

    #[error("invalid ship speed {0} knots: must be a finite, positive number")]
    ShipSpeed(f64),

    #[error("travel time of {0} s is out of range")]
    TravelTime(f64),
}

fn point(location: Location) -> Point<f64> {
    Point::new(location.longitude(), location.latitude())
}

/// Geodesic distance between two locations, in meters.
pub fn distance(a: Location, b: Location) -> f64 {
    Geodesic::distance(point(a), point(b))
}

/// Time to cover `distance_m` meters at `ship_speed_knots`.
pub fn travel_time(distance_m: f64, ship_speed_knots: f64) -> Result<SignedDuration, InvalidInputError> {
    if !distance_m.is_finite() || distance_m < 0.0 {
        return Err(InvalidInputError::Distance(distance_m));
    }
    if !ship_speed_knots.is_finite() || ship_speed_knots <= 0.0 {
        return Err(InvalidInputError::ShipSpeed(ship_speed_knots));
    }
    let meters_per_second = ship_speed_knots * METERS_PER_NAUTICAL_MILE / 3600.0;
    let secs = distance_m / meters_per_second;
    SignedDuration::try_from_secs_f64(secs).map_err(|_| InvalidInputError::TravelTime(secs))
}

/// Time to steam from `a` to `b`.
pub fn travel_time_between(
    a: Location,
    b: Location,
    ship_speed_knots: f64,
) -> Result<SignedDuration, InvalidInputError> {
    travel_time(distance(a, b), ship_speed_knots)
}

/// The location `distance_m` meters from `from` along the geodesic to `to`.
pub fn along(from: Location, to: Location, distance_m: f64) -> Result<Location, InvalidInputError> {
    if !distance_m.is_finite() || distance_m < 0.0 {
        return Err(InvalidInputError::Distance(distance_m));
    }
    if distance_m == 0.0 || from == to {
        return Ok(from);
    }
    let bearing = Geodesic::bearing(point(from), point(to));
    let p = Geodesic::destination(point(from), bearing, distance_m);
    // Longitudes come back in (-180, 180]; clamp rounding noise at the poles.
    Location::new(p.y().clamp(-90.0, 90.0), p.x().clamp(-180.0, 180.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(lat: f64, lon: f64) -> Location {
        Location::new(lat, lon).unwrap()
    }

    #[test]
    fn one_degree_of_latitude_at_equator() {
        let d = distance(loc(0.0, 0.0), loc(1.0, 0.0));
        assert!((d - 110_574.0).abs() < 5.0, "got {d}");
    }

    #[test]
    fn distance_is_symmetric_and_zero_on_self() {
        let a = loc(-23.0, 10.0);
        let b = loc(-20.5, 12.25);
        assert!((distance(a, b) - distance(b, a)).abs() < 1e-6);
        assert!(distance(a, a).abs() < 1e-9);
    }

    #[test]
    fn travel_time_matches_knots() {
        // One nautical mile at one knot takes an hour.
        let t = travel_time(1852.0, 1.0).unwrap();
        assert_eq!(t, SignedDuration::from_hours(1));

        let t = travel_time(18_520.0, 10.0).unwrap();
        assert_eq!(t, SignedDuration::from_hours(1));
    }

    #[test]
    fn travel_time_rejects_invalid_input() {
        assert!(matches!(
            travel_time(f64::NAN, 10.0),
            Err(InvalidInputError::Distance(_))
        ));
        assert!(matches!(
            travel_time(-1.0, 10.0),
            Err(InvalidInputError::Distance(_))
        ));
        assert!(matches!(
            travel_time(100.0, 0.0),
            Err(InvalidInputError::ShipSpeed(_))
        ));
        assert!(matches!(
            travel_time(100.0, f64::NAN),
            Err(InvalidInputError::ShipSpeed(_))
        ));
    }

    #[test]
    fn zero_distance_takes_no_time() {
        assert_eq!(travel_time(0.0, 10.0).unwrap(), SignedDuration::ZERO);
    }

    #[test]
    fn along_reaches_the_midpoint() {
        let a = loc(0.0, 0.0);
        let b = loc(2.0, 0.0);
        let half = distance(a, b) / 2.0;
        let mid = along(a, b, half).unwrap();
        assert!((mid.latitude() - 1.0).abs() < 1e-3, "got {mid}");
        assert!(mid.longitude().abs() < 1e-6);
    }

    #[test]
    fn along_zero_is_origin() {
        let a = loc(5.0, 5.0);
        assert_eq!(along(a, loc(6.0, 6.0), 0.0).unwrap(), a);
    }
}
