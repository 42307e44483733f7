//! Ocean data: what to download for a region, where downloads live, and the
//! bathymetry used to keep waypoints off land.
//!
//! Downloading is done by an external client. This module describes the
//! requests it should serve and reads back what it left in
//! `data/<region-hash>/`.

use std::path::{Path, PathBuf};

use jiff::SignedDuration;
use jiff::civil::DateTime;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::model::timefmt::datetime;
use crate::model::{InstrumentType, Location, SpaceTimeRegion};
use crate::storage::{self, StorageError};
use crate::verify::EnvironmentCheck;

pub const BATHYMETRY_FILE: &str = "bathymetry.json";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("malformed bathymetry grid: {0}")]
    Grid(&'static str),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Extra margin around the region an instrument needs, since free-drifting
/// instruments leave the ship's box.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Buffer {
    degrees: f64,
    days: i64,
}

fn buffer(instrument: InstrumentType) -> Buffer {
    match instrument {
        InstrumentType::Drifter | InstrumentType::ArgoFloat => Buffer {
            degrees: 3.0,
            days: 21,
        },
        _ => Buffer {
            degrees: 0.0,
            days: 0,
        },
    }
}

/// One download the external client should serve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataRequest {
    pub instrument: InstrumentType,
    pub minimum_longitude: f64,
    pub maximum_longitude: f64,
    pub minimum_latitude: f64,
    pub maximum_latitude: f64,
    pub minimum_depth: f64,
    pub maximum_depth: f64,
    #[serde(with = "datetime")]
    pub start_time: DateTime,
    #[serde(with = "datetime")]
    pub end_time: DateTime,
}

impl DataRequest {
    /// The region widened by the instrument's buffer and clamped to the globe.
    pub fn for_region(region: &SpaceTimeRegion, instrument: InstrumentType) -> Self {
        let s = &region.spatial_range;
        let b = buffer(instrument);
        let end = region
            .time_range
            .end_time
            .checked_add(SignedDuration::from_hours(24 * b.days))
            .unwrap_or(region.time_range.end_time);
        Self {
            instrument,
            minimum_longitude: (s.minimum_longitude - b.degrees).max(-180.0),
            maximum_longitude: (s.maximum_longitude + b.degrees).min(180.0),
            minimum_latitude: (s.minimum_latitude - b.degrees).max(-90.0),
            maximum_latitude: (s.maximum_latitude + b.degrees).min(90.0),
            minimum_depth: s.minimum_depth,
            maximum_depth: s.maximum_depth,
            start_time: region.time_range.start_time,
            end_time: end,
        }
    }
}

/// Content address of a region's downloads.
pub fn region_hash(region: &SpaceTimeRegion) -> String {
    let s = &region.spatial_range;
    let mut hasher = Sha256::new();
    for v in [
        s.minimum_longitude,
        s.maximum_longitude,
        s.minimum_latitude,
        s.maximum_latitude,
        s.minimum_depth,
        s.maximum_depth,
    ] {
        hasher.update(v.to_le_bytes());
    }
    hasher.update(crate::model::timefmt::format_datetime(region.time_range.start_time));
    hasher.update(crate::model::timefmt::format_datetime(region.time_range.end_time));
    hex::encode(hasher.finalize())
}

/// The download directory for `hash`, if one exists.
pub fn existing_download(data_dir: &Path, hash: &str) -> Option<PathBuf> {
    let dir = data_dir.join(hash);
    dir.is_dir().then_some(dir)
}

/// Writes the requests for `instruments` to `data/requests_<hash>.json`.
pub fn write_requests(
    data_dir: &Path,
    region: &SpaceTimeRegion,
    instruments: impl IntoIterator<Item = InstrumentType>,
) -> Result<PathBuf, FetchError> {
    let requests: Vec<_> = instruments
        .into_iter()
        .map(|kind| DataRequest::for_region(region, kind))
        .collect();
    let path = data_dir.join(format!("requests_{}.json", region_hash(region)));
    storage::write_json(&path, &requests)?;
    Ok(path)
}

// ── Bathymetry ──

/// Sea floor depth on a regular grid.
///
/// `depth[j][i]` is the elevation at `latitude[j]`, `longitude[i]`, negative
/// below sea level. `null` marks cells without ocean data.
#[derive(Debug, Clone, Deserialize)]
pub struct BathymetryGrid {
    longitude: Vec<f64>,
    latitude: Vec<f64>,
    depth: Vec<Vec<Option<f64>>>,
}

impl BathymetryGrid {
    pub fn load(path: &Path) -> Result<Self, FetchError> {
        let grid: Self = storage::read_json(path)?;
        grid.check_shape()?;
        Ok(grid)
    }

    fn check_shape(&self) -> Result<(), FetchError> {
        if self.longitude.is_empty() || self.latitude.is_empty() {
            return Err(FetchError::Grid("empty axis"));
        }
        if self.depth.len() != self.latitude.len()
            || self.depth.iter().any(|row| row.len() != self.longitude.len())
        {
            return Err(FetchError::Grid("depth rows must match latitude x longitude"));
        }
        Ok(())
    }

    /// Depth of the cell nearest to `location`, or `None` for a cell without
    /// data. Locations beyond the grid edges yield `Some(f64::NAN)`.
    pub fn depth_at(&self, location: Location) -> Option<f64> {
        let (Some(i), Some(j)) = (
            nearest(&self.longitude, location.longitude()),
            nearest(&self.latitude, location.latitude()),
        ) else {
            return Some(f64::NAN);
        };
        self.depth.get(j).and_then(|row| row.get(i)).copied().flatten()
    }
}

/// Index of the axis value closest to `v`, if `v` lies within the axis span.
fn nearest(axis: &[f64], v: f64) -> Option<usize> {
    let (lo, hi) = axis
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| (lo.min(*x), hi.max(*x)));
    if v < lo || v > hi {
        return None;
    }
    axis.iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (*a - v).abs().total_cmp(&(*b - v).abs()))
        .map(|(i, _)| i)
}

impl EnvironmentCheck for BathymetryGrid {
    fn is_on_land(&self, location: Location) -> bool {
        // NaN (outside the grid) compares false: no evidence of land.
        self.depth_at(location).is_none_or(|d| d >= 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::civil::date;
    use tempfile::TempDir;

    use crate::model::{SpatialRange, TimeRange};

    fn region() -> SpaceTimeRegion {
        SpaceTimeRegion {
            spatial_range: SpatialRange {
                minimum_longitude: 0.0,
                maximum_longitude: 1.0,
                minimum_latitude: 88.0,
                maximum_latitude: 89.0,
                minimum_depth: 0.0,
                maximum_depth: 10.0,
            },
            time_range: TimeRange {
                start_time: date(1950, 1, 1).at(0, 0, 0, 0),
                end_time: date(1950, 1, 2).at(0, 0, 0, 0),
            },
        }
    }

    fn loc(lat: f64, lon: f64) -> Location {
        Location::new(lat, lon).unwrap()
    }

    fn grid() -> BathymetryGrid {
        // Land in the north-east corner, a data gap in the north-west.
        serde_json::from_str(
            r#"{
                "longitude": [0.0, 1.0, 2.0],
                "latitude": [0.0, 1.0],
                "depth": [[-4000.0, -3000.0, -50.0], [null, -20.0, 15.0]]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn buffers_widen_drifting_instruments_only() {
        let ctd = DataRequest::for_region(&region(), InstrumentType::Ctd);
        assert!((ctd.minimum_longitude - 0.0).abs() < f64::EPSILON);
        assert_eq!(ctd.end_time, region().time_range.end_time);

        let drifter = DataRequest::for_region(&region(), InstrumentType::Drifter);
        assert!((drifter.minimum_longitude + 3.0).abs() < f64::EPSILON);
        assert!((drifter.maximum_latitude - 90.0).abs() < f64::EPSILON);
        assert_eq!(drifter.end_time, date(1950, 1, 23).at(0, 0, 0, 0));
    }

    #[test]
    fn region_hash_is_stable_and_sensitive() {
        let a = region();
        let mut b = region();
        assert_eq!(region_hash(&a), region_hash(&b));
        b.spatial_range.maximum_depth = 20.0;
        assert_ne!(region_hash(&a), region_hash(&b));
    }

    #[test]
    fn existing_download_requires_directory() {
        let dir = TempDir::new().unwrap();
        assert!(existing_download(dir.path(), "abc").is_none());
        std::fs::create_dir(dir.path().join("abc")).unwrap();
        assert_eq!(
            existing_download(dir.path(), "abc"),
            Some(dir.path().join("abc"))
        );
    }

    #[test]
    fn writes_one_request_per_instrument() {
        let dir = TempDir::new().unwrap();
        let path = write_requests(
            dir.path(),
            &region(),
            [InstrumentType::Ctd, InstrumentType::ArgoFloat],
        )
        .unwrap();
        let json: serde_json::Value = storage::read_json(&path).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 2);
        assert_eq!(json[1]["instrument"], "ARGO_FLOAT");
    }

    #[test]
    fn nearest_cell_lookup() {
        let g = grid();
        assert_eq!(g.depth_at(loc(0.2, 0.1)), Some(-4000.0));
        assert_eq!(g.depth_at(loc(0.6, 1.4)), Some(-20.0));
        assert_eq!(g.depth_at(loc(1.0, 0.0)), None);
    }

    #[test]
    fn land_and_gaps_count_as_land() {
        let g = grid();
        assert!(!g.is_on_land(loc(0.0, 0.0)));
        assert!(g.is_on_land(loc(1.0, 2.0)));
        assert!(g.is_on_land(loc(0.9, 0.1)));
    }

    #[test]
    fn outside_the_grid_is_not_land() {
        assert!(!grid().is_on_land(loc(-30.0, 100.0)));
    }

    #[test]
    fn load_rejects_ragged_grid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(BATHYMETRY_FILE);
        std::fs::write(
            &path,
            r#"{"longitude": [0, 1], "latitude": [0], "depth": [[-1]]}"#,
        )
        .unwrap();
        assert!(matches!(
            BathymetryGrid::load(&path),
            Err(FetchError::Grid(_))
        ));
    }
}
