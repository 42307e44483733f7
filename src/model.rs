//! Core data model for VirtualShip.
//!
//! These types are the shapes of `expedition.yaml` and `checkpoint.yaml`:
//! an expedition is a schedule of waypoints, the configuration of every
//! instrument it deploys, and the ship that carries them.

mod expedition;
mod instruments;
mod location;
mod schedule;
pub mod timefmt;

pub use expedition::{EXAMPLE_EXPEDITION, Expedition, ShipConfig};
pub use instruments::{
    AdcpConfig, ArgoFloatConfig, CtdBgcConfig, CtdConfig, DrifterConfig, InstrumentType,
    InstrumentsConfig, ShipUnderwaterStConfig, XbtConfig,
};
pub use location::Location;
pub use schedule::{Schedule, SpaceTimeRegion, SpatialRange, TimeRange, Waypoint};

/// A field that holds a value outside its allowed range.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: &'static str,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: &'static str) -> Self {
        Self {
            field: field.into(),
            reason,
        }
    }
}
