//! Measurement simulation hand-off and expedition cost.
//!
//! The physics of each instrument runs in an external particle-tracking
//! simulation. This crate prepares its input: for every instrument kind in
//! use, the deployments the ship made and the instrument's configuration.

use std::path::{Path, PathBuf};

use jiff::SignedDuration;
use serde::Serialize;

use crate::model::{InstrumentType, InstrumentsConfig};
use crate::storage::{self, StorageError};
use crate::timeline::Deployment;

pub const SHIP_COST_PER_DAY: u64 = 30_000;
pub const ARGO_DEPLOY_COST: u64 = 15_000;
pub const DRIFTER_DEPLOY_COST: u64 = 2_500;

#[derive(Debug, thiserror::Error)]
pub enum MeasureError {
    #[error("{instrument} is used but has no configuration")]
    Unconfigured { instrument: InstrumentType },

    #[error("failed to write {instrument} measurements: {source}")]
    Storage {
        instrument: InstrumentType,
        #[source]
        source: StorageError,
    },
}

/// Turns one instrument's deployments into measurement output.
pub trait MeasurementSimulator {
    /// Simulates `instrument` at every deployment and writes its output
    /// under `out_dir`, returning the path written.
    fn simulate(
        &self,
        instrument: InstrumentType,
        deployments: &[Deployment],
        config: &InstrumentsConfig,
        out_dir: &Path,
    ) -> Result<PathBuf, MeasureError>;
}

/// Writes `results/<instrument>.json`: the configuration and deployments an
/// external simulation runs from.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeploymentManifest;

#[derive(Serialize)]
struct Manifest<'a> {
    instrument: InstrumentType,
    config: serde_json::Value,
    deployments: &'a [Deployment],
}

impl MeasurementSimulator for DeploymentManifest {
    fn simulate(
        &self,
        instrument: InstrumentType,
        deployments: &[Deployment],
        config: &InstrumentsConfig,
        out_dir: &Path,
    ) -> Result<PathBuf, MeasureError> {
        let value = instrument_config(instrument, config)
            .map_err(|e| MeasureError::Storage {
                instrument,
                source: e.into(),
            })?
            .ok_or(MeasureError::Unconfigured { instrument })?;

        let path = out_dir.join(format!("{}.json", instrument.as_str().to_lowercase()));
        let manifest = Manifest {
            instrument,
            config: value,
            deployments,
        };
        storage::write_json(&path, &manifest)
            .map_err(|source| MeasureError::Storage { instrument, source })?;
        Ok(path)
    }
}

fn instrument_config(
    instrument: InstrumentType,
    config: &InstrumentsConfig,
) -> serde_json::Result<Option<serde_json::Value>> {
    let value = match instrument {
        InstrumentType::Ctd => config.ctd_config.as_ref().map(serde_json::to_value),
        InstrumentType::CtdBgc => config.ctd_bgc_config.as_ref().map(serde_json::to_value),
        InstrumentType::Drifter => config.drifter_config.as_ref().map(serde_json::to_value),
        InstrumentType::ArgoFloat => config.argo_float_config.as_ref().map(serde_json::to_value),
        InstrumentType::Xbt => config.xbt_config.as_ref().map(serde_json::to_value),
        InstrumentType::Adcp => config.adcp_config.as_ref().map(serde_json::to_value),
        InstrumentType::UnderwaterSt => config
            .ship_underwater_st_config
            .as_ref()
            .map(serde_json::to_value),
    };
    value.transpose()
}

/// Cost in US$: ship time billed per whole hour, plus Argo floats and
/// drifters left in the ocean.
pub fn expedition_cost(duration: SignedDuration, deployments: &[Deployment]) -> u64 {
    let hours = u64::try_from(duration.as_hours()).unwrap_or(0);
    let ship = SHIP_COST_PER_DAY * hours / 24;
    let released: u64 = deployments
        .iter()
        .map(|d| match d.instrument {
            InstrumentType::ArgoFloat => ARGO_DEPLOY_COST,
            InstrumentType::Drifter => DRIFTER_DEPLOY_COST,
            _ => 0,
        })
        .sum();
    ship + released
}
