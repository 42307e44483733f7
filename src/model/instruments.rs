//! Instrument kinds and their expedition-wide configuration.

use std::fmt;

use jiff::SignedDuration;
use serde::{Deserialize, Serialize};

use super::ValidationError;
use super::timefmt::minutes;

/// The closed set of instruments a ship can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstrumentType {
    Ctd,
    CtdBgc,
    Drifter,
    ArgoFloat,
    Xbt,
    /// Acoustic Doppler current profiler. Underway.
    Adcp,
    /// Hull-mounted salinity and temperature sensor. Underway.
    UnderwaterSt,
}

impl InstrumentType {
    pub const ALL: [Self; 7] = [
        Self::Ctd,
        Self::CtdBgc,
        Self::Drifter,
        Self::ArgoFloat,
        Self::Xbt,
        Self::Adcp,
        Self::UnderwaterSt,
    ];

    /// Name as written in expedition files.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ctd => "CTD",
            Self::CtdBgc => "CTD_BGC",
            Self::Drifter => "DRIFTER",
            Self::ArgoFloat => "ARGO_FLOAT",
            Self::Xbt => "XBT",
            Self::Adcp => "ADCP",
            Self::UnderwaterSt => "UNDERWATER_ST",
        }
    }

    /// Underway instruments sample continuously while the ship steams.
    pub fn is_underway(self) -> bool {
        matches!(self, Self::Adcp | Self::UnderwaterSt)
    }

    /// The `instruments_config` key holding this kind's configuration.
    pub fn config_key(self) -> &'static str {
        match self {
            Self::Ctd => "ctd_config",
            Self::CtdBgc => "ctd_bgc_config",
            Self::Drifter => "drifter_config",
            Self::ArgoFloat => "argo_float_config",
            Self::Xbt => "xbt_config",
            Self::Adcp => "adcp_config",
            Self::UnderwaterSt => "ship_underwater_st_config",
        }
    }
}

impl fmt::Display for InstrumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Per-instrument configuration ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgoFloatConfig {
    pub min_depth_meter: f64,
    pub max_depth_meter: f64,
    pub drift_depth_meter: f64,
    pub vertical_speed_meter_per_second: f64,
    pub cycle_days: f64,
    pub drift_days: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdcpConfig {
    /// Underway toggle. A present but disabled config counts as unused.
    #[serde(default = "enabled")]
    pub enabled: bool,
    pub max_depth_meter: f64,
    pub num_bins: u32,
    #[serde(rename = "period_minutes", with = "minutes")]
    pub period: SignedDuration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CtdConfig {
    #[serde(rename = "stationkeeping_time_minutes", with = "minutes")]
    pub stationkeeping_time: SignedDuration,
    pub min_depth_meter: f64,
    pub max_depth_meter: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CtdBgcConfig {
    #[serde(rename = "stationkeeping_time_minutes", with = "minutes")]
    pub stationkeeping_time: SignedDuration,
    pub min_depth_meter: f64,
    pub max_depth_meter: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipUnderwaterStConfig {
    /// Underway toggle. A present but disabled config counts as unused.
    #[serde(default = "enabled")]
    pub enabled: bool,
    #[serde(rename = "period_minutes", with = "minutes")]
    pub period: SignedDuration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrifterConfig {
    pub depth_meter: f64,
    #[serde(rename = "lifetime_minutes", with = "minutes")]
    pub lifetime: SignedDuration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XbtConfig {
    pub min_depth_meter: f64,
    pub max_depth_meter: f64,
    pub fall_speed_meter_per_second: f64,
    pub deceleration_coefficient: f64,
}

fn enabled() -> bool {
    true
}

/// Configuration for every instrument kind. `None` means the kind may not be
/// used anywhere in the expedition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstrumentsConfig {
    #[serde(default)]
    pub argo_float_config: Option<ArgoFloatConfig>,
    #[serde(default)]
    pub adcp_config: Option<AdcpConfig>,
    #[serde(default)]
    pub ctd_config: Option<CtdConfig>,
    #[serde(default)]
    pub ctd_bgc_config: Option<CtdBgcConfig>,
    #[serde(default)]
    pub ship_underwater_st_config: Option<ShipUnderwaterStConfig>,
    #[serde(default)]
    pub drifter_config: Option<DrifterConfig>,
    #[serde(default)]
    pub xbt_config: Option<XbtConfig>,
}

impl InstrumentsConfig {
    pub fn is_configured(&self, kind: InstrumentType) -> bool {
        match kind {
            InstrumentType::Ctd => self.ctd_config.is_some(),
            InstrumentType::CtdBgc => self.ctd_bgc_config.is_some(),
            InstrumentType::Drifter => self.drifter_config.is_some(),
            InstrumentType::ArgoFloat => self.argo_float_config.is_some(),
            InstrumentType::Xbt => self.xbt_config.is_some(),
            InstrumentType::Adcp => self.adcp_config.is_some(),
            InstrumentType::UnderwaterSt => self.ship_underwater_st_config.is_some(),
        }
    }

    /// Drops the configuration for `kind`.
    pub fn clear(&mut self, kind: InstrumentType) {
        match kind {
            InstrumentType::Ctd => self.ctd_config = None,
            InstrumentType::CtdBgc => self.ctd_bgc_config = None,
            InstrumentType::Drifter => self.drifter_config = None,
            InstrumentType::ArgoFloat => self.argo_float_config = None,
            InstrumentType::Xbt => self.xbt_config = None,
            InstrumentType::Adcp => self.adcp_config = None,
            InstrumentType::UnderwaterSt => self.ship_underwater_st_config = None,
        }
    }

    /// Underway kinds that are configured and switched on.
    pub fn enabled_underway(&self) -> Vec<InstrumentType> {
        let mut kinds = Vec::new();
        if self.adcp_config.as_ref().is_some_and(|c| c.enabled) {
            kinds.push(InstrumentType::Adcp);
        }
        if self.ship_underwater_st_config.as_ref().is_some_and(|c| c.enabled) {
            kinds.push(InstrumentType::UnderwaterSt);
        }
        kinds
    }

    /// Sampling period of an underway instrument, if it is configured.
    pub fn underway_period(&self, kind: InstrumentType) -> Option<SignedDuration> {
        match kind {
            InstrumentType::Adcp => self.adcp_config.as_ref().map(|c| c.period),
            InstrumentType::UnderwaterSt => {
                self.ship_underwater_st_config.as_ref().map(|c| c.period)
            }
            _ => None,
        }
    }

    /// Time the ship holds station for one deployment of `kind`.
    ///
    /// Only casts hold the ship; everything else is deployed while steaming.
    pub fn stationkeeping_time(&self, kind: InstrumentType) -> SignedDuration {
        let configured = match kind {
            InstrumentType::Ctd => self.ctd_config.as_ref().map(|c| c.stationkeeping_time),
            InstrumentType::CtdBgc => self.ctd_bgc_config.as_ref().map(|c| c.stationkeeping_time),
            _ => None,
        };
        configured.unwrap_or(SignedDuration::ZERO)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(c) = &self.argo_float_config {
            non_positive("argo_float_config.min_depth_meter", c.min_depth_meter)?;
            non_positive("argo_float_config.max_depth_meter", c.max_depth_meter)?;
            non_positive("argo_float_config.drift_depth_meter", c.drift_depth_meter)?;
            negative(
                "argo_float_config.vertical_speed_meter_per_second",
                c.vertical_speed_meter_per_second,
            )?;
            positive("argo_float_config.cycle_days", c.cycle_days)?;
            positive("argo_float_config.drift_days", c.drift_days)?;
        }
        if let Some(c) = &self.adcp_config {
            non_positive("adcp_config.max_depth_meter", c.max_depth_meter)?;
            positive("adcp_config.num_bins", f64::from(c.num_bins))?;
            positive_duration("adcp_config.period_minutes", c.period)?;
        }
        if let Some(c) = &self.ctd_config {
            positive_duration("ctd_config.stationkeeping_time_minutes", c.stationkeeping_time)?;
            non_positive("ctd_config.min_depth_meter", c.min_depth_meter)?;
            non_positive("ctd_config.max_depth_meter", c.max_depth_meter)?;
        }
        if let Some(c) = &self.ctd_bgc_config {
            positive_duration(
                "ctd_bgc_config.stationkeeping_time_minutes",
                c.stationkeeping_time,
            )?;
            non_positive("ctd_bgc_config.min_depth_meter", c.min_depth_meter)?;
            non_positive("ctd_bgc_config.max_depth_meter", c.max_depth_meter)?;
        }
        if let Some(c) = &self.ship_underwater_st_config {
            positive_duration("ship_underwater_st_config.period_minutes", c.period)?;
        }
        if let Some(c) = &self.drifter_config {
            non_positive("drifter_config.depth_meter", c.depth_meter)?;
            positive_duration("drifter_config.lifetime_minutes", c.lifetime)?;
        }
        if let Some(c) = &self.xbt_config {
            non_positive("xbt_config.min_depth_meter", c.min_depth_meter)?;
            non_positive("xbt_config.max_depth_meter", c.max_depth_meter)?;
            positive(
                "xbt_config.fall_speed_meter_per_second",
                c.fall_speed_meter_per_second,
            )?;
            positive(
                "xbt_config.deceleration_coefficient",
                c.deceleration_coefficient,
            )?;
        }
        Ok(())
    }
}

// ── Field checks ──

fn positive(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::new(field, "must be greater than 0"))
    }
}

fn negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value < 0.0 {
        Ok(())
    } else {
        Err(ValidationError::new(field, "must be less than 0"))
    }
}

fn non_positive(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value <= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::new(field, "must be 0 or less (depths are negative)"))
    }
}

fn positive_duration(field: &'static str, value: SignedDuration) -> Result<(), ValidationError> {
    if value.is_positive() {
        Ok(())
    } else {
        Err(ValidationError::new(field, "must be a positive duration"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_match_expedition_files() {
        for kind in InstrumentType::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn only_adcp_and_underwater_st_are_underway() {
        let underway: Vec<_> = InstrumentType::ALL
            .into_iter()
            .filter(|k| k.is_underway())
            .collect();
        assert_eq!(
            underway,
            vec![InstrumentType::Adcp, InstrumentType::UnderwaterSt]
        );
    }

    #[test]
    fn durations_parse_from_minutes() {
        let yaml = "stationkeeping_time_minutes: 20\nmin_depth_meter: -11\nmax_depth_meter: -2000\n";
        let ctd: CtdConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(ctd.stationkeeping_time, SignedDuration::from_mins(20));
    }

    #[test]
    fn underway_enabled_by_default() {
        let adcp: AdcpConfig =
            serde_yaml::from_str("max_depth_meter: -1000\nnum_bins: 40\nperiod_minutes: 5\n")
                .unwrap();
        assert!(adcp.enabled);

        let config = InstrumentsConfig {
            adcp_config: Some(AdcpConfig {
                enabled: false,
                ..adcp
            }),
            ..Default::default()
        };
        assert!(config.enabled_underway().is_empty());
        assert!(config.is_configured(InstrumentType::Adcp));
    }

    #[test]
    fn clear_removes_only_that_kind() {
        let mut config = InstrumentsConfig {
            drifter_config: Some(DrifterConfig {
                depth_meter: -1.0,
                lifetime: SignedDuration::from_hours(24),
            }),
            xbt_config: Some(XbtConfig {
                min_depth_meter: -2.0,
                max_depth_meter: -285.0,
                fall_speed_meter_per_second: 6.7,
                deceleration_coefficient: 0.00225,
            }),
            ..Default::default()
        };
        config.clear(InstrumentType::Drifter);
        assert!(!config.is_configured(InstrumentType::Drifter));
        assert!(config.is_configured(InstrumentType::Xbt));
    }

    #[test]
    fn stationkeeping_only_for_casts() {
        let config = InstrumentsConfig {
            ctd_config: Some(CtdConfig {
                stationkeeping_time: SignedDuration::from_mins(20),
                min_depth_meter: -11.0,
                max_depth_meter: -2000.0,
            }),
            ..Default::default()
        };
        assert_eq!(
            config.stationkeeping_time(InstrumentType::Ctd),
            SignedDuration::from_mins(20)
        );
        assert_eq!(
            config.stationkeeping_time(InstrumentType::Drifter),
            SignedDuration::ZERO
        );
    }

    #[test]
    fn validate_rejects_positive_depth() {
        let config = InstrumentsConfig {
            drifter_config: Some(DrifterConfig {
                depth_meter: 5.0,
                lifetime: SignedDuration::from_hours(24),
            }),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.field, "drifter_config.depth_meter");
    }

    #[test]
    fn validate_rejects_zero_period() {
        let config = InstrumentsConfig {
            ship_underwater_st_config: Some(ShipUnderwaterStConfig {
                enabled: true,
                period: SignedDuration::ZERO,
            }),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
