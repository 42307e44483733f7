//! Cross-checks the instruments configuration against the schedule.

use crate::model::{Expedition, InstrumentType};

#[derive(Debug, thiserror::Error)]
pub enum InstrumentsConfigError {
    #[error(
        "expedition includes instrument '{0}', but instruments_config does not provide \
         configuration for it (add {key} to instruments_config)",
        key = .0.config_key()
    )]
    MissingConfig(InstrumentType),
}

/// Prunes configuration for unused instruments, then requires configuration
/// for every used one.
///
/// Pruning runs first so that a second pass over the output changes nothing.
/// Returns the kinds whose configuration was removed.
pub fn verify_instruments_config(
    expedition: &mut Expedition,
) -> Result<Vec<InstrumentType>, InstrumentsConfigError> {
    let used = expedition.instruments();
    let config = &mut expedition.instruments_config;

    let mut pruned = Vec::new();
    for kind in InstrumentType::ALL {
        if config.is_configured(kind) && !used.contains(&kind) {
            config.clear(kind);
            log::info!("{kind} configuration provided but not in schedule, removed");
            pruned.push(kind);
        }
    }

    if let Some(kind) = used.into_iter().find(|k| !config.is_configured(*k)) {
        return Err(InstrumentsConfigError::MissingConfig(kind));
    }

    Ok(pruned)
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::SignedDuration;

    use crate::model::{
        AdcpConfig, CtdConfig, DrifterConfig, InstrumentsConfig, Location, Schedule, ShipConfig,
        Waypoint,
    };

    fn expedition(instruments: &[InstrumentType], config: InstrumentsConfig) -> Expedition {
        let loc = Location::new(0.0, 0.0).unwrap();
        Expedition {
            schedule: Schedule {
                waypoints: vec![Waypoint::new(loc, None).with_instruments(instruments.iter().copied())],
                space_time_region: None,
            },
            instruments_config: config,
            ship_config: ShipConfig {
                ship_speed_knots: 10.0,
            },
        }
    }

    fn adcp(enabled: bool) -> AdcpConfig {
        AdcpConfig {
            enabled,
            max_depth_meter: -1000.0,
            num_bins: 40,
            period: SignedDuration::from_mins(5),
        }
    }

    fn ctd() -> CtdConfig {
        CtdConfig {
            stationkeeping_time: SignedDuration::from_mins(20),
            min_depth_meter: -11.0,
            max_depth_meter: -2000.0,
        }
    }

    #[test]
    fn missing_config_names_the_instrument() {
        let mut e = expedition(&[InstrumentType::Ctd], InstrumentsConfig::default());
        let err = verify_instruments_config(&mut e).unwrap_err();
        assert!(matches!(
            err,
            InstrumentsConfigError::MissingConfig(InstrumentType::Ctd)
        ));
        assert!(err.to_string().contains("'CTD'"));
    }

    #[test]
    fn unused_config_is_pruned() {
        let config = InstrumentsConfig {
            ctd_config: Some(ctd()),
            drifter_config: Some(DrifterConfig {
                depth_meter: -1.0,
                lifetime: SignedDuration::from_hours(24),
            }),
            ..Default::default()
        };
        let mut e = expedition(&[InstrumentType::Ctd], config);
        let pruned = verify_instruments_config(&mut e).unwrap();
        assert_eq!(pruned, vec![InstrumentType::Drifter]);
        assert!(e.instruments_config.drifter_config.is_none());
        assert!(e.instruments_config.ctd_config.is_some());
    }

    #[test]
    fn switched_off_adcp_is_pruned_without_error() {
        let config = InstrumentsConfig {
            adcp_config: Some(adcp(false)),
            ..Default::default()
        };
        let mut e = expedition(&[], config);
        let pruned = verify_instruments_config(&mut e).unwrap();
        assert_eq!(pruned, vec![InstrumentType::Adcp]);
        assert!(e.instruments_config.adcp_config.is_none());
    }

    #[test]
    fn switched_on_adcp_is_kept() {
        let config = InstrumentsConfig {
            adcp_config: Some(adcp(true)),
            ..Default::default()
        };
        let mut e = expedition(&[], config);
        assert!(verify_instruments_config(&mut e).unwrap().is_empty());
        assert!(e.instruments_config.adcp_config.is_some());
    }

    #[test]
    fn pruning_is_a_fixed_point() {
        let config = InstrumentsConfig {
            ctd_config: Some(ctd()),
            adcp_config: Some(adcp(false)),
            ..Default::default()
        };
        let mut e = expedition(&[InstrumentType::Ctd], config);
        verify_instruments_config(&mut e).unwrap();
        let after_first = e.clone();

        let pruned = verify_instruments_config(&mut e).unwrap();
        assert!(pruned.is_empty());
        assert_eq!(e, after_first);
    }
}
