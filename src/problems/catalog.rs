//! The fixed catalog of things that go wrong at sea.

use jiff::SignedDuration;

use crate::model::InstrumentType;

/// What a problem is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemKind {
    /// Ship-wide. Pre-departure problems strike in port, before the first
    /// waypoint.
    General { pre_departure: bool },
    /// Strikes where the instrument is in use.
    Instrument(InstrumentType),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Problem {
    /// Stable identifier, used in caches and reports.
    pub name: &'static str,
    pub message: &'static str,
    pub delay: SignedDuration,
    /// Whether the problem may strike again after it was already encountered
    /// in this expedition directory.
    pub can_reoccur: bool,
    pub kind: ProblemKind,
}

impl Problem {
    pub fn is_pre_departure(&self) -> bool {
        matches!(
            self.kind,
            ProblemKind::General {
                pre_departure: true
            }
        )
    }

    pub fn instrument(&self) -> Option<InstrumentType> {
        match self.kind {
            ProblemKind::Instrument(kind) => Some(kind),
            ProblemKind::General { .. } => None,
        }
    }

    /// Delay in hours, as written to obligation records and reports.
    pub fn delay_hours(&self) -> f64 {
        self.delay.as_secs_f64() / 3600.0
    }
}

const fn general(
    name: &'static str,
    message: &'static str,
    delay_minutes: i64,
    pre_departure: bool,
    can_reoccur: bool,
) -> Problem {
    Problem {
        name,
        message,
        delay: SignedDuration::from_mins(delay_minutes),
        can_reoccur,
        kind: ProblemKind::General { pre_departure },
    }
}

const fn instrument(
    name: &'static str,
    message: &'static str,
    delay_minutes: i64,
    kind: InstrumentType,
) -> Problem {
    Problem {
        name,
        message,
        delay: SignedDuration::from_mins(delay_minutes),
        can_reoccur: true,
        kind: ProblemKind::Instrument(kind),
    }
}

pub const GENERAL_PROBLEMS: [Problem; 8] = [
    general(
        "scheduled_food_delivery_delayed",
        "The scheduled food delivery prior to departure has not arrived. Until the supply truck \
         reaches the pier, we cannot leave. Once it arrives, unloading and stowing the provisions \
         in the ship's cold storage will also take additional time. These combined delays \
         postpone departure by 5 hours.",
        300,
        true,
        false,
    ),
    general(
        "safety_drill_initiated",
        "A miscommunication with the ship's captain results in the sudden initiation of a \
         mandatory safety drill. The emergency vessel must be lowered and tested while the ship \
         remains stationary, pausing all scientific operations for the duration of the exercise. \
         The drill introduces a delay of 2 hours.",
        120,
        false,
        false,
    ),
    general(
        "fuel_delivery_tanker_delayed",
        "The fuel tanker expected to deliver fuel has not arrived. Until the tanker reaches the \
         pier, we cannot leave. Once it arrives, securing the fuel lines in the ship's tanks and \
         fueling operations will also take additional time. These combined delays postpone \
         departure by 5 hours.",
        300,
        true,
        false,
    ),
    general(
        "marine_mammals_observed",
        "A pod of dolphins is observed swimming directly beneath the planned deployment area. To \
         avoid risk to wildlife and comply with environmental protocols, all operations must \
         pause until the animals move away from the vicinity. This results in a delay of about \
         2 hours.",
        120,
        false,
        true,
    ),
    general(
        "ballast_pump_failure",
        "One of the ship's ballast pumps suddenly stops responding during routine ballasting \
         operations. Without the pump, the vessel cannot safely adjust trim or compensate for \
         equipment movements on deck. Engineering isolates the faulty pump and performs a rapid \
         inspection. Temporary repairs allow limited functionality, but the interruption causes \
         a delay of 4 hours.",
        240,
        false,
        true,
    ),
    general(
        "bow_thruster_power_converter_fault",
        "The bow thruster's power converter reports a fault during station-keeping operations. \
         Dynamic positioning becomes less stable, forcing a temporary suspension of \
         high-precision sampling. Engineers troubleshoot the converter and perform a reset, \
         resulting in a delay of 4 hours.",
        240,
        false,
        false,
    ),
    general(
        "hydraulic_fluid_leak_aframe_actuator",
        "A crew member notices hydraulic fluid leaking from the A-frame actuator during \
         equipment checks. The leak must be isolated immediately to prevent environmental \
         contamination or mechanical failure. Engineering replaces a faulty hose and \
         repressurizes the system. This repair causes a delay of about 6 hours.",
        360,
        false,
        true,
    ),
    general(
        "engine_cooling_intake_blocked",
        "The main engine's cooling water intake alarms indicate reduced flow, likely caused by \
         marine debris or biological fouling. The vessel must temporarily slow down while \
         engineering clears the obstruction and flushes the intake. This results in a delay of \
         4 hours.",
        240,
        false,
        true,
    ),
];

pub const INSTRUMENT_PROBLEMS: [Problem; 8] = [
    instrument(
        "ctd_cable_jammed",
        "During preparation for the next CTD cast, the CTD cable becomes jammed in the winch \
         drum. Attempts to free it are unsuccessful, and the crew determines that the entire \
         cable must be replaced before deployment can continue. This repair is time-consuming \
         and results in a delay of 5 hours.",
        300,
        InstrumentType::Ctd,
    ),
    instrument(
        "adcp_invalid_data",
        "The hull-mounted ADCP begins returning invalid velocity data. Engineering suspects \
         damage to the cable from recent maintenance activities. The ship must hold position \
         while a technician enters the cable compartment to perform an inspection and continuity \
         test. This diagnostic procedure results in a delay of 2 hours.",
        120,
        InstrumentType::Adcp,
    ),
    instrument(
        "ctd_temperature_sensor_failure",
        "The primary temperature sensor on the CTD begins returning inconsistent readings. \
         Troubleshooting confirms that the sensor has malfunctioned. A spare unit can be \
         installed, but integrating and verifying the replacement will pause operations. This \
         procedure leads to an estimated delay of 3 hours.",
        180,
        InstrumentType::Ctd,
    ),
    instrument(
        "ctd_salinity_sensor_failure",
        "The CTD's primary salinity sensor fails and must be replaced with a backup. After \
         installation, a mandatory calibration cast to a minimum depth of 1000 meters is \
         required to verify sensor accuracy. Both the replacement and calibration activities \
         result in a total delay of roughly 4 hours.",
        240,
        InstrumentType::Ctd,
    ),
    instrument(
        "ctd_winch_hydraulic_pressure_drop",
        "The CTD winch begins to lose hydraulic pressure during routine checks prior to \
         deployment. The engineering crew must stop operations to diagnose the hydraulic pump \
         and replenish or repair the system. Until pressure is restored to operational levels, \
         the winch cannot safely be used. This results in an estimated delay of 2.5 hours.",
        150,
        InstrumentType::Ctd,
    ),
    instrument(
        "ctd_rosette_trigger_failure",
        "During a CTD cast, the rosette's bottle-triggering mechanism fails to actuate. No \
         discrete water samples can be collected during this cast. The rosette must be brought \
         back on deck for inspection and manual testing of the trigger system. This results in \
         an operational delay of 3.5 hours.",
        210,
        InstrumentType::Ctd,
    ),
    instrument(
        "drifter_satellite_connection_failure",
        "The drifter scheduled for deployment fails to establish a satellite connection during \
         pre-launch checks. To improve signal acquisition, the drifter must be moved to a higher \
         location on deck with fewer obstructions. The team waits for the satellite connection \
         to be established, resulting in a delay of 2 hours.",
        120,
        InstrumentType::Drifter,
    ),
    instrument(
        "argo_float_satellite_connection_failure",
        "The Argo float scheduled for deployment fails to establish a satellite connection \
         during pre-launch checks. To improve signal acquisition, the float must be moved to a \
         higher location on deck with fewer obstructions. The team waits for the satellite \
         connection to be established, resulting in a delay of 2 hours.",
        120,
        InstrumentType::ArgoFloat,
    ),
];

/// The problems a simulation draws from.
///
/// Built once at startup from the static catalog; tests substitute their own.
#[derive(Debug, Clone)]
pub struct Registry {
    pub general: Vec<Problem>,
    pub instrument: Vec<Problem>,
}

impl Registry {
    pub fn builtin() -> Self {
        Self {
            general: GENERAL_PROBLEMS.to_vec(),
            instrument: INSTRUMENT_PROBLEMS.to_vec(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Problem> {
        self.general.iter().chain(&self.instrument)
    }

    pub fn by_name(&self, name: &str) -> Option<&Problem> {
        self.iter().find(|p| p.name == name)
    }

    pub fn by_message(&self, message: &str) -> Option<&Problem> {
        self.iter().find(|p| p.message == message)
    }
}
