//! Pre-departure checks: is the instrument setup complete, and can the
//! route be sailed as scheduled.

mod instruments;
mod schedule;

pub use instruments::{InstrumentsConfigError, verify_instruments_config};
pub use schedule::{CTD_STATIONKEEPING_PAD, EnvironmentCheck, ScheduleError, verify_schedule};
