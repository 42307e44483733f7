//! Serde adapters for the time shapes used in expedition files.
//!
//! Waypoint times are civil date-times written as `YYYY-MM-DD HH:MM:SS`.
//! Durations are plain numbers of minutes, carried in keys ending in
//! `_minutes`.

use jiff::SignedDuration;
use jiff::civil::DateTime;
use serde::{Deserialize, Deserializer, Serializer, de};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats a date-time the way expedition files write it.
pub fn format_datetime(dt: DateTime) -> String {
    dt.strftime(DATETIME_FORMAT).to_string()
}

/// Parses `YYYY-MM-DD HH:MM:SS`, also accepting ISO 8601 (`T` separator)
/// and bare dates.
pub fn parse_datetime(s: &str) -> Result<DateTime, jiff::Error> {
    DateTime::strptime(DATETIME_FORMAT, s.trim()).or_else(|_| s.trim().parse())
}

pub mod datetime {
    use super::{DateTime, Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(dt: &DateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_datetime(*dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_datetime(&s).map_err(de::Error::custom)
    }
}

pub mod optional_datetime {
    use super::{DateTime, Deserialize, Deserializer, Serializer, de};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(
        dt: &Option<DateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match dt {
            Some(dt) => serializer.serialize_some(&super::format_datetime(*dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|s| super::parse_datetime(&s).map_err(de::Error::custom))
            .transpose()
    }
}

pub mod minutes {
    use super::{Deserialize, Deserializer, Serializer, SignedDuration, de};

    pub fn serialize<S: Serializer>(
        duration: &SignedDuration,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64() / 60.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<SignedDuration, D::Error> {
        let minutes = f64::deserialize(deserializer)?;
        SignedDuration::try_from_secs_f64(minutes * 60.0).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::civil::date;

    #[test]
    fn parses_expedition_format() {
        let dt = parse_datetime("2023-01-01 06:30:00").unwrap();
        assert_eq!(dt, date(2023, 1, 1).at(6, 30, 0, 0));
    }

    #[test]
    fn parses_iso_and_bare_dates() {
        assert_eq!(
            parse_datetime("2023-01-01T06:30:00").unwrap(),
            date(2023, 1, 1).at(6, 30, 0, 0)
        );
        assert_eq!(
            parse_datetime("2020-01-02").unwrap(),
            date(2020, 1, 2).at(0, 0, 0, 0)
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_datetime("yesterday at noon").is_err());
    }

    #[test]
    fn formats_without_separator_t() {
        let dt = date(2024, 2, 1).at(10, 0, 0, 0);
        assert_eq!(format_datetime(dt), "2024-02-01 10:00:00");
    }
}
