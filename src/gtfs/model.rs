//! GTFS record types.
//!
//! These map one-to-one onto rows of the static feed files. Times are
//! seconds from service-day midnight and may exceed 24h for trips that run
//! past midnight, per GTFS convention.

use std::fmt;

use chrono::{Datelike, NaiveDate, Weekday};

use crate::geo::Coordinate;

/// Error returned when parsing an invalid GTFS time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid GTFS time: {reason}")]
pub struct TimeParseError {
    reason: &'static str,
}

impl TimeParseError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// A GTFS time: seconds from service-day midnight.
///
/// Values above 86400 are legal and denote times past midnight on the
/// following calendar day (e.g. "25:04:00").
///
/// # Examples
///
/// ```
/// use transit_server::gtfs::GtfsTime;
///
/// let t = GtfsTime::parse("10:05:00").unwrap();
/// assert_eq!(t.secs(), 10 * 3600 + 5 * 60);
/// assert_eq!(t.to_string(), "10:05:00");
///
/// // Past-midnight times are allowed
/// assert!(GtfsTime::parse("25:04:00").is_ok());
///
/// assert!(GtfsTime::parse("10:05").is_err());
/// assert!(GtfsTime::parse("10:61:00").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GtfsTime(i32);

impl GtfsTime {
    /// Construct from raw seconds since midnight.
    pub fn from_secs(secs: i32) -> Self {
        Self(secs)
    }

    /// Parse from "HH:MM:SS". Hours may exceed 23.
    pub fn parse(s: &str) -> Result<Self, TimeParseError> {
        let s = s.trim();
        let mut parts = s.split(':');

        let hours = parse_component(parts.next(), "missing hours")?;
        let minutes = parse_component(parts.next(), "missing minutes")?;
        let seconds = parse_component(parts.next(), "missing seconds")?;

        if parts.next().is_some() {
            return Err(TimeParseError::new("too many components"));
        }
        if minutes > 59 {
            return Err(TimeParseError::new("minute must be 0-59"));
        }
        if seconds > 59 {
            return Err(TimeParseError::new("second must be 0-59"));
        }

        Ok(Self(hours * 3600 + minutes * 60 + seconds))
    }

    /// Seconds since service-day midnight.
    pub fn secs(&self) -> i32 {
        self.0
    }

    /// Whole minutes between `self` and a later time.
    pub fn minutes_until(&self, later: GtfsTime) -> i64 {
        i64::from(later.0 - self.0) / 60
    }
}

fn parse_component(part: Option<&str>, missing: &'static str) -> Result<i32, TimeParseError> {
    let part = part.ok_or_else(|| TimeParseError::new(missing))?;
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TimeParseError::new("components must be decimal digits"));
    }
    part.parse()
        .map_err(|_| TimeParseError::new("component out of range"))
}

impl fmt::Display for GtfsTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = self.0 / 3600;
        let m = (self.0 % 3600) / 60;
        let s = self.0 % 60;
        write!(f, "{h:02}:{m:02}:{s:02}")
    }
}

impl fmt::Debug for GtfsTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GtfsTime({self})")
    }
}

/// A boarding/alighting location.
#[derive(Debug, Clone)]
pub struct Stop {
    pub id: String,
    pub name: String,
    pub coord: Coordinate,
}

/// A labeled transit line served by many trips.
#[derive(Debug, Clone)]
pub struct Route {
    pub id: String,
    pub short_name: String,
    pub long_name: String,
    pub route_type: i32,
}

/// One scheduled run of a vehicle along a route.
#[derive(Debug, Clone)]
pub struct Trip {
    pub id: String,
    pub route_id: String,
    pub service_id: String,
    pub headsign: Option<String>,
}

/// A scheduled call of a trip at a stop.
#[derive(Debug, Clone)]
pub struct StopTime {
    pub trip_id: String,
    pub stop_id: String,
    pub sequence: u32,
    pub arrival: GtfsTime,
    pub departure: GtfsTime,
}

/// Weekly service pattern with a validity date range.
#[derive(Debug, Clone)]
pub struct ServiceCalendar {
    pub service_id: String,
    /// Active weekdays, indexed Monday..Sunday.
    pub active_days: [bool; 7],
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl ServiceCalendar {
    /// Whether this service runs on the given date.
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        if date < self.start_date || date > self.end_date {
            return false;
        }
        self.active_days[weekday_index(date.weekday())]
    }
}

/// Monday-first index of a weekday, matching the calendar file column order.
pub(crate) fn weekday_index(day: Weekday) -> usize {
    day.num_days_from_monday() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_standard_time() {
        assert_eq!(GtfsTime::parse("00:00:00").unwrap().secs(), 0);
        assert_eq!(GtfsTime::parse("10:05:30").unwrap().secs(), 36330);
        assert_eq!(GtfsTime::parse("23:59:59").unwrap().secs(), 86399);
    }

    #[test]
    fn parse_past_midnight() {
        assert_eq!(GtfsTime::parse("24:00:00").unwrap().secs(), 86400);
        assert_eq!(GtfsTime::parse("25:04:00").unwrap().secs(), 90240);
    }

    #[test]
    fn parse_trims_whitespace() {
        assert_eq!(GtfsTime::parse(" 10:00:00 ").unwrap().secs(), 36000);
    }

    #[test]
    fn reject_malformed() {
        assert!(GtfsTime::parse("").is_err());
        assert!(GtfsTime::parse("10:00").is_err());
        assert!(GtfsTime::parse("10:00:00:00").is_err());
        assert!(GtfsTime::parse("10:61:00").is_err());
        assert!(GtfsTime::parse("10:00:61").is_err());
        assert!(GtfsTime::parse("aa:00:00").is_err());
        assert!(GtfsTime::parse("-1:00:00").is_err());
    }

    #[test]
    fn display_roundtrip() {
        for s in ["00:00:00", "09:05:03", "25:04:00"] {
            assert_eq!(GtfsTime::parse(s).unwrap().to_string(), s);
        }
    }

    #[test]
    fn minutes_until() {
        let a = GtfsTime::parse("10:00:00").unwrap();
        let b = GtfsTime::parse("10:05:30").unwrap();
        assert_eq!(a.minutes_until(b), 5);
    }

    #[test]
    fn calendar_weekday_pattern() {
        let cal = ServiceCalendar {
            service_id: "WK".into(),
            active_days: [true, true, true, true, true, false, false],
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        };

        // 2024-03-15 is a Friday, 2024-03-16 a Saturday
        assert!(cal.is_active_on(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()));
        assert!(!cal.is_active_on(NaiveDate::from_ymd_opt(2024, 3, 16).unwrap()));
    }

    #[test]
    fn calendar_date_range() {
        let cal = ServiceCalendar {
            service_id: "WK".into(),
            active_days: [true; 7],
            start_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        };

        assert!(!cal.is_active_on(NaiveDate::from_ymd_opt(2024, 5, 31).unwrap()));
        assert!(cal.is_active_on(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()));
        assert!(cal.is_active_on(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()));
        assert!(!cal.is_active_on(NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()));
    }
}
