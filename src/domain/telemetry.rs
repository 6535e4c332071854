// Telemetry data domain models
use crate::domain::error::DashboardError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;

/// Sensor id used when the deployment has a single implicit sensor.
pub const IMPLICIT_SENSOR_ID: &str = "main";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Deployment {
    /// One monitor; readings carry no sensor id.
    #[default]
    Single,
    /// Calibration bench; every reading names its sensor.
    Multi,
}

impl Deployment {
    /// Per-sensor visibility only exists on the multi-sensor view.
    pub fn visibility_applies(&self) -> bool {
        matches!(self, Deployment::Multi)
    }
}

/// A single observation. A missing or non-finite value means "no reading".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimePoint {
    pub timestamp: DateTime<Utc>,
    pub value: Option<f64>,
}

impl TimePoint {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self::from_reading(timestamp, Some(value))
    }

    pub fn from_reading(timestamp: DateTime<Utc>, value: Option<f64>) -> Self {
        Self {
            timestamp,
            value: value.filter(|v| v.is_finite()),
        }
    }

    pub fn has_reading(&self) -> bool {
        self.value.is_some()
    }
}

/// A point as delivered by a bulk fetch, still tagged with its sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub sensor_id: Option<String>,
    pub point: TimePoint,
}

impl SensorReading {
    pub fn new(sensor_id: Option<String>, point: TimePoint) -> Self {
        Self { sensor_id, point }
    }
}

/// Headline numbers shown next to the chart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryStats {
    pub current: Option<TimePoint>,
    pub daily_avg: Option<f64>,
    pub daily_count: Option<u64>,
    pub period_avg: Option<f64>,
    pub period_count: Option<u64>,
}

/// Result of the startup bulk fetch.
#[derive(Debug, Clone, Default)]
pub struct PreloadBatch {
    pub readings: Vec<SensorReading>,
    pub summary: Option<SummaryStats>,
}

/// Inclusive range of calendar days, matched against the day of each reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DashboardError> {
        if start > end {
            return Err(DashboardError::InvalidRange(format!(
                "start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse `YYYY-MM-DD` bounds as entered in the filter form.
    pub fn parse(start: &str, end: &str) -> Result<Self, DashboardError> {
        let parse_day = |raw: &str| {
            NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map_err(|e| DashboardError::InvalidRange(format!("{:?}: {}", raw, e)))
        };
        Self::new(parse_day(start)?, parse_day(end)?)
    }

    pub fn contains(&self, timestamp: &DateTime<Utc>) -> bool {
        let day = timestamp.date_naive();
        day >= self.start && day <= self.end
    }
}

/// Parse a timestamp as sent by the backend or the push channel.
///
/// Accepts RFC 3339, RFC 2822 (the HTTP-date form Flask uses when it
/// serializes datetimes) and naive ISO timestamps, which are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DashboardError> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_rfc2822(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    Err(DashboardError::InvalidPoint(format!(
        "unparseable timestamp {:?}",
        raw
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_non_finite_value_is_no_reading() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(TimePoint::new(ts, f64::NAN).value, None);
        assert_eq!(TimePoint::new(ts, f64::INFINITY).value, None);
        assert_eq!(TimePoint::new(ts, 21.5).value, Some(21.5));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 15, 0, 0).unwrap();

        assert_eq!(parse_timestamp("2024-03-01T12:00:00-03:00").unwrap(), expected);
        assert_eq!(parse_timestamp("Fri, 01 Mar 2024 15:00:00 GMT").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-03-01T15:00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-03-01 15:00:00.000").unwrap(), expected);
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(DashboardError::InvalidPoint(_))
        ));
    }

    #[test]
    fn test_date_range() {
        let range = DateRange::parse("2024-03-01", "2024-03-02").unwrap();
        assert!(range.contains(&Utc.with_ymd_and_hms(2024, 3, 2, 23, 59, 59).unwrap()));
        assert!(!range.contains(&Utc.with_ymd_and_hms(2024, 3, 3, 0, 0, 0).unwrap()));

        assert!(matches!(
            DateRange::parse("2024-03-02", "2024-03-01"),
            Err(DashboardError::InvalidRange(_))
        ));
        assert!(DateRange::parse("03/01/2024", "2024-03-02").is_err());
    }
}
