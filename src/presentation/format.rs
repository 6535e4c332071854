// Display formatting for readings and timestamps
use chrono::{DateTime, Local, Utc};

const PLACEHOLDER: &str = "--";

/// "23.4 °C", or a placeholder when the sensor reported nothing.
pub fn fmt_temperature(value: Option<f64>, fraction_digits: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.*} °C", fraction_digits, v),
        _ => PLACEHOLDER.to_string(),
    }
}

pub fn fmt_timestamp(timestamp: Option<DateTime<Utc>>) -> String {
    match timestamp {
        Some(ts) => ts.with_timezone(&Local).format("%d/%m/%Y %H:%M:%S").to_string(),
        None => PLACEHOLDER.to_string(),
    }
}

pub fn fmt_count(count: Option<u64>) -> String {
    count.map_or_else(|| PLACEHOLDER.to_string(), |c| c.to_string())
}
