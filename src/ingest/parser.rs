//! Record parser: one raw delimited line into a [`Reading`].

use chrono::NaiveDateTime;

use crate::error::{ServiceError, ServiceResult};
use crate::models::Reading;

/// Field separator of the source format
pub const FIELD_DELIMITER: char = ';';

/// Fixed timestamp pattern of the source format
/// (`yyyy-MM-dd HH:mm:ss.SSS`)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Parse one `city;timestamp;temperature` line.
///
/// The city is trimmed and lowercased; a blank city is not an error,
/// the fold step skips such readings. A missing field, a timestamp that
/// does not match [`TIMESTAMP_FORMAT`] or a non-numeric temperature is
/// a `MalformedRecord` naming the offending field, and the caller skips
/// the row rather than aborting the run.
pub fn parse_line(line: &str) -> ServiceResult<Reading> {
    let mut fields = line.splitn(3, FIELD_DELIMITER);

    let city = fields.next().unwrap_or_default().trim().to_lowercase();
    let raw_timestamp = fields
        .next()
        .ok_or_else(|| malformed("timestamp", line))?;
    let raw_temperature = fields
        .next()
        .ok_or_else(|| malformed("temperature", line))?;

    let timestamp = NaiveDateTime::parse_from_str(raw_timestamp.trim(), TIMESTAMP_FORMAT)
        .map_err(|_| malformed("timestamp", raw_timestamp))?;
    let temperature: f64 = raw_temperature
        .trim()
        .parse()
        .map_err(|_| malformed("temperature", raw_temperature))?;

    Ok(Reading {
        city,
        timestamp,
        temperature,
    })
}

fn malformed(field: &'static str, value: &str) -> ServiceError {
    ServiceError::MalformedRecord {
        field,
        value: value.trim().to_string(),
    }
}
