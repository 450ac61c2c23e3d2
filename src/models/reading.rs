//! One reading from the source file.

use chrono::{Datelike, NaiveDateTime};

/// A single parsed source row.
///
/// Transient: produced by the record parser, folded into an aggregate
/// immediately, never stored. The city is already normalised (trimmed,
/// lowercase) and may be empty; empty-city readings contribute nothing
/// to the aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// Normalised city name
    pub city: String,
    /// Measurement time, millisecond precision
    pub timestamp: NaiveDateTime,
    /// Measured temperature
    pub temperature: f64,
}

impl Reading {
    /// Calendar year the reading is aggregated under.
    pub fn year(&self) -> i32 {
        self.timestamp.year()
    }
}
