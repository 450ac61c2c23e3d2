//! Error types for the thermoflow service.

use std::io;
use thiserror::Error;

/// Main error type for ingestion, reload and configuration operations.
///
/// An unknown city is deliberately not part of this taxonomy: queries
/// for unpopulated cities return an empty result, never an error.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// A source row failed field-level parsing. Recoverable: the row is
    /// skipped and counted, ingestion continues.
    #[error("Malformed record: invalid {field}: {value:?}")]
    MalformedRecord {
        /// The field that failed to parse
        field: &'static str,
        /// The raw offending value
        value: String,
    },

    /// Failed to open or read the source stream. Fatal for the current
    /// reload; the previously committed aggregate stays in place.
    #[error("Ingestion IO error: {0}")]
    Io(#[from] io::Error),

    /// A reload was requested while another one is in flight.
    #[error("Reload already in progress")]
    ReloadInProgress,

    /// The chunk queue closed before the source was drained.
    #[error("Chunk queue closed")]
    QueueClosed,

    /// Configuration validation failed.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with ServiceError
pub type ServiceResult<T> = Result<T, ServiceError>;
