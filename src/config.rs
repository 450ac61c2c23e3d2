//! Configuration for the ingestion pipeline and query cache.

use serde::{Deserialize, Serialize};

use crate::error::{ServiceError, ServiceResult};

/// Default number of rows per ingestion chunk
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

/// Default number of concurrent ingestion workers
pub const DEFAULT_POOL_SIZE: usize = 4;

/// Default number of chunks buffered between the reader and the workers
pub const DEFAULT_QUEUE_CAPACITY: usize = 8;

/// Default number of memoised per-city query results
pub const DEFAULT_CACHE_CAPACITY: usize = 1_024;

/// Tuning knobs for one ingestion run.
///
/// Peak memory of a run is bounded by roughly
/// `chunk_size * (queue_capacity + pool_size)` rows, independent of the
/// size of the source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Rows per chunk handed to a single worker
    pub chunk_size: usize,

    /// Number of concurrent worker threads
    pub pool_size: usize,

    /// Maximum chunks buffered between reader and workers; the reader
    /// blocks once this bound is reached (backpressure)
    pub queue_capacity: usize,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            pool_size: DEFAULT_POOL_SIZE,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl IngestionConfig {
    /// Check the configuration for values the pipeline cannot run with.
    pub fn validate(&self) -> ServiceResult<()> {
        if self.chunk_size == 0 {
            return Err(ServiceError::Configuration(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.pool_size == 0 {
            return Err(ServiceError::Configuration(
                "pool_size must be greater than zero".to_string(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(ServiceError::Configuration(
                "queue_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Query cache sizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of per-city entries kept in the memo table
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl CacheConfig {
    /// Check the configuration for values the cache cannot run with.
    pub fn validate(&self) -> ServiceResult<()> {
        if self.capacity == 0 {
            return Err(ServiceError::Configuration(
                "cache capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
