//! # Thermoflow
//!
//! Streaming, concurrent aggregation of `city;timestamp;temperature`
//! readings with a cached per-city yearly-averages query layer.
//!
//! The pipeline reads the source file in bounded chunks, folds each
//! chunk into a worker-private partial aggregate and merges partials
//! into a shared [`store::AggregateStore`]. A
//! [`reload::ReloadCoordinator`] rebuilds the whole aggregate into a
//! fresh store and swaps it in atomically, after which the
//! [`query::TemperatureService`] memo table is invalidated wholesale.

pub mod api;
pub mod config;
pub mod error;
pub mod ingest;
pub mod models;
pub mod query;
pub mod reload;
pub mod store;

pub use config::{CacheConfig, IngestionConfig};
pub use error::{ServiceError, ServiceResult};
pub use ingest::{Chunk, ChunkSource, IngestionReport, WorkerPool};
pub use models::{CityAggregates, Reading, YearAggregate, YearlyAverage};
pub use query::{TemperatureService, YearlyAverages};
pub use reload::{ReloadCoordinator, ReloadObserver, ReloadState, ReloadSummary};
pub use store::{AggregateStore, StoreHandle};
