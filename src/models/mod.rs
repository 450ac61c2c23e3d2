//! Data model shared across the pipeline, store and query layers.

pub mod aggregate;
pub mod reading;

pub use aggregate::{CityAggregates, YearAggregate, YearlyAverage};
pub use reading::Reading;
