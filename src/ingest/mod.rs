//! Streaming ingestion pipeline: parse, chunk, fold and merge.

pub mod chunker;
pub mod parser;
pub mod pool;

pub use chunker::{Chunk, ChunkSource};
pub use parser::parse_line;
pub use pool::{IngestionReport, WorkerPool};
