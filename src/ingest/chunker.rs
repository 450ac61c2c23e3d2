//! Chunk source: sequential grouping of raw source lines into bounded
//! batches.

use std::io::BufRead;

use crate::error::ServiceResult;

/// A bounded batch of consecutive raw source lines, in file order.
pub type Chunk = Vec<String>;

/// Reads the underlying stream strictly sequentially and hands out
/// chunks of at most `chunk_size` lines. Memory use is O(chunk size),
/// independent of the stream length.
pub struct ChunkSource<R> {
    reader: R,
    chunk_size: usize,
    exhausted: bool,
}

impl<R: BufRead> ChunkSource<R> {
    /// Wrap a buffered reader. `chunk_size` must be non-zero (enforced
    /// by [`IngestionConfig::validate`](crate::config::IngestionConfig)).
    pub fn new(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            chunk_size,
            exhausted: false,
        }
    }

    /// Read the next chunk, preserving line order within it. The final
    /// chunk may be shorter; `None` signals end of input. Any read
    /// failure is fatal for the whole run.
    pub fn next_chunk(&mut self) -> ServiceResult<Option<Chunk>> {
        if self.exhausted {
            return Ok(None);
        }

        let mut chunk = Vec::with_capacity(self.chunk_size);
        while chunk.len() < self.chunk_size {
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                self.exhausted = true;
                break;
            }
            while line.ends_with('\n') || line.ends_with('\r') {
                line.pop();
            }
            chunk.push(line);
        }

        if chunk.is_empty() {
            Ok(None)
        } else {
            Ok(Some(chunk))
        }
    }
}
