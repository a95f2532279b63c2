//! Opt-in data parallelism for per-sample work
//!
//! The pipeline runs single-threaded unless a caller enables this. Only work
//! whose result is independent of scheduling goes through here, so enabling
//! it never changes output.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Parallel processing configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParallelConfig {
    /// Enable parallel processing
    pub enabled: bool,
    /// Inputs shorter than this are processed sequentially
    pub min_chunk_size: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_chunk_size: 256,
        }
    }
}

impl ParallelConfig {
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_min_chunk_size(mut self, min_chunk_size: usize) -> Self {
        self.min_chunk_size = min_chunk_size.max(1);
        self
    }

    fn should_parallelize(&self, len: usize) -> bool {
        self.enabled && len >= self.min_chunk_size
    }
}

/// Map over a slice, in parallel when the configuration allows. Output order
/// always matches input order.
pub fn parallel_map<T, U, F>(config: &ParallelConfig, data: &[T], f: F) -> Vec<U>
where
    T: Sync,
    U: Send,
    F: Fn(&T) -> U + Sync + Send,
{
    if !config.should_parallelize(data.len()) {
        return data.iter().map(f).collect();
    }

    data.par_iter()
        .with_min_len(config.min_chunk_size)
        .map(f)
        .collect()
}
