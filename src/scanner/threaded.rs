//! Fork-join scan over a fixed worker pool.

use std::ops::Range;

use rayon::prelude::*;

use crate::space::{AddressSpace, BitVector};
use crate::{Error, Result};

/// Thread-parallel scan.
///
/// The index range `[0, sample)` is split into at most `threads`
/// contiguous, disjoint shards when the scanner is built, and a dedicated
/// rayon pool of exactly `threads` workers is created once and reused for
/// every call. Each call forks one scan task per shard, joins them all, and
/// returns the shard results concatenated in shard order. Concatenation is
/// already the union (shards never overlap) and keeps the indices globally
/// ascending (each shard emits them ascending).
///
/// Workers only read the address space; no locking is needed inside a call.
pub struct ThreadedScanner {
    pool: rayon::ThreadPool,
    shards: Vec<Range<usize>>,
    threads: usize,
}

impl ThreadedScanner {
    /// Build a pool of `threads` workers sharded over `sample` locations.
    ///
    /// Fails with `InvalidArgument` for `threads == 0` and with
    /// `ResourceExhausted` if the OS refuses the worker threads.
    pub fn new(sample: usize, threads: usize) -> Result<Self> {
        if threads == 0 {
            return Err(Error::InvalidArgument(
                "thread count must be at least 1".into(),
            ));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| Error::ResourceExhausted(format!("worker pool: {e}")))?;

        let chunk = (sample + threads - 1) / threads;
        let mut shards = Vec::with_capacity(threads);
        let mut start = 0;
        while start < sample {
            let end = (start + chunk).min(sample);
            shards.push(start..end);
            start = end;
        }

        Ok(Self {
            pool,
            shards,
            threads,
        })
    }

    /// Worker count the pool was built with.
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Indices of locations within `radius` of `query`, ascending.
    pub fn activate(&self, space: &AddressSpace, query: &BitVector, radius: usize) -> Vec<u32> {
        let addresses = space.addresses();
        self.pool.install(|| {
            self.shards
                .par_iter()
                .flat_map_iter(|shard| {
                    shard
                        .clone()
                        .filter(|&i| query.distance(&addresses[i]) as usize <= radius)
                        .map(|i| i as u32)
                })
                .collect()
        })
    }
}
