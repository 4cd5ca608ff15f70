//! Sequential reference scan.

use crate::space::{AddressSpace, BitVector};

/// Single-threaded scan over all hard locations, O(sample) per call.
///
/// This is the reference implementation: the threaded and accelerated
/// backends are required to return set-equal results for every input.
#[derive(Clone, Copy, Debug, Default)]
pub struct LinearScanner;

impl LinearScanner {
    pub fn new() -> Self {
        Self
    }

    /// Indices of locations within `radius` of `query`, ascending.
    pub fn activate(&self, space: &AddressSpace, query: &BitVector, radius: usize) -> Vec<u32> {
        space
            .iter()
            .enumerate()
            .filter(|(_, addr)| query.distance(addr) as usize <= radius)
            .map(|(i, _)| i as u32)
            .collect()
    }
}
