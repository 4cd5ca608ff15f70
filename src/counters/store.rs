//! The `sample × bits` saturating accumulator array.

use ndarray::{Array2, ArrayView1, ArrayViewMut1};
use serde::{Deserialize, Serialize};

use crate::config::{COUNTER_MAX, COUNTER_MIN};

/// Saturating i16 counters, one row per hard location, one column per bit.
///
/// Deltas clamp to the symmetric range
/// `[COUNTER_MIN, COUNTER_MAX] = [-32767, 32767]`. Every delta passes
/// through `i64` before the clamp, so arbitrarily large caller weights
/// saturate instead of wrapping. The store is caller-owned: the engine only
/// ever mutates rows in place and never replaces or resizes the array.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CounterStore {
    cells: Array2<i16>,
}

impl CounterStore {
    /// Zero-initialized store for `sample` locations of `bits` counters.
    pub fn new(sample: usize, bits: usize) -> Self {
        Self {
            cells: Array2::zeros((sample, bits)),
        }
    }

    /// Number of location rows.
    pub fn locations(&self) -> usize {
        self.cells.nrows()
    }

    /// Counters per row.
    pub fn width(&self) -> usize {
        self.cells.ncols()
    }

    /// Current value of one counter.
    pub fn get(&self, location: usize, bit: usize) -> i16 {
        self.cells[[location, bit]]
    }

    /// Add `delta` to one counter, clamping at the rails.
    #[inline]
    pub fn increment(&mut self, location: usize, bit: usize, delta: i64) {
        let cell = &mut self.cells[[location, bit]];
        *cell = (*cell as i64 + delta)
            .clamp(COUNTER_MIN as i64, COUNTER_MAX as i64) as i16;
    }

    /// One location's counter row.
    pub fn row(&self, location: usize) -> ArrayView1<'_, i16> {
        self.cells.row(location)
    }

    /// Mutable view of one location's counter row.
    pub fn row_mut(&mut self, location: usize) -> ArrayViewMut1<'_, i16> {
        self.cells.row_mut(location)
    }

    /// Zero every counter in one row, leaving all other rows untouched.
    pub fn reset_row(&mut self, location: usize) {
        self.cells.row_mut(location).fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_zeroed() {
        let store = CounterStore::new(4, 16);
        assert_eq!(store.locations(), 4);
        assert_eq!(store.width(), 16);
        assert!(store.row(2).iter().all(|&c| c == 0));
    }

    #[test]
    fn test_increment_accumulates() {
        let mut store = CounterStore::new(2, 4);
        store.increment(1, 3, 5);
        store.increment(1, 3, -2);
        assert_eq!(store.get(1, 3), 3);
        assert_eq!(store.get(0, 3), 0);
    }

    #[test]
    fn test_saturation_high_rail() {
        let mut store = CounterStore::new(1, 1);
        store.increment(0, 0, COUNTER_MAX as i64);
        store.increment(0, 0, 10);
        assert_eq!(store.get(0, 0), COUNTER_MAX);
    }

    #[test]
    fn test_saturation_low_rail() {
        let mut store = CounterStore::new(1, 1);
        store.increment(0, 0, i64::MIN);
        assert_eq!(store.get(0, 0), COUNTER_MIN);
    }

    #[test]
    fn test_large_delta_clamps_not_wraps() {
        let mut store = CounterStore::new(1, 1);
        store.increment(0, 0, i64::MAX);
        assert_eq!(store.get(0, 0), COUNTER_MAX);
    }

    #[test]
    fn test_reset_row_is_row_local() {
        let mut store = CounterStore::new(3, 4);
        for loc in 0..3 {
            for bit in 0..4 {
                store.increment(loc, bit, (loc as i64 + 1) * 10 + bit as i64);
            }
        }
        let row0: Vec<i16> = store.row(0).to_vec();
        let row2: Vec<i16> = store.row(2).to_vec();
        store.reset_row(1);
        assert!(store.row(1).iter().all(|&c| c == 0));
        assert_eq!(store.row(0).to_vec(), row0);
        assert_eq!(store.row(2).to_vec(), row2);
    }
}
