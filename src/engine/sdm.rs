//! Engine construction and the write family.

use crate::config::WRITE_DELTA;
use crate::counters::CounterStore;
use crate::scanner::{LinearScanner, Scanner, ScannerKind, ThreadedScanner};
use crate::space::{AddressSpace, BitVector};
use crate::{Error, Result};

/// A sparse distributed memory over a borrowed address space and counter
/// store.
///
/// The scan backend is chosen by the constructor and never changes.
/// Dropping the engine releases only backend-owned resources (worker pool,
/// device context); the address space and counter store belong to the
/// caller and outlive it.
///
/// Write operations take `&mut self`: the single-writer contract over
/// counter rows is enforced by the borrow checker instead of a runtime
/// convention. Read operations take `&self`.
pub struct Engine<'a> {
    pub(crate) space: &'a AddressSpace,
    pub(crate) counters: &'a mut CounterStore,
    scanner: Scanner,
    bits: usize,
    sample: usize,
}

impl<'a> Engine<'a> {
    /// Engine with the sequential reference scanner.
    pub fn linear(space: &'a AddressSpace, counters: &'a mut CounterStore) -> Result<Self> {
        let (sample, bits) = check_geometry(space, counters)?;
        tracing::debug!(sample, bits, "linear scan engine ready");
        Ok(Self {
            space,
            counters,
            scanner: Scanner::Linear(LinearScanner::new()),
            bits,
            sample,
        })
    }

    /// Engine with a fork-join scanner over `threads` dedicated workers.
    pub fn threaded(
        space: &'a AddressSpace,
        counters: &'a mut CounterStore,
        threads: usize,
    ) -> Result<Self> {
        let (sample, bits) = check_geometry(space, counters)?;
        let scanner = ThreadedScanner::new(sample, threads)?;
        tracing::debug!(sample, bits, threads, "threaded scan engine ready");
        Ok(Self {
            space,
            counters,
            scanner: Scanner::Threaded(scanner),
            bits,
            sample,
        })
    }

    /// Engine with an OpenCL-offloaded scanner compiled from `kernel_src`
    /// (see [`crate::scanner::opencl::KERNEL_SRC`] for the expected kernel
    /// shape).
    #[cfg(feature = "opencl")]
    pub fn accelerated(
        space: &'a AddressSpace,
        counters: &'a mut CounterStore,
        kernel_src: &str,
    ) -> Result<Self> {
        let (sample, bits) = check_geometry(space, counters)?;
        let scanner = crate::scanner::OpenClScanner::new(space, kernel_src)?;
        tracing::debug!(sample, bits, "accelerated scan engine ready");
        Ok(Self {
            space,
            counters,
            scanner: Scanner::Accelerated(scanner),
            bits,
            sample,
        })
    }

    /// Built without the `opencl` feature: the accelerated backend is
    /// always unavailable.
    #[cfg(not(feature = "opencl"))]
    pub fn accelerated(
        _space: &'a AddressSpace,
        _counters: &'a mut CounterStore,
        _kernel_src: &str,
    ) -> Result<Self> {
        Err(Error::BackendUnavailable(
            "kanerva was built without the `opencl` feature".into(),
        ))
    }

    /// Address/datum width this engine was built for.
    pub fn bits(&self) -> usize {
        self.bits
    }

    /// Number of hard locations.
    pub fn sample(&self) -> usize {
        self.sample
    }

    /// Which scan backend this engine runs on.
    pub fn scanner_kind(&self) -> ScannerKind {
        self.scanner.kind()
    }

    /// Worker count of the threaded backend; `None` for the others.
    pub fn thread_count(&self) -> Option<usize> {
        match &self.scanner {
            Scanner::Threaded(s) => Some(s.threads()),
            _ => None,
        }
    }

    // ── validation ──────────────────────────────────────────────

    pub(crate) fn check_width(&self, v: &BitVector) -> Result<()> {
        if v.bits() != self.bits {
            return Err(Error::WidthMismatch {
                expected: self.bits,
                got: v.bits(),
            });
        }
        Ok(())
    }

    pub(crate) fn check_radius(&self, radius: usize) -> Result<()> {
        if radius > self.bits {
            return Err(Error::RadiusOutOfRange {
                radius,
                bits: self.bits,
            });
        }
        Ok(())
    }

    fn check_table(&self, weights_len: usize) -> Result<()> {
        if weights_len != self.sample {
            return Err(Error::WeightTableMismatch {
                expected: self.sample,
                got: weights_len,
            });
        }
        Ok(())
    }

    /// Validated activation: the index set every operation is built on.
    pub(crate) fn activate(&self, addr: &BitVector, radius: usize) -> Result<Vec<u32>> {
        self.check_width(addr)?;
        self.check_radius(radius)?;
        self.scanner.activate(self.space, addr, radius)
    }

    // ── write family ────────────────────────────────────────────

    /// Store `datum` at every location within `radius` of `addr`:
    /// counter +1 where the datum bit is 1, −1 where it is 0 (saturating).
    ///
    /// An empty activation set is not an error: the counters are untouched
    /// and the call reports 0 activated locations.
    pub fn write(&mut self, addr: &BitVector, radius: usize, datum: &BitVector) -> Result<usize> {
        self.write_bitwise(addr, radius, datum, i64::from(WRITE_DELTA))
    }

    /// Exact inverse of [`Engine::write`]: −1 where the datum bit is 1,
    /// +1 where it is 0. Writing then subtracting the same
    /// `(addr, radius, datum)` restores the prior counter state unless
    /// saturation clipped an intermediate value, which is not reversible.
    pub fn write_sub(
        &mut self,
        addr: &BitVector,
        radius: usize,
        datum: &BitVector,
    ) -> Result<usize> {
        self.write_bitwise(addr, radius, datum, -i64::from(WRITE_DELTA))
    }

    /// Word-strided variant of [`Engine::write`]: walks the datum one
    /// storage word at a time and derives ±1 arithmetically instead of
    /// branching per bit. The resulting counter state is identical.
    pub fn write2(&mut self, addr: &BitVector, radius: usize, datum: &BitVector) -> Result<usize> {
        self.write_word_strided(addr, radius, datum, |_| i64::from(WRITE_DELTA))
    }

    /// [`Engine::write2`] with every delta scaled by one scalar `weight`.
    /// A negative weight turns the write into a weighted forget.
    pub fn write2_weighted(
        &mut self,
        addr: &BitVector,
        radius: usize,
        datum: &BitVector,
        weight: i32,
    ) -> Result<usize> {
        self.write_word_strided(addr, radius, datum, |_| i64::from(weight))
    }

    /// [`Engine::write2`] with per-location deltas drawn from `weights`,
    /// indexed by hard-location id. The table must have one entry per
    /// location.
    pub fn write2_weighted_table(
        &mut self,
        addr: &BitVector,
        radius: usize,
        datum: &BitVector,
        weights: &[i32],
    ) -> Result<usize> {
        self.check_table(weights.len())?;
        self.write_word_strided(addr, radius, datum, |loc| i64::from(weights[loc]))
    }

    /// Zero the counter row of hard location `index`. The address itself
    /// and every other row are untouched.
    pub fn reset_hard_location(&mut self, index: usize) -> Result<()> {
        if index >= self.sample {
            return Err(Error::LocationOutOfRange {
                index,
                sample: self.sample,
            });
        }
        self.counters.reset_row(index);
        Ok(())
    }

    // Per-bit loop; `delta` already carries the write sign.
    fn write_bitwise(
        &mut self,
        addr: &BitVector,
        radius: usize,
        datum: &BitVector,
        delta: i64,
    ) -> Result<usize> {
        self.check_width(datum)?;
        let active = self.activate(addr, radius)?;
        for &loc in &active {
            let loc = loc as usize;
            for bit in 0..self.bits {
                let d = if datum.get_bit(bit) { delta } else { -delta };
                self.counters.increment(loc, bit, d);
            }
        }
        Ok(active.len())
    }

    // Word-at-a-time loop: delta = (bit * 2 − 1) · weight, no branch on the
    // datum bit.
    fn write_word_strided(
        &mut self,
        addr: &BitVector,
        radius: usize,
        datum: &BitVector,
        weight_of: impl Fn(usize) -> i64,
    ) -> Result<usize> {
        self.check_width(datum)?;
        let active = self.activate(addr, radius)?;
        for &loc in &active {
            let loc = loc as usize;
            let w = weight_of(loc);
            let mut bit = 0;
            for &word in datum.words() {
                let span = (self.bits - bit).min(crate::space::bitvec::WORD_BITS);
                let mut word = word;
                for _ in 0..span {
                    let sign = ((word & 1) as i64) * 2 - 1;
                    self.counters.increment(loc, bit, sign * w);
                    word >>= 1;
                    bit += 1;
                }
            }
        }
        Ok(active.len())
    }
}

fn check_geometry(space: &AddressSpace, counters: &CounterStore) -> Result<(usize, usize)> {
    if counters.locations() != space.len() || counters.width() != space.bits() {
        return Err(Error::GeometryMismatch {
            rows: counters.locations(),
            cols: counters.width(),
            sample: space.len(),
            bits: space.bits(),
        });
    }
    Ok((space.len(), space.bits()))
}
