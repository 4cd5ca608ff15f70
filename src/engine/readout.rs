//! The read family: hard, raw, weighted, soft, and iterative readout.

use ndarray::Array1;

use crate::space::BitVector;
use crate::{Engine, Error, Result};

/// Result of a thresholded read.
///
/// `activated == 0` means the query matched no hard location: the vector is
/// all-zero and flagged "no match", which is distinct from a genuine
/// all-zero datum read out of a non-empty activation set.
#[derive(Clone, Debug)]
pub struct ReadOutput {
    /// Recovered bit-vector.
    pub vector: BitVector,
    /// Number of hard locations the query activated.
    pub activated: usize,
}

impl ReadOutput {
    /// True when at least one hard location contributed.
    pub fn is_match(&self) -> bool {
        self.activated > 0
    }
}

/// Result of an unthresholded read: the raw per-bit counter sums.
#[derive(Clone, Debug)]
pub struct CounterOutput {
    /// Per-bit sum of counters over the activation set.
    pub sums: Array1<i64>,
    /// Number of hard locations the query activated.
    pub activated: usize,
}

impl CounterOutput {
    /// True when at least one hard location contributed.
    pub fn is_match(&self) -> bool {
        self.activated > 0
    }
}

/// Result of an iterative read.
#[derive(Clone, Debug)]
pub struct IterReadOutput {
    /// Last computed read result.
    pub vector: BitVector,
    /// Read iterations actually performed (≥ 1).
    pub iterations: usize,
    /// True when two consecutive results were bit-identical; false when the
    /// iteration cap stopped the loop first.
    pub converged: bool,
    /// Activation count of the final iteration.
    pub activated: usize,
}

impl<'a> Engine<'a> {
    /// Recover the bit-vector stored around `addr`: per output bit, sum the
    /// counters of every activated location and emit 1 iff the sum is
    /// strictly positive. A tie at exactly 0 resolves to 0.
    pub fn read(&self, addr: &BitVector, radius: usize) -> Result<ReadOutput> {
        let active = self.activate(addr, radius)?;
        Ok(self.threshold_sums(&active))
    }

    /// The raw summed counter vector behind [`Engine::read`],
    /// unthresholded, for inspection or custom post-processing.
    pub fn read_counter(&self, addr: &BitVector, radius: usize) -> Result<CounterOutput> {
        let active = self.activate(addr, radius)?;
        Ok(CounterOutput {
            sums: self.sum_rows(&active),
            activated: active.len(),
        })
    }

    /// [`Engine::read`] with each location's counter row scaled by
    /// `weights[location]` before summation. The table must have one entry
    /// per hard location.
    pub fn weighted_read(
        &self,
        addr: &BitVector,
        radius: usize,
        weights: &[f64],
    ) -> Result<ReadOutput> {
        if weights.len() != self.sample() {
            return Err(Error::WeightTableMismatch {
                expected: self.sample(),
                got: weights.len(),
            });
        }
        let active = self.activate(addr, radius)?;
        let bits = self.bits();
        let mut sums = vec![0.0f64; bits];
        for &loc in &active {
            let w = weights[loc as usize];
            let row = self.counters.row(loc as usize);
            for (s, &c) in sums.iter_mut().zip(row.iter()) {
                *s += w * c as f64;
            }
        }
        Ok(ReadOutput {
            vector: threshold_f64(&sums, bits),
            activated: active.len(),
        })
    }

    /// Soft read: each activated location contributes `tanh(z · counter)`
    /// per bit, and the output bit is 1 iff the contribution sum is
    /// positive.
    ///
    /// `z` trades linear aggregation for per-location voting: as `z → 0⁺`
    /// the contributions are proportional to the counters and the result
    /// approaches [`Engine::read`]; for large `z` every location casts a
    /// saturated ±1 sign vote. `z = 0` degenerates to an all-zero output.
    pub fn generic_read(&self, addr: &BitVector, radius: usize, z: f64) -> Result<ReadOutput> {
        let active = self.activate(addr, radius)?;
        let bits = self.bits();
        let mut sums = vec![0.0f64; bits];
        for &loc in &active {
            let row = self.counters.row(loc as usize);
            for (s, &c) in sums.iter_mut().zip(row.iter()) {
                *s += (z * c as f64).tanh();
            }
        }
        Ok(ReadOutput {
            vector: threshold_f64(&sums, bits),
            activated: active.len(),
        })
    }

    /// Auto-associative clean-up: read, feed the result back as the next
    /// query, and repeat until two consecutive results are bit-identical or
    /// `max_iter` reads have run. The cap is the only bound; there is no
    /// timeout.
    pub fn iter_read(
        &self,
        addr: &BitVector,
        radius: usize,
        max_iter: usize,
    ) -> Result<IterReadOutput> {
        if max_iter == 0 {
            return Err(Error::InvalidArgument(
                "iter_read needs at least one iteration".into(),
            ));
        }
        self.check_width(addr)?;
        self.check_radius(radius)?;

        let mut query = addr.clone();
        let mut prev: Option<BitVector> = None;
        let mut activated = 0;
        let mut iterations = 0;
        let mut converged = false;

        while iterations < max_iter {
            let active = self.activate(&query, radius)?;
            let out = self.threshold_sums(&active);
            iterations += 1;
            activated = out.activated;
            tracing::trace!(iterations, activated, "iter_read step");

            if prev.as_ref() == Some(&out.vector) {
                converged = true;
                prev = Some(out.vector);
                break;
            }
            query = out.vector.clone();
            prev = Some(out.vector);
        }

        Ok(IterReadOutput {
            vector: prev.expect("at least one iteration ran"),
            iterations,
            converged,
            activated,
        })
    }

    // Sum counter rows over the activation set into one i64 vector.
    fn sum_rows(&self, active: &[u32]) -> Array1<i64> {
        let mut sums = Array1::<i64>::zeros(self.bits());
        for &loc in active {
            let row = self.counters.row(loc as usize);
            for (s, &c) in sums.iter_mut().zip(row.iter()) {
                *s += c as i64;
            }
        }
        sums
    }

    fn threshold_sums(&self, active: &[u32]) -> ReadOutput {
        let sums = self.sum_rows(active);
        let mut vector = BitVector::zeros(self.bits());
        for (bit, &s) in sums.iter().enumerate() {
            if s > 0 {
                vector.set_bit(bit, true);
            }
        }
        ReadOutput {
            vector,
            activated: active.len(),
        }
    }
}

fn threshold_f64(sums: &[f64], bits: usize) -> BitVector {
    let mut vector = BitVector::zeros(bits);
    for (bit, &s) in sums.iter().enumerate() {
        if s > 0.0 {
            vector.set_bit(bit, true);
        }
    }
    vector
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counters::CounterStore;
    use crate::space::AddressSpace;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn kanerva_setup(seed: u64) -> (AddressSpace, CounterStore, usize) {
        let space = AddressSpace::random(1000, 256, seed);
        let counters = CounterStore::new(1000, 256);
        let radius = space.radius_for_fraction(0.025);
        (space, counters, radius)
    }

    fn bit_errors(a: &BitVector, b: &BitVector) -> u32 {
        a.distance(b)
    }

    #[test]
    fn test_read_round_trip_single_pair() {
        let (space, mut counters, radius) = kanerva_setup(200);
        let mut rng = StdRng::seed_from_u64(201);
        let addr = BitVector::random(256, &mut rng);
        let datum = BitVector::random(256, &mut rng);

        let mut engine = Engine::linear(&space, &mut counters).unwrap();
        let wrote = engine.write(&addr, radius, &datum).unwrap();
        assert!(wrote > 0, "query activated nothing at radius {}", radius);

        let out = engine.read(&addr, radius).unwrap();
        assert!(out.is_match());
        assert_eq!(out.activated, wrote);
        assert_eq!(out.vector, datum);
    }

    #[test]
    fn test_scenario_fifty_pairs_low_error() {
        let (space, mut counters, radius) = kanerva_setup(210);
        let mut rng = StdRng::seed_from_u64(211);
        let pairs: Vec<(BitVector, BitVector)> = (0..50)
            .map(|_| {
                (
                    BitVector::random(256, &mut rng),
                    BitVector::random(256, &mut rng),
                )
            })
            .collect();

        let mut engine = Engine::threaded(&space, &mut counters, 4).unwrap();
        for (a, d) in &pairs {
            engine.write(a, radius, d).unwrap();
        }

        let mut errors = 0u32;
        for (a, d) in &pairs {
            let out = engine.read(a, radius).unwrap();
            assert!(out.is_match());
            errors += bit_errors(&out.vector, d);
        }
        let ber = errors as f64 / (50.0 * 256.0);
        assert!(ber < 0.05, "bit error rate {} too high", ber);

        // an unrelated address reads back chance-level noise
        let probe = BitVector::random(256, &mut rng);
        let target = BitVector::random(256, &mut rng);
        let out = engine.read(&probe, radius).unwrap();
        let chance = bit_errors(&out.vector, &target) as f64 / 256.0;
        assert!(chance > 0.40 && chance < 0.60, "chance-level ber = {}", chance);
    }

    #[test]
    fn test_read_counter_thresholded_equals_read() {
        let (space, mut counters, radius) = kanerva_setup(220);
        let mut rng = StdRng::seed_from_u64(221);
        let mut engine = Engine::linear(&space, &mut counters).unwrap();
        for _ in 0..10 {
            let a = BitVector::random(256, &mut rng);
            let d = BitVector::random(256, &mut rng);
            engine.write(&a, radius, &d).unwrap();
        }

        let probe = BitVector::random(256, &mut rng);
        let hard = engine.read(&probe, radius).unwrap();
        let raw = engine.read_counter(&probe, radius).unwrap();
        assert_eq!(hard.activated, raw.activated);
        for bit in 0..256 {
            assert_eq!(hard.vector.get_bit(bit), raw.sums[bit] > 0, "bit {}", bit);
        }
    }

    #[test]
    fn test_weighted_read_unit_weights_equals_read() {
        let (space, mut counters, radius) = kanerva_setup(230);
        let mut rng = StdRng::seed_from_u64(231);
        let mut engine = Engine::linear(&space, &mut counters).unwrap();
        for _ in 0..10 {
            let a = BitVector::random(256, &mut rng);
            let d = BitVector::random(256, &mut rng);
            engine.write(&a, radius, &d).unwrap();
        }

        let probe = BitVector::random(256, &mut rng);
        let plain = engine.read(&probe, radius).unwrap();
        let weights = vec![1.0f64; space.len()];
        let weighted = engine.weighted_read(&probe, radius, &weights).unwrap();
        assert_eq!(plain.vector, weighted.vector);
        assert_eq!(plain.activated, weighted.activated);
    }

    #[test]
    fn test_weighted_read_table_length_checked() {
        let (space, mut counters, _) = kanerva_setup(240);
        let engine = Engine::linear(&space, &mut counters).unwrap();
        let probe = BitVector::zeros(256);
        assert!(matches!(
            engine.weighted_read(&probe, 100, &[1.0, 2.0]),
            Err(Error::WeightTableMismatch { expected: 1000, got: 2 })
        ));
    }

    #[test]
    fn test_generic_read_recovers_single_write() {
        let (space, mut counters, radius) = kanerva_setup(250);
        let mut rng = StdRng::seed_from_u64(251);
        let addr = BitVector::random(256, &mut rng);
        let datum = BitVector::random(256, &mut rng);
        let mut engine = Engine::linear(&space, &mut counters).unwrap();
        engine.write(&addr, radius, &datum).unwrap();

        // with one datum stored, every active counter is ±1, so any z > 0
        // agrees with the hard read
        for z in [0.25, 1.0, 8.0] {
            let soft = engine.generic_read(&addr, radius, z).unwrap();
            assert_eq!(soft.vector, datum, "z = {}", z);
        }
    }

    #[test]
    fn test_generic_read_zero_sharpness_is_all_zero() {
        let (space, mut counters, radius) = kanerva_setup(260);
        let mut rng = StdRng::seed_from_u64(261);
        let addr = BitVector::random(256, &mut rng);
        let datum = BitVector::random(256, &mut rng);
        let mut engine = Engine::linear(&space, &mut counters).unwrap();
        engine.write(&addr, radius, &datum).unwrap();

        let soft = engine.generic_read(&addr, radius, 0.0).unwrap();
        assert!(soft.is_match());
        assert_eq!(soft.vector.popcount(), 0);
    }

    #[test]
    fn test_no_match_distinct_from_zero_datum() {
        let (space, mut counters, _) = kanerva_setup(270);
        let addr = space.get(0).unwrap().clone();
        let mut engine = Engine::linear(&space, &mut counters).unwrap();
        engine.write(&addr, 0, &BitVector::zeros(256)).unwrap();

        // exact hit on zeroed-out data: a real match with an all-zero value
        let hit = engine.read(&addr, 0).unwrap();
        assert!(hit.is_match());
        assert_eq!(hit.vector.popcount(), 0);

        // radius-0 miss: same bits, but flagged no-match
        let mut probe = addr.clone();
        probe.flip_bit(3);
        let miss = engine.read(&probe, 0).unwrap();
        assert!(!miss.is_match());
        assert_eq!(miss.vector.popcount(), 0);
    }

    #[test]
    fn test_iter_read_cleans_up_noisy_query() {
        let (space, mut counters, radius) = kanerva_setup(280);
        let mut rng = StdRng::seed_from_u64(281);
        // auto-associative store: each pattern is written at itself
        let patterns: Vec<BitVector> =
            (0..5).map(|_| BitVector::random(256, &mut rng)).collect();
        let mut engine = Engine::linear(&space, &mut counters).unwrap();
        for p in &patterns {
            engine.write(p, radius, p).unwrap();
        }

        let mut noisy = patterns[2].clone();
        for _ in 0..10 {
            noisy.flip_bit(rng.gen_range(0..256));
        }

        let out = engine.iter_read(&noisy, radius, 10).unwrap();
        assert!(out.converged, "no convergence in {} iterations", out.iterations);
        assert_eq!(out.vector, patterns[2]);

        // idempotent at the fixed point
        let again = engine.read(&out.vector, radius).unwrap();
        assert_eq!(again.vector, out.vector);
    }

    #[test]
    fn test_iter_read_cap_reported() {
        let (space, mut counters, radius) = kanerva_setup(290);
        let mut rng = StdRng::seed_from_u64(291);
        let mut engine = Engine::linear(&space, &mut counters).unwrap();
        let probe = BitVector::random(256, &mut rng);

        // one iteration can never observe two consecutive equal results
        let out = engine.iter_read(&probe, radius, 1).unwrap();
        assert_eq!(out.iterations, 1);
        assert!(!out.converged);

        assert!(matches!(
            engine.iter_read(&probe, radius, 0),
            Err(Error::InvalidArgument(_))
        ));
    }
}
