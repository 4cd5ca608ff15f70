//! Hard-location address space.
//!
//! The ordered, fixed-size set of reference addresses the scanner measures
//! every query against. The engine never mutates it; counter rows are keyed
//! by position in this collection.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::space::bitvec::BitVector;
use crate::{Error, Result};

/// A fixed collection of `sample` hard-location addresses of width `bits`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AddressSpace {
    addresses: Vec<BitVector>,
    bits: usize,
}

impl AddressSpace {
    /// Generate `sample` uniform random addresses of width `bits`.
    ///
    /// Deterministic in `seed`, so a space can be regenerated instead of
    /// persisted.
    pub fn random(sample: usize, bits: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let addresses = (0..sample)
            .map(|_| BitVector::random(bits, &mut rng))
            .collect();
        Self { addresses, bits }
    }

    /// Build from caller-supplied addresses.
    ///
    /// All vectors must share one width and at least one is required;
    /// counter rows are allocated 1:1 against these entries.
    pub fn from_vectors(addresses: Vec<BitVector>) -> Result<Self> {
        let bits = match addresses.first() {
            Some(first) => first.bits(),
            None => {
                return Err(Error::InvalidArgument(
                    "address space needs at least one hard location".into(),
                ))
            }
        };
        if let Some(bad) = addresses.iter().find(|a| a.bits() != bits) {
            return Err(Error::WidthMismatch {
                expected: bits,
                got: bad.bits(),
            });
        }
        Ok(Self { addresses, bits })
    }

    /// Number of hard locations.
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    /// True when the space holds no locations (unreachable via the public
    /// constructors, kept for completeness).
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Address width in bits.
    pub fn bits(&self) -> usize {
        self.bits
    }

    /// Address of hard location `index`.
    pub fn get(&self, index: usize) -> Option<&BitVector> {
        self.addresses.get(index)
    }

    /// Iterate addresses in location order.
    pub fn iter(&self) -> impl Iterator<Item = &BitVector> {
        self.addresses.iter()
    }

    /// Addresses in location order.
    pub fn addresses(&self) -> &[BitVector] {
        &self.addresses
    }

    /// All addresses flattened into one word buffer, row-major.
    /// Layout matches what the device scan kernel expects.
    pub fn flat_words(&self) -> Vec<u64> {
        let words = BitVector::words_for(self.bits);
        let mut flat = Vec::with_capacity(self.addresses.len() * words);
        for addr in &self.addresses {
            flat.extend_from_slice(addr.words());
        }
        flat
    }

    /// Smallest radius at which a uniform random query is expected to
    /// activate at least `fraction` of the space.
    ///
    /// The Hamming distance between two uniform vectors is
    /// Binomial(bits, ½); this walks the exact binomial tail rather than a
    /// normal approximation, which drifts badly at the small fractions SDM
    /// runs at. Kanerva's classical operating point is `fraction` around
    /// 1e-3; `fraction ≥ 1` saturates to `bits`.
    pub fn radius_for_fraction(&self, fraction: f64) -> usize {
        let n = self.bits as f64;
        // ln of C(bits, 0) / 2^bits
        let mut ln_term = -n * std::f64::consts::LN_2;
        let mut cum = ln_term.exp();
        let mut r = 0usize;
        while r < self.bits && cum < fraction {
            ln_term += ((n - r as f64) / (r as f64 + 1.0)).ln();
            cum += ln_term.exp();
            r += 1;
        }
        r
    }
}
