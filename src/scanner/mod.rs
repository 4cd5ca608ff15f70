//! Activation scanning — one contract, three execution strategies.
//!
//! `activate(query, radius)` returns `{ i : d(query, aᵢ) ≤ radius }`, the
//! indices of every hard location within Hamming `radius` of the query.
//! The three backends are observationally identical and differ only in how
//! the scan executes:
//!
//! - **Linear** — single-threaded sequential pass; the reference the other
//!   two are validated against
//! - **Threaded** — fixed worker pool, contiguous disjoint shards,
//!   fork-join per call
//! - **OpenCL** (feature `opencl`) — kernel compiled once at construction,
//!   per-call upload/launch/readback, blocking

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::space::{AddressSpace, BitVector};
use crate::Result;

pub mod linear;
#[cfg(feature = "opencl")]
pub mod opencl;
pub mod threaded;

pub use linear::LinearScanner;
#[cfg(feature = "opencl")]
pub use opencl::OpenClScanner;
pub use threaded::ThreadedScanner;

/// Which scan strategy an engine was built with. Fixed at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScannerKind {
    Linear,
    Threaded,
    Accelerated,
}

impl fmt::Display for ScannerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScannerKind::Linear => write!(f, "linear"),
            ScannerKind::Threaded => write!(f, "threaded"),
            ScannerKind::Accelerated => write!(f, "accelerated"),
        }
    }
}

/// The selected backend.
///
/// A tagged variant rather than a trait object: `activate` is the hot path
/// of every engine operation and the backend never changes once chosen, so
/// there is nothing for dynamic dispatch to buy.
pub enum Scanner {
    Linear(LinearScanner),
    Threaded(ThreadedScanner),
    #[cfg(feature = "opencl")]
    Accelerated(OpenClScanner),
}

impl Scanner {
    /// Report tag for this backend.
    pub fn kind(&self) -> ScannerKind {
        match self {
            Scanner::Linear(_) => ScannerKind::Linear,
            Scanner::Threaded(_) => ScannerKind::Threaded,
            #[cfg(feature = "opencl")]
            Scanner::Accelerated(_) => ScannerKind::Accelerated,
        }
    }

    /// Indices of every hard location within `radius` of `query`,
    /// ascending. The caller has already validated width and radius.
    pub fn activate(
        &self,
        space: &AddressSpace,
        query: &BitVector,
        radius: usize,
    ) -> Result<Vec<u32>> {
        match self {
            Scanner::Linear(s) => Ok(s.activate(space, query, radius)),
            Scanner::Threaded(s) => Ok(s.activate(space, query, radius)),
            #[cfg(feature = "opencl")]
            Scanner::Accelerated(s) => s.activate(query, radius),
        }
    }
}
