//! # kanerva
//!
//! A **Sparse Distributed Memory** (SDM) engine in the style of Kanerva's
//! model: an associative, content-addressable memory that stores and
//! retrieves fixed-width bit-vectors by activating every "hard location"
//! within a Hamming radius of the query address.
//!
//! ## Components
//!
//! 1. **BitVector** — fixed-width binary vector packed into `u64` words;
//!    XOR + popcount give Hamming distance in O(bits/64)
//! 2. **AddressSpace** — the fixed, ordered set of hard-location addresses
//! 3. **CounterStore** — `sample × bits` saturating i16 accumulators, one
//!    row per hard location
//! 4. **Scanner** — radius activation with three interchangeable backends:
//!    sequential, rayon fork-join, OpenCL-offloaded
//! 5. **Engine** — write / read / weighted / soft / iterative operations
//!    combining an activation set with counter aggregation
//!
//! ## Shape of a call
//!
//! ```text
//!   caller ── owns ──► AddressSpace (read-only)   CounterStore (rows)
//!                            │                          │
//!                  Engine ───┴── activate(addr, r) ─────┤
//!                    │      { i : d(addr, aᵢ) ≤ r }     │
//!                    └── write: row ± datum        read: Σ rows → bits
//! ```
//!
//! The engine borrows both stores; dropping it releases only scanner-owned
//! resources (worker pool, device context). Write operations take
//! `&mut self`, so the no-concurrent-writers contract is compile-time.
//!
//! ## Quick start
//! ```rust,ignore
//! use kanerva::{AddressSpace, CounterStore, Engine};
//!
//! let space = AddressSpace::random(1000, 256, 0xC0FFEE);
//! let mut counters = CounterStore::new(space.len(), space.bits());
//! let mut engine = Engine::threaded(&space, &mut counters, 4)?;
//!
//! let radius = space.radius_for_fraction(0.025);
//! engine.write(&addr, radius, &datum)?;
//! let out = engine.read(&addr, radius)?;
//! assert!(out.is_match());
//! ```

pub mod counters;
pub mod engine;
pub mod scanner;
pub mod space;

pub use counters::CounterStore;
pub use engine::{CounterOutput, Engine, IterReadOutput, ReadOutput};
pub use scanner::ScannerKind;
pub use space::{AddressSpace, BitVector};

/// Engine-wide numeric constants.
pub mod config {
    /// Lower clamp bound for a location/bit counter.
    ///
    /// Symmetric with [`COUNTER_MAX`] so that a write followed by the
    /// matching subtractive write restores the prior state everywhere
    /// except at the rails.
    pub const COUNTER_MIN: i16 = -32767;

    /// Upper clamp bound for a location/bit counter.
    pub const COUNTER_MAX: i16 = 32767;

    /// Delta applied per bit by an unweighted write.
    pub const WRITE_DELTA: i32 = 1;
}

// === Error types ===

/// Crate-level error type.
///
/// Every variant maps to a distinct negative status code via
/// [`Error::code`] for embedders that surface failures as integer
/// statuses. Construction-time errors leave no engine behind; per-call
/// errors leave the counter store untouched.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("width mismatch: engine is {expected} bits, buffer is {got}")]
    WidthMismatch { expected: usize, got: usize },

    #[error("radius {radius} out of range for {bits}-bit addresses")]
    RadiusOutOfRange { radius: usize, bits: usize },

    #[error("hard location {index} out of range ({sample} locations)")]
    LocationOutOfRange { index: usize, sample: usize },

    #[error("weight table has {got} entries, address space has {expected}")]
    WeightTableMismatch { expected: usize, got: usize },

    #[error("geometry mismatch: counter store is {rows}x{cols}, address space is {sample}x{bits}")]
    GeometryMismatch {
        rows: usize,
        cols: usize,
        sample: usize,
        bits: usize,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("resource exhaustion: {0}")]
    ResourceExhausted(String),

    #[error("accelerator error: {0}")]
    Accelerator(String),
}

impl Error {
    /// Stable negative status code for this error kind (0 means success;
    /// every failure kind gets its own code).
    pub fn code(&self) -> i32 {
        match self {
            Error::WidthMismatch { .. } => -1,
            Error::RadiusOutOfRange { .. } => -2,
            Error::LocationOutOfRange { .. } => -3,
            Error::WeightTableMismatch { .. } => -4,
            Error::GeometryMismatch { .. } => -5,
            Error::InvalidArgument(_) => -6,
            Error::BackendUnavailable(_) => -7,
            Error::ResourceExhausted(_) => -8,
            Error::Accelerator(_) => -9,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
