//! The SDM engine.
//!
//! Every operation activates once, then walks the returned index set:
//! write-family calls move counters toward the datum, read-family calls sum
//! counter rows and threshold (or soften, or iterate) the result.

pub mod readout;
pub mod sdm;

pub use readout::{CounterOutput, IterReadOutput, ReadOutput};
pub use sdm::Engine;
