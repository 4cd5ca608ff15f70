//! Saturating counter storage.
//!
//! One row of `bits` signed counters per hard location. Writes move
//! counters toward the clamp rails; reads sum rows over the activation set.

pub mod store;

pub use store::CounterStore;
