//! Binary address space.
//!
//! - **[`BitVector`]** — fixed-width binary vector packed into `u64` words;
//!   XOR binding and popcount give Hamming distance in one pass
//! - **[`AddressSpace`]** — the ordered, fixed set of hard-location
//!   addresses every scan is measured against

pub mod address;
pub mod bitvec;

pub use address::AddressSpace;
pub use bitvec::BitVector;
