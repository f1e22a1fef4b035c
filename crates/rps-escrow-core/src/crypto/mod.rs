//! Cryptographic primitives for the commit-reveal scheme.

mod commitment;

pub use commitment::{keccak256, Commitment, HexBytesError, Salt};
