//! Commitment and Salt for the commit-reveal scheme.
//!
//! commitment = keccak256(move_code: u8 || salt: bytes32)
//!
//! Both fields are fixed width, so the pre-image is exactly 33 bytes and no two
//! distinct (move, salt) pairs encode to the same bytes. This matches Solidity's
//! `keccak256(abi.encodePacked(uint8(move), bytes32(salt)))`.

use crate::games::Move;
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Keccak-256 of arbitrary bytes
pub fn keccak256(data: impl AsRef<[u8]>) -> [u8; 32] {
    Keccak256::digest(data.as_ref()).into()
}

#[derive(Debug, Error, PartialEq)]
pub enum HexBytesError {
    #[error("Invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("Expected 32 bytes, got {0}")]
    InvalidLength(usize),
}

fn parse_bytes32(s: &str) -> Result<[u8; 32], HexBytesError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(digits)?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| HexBytesError::InvalidLength(bytes.len()))
}

/// Secret salt for a commitment
#[derive(Clone, PartialEq, Eq)]
pub struct Salt([u8; 32]);

impl Salt {
    /// Create a new random salt
    pub fn random() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Derive a salt from a memorable secret: keccak256(utf8(secret))
    pub fn from_secret(secret: &str) -> Self {
        Self(keccak256(secret.as_bytes()))
    }

    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the underlying bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl FromStr for Salt {
    type Err = HexBytesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_bytes32(s).map(Self)
    }
}

impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Salt({})", hex::encode(&self.0[..8]))
    }
}

impl Serialize for Salt {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        format!("0x{}", hex::encode(self.0)).serialize(s)
    }
}

impl<'de> Deserialize<'de> for Salt {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Commitment = keccak256(move || salt)
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Commitment([u8; 32]);

impl Commitment {
    /// Pre-image: one byte of move code followed by the 32 salt bytes
    pub const PREIMAGE_LEN: usize = 33;

    /// Create a commitment from a move and salt
    pub fn new(mv: Move, salt: &Salt) -> Self {
        Self(keccak256(Self::preimage(mv, salt)))
    }

    /// Fixed-width encoding hashed by [`Commitment::new`]
    pub fn preimage(mv: Move, salt: &Salt) -> [u8; Self::PREIMAGE_LEN] {
        let mut buf = [0u8; Self::PREIMAGE_LEN];
        buf[0] = mv.code();
        buf[1..].copy_from_slice(salt.as_bytes());
        buf
    }

    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the underlying bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Verify that the given move and salt produce this commitment
    pub fn verify(&self, mv: Move, salt: &Salt) -> bool {
        *self == Self::new(mv, salt)
    }
}

impl FromStr for Commitment {
    type Err = HexBytesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_bytes32(s).map(Self)
    }
}

impl fmt::Debug for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Commitment({})", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Serialize for Commitment {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        self.to_string().serialize(s)
    }
}

impl<'de> Deserialize<'de> for Commitment {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
