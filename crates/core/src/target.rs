//! 256-bit proof-of-work targets.
//!
//! A target is stored big-endian, so comparing the raw byte arrays
//! lexicographically is the same as comparing the unsigned integers.

use crate::hash::Hash;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur while parsing a target.
#[derive(Debug, Error, PartialEq)]
pub enum TargetError {
    #[error("target is empty")]
    Empty,
    #[error("target exceeds 256 bits ({0} hex digits)")]
    TooLong(usize),
    #[error("invalid target hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("leading zero bits must be at most 256, got {0}")]
    TooManyZeroBits(u32),
}

/// A difficulty threshold. A hash meets the target when it is strictly below it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Target(pub [u8; 32]);

impl Target {
    /// 2^256 - 1: every hash except all-ones meets it.
    pub const MAX: Self = Self([0xFF; 32]);

    /// Big-endian bytes of the target.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parse a hex integer of up to 64 digits, with or without a `0x` prefix.
    /// Short values are left-padded with zeros.
    pub fn from_hex(s: &str) -> Result<Self, TargetError> {
        let digits = s.trim();
        let digits = digits
            .strip_prefix("0x")
            .or_else(|| digits.strip_prefix("0X"))
            .unwrap_or(digits);
        if digits.is_empty() {
            return Err(TargetError::Empty);
        }
        if digits.len() > 64 {
            return Err(TargetError::TooLong(digits.len()));
        }

        let padded = format!("{:0>64}", digits);
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(&padded, &mut bytes)?;
        Ok(Self(bytes))
    }

    /// Target with `bits` leading zero bits followed by all ones.
    pub fn from_leading_zero_bits(bits: u32) -> Result<Self, TargetError> {
        if bits > 256 {
            return Err(TargetError::TooManyZeroBits(bits));
        }

        let mut bytes = [0xFF; 32];
        let full = (bits / 8) as usize;
        for byte in bytes.iter_mut().take(full) {
            *byte = 0;
        }
        let partial = bits % 8;
        if partial > 0 && full < 32 {
            bytes[full] = 0xFF >> partial;
        }
        Ok(Self(bytes))
    }

    /// Check whether `hash`, read as a big-endian integer, is strictly below this target.
    pub fn is_met_by(&self, hash: &Hash) -> bool {
        hash.as_bytes() < &self.0
    }

    /// Lowercase 64-digit hex form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Default for Target {
    fn default() -> Self {
        let mut bytes = [0u8; 32];
        bytes[2] = 0xFF;
        bytes[3] = 0xFF;
        Self(bytes)
    }
}

impl FromStr for Target {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Target(0x{})", self.to_hex())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}
