//! Identity and hashing primitives.
//!
//! - Addresses (20-byte opaque holder identities)
//! - Hashes (SHA256)
//!
//! Signature verification is the execution substrate's job; the ledger trusts the
//! caller identity it is handed.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::utils::constants::{ADDRESS_LENGTH, CONTRACT_ADDRESS, HASH_LENGTH};

// ═══════════════════════════════════════════════════════════════════════════════
// HASH
// ═══════════════════════════════════════════════════════════════════════════════

/// A 32-byte cryptographic hash
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hash([u8; HASH_LENGTH]);

impl Serialize for Hash {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Hash::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl Hash {
    /// Compute SHA256 hash of data
    pub fn sha256(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        let mut bytes = [0u8; HASH_LENGTH];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// Get the hash as bytes
    pub fn as_bytes(&self) -> &[u8; HASH_LENGTH] {
        &self.0
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Create from hex string
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| Error::InvalidParameter {
            name: "hash".into(),
            reason: e.to_string(),
        })?;
        if bytes.len() != HASH_LENGTH {
            return Err(Error::InvalidParameter {
                name: "hash".into(),
                reason: format!("expected {} bytes, got {}", HASH_LENGTH, bytes.len()),
            });
        }
        let mut arr = [0u8; HASH_LENGTH];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ADDRESS
// ═══════════════════════════════════════════════════════════════════════════════

/// Opaque holder identity. The all-zero address is reserved as the null identity.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Address::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl Address {
    /// The null identity
    pub const ZERO: Self = Self([0u8; ADDRESS_LENGTH]);

    /// Address of a locally deployed contract
    pub const CONTRACT: Self = Self(CONTRACT_ADDRESS);

    /// Create an address from bytes
    pub const fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Derive a stable address from a human-readable label (last 20 bytes of its SHA256)
    pub fn from_label(label: &str) -> Self {
        let hash = Hash::sha256(label.as_bytes());
        let mut bytes = [0u8; ADDRESS_LENGTH];
        bytes.copy_from_slice(&hash.as_bytes()[HASH_LENGTH - ADDRESS_LENGTH..]);
        Self(bytes)
    }

    /// Parse a `0x`-prefixed (or bare) hex address
    pub fn from_hex(s: &str) -> Result<Self> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped).map_err(|e| Error::InvalidParameter {
            name: "address".into(),
            reason: e.to_string(),
        })?;
        if bytes.len() != ADDRESS_LENGTH {
            return Err(Error::InvalidParameter {
                name: "address".into(),
                reason: format!("expected {} bytes, got {}", ADDRESS_LENGTH, bytes.len()),
            });
        }
        let mut arr = [0u8; ADDRESS_LENGTH];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// `0x`-prefixed lowercase hex
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Check for the null identity
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LENGTH]
    }

    /// Abbreviated form for log lines
    pub fn short(&self) -> String {
        let hex = self.to_hex();
        format!("{}…{}", &hex[..6], &hex[hex.len() - 4..])
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}
