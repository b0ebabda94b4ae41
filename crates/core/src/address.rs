//! Account addresses.

use crate::hash::hash_concat;
use crate::time::unix_millis;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A 20-byte account identifier.
pub type AddressBytes = [u8; 20];

/// Errors from parsing an address.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid address: {0}")]
    Invalid(String),
}

/// An opaque account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(pub AddressBytes);

impl Address {
    /// The system address. Issues mining rewards and is never debited.
    pub const SYSTEM: Self = Self([0u8; 20]);

    /// Create an address from raw bytes.
    pub fn from_bytes(bytes: AddressBytes) -> Self {
        Self(bytes)
    }

    /// Derive a fresh address from random entropy and the current time.
    pub fn generate() -> Self {
        let entropy: [u8; 32] = rand::random();
        let digest = hash_concat(&[&entropy, &unix_millis().to_le_bytes()]);
        let mut addr = [0u8; 20];
        addr.copy_from_slice(&digest.0[..20]);
        Self(addr)
    }

    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &AddressBytes {
        &self.0
    }

    pub fn is_system(&self) -> bool {
        *self == Self::SYSTEM
    }

    /// Convert to a hex string (with 0x prefix).
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse from a hex string (with or without 0x prefix).
    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped).map_err(|_| AddressError::Invalid(s.to_string()))?;
        if bytes.len() != 20 {
            return Err(AddressError::Invalid(s.to_string()));
        }
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
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

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_unique() {
        let a = Address::generate();
        let b = Address::generate();
        assert_ne!(a, b);
        assert!(!a.is_system());
    }

    #[test]
    fn test_system_address() {
        assert!(Address::SYSTEM.is_system());
        assert_eq!(Address::SYSTEM.to_hex(), format!("0x{}", "0".repeat(40)));
    }

    #[test]
    fn test_hex_roundtrip() {
        let addr = Address::generate();
        assert_eq!(Address::from_hex(&addr.to_hex()).unwrap(), addr);

        let bare = addr.to_hex().trim_start_matches("0x").to_string();
        assert_eq!(Address::from_hex(&bare).unwrap(), addr);
    }

    #[test]
    fn test_invalid_hex() {
        assert!(Address::from_hex("0x1234").is_err());
        assert!(Address::from_hex("not-an-address").is_err());
    }
}
