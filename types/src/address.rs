//! Opaque wallet identity.
//!
//! The core never verifies identities cryptographically — an address is an
//! opaque string handed in by the identity collaborator. Equality and hashing
//! are ASCII case-insensitive, so `0xAbC` and `0xabc` name the same party.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A participant identity (employer, worker, or arbitrator).
///
/// Compares and hashes case-insensitively; the original casing is preserved
/// for display.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Create a new wallet address from a raw identity string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Return the raw identity string as handed in.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate that this address is well-formed (non-empty).
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
    }
}

impl PartialEq for WalletAddress {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for WalletAddress {}

impl Hash for WalletAddress {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.0.len());
        for b in self.0.bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for WalletAddress {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for WalletAddress {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn equality_ignores_ascii_case() {
        let a = WalletAddress::new("0xAbCdEf");
        let b = WalletAddress::new("0xabcdef");
        assert_eq!(a, b);
        assert_ne!(a, WalletAddress::new("0xabcde0"));
    }

    #[test]
    fn hash_lookup_ignores_ascii_case() {
        let mut map = HashMap::new();
        map.insert(WalletAddress::new("0xEMPLOYER"), 1u32);
        assert_eq!(map.get(&WalletAddress::new("0xemployer")), Some(&1));
    }

    #[test]
    fn display_preserves_original_casing() {
        let a = WalletAddress::new("0xAbC");
        assert_eq!(a.to_string(), "0xAbC");
    }
}
