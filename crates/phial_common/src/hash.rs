//! Opaque keys for private-service registration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 128-bit XXH3 digest used as an opaque registry key.
///
/// Private services are registered under a key derived from their
/// alias-qualified name, so they cannot be looked up by guessing the
/// original name.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OpaqueKey([u8; 16]);

impl OpaqueKey {
    /// Derives the opaque key for a service name.
    pub fn for_service(name: &str) -> Self {
        let hash = xxhash_rust::xxh3::xxh3_128(name.as_bytes());
        Self(hash.to_le_bytes())
    }
}

impl fmt::Display for OpaqueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for OpaqueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpaqueKey({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

/// Builds the registry key a private service is stored under.
///
/// The `!` prefix keeps opaque keys outside the normal key space: no
/// definition key or embedded reference can collide with one.
pub fn private_service_key(name: &str) -> String {
    format!("!{}", OpaqueKey::for_service(name))
}
