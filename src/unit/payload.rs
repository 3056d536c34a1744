//! Immutable encoded unit used for change detection.

use std::fmt;
use std::hash::{Hash, Hasher};

use bytes::Bytes;
use xxhash_rust::xxh64::xxh64;

use crate::error::Result;
use crate::names::NameTable;

use super::codec;
use super::Unit;

const APPROX_HASH_PREFIX: usize = 30;
const FINGERPRINT_SEED: u64 = 0;

/// Encoded bytes of one unit.
///
/// Equality is exact byte comparison. [`UnitPayload::hash_approx`] only looks at the
/// length and the first 30 bytes, so equal hashes say nothing without the byte check;
/// the xxh64 [`UnitPayload::fingerprint`] lets unequal payloads short-circuit.
#[derive(Clone)]
pub struct UnitPayload {
    bytes: Bytes,
    fingerprint: u64,
}

impl UnitPayload {
    /// Wraps bytes loaded from elsewhere, e.g. a persistent cache.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        let fingerprint = xxh64(&bytes, FINGERPRINT_SEED);
        Self { bytes, fingerprint }
    }

    /// Encodes `unit`.
    pub fn from_unit(unit: &Unit, names: &NameTable) -> Result<Self> {
        Ok(Self::from_bytes(codec::encode(unit, names)?))
    }

    /// Read-only view of the encoded bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Shared handle to the encoded bytes.
    pub fn to_bytes(&self) -> Bytes {
        self.bytes.clone()
    }

    /// Encoded length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true for a zero-length payload.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// xxh64 digest of the full payload.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Cheap hash over the length and the first 30 bytes.
    pub fn hash_approx(&self) -> i32 {
        let mut result = self.bytes.len() as i32;
        for &byte in self.bytes.iter().take(APPROX_HASH_PREFIX) {
            result = result.wrapping_mul(31).wrapping_add(i32::from(byte as i8));
        }
        result
    }
}

impl PartialEq for UnitPayload {
    fn eq(&self, other: &Self) -> bool {
        self.bytes.len() == other.bytes.len()
            && self.fingerprint == other.fingerprint
            && self.bytes == other.bytes
    }
}

impl Eq for UnitPayload {}

impl Hash for UnitPayload {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_i32(self.hash_approx());
    }
}

impl fmt::Debug for UnitPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitPayload")
            .field("len", &self.bytes.len())
            .field("fingerprint", &format_args!("{:016x}", self.fingerprint))
            .finish()
    }
}
