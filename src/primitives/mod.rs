//! Low-level primitives for the unit codec.

/// Byte-level utilities and encoding/decoding.
///
/// Big-endian handles, varints and a bounds-checked read cursor.
pub mod bytes;
