#![forbid(unsafe_code)]
//! Fixed-width, varint and cursor helpers shared by the unit codec.

pub mod ord {
    //! Big-endian fixed-width integers.

    const U32_LEN: usize = core::mem::size_of::<u32>();

    /// Appends a big-endian u32.
    pub fn put_u32_be(dst: &mut Vec<u8>, v: u32) {
        dst.extend_from_slice(&v.to_be_bytes());
    }

    /// Decodes a big-endian u32 from exactly four bytes.
    pub fn get_u32_be(src: &[u8]) -> Option<u32> {
        let head: [u8; U32_LEN] = src.get(..U32_LEN)?.try_into().ok()?;
        Some(u32::from_be_bytes(head))
    }
}

pub mod var {
    //! Unsigned varints and ZigZag signed integers.

    use crate::error::{Result, StubError};

    /// Encodes a u64 as an unsigned varint.
    pub fn encode_u64(mut v: u64, out: &mut Vec<u8>) {
        loop {
            let byte = (v & 0x7f) as u8;
            v >>= 7;
            if v == 0 {
                out.push(byte);
                break;
            }
            out.push(byte | 0x80);
        }
    }

    /// Decodes a u64 varint from a slice, updating the offset.
    pub fn decode_u64(src: &[u8], off: &mut usize) -> Result<u64> {
        let mut result = 0u64;
        let mut shift = 0u32;
        for i in 0..10 {
            let byte = *src.get(*off).ok_or_else(|| {
                StubError::corrupt(format!("varint decode truncated at byte {i}"))
            })?;
            *off += 1;
            let payload = u64::from(byte & 0x7f);
            if i == 9 && payload > 1 {
                return Err(StubError::corrupt("varint overflow (more than 64 bits)"));
            }
            result |= payload << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
        }
        Err(StubError::corrupt("varint too long (exceeded 10 bytes)"))
    }

    /// Encodes an i64 as a ZigZag-encoded varint.
    pub fn encode_i64(v: i64, out: &mut Vec<u8>) {
        let zigzag = ((v << 1) ^ (v >> 63)) as u64;
        encode_u64(zigzag, out);
    }

    /// Decodes a ZigZag-encoded i64 varint from a slice, updating the offset.
    pub fn decode_i64(src: &[u8], off: &mut usize) -> Result<i64> {
        let zigzag = decode_u64(src, off)?;
        Ok(((zigzag >> 1) as i64) ^ (-((zigzag & 1) as i64)))
    }
}

pub mod buf {
    //! A slice-backed cursor whose reads fail with `CorruptPayload`.

    use core::fmt;

    use super::{ord, var};
    use crate::error::{Result, StubError};

    /// A cursor for reading bytes from a slice with offset tracking.
    pub struct Cursor<'a> {
        buf: &'a [u8],
        off: usize,
    }

    impl<'a> Cursor<'a> {
        /// Creates a new cursor starting at offset 0.
        pub fn new(buf: &'a [u8]) -> Self {
            Self { buf, off: 0 }
        }

        /// Current read offset.
        pub fn offset(&self) -> usize {
            self.off
        }

        /// Takes the next `n` bytes from the cursor, advancing the offset.
        pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
            if n > self.remaining() {
                return Err(StubError::corrupt(format!(
                    "read beyond buffer: need {n}, remaining {}",
                    self.remaining()
                )));
            }
            let slice = &self.buf[self.off..self.off + n];
            self.off += n;
            Ok(slice)
        }

        /// Reads one byte.
        pub fn read_u8(&mut self) -> Result<u8> {
            Ok(self.take(1)?[0])
        }

        /// Reads a big-endian u32.
        pub fn read_u32_be(&mut self) -> Result<u32> {
            let bytes = self.take(4)?;
            ord::get_u32_be(bytes).ok_or_else(|| StubError::corrupt("short u32 read"))
        }

        /// Reads an unsigned varint.
        pub fn read_var_u64(&mut self) -> Result<u64> {
            var::decode_u64(self.buf, &mut self.off)
        }

        /// Reads an unsigned varint that must fit in 32 bits.
        pub fn read_var_u32(&mut self) -> Result<u32> {
            let raw = self.read_var_u64()?;
            u32::try_from(raw).map_err(|_| StubError::corrupt(format!("varint {raw} exceeds u32")))
        }

        /// Reads a ZigZag varint that must fit in 32 bits.
        pub fn read_var_i32(&mut self) -> Result<i32> {
            let raw = var::decode_i64(self.buf, &mut self.off)?;
            i32::try_from(raw).map_err(|_| StubError::corrupt(format!("varint {raw} exceeds i32")))
        }

        /// Reads an element count, rejecting counts that cannot fit in the remaining
        /// bytes given each element occupies at least `min_elem_len` bytes.
        pub fn read_len(&mut self, min_elem_len: usize) -> Result<usize> {
            let raw = self.read_var_u64()?;
            let count = usize::try_from(raw)
                .map_err(|_| StubError::corrupt(format!("length prefix {raw} overflows")))?;
            let needed = count.checked_mul(min_elem_len.max(1));
            match needed {
                Some(needed) if needed <= self.remaining() => Ok(count),
                _ => Err(StubError::corrupt(format!(
                    "length prefix {count} exceeds remaining {} bytes",
                    self.remaining()
                ))),
            }
        }

        /// Returns the number of bytes remaining in the buffer.
        pub fn remaining(&self) -> usize {
            self.buf.len().saturating_sub(self.off)
        }

        /// Returns true once every byte has been consumed.
        pub fn is_exhausted(&self) -> bool {
            self.remaining() == 0
        }
    }

    impl fmt::Debug for Cursor<'_> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("Cursor")
                .field("off", &self.off)
                .field("remaining", &self.remaining())
                .finish()
        }
    }
}
