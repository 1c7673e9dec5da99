//! # Packet Serialization
//!
//! Fixed-buffer writer and borrowing reader for effect packets.
//!
//! ## Design
//!
//! - Uses a pre-allocated buffer (no heap allocations while writing)
//! - Network byte order (big-endian) for every multi-byte field
//! - Every write/read is bounds-checked and reports a [`PacketError`]

use ignis_shared::MAX_PACKET_SIZE;

use crate::error::PacketError;

/// Longest varint encoding of a 32-bit value.
const MAX_VARINT_LEN: usize = 5;

/// Packet writer - writes fields into a pre-allocated buffer.
///
/// Reusable across encodings via [`PacketWriter::reset`].
pub struct PacketWriter {
    buffer: [u8; MAX_PACKET_SIZE],
    position: usize,
}

impl PacketWriter {
    /// Creates a new writer with a fresh buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: [0u8; MAX_PACKET_SIZE],
            position: 0,
        }
    }

    /// Resets the writer for reuse.
    #[inline]
    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Returns the number of bytes written.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.position
    }

    /// Returns true if no bytes have been written.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.position == 0
    }

    /// Returns a slice of the written data.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer[..self.position]
    }

    fn put(&mut self, bytes: &[u8]) -> Result<(), PacketError> {
        let end = self.position + bytes.len();
        if end > MAX_PACKET_SIZE {
            return Err(PacketError::BufferFull {
                needed: end,
                capacity: MAX_PACKET_SIZE,
            });
        }
        self.buffer[self.position..end].copy_from_slice(bytes);
        self.position = end;
        Ok(())
    }

    /// Writes a single byte.
    #[inline]
    pub fn write_u8(&mut self, value: u8) -> Result<(), PacketError> {
        self.put(&[value])
    }

    /// Writes a boolean as one byte (0 or 1).
    #[inline]
    pub fn write_bool(&mut self, value: bool) -> Result<(), PacketError> {
        self.write_u8(u8::from(value))
    }

    /// Writes a u16.
    #[inline]
    pub fn write_u16(&mut self, value: u16) -> Result<(), PacketError> {
        self.put(&value.to_be_bytes())
    }

    /// Writes an i32.
    #[inline]
    pub fn write_i32(&mut self, value: i32) -> Result<(), PacketError> {
        self.put(&value.to_be_bytes())
    }

    /// Writes an f32.
    #[inline]
    pub fn write_f32(&mut self, value: f32) -> Result<(), PacketError> {
        self.put(&value.to_be_bytes())
    }

    /// Writes three f32 values.
    #[inline]
    pub fn write_f32x3(&mut self, values: [f32; 3]) -> Result<(), PacketError> {
        values.iter().try_for_each(|v| self.write_f32(*v))
    }

    /// Writes a u16 length prefix followed by UTF-8 bytes.
    ///
    /// # Errors
    ///
    /// `StringTooLong` when the string exceeds `max` bytes.
    pub fn write_str(&mut self, value: &str, max: usize) -> Result<(), PacketError> {
        let len = value.len();
        if len > max {
            return Err(PacketError::StringTooLong { len, max });
        }
        let prefix = u16::try_from(len).map_err(|_| PacketError::StringTooLong {
            len,
            max: usize::from(u16::MAX),
        })?;
        self.write_u16(prefix)?;
        self.put(value.as_bytes())
    }

    /// Writes an i32 as a LEB128 varint (two's complement, at most 5 bytes).
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    pub fn write_varint(&mut self, value: i32) -> Result<(), PacketError> {
        let mut remaining = value as u32;
        let mut scratch = [0u8; MAX_VARINT_LEN];
        let mut len = 0;
        loop {
            let byte = (remaining & 0x7F) as u8;
            remaining >>= 7;
            if remaining == 0 {
                scratch[len] = byte;
                len += 1;
                break;
            }
            scratch[len] = byte | 0x80;
            len += 1;
        }
        self.put(&scratch[..len])
    }
}

impl Default for PacketWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Packet reader - reads fields from a borrowed buffer.
pub struct PacketReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> PacketReader<'a> {
    /// Creates a new reader over a buffer.
    #[must_use]
    pub const fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, position: 0 }
    }

    /// Returns the number of bytes remaining.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Current read offset.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], PacketError> {
        let end = self.position + N;
        let slice = self
            .buffer
            .get(self.position..end)
            .ok_or(PacketError::Truncated(self.position))?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        self.position = end;
        Ok(out)
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8, PacketError> {
        self.take::<1>().map(|b| b[0])
    }

    /// Reads a one-byte boolean. Any non-zero value is true.
    #[inline]
    pub fn read_bool(&mut self) -> Result<bool, PacketError> {
        self.read_u8().map(|b| b != 0)
    }

    /// Reads a u16.
    #[inline]
    pub fn read_u16(&mut self) -> Result<u16, PacketError> {
        self.take().map(u16::from_be_bytes)
    }

    /// Reads an i32.
    #[inline]
    pub fn read_i32(&mut self) -> Result<i32, PacketError> {
        self.take().map(i32::from_be_bytes)
    }

    /// Reads an f32.
    #[inline]
    pub fn read_f32(&mut self) -> Result<f32, PacketError> {
        self.take().map(f32::from_be_bytes)
    }

    /// Reads three f32 values.
    pub fn read_f32x3(&mut self) -> Result<[f32; 3], PacketError> {
        Ok([self.read_f32()?, self.read_f32()?, self.read_f32()?])
    }

    /// Reads a u16-prefixed UTF-8 string.
    pub fn read_str(&mut self) -> Result<String, PacketError> {
        let len = usize::from(self.read_u16()?);
        let end = self.position + len;
        let bytes = self
            .buffer
            .get(self.position..end)
            .ok_or(PacketError::Truncated(self.position))?;
        let text = std::str::from_utf8(bytes).map_err(|_| PacketError::InvalidUtf8)?;
        self.position = end;
        Ok(text.to_owned())
    }

    /// Reads a LEB128 varint written by [`PacketWriter::write_varint`].
    #[allow(clippy::cast_possible_wrap)]
    pub fn read_varint(&mut self) -> Result<i32, PacketError> {
        let start = self.position;
        let mut value: u32 = 0;
        for shift in (0..MAX_VARINT_LEN).map(|i| i * 7) {
            let byte = self.read_u8()?;
            value |= u32::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(value as i32);
            }
        }
        Err(PacketError::Truncated(start))
    }
}
