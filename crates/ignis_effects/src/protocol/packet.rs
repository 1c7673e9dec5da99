//! # Encoded Packets
//!
//! The immutable byte structure handed to the transport, plus a decoded view
//! of it.
//!
//! ```text
//! Legacy : [0x3F] [u16 len][utf8 name] [f32 x y z] [f32 ox oy oz] [f32 speed] [i32 amount]
//! Modern : [0x2A] [i32 id] [u8 far] [f32 x y z] [f32 ox oy oz] [f32 speed] [i32 amount] [varint data]*
//! ```

use crate::error::PacketError;

use super::era::ProtocolEra;
use super::serialization::PacketReader;

/// Leading byte of a legacy effect packet.
pub const LEGACY_PACKET_ID: u8 = 0x3F;

/// Leading byte of a modern effect packet.
pub const MODERN_PACKET_ID: u8 = 0x2A;

/// Longest textual identity the legacy layout accepts.
pub const MAX_LEGACY_NAME_LEN: usize = 64;

/// How the packet names its effect.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EffectIdentity {
    /// Protocol name, with `_<material>_<variant>` appended for material effects.
    Textual(String),
    /// Enumerant index.
    Numeric(i32),
}

/// Decoded contents of an effect packet.
#[derive(Clone, Debug, PartialEq)]
pub struct PacketFields {
    /// Effect identity.
    pub identity: EffectIdentity,
    /// Long-distance flag; absent in the legacy layout.
    pub long_distance: Option<bool>,
    /// Emission point.
    pub position: [f32; 3],
    /// Offset slots (spread, direction or color).
    pub offsets: [f32; 3],
    /// Speed slot.
    pub speed: f32,
    /// Amount slot.
    pub amount: i32,
    /// Trailing integer data; empty in the legacy layout.
    pub data: Vec<i32>,
}

impl PacketFields {
    /// Decodes a packet of either era.
    ///
    /// # Errors
    ///
    /// Any [`PacketError`] hit while reading, including trailing bytes after
    /// a legacy packet.
    pub fn decode(bytes: &[u8]) -> Result<(ProtocolEra, Self), PacketError> {
        let mut reader = PacketReader::new(bytes);
        match reader.read_u8()? {
            LEGACY_PACKET_ID => {
                let identity = EffectIdentity::Textual(reader.read_str()?);
                let fields = Self::read_common(&mut reader, identity, None)?;
                if reader.remaining() > 0 {
                    return Err(PacketError::TrailingBytes(reader.remaining()));
                }
                Ok((ProtocolEra::Legacy, fields))
            }
            MODERN_PACKET_ID => {
                let identity = EffectIdentity::Numeric(reader.read_i32()?);
                let long_distance = Some(reader.read_bool()?);
                let mut fields = Self::read_common(&mut reader, identity, long_distance)?;
                while reader.remaining() > 0 {
                    fields.data.push(reader.read_varint()?);
                }
                Ok((ProtocolEra::Modern, fields))
            }
            other => Err(PacketError::UnknownPacketId(other)),
        }
    }

    fn read_common(
        reader: &mut PacketReader<'_>,
        identity: EffectIdentity,
        long_distance: Option<bool>,
    ) -> Result<Self, PacketError> {
        Ok(Self {
            identity,
            long_distance,
            position: reader.read_f32x3()?,
            offsets: reader.read_f32x3()?,
            speed: reader.read_f32()?,
            amount: reader.read_i32()?,
            data: Vec::new(),
        })
    }
}

/// Immutable, era-specific packet bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedPacket {
    era: ProtocolEra,
    bytes: Box<[u8]>,
}

impl EncodedPacket {
    pub(crate) fn new(era: ProtocolEra, bytes: &[u8]) -> Self {
        Self {
            era,
            bytes: bytes.into(),
        }
    }

    /// Layout era of the bytes.
    #[inline]
    #[must_use]
    pub const fn era(&self) -> ProtocolEra {
        self.era
    }

    /// Raw bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Byte length.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Never true for a packet produced by the encoder.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decodes the bytes back into fields.
    ///
    /// # Errors
    ///
    /// Only if the bytes were not produced by the encoder.
    pub fn fields(&self) -> Result<PacketFields, PacketError> {
        PacketFields::decode(&self.bytes).map(|(_, fields)| fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::PacketWriter;

    #[test]
    fn test_decode_rejects_unknown_id() {
        assert_eq!(
            PacketFields::decode(&[0x00]),
            Err(PacketError::UnknownPacketId(0x00))
        );
        assert_eq!(PacketFields::decode(&[]), Err(PacketError::Truncated(0)));
    }

    #[test]
    fn test_decode_rejects_trailing_legacy_bytes() {
        let mut writer = PacketWriter::new();
        writer.write_u8(LEGACY_PACKET_ID).unwrap();
        writer.write_str("flame", MAX_LEGACY_NAME_LEN).unwrap();
        for _ in 0..7 {
            writer.write_f32(0.0).unwrap();
        }
        writer.write_i32(1).unwrap();
        writer.write_u8(9).unwrap();
        assert_eq!(
            PacketFields::decode(writer.as_slice()),
            Err(PacketError::TrailingBytes(1))
        );
    }
}
