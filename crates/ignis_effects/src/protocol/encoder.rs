//! # Packet Encoder
//!
//! Turns an effect plus numeric fields into era-specific packet bytes.
//!
//! ## Design
//!
//! - One strategy per [`ProtocolEra`], picked from the server version
//! - The identity is a pure function of descriptor, era and material payload
//! - Shared fields (position, offsets, speed, amount) are written identically
//!   by both strategies, in the same order

use ignis_shared::Vec3;

use crate::catalog::EffectDescriptor;
use crate::error::{EffectError, EffectResult};
use crate::invocation::{EffectInvocation, ExtraData, WireSlots};

use super::era::{ProtocolEra, ServerVersion};
use super::packet::{
    EffectIdentity, EncodedPacket, LEGACY_PACKET_ID, MAX_LEGACY_NAME_LEN, MODERN_PACKET_ID,
};
use super::serialization::PacketWriter;

/// Numeric fields of one packet, already mapped onto the wire slots.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PacketParams {
    /// Emission point.
    pub position: Vec3,
    /// Offset, speed and amount slots.
    pub slots: WireSlots,
    /// Tell clients to render beyond the normal view distance.
    pub long_distance: bool,
    /// Material payload, if any.
    pub extra: Option<ExtraData>,
}

impl PacketParams {
    /// Params for `invocation` emitted at `position`.
    #[must_use]
    pub fn for_invocation(invocation: &EffectInvocation, position: Vec3, long_distance: bool) -> Self {
        Self {
            position,
            slots: invocation.wire_slots(),
            long_distance,
            extra: invocation.extra_data(),
        }
    }

    fn validate(&self) -> EffectResult<()> {
        if !self.slots.speed.is_finite() || self.slots.speed < 0.0 {
            return Err(EffectError::invalid(
                "speed",
                format!("{} is not a finite value >= 0", self.slots.speed),
            ));
        }
        if self.slots.amount < 0 {
            return Err(EffectError::invalid(
                "amount",
                format!("{} is lower than 0", self.slots.amount),
            ));
        }
        if !self.position.is_finite() {
            return Err(EffectError::invalid("position", "components must be finite"));
        }
        Ok(())
    }
}

/// Layout strategy for one protocol era.
pub trait EraEncoder: Send + Sync {
    /// Era this strategy writes.
    fn era(&self) -> ProtocolEra;

    /// How the packet names `descriptor`.
    fn identity(&self, descriptor: &EffectDescriptor, extra: Option<ExtraData>) -> EffectIdentity;

    /// Writes the full packet into `writer`.
    ///
    /// # Errors
    ///
    /// Any [`crate::error::PacketError`] raised by the writer.
    fn write(
        &self,
        writer: &mut PacketWriter,
        descriptor: &EffectDescriptor,
        params: &PacketParams,
    ) -> EffectResult<()>;
}

fn write_shared(writer: &mut PacketWriter, params: &PacketParams) -> EffectResult<()> {
    writer.write_f32x3(params.position.to_f32_array())?;
    writer.write_f32x3(params.slots.offsets)?;
    writer.write_f32(params.slots.speed)?;
    writer.write_i32(params.slots.amount)?;
    Ok(())
}

fn legacy_name(descriptor: &EffectDescriptor, extra: Option<ExtraData>) -> String {
    match extra {
        Some(extra) => format!("{}{}", descriptor.name(), extra.legacy_suffix()),
        None => descriptor.name().to_owned(),
    }
}

/// Textual identity, no long-distance field.
#[derive(Clone, Copy, Debug, Default)]
pub struct LegacyEncoder;

impl EraEncoder for LegacyEncoder {
    fn era(&self) -> ProtocolEra {
        ProtocolEra::Legacy
    }

    fn identity(&self, descriptor: &EffectDescriptor, extra: Option<ExtraData>) -> EffectIdentity {
        EffectIdentity::Textual(legacy_name(descriptor, extra))
    }

    fn write(
        &self,
        writer: &mut PacketWriter,
        descriptor: &EffectDescriptor,
        params: &PacketParams,
    ) -> EffectResult<()> {
        writer.write_u8(LEGACY_PACKET_ID)?;
        writer.write_str(&legacy_name(descriptor, params.extra), MAX_LEGACY_NAME_LEN)?;
        write_shared(writer, params)
    }
}

/// Numeric identity, long-distance flag, trailing integer data.
#[derive(Clone, Copy, Debug, Default)]
pub struct ModernEncoder;

impl EraEncoder for ModernEncoder {
    fn era(&self) -> ProtocolEra {
        ProtocolEra::Modern
    }

    fn identity(&self, descriptor: &EffectDescriptor, _extra: Option<ExtraData>) -> EffectIdentity {
        EffectIdentity::Numeric(i32::from(descriptor.id()))
    }

    fn write(
        &self,
        writer: &mut PacketWriter,
        descriptor: &EffectDescriptor,
        params: &PacketParams,
    ) -> EffectResult<()> {
        writer.write_u8(MODERN_PACKET_ID)?;
        writer.write_i32(i32::from(descriptor.id()))?;
        writer.write_bool(params.long_distance)?;
        write_shared(writer, params)?;
        if let Some(extra) = params.extra {
            for value in extra.packet_data() {
                writer.write_varint(value)?;
            }
        }
        Ok(())
    }
}

static LEGACY: LegacyEncoder = LegacyEncoder;
static MODERN: ModernEncoder = ModernEncoder;

/// Version-adaptive encoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PacketEncoder {
    version: ServerVersion,
}

impl PacketEncoder {
    /// Creates an encoder for a detected server version.
    #[must_use]
    pub const fn new(version: ServerVersion) -> Self {
        Self { version }
    }

    /// Server version this encoder writes for.
    #[must_use]
    pub const fn version(&self) -> ServerVersion {
        self.version
    }

    /// Strategy for an era.
    #[must_use]
    pub fn strategy(era: ProtocolEra) -> &'static dyn EraEncoder {
        match era {
            ProtocolEra::Legacy => &LEGACY,
            ProtocolEra::Modern => &MODERN,
        }
    }

    /// Identity the packet would carry.
    #[must_use]
    pub fn identity(&self, descriptor: &EffectDescriptor, extra: Option<ExtraData>) -> EffectIdentity {
        Self::strategy(self.version.era()).identity(descriptor, extra)
    }

    /// Encodes raw params for `descriptor`.
    ///
    /// # Errors
    ///
    /// - `InvalidParameter` for a negative speed or amount
    /// - `EncodingFailure` when a field does not fit
    pub fn encode_params(
        &self,
        descriptor: &EffectDescriptor,
        params: &PacketParams,
    ) -> EffectResult<EncodedPacket> {
        params.validate()?;
        let strategy = Self::strategy(self.version.era());
        let mut writer = PacketWriter::new();
        strategy.write(&mut writer, descriptor, params)?;
        Ok(EncodedPacket::new(strategy.era(), writer.as_slice()))
    }

    /// Encodes an invocation emitted at `position`.
    ///
    /// # Errors
    ///
    /// See [`PacketEncoder::encode_params`].
    pub fn encode(
        &self,
        invocation: &EffectInvocation,
        position: Vec3,
        long_distance: bool,
    ) -> EffectResult<EncodedPacket> {
        let params = PacketParams::for_invocation(invocation, position, long_distance);
        self.encode_params(invocation.descriptor(), &params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::EffectKind;
    use crate::error::PacketError;
    use crate::protocol::PacketFields;

    fn encoder(text: &str) -> PacketEncoder {
        PacketEncoder::new(ServerVersion::parse(text).unwrap())
    }

    #[test]
    fn test_legacy_layout() {
        let invocation = EffectInvocation::builder(EffectKind::Flame)
            .offset(0.5, 0.0, 0.0)
            .amount(3)
            .speed(0.25)
            .build()
            .unwrap();
        let packet = encoder("v1_7_R4")
            .encode(&invocation, Vec3::new(1.0, 2.0, 3.0), true)
            .unwrap();

        assert_eq!(packet.era(), ProtocolEra::Legacy);
        let bytes = packet.as_bytes();
        assert_eq!(bytes[0], LEGACY_PACKET_ID);
        assert_eq!(&bytes[1..3], &[0x00, 0x05]);
        assert_eq!(&bytes[3..8], b"flame");
        assert_eq!(bytes.len(), 1 + 2 + 5 + 7 * 4 + 4);

        let fields = packet.fields().unwrap();
        assert_eq!(fields.identity, EffectIdentity::Textual("flame".into()));
        assert_eq!(fields.long_distance, None);
        assert_eq!(fields.position, [1.0, 2.0, 3.0]);
        assert_eq!(fields.offsets, [0.5, 0.0, 0.0]);
        assert_eq!(fields.speed, 0.25);
        assert_eq!(fields.amount, 3);
    }

    #[test]
    fn test_modern_layout_with_data() {
        let invocation = EffectInvocation::builder(EffectKind::BlockCrack)
            .extra_data(ExtraData::block(35, 14))
            .build()
            .unwrap();
        let packet = encoder("v1_8_R3")
            .encode(&invocation, Vec3::ZERO, false)
            .unwrap();

        assert_eq!(packet.era(), ProtocolEra::Modern);
        let bytes = packet.as_bytes();
        assert_eq!(bytes[0], MODERN_PACKET_ID);
        assert_eq!(&bytes[1..5], &37i32.to_be_bytes());
        assert_eq!(bytes[5], 0);
        assert_eq!(&bytes[bytes.len() - 2..], &[35, 14]);

        let fields = packet.fields().unwrap();
        assert_eq!(fields.identity, EffectIdentity::Numeric(37));
        assert_eq!(fields.long_distance, Some(false));
        assert_eq!(fields.data, vec![35, 14]);
    }

    #[test]
    fn test_legacy_name_carries_material() {
        let descriptor = EffectKind::ItemCrack.descriptor();
        let identity = encoder("v1_7_R4").identity(descriptor, Some(ExtraData::item(276, 0)));
        assert_eq!(identity, EffectIdentity::Textual("iconcrack_276_0".into()));

        let identity = encoder("v1_8_R1").identity(descriptor, Some(ExtraData::item(276, 0)));
        assert_eq!(identity, EffectIdentity::Numeric(36));
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let invocation = EffectInvocation::builder(EffectKind::Redstone)
            .color(crate::invocation::EffectColor::rgb(10, 20, 30).unwrap())
            .build()
            .unwrap();
        let encoder = encoder("v1_8_R3");
        let a = encoder.encode(&invocation, Vec3::new(4.0, 5.0, 6.0), true).unwrap();
        let b = encoder.encode(&invocation, Vec3::new(4.0, 5.0, 6.0), true).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_raw_params_validated() {
        let descriptor = EffectKind::Flame.descriptor();
        let mut params = PacketParams {
            position: Vec3::ZERO,
            slots: WireSlots {
                offsets: [0.0; 3],
                speed: -1.0,
                amount: 1,
            },
            long_distance: false,
            extra: None,
        };
        let encoder = encoder("v1_8_R3");
        assert!(matches!(
            encoder.encode_params(descriptor, &params),
            Err(EffectError::InvalidParameter { name: "speed", .. })
        ));

        params.slots.speed = 0.0;
        params.slots.amount = -5;
        assert!(matches!(
            encoder.encode_params(descriptor, &params),
            Err(EffectError::InvalidParameter { name: "amount", .. })
        ));

        params.slots.amount = 0;
        assert!(encoder.encode_params(descriptor, &params).is_ok());
    }

    #[test]
    fn test_decode_matches_era() {
        let invocation = EffectInvocation::builder(EffectKind::Heart).build().unwrap();
        let packet = encoder("v1_12_R1").encode(&invocation, Vec3::ZERO, true).unwrap();
        let (era, fields) = PacketFields::decode(packet.as_bytes()).unwrap();
        assert_eq!(era, ProtocolEra::Modern);
        assert_eq!(fields.long_distance, Some(true));
        assert!(fields.data.is_empty());
        assert!(matches!(
            PacketFields::decode(&packet.as_bytes()[..10]),
            Err(PacketError::Truncated(_))
        ));
    }
}
