//! # Effect Protocol
//!
//! Version-adaptive binary encoding of effect packets.
//!
//! ## Packet Eras
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Legacy (1.5 - 1.7)                                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Id (1) │ Name (2 + n) │ Position (12) │ Offsets (12) │ ...   │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Modern (1.8 - 1.12)                                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Id (1) │ Effect (4) │ Far (1) │ Position (12) │ ... │ Data * │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Philosophy
//!
//! - The server version is detected once and selects the layout
//! - Both layouts share the numeric tail: position, offsets, speed, amount
//! - Packets are encoded once per dispatch and never cached

mod encoder;
mod era;
mod packet;
mod serialization;

pub use encoder::{EraEncoder, LegacyEncoder, ModernEncoder, PacketEncoder, PacketParams};
pub use era::{ProtocolEra, ServerVersion, VersionCache};
pub use packet::{
    EffectIdentity, EncodedPacket, PacketFields, LEGACY_PACKET_ID, MAX_LEGACY_NAME_LEN,
    MODERN_PACKET_ID,
};
pub use serialization::{PacketReader, PacketWriter};
