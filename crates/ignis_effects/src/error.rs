//! # Effect Error Types
//!
//! All errors that can occur while building, encoding, dispatching or
//! scheduling an effect.
//!
//! Nothing in the engine retries. Every failure goes back to the immediate
//! caller as one of these values.

use std::fmt;

use ignis_shared::ClientId;
use thiserror::Error;

/// Why an effect cannot be used with a given invocation shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unsupported {
    /// The effect needs a material payload and none was given.
    RequiresExtraData,
    /// A material payload was given to an effect that takes none.
    UnexpectedExtraData,
    /// The material payload is of the wrong sub-kind (item vs block).
    WrongExtraDataKind,
    /// A color was given to an effect that is not colorable.
    NotColorable,
    /// The color is of the wrong sub-kind (RGB vs note).
    WrongColorKind,
    /// A direction was given to an effect that is not directional.
    NotDirectional,
    /// The server's protocol is older than the effect.
    RequiresNewerProtocol {
        /// Minimum minor version the effect needs.
        required: u8,
        /// Minor version the server speaks.
        server: u8,
    },
}

impl fmt::Display for Unsupported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequiresExtraData => write!(f, "requires additional material data"),
            Self::UnexpectedExtraData => write!(f, "does not take material data"),
            Self::WrongExtraDataKind => write!(f, "material data kind is incorrect"),
            Self::NotColorable => write!(f, "is not colorable"),
            Self::WrongColorKind => write!(f, "color kind is incorrect"),
            Self::NotDirectional => write!(f, "is not directional"),
            Self::RequiresNewerProtocol { required, server } => {
                write!(f, "requires protocol 1.{required}, server speaks 1.{server}")
            }
        }
    }
}

/// Errors that can occur in the effect engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EffectError {
    /// A numeric parameter is out of range or malformed.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// The effect's capability flags do not allow this invocation.
    #[error("effect `{effect}` {reason}")]
    UnsupportedEffect {
        /// Protocol name of the effect.
        effect: &'static str,
        /// The mismatch.
        reason: Unsupported,
    },

    /// The effect needs a liquid surface and the center is not one.
    #[error("effect `{effect}` requires a liquid surface at the center location")]
    NotOverLiquid {
        /// Protocol name of the effect.
        effect: &'static str,
    },

    /// The server's protocol revision is missing or not recognized.
    #[error("unsupported server protocol version: {0}")]
    UnsupportedProtocolVersion(String),

    /// An explicit receiver selection was empty.
    #[error("explicit receiver selection is empty")]
    EmptyReceiverSet,

    /// The packet structure could not be materialized.
    #[error("packet encoding failed: {0}")]
    EncodingFailure(#[from] PacketError),

    /// The scheduler no longer accepts tasks.
    #[error("scheduler has been shut down")]
    SchedulerShutdown,

    /// Configuration file is malformed or out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl EffectError {
    /// Shorthand for [`EffectError::InvalidParameter`].
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Low-level failures while writing or reading packet bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PacketError {
    /// The packet buffer has no room for the next field.
    #[error("packet buffer full: need {needed} bytes, capacity {capacity}")]
    BufferFull {
        /// Bytes the write needed.
        needed: usize,
        /// Buffer capacity.
        capacity: usize,
    },

    /// A string field exceeds the protocol's length limit.
    #[error("string field is {len} bytes, limit is {max}")]
    StringTooLong {
        /// Actual length.
        len: usize,
        /// Maximum allowed.
        max: usize,
    },

    /// The buffer ended in the middle of a field.
    #[error("packet truncated at byte {0}")]
    Truncated(usize),

    /// The first byte is not an effect packet id.
    #[error("unknown packet id 0x{0:02X}")]
    UnknownPacketId(u8),

    /// Bytes left over after the last field.
    #[error("{0} trailing bytes after packet")]
    TrailingBytes(usize),

    /// A string field holds invalid UTF-8.
    #[error("string field is not valid UTF-8")]
    InvalidUtf8,
}

/// Failure to deliver one packet to one client.
///
/// Always reported per receiver; never aborts delivery to the others.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransmitError {
    /// The client's connection is gone.
    #[error("{0} is disconnected")]
    Disconnected(ClientId),

    /// The outbound queue for the client is full.
    #[error("outbound queue full for {0}")]
    QueueFull(ClientId),

    /// Any other transport failure reported by the host.
    #[error("transport error for {client}: {message}")]
    Transport {
        /// Receiver.
        client: ClientId,
        /// Host-provided description.
        message: String,
    },
}

/// Result type for effect operations.
pub type EffectResult<T> = Result<T, EffectError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_effect() {
        let err = EffectError::UnsupportedEffect {
            effect: "flame",
            reason: Unsupported::NotColorable,
        };
        assert_eq!(err.to_string(), "effect `flame` is not colorable");

        let err = EffectError::UnsupportedEffect {
            effect: "barrier",
            reason: Unsupported::RequiresNewerProtocol { required: 8, server: 7 },
        };
        assert!(err.to_string().contains("1.8"));
    }

    #[test]
    fn test_packet_error_converts() {
        let err: EffectError = PacketError::Truncated(3).into();
        assert!(matches!(err, EffectError::EncodingFailure(PacketError::Truncated(3))));
    }
}
