//! # Protocol & Timing Constants
//!
//! Values fixed by the host protocol. They are not configuration: a client
//! interprets packets according to these numbers whatever the server says.

// =============================================================================
// TIMING
// =============================================================================

/// Host tick rate (ticks per second).
pub const TICK_RATE: u32 = 20;

/// Wall-clock length of one host tick in milliseconds (1000 / 20).
pub const MILLIS_PER_TICK: u64 = 1000 / TICK_RATE as u64;

// =============================================================================
// VISIBILITY
// =============================================================================

/// Beyond this distance a client only renders an effect when the packet
/// carries the long-distance flag.
pub const LONG_DISTANCE_RANGE: f64 = 256.0;

/// `LONG_DISTANCE_RANGE` squared, for sqrt-free comparisons.
pub const LONG_DISTANCE_SQUARED: f64 = LONG_DISTANCE_RANGE * LONG_DISTANCE_RANGE;

// =============================================================================
// PACKETS
// =============================================================================

/// Upper bound for a single encoded effect packet.
///
/// The largest legal packet (a legacy name at the maximum string length)
/// stays well below this.
pub const MAX_PACKET_SIZE: usize = 512;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_distance_squared() {
        assert_eq!(LONG_DISTANCE_SQUARED, 65_536.0);
        assert_eq!(MILLIS_PER_TICK, 50);
    }
}
