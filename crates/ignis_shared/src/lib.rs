//! # IGNIS Shared
//!
//! Common types used by the effect engine and by the host adapter that
//! embeds it.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on:
//! - the host server's session or world types
//! - any transport or socket crate
//!
//! If you need host types, model them as traits in `ignis_effects::host`.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod ids;
pub mod math;

pub use constants::{
    LONG_DISTANCE_RANGE, LONG_DISTANCE_SQUARED, MAX_PACKET_SIZE, MILLIS_PER_TICK, TICK_RATE,
};
pub use ids::{ClientId, WorldId};
pub use math::Vec3;
