//! # IGNIS Effects - The Effect Dispatch Engine
//!
//! Version-adaptive visual effect packets for a multiplayer game server.
//!
//! ## Architecture
//!
//! This crate turns "show this effect here" into bytes for every client that
//! should see it:
//!
//! - **Catalog**: every effect with its capability flags and minimum protocol
//! - **Invocation**: a validated request (motion, payload, amount, speed)
//! - **Protocol**: legacy and modern packet layouts, picked from the server version
//! - **Visibility**: everyone, a radius, or an explicit selection
//! - **Dispatch**: validate, encode once, send to each receiver
//! - **Scheduler**: tick-driven re-invocation of animated effects
//!
//! ## Ownership
//!
//! ```text
//! HOST                              ENGINE
//!   |                                  |
//!   |--- ClientDirectory ------------->| who is online, where
//!   |--- LiquidQuery ----------------->| is this block liquid
//!   |--- ProtocolSource -------------->| which revision ("v1_8_R3")
//!   |<-- PacketSink::send -------------| encoded bytes per client
//!   |--- tick() (20 Hz) -------------->| animated effects fire
//! ```
//!
//! The engine never touches a socket. The host owns transport and sessions.
//!
//! ## Example
//!
//! ```rust,ignore
//! use ignis_effects::{DispatchFacade, EffectInvocation, EffectKind, VisibilityFilter};
//!
//! let facade = DispatchFacade::new(directory, liquid, sink, protocol);
//! let flame = EffectInvocation::builder(EffectKind::Flame)
//!     .offset(0.2, 0.2, 0.2)
//!     .amount(10)
//!     .build()?;
//! let report = facade.dispatch(&flame, world, center, &VisibilityFilter::Radius(32.0))?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod emitter;
pub mod error;
pub mod host;
pub mod invocation;
pub mod protocol;
pub mod scheduler;
pub mod task;
pub mod visibility;

// Re-exports for convenience
pub use catalog::{ColorKind, DataKind, EffectCatalog, EffectDescriptor, EffectFlags, EffectKind};
pub use config::EngineConfig;
pub use dispatch::{DispatchFacade, DispatchReport};
pub use emitter::{DisplayPoint, Emitter};
pub use error::{EffectError, EffectResult, PacketError, TransmitError, Unsupported};
pub use invocation::{EffectColor, EffectInvocation, ExtraData, InvocationBuilder, Motion, Payload};
pub use protocol::{EncodedPacket, PacketEncoder, PacketFields, ProtocolEra, ServerVersion};
pub use scheduler::{SchedulerStats, TaskHandle, TaskScheduler, TickLoop};
pub use task::{AnimatedEffectTask, EffectTask, SpiralTask, TaskContext, TaskControl};
pub use visibility::{VisibilityFilter, VisibilityResolver};

pub use ignis_shared::{ClientId, Vec3, WorldId};
