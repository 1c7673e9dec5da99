//! # Dispatch Facade
//!
//! The single entry point that turns an invocation into packets on the wire.
//!
//! ## Flow
//!
//! ```text
//! invocation ──► validate ──► resolve receivers ──► long-distance?
//!                  │                                      │
//!                  ▼                                      ▼
//!           version, shape, liquid                  encode once
//!                                                         │
//!                                                         ▼
//!                                              send to each receiver
//!                                              (failures collected)
//! ```
//!
//! The facade never retains the invocation or the packet past the call.

use std::sync::Arc;

use ignis_shared::{ClientId, Vec3, WorldId, LONG_DISTANCE_RANGE, LONG_DISTANCE_SQUARED};

use crate::catalog::{EffectDescriptor, EffectFlags};
use crate::error::{EffectError, EffectResult, TransmitError, Unsupported};
use crate::host::{ClientDirectory, ClientRef, LiquidQuery, PacketSink, ProtocolSource};
use crate::invocation::EffectInvocation;
use crate::protocol::{EncodedPacket, PacketEncoder, ServerVersion, VersionCache};
use crate::visibility::{VisibilityFilter, VisibilityResolver};

/// Outcome of one dispatch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Receivers the sink accepted the packet for.
    pub delivered: usize,
    /// Receivers the sink refused, with the reason.
    pub failed: Vec<(ClientId, TransmitError)>,
    /// Whether the packet carried the long-distance flag.
    pub long_distance: bool,
}

impl DispatchReport {
    /// Total receivers attempted.
    #[inline]
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.delivered + self.failed.len()
    }

    /// Returns true if no send failed.
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Validates, encodes and delivers effects through the host traits.
pub struct DispatchFacade {
    directory: Arc<dyn ClientDirectory>,
    liquid: Arc<dyn LiquidQuery>,
    sink: Arc<dyn PacketSink>,
    protocol: Arc<dyn ProtocolSource>,
    versions: VersionCache,
}

impl DispatchFacade {
    /// Creates a facade over the host's collaborators.
    ///
    /// The server version is asked of `protocol` on first use and cached.
    #[must_use]
    pub fn new(
        directory: Arc<dyn ClientDirectory>,
        liquid: Arc<dyn LiquidQuery>,
        sink: Arc<dyn PacketSink>,
        protocol: Arc<dyn ProtocolSource>,
    ) -> Self {
        Self {
            directory,
            liquid,
            sink,
            protocol,
            versions: VersionCache::new(),
        }
    }

    /// Skips detection and uses `version` for the facade's lifetime.
    #[must_use]
    pub fn with_version(mut self, version: ServerVersion) -> Self {
        self.versions = VersionCache::preset(version);
        self
    }

    /// The host's client directory.
    #[must_use]
    pub fn directory(&self) -> &dyn ClientDirectory {
        self.directory.as_ref()
    }

    /// The detected server version.
    ///
    /// # Errors
    ///
    /// `UnsupportedProtocolVersion` when detection failed.
    pub fn server_version(&self) -> EffectResult<ServerVersion> {
        self.versions.get_or_detect(self.protocol.as_ref())
    }

    /// Checks that the server's protocol knows `descriptor`.
    ///
    /// # Errors
    ///
    /// - `UnsupportedProtocolVersion` when detection failed
    /// - `UnsupportedEffect` with `RequiresNewerProtocol`
    pub fn check_supported(&self, descriptor: &EffectDescriptor) -> EffectResult<ServerVersion> {
        let version = self.server_version()?;
        if let Some(required) = descriptor.min_version() {
            if !descriptor.is_supported_on(version.minor()) {
                return Err(EffectError::UnsupportedEffect {
                    effect: descriptor.name(),
                    reason: Unsupported::RequiresNewerProtocol {
                        required,
                        server: version.minor(),
                    },
                });
            }
        }
        Ok(version)
    }

    /// Runs every capability check for `invocation` centered at `center`.
    ///
    /// # Errors
    ///
    /// `UnsupportedProtocolVersion`, `UnsupportedEffect` or `NotOverLiquid`.
    pub fn validate(
        &self,
        invocation: &EffectInvocation,
        world: WorldId,
        center: Vec3,
    ) -> EffectResult<PacketEncoder> {
        let descriptor = invocation.descriptor();
        let version = self.check_supported(descriptor)?;

        descriptor
            .check_shape(invocation.shape())
            .map_err(|reason| EffectError::UnsupportedEffect {
                effect: descriptor.name(),
                reason,
            })?;

        if descriptor.has(EffectFlags::REQUIRES_LIQUID_SURFACE)
            && !self.liquid.is_liquid(world, center)
        {
            return Err(EffectError::NotOverLiquid {
                effect: descriptor.name(),
            });
        }

        Ok(PacketEncoder::new(version))
    }

    /// Shows `invocation` at `center` to the clients selected by `filter`.
    ///
    /// # Errors
    ///
    /// Anything from [`DispatchFacade::validate`], filter validation, or the
    /// encoder. Per-receiver send failures are in the report instead.
    pub fn dispatch(
        &self,
        invocation: &EffectInvocation,
        world: WorldId,
        center: Vec3,
        filter: &VisibilityFilter,
    ) -> EffectResult<DispatchReport> {
        let encoder = self.validate(invocation, world, center)?;
        let receivers = VisibilityResolver::new(self.directory.as_ref()).resolve(world, center, filter)?;

        let long_distance = filter.range().is_some_and(|range| range > LONG_DISTANCE_RANGE)
            || is_long_distance(&receivers, world, center);

        let packet = encoder.encode(invocation, center, long_distance)?;
        Ok(self.transmit(&packet, receivers.iter().map(ClientRef::id), long_distance))
    }

    /// Shows `invocation` to one client without going through a filter.
    ///
    /// # Errors
    ///
    /// As [`DispatchFacade::dispatch`], minus filter errors.
    pub fn dispatch_to(
        &self,
        invocation: &EffectInvocation,
        world: WorldId,
        center: Vec3,
        client: ClientId,
    ) -> EffectResult<DispatchReport> {
        let encoder = self.validate(invocation, world, center)?;
        let long_distance = self
            .directory
            .client(client)
            .is_some_and(|c| is_long_distance(&[c], world, center));

        let packet = encoder.encode(invocation, center, long_distance)?;
        Ok(self.transmit(&packet, std::iter::once(client), long_distance))
    }

    fn transmit(
        &self,
        packet: &EncodedPacket,
        receivers: impl Iterator<Item = ClientId>,
        long_distance: bool,
    ) -> DispatchReport {
        let mut report = DispatchReport {
            long_distance,
            ..DispatchReport::default()
        };
        for client in receivers {
            match self.sink.send(client, packet) {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    tracing::warn!(%client, %err, "effect packet not delivered");
                    report.failed.push((client, err));
                }
            }
        }
        tracing::trace!(
            delivered = report.delivered,
            failed = report.failed.len(),
            bytes = packet.len(),
            "effect dispatched"
        );
        report
    }
}

/// True if any receiver in `world` is farther than the normal view distance.
fn is_long_distance(receivers: &[ClientRef], world: WorldId, center: Vec3) -> bool {
    receivers
        .iter()
        .filter(|c| c.world() == world)
        .any(|c| c.position().distance_squared(center) > LONG_DISTANCE_SQUARED)
}
