//! Emission points and invocations bound to them.

use ignis_shared::{Vec3, WorldId};

use crate::dispatch::{DispatchFacade, DispatchReport};
use crate::error::EffectResult;
use crate::invocation::EffectInvocation;
use crate::visibility::VisibilityFilter;

/// Where an effect appears and who sees it.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayPoint {
    world: WorldId,
    position: Vec3,
    audience: VisibilityFilter,
}

impl DisplayPoint {
    /// Creates a point.
    #[must_use]
    pub fn new(world: WorldId, position: Vec3, audience: VisibilityFilter) -> Self {
        Self {
            world,
            position,
            audience,
        }
    }

    /// Same world and audience at another position.
    #[must_use]
    pub fn at(&self, position: Vec3) -> Self {
        Self {
            world: self.world,
            position,
            audience: self.audience.clone(),
        }
    }

    /// World.
    #[inline]
    #[must_use]
    pub const fn world(&self) -> WorldId {
        self.world
    }

    /// Position.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Who receives effects shown here.
    #[inline]
    #[must_use]
    pub const fn audience(&self) -> &VisibilityFilter {
        &self.audience
    }
}

/// An invocation bound to a display point.
#[derive(Clone, Debug, PartialEq)]
pub struct Emitter {
    invocation: EffectInvocation,
    point: DisplayPoint,
}

impl Emitter {
    /// Binds `invocation` to `point`.
    #[must_use]
    pub fn new(invocation: EffectInvocation, point: DisplayPoint) -> Self {
        Self { invocation, point }
    }

    /// The bound invocation.
    #[must_use]
    pub const fn invocation(&self) -> &EffectInvocation {
        &self.invocation
    }

    /// Replaces the invocation, keeping the point.
    pub fn set_invocation(&mut self, invocation: EffectInvocation) {
        self.invocation = invocation;
    }

    /// The bound point.
    #[must_use]
    pub const fn point(&self) -> &DisplayPoint {
        &self.point
    }

    /// Moves the emitter.
    pub fn set_point(&mut self, point: DisplayPoint) {
        self.point = point;
    }

    /// Shows the effect at its own point.
    ///
    /// # Errors
    ///
    /// See [`DispatchFacade::dispatch`].
    pub fn send(&self, facade: &DispatchFacade) -> EffectResult<DispatchReport> {
        self.send_at(facade, &self.point)
    }

    /// Shows the effect at another point.
    ///
    /// # Errors
    ///
    /// See [`DispatchFacade::dispatch`].
    pub fn send_at(&self, facade: &DispatchFacade, point: &DisplayPoint) -> EffectResult<DispatchReport> {
        facade.dispatch(&self.invocation, point.world(), point.position(), point.audience())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_keeps_world_and_audience() {
        let point = DisplayPoint::new(WorldId(3), Vec3::ZERO, VisibilityFilter::Radius(16.0));
        let moved = point.at(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(moved.world(), WorldId(3));
        assert_eq!(moved.audience(), &VisibilityFilter::Radius(16.0));
        assert_eq!(moved.position(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(point.position(), Vec3::ZERO);
    }
}
