//! # Spiral Pattern
//!
//! Emits on a horizontal circle around the emitter's point.
//!
//! ## Modes
//!
//! ```text
//! solid    every firing draws the full ring: 0, inc, 2·inc, ... < 360
//! stepped  every firing draws one point, then advances the angle by inc
//! ```
//!
//! A rotation limit of zero means unbounded; the task then runs until it is
//! cancelled from outside.
//!
//! Angles are `origin + k * increment` for an integer step `k`.

use std::sync::Arc;

use ignis_shared::Vec3;

use crate::dispatch::DispatchFacade;
use crate::emitter::Emitter;
use crate::error::{EffectError, EffectResult};
use crate::invocation::InvocationBuilder;

use super::{AnimatedEffectTask, Pattern, TaskControl};

/// Slack for the end-of-turn comparison, in degrees.
const ANGLE_EPSILON: f64 = 1e-9;

/// A spiral-emitting animated task.
pub type SpiralTask = AnimatedEffectTask<Spiral>;

/// Mutable spiral fields, owned by one task.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpiralState {
    /// Current angle in degrees, in `[0, 360)`.
    pub angle: f64,
    /// Ring radius.
    pub radius: f64,
    /// Angular step in degrees.
    pub increment: f64,
    /// Full ring per firing instead of one point.
    pub solid: bool,
    /// Rotations left before self-cancel; `None` when unbounded.
    pub remaining_rotations: Option<u32>,
    /// Firings completed.
    pub ticks: u64,
}

/// Spiral geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct Spiral {
    state: SpiralState,
    rotation_limit: u32,
    /// Angle at step zero of the current turn.
    origin: f64,
    /// Steps taken in the current turn.
    step: u32,
}

impl Spiral {
    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &SpiralState {
        &self.state
    }

    /// Configured rotation limit; zero when unbounded.
    #[must_use]
    pub const fn rotation_limit(&self) -> u32 {
        self.rotation_limit
    }

    /// Point on the ring at `degrees` around `center`.
    #[must_use]
    pub fn point_at(&self, center: Vec3, degrees: f64) -> Vec3 {
        let theta = degrees.to_radians();
        center + Vec3::new(self.state.radius * theta.cos(), 0.0, self.state.radius * theta.sin())
    }

    fn emit_at(&self, emitter: &Emitter, facade: &DispatchFacade, degrees: f64) -> EffectResult<()> {
        let point = emitter.point();
        let target = point.at(self.point_at(point.position(), degrees));
        emitter.send_at(facade, &target).map(|_| ())
    }

    fn emit_ring(&mut self, emitter: &Emitter, facade: &DispatchFacade) -> EffectResult<TaskControl> {
        let mut k = 0u32;
        loop {
            let degrees = f64::from(k) * self.state.increment;
            if degrees >= 360.0 - ANGLE_EPSILON {
                break;
            }
            self.emit_at(emitter, facade, degrees)?;
            k += 1;
        }
        self.state.ticks += 1;

        if self.rotation_limit != 0 && self.state.ticks >= u64::from(self.rotation_limit) {
            return Ok(TaskControl::Cancel);
        }
        Ok(TaskControl::Continue)
    }

    fn emit_step(&mut self, emitter: &Emitter, facade: &DispatchFacade) -> EffectResult<TaskControl> {
        self.emit_at(emitter, facade, self.state.angle)?;
        self.state.ticks += 1;

        self.step += 1;
        let next = self.origin + f64::from(self.step) * self.state.increment;
        if next < 360.0 - ANGLE_EPSILON {
            self.state.angle = next;
        } else {
            self.origin = (next - 360.0).max(0.0);
            self.step = 0;
            self.state.angle = self.origin;
            if let Some(remaining) = self.state.remaining_rotations.as_mut() {
                *remaining = remaining.saturating_sub(1);
                if *remaining == 0 {
                    return Ok(TaskControl::Cancel);
                }
            }
        }
        Ok(TaskControl::Continue)
    }
}

impl Pattern for Spiral {
    fn emit(&mut self, emitter: &Emitter, facade: &DispatchFacade) -> EffectResult<TaskControl> {
        if self.state.solid {
            self.emit_ring(emitter, facade)
        } else {
            self.emit_step(emitter, facade)
        }
    }

    fn label(&self) -> &'static str {
        if self.state.solid {
            "spiral-solid"
        } else {
            "spiral"
        }
    }
}

/// Builder for [`SpiralTask`].
pub struct SpiralBuilder {
    facade: Arc<DispatchFacade>,
    emitter: Emitter,
    angle: f64,
    radius: f64,
    increment: f64,
    solid: bool,
    rotations: u32,
    delay: u64,
    modifier: Option<super::Modifier>,
}

impl SpiralTask {
    /// Starts a spiral with radius 1, increment 10, angle 0, no rotation
    /// limit and no delay.
    #[must_use]
    pub fn builder(facade: Arc<DispatchFacade>, emitter: Emitter) -> SpiralBuilder {
        SpiralBuilder {
            facade,
            emitter,
            angle: 0.0,
            radius: 1.0,
            increment: 10.0,
            solid: false,
            rotations: 0,
            delay: 0,
            modifier: None,
        }
    }
}

impl SpiralBuilder {
    /// Starting angle in degrees.
    #[must_use]
    pub fn angle(mut self, degrees: f64) -> Self {
        self.angle = degrees;
        self
    }

    /// Ring radius.
    #[must_use]
    pub fn radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    /// Angular step in degrees.
    #[must_use]
    pub fn increment(mut self, degrees: f64) -> Self {
        self.increment = degrees;
        self
    }

    /// Full ring per firing.
    #[must_use]
    pub fn solid(mut self, solid: bool) -> Self {
        self.solid = solid;
        self
    }

    /// Rotations (stepped) or firings (solid) before self-cancel. Zero is unbounded.
    #[must_use]
    pub fn rotations(mut self, rotations: u32) -> Self {
        self.rotations = rotations;
        self
    }

    /// Ticks between firings.
    #[must_use]
    pub fn delay(mut self, ticks: u64) -> Self {
        self.delay = ticks;
        self
    }

    /// Per-firing modifier.
    #[must_use]
    pub fn modifier(
        mut self,
        modifier: impl FnMut(u64, InvocationBuilder) -> InvocationBuilder + Send + 'static,
    ) -> Self {
        self.modifier = Some(Box::new(modifier));
        self
    }

    /// Validates and creates the task.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for a negative or non-finite radius, or an increment
    /// outside `(0, 360]`.
    pub fn build(self) -> EffectResult<SpiralTask> {
        if !self.radius.is_finite() || self.radius < 0.0 {
            return Err(EffectError::invalid(
                "radius",
                format!("{} is not a finite value >= 0", self.radius),
            ));
        }
        if !self.increment.is_finite() || self.increment <= 0.0 || self.increment > 360.0 {
            return Err(EffectError::invalid(
                "increment",
                format!("{} is outside (0, 360]", self.increment),
            ));
        }
        if !self.angle.is_finite() {
            return Err(EffectError::invalid("angle", "must be finite"));
        }

        let origin = self.angle.rem_euclid(360.0);
        let spiral = Spiral {
            state: SpiralState {
                angle: origin,
                radius: self.radius,
                increment: self.increment,
                solid: self.solid,
                remaining_rotations: (self.rotations != 0).then_some(self.rotations),
                ticks: 0,
            },
            rotation_limit: self.rotations,
            origin,
            step: 0,
        };

        let mut task = AnimatedEffectTask::new(self.facade, self.emitter, spiral, self.delay);
        task.modifier = self.modifier;
        Ok(task)
    }
}
