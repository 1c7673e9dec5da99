//! # Animated Effect Tasks
//!
//! Periodic work driven by the [`crate::scheduler::TaskScheduler`].
//!
//! ## Lifecycle
//!
//! ```text
//!            schedule()
//!   ┌──────────────────────────┐
//!   ▼                          │
//! Armed ──(due)──► Firing ─────┘
//!   │                 │
//!   │ cancel()        │ TaskControl::Cancel
//!   ▼                 ▼
//! Cancelled ◄─────────┘
//! ```
//!
//! An [`AnimatedEffectTask`] owns an [`Emitter`] and a [`Pattern`]. Each
//! firing optionally runs the modifier over the current invocation, then lets
//! the pattern decide where to emit.

mod spiral;

pub use spiral::{Spiral, SpiralBuilder, SpiralState, SpiralTask};

use std::sync::Arc;

use crate::dispatch::DispatchFacade;
use crate::emitter::Emitter;
use crate::error::EffectResult;
use crate::invocation::InvocationBuilder;

/// What a task wants after a firing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskControl {
    /// Stay armed for the next due tick.
    Continue,
    /// Remove this task from the scheduler.
    Cancel,
}

/// Scheduler state passed to a firing task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaskContext {
    /// Scheduler tick on which the task fires.
    pub tick: u64,
}

/// Work the scheduler can re-invoke.
pub trait EffectTask: Send {
    /// Ticks between firings.
    fn delay_ticks(&self) -> u64;

    /// Checked before every [`EffectTask::run`]. An error skips the firing.
    ///
    /// # Errors
    ///
    /// Task-specific.
    fn pre_display(&mut self) -> EffectResult<()> {
        Ok(())
    }

    /// One firing.
    ///
    /// # Errors
    ///
    /// Task-specific. The scheduler logs the error and keeps the task armed.
    fn run(&mut self, ctx: &TaskContext) -> EffectResult<TaskControl>;

    /// Label used in logs.
    fn label(&self) -> &str {
        "effect-task"
    }
}

/// Per-firing adjustment of the invocation: firing index and current builder in,
/// adjusted builder out.
pub type Modifier = Box<dyn FnMut(u64, InvocationBuilder) -> InvocationBuilder + Send>;

/// Geometry of an animated effect.
pub trait Pattern: Send {
    /// Emits one firing's worth of effects from `emitter`.
    ///
    /// # Errors
    ///
    /// The first dispatch error.
    fn emit(&mut self, emitter: &Emitter, facade: &DispatchFacade) -> EffectResult<TaskControl>;

    /// Label used in logs.
    fn label(&self) -> &'static str;
}

/// Emits at the emitter's own point every firing.
#[derive(Clone, Copy, Debug, Default)]
pub struct Stationary;

impl Pattern for Stationary {
    fn emit(&mut self, emitter: &Emitter, facade: &DispatchFacade) -> EffectResult<TaskControl> {
        emitter.send(facade)?;
        Ok(TaskControl::Continue)
    }

    fn label(&self) -> &'static str {
        "stationary"
    }
}

/// An emitter replayed through a pattern at a fixed interval.
pub struct AnimatedEffectTask<P> {
    facade: Arc<DispatchFacade>,
    emitter: Emitter,
    delay: u64,
    firings: u64,
    modifier: Option<Modifier>,
    pattern: P,
}

impl<P: Pattern> AnimatedEffectTask<P> {
    /// Creates a task firing every `delay` ticks.
    #[must_use]
    pub fn new(facade: Arc<DispatchFacade>, emitter: Emitter, pattern: P, delay: u64) -> Self {
        Self {
            facade,
            emitter,
            delay,
            firings: 0,
            modifier: None,
            pattern,
        }
    }

    /// Installs a per-firing modifier.
    #[must_use]
    pub fn with_modifier(
        mut self,
        modifier: impl FnMut(u64, InvocationBuilder) -> InvocationBuilder + Send + 'static,
    ) -> Self {
        self.modifier = Some(Box::new(modifier));
        self
    }

    /// The emitter as of the last firing.
    #[must_use]
    pub const fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    /// The pattern and its state.
    #[must_use]
    pub const fn pattern(&self) -> &P {
        &self.pattern
    }

    /// Firings attempted so far.
    #[must_use]
    pub const fn firings(&self) -> u64 {
        self.firings
    }
}

impl<P: Pattern> EffectTask for AnimatedEffectTask<P> {
    fn delay_ticks(&self) -> u64 {
        self.delay
    }

    fn pre_display(&mut self) -> EffectResult<()> {
        self.facade
            .check_supported(self.emitter.invocation().descriptor())
            .map(|_| ())
    }

    fn run(&mut self, _ctx: &TaskContext) -> EffectResult<TaskControl> {
        let index = self.firings;
        self.firings += 1;

        if let Some(modifier) = self.modifier.as_mut() {
            let builder = modifier(index, self.emitter.invocation().to_builder());
            self.emitter.set_invocation(builder.build()?);
        }

        self.pattern.emit(&self.emitter, &self.facade)
    }

    fn label(&self) -> &str {
        self.pattern.label()
    }
}
