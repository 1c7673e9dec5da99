//! # Task Scheduler
//!
//! Re-invokes effect tasks on a tick clock driven from outside.
//!
//! ## Design
//!
//! - One registry entry per task: handle, due tick, delay
//! - `tick()` advances the clock by one and fires every due entry once
//! - The due tick is rewritten in place before the task runs
//! - Task errors and panics are contained and counted; the task stays armed
//!
//! ```text
//!   schedule ──► registry ◄── cancel
//!                   │
//!   tick ──► collect due ──► re-check ──► pre_display ──► run
//!                (lock)       (lock)         (no registry lock held)
//! ```

mod tick;

pub use tick::{TickLoop, TickStats};

use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{EffectError, EffectResult};
use crate::task::{EffectTask, TaskContext, TaskControl};

/// Stable identity of a scheduled task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

impl TaskHandle {
    /// Raw handle value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

type SharedTask = Arc<Mutex<Box<dyn EffectTask>>>;

struct Entry {
    task: SharedTask,
    due: u64,
    delay: u64,
}

/// Scheduler counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Successful firings.
    pub fired: u64,
    /// Firings that returned an error (including `pre_display`).
    pub failed: u64,
    /// Firings that panicked.
    pub panicked: u64,
    /// Entries removed by `cancel` or by the task itself.
    pub cancelled: u64,
}

#[derive(Default)]
struct Counters {
    fired: AtomicU64,
    failed: AtomicU64,
    panicked: AtomicU64,
    cancelled: AtomicU64,
}

/// Tick-driven scheduler for [`EffectTask`]s.
pub struct TaskScheduler {
    registry: Mutex<HashMap<TaskHandle, Entry>>,
    tick_lock: Mutex<()>,
    now: AtomicU64,
    next_handle: AtomicU64,
    closed: AtomicBool,
    counters: Counters,
}

impl TaskScheduler {
    /// Creates an empty scheduler at tick 0.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Mutex::new(HashMap::new()),
            tick_lock: Mutex::new(()),
            now: AtomicU64::new(0),
            next_handle: AtomicU64::new(1),
            closed: AtomicBool::new(false),
            counters: Counters::default(),
        }
    }

    /// Schedules `task` to fire on the next tick.
    ///
    /// # Errors
    ///
    /// `SchedulerShutdown` after [`TaskScheduler::shutdown`].
    pub fn schedule(&self, task: impl EffectTask + 'static) -> EffectResult<TaskHandle> {
        self.insert(Box::new(task), 0)
    }

    /// Schedules `task` to fire `ticks` ticks from now.
    ///
    /// # Errors
    ///
    /// `SchedulerShutdown` after [`TaskScheduler::shutdown`].
    pub fn schedule_delayed(
        &self,
        task: impl EffectTask + 'static,
        ticks: u64,
    ) -> EffectResult<TaskHandle> {
        self.insert(Box::new(task), ticks)
    }

    /// Schedules an already boxed task.
    ///
    /// # Errors
    ///
    /// `SchedulerShutdown` after [`TaskScheduler::shutdown`].
    pub fn schedule_boxed(&self, task: Box<dyn EffectTask>) -> EffectResult<TaskHandle> {
        self.insert(task, 0)
    }

    fn insert(&self, task: Box<dyn EffectTask>, after: u64) -> EffectResult<TaskHandle> {
        let mut registry = self.registry.lock();
        if self.closed.load(Ordering::Acquire) {
            return Err(EffectError::SchedulerShutdown);
        }
        let handle = TaskHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        let delay = task.delay_ticks();
        let due = self.now() + after;
        tracing::debug!(%handle, task = task.label(), due, delay, "task scheduled");
        registry.insert(
            handle,
            Entry {
                task: Arc::new(Mutex::new(task)),
                due,
                delay,
            },
        );
        Ok(handle)
    }

    /// Removes a task. Returns false for unknown or already removed handles.
    pub fn cancel(&self, handle: TaskHandle) -> bool {
        let removed = self.registry.lock().remove(&handle).is_some();
        if removed {
            self.counters.cancelled.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(%handle, "task cancelled");
        }
        removed
    }

    /// Stops the scheduler: drops every task and rejects new ones.
    pub fn shutdown(&self) {
        let mut registry = self.registry.lock();
        self.closed.store(true, Ordering::Release);
        let dropped = registry.len();
        registry.clear();
        tracing::info!(dropped, "scheduler shut down");
    }

    /// Returns true after [`TaskScheduler::shutdown`].
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Current scheduler tick.
    #[must_use]
    pub fn now(&self) -> u64 {
        self.now.load(Ordering::Acquire)
    }

    /// Due tick of a scheduled task.
    #[must_use]
    pub fn next_due(&self, handle: TaskHandle) -> Option<u64> {
        self.registry.lock().get(&handle).map(|e| e.due)
    }

    /// Returns true if `handle` is still scheduled.
    #[must_use]
    pub fn contains(&self, handle: TaskHandle) -> bool {
        self.registry.lock().contains_key(&handle)
    }

    /// Number of scheduled tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.lock().len()
    }

    /// Returns true if nothing is scheduled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.lock().is_empty()
    }

    /// Counter snapshot.
    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            fired: self.counters.fired.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            panicked: self.counters.panicked.load(Ordering::Relaxed),
            cancelled: self.counters.cancelled.load(Ordering::Relaxed),
        }
    }

    /// Advances the clock by one tick and fires every due task once.
    ///
    /// Returns the number of tasks that ran without error.
    pub fn tick(&self) -> usize {
        let _serial = self.tick_lock.lock();
        if self.is_shut_down() {
            return 0;
        }
        let now = self.now.fetch_add(1, Ordering::AcqRel) + 1;

        let mut due: Vec<(TaskHandle, SharedTask)> = {
            let mut registry = self.registry.lock();
            registry
                .iter_mut()
                .filter(|(_, entry)| entry.due <= now)
                .map(|(handle, entry)| {
                    entry.due = now + entry.delay;
                    (*handle, Arc::clone(&entry.task))
                })
                .collect()
        };
        due.sort_unstable_by_key(|(handle, _)| *handle);

        let ctx = TaskContext { tick: now };
        let mut ran = 0;
        for (handle, task) in due {
            if !self.contains(handle) {
                continue;
            }
            if self.fire(handle, &task, &ctx) {
                ran += 1;
            }
        }
        ran
    }

    fn fire(&self, handle: TaskHandle, task: &SharedTask, ctx: &TaskContext) -> bool {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let mut task = task.lock();
            task.pre_display()?;
            task.run(ctx)
        }));

        match outcome {
            Ok(Ok(control)) => {
                self.counters.fired.fetch_add(1, Ordering::Relaxed);
                if control == TaskControl::Cancel {
                    self.cancel(handle);
                }
                true
            }
            Ok(Err(err)) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(%handle, tick = ctx.tick, %err, "task firing failed");
                false
            }
            Err(payload) => {
                self.counters.panicked.fetch_add(1, Ordering::Relaxed);
                let message = payload
                    .downcast_ref::<&str>()
                    .map(ToString::to_string)
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_owned());
                tracing::error!(%handle, tick = ctx.tick, %message, "task panicked");
                false
            }
        }
    }
}

impl Default for TaskScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct Counting {
        runs: Arc<AtomicUsize>,
        delay: u64,
        stop_after: Option<usize>,
    }

    impl Counting {
        fn new(delay: u64) -> (Self, Arc<AtomicUsize>) {
            let runs = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    runs: runs.clone(),
                    delay,
                    stop_after: None,
                },
                runs,
            )
        }
    }

    impl EffectTask for Counting {
        fn delay_ticks(&self) -> u64 {
            self.delay
        }

        fn run(&mut self, _ctx: &TaskContext) -> EffectResult<TaskControl> {
            let runs = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
            match self.stop_after {
                Some(limit) if runs >= limit => Ok(TaskControl::Cancel),
                _ => Ok(TaskControl::Continue),
            }
        }
    }

    struct Faulty {
        panic: bool,
    }

    impl EffectTask for Faulty {
        fn delay_ticks(&self) -> u64 {
            0
        }

        fn run(&mut self, _ctx: &TaskContext) -> EffectResult<TaskControl> {
            if self.panic {
                panic!("boom");
            }
            Err(EffectError::invalid("test", "always fails"))
        }
    }

    #[test]
    fn test_schedule_fires_next_tick() {
        let scheduler = TaskScheduler::new();
        let (task, runs) = Counting::new(0);
        let handle = scheduler.schedule(task).unwrap();
        assert_eq!(scheduler.next_due(handle), Some(0));

        assert_eq!(scheduler.tick(), 1);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        scheduler.tick();
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_delay_rewrites_due() {
        let scheduler = TaskScheduler::new();
        let (task, runs) = Counting::new(3);
        let handle = scheduler.schedule_delayed(task, 3).unwrap();

        scheduler.tick();
        scheduler.tick();
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        scheduler.tick();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.next_due(handle), Some(6));
    }

    #[test]
    fn test_self_cancel() {
        let scheduler = TaskScheduler::new();
        let (mut task, runs) = Counting::new(0);
        task.stop_after = Some(2);
        let handle = scheduler.schedule(task).unwrap();
        for _ in 0..5 {
            scheduler.tick();
        }
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert!(!scheduler.contains(handle));
        assert_eq!(scheduler.stats().cancelled, 1);
    }

    #[test]
    fn test_cancel_unknown_is_noop() {
        let scheduler = TaskScheduler::new();
        assert!(!scheduler.cancel(TaskHandle(99)));
        assert_eq!(scheduler.stats(), SchedulerStats::default());
    }

    #[test]
    fn test_errors_and_panics_are_contained() {
        let scheduler = TaskScheduler::new();
        let failing = scheduler.schedule(Faulty { panic: false }).unwrap();
        let panicking = scheduler.schedule(Faulty { panic: true }).unwrap();
        let (task, runs) = Counting::new(0);
        scheduler.schedule(task).unwrap();

        assert_eq!(scheduler.tick(), 1);
        assert_eq!(scheduler.tick(), 1);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert!(scheduler.contains(failing));
        assert!(scheduler.contains(panicking));

        let stats = scheduler.stats();
        assert_eq!(stats.fired, 2);
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.panicked, 2);
    }

    #[test]
    fn test_shutdown_rejects_new_tasks() {
        let scheduler = TaskScheduler::new();
        let (task, runs) = Counting::new(0);
        scheduler.schedule(task).unwrap();
        scheduler.shutdown();

        assert!(scheduler.is_empty());
        assert_eq!(scheduler.tick(), 0);
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        let (task, _) = Counting::new(0);
        assert_eq!(scheduler.schedule(task), Err(EffectError::SchedulerShutdown));
    }
}
