//! Phase-ordered cooperative frame scheduler.
//!
//! [`FrameScheduler`] owns one queue per [`Phase`]. A tick drains the queues in phase order;
//! each drain only sees callbacks queued before that phase began, so work scheduled into the
//! phase that is currently draining (or into an earlier one) waits for the next tick, while
//! work scheduled into a later phase still runs in the current tick.
//!
//! The scheduler is generic over a context value `C` handed to every callback by `&mut`.
//! It knows nothing about geometry.

use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::foundation::error::{FliplineError, FliplineResult};
use crate::scheduler::driver::{Driver, DriverHandle};
use crate::scheduler::frame::{DEFAULT_DELTA_MS, FrameData, ManualTick, SynchronousRenderGuard};
use crate::scheduler::phase::Phase;

/// Boxed phase callback. Returning `Err` (or panicking) is recorded as a [`CallbackFault`]
/// and never stops sibling callbacks.
pub type PhaseCallback<C> = Box<dyn FnMut(&mut FrameContext<'_, C>) -> FliplineResult<()>>;

/// Identifies one scheduled callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackHandle {
    phase: Phase,
    id: u64,
}

impl CallbackHandle {
    pub fn phase(self) -> Phase {
        self.phase
    }
}

/// How ticks are produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingMode {
    /// Pending work starts the [`Driver`]; the host calls [`FrameScheduler::pump`].
    #[default]
    Driven,
    /// The driver is never started; ticks only come from [`FrameScheduler::render_frame`]
    /// or [`FrameScheduler::tick`].
    Manual,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub timing: TimingMode,
    /// Keep the driver running even when no work is queued.
    pub keep_alive: bool,
    /// Upper bound for the delta of a driven tick (absorbs stalls such as a backgrounded tab).
    pub max_delta_ms: f64,
    /// Delta reported by the first driven tick.
    pub default_delta_ms: f64,
    /// Most recent faults retained for [`FrameScheduler::take_faults`].
    pub fault_log_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            timing: TimingMode::Driven,
            keep_alive: false,
            max_delta_ms: 40.0,
            default_delta_ms: DEFAULT_DELTA_MS,
            fault_log_capacity: 64,
        }
    }
}

impl SchedulerConfig {
    pub fn manual() -> Self {
        Self {
            timing: TimingMode::Manual,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> FliplineResult<()> {
        if !(self.max_delta_ms.is_finite() && self.max_delta_ms > 0.0) {
            return Err(FliplineError::validation(
                "scheduler.max_delta_ms must be finite and > 0",
            ));
        }
        if !(self.default_delta_ms.is_finite() && self.default_delta_ms >= 0.0) {
            return Err(FliplineError::validation(
                "scheduler.default_delta_ms must be finite and >= 0",
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    /// The driver has been asked for a future tick.
    Scheduled,
    Ticking,
}

/// A callback that returned an error or panicked.
#[derive(Clone, Debug, PartialEq)]
pub struct CallbackFault {
    pub phase: Phase,
    pub handle: CallbackHandle,
    pub timestamp: f64,
    pub message: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    pub ticks: u64,
    pub callbacks_run: u64,
    pub faults: u64,
}

struct Entry<C> {
    handle: CallbackHandle,
    keep_alive: bool,
    callback: PhaseCallback<C>,
}

struct Queues<C> {
    pending: [Vec<Entry<C>>; Phase::COUNT],
    /// Handles of the batch being drained that have not run yet.
    in_flight: VecDeque<CallbackHandle>,
    /// In-flight handles cancelled mid-drain.
    cancelled: Vec<CallbackHandle>,
    next_id: u64,
}

impl<C> Queues<C> {
    fn new() -> Self {
        Self {
            pending: std::array::from_fn(|_| Vec::new()),
            in_flight: VecDeque::new(),
            cancelled: Vec::new(),
            next_id: 0,
        }
    }

    fn push(
        &mut self,
        phase: Phase,
        keep_alive: bool,
        callback: PhaseCallback<C>,
    ) -> CallbackHandle {
        self.next_id += 1;
        let handle = CallbackHandle {
            phase,
            id: self.next_id,
        };
        self.pending[phase.index()].push(Entry {
            handle,
            keep_alive,
            callback,
        });
        handle
    }

    fn cancel(&mut self, handle: CallbackHandle) -> bool {
        let queue = &mut self.pending[handle.phase.index()];
        if let Some(pos) = queue.iter().position(|e| e.handle == handle) {
            queue.remove(pos);
            return true;
        }
        if self.in_flight.contains(&handle) && !self.cancelled.contains(&handle) {
            self.cancelled.push(handle);
            return true;
        }
        false
    }

    fn is_pending(&self, handle: CallbackHandle) -> bool {
        self.pending[handle.phase.index()]
            .iter()
            .any(|e| e.handle == handle)
            || (self.in_flight.contains(&handle) && !self.cancelled.contains(&handle))
    }

    fn has_work(&self) -> bool {
        self.pending.iter().any(|q| !q.is_empty())
    }
}

/// What a running callback can see and do.
pub struct FrameContext<'a, C> {
    frame: FrameData,
    current: CallbackHandle,
    cancel_current: bool,
    context: &'a mut C,
    queues: &'a mut Queues<C>,
}

impl<C> FrameContext<'_, C> {
    pub fn frame(&self) -> FrameData {
        self.frame
    }

    pub fn phase(&self) -> Phase {
        self.current.phase
    }

    /// Handle of the callback currently running.
    pub fn handle(&self) -> CallbackHandle {
        self.current
    }

    pub fn context(&mut self) -> &mut C {
        &mut *self.context
    }

    pub fn schedule<F>(&mut self, phase: Phase, callback: F, keep_alive: bool) -> CallbackHandle
    where
        F: FnMut(&mut FrameContext<'_, C>) -> FliplineResult<()> + 'static,
    {
        self.queues.push(phase, keep_alive, Box::new(callback))
    }

    pub fn cancel(&mut self, handle: CallbackHandle) -> bool {
        if handle == self.current {
            self.cancel_current = true;
            return true;
        }
        self.queues.cancel(handle)
    }

    /// Stop the running keep-alive callback from being requeued.
    pub fn cancel_current(&mut self) {
        self.cancel_current = true;
    }
}

/// Ordered-phase callback scheduler. One instance per animation root.
pub struct FrameScheduler<C> {
    queues: Queues<C>,
    config: SchedulerConfig,
    state: SchedulerState,
    frame: FrameData,
    driver: Box<dyn Driver>,
    driver_handle: Option<DriverHandle>,
    last_driven: Option<f64>,
    faults: VecDeque<CallbackFault>,
    stats: TickStats,
}

impl<C> fmt::Debug for FrameScheduler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("state", &self.state)
            .field("frame", &self.frame)
            .field("config", &self.config)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<C> FrameScheduler<C> {
    pub fn new(config: SchedulerConfig, driver: Box<dyn Driver>) -> Self {
        Self {
            queues: Queues::new(),
            config,
            state: SchedulerState::Idle,
            frame: FrameData::default(),
            driver,
            driver_handle: None,
            last_driven: None,
            faults: VecDeque::new(),
            stats: TickStats::default(),
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Timing of the most recent (or current) tick.
    pub fn frame_data(&self) -> FrameData {
        self.frame
    }

    pub fn stats(&self) -> TickStats {
        self.stats
    }

    pub fn now(&self) -> f64 {
        self.driver.now()
    }

    /// Queue `callback` for `phase`. Keep-alive callbacks are requeued after every run until
    /// cancelled.
    pub fn schedule<F>(&mut self, phase: Phase, callback: F, keep_alive: bool) -> CallbackHandle
    where
        F: FnMut(&mut FrameContext<'_, C>) -> FliplineResult<()> + 'static,
    {
        let handle = self.queues.push(phase, keep_alive, Box::new(callback));
        if self.state == SchedulerState::Idle {
            self.request_frame();
        }
        handle
    }

    /// Remove a pending callback. Returns `false` if it already ran (and is not keep-alive) or
    /// was never scheduled.
    pub fn cancel(&mut self, handle: CallbackHandle) -> bool {
        self.queues.cancel(handle)
    }

    pub fn is_pending(&self, handle: CallbackHandle) -> bool {
        self.queues.is_pending(handle)
    }

    pub fn has_pending_work(&self) -> bool {
        self.queues.has_work()
    }

    /// Ask the driver for a future tick. No-op in manual timing or when already scheduled.
    pub fn request_frame(&mut self) {
        if self.config.timing == TimingMode::Manual || self.state != SchedulerState::Idle {
            return;
        }
        if self.driver_handle.is_none() {
            self.driver_handle = Some(self.driver.start(self.config.keep_alive));
        }
        self.state = SchedulerState::Scheduled;
    }

    /// Run one driven tick if one was requested, timed by the driver.
    pub fn pump(&mut self, ctx: &mut C) -> Option<FrameData> {
        if self.state != SchedulerState::Scheduled {
            return None;
        }
        let now = self.driver.now();
        let delta = match self.last_driven {
            None => self.config.default_delta_ms,
            Some(last) => (now - last).clamp(0.0, self.config.max_delta_ms),
        };
        self.last_driven = Some(now);
        Some(self.tick(ctx, now, delta))
    }

    /// Run one synchronous tick at caller-supplied time, with the synchronous-render flag set.
    #[tracing::instrument(level = "debug", skip(self, ctx))]
    pub fn render_frame(&mut self, ctx: &mut C, at: ManualTick) -> FliplineResult<FrameData> {
        let (timestamp, delta) = at.resolve()?;
        let _sync = SynchronousRenderGuard::enter();
        Ok(self.tick(ctx, timestamp, delta))
    }

    /// Run every phase once, in order.
    pub fn tick(&mut self, ctx: &mut C, timestamp: f64, delta: f64) -> FrameData {
        self.state = SchedulerState::Ticking;
        self.frame = FrameData {
            timestamp,
            delta,
            is_processing: true,
        };

        for phase in Phase::ALL {
            self.run_phase(ctx, phase);
        }

        self.frame.is_processing = false;
        self.stats.ticks += 1;
        self.settle();
        self.frame
    }

    /// Drain and return recorded faults, oldest first.
    pub fn take_faults(&mut self) -> Vec<CallbackFault> {
        self.faults.drain(..).collect()
    }

    fn run_phase(&mut self, ctx: &mut C, phase: Phase) {
        let batch = std::mem::take(&mut self.queues.pending[phase.index()]);
        if batch.is_empty() {
            return;
        }
        self.queues.in_flight = batch.iter().map(|e| e.handle).collect();

        for mut entry in batch {
            self.queues.in_flight.pop_front();
            if let Some(pos) = self.queues.cancelled.iter().position(|h| *h == entry.handle) {
                self.queues.cancelled.swap_remove(pos);
                continue;
            }

            let mut cx = FrameContext {
                frame: self.frame,
                current: entry.handle,
                cancel_current: false,
                context: &mut *ctx,
                queues: &mut self.queues,
            };
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| (entry.callback)(&mut cx)));
            let cancelled = cx.cancel_current;
            self.stats.callbacks_run += 1;

            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(err)) => self.record_fault(entry.handle, err),
                Err(payload) => self.record_fault(
                    entry.handle,
                    FliplineError::scheduler(panic_message(payload.as_ref())),
                ),
            }

            if entry.keep_alive && !cancelled {
                self.queues.pending[phase.index()].push(entry);
            }
        }

        self.queues.in_flight.clear();
        self.queues.cancelled.clear();
    }

    fn record_fault(&mut self, handle: CallbackHandle, err: FliplineError) {
        let message = err.to_string();
        tracing::error!(
            phase = %handle.phase,
            timestamp = self.frame.timestamp,
            error = %message,
            "phase callback failed"
        );
        self.stats.faults += 1;
        if self.config.fault_log_capacity == 0 {
            return;
        }
        while self.faults.len() >= self.config.fault_log_capacity {
            self.faults.pop_front();
        }
        self.faults.push_back(CallbackFault {
            phase: handle.phase,
            handle,
            timestamp: self.frame.timestamp,
            message,
        });
    }

    fn settle(&mut self) {
        if self.config.timing == TimingMode::Manual {
            self.state = SchedulerState::Idle;
            return;
        }
        if self.queues.has_work() || self.config.keep_alive {
            self.state = SchedulerState::Idle;
            self.request_frame();
        } else {
            if let Some(handle) = self.driver_handle.take() {
                self.driver.stop(handle);
            }
            self.last_driven = None;
            self.state = SchedulerState::Idle;
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("callback panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("callback panicked: {s}")
    } else {
        "callback panicked".to_string()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scheduler/frameloop.rs"]
mod tests;
