//! Timing sources for driven (non-manual) scheduling.
//!
//! A [`Driver`] only answers two questions: "keep producing ticks" (`start`/`stop`) and "what
//! time is it" (`now`). The host calls [`FrameScheduler::pump`](super::FrameScheduler::pump)
//! from its own per-frame callback; swapping the driver changes nothing else.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Token returned by [`Driver::start`], passed back to [`Driver::stop`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DriverHandle(pub u64);

/// Pluggable per-frame timing source. Timestamps are milliseconds.
///
/// A driver never invokes the scheduler itself. The host owns the per-frame callback (a
/// display-link, a render loop) and calls [`FrameScheduler::pump`](super::FrameScheduler::pump)
/// from it; `start`/`stop` only tell the host whether frames are wanted.
pub trait Driver {
    fn start(&mut self, keep_alive: bool) -> DriverHandle;
    fn stop(&mut self, handle: DriverHandle);
    fn now(&self) -> f64;
}

/// Wall-clock driver backed by [`Instant`]. `now()` is milliseconds since construction.
#[derive(Debug)]
pub struct ClockDriver {
    epoch: Instant,
    next: u64,
    active: Option<DriverHandle>,
}

impl Default for ClockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockDriver {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            next: 0,
            active: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }
}

impl Driver for ClockDriver {
    fn start(&mut self, _keep_alive: bool) -> DriverHandle {
        self.next += 1;
        let handle = DriverHandle(self.next);
        self.active = Some(handle);
        handle
    }

    fn stop(&mut self, handle: DriverHandle) {
        if self.active == Some(handle) {
            self.active = None;
        }
    }

    fn now(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }
}

/// Externally clocked driver. Time only moves when the paired [`ManualClock`] is advanced.
#[derive(Debug)]
pub struct ManualDriver {
    clock: ManualClock,
    next: u64,
}

impl ManualDriver {
    /// Create a driver plus the clock handle used to steer it.
    pub fn new() -> (Self, ManualClock) {
        let clock = ManualClock::default();
        (
            Self {
                clock: clock.clone(),
                next: 0,
            },
            clock,
        )
    }
}

impl Driver for ManualDriver {
    fn start(&mut self, _keep_alive: bool) -> DriverHandle {
        self.next += 1;
        let handle = DriverHandle(self.next);
        self.clock.active.set(Some(handle));
        self.clock.starts.set(self.clock.starts.get() + 1);
        handle
    }

    fn stop(&mut self, handle: DriverHandle) {
        if self.clock.active.get() == Some(handle) {
            self.clock.active.set(None);
        }
    }

    fn now(&self) -> f64 {
        self.clock.now.get()
    }
}

/// Shared handle to a [`ManualDriver`]'s time and run state.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
    active: Rc<Cell<Option<DriverHandle>>>,
    starts: Rc<Cell<u32>>,
}

impl ManualClock {
    pub fn set(&self, now_ms: f64) {
        self.now.set(now_ms);
    }

    pub fn advance(&self, by_ms: f64) {
        self.now.set(self.now.get() + by_ms);
    }

    pub fn now(&self) -> f64 {
        self.now.get()
    }

    /// Whether the scheduler currently wants ticks.
    pub fn is_running(&self) -> bool {
        self.active.get().is_some()
    }

    /// How many times the driver has been started.
    pub fn start_count(&self) -> u32 {
        self.starts.get()
    }
}
