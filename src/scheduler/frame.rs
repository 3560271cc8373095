use std::cell::Cell;

use crate::foundation::error::{FliplineError, FliplineResult};

/// Frame rate assumed by [`ManualTick::frame`] when no fps is given.
pub const DEFAULT_MANUAL_FPS: f64 = 30.0;
/// Delta used when nothing better is known (first driven tick, timestamp-only manual tick).
pub const DEFAULT_DELTA_MS: f64 = 1000.0 / 60.0;

/// Per-tick timing record, updated exactly once per tick by the scheduler.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
pub struct FrameData {
    /// Milliseconds.
    pub timestamp: f64,
    /// Milliseconds since the previous tick.
    pub delta: f64,
    pub is_processing: bool,
}

/// Caller-supplied time for a synchronous tick: either an explicit timestamp or a frame
/// number at some fps.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ManualTick {
    #[serde(default)]
    pub timestamp: Option<f64>,
    #[serde(default)]
    pub frame: Option<f64>,
    #[serde(default)]
    pub fps: Option<f64>,
    #[serde(default)]
    pub delta: Option<f64>,
}

impl ManualTick {
    pub fn at(timestamp: f64) -> Self {
        Self {
            timestamp: Some(timestamp),
            ..Self::default()
        }
    }

    pub fn frame(frame: f64) -> Self {
        Self {
            frame: Some(frame),
            ..Self::default()
        }
    }

    pub fn with_fps(mut self, fps: f64) -> Self {
        self.fps = Some(fps);
        self
    }

    pub fn with_delta(mut self, delta: f64) -> Self {
        self.delta = Some(delta);
        self
    }

    /// Resolve to `(timestamp, delta)` in milliseconds.
    ///
    /// Frame-based ticks map to `frame / fps * 1000` and default their delta to one frame
    /// interval; timestamp-only ticks default to [`DEFAULT_DELTA_MS`].
    pub fn resolve(&self) -> FliplineResult<(f64, f64)> {
        let explicit_delta = match self.delta {
            Some(d) if !d.is_finite() || d < 0.0 => {
                return Err(FliplineError::validation(
                    "manual tick delta must be finite and >= 0",
                ));
            }
            other => other,
        };

        if let Some(ts) = self.timestamp {
            if !ts.is_finite() {
                return Err(FliplineError::validation(
                    "manual tick timestamp must be finite",
                ));
            }
            return Ok((ts, explicit_delta.unwrap_or(DEFAULT_DELTA_MS)));
        }

        let Some(frame) = self.frame else {
            return Err(FliplineError::validation(
                "manual tick needs a timestamp or a frame",
            ));
        };
        let fps = self.fps.unwrap_or(DEFAULT_MANUAL_FPS);
        if !fps.is_finite() || fps <= 0.0 {
            return Err(FliplineError::validation("manual tick fps must be > 0"));
        }
        if !frame.is_finite() {
            return Err(FliplineError::validation("manual tick frame must be finite"));
        }
        let timestamp = frame / fps * 1000.0;
        Ok((timestamp, explicit_delta.unwrap_or(1000.0 / fps)))
    }
}

thread_local! {
    static SYNCHRONOUS_RENDER: Cell<bool> = const { Cell::new(false) };
}

/// Whether the current thread is inside a manual (synchronous) tick.
pub fn is_synchronous_render() -> bool {
    SYNCHRONOUS_RENDER.with(Cell::get)
}

/// Sets the synchronous-render flag for its lifetime and restores the previous value on drop,
/// including during unwinding.
pub(crate) struct SynchronousRenderGuard {
    previous: bool,
}

impl SynchronousRenderGuard {
    pub(crate) fn enter() -> Self {
        let previous = SYNCHRONOUS_RENDER.with(|flag| flag.replace(true));
        Self { previous }
    }
}

impl Drop for SynchronousRenderGuard {
    fn drop(&mut self) {
        SYNCHRONOUS_RENDER.with(|flag| flag.set(self.previous));
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scheduler/frame.rs"]
mod tests;
