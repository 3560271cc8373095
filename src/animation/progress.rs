//! Transition progress: the seam between the projection engine and whatever produces the
//! animated value stream (a spring solver, a keyframe evaluator, a timeline).
//!
//! The engine only ever asks a [`ProgressSource`] "how far along are you after `elapsed_ms`?"
//! and renders the node's delta at that progress. [`Timed`] is the built-in source used when
//! a node has no source of its own.

/// Easing curve applied by [`Timed`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ease {
    Linear,
    InQuad,
    OutQuad,
    InOutQuad,
    InCubic,
    #[default]
    OutCubic,
    InOutCubic,
}

impl Ease {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::InQuad => t * t,
            Self::OutQuad => 1.0 - (1.0 - t).powi(2),
            Self::InOutQuad if t < 0.5 => 2.0 * t * t,
            Self::InOutQuad => 1.0 - (-2.0 * t + 2.0).powi(2) / 2.0,
            Self::InCubic => t.powi(3),
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic if t < 0.5 => 4.0 * t.powi(3),
            Self::InOutCubic => 1.0 - (-2.0 * t + 2.0).powi(3) / 2.0,
        }
    }
}

/// One sample of a transition: `value` in `[0, 1]`, `done` once the source has settled.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Progress {
    pub value: f64,
    pub done: bool,
}

impl Progress {
    pub fn running(value: f64) -> Self {
        Self { value, done: false }
    }

    pub fn finished() -> Self {
        Self {
            value: 1.0,
            done: true,
        }
    }

    /// Clamp to `[0, 1]`. NaN counts as finished.
    pub fn sanitized(self) -> Self {
        if self.value.is_nan() {
            return Self::finished();
        }
        Self {
            value: self.value.clamp(0.0, 1.0),
            done: self.done,
        }
    }
}

/// Produces transition progress for a node, sampled once per rendered tick.
pub trait ProgressSource {
    fn sample(&mut self, elapsed_ms: f64) -> Progress;
}

impl<F> ProgressSource for F
where
    F: FnMut(f64) -> Progress,
{
    fn sample(&mut self, elapsed_ms: f64) -> Progress {
        self(elapsed_ms)
    }
}

/// Fixed-duration eased progress.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Timed {
    pub duration_ms: f64,
    #[serde(default)]
    pub delay_ms: f64,
    #[serde(default)]
    pub ease: Ease,
}

impl Timed {
    pub fn new(duration_ms: f64, ease: Ease) -> Self {
        Self {
            duration_ms,
            delay_ms: 0.0,
            ease,
        }
    }
}

impl ProgressSource for Timed {
    fn sample(&mut self, elapsed_ms: f64) -> Progress {
        if self.duration_ms <= 0.0 || !self.duration_ms.is_finite() {
            return Progress::finished();
        }
        let t = (elapsed_ms - self.delay_ms) / self.duration_ms;
        if t >= 1.0 {
            Progress::finished()
        } else {
            Progress::running(self.ease.apply(t))
        }
    }
}

/// Replays a pre-generated value stream at a fixed frame interval.
///
/// The last value is held once the stream is exhausted and the transition reports done.
#[derive(Clone, Debug, PartialEq)]
pub struct ValueStream {
    values: Vec<f64>,
    frame_ms: f64,
}

impl ValueStream {
    pub fn new(values: Vec<f64>, frame_ms: f64) -> Self {
        Self { values, frame_ms }
    }
}

impl ProgressSource for ValueStream {
    fn sample(&mut self, elapsed_ms: f64) -> Progress {
        let Some(last) = self.values.len().checked_sub(1) else {
            return Progress::finished();
        };
        if self.frame_ms <= 0.0 {
            return Progress {
                value: self.values[last],
                done: true,
            };
        }
        let idx = (elapsed_ms.max(0.0) / self.frame_ms).floor() as usize;
        if idx >= last {
            Progress {
                value: self.values[last],
                done: true,
            }
        } else {
            Progress::running(self.values[idx])
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/progress.rs"]
mod tests;
