use crate::animation::progress::{Ease, Timed};
use crate::foundation::error::{FliplineError, FliplineResult};
use crate::projection::tree::ProjectionSettings;
use crate::scheduler::frameloop::SchedulerConfig;

/// Default transition duration in milliseconds.
pub const DEFAULT_TRANSITION_MS: f64 = 300.0;

/// Configuration for an [`AnimationRoot`](super::AnimationRoot).
///
/// Every field has a default, so partial JSON documents are accepted.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub scheduler: SchedulerConfig,
    /// Timing for transitions without an explicit progress source.
    pub transition: Timed,
    /// Allow the cheap interpolated transform for nodes that qualify.
    pub hardware_acceleration: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            transition: Timed::new(DEFAULT_TRANSITION_MS, Ease::default()),
            hardware_acceleration: true,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(s: &str) -> FliplineResult<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> FliplineResult<()> {
        self.scheduler.validate()?;
        let t = &self.transition;
        if !t.duration_ms.is_finite() || t.duration_ms < 0.0 {
            return Err(FliplineError::validation(
                "transition.duration_ms must be finite and >= 0",
            ));
        }
        if !t.delay_ms.is_finite() || t.delay_ms < 0.0 {
            return Err(FliplineError::validation(
                "transition.delay_ms must be finite and >= 0",
            ));
        }
        Ok(())
    }

    pub fn projection_settings(&self) -> ProjectionSettings {
        ProjectionSettings {
            hardware_acceleration: self.hardware_acceleration,
            transition: self.transition,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/config.rs"]
mod tests;
