use std::collections::{BTreeMap, HashSet};

use crate::engine::config::EngineConfig;
use crate::foundation::error::{FliplineError, FliplineResult};
use crate::foundation::geometry::LayoutBox;
use crate::projection::node::ProjectionOptions;

fn default_fps() -> f64 {
    60.0
}

/// A scripted sequence of layout changes replayed against an animation root.
///
/// Frame `n` renders at `n / fps` seconds. Steps apply right before the frame they name.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub config: EngineConfig,
    #[serde(default = "default_fps")]
    pub fps: f64,
    /// Number of frames to render.
    pub frames: u64,
    /// Nodes mounted before frame 0, parents before children.
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NodeSpec {
    pub id: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub options: ProjectionOptions,
    pub layout: LayoutBox,
    /// Per-frame progress values for this node's first transition.
    #[serde(default)]
    pub progress: Option<Vec<f64>>,
}

/// Host changes applied together, as one render of the host UI.
///
/// Every live root is snapshotted before the changes and re-measured after them.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Step {
    pub frame: u64,
    /// New boxes for existing nodes.
    pub layout: BTreeMap<String, LayoutBox>,
    pub options: BTreeMap<String, ProjectionOptions>,
    /// Per-frame progress values for the transition this step starts.
    pub progress: BTreeMap<String, Vec<f64>>,
    /// Nodes leaving with presence: they stay mounted but give up their continuity lead.
    pub exit: Vec<String>,
    pub unmount: Vec<String>,
    pub mount: Vec<NodeSpec>,
}

impl Scenario {
    pub fn from_json_str(s: &str) -> FliplineResult<Self> {
        let scenario: Self = serde_json::from_str(s)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Static checks. Node references inside steps are checked during replay, where the set
    /// of live nodes is known.
    pub fn validate(&self) -> FliplineResult<()> {
        self.config.validate()?;
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(FliplineError::validation("scenario fps must be finite and > 0"));
        }
        if self.frames == 0 {
            return Err(FliplineError::validation("scenario frames must be > 0"));
        }

        let mut seen = HashSet::new();
        for node in &self.nodes {
            if !seen.insert(node.id.as_str()) {
                return Err(FliplineError::validation(format!(
                    "duplicate node id '{}'",
                    node.id
                )));
            }
            if let Some(parent) = &node.parent {
                if !seen.contains(parent.as_str()) || parent == &node.id {
                    return Err(FliplineError::validation(format!(
                        "node '{}' references parent '{parent}' before it is declared",
                        node.id
                    )));
                }
            }
        }

        let mut last: Option<u64> = None;
        for step in &self.steps {
            if last.is_some_and(|l| step.frame <= l) {
                return Err(FliplineError::validation(format!(
                    "steps must have strictly increasing frames (frame {})",
                    step.frame
                )));
            }
            if step.frame >= self.frames {
                return Err(FliplineError::validation(format!(
                    "step frame {} is outside the {} rendered frames",
                    step.frame, self.frames
                )));
            }
            last = Some(step.frame);
        }
        Ok(())
    }

    /// Milliseconds between frames.
    pub fn frame_ms(&self) -> f64 {
        1000.0 / self.fps
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scenario/model.rs"]
mod tests;
