use crate::foundation::error::FliplineResult;
use crate::projection::node::NodeId;

/// A transform written to one node during a render pass.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct TransformUpdate {
    pub node: NodeId,
    pub timestamp: f64,
    pub transform: String,
    /// Produced by the cheap interpolated path rather than the corrective one.
    pub accelerated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<String>,
}

/// Receiver for transform updates flushed from an animation root.
pub trait TransformSink {
    fn apply(&mut self, update: &TransformUpdate) -> FliplineResult<()>;
}

/// Collects every update in order. Useful for tests and replay.
#[derive(Debug, Default)]
pub struct InMemorySink {
    pub updates: Vec<TransformUpdate>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest transform written to `node`.
    pub fn latest(&self, node: NodeId) -> Option<&str> {
        self.updates
            .iter()
            .rev()
            .find(|u| u.node == node)
            .map(|u| u.transform.as_str())
    }

    pub fn for_node(&self, node: NodeId) -> impl Iterator<Item = &TransformUpdate> {
        self.updates.iter().filter(move |u| u.node == node)
    }
}

impl TransformSink for InMemorySink {
    fn apply(&mut self, update: &TransformUpdate) -> FliplineResult<()> {
        self.updates.push(update.clone());
        Ok(())
    }
}
