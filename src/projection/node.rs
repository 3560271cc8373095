//! Per-node projection state.

use std::fmt;

use crate::animation::progress::{ProgressSource, Timed};
use crate::foundation::geometry::{Delta, LayoutBox, calc_length, each_axis, translate_axis};
use crate::projection::instance::MeasureInstance;
use crate::projection::scale_correction::Length;
use crate::projection::transform;
use crate::scheduler::frameloop::CallbackHandle;

/// Handle to a node in a [`ProjectionTree`](super::tree::ProjectionTree).
///
/// Carries a generation counter so handles to unmounted nodes are detected after their slot
/// is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct NodeId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl NodeId {
    pub fn index(self) -> u32 {
        self.idx
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}@gen{})", self.idx, self.generation)
    }
}

/// Which parts of a layout change a node animates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    /// Measured (so descendants can be corrected) but never animates its own layout.
    Disabled,
    #[default]
    Full,
    /// Translation only: the previous box is resized to the new length.
    Position,
    /// Size only: the previous box is moved to the new minimum.
    Size,
}

impl LayoutMode {
    pub(crate) fn adjust_source(self, mut source: LayoutBox, layout: &LayoutBox) -> LayoutBox {
        match self {
            Self::Disabled | Self::Full => {}
            Self::Position => each_axis(|axis| {
                let len = calc_length(layout.axis(axis));
                let a = source.axis_mut(axis);
                a.max = a.min + len;
            }),
            Self::Size => each_axis(|axis| {
                let distance = layout.axis(axis).min - source.axis(axis).min;
                translate_axis(source.axis_mut(axis), distance);
            }),
        }
        source
    }
}

/// Host-facing node options.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ProjectionOptions {
    pub layout: LayoutMode,
    /// Continuity key shared by instances that represent the same visual element.
    pub layout_id: Option<String>,
    /// Stops relative targets and tree scale from propagating into this subtree.
    pub layout_root: bool,
    /// When set and unchanged since the last snapshot, `will_update` is skipped.
    pub layout_dependency: Option<String>,
    /// Corner radius to keep visually constant while the node is scaled.
    pub border_radius: Option<Length>,
}

impl ProjectionOptions {
    pub fn keyed(layout_id: impl Into<String>) -> Self {
        Self {
            layout_id: Some(layout_id.into()),
            ..Self::default()
        }
    }
}

/// A running layout transition.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LayoutAnimation {
    /// Page-space box the node appears at when progress is 0.
    pub(crate) source: LayoutBox,
    pub(crate) started_at: Option<f64>,
    pub(crate) progress: f64,
    pub(crate) timed: Timed,
}

/// Binds a node's target to an animating ancestor.
#[derive(Clone, Copy, Debug)]
pub(crate) struct RelativeLink {
    pub(crate) parent: NodeId,
    /// Start box relative to the parent's start box.
    pub(crate) from: LayoutBox,
    /// Final box relative to the parent's final layout.
    pub(crate) to: LayoutBox,
}

/// One rendered instance's projected geometry.
pub struct ProjectionNode {
    pub(crate) id: NodeId,
    pub(crate) depth: usize,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) options: ProjectionOptions,
    pub(crate) instance: Option<Box<dyn MeasureInstance>>,
    pub(crate) attached: bool,
    pub(crate) present: bool,

    pub(crate) layout: Option<LayoutBox>,
    pub(crate) snapshot: Option<LayoutBox>,
    pub(crate) snapshot_dependency: Option<String>,
    pub(crate) needs_resolve: bool,

    pub(crate) animation: Option<LayoutAnimation>,
    pub(crate) animation_delta: Option<Delta>,
    pub(crate) link: Option<RelativeLink>,
    pub(crate) relative_target: Option<LayoutBox>,
    pub(crate) target: Option<LayoutBox>,
    pub(crate) target_delta: Option<Delta>,
    pub(crate) progress: f64,

    pub(crate) resume_from: Option<NodeId>,
    pub(crate) resume_box: Option<LayoutBox>,

    pub(crate) progress_source: Option<Box<dyn ProgressSource>>,
    pub(crate) last_transform: Option<String>,
    pub(crate) callbacks: Vec<CallbackHandle>,
}

impl fmt::Debug for ProjectionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectionNode")
            .field("id", &self.id)
            .field("depth", &self.depth)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("options", &self.options)
            .field("layout", &self.layout)
            .field("snapshot", &self.snapshot)
            .field("target_delta", &self.target_delta)
            .field("resume_from", &self.resume_from)
            .finish_non_exhaustive()
    }
}

impl ProjectionNode {
    pub(crate) fn new(
        id: NodeId,
        parent: Option<NodeId>,
        depth: usize,
        options: ProjectionOptions,
    ) -> Self {
        Self {
            id,
            depth,
            parent,
            children: Vec::new(),
            options,
            instance: None,
            attached: false,
            present: true,
            layout: None,
            snapshot: None,
            snapshot_dependency: None,
            needs_resolve: false,
            animation: None,
            animation_delta: None,
            link: None,
            relative_target: None,
            target: None,
            target_delta: None,
            progress: 1.0,
            resume_from: None,
            resume_box: None,
            progress_source: None,
            last_transform: None,
            callbacks: Vec::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn options(&self) -> &ProjectionOptions {
        &self.options
    }

    pub fn continuity_key(&self) -> Option<&str> {
        self.options.layout_id.as_deref()
    }

    pub fn is_mounted(&self) -> bool {
        self.instance.is_some()
    }

    pub fn is_present(&self) -> bool {
        self.present
    }

    /// Last measured box.
    pub fn layout(&self) -> Option<LayoutBox> {
        self.layout
    }

    /// Box captured by the most recent `will_update`.
    pub fn snapshot(&self) -> Option<LayoutBox> {
        self.snapshot
    }

    /// Page-space box the node is projected onto this frame.
    pub fn target(&self) -> Option<LayoutBox> {
        self.target
    }

    pub fn target_delta(&self) -> Option<Delta> {
        self.target_delta
    }

    pub fn relative_target(&self) -> Option<LayoutBox> {
        self.relative_target
    }

    /// Delta recorded when the current transition started (new layout -> previous box).
    pub fn animation_delta(&self) -> Option<Delta> {
        self.animation_delta
    }

    pub fn resume_from(&self) -> Option<NodeId> {
        self.resume_from
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Holds an active geometric delta (or relative target) and a layout to apply it to.
    pub fn is_projecting(&self) -> bool {
        self.layout.is_some() && (self.target_delta.is_some() || self.relative_target.is_some())
    }

    /// Read the bound instance's current box. No-op (`None`) when nothing is bound.
    pub fn measure(&self) -> Option<LayoutBox> {
        self.instance.as_ref().and_then(|i| i.measure())
    }

    /// Render the recorded animation delta interpolated toward identity.
    pub fn build_layout_animation_transform(&self, progress: f64) -> String {
        match &self.animation_delta {
            Some(delta) => transform::build_layout_animation_transform(delta, progress),
            None => transform::IDENTITY_TRANSFORM.to_string(),
        }
    }

    /// Box the node currently appears at: projected target, else snapshot, else layout.
    pub(crate) fn visual_box(&self) -> Option<LayoutBox> {
        self.target.or(self.snapshot).or(self.layout)
    }

    pub(crate) fn clear_projection(&mut self) {
        self.animation = None;
        self.animation_delta = None;
        self.link = None;
        self.relative_target = None;
        self.target = None;
        self.target_delta = None;
        self.resume_from = None;
        self.resume_box = None;
        self.progress_source = None;
        self.progress = 1.0;
    }
}
