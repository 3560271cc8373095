//! Flipline keeps rendered elements visually continuous across layout changes.
//!
//! When a host re-lays-out its UI, each projected node is measured before and after the
//! change and then drawn with a per-frame transform that carries it from where it was to
//! where it now is. Nested nodes are corrected for their ancestors' transforms, and nodes
//! that share a continuity key hand their position over when one replaces another.
//!
//! - Build a [`ProjectionTree`] of [`NodeId`]s (usually through an [`AnimationRoot`])
//! - Call `will_update` before a layout change and `did_update` after it
//! - Tick the [`FrameScheduler`] and flush [`TransformUpdate`]s into a [`TransformSink`]
#![forbid(unsafe_code)]

mod foundation;

pub mod animation;
pub mod engine;
pub mod projection;
pub mod scenario;
pub mod scheduler;

pub use crate::foundation::error::{FliplineError, FliplineResult};
pub use crate::foundation::geometry::{
    AXES, Axis, AxisDelta, AxisName, Delta, LayoutBox, apply_axis_delta, apply_box_delta,
    apply_point_delta, apply_relative_box, aspect_ratio, box_equals, box_equals_rounded,
    calc_axis_delta, calc_box_delta, calc_box_delta_with_origin, calc_length,
    calc_relative_axis, calc_relative_box, each_axis, is_delta_zero, is_near, mix, mix_axis,
    mix_box, scale_point, translate_axis,
};

pub use crate::animation::progress::{Ease, Progress, ProgressSource, Timed, ValueStream};
pub use crate::engine::{AnimationRoot, EngineConfig};
pub use crate::projection::acceleration::HardwareAccelerationAnalyzer;
pub use crate::projection::instance::{MeasureInstance, SharedLayout};
pub use crate::projection::node::{LayoutMode, NodeId, ProjectionNode, ProjectionOptions};
pub use crate::projection::output::{InMemorySink, TransformSink, TransformUpdate};
pub use crate::projection::scale_correction::{Length, correct_border_radius};
pub use crate::projection::stack::{ContinuityStack, ContinuityStackRegistry, Promotion, Relink};
pub use crate::projection::transform::{
    IDENTITY_TRANSFORM, build_layout_animation_transform, build_projection_transform,
};
pub use crate::projection::tree::{ProjectionSettings, ProjectionTree, Unmounted};
pub use crate::scenario::{ReplayFrame, ReplayReport, ReplayUpdate, Scenario, replay};
pub use crate::scheduler::driver::{ClockDriver, Driver, DriverHandle, ManualClock, ManualDriver};
pub use crate::scheduler::frame::{FrameData, ManualTick, is_synchronous_render};
pub use crate::scheduler::frameloop::{
    CallbackFault, CallbackHandle, FrameContext, FrameScheduler, SchedulerConfig, SchedulerState,
    TickStats, TimingMode,
};
pub use crate::scheduler::phase::Phase;
