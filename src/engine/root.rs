use crate::animation::progress::ProgressSource;
use crate::engine::config::EngineConfig;
use crate::foundation::error::FliplineResult;
use crate::projection::instance::MeasureInstance;
use crate::projection::node::{NodeId, ProjectionOptions};
use crate::projection::output::{TransformSink, TransformUpdate};
use crate::projection::tree::ProjectionTree;
use crate::scheduler::driver::{ClockDriver, Driver};
use crate::scheduler::frame::{FrameData, ManualTick};
use crate::scheduler::frameloop::{CallbackFault, CallbackHandle, FrameContext, FrameScheduler};
use crate::scheduler::phase::Phase;

/// Owns a projection tree and the scheduler that drives it.
///
/// Lifecycle calls only enqueue work; the tree is mutated inside ticks:
///
/// - `setup`: staged option changes and continuity registrations
/// - `read`: per-node measurement
/// - `update`: transition resolution
/// - `render`: projection, kept alive while anything is animating
///
/// Structural calls (`create_node`, `unmount`, `will_update`) take effect immediately.
pub struct AnimationRoot {
    tree: ProjectionTree,
    scheduler: FrameScheduler<ProjectionTree>,
    config: EngineConfig,
    setup: Option<CallbackHandle>,
    update: Option<CallbackHandle>,
    render: Option<CallbackHandle>,
}

impl std::fmt::Debug for AnimationRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationRoot")
            .field("nodes", &self.tree.len())
            .field("scheduler", &self.scheduler)
            .field("config", &self.config)
            .finish()
    }
}

impl AnimationRoot {
    /// Root driven by a wall clock.
    pub fn new(config: EngineConfig) -> FliplineResult<Self> {
        Self::with_driver(config, Box::new(ClockDriver::new()))
    }

    pub fn with_driver(config: EngineConfig, driver: Box<dyn Driver>) -> FliplineResult<Self> {
        config.validate()?;
        tracing::debug!(timing = ?config.scheduler.timing, "animation root created");
        Ok(Self {
            tree: ProjectionTree::new(config.projection_settings()),
            scheduler: FrameScheduler::new(config.scheduler, driver),
            config,
            setup: None,
            update: None,
            render: None,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tree(&self) -> &ProjectionTree {
        &self.tree
    }

    pub fn scheduler(&self) -> &FrameScheduler<ProjectionTree> {
        &self.scheduler
    }

    pub fn lead(&self, key: &str) -> Option<NodeId> {
        self.tree.lead(key)
    }

    pub fn can_use_hardware_acceleration(&self, id: NodeId) -> bool {
        self.tree.can_use_hardware_acceleration(id)
    }

    // --- lifecycle ---

    pub fn create_node(
        &mut self,
        parent: Option<NodeId>,
        options: ProjectionOptions,
    ) -> FliplineResult<NodeId> {
        self.tree.create_node(parent, options)
    }

    /// Bind `instance` now; register the continuity key and measure on the next tick.
    pub fn mount(
        &mut self,
        id: NodeId,
        instance: impl MeasureInstance + 'static,
    ) -> FliplineResult<()> {
        self.tree.bind_instance(id, Box::new(instance))?;
        self.tree.stage_attach(id)?;
        self.ensure_setup();
        self.schedule_update(id);
        Ok(())
    }

    /// Stage new options. A continuity-key change is applied atomically in the next setup
    /// phase, and a lead leaving its stack hands over to its successor in the same tick.
    pub fn set_options(&mut self, id: NodeId, options: ProjectionOptions) -> FliplineResult<()> {
        let node = self.tree.node(id)?;
        let leaving: Vec<NodeId> = match node.continuity_key() {
            Some(old) if options.layout_id.as_deref() != Some(old) => self
                .tree
                .registry()
                .stack(old)
                .map(|stack| stack.members().iter().copied().filter(|m| *m != id).collect())
                .unwrap_or_default(),
            _ => Vec::new(),
        };
        self.tree.stage_options(id, options)?;
        self.ensure_setup();
        // Successors are only known once setup applies the change; measure all of them.
        for member in leaving {
            self.schedule_update(member);
        }
        Ok(())
    }

    /// Snapshot the subtree before the host changes layout.
    pub fn will_update(&mut self, id: NodeId) -> FliplineResult<()> {
        self.tree.will_update(id)
    }

    /// Schedule measurement of the subtree and the resulting transitions.
    pub fn did_update(&mut self, id: NodeId) -> FliplineResult<()> {
        self.tree.node(id)?;
        self.schedule_update(id);
        Ok(())
    }

    /// Remove the subtree, cancel its pending callbacks, and animate any promoted lead.
    pub fn unmount(&mut self, id: NodeId) -> FliplineResult<()> {
        let unmounted = self.tree.unmount(id)?;
        for handle in &unmounted.callbacks {
            self.scheduler.cancel(*handle);
        }
        for lead in unmounted.promoted {
            self.schedule_update(lead);
        }
        Ok(())
    }

    /// Mark a node exiting (or present again). An exiting lead hands over its stack.
    pub fn set_present(&mut self, id: NodeId, present: bool) -> FliplineResult<()> {
        if let Some(lead) = self.tree.set_present(id, present)? {
            self.schedule_update(lead);
        }
        Ok(())
    }

    /// Drive the node's current or next transition from `source`.
    pub fn set_progress_source(
        &mut self,
        id: NodeId,
        source: impl ProgressSource + 'static,
    ) -> FliplineResult<()> {
        self.tree.set_progress_source(id, Box::new(source))
    }

    /// Schedule a host callback alongside the engine's own work.
    pub fn schedule<F>(&mut self, phase: Phase, callback: F, keep_alive: bool) -> CallbackHandle
    where
        F: FnMut(&mut FrameContext<'_, ProjectionTree>) -> FliplineResult<()> + 'static,
    {
        self.scheduler.schedule(phase, callback, keep_alive)
    }

    pub fn cancel(&mut self, handle: CallbackHandle) -> bool {
        self.scheduler.cancel(handle)
    }

    // --- ticking ---

    /// Run a tick if the driver is due. See [`FrameScheduler::pump`].
    pub fn pump(&mut self) -> Option<FrameData> {
        self.scheduler.pump(&mut self.tree)
    }

    pub fn tick(&mut self, timestamp: f64, delta: f64) -> FrameData {
        self.scheduler.tick(&mut self.tree, timestamp, delta)
    }

    /// Render one frame synchronously at an explicit time.
    pub fn render_frame(&mut self, at: ManualTick) -> FliplineResult<FrameData> {
        self.scheduler.render_frame(&mut self.tree, at)
    }

    pub fn take_updates(&mut self) -> Vec<TransformUpdate> {
        self.tree.take_updates()
    }

    /// Hand pending updates to `sink` in emission order. Returns how many were written.
    pub fn flush(&mut self, sink: &mut dyn TransformSink) -> FliplineResult<usize> {
        let updates = self.tree.take_updates();
        for update in &updates {
            sink.apply(update)?;
        }
        Ok(updates.len())
    }

    pub fn take_faults(&mut self) -> Vec<CallbackFault> {
        self.scheduler.take_faults()
    }

    /// Work is queued or a transition is still running.
    pub fn is_animating(&self) -> bool {
        self.tree.has_active_projection() || self.scheduler.has_pending_work()
    }

    // --- scheduling ---

    fn pending(&self, handle: Option<CallbackHandle>) -> bool {
        handle.is_some_and(|h| self.scheduler.is_pending(h))
    }

    fn ensure_setup(&mut self) {
        if self.pending(self.setup) {
            return;
        }
        self.setup = Some(self.scheduler.schedule(
            Phase::Setup,
            |cx| cx.context().apply_staged(),
            false,
        ));
    }

    fn schedule_update(&mut self, id: NodeId) {
        for node in self.tree.subtree(id) {
            let measuring = self
                .tree
                .tracked_callbacks(node)
                .iter()
                .any(|h| h.phase() == Phase::Read && self.scheduler.is_pending(*h));
            if measuring {
                continue;
            }
            let handle = self.scheduler.schedule(
                Phase::Read,
                move |cx| {
                    let handle = cx.handle();
                    let tree = cx.context();
                    tree.untrack_callback(node, handle);
                    tree.update_layout(node);
                    Ok(())
                },
                false,
            );
            self.tree.track_callback(node, handle);
        }

        if !self.pending(self.update) {
            self.update = Some(self.scheduler.schedule(
                Phase::Update,
                |cx| {
                    cx.context().resolve_targets();
                    Ok(())
                },
                false,
            ));
        }
        if !self.pending(self.render) {
            self.render = Some(self.scheduler.schedule(
                Phase::Render,
                |cx| {
                    let now = cx.frame().timestamp;
                    let tree = cx.context();
                    tree.render_projections(now);
                    if !tree.has_active_projection() {
                        cx.cancel_current();
                    }
                    Ok(())
                },
                true,
            ));
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/root.rs"]
mod tests;
