//! Node arena and the layout-continuity algorithm.
//!
//! A transition runs in three steps:
//!
//! 1. `will_update` snapshots the boxes of a subtree before the host mutates layout.
//! 2. `update_layout` (read phase) measures new layouts; `resolve_targets` (update phase)
//!    compares snapshots with layouts, starts transitions, and links descendants to the nearest
//!    animating ancestor.
//! 3. `render_projections` (render phase) samples progress, computes each node's target box,
//!    corrects for ancestor transforms top-down, and records one transform per change.
//!
//! All operations here are immediate. [`AnimationRoot`](crate::engine::AnimationRoot) decides
//! which of them run inside which scheduler phase.

use std::collections::{HashMap, HashSet};

use kurbo::Vec2;

use crate::animation::progress::{ProgressSource, Timed};
use crate::foundation::error::{FliplineError, FliplineResult};
use crate::foundation::geometry::{
    Delta, LayoutBox, apply_box_delta, apply_relative_box, box_equals, calc_box_delta,
    calc_relative_box, mix_box,
};
use crate::projection::acceleration::HardwareAccelerationAnalyzer;
use crate::projection::instance::MeasureInstance;
use crate::projection::node::{
    LayoutAnimation, LayoutMode, NodeId, ProjectionNode, ProjectionOptions, RelativeLink,
};
use crate::projection::output::TransformUpdate;
use crate::projection::scale_correction::correct_border_radius;
use crate::projection::stack::{ContinuityStackRegistry, Promotion};
use crate::projection::transform::{
    IDENTITY_TRANSFORM, build_layout_animation_transform, build_projection_transform,
};
use crate::scheduler::frameloop::CallbackHandle;

/// Tree-wide projection settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectionSettings {
    /// Allow the cheap interpolated path when a node qualifies.
    pub hardware_acceleration: bool,
    /// Timing used by transitions without an explicit progress source.
    pub transition: Timed,
}

impl Default for ProjectionSettings {
    fn default() -> Self {
        Self {
            hardware_acceleration: true,
            transition: Timed::new(300.0, Default::default()),
        }
    }
}

/// Result of removing a subtree.
#[derive(Debug, Default)]
pub struct Unmounted {
    /// Removed nodes, descendants first.
    pub removed: Vec<NodeId>,
    /// Scheduler callbacks that referenced removed nodes.
    pub callbacks: Vec<CallbackHandle>,
    /// Surviving nodes promoted to lead because a removed node led their stack.
    pub promoted: Vec<NodeId>,
}

/// Last visual box of a lead whose stack emptied. Consumed by the next node to lead that key.
#[derive(Clone, Copy, Debug)]
struct DepartedLead {
    node: NodeId,
    visual: LayoutBox,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    node: Option<ProjectionNode>,
}

#[derive(Debug, Default)]
pub struct ProjectionTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    roots: Vec<NodeId>,
    registry: ContinuityStackRegistry,
    departed: HashMap<String, DepartedLead>,
    staged_options: Vec<(NodeId, ProjectionOptions)>,
    staged_attach: Vec<NodeId>,
    settings: ProjectionSettings,
    updates: Vec<TransformUpdate>,
}

impl ProjectionTree {
    pub fn new(settings: ProjectionSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &ProjectionSettings {
        &self.settings
    }

    pub fn registry(&self) -> &ContinuityStackRegistry {
        &self.registry
    }

    pub fn lead(&self, key: &str) -> Option<NodeId> {
        self.registry.lead(key)
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&ProjectionNode> {
        self.slots
            .get(id.idx as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_ref())
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut ProjectionNode> {
        self.slots
            .get_mut(id.idx as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_mut())
    }

    pub fn node(&self, id: NodeId) -> FliplineResult<&ProjectionNode> {
        self.get(id).ok_or_else(|| stale(id))
    }

    fn node_mut(&mut self, id: NodeId) -> FliplineResult<&mut ProjectionNode> {
        self.get_mut(id).ok_or_else(|| stale(id))
    }

    // --- structure ---

    /// Create a node under `parent` (or as a new root). It is not measurable until mounted.
    pub fn create_node(
        &mut self,
        parent: Option<NodeId>,
        options: ProjectionOptions,
    ) -> FliplineResult<NodeId> {
        let depth = match parent {
            Some(p) => self.node(p)?.depth + 1,
            None => 0,
        };
        let id = match self.free.pop() {
            Some(idx) => NodeId {
                idx,
                generation: self.slots[idx as usize].generation,
            },
            None => {
                let idx = u32::try_from(self.slots.len())
                    .map_err(|_| FliplineError::projection("node arena exhausted"))?;
                self.slots.push(Slot::default());
                NodeId { idx, generation: 0 }
            }
        };
        self.slots[id.idx as usize].node = Some(ProjectionNode::new(id, parent, depth, options));
        match parent {
            Some(p) => self.node_mut(p)?.children.push(id),
            None => self.roots.push(id),
        }
        Ok(id)
    }

    /// Bind a measurement capability without touching continuity stacks.
    pub fn bind_instance(
        &mut self,
        id: NodeId,
        instance: Box<dyn MeasureInstance>,
    ) -> FliplineResult<()> {
        self.node_mut(id)?.instance = Some(instance);
        Ok(())
    }

    /// Bind the instance and register the node under its continuity key.
    pub fn mount(&mut self, id: NodeId, instance: Box<dyn MeasureInstance>) -> FliplineResult<()> {
        self.bind_instance(id, instance)?;
        self.attach(id)
    }

    /// Register a mounted node in its continuity stack. Idempotent.
    pub fn attach(&mut self, id: NodeId) -> FliplineResult<()> {
        let node = self.node_mut(id)?;
        if node.attached {
            return Ok(());
        }
        node.attached = true;
        let Some(key) = node.options.layout_id.clone() else {
            return Ok(());
        };
        let promotion = self.registry.add(&key, id);
        self.resume_after_join(id, &promotion);
        Ok(())
    }

    /// Depth-first pre-order, roots in creation order.
    pub fn dfs_order(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let Some(node) = self.get(id) else { continue };
            out.push(id);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// `id` and its descendants in pre-order.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            let Some(node) = self.get(cur) else { continue };
            out.push(cur);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    // --- options ---

    /// Apply options now. A continuity-key change moves the node between stacks atomically.
    ///
    /// When the node led the stack it left, the promoted successor resumes from the node's
    /// current box, as on unmount, and is returned.
    pub fn set_options(
        &mut self,
        id: NodeId,
        options: ProjectionOptions,
    ) -> FliplineResult<Option<NodeId>> {
        let node = self.node_mut(id)?;
        let old_key = node.options.layout_id.clone();
        let attached = node.attached;
        node.options = options;
        let new_key = node.options.layout_id.clone();

        if !attached || old_key == new_key {
            return Ok(None);
        }
        let relink = self
            .registry
            .relink(id, old_key.as_deref(), new_key.as_deref());
        tracing::debug!(?id, ?old_key, ?new_key, "continuity key changed");
        let promoted = relink
            .left
            .and_then(|left| left.new_lead)
            .filter(|lead| *lead != id);
        if let Some(lead) = promoted {
            self.resume_from_node(lead, id);
        }
        if let Some(joined) = relink.joined {
            self.resume_after_join(id, &joined);
        }
        Ok(promoted)
    }

    /// Queue options to be applied by [`apply_staged`](Self::apply_staged).
    pub fn stage_options(&mut self, id: NodeId, options: ProjectionOptions) -> FliplineResult<()> {
        self.node(id)?;
        self.staged_options.push((id, options));
        Ok(())
    }

    /// Queue a stack registration to be applied by [`apply_staged`](Self::apply_staged).
    pub fn stage_attach(&mut self, id: NodeId) -> FliplineResult<()> {
        self.node(id)?;
        self.staged_attach.push(id);
        Ok(())
    }

    pub fn has_staged(&self) -> bool {
        !self.staged_options.is_empty() || !self.staged_attach.is_empty()
    }

    /// Apply staged option changes, then staged registrations, in staging order.
    ///
    /// Entries for nodes unmounted since staging are dropped.
    pub fn apply_staged(&mut self) -> FliplineResult<()> {
        for (id, options) in std::mem::take(&mut self.staged_options) {
            if self.contains(id) {
                self.set_options(id, options)?;
            }
        }
        for id in std::mem::take(&mut self.staged_attach) {
            if self.contains(id) {
                self.attach(id)?;
            }
        }
        Ok(())
    }

    /// Mark a node present or exiting. An exiting lead hands its stack to the most recent
    /// present member, which is returned.
    pub fn set_present(&mut self, id: NodeId, present: bool) -> FliplineResult<Option<NodeId>> {
        let node = self.node_mut(id)?;
        node.present = present;
        if present {
            return Ok(None);
        }
        let Some(key) = node.options.layout_id.clone() else {
            return Ok(None);
        };
        let slots = &self.slots;
        let is_present = |m: NodeId| {
            slots
                .get(m.idx as usize)
                .filter(|s| s.generation == m.generation)
                .and_then(|s| s.node.as_ref())
                .is_some_and(|n| n.present)
        };
        let Some(promotion) = self.registry.relegate(&key, id, is_present) else {
            return Ok(None);
        };
        let promoted = promotion.new_lead;
        if let Some(lead) = promoted {
            self.resume_from_node(lead, id);
        }
        Ok(promoted)
    }

    pub fn set_progress_source(
        &mut self,
        id: NodeId,
        source: Box<dyn ProgressSource>,
    ) -> FliplineResult<()> {
        self.node_mut(id)?.progress_source = Some(source);
        Ok(())
    }

    /// Override the active target delta. Mostly useful to hosts driving projection by hand.
    pub fn set_target_delta(&mut self, id: NodeId, delta: Option<Delta>) -> FliplineResult<()> {
        self.node_mut(id)?.target_delta = delta;
        Ok(())
    }

    /// Resume the next transition from `from`'s current visual box.
    pub fn set_resume_from(&mut self, id: NodeId, from: Option<NodeId>) -> FliplineResult<()> {
        self.node(id)?;
        match from {
            Some(from) => self.resume_from_node(id, from),
            None => {
                let node = self.node_mut(id)?;
                node.resume_from = None;
                node.resume_box = None;
            }
        }
        Ok(())
    }

    fn resume_after_join(&mut self, id: NodeId, promotion: &Promotion) {
        match promotion.prev_lead {
            Some(prev) if self.contains(prev) => self.resume_from_node(id, prev),
            _ => {
                if let Some(departed) = self.departed.remove(&promotion.key) {
                    if let Some(node) = self.get_mut(id) {
                        node.resume_from = Some(departed.node);
                        node.resume_box = Some(departed.visual);
                    }
                }
            }
        }
    }

    fn resume_from_node(&mut self, id: NodeId, from: NodeId) {
        let visual = self.get(from).and_then(ProjectionNode::visual_box);
        if let Some(node) = self.get_mut(id) {
            node.resume_from = Some(from);
            node.resume_box = visual;
        }
    }

    // --- measurement ---

    /// Snapshot `id` and its descendants before the host mutates layout.
    ///
    /// Nodes whose `layout_dependency` is set and unchanged since their last snapshot keep it.
    /// A node mid-transition snapshots the box it is currently projected onto.
    pub fn will_update(&mut self, id: NodeId) -> FliplineResult<()> {
        self.node(id)?;
        for n in self.subtree(id) {
            let Some(node) = self.get_mut(n) else { continue };
            if let Some(dep) = &node.options.layout_dependency {
                if node.snapshot_dependency.as_ref() == Some(dep) {
                    continue;
                }
            }
            let visual = if node.is_projecting() {
                node.target
            } else {
                None
            };
            let snapshot = visual.or_else(|| node.measure()).or(node.layout);
            node.snapshot = snapshot;
            node.snapshot_dependency = node.options.layout_dependency.clone();
        }
        Ok(())
    }

    /// Read-phase measurement. Returns `false` when nothing could be measured.
    pub fn update_layout(&mut self, id: NodeId) -> bool {
        let Some(node) = self.get_mut(id) else {
            return false;
        };
        match node.measure() {
            Some(layout) => {
                node.layout = Some(layout);
                node.needs_resolve = true;
                true
            }
            None => false,
        }
    }

    /// Measure the subtree and resolve transitions immediately, outside any scheduler.
    pub fn did_update(&mut self, id: NodeId) -> FliplineResult<()> {
        for n in self.subtree(id) {
            self.update_layout(n);
        }
        self.resolve_targets();
        Ok(())
    }

    // --- update phase ---

    /// Start transitions for re-measured nodes and link descendants of animating nodes.
    pub fn resolve_targets(&mut self) {
        let order = self.dfs_order();
        let transition = self.settings.transition;
        let mut started: HashSet<NodeId> = HashSet::new();

        for &id in &order {
            let Some(node) = self.get_mut(id) else { continue };
            if !node.needs_resolve {
                // Resume data only applies to the update it was recorded for.
                if node.animation.is_none() {
                    node.resume_from = None;
                    node.resume_box = None;
                }
                continue;
            }
            node.needs_resolve = false;
            let Some(layout) = node.layout else { continue };

            let resume = node.resume_box.take();
            let snapshot = node.snapshot.take();
            let source = match node.options.layout {
                LayoutMode::Disabled => None,
                mode => resume.or(snapshot).map(|s| mode.adjust_source(s, &layout)),
            };

            match source {
                Some(source) if !box_equals(&source, &layout) => {
                    let delta = calc_box_delta(&layout, &source);
                    node.animation = Some(LayoutAnimation {
                        source,
                        started_at: None,
                        progress: 0.0,
                        timed: transition,
                    });
                    node.animation_delta = Some(delta);
                    node.target_delta = Some(delta);
                    node.target = Some(source);
                    node.progress = 0.0;
                    started.insert(id);
                    tracing::debug!(?id, ?source, ?layout, "layout transition started");
                }
                _ => {
                    node.resume_from = None;
                }
            }
        }

        for &id in &order {
            self.resolve_link(id, &started);
        }
        self.departed.clear();
    }

    fn resolve_link(&mut self, id: NodeId, started: &HashSet<NodeId>) {
        let Some(node) = self.get(id) else { return };
        let Some(layout) = node.layout else { return };
        if node.options.layout == LayoutMode::Disabled {
            return;
        }
        let parent = self.projecting_ancestor(id);

        let Some(parent) = parent else {
            if let Some(node) = self.get_mut(id) {
                if node.link.take().is_some() {
                    node.relative_target = None;
                }
            }
            return;
        };
        let current = node.link.map(|l| l.parent);
        if current == Some(parent) && !started.contains(&id) && !started.contains(&parent) {
            return;
        }

        let Some(parent_node) = self.get(parent) else {
            return;
        };
        let (Some(parent_layout), Some(parent_start)) = (
            parent_node.layout,
            parent_node.target.or(parent_node.layout),
        ) else {
            return;
        };
        let start = node.target.unwrap_or(layout);
        let link = RelativeLink {
            parent,
            from: calc_relative_box(&start, &parent_start),
            to: calc_relative_box(&layout, &parent_layout),
        };
        if let Some(node) = self.get_mut(id) {
            node.relative_target = Some(link.from);
            node.target = Some(start);
            node.link = Some(link);
        }
    }

    /// Nearest ancestor with an animation or link, stopping at layout roots.
    fn projecting_ancestor(&self, id: NodeId) -> Option<NodeId> {
        let node = self.get(id)?;
        if node.options.layout_root {
            return None;
        }
        let mut cur = node.parent;
        while let Some(pid) = cur {
            let parent = self.get(pid)?;
            if parent.layout.is_some() && (parent.animation.is_some() || parent.link.is_some()) {
                return Some(pid);
            }
            if parent.options.layout_root {
                return None;
            }
            cur = parent.parent;
        }
        None
    }

    // --- render phase ---

    /// Project every node for the frame at `now` (milliseconds).
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn render_projections(&mut self, now: f64) {
        for id in self.dfs_order() {
            self.project_node(id, now);
        }
    }

    fn project_node(&mut self, id: NodeId, now: f64) {
        let own = {
            let Some(node) = self.get_mut(id) else { return };
            match node.animation.as_mut() {
                Some(anim) => {
                    let start = *anim.started_at.get_or_insert(now);
                    let elapsed = now - start;
                    let sample = match node.progress_source.as_mut() {
                        Some(source) => source.sample(elapsed),
                        None => anim.timed.sample(elapsed),
                    }
                    .sanitized();
                    anim.progress = sample.value;
                    Some(sample)
                }
                None => None,
            }
        };

        let Some(node) = self.get(id) else { return };
        let own_running = own.is_some_and(|s| !s.done);
        // A settled ancestor still anchors a linked child whose own transition is running.
        let parent_state = node.link.and_then(|link| {
            let parent = self.get(link.parent)?;
            if parent.is_projecting() {
                Some((link, parent.target?, Some(parent.progress)))
            } else if own_running {
                Some((link, parent.layout?, None))
            } else {
                None
            }
        });

        let Some(layout) = node.layout else {
            self.finish(id, now);
            return;
        };
        if !own_running && parent_state.is_none() {
            self.finish(id, now);
            return;
        }

        let (target, relative, progress) = match parent_state {
            Some((link, parent_target, parent_progress)) => {
                let p = own.map_or(parent_progress.unwrap_or(1.0), |s| s.value);
                let rel = mix_box(&link.from, &link.to, p);
                (apply_relative_box(&rel, &parent_target), Some(rel), p)
            }
            None => {
                let (source, p) = match (node.animation.map(|a| a.source), own) {
                    (Some(source), Some(s)) => (source, s.value),
                    _ => {
                        self.finish(id, now);
                        return;
                    }
                };
                (mix_box(&source, &layout, p), None, p)
            }
        };

        let (corrected, tree_scale) = self.correct_through_ancestors(id, layout);
        let delta = calc_box_delta(&corrected, &target);

        let accelerated = self.settings.hardware_acceleration
            && parent_state.is_none()
            && HardwareAccelerationAnalyzer::new(self).can_use_hardware_acceleration(id);
        let transform = match (accelerated, node.animation_delta) {
            (true, Some(recorded)) => build_layout_animation_transform(&recorded, progress),
            _ => build_projection_transform(&delta, tree_scale),
        };
        let accelerated = accelerated && node.animation_delta.is_some();
        let border_radius = node
            .options
            .border_radius
            .map(|r| correct_border_radius(r, Some(&target)));

        let Some(node) = self.get_mut(id) else { return };
        node.target = Some(target);
        node.target_delta = Some(delta);
        node.relative_target = relative;
        node.progress = progress;
        if parent_state.is_none() {
            node.link = None;
        }
        if own.is_some_and(|s| s.done) {
            // Own transition is over but the ancestor is still moving: hold the final offset.
            node.animation = None;
            node.animation_delta = None;
            node.progress_source = None;
            if let Some(link) = node.link.as_mut() {
                link.from = link.to;
            }
        }
        self.emit(id, now, transform, accelerated, border_radius);
    }

    /// Apply ancestor deltas root-first to `layout`, accumulating their scale.
    fn correct_through_ancestors(&self, id: NodeId, layout: LayoutBox) -> (LayoutBox, Vec2) {
        let mut chain = Vec::new();
        let mut cur = self.get(id).and_then(|n| n.parent);
        while let Some(pid) = cur {
            let Some(parent) = self.get(pid) else { break };
            chain.push(parent.target_delta);
            cur = parent.parent;
        }

        let mut corrected = layout;
        let mut scale = Vec2::new(1.0, 1.0);
        for delta in chain.into_iter().rev().flatten() {
            apply_box_delta(&mut corrected, &delta);
            scale.x *= delta.x.scale;
            scale.y *= delta.y.scale;
        }
        (corrected, scale)
    }

    fn finish(&mut self, id: NodeId, now: f64) {
        let Some(node) = self.get_mut(id) else { return };
        let was_active = node.animation.is_some()
            || node.link.is_some()
            || node.target_delta.is_some()
            || node.relative_target.is_some();
        if was_active {
            node.clear_projection();
            tracing::debug!(?id, "layout transition finished");
        }
        let border_radius = node.options.border_radius.map(|r| correct_border_radius(r, None));
        self.emit(id, now, IDENTITY_TRANSFORM.to_string(), false, border_radius);
    }

    fn emit(
        &mut self,
        id: NodeId,
        now: f64,
        transform: String,
        accelerated: bool,
        border_radius: Option<String>,
    ) {
        let Some(node) = self.get_mut(id) else { return };
        let unchanged = match &node.last_transform {
            Some(last) => *last == transform,
            None => transform == IDENTITY_TRANSFORM,
        };
        if unchanged {
            return;
        }
        node.last_transform = Some(transform.clone());
        self.updates.push(TransformUpdate {
            node: id,
            timestamp: now,
            transform,
            accelerated,
            border_radius,
        });
    }

    /// Any transition, relative link or pending measurement still needs frames.
    pub fn has_active_projection(&self) -> bool {
        self.slots
            .iter()
            .filter_map(|s| s.node.as_ref())
            .any(|n| n.animation.is_some() || n.link.is_some() || n.needs_resolve)
    }

    pub fn take_updates(&mut self) -> Vec<TransformUpdate> {
        std::mem::take(&mut self.updates)
    }

    pub fn can_use_hardware_acceleration(&self, id: NodeId) -> bool {
        HardwareAccelerationAnalyzer::new(self).can_use_hardware_acceleration(id)
    }

    // --- scheduler bookkeeping ---

    pub(crate) fn track_callback(&mut self, id: NodeId, handle: CallbackHandle) {
        if let Some(node) = self.get_mut(id) {
            node.callbacks.push(handle);
        }
    }

    pub(crate) fn untrack_callback(&mut self, id: NodeId, handle: CallbackHandle) {
        if let Some(node) = self.get_mut(id) {
            node.callbacks.retain(|h| *h != handle);
        }
    }

    pub(crate) fn tracked_callbacks(&self, id: NodeId) -> &[CallbackHandle] {
        self.get(id)
            .map(|n| n.callbacks.as_slice())
            .unwrap_or(&[])
    }

    // --- teardown ---

    /// Remove `id` and its descendants.
    ///
    /// Leads leaving a stack promote the next member, which resumes from the departing node's
    /// visual box. A stack that empties remembers that box for the next node to join the key.
    pub fn unmount(&mut self, id: NodeId) -> FliplineResult<Unmounted> {
        let parent = self.node(id)?.parent;
        let mut order = self.subtree(id);
        order.reverse();

        let mut out = Unmounted::default();
        let mut resumes: Vec<(NodeId, NodeId)> = Vec::new();
        for &n in &order {
            let Some(node) = self.get(n) else { continue };
            out.callbacks.extend(node.callbacks.iter().copied());
            let visual = node.visual_box();
            let key = node.options.layout_id.clone().filter(|_| node.attached);
            if let Some(key) = key {
                if let Some(promotion) = self.registry.remove(&key, n) {
                    match promotion.new_lead {
                        Some(lead) => resumes.push((lead, n)),
                        None => {
                            if let Some(visual) = visual {
                                self.departed
                                    .insert(key, DepartedLead { node: n, visual });
                            }
                        }
                    }
                }
            }
        }

        for (lead, from) in resumes {
            if order.contains(&lead) {
                continue;
            }
            self.resume_from_node(lead, from);
            out.promoted.push(lead);
        }

        match parent.and_then(|p| self.get_mut(p)) {
            Some(p) => p.children.retain(|c| *c != id),
            None => self.roots.retain(|r| *r != id),
        }
        for &n in &order {
            let slot = &mut self.slots[n.idx as usize];
            slot.node = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(n.idx);
        }
        self.staged_options.retain(|(n, _)| !order.contains(n));
        self.staged_attach.retain(|n| !order.contains(n));

        tracing::debug!(?id, removed = order.len(), "unmounted subtree");
        out.removed = order;
        Ok(out)
    }
}

fn stale(id: NodeId) -> FliplineError {
    FliplineError::validation(format!("unknown or unmounted node {id:?}"))
}

#[cfg(test)]
#[path = "../../tests/unit/projection/tree.rs"]
mod tests;
