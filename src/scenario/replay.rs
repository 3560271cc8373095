use std::collections::HashMap;

use crate::animation::progress::ValueStream;
use crate::engine::root::AnimationRoot;
use crate::foundation::error::{FliplineError, FliplineResult};
use crate::projection::instance::SharedLayout;
use crate::projection::node::NodeId;
use crate::scenario::model::{NodeSpec, Scenario, Step};
use crate::scheduler::driver::ManualDriver;
use crate::scheduler::frame::ManualTick;
use crate::scheduler::frameloop::TimingMode;

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ReplayUpdate {
    pub node: String,
    pub transform: String,
    pub accelerated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<String>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ReplayFrame {
    pub frame: u64,
    pub timestamp: f64,
    pub updates: Vec<ReplayUpdate>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct ReplayReport {
    pub frames: Vec<ReplayFrame>,
    /// Callback faults recorded while replaying, formatted.
    pub faults: Vec<String>,
}

impl ReplayReport {
    /// Frames that wrote at least one transform.
    pub fn changed_frames(&self) -> impl Iterator<Item = &ReplayFrame> {
        self.frames.iter().filter(|f| !f.updates.is_empty())
    }

    /// Every transform written to `node`, in frame order.
    pub fn transforms_for<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.frames
            .iter()
            .flat_map(|f| f.updates.iter())
            .filter(move |u| u.node == node)
            .map(|u| u.transform.as_str())
    }
}

/// Replay `scenario` on a manually ticked root.
///
/// `frames` overrides the scenario's frame count; steps past the end are ignored.
#[tracing::instrument(skip(scenario), fields(nodes = scenario.nodes.len(), steps = scenario.steps.len()))]
pub fn replay(scenario: &Scenario, frames: Option<u64>) -> FliplineResult<ReplayReport> {
    scenario.validate()?;
    let mut config = scenario.config;
    config.scheduler.timing = TimingMode::Manual;
    let (driver, _clock) = ManualDriver::new();
    let mut replayer = Replayer {
        root: AnimationRoot::with_driver(config, Box::new(driver))?,
        live: HashMap::new(),
        names: HashMap::new(),
        frame_ms: scenario.frame_ms(),
    };

    for decl in &scenario.nodes {
        replayer.mount(decl)?;
    }

    let total = frames.unwrap_or(scenario.frames);
    let mut steps = scenario.steps.iter().peekable();
    let mut report = ReplayReport::default();
    for frame in 0..total {
        while let Some(step) = steps.next_if(|s| s.frame == frame) {
            replayer.apply(step)?;
        }
        let data = replayer
            .root
            .render_frame(ManualTick::frame(frame as f64).with_fps(scenario.fps))?;
        let updates = replayer
            .root
            .take_updates()
            .into_iter()
            .map(|u| ReplayUpdate {
                node: replayer.name(u.node),
                transform: u.transform,
                accelerated: u.accelerated,
                border_radius: u.border_radius,
            })
            .collect();
        report.frames.push(ReplayFrame {
            frame,
            timestamp: data.timestamp,
            updates,
        });
    }

    report.faults = replayer
        .root
        .take_faults()
        .into_iter()
        .map(|f| format!("{} @ {}ms: {}", f.phase, f.timestamp, f.message))
        .collect();
    if !report.faults.is_empty() {
        tracing::warn!(faults = report.faults.len(), "replay recorded callback faults");
    }
    Ok(report)
}

struct Replayer {
    root: AnimationRoot,
    live: HashMap<String, (NodeId, SharedLayout)>,
    names: HashMap<NodeId, String>,
    frame_ms: f64,
}

impl Replayer {
    fn lookup(&self, name: &str) -> FliplineResult<&(NodeId, SharedLayout)> {
        self.live
            .get(name)
            .ok_or_else(|| FliplineError::validation(format!("unknown node '{name}'")))
    }

    fn name(&self, id: NodeId) -> String {
        self.names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("{id:?}"))
    }

    fn mount(&mut self, decl: &NodeSpec) -> FliplineResult<()> {
        if self.live.contains_key(&decl.id) {
            return Err(FliplineError::validation(format!(
                "node '{}' is already mounted",
                decl.id
            )));
        }
        let parent = match &decl.parent {
            Some(name) => Some(self.lookup(name)?.0),
            None => None,
        };
        let id = self.root.create_node(parent, decl.options.clone())?;
        let layout = SharedLayout::new(decl.layout);
        self.root.mount(id, layout.clone())?;
        if let Some(values) = &decl.progress {
            self.root
                .set_progress_source(id, ValueStream::new(values.clone(), self.frame_ms))?;
        }
        self.live.insert(decl.id.clone(), (id, layout));
        self.names.insert(id, decl.id.clone());
        Ok(())
    }

    fn apply(&mut self, step: &Step) -> FliplineResult<()> {
        tracing::debug!(frame = step.frame, "applying scenario step");
        let roots = self.root.tree().roots().to_vec();
        for root in &roots {
            self.root.will_update(*root)?;
        }

        for name in &step.exit {
            let id = self.lookup(name)?.0;
            self.root.set_present(id, false)?;
        }
        for (name, layout) in &step.layout {
            self.lookup(name)?.1.set(*layout);
        }
        for (name, options) in &step.options {
            let id = self.lookup(name)?.0;
            self.root.set_options(id, options.clone())?;
        }
        for (name, values) in &step.progress {
            let id = self.lookup(name)?.0;
            self.root
                .set_progress_source(id, ValueStream::new(values.clone(), self.frame_ms))?;
        }
        for name in &step.unmount {
            let id = self.lookup(name)?.0;
            self.root.unmount(id)?;
            let tree = self.root.tree();
            self.live.retain(|_, (n, _)| tree.contains(*n));
            self.names.retain(|n, _| tree.contains(*n));
        }
        for decl in &step.mount {
            self.mount(decl)?;
        }

        for root in &roots {
            if self.root.tree().contains(*root) {
                self.root.did_update(*root)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scenario/replay.rs"]
mod tests;
