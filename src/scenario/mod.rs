//! JSON-described layout scenarios and their deterministic replay.

pub mod model;
pub mod replay;

pub use model::{NodeSpec, Scenario, Step};
pub use replay::{ReplayFrame, ReplayReport, ReplayUpdate, replay};
