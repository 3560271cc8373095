//! Cooperative, phase-ordered frame scheduling.

pub mod driver;
pub mod frame;
pub mod frameloop;
pub mod phase;
