use std::fmt;
use std::str::FromStr;

use crate::foundation::error::FliplineError;

/// Ordered steps of one scheduler tick.
///
/// Every tick runs all eight phases in declaration order. Geometry reads belong in
/// [`Phase::Read`]; anything that writes geometry-dependent output belongs in
/// [`Phase::Render`] or later.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Setup,
    Read,
    ResolveKeyframes,
    PreUpdate,
    Update,
    PreRender,
    Render,
    PostRender,
}

impl Phase {
    pub const COUNT: usize = 8;

    /// All phases in execution order.
    pub const ALL: [Phase; Self::COUNT] = [
        Phase::Setup,
        Phase::Read,
        Phase::ResolveKeyframes,
        Phase::PreUpdate,
        Phase::Update,
        Phase::PreRender,
        Phase::Render,
        Phase::PostRender,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Read => "read",
            Self::ResolveKeyframes => "resolveKeyframes",
            Self::PreUpdate => "preUpdate",
            Self::Update => "update",
            Self::PreRender => "preRender",
            Self::Render => "render",
            Self::PostRender => "postRender",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = FliplineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Phase::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| FliplineError::validation(format!("unknown phase '{s}'")))
    }
}
