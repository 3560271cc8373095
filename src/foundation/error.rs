/// Convenience result type used across flipline.
pub type FliplineResult<T> = Result<T, FliplineError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Geometry never errors: degenerate boxes fall back to identity-safe values. Errors are
/// reserved for caller mistakes (stale handles, invalid configuration) and for faults that
/// callers want surfaced for diagnostics.
#[derive(thiserror::Error, Debug)]
pub enum FliplineError {
    /// Invalid caller-provided data (configuration, handles, scenario files).
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors raised by or reported from the frame scheduler.
    #[error("scheduler error: {0}")]
    Scheduler(String),

    /// Errors while updating or projecting the node tree.
    #[error("projection error: {0}")]
    Projection(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FliplineError {
    /// Build a [`FliplineError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`FliplineError::Scheduler`] value.
    pub fn scheduler(msg: impl Into<String>) -> Self {
        Self::Scheduler(msg.into())
    }

    /// Build a [`FliplineError::Projection`] value.
    pub fn projection(msg: impl Into<String>) -> Self {
        Self::Projection(msg.into())
    }

    /// Build a [`FliplineError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for FliplineError {
    fn from(err: serde_json::Error) -> Self {
        Self::serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
