//! Transform strings for projected nodes.
//!
//! Output form is `translate3d(<x>px, <y>px, 0px) scale(<sx>, <sy>)`, or `none` for identity.
//! Both scale components are always written.

use kurbo::Vec2;

use crate::foundation::geometry::{Delta, is_delta_zero, mix};

pub const IDENTITY_TRANSFORM: &str = "none";

/// Cheap path: interpolate a recorded delta toward identity.
///
/// `progress` outside `[0, 1]` is clamped; non-finite progress counts as complete.
pub fn build_layout_animation_transform(delta: &Delta, progress: f64) -> String {
    let p = if progress.is_finite() {
        progress.clamp(0.0, 1.0)
    } else {
        1.0
    };
    if p >= 1.0 {
        return IDENTITY_TRANSFORM.to_string();
    }
    format_transform(
        mix(delta.x.translate, 0.0, p),
        mix(delta.y.translate, 0.0, p),
        mix(delta.x.scale, 1.0, p),
        mix(delta.y.scale, 1.0, p),
    )
}

/// Corrective path: translation is divided by the accumulated ancestor scale so it lands in
/// page pixels once the ancestors' own transforms apply.
pub fn build_projection_transform(delta: &Delta, tree_scale: Vec2) -> String {
    if is_delta_zero(delta) {
        return IDENTITY_TRANSFORM.to_string();
    }
    format_transform(
        delta.x.translate / safe_scale(tree_scale.x),
        delta.y.translate / safe_scale(tree_scale.y),
        delta.x.scale,
        delta.y.scale,
    )
}

fn safe_scale(s: f64) -> f64 {
    if s.is_finite() && s != 0.0 { s } else { 1.0 }
}

fn format_transform(tx: f64, ty: f64, sx: f64, sy: f64) -> String {
    format!(
        "translate3d({}px, {}px, 0px) scale({}, {})",
        format_number(sanitize(tx, 0.0)),
        format_number(sanitize(ty, 0.0)),
        format_number(sanitize(sx, 1.0)),
        format_number(sanitize(sy, 1.0)),
    )
}

fn sanitize(v: f64, fallback: f64) -> f64 {
    if v.is_finite() { v } else { fallback }
}

/// Shortest round-trip decimal, with `-0` written as `0`.
pub(crate) fn format_number(v: f64) -> String {
    if v == 0.0 {
        "0".to_string()
    } else {
        format!("{v}")
    }
}

#[cfg(test)]
#[path = "../../tests/unit/projection/transform.rs"]
mod tests;
