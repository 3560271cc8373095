//! Axis, box and delta math shared by the projection engine.
//!
//! Every delta is computed about an origin point expressed as a fraction of the source axis
//! (`0.5` is the midpoint), so that scale and translation compose around a pivot rather than
//! around the axis minimum. None of these functions can fail: degenerate inputs fall back to
//! identity-safe values.

use crate::foundation::error::FliplineError;

/// Scales closer to `1` than this snap to exactly `1`.
pub const SCALE_PRECISION: f64 = 0.0001;
/// Translations closer to `0` than this snap to exactly `0`.
pub const TRANSLATE_PRECISION: f64 = 0.01;
/// Default delta origin (axis midpoint).
pub const DEFAULT_ORIGIN: f64 = 0.5;

/// A closed interval `[min, max]` along one axis. Invariant: `min <= max`.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct Axis {
    pub min: f64,
    pub max: f64,
}

impl Axis {
    /// The empty axis at zero.
    pub const ZERO: Self = Self { min: 0.0, max: 0.0 };

    /// Build an axis from two bounds in either order.
    pub fn new(a: f64, b: f64) -> Self {
        if b < a {
            Self { min: b, max: a }
        } else {
            Self { min: a, max: b }
        }
    }

    pub fn length(self) -> f64 {
        self.max - self.min
    }

    /// Point at `origin` (a fraction of the length) along the axis.
    pub fn point_at(self, origin: f64) -> f64 {
        mix(self.min, self.max, origin)
    }

    pub fn midpoint(self) -> f64 {
        self.point_at(DEFAULT_ORIGIN)
    }
}

impl TryFrom<[f64; 2]> for Axis {
    type Error = FliplineError;

    fn try_from([min, max]: [f64; 2]) -> Result<Self, Self::Error> {
        if !min.is_finite() || !max.is_finite() {
            return Err(FliplineError::validation("axis bounds must be finite"));
        }
        if min > max {
            return Err(FliplineError::validation(format!(
                "axis min must be <= max (got [{min}, {max}])"
            )));
        }
        Ok(Self { min, max })
    }
}

impl From<Axis> for [f64; 2] {
    fn from(axis: Axis) -> Self {
        [axis.min, axis.max]
    }
}

/// Axis selector used by [`each_axis`] and the per-axis accessors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisName {
    X,
    Y,
}

/// Axes in iteration order.
pub const AXES: [AxisName; 2] = [AxisName::X, AxisName::Y];

/// Call `f` for `x` then `y`.
pub fn each_axis(mut f: impl FnMut(AxisName)) {
    for axis in AXES {
        f(axis);
    }
}

/// Axis-aligned rectangle in some coordinate space.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LayoutBox {
    pub x: Axis,
    pub y: Axis,
}

impl LayoutBox {
    pub const ZERO: Self = Self {
        x: Axis::ZERO,
        y: Axis::ZERO,
    };

    pub fn new(x: Axis, y: Axis) -> Self {
        Self { x, y }
    }

    /// Build a box from its top-left corner and size. Negative sizes are normalized.
    pub fn from_origin_size(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x: Axis::new(x, x + width),
            y: Axis::new(y, y + height),
        }
    }

    pub fn axis(&self, name: AxisName) -> Axis {
        match name {
            AxisName::X => self.x,
            AxisName::Y => self.y,
        }
    }

    pub fn axis_mut(&mut self, name: AxisName) -> &mut Axis {
        match name {
            AxisName::X => &mut self.x,
            AxisName::Y => &mut self.y,
        }
    }

    pub fn width(&self) -> f64 {
        self.x.length()
    }

    pub fn height(&self) -> f64 {
        self.y.length()
    }

    pub fn to_rect(self) -> kurbo::Rect {
        kurbo::Rect::new(self.x.min, self.y.min, self.x.max, self.y.max)
    }
}

impl From<kurbo::Rect> for LayoutBox {
    fn from(rect: kurbo::Rect) -> Self {
        Self {
            x: Axis::new(rect.x0, rect.x1),
            y: Axis::new(rect.y0, rect.y1),
        }
    }
}

impl From<LayoutBox> for kurbo::Rect {
    fn from(b: LayoutBox) -> Self {
        b.to_rect()
    }
}

/// Affine mapping of a source axis onto a target axis, pivoting on `origin_point`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AxisDelta {
    pub translate: f64,
    pub scale: f64,
    /// Pivot as a fraction of the source axis.
    pub origin: f64,
    /// Pivot in the source axis' coordinate space.
    pub origin_point: f64,
}

impl AxisDelta {
    pub const IDENTITY: Self = Self {
        translate: 0.0,
        scale: 1.0,
        origin: DEFAULT_ORIGIN,
        origin_point: 0.0,
    };

    pub fn is_identity(&self) -> bool {
        self.translate == 0.0 && self.scale == 1.0
    }
}

impl Default for AxisDelta {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Per-axis deltas for a whole box.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Delta {
    pub x: AxisDelta,
    pub y: AxisDelta,
}

impl Delta {
    pub const IDENTITY: Self = Self {
        x: AxisDelta::IDENTITY,
        y: AxisDelta::IDENTITY,
    };

    pub fn axis(&self, name: AxisName) -> AxisDelta {
        match name {
            AxisName::X => self.x,
            AxisName::Y => self.y,
        }
    }

    pub fn axis_mut(&mut self, name: AxisName) -> &mut AxisDelta {
        match name {
            AxisName::X => &mut self.x,
            AxisName::Y => &mut self.y,
        }
    }

    /// The delta as a 2D affine transform in the source box' coordinate space.
    pub fn to_affine(&self) -> kurbo::Affine {
        let origin = kurbo::Vec2::new(self.x.origin_point, self.y.origin_point);
        // T(translate) * T(origin) * S(scale) * T(-origin)
        kurbo::Affine::translate((self.x.translate, self.y.translate))
            * kurbo::Affine::translate(origin)
            * kurbo::Affine::scale_non_uniform(self.x.scale, self.y.scale)
            * kurbo::Affine::translate(-origin)
    }
}

pub fn is_near(value: f64, target: f64, max_distance: f64) -> bool {
    (value - target).abs() <= max_distance
}

pub fn mix(from: f64, to: f64, progress: f64) -> f64 {
    from + (to - from) * progress
}

pub fn calc_length(axis: Axis) -> f64 {
    axis.length()
}

/// Width over height, `0` when the box has no height.
pub fn aspect_ratio(b: &LayoutBox) -> f64 {
    let h = b.height();
    if h == 0.0 { 0.0 } else { b.width() / h }
}

/// Shift an axis by `distance` without changing its length.
pub fn translate_axis(axis: &mut Axis, distance: f64) {
    axis.min += distance;
    axis.max += distance;
}

pub fn scale_point(point: f64, scale: f64, origin_point: f64) -> f64 {
    origin_point + scale * (point - origin_point)
}

pub fn apply_point_delta(point: f64, translate: f64, scale: f64, origin_point: f64) -> f64 {
    scale_point(point, scale, origin_point) + translate
}

pub fn apply_axis_delta(axis: &mut Axis, delta: &AxisDelta) {
    let min = apply_point_delta(axis.min, delta.translate, delta.scale, delta.origin_point);
    let max = apply_point_delta(axis.max, delta.translate, delta.scale, delta.origin_point);
    *axis = Axis::new(min, max);
}

pub fn apply_box_delta(b: &mut LayoutBox, delta: &Delta) {
    apply_axis_delta(&mut b.x, &delta.x);
    apply_axis_delta(&mut b.y, &delta.y);
}

/// Delta mapping `source` onto `target`, pivoting at `origin` along `source`.
///
/// Zero-length sources yield a scale of `1`; near-identity and non-finite components snap to
/// identity.
pub fn calc_axis_delta(source: Axis, target: Axis, origin: f64) -> AxisDelta {
    let origin_point = source.point_at(origin);

    let source_len = source.length();
    let mut scale = if source_len == 0.0 {
        1.0
    } else {
        target.length() / source_len
    };
    if !scale.is_finite() || is_near(scale, 1.0, SCALE_PRECISION) {
        scale = 1.0;
    }

    let mut translate = target.point_at(origin) - origin_point;
    if !translate.is_finite() || is_near(translate, 0.0, TRANSLATE_PRECISION) {
        translate = 0.0;
    }

    AxisDelta {
        translate,
        scale,
        origin,
        origin_point,
    }
}

pub fn calc_box_delta(source: &LayoutBox, target: &LayoutBox) -> Delta {
    calc_box_delta_with_origin(source, target, DEFAULT_ORIGIN, DEFAULT_ORIGIN)
}

pub fn calc_box_delta_with_origin(
    source: &LayoutBox,
    target: &LayoutBox,
    origin_x: f64,
    origin_y: f64,
) -> Delta {
    Delta {
        x: calc_axis_delta(source.x, target.x, origin_x),
        y: calc_axis_delta(source.y, target.y, origin_y),
    }
}

pub fn is_delta_zero(delta: &Delta) -> bool {
    delta.x.is_identity() && delta.y.is_identity()
}

pub fn box_equals(a: &LayoutBox, b: &LayoutBox) -> bool {
    a.x.min == b.x.min && a.x.max == b.x.max && a.y.min == b.y.min && a.y.max == b.y.max
}

/// Equality after rounding every bound to the nearest whole unit.
pub fn box_equals_rounded(a: &LayoutBox, b: &LayoutBox) -> bool {
    a.x.min.round() == b.x.min.round()
        && a.x.max.round() == b.x.max.round()
        && a.y.min.round() == b.y.min.round()
        && a.y.max.round() == b.y.max.round()
}

pub fn mix_axis(from: Axis, to: Axis, progress: f64) -> Axis {
    Axis::new(
        mix(from.min, to.min, progress),
        mix(from.max, to.max, progress),
    )
}

pub fn mix_box(from: &LayoutBox, to: &LayoutBox, progress: f64) -> LayoutBox {
    LayoutBox {
        x: mix_axis(from.x, to.x, progress),
        y: mix_axis(from.y, to.y, progress),
    }
}

/// `child` expressed relative to the minimum of `parent`.
pub fn calc_relative_axis(child: Axis, parent: Axis) -> Axis {
    let min = child.min - parent.min;
    Axis {
        min,
        max: min + child.length(),
    }
}

pub fn calc_relative_box(child: &LayoutBox, parent: &LayoutBox) -> LayoutBox {
    LayoutBox {
        x: calc_relative_axis(child.x, parent.x),
        y: calc_relative_axis(child.y, parent.y),
    }
}

/// Inverse of [`calc_relative_box`]: place `relative` inside `parent`.
pub fn apply_relative_box(relative: &LayoutBox, parent: &LayoutBox) -> LayoutBox {
    let place = |rel: Axis, parent: Axis| {
        let min = rel.min + parent.min;
        Axis {
            min,
            max: min + rel.length(),
        }
    };
    LayoutBox {
        x: place(relative.x, parent.x),
        y: place(relative.y, parent.y),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/geometry.rs"]
mod tests;
