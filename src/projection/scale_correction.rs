use crate::foundation::geometry::{Axis, LayoutBox};
use crate::projection::transform::format_number;

/// A style length as authored by the host.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Length {
    Px(f64),
    Percent(f64),
}

/// Express a pixel length as a percentage of `axis`. Zero-length axes map to `0`.
pub fn pixels_to_percent(pixels: f64, axis: Axis) -> f64 {
    let len = axis.length();
    if len == 0.0 || !pixels.is_finite() {
        0.0
    } else {
        pixels / len * 100.0
    }
}

/// Rewrite a border radius so it stays visually constant under the node's scale transform.
///
/// Pixel radii become `"<x>% <y>%"` of the projected target box. Percentages already scale
/// with the element and pass through. Without a target the radius is written as authored.
pub fn correct_border_radius(latest: Length, target: Option<&LayoutBox>) -> String {
    match (latest, target) {
        (Length::Percent(p), _) => format!("{}%", format_number(p)),
        (Length::Px(px), None) => format!("{}px", format_number(px)),
        (Length::Px(px), Some(target)) => format!(
            "{}% {}%",
            format_number(pixels_to_percent(px, target.x)),
            format_number(pixels_to_percent(px, target.y)),
        ),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/projection/scale_correction.rs"]
mod tests;
