//! Scene model
//!
//! The normalized, immutable-per-render description of a diagram: axis
//! bounds, tick spacing, the named-coordinate table, and one ordered
//! collection per fragment kind. A `Scene` is built fresh from the full
//! directive text on every render request and never mutated afterwards.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A resolved point in logical (diagram) coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub fn new(x: f64, y: f64) -> Self {
        Coord { x, y }
    }

    /// Both components finite
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Stroke style of a line or function curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
}

/// Where a point-marker label sits relative to its point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LabelPos {
    #[default]
    Above,
    Below,
    Left,
    Right,
    AboveLeft,
    AboveRight,
    BelowLeft,
    BelowRight,
}

impl LabelPos {
    /// Parse position keywords from an option list fragment, e.g.
    /// `above right` or `below`. Unknown input falls back to `Above`.
    pub fn parse(input: &str) -> Self {
        let above = input.contains("above");
        let below = input.contains("below");
        let left = input.contains("left");
        let right = input.contains("right");
        match (above, below, left, right) {
            (true, _, true, _) => LabelPos::AboveLeft,
            (true, _, _, true) => LabelPos::AboveRight,
            (_, true, true, _) => LabelPos::BelowLeft,
            (_, true, _, true) => LabelPos::BelowRight,
            (true, _, _, _) => LabelPos::Above,
            (_, true, _, _) => LabelPos::Below,
            (_, _, true, _) => LabelPos::Left,
            (_, _, _, true) => LabelPos::Right,
            _ => LabelPos::Above,
        }
    }
}

/// A circular point marker, optionally labeled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointMarker {
    pub coord: Coord,
    pub color: String,
    /// May be empty (a bare dot)
    pub label: String,
    pub label_pos: LabelPos,
}

/// A stroked polyline or polygon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub points: Vec<Coord>,
    pub style: LineStyle,
    pub color: String,
    /// Closed back to the first point (`-- cycle`)
    pub is_cycle: bool,
}

/// A filled polygon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilledArea {
    /// At least three points
    pub points: Vec<Coord>,
    pub color: String,
    /// In `[0, 1]`
    pub opacity: f64,
}

/// A single-variable function plot over a domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionPlot {
    /// Expression over one free variable; named variables have already been
    /// substituted at extraction time
    pub expression: String,
    /// The free variable name, without backslash (usually `x`)
    pub variable: String,
    pub domain_min: f64,
    pub domain_max: f64,
    pub color: String,
    pub style: LineStyle,
}

/// A free-standing text label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub coord: Coord,
    /// Normalized plain text (markup already stripped)
    pub text: String,
    pub color: String,
}

/// The aggregated scene, read-only once constructed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub tick_step_x: f64,
    pub tick_step_y: f64,
    /// Final state of the named-coordinate table, in definition order
    pub coordinates: IndexMap<String, Coord>,
    pub points: Vec<PointMarker>,
    pub lines: Vec<Line>,
    pub filled_areas: Vec<FilledArea>,
    pub function_plots: Vec<FunctionPlot>,
    pub labels: Vec<Label>,
}

impl Scene {
    /// Default bounds used when no axis declaration parses
    pub const DEFAULT_MIN: f64 = -5.0;
    pub const DEFAULT_MAX: f64 = 5.0;

    /// True when nothing at all was extracted (renders as an empty canvas)
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
            && self.lines.is_empty()
            && self.filled_areas.is_empty()
            && self.function_plots.is_empty()
            && self.labels.is_empty()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Scene {
            x_min: Scene::DEFAULT_MIN,
            x_max: Scene::DEFAULT_MAX,
            y_min: Scene::DEFAULT_MIN,
            y_max: Scene::DEFAULT_MAX,
            tick_step_x: 1.0,
            tick_step_y: 1.0,
            coordinates: IndexMap::new(),
            points: Vec::new(),
            lines: Vec::new(),
            filled_areas: Vec::new(),
            function_plots: Vec::new(),
            labels: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_pos_parse() {
        assert_eq!(LabelPos::parse("above"), LabelPos::Above);
        assert_eq!(LabelPos::parse("above right"), LabelPos::AboveRight);
        assert_eq!(LabelPos::parse("below left"), LabelPos::BelowLeft);
        assert_eq!(LabelPos::parse("right"), LabelPos::Right);
        assert_eq!(LabelPos::parse("midway"), LabelPos::Above);
    }

    #[test]
    fn test_default_scene_bounds() {
        let scene = Scene::default();
        assert_eq!(scene.x_min, -5.0);
        assert_eq!(scene.x_max, 5.0);
        assert!(scene.is_empty());
    }
}
