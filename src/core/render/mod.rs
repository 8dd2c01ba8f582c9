//! Scene rendering
//!
//! Walks a finished scene and emits an ordered, deterministic list of draw
//! primitives: grid, axes, filled areas, lines, function curves, point
//! markers, labels. There is no parsing here; the renderer consumes only
//! the scene model and the viewport transform.

pub mod svg;
pub mod viewport;

use serde::Serialize;

use crate::core::parse::labels;
use crate::core::sampler;
use crate::core::scene::{LabelPos, LineStyle, Scene};
use crate::utils::error::{DiagramError, DiagramResult};
use viewport::Viewport;

/// Fixed canvas configuration for one render
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
    /// Samples per function plot
    pub resolution: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            width: 300.0,
            height: 300.0,
            padding: 30.0,
            resolution: sampler::DEFAULT_RESOLUTION,
        }
    }
}

impl RenderOptions {
    /// Reject canvases the transform cannot map onto.
    pub fn validate(&self) -> DiagramResult<()> {
        if !(self.width.is_finite() && self.width > 0.0)
            || !(self.height.is_finite() && self.height > 0.0)
        {
            return Err(DiagramError::options("canvas size must be positive"));
        }
        if !(self.padding.is_finite() && self.padding >= 0.0)
            || 2.0 * self.padding >= self.width.min(self.height)
        {
            return Err(DiagramError::options("padding leaves no drawable area"));
        }
        Ok(())
    }

    fn sanitized(&self) -> RenderOptions {
        if self.validate().is_ok() && self.resolution >= 2 {
            self.clone()
        } else {
            RenderOptions::default()
        }
    }
}

/// Horizontal anchoring of a text primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

/// One draw primitive, already in pixel space
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    Polyline {
        points: Vec<(f64, f64)>,
        color: String,
        width: f64,
        dashed: bool,
        closed: bool,
    },
    Polygon {
        points: Vec<(f64, f64)>,
        fill: String,
        opacity: f64,
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
        fill: String,
    },
    Text {
        x: f64,
        y: f64,
        text: String,
        color: String,
        italic: bool,
        anchor: TextAnchor,
    },
}

/// External math-notation engine seam. The renderer only consults it for
/// labels that still look like fractions after normalization; a `None`
/// return (the failure mode) falls back to the plain text.
pub trait MathTypesetter {
    fn typeset(&self, fragment: &str) -> Option<String>;
}

/// Default engine: no markup, plain text everywhere.
pub struct PlainText;

impl MathTypesetter for PlainText {
    fn typeset(&self, _fragment: &str) -> Option<String> {
        None
    }
}

const GRID_COLOR: &str = "#dddddd";
const AXIS_COLOR: &str = "black";
const GRID_WIDTH: f64 = 1.0;
const AXIS_WIDTH: f64 = 1.5;
const LINE_WIDTH: f64 = 1.5;
const PLOT_WIDTH: f64 = 2.0;
const POINT_RADIUS: f64 = 3.0;
const ARROW_LEN: f64 = 9.0;
const ARROW_HALF_WIDTH: f64 = 3.5;

/// Render a scene with the default (plain text) typesetter.
pub fn render(scene: &Scene, options: &RenderOptions) -> Vec<DrawOp> {
    render_with_typesetter(scene, options, &PlainText)
}

/// Render a scene to an ordered draw-op list.
pub fn render_with_typesetter(
    scene: &Scene,
    options: &RenderOptions,
    typesetter: &dyn MathTypesetter,
) -> Vec<DrawOp> {
    let options = options.sanitized();
    let vp = Viewport::new(scene, options.width, options.height, options.padding);
    let mut ops = Vec::new();

    draw_grid(&mut ops, scene, &vp);
    draw_axes(&mut ops, scene, &vp);

    for area in &scene.filled_areas {
        let points: Vec<(f64, f64)> = area.points.iter().map(|p| vp.to_px(p.x, p.y)).collect();
        ops.push(DrawOp::Polygon {
            points,
            fill: area.color.clone(),
            opacity: area.opacity.clamp(0.0, 1.0),
        });
    }

    for line in &scene.lines {
        let points: Vec<(f64, f64)> = line.points.iter().map(|p| vp.to_px(p.x, p.y)).collect();
        ops.push(DrawOp::Polyline {
            points,
            color: line.color.clone(),
            width: LINE_WIDTH,
            dashed: line.style == LineStyle::Dashed,
            closed: line.is_cycle,
        });
    }

    for plot in &scene.function_plots {
        for segment in sampler::sample(plot, scene, options.resolution) {
            let points: Vec<(f64, f64)> =
                segment.iter().map(|p| vp.to_px(p.x, p.y)).collect();
            ops.push(DrawOp::Polyline {
                points,
                color: plot.color.clone(),
                width: PLOT_WIDTH,
                dashed: plot.style == LineStyle::Dashed,
                closed: false,
            });
        }
    }

    for point in &scene.points {
        let (cx, cy) = vp.to_px(point.coord.x, point.coord.y);
        ops.push(DrawOp::Circle {
            cx,
            cy,
            r: POINT_RADIUS,
            fill: point.color.clone(),
        });
        if !point.label.is_empty() {
            let (dx, dy, anchor) = label_offset(point.label_pos);
            ops.push(DrawOp::Text {
                x: cx + dx,
                y: cy + dy,
                text: point.label.clone(),
                color: point.color.clone(),
                italic: false,
                anchor,
            });
        }
    }

    for label in &scene.labels {
        let (x, y) = vp.to_px(label.coord.x, label.coord.y);
        let text = if labels::looks_like_fraction(&label.text) {
            typesetter
                .typeset(&label.text)
                .unwrap_or_else(|| label.text.clone())
        } else {
            label.text.clone()
        };
        ops.push(DrawOp::Text {
            x,
            y,
            text,
            color: label.color.clone(),
            italic: false,
            anchor: TextAnchor::Middle,
        });
    }

    ops
}

/// Dashed background grid at tick multiples, zero lines excluded.
fn draw_grid(ops: &mut Vec<DrawOp>, scene: &Scene, vp: &Viewport) {
    for x in vp.ticks_x(scene.tick_step_x) {
        let px = vp.to_px_x(x);
        ops.push(DrawOp::Polyline {
            points: vec![(px, vp.to_px_y(scene.y_min)), (px, vp.to_px_y(scene.y_max))],
            color: GRID_COLOR.to_string(),
            width: GRID_WIDTH,
            dashed: true,
            closed: false,
        });
    }
    for y in vp.ticks_y(scene.tick_step_y) {
        let py = vp.to_px_y(y);
        ops.push(DrawOp::Polyline {
            points: vec![(vp.to_px_x(scene.x_min), py), (vp.to_px_x(scene.x_max), py)],
            color: GRID_COLOR.to_string(),
            width: GRID_WIDTH,
            dashed: true,
            closed: false,
        });
    }
}

/// Solid axes through the origin with arrowheads at the positive ends and
/// italic variable labels. An axis whose zero line is off-range is skipped.
fn draw_axes(ops: &mut Vec<DrawOp>, scene: &Scene, vp: &Viewport) {
    if scene.y_min <= 0.0 && scene.y_max >= 0.0 {
        let y0 = vp.to_px_y(0.0);
        let (x_start, x_end) = (vp.to_px_x(scene.x_min), vp.to_px_x(scene.x_max));
        ops.push(DrawOp::Polyline {
            points: vec![(x_start, y0), (x_end, y0)],
            color: AXIS_COLOR.to_string(),
            width: AXIS_WIDTH,
            dashed: false,
            closed: false,
        });
        ops.push(arrowhead((x_end - 1.0, y0), (1.0, 0.0)));
        ops.push(DrawOp::Text {
            x: x_end + 4.0,
            y: y0 + 4.0,
            text: "x".to_string(),
            color: AXIS_COLOR.to_string(),
            italic: true,
            anchor: TextAnchor::Start,
        });
    }
    if scene.x_min <= 0.0 && scene.x_max >= 0.0 {
        let x0 = vp.to_px_x(0.0);
        let (y_start, y_end) = (vp.to_px_y(scene.y_min), vp.to_px_y(scene.y_max));
        ops.push(DrawOp::Polyline {
            points: vec![(x0, y_start), (x0, y_end)],
            color: AXIS_COLOR.to_string(),
            width: AXIS_WIDTH,
            dashed: false,
            closed: false,
        });
        // Pixel y decreases upward
        ops.push(arrowhead((x0, y_end + 1.0), (0.0, -1.0)));
        ops.push(DrawOp::Text {
            x: x0,
            y: y_end - 8.0,
            text: "y".to_string(),
            color: AXIS_COLOR.to_string(),
            italic: true,
            anchor: TextAnchor::Middle,
        });
    }
}

/// Filled triangular arrowhead with its tip at `tip`, pointing along `dir`
/// (a unit vector in pixel space).
fn arrowhead(tip: (f64, f64), dir: (f64, f64)) -> DrawOp {
    let (tx, ty) = tip;
    let (dx, dy) = dir;
    let (px, py) = (-dy, dx);
    let (bx, by) = (tx - dx * ARROW_LEN, ty - dy * ARROW_LEN);
    DrawOp::Polygon {
        points: vec![
            (tx, ty),
            (bx + px * ARROW_HALF_WIDTH, by + py * ARROW_HALF_WIDTH),
            (bx - px * ARROW_HALF_WIDTH, by - py * ARROW_HALF_WIDTH),
        ],
        fill: AXIS_COLOR.to_string(),
        opacity: 1.0,
    }
}

/// Pixel offset and anchoring of a point-marker label.
fn label_offset(pos: LabelPos) -> (f64, f64, TextAnchor) {
    match pos {
        LabelPos::Above => (0.0, -7.0, TextAnchor::Middle),
        LabelPos::Below => (0.0, 16.0, TextAnchor::Middle),
        LabelPos::Left => (-7.0, 4.0, TextAnchor::End),
        LabelPos::Right => (7.0, 4.0, TextAnchor::Start),
        LabelPos::AboveLeft => (-6.0, -6.0, TextAnchor::End),
        LabelPos::AboveRight => (6.0, -6.0, TextAnchor::Start),
        LabelPos::BelowLeft => (-6.0, 14.0, TextAnchor::End),
        LabelPos::BelowRight => (6.0, 14.0, TextAnchor::Start),
    }
}
