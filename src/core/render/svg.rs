//! SVG emission
//!
//! Serializes an ordered draw-op list into a standalone SVG document. The
//! output is deterministic byte-for-byte: numbers are formatted through one
//! helper and ops are written in the order the renderer produced them.

use std::fmt::Write;

use super::{DrawOp, TextAnchor};

const FONT_SIZE: f64 = 12.0;
const DASH_PATTERN: &str = "4 3";

/// Serialize draw ops into a complete SVG document.
pub fn draw_ops_to_svg(ops: &[DrawOp], width: f64, height: f64) -> String {
    let mut out = String::with_capacity(1024 + ops.len() * 96);
    // Infallible writer, so the Write results below can be ignored
    let _ = write!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n",
        w = fmt_num(width),
        h = fmt_num(height),
    );

    for op in ops {
        match op {
            DrawOp::Polyline {
                points,
                color,
                width,
                dashed,
                closed,
            } => {
                let tag = if *closed { "polygon" } else { "polyline" };
                let _ = write!(
                    out,
                    "  <{} points=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\"",
                    tag,
                    fmt_points(points),
                    escape(color),
                    fmt_num(*width),
                );
                if *dashed {
                    let _ = write!(out, " stroke-dasharray=\"{}\"", DASH_PATTERN);
                }
                out.push_str(" />\n");
            }
            DrawOp::Polygon {
                points,
                fill,
                opacity,
            } => {
                let _ = write!(
                    out,
                    "  <polygon points=\"{}\" fill=\"{}\"",
                    fmt_points(points),
                    escape(fill),
                );
                if *opacity < 1.0 {
                    let _ = write!(out, " fill-opacity=\"{}\"", fmt_num(*opacity));
                }
                out.push_str(" />\n");
            }
            DrawOp::Circle { cx, cy, r, fill } => {
                let _ = write!(
                    out,
                    "  <circle cx=\"{}\" cy=\"{}\" r=\"{}\" fill=\"{}\" />\n",
                    fmt_num(*cx),
                    fmt_num(*cy),
                    fmt_num(*r),
                    escape(fill),
                );
            }
            DrawOp::Text {
                x,
                y,
                text,
                color,
                italic,
                anchor,
            } => {
                let _ = write!(
                    out,
                    "  <text x=\"{}\" y=\"{}\" fill=\"{}\" font-size=\"{}\" text-anchor=\"{}\"",
                    fmt_num(*x),
                    fmt_num(*y),
                    escape(color),
                    fmt_num(FONT_SIZE),
                    anchor_name(*anchor),
                );
                if *italic {
                    out.push_str(" font-style=\"italic\"");
                }
                let _ = write!(out, ">{}</text>\n", escape(text));
            }
        }
    }

    out.push_str("</svg>\n");
    out
}

fn anchor_name(anchor: TextAnchor) -> &'static str {
    match anchor {
        TextAnchor::Start => "start",
        TextAnchor::Middle => "middle",
        TextAnchor::End => "end",
    }
}

fn fmt_points(points: &[(f64, f64)]) -> String {
    let mut out = String::with_capacity(points.len() * 12);
    for (i, (x, y)) in points.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{},{}", fmt_num(*x), fmt_num(*y));
    }
    out
}

/// Format a coordinate with at most two decimals, trailing zeros trimmed.
fn fmt_num(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == rounded.trunc() {
        format!("{}", rounded as i64)
    } else {
        let s = format!("{:.2}", rounded);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
