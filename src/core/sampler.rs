//! Function sampling
//!
//! Evaluates a plot expression at evenly spaced x-values across its domain
//! and splits the results into continuous polyline segments. A segment
//! breaks at non-finite values, off-screen excursions, and suspected
//! singularities (a jump larger than most of the visible y-range between
//! two kept samples).

use fxhash::FxHashMap;
use log::debug;

use crate::core::parse::eval;
use crate::core::scene::{Coord, FunctionPlot, Scene};

/// Default number of evaluation points per plot
pub const DEFAULT_RESOLUTION: usize = 201;

/// Fraction of the y-range beyond which a sample is considered off-screen
/// and a y-jump is considered a discontinuity
const BREAK_FRACTION: f64 = 0.8;

/// One continuous run of sampled points
pub type Segment = Vec<Coord>;

/// Sample `plot` over its domain against the scene's y-range.
///
/// May return zero, one, or many segments; an expression that never
/// evaluates yields no segments at all.
pub fn sample(plot: &FunctionPlot, scene: &Scene, resolution: usize) -> Vec<Segment> {
    sample_expr(
        &plot.expression,
        &plot.variable,
        plot.domain_min,
        plot.domain_max,
        scene.y_max - scene.y_min,
        resolution,
    )
}

/// Expression-level sampling; `y_span` is the visible y-range used for the
/// excursion and jump thresholds.
pub fn sample_expr(
    expression: &str,
    variable: &str,
    domain_min: f64,
    domain_max: f64,
    y_span: f64,
    resolution: usize,
) -> Vec<Segment> {
    if resolution < 2 || !(domain_min < domain_max) || !y_span.is_finite() {
        return Vec::new();
    }
    let threshold = BREAK_FRACTION * y_span;
    let step = (domain_max - domain_min) / (resolution - 1) as f64;

    let mut vars: FxHashMap<String, f64> = FxHashMap::default();
    let mut segments: Vec<Segment> = Vec::new();
    let mut current: Segment = Vec::new();
    let mut last_kept_y: Option<f64> = None;
    let mut eval_failures = 0usize;

    for i in 0..resolution {
        let x = domain_min + step * i as f64;
        vars.insert(variable.to_string(), x);

        let y = match eval::eval(expression, &vars) {
            Ok(y) if y.is_finite() => y,
            Ok(_) => {
                flush(&mut segments, &mut current);
                last_kept_y = None;
                continue;
            }
            Err(_) => {
                eval_failures += 1;
                flush(&mut segments, &mut current);
                last_kept_y = None;
                continue;
            }
        };

        // Off-screen excursion: the sample itself is inadmissible
        if y.abs() > threshold {
            flush(&mut segments, &mut current);
            last_kept_y = None;
            continue;
        }

        // Suspected singularity between two kept samples
        if let Some(prev) = last_kept_y {
            if (y - prev).abs() > threshold {
                flush(&mut segments, &mut current);
            }
        }

        current.push(Coord::new(x, y));
        last_kept_y = Some(y);
    }
    flush(&mut segments, &mut current);

    if eval_failures > 0 {
        debug!(
            "expression '{}' failed to evaluate at {} of {} samples",
            expression, eval_failures, resolution
        );
    }
    segments
}

fn flush(segments: &mut Vec<Segment>, current: &mut Segment) {
    if current.len() >= 2 {
        segments.push(std::mem::take(current));
    } else {
        current.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_identity_is_one_segment() {
        let segments = sample_expr(r"\x", "x", 0.0, 4.0, 10.0, DEFAULT_RESOLUTION);
        assert_eq!(segments.len(), 1);
        let seg = &segments[0];
        assert_eq!(seg.len(), DEFAULT_RESOLUTION);
        assert!(close(seg[0].x, 0.0) && close(seg[0].y, 0.0));
        assert!(close(seg[seg.len() - 1].x, 4.0) && close(seg[seg.len() - 1].y, 4.0));
    }

    #[test]
    fn test_reciprocal_splits_at_singularity() {
        let segments = sample_expr(r"1/\x", "x", -2.0, 2.0, 10.0, DEFAULT_RESOLUTION);
        assert!(
            segments.len() >= 2,
            "expected a split near x=0, got {} segment(s)",
            segments.len()
        );
        // Left branch stays negative, right branch positive
        assert!(segments.first().unwrap().iter().all(|p| p.y < 0.0));
        assert!(segments.last().unwrap().iter().all(|p| p.y > 0.0));
    }

    #[test]
    fn test_unevaluable_expression_yields_nothing() {
        let segments = sample_expr("nonsense +", "x", 0.0, 1.0, 10.0, 50);
        assert!(segments.is_empty());
    }

    #[test]
    fn test_off_screen_samples_dropped() {
        // x*x exceeds 0.8 * 10 = 8 for |x| > sqrt(8)
        let segments = sample_expr(r"\x*\x", "x", -4.0, 4.0, 10.0, DEFAULT_RESOLUTION);
        assert_eq!(segments.len(), 1);
        for p in &segments[0] {
            assert!(p.y.abs() <= 8.0 + 1e-9);
        }
    }

    #[test]
    fn test_degenerate_domain() {
        assert!(sample_expr(r"\x", "x", 2.0, 2.0, 10.0, 100).is_empty());
        assert!(sample_expr(r"\x", "x", 0.0, 1.0, 10.0, 1).is_empty());
        assert!(sample_expr(r"\x", "x", 0.0, 1.0, f64::NAN, 100).is_empty());
    }
}
