//! Viewport mapping
//!
//! Affine transform from logical diagram coordinates onto a fixed pixel
//! canvas, plus the grid/tick spacing rule. The y-axis is flipped: logical
//! up is pixel up.

use crate::core::scene::Scene;

/// Logical-to-pixel transform for one canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Viewport {
    pub fn new(scene: &Scene, width: f64, height: f64, padding: f64) -> Self {
        Viewport {
            width,
            height,
            padding,
            x_min: scene.x_min,
            x_max: scene.x_max,
            y_min: scene.y_min,
            y_max: scene.y_max,
        }
    }

    pub fn to_px_x(&self, x: f64) -> f64 {
        self.padding
            + (x - self.x_min) / (self.x_max - self.x_min) * (self.width - 2.0 * self.padding)
    }

    pub fn to_px_y(&self, y: f64) -> f64 {
        self.height
            - self.padding
            - (y - self.y_min) / (self.y_max - self.y_min) * (self.height - 2.0 * self.padding)
    }

    pub fn to_px(&self, x: f64, y: f64) -> (f64, f64) {
        (self.to_px_x(x), self.to_px_y(y))
    }

    /// Grid/tick positions along x, at multiples of the step, zero excluded
    /// (the axes draw the zero line themselves).
    pub fn ticks_x(&self, step: f64) -> Vec<f64> {
        ticks(self.x_min, self.x_max, step)
    }

    /// Grid/tick positions along y, zero excluded.
    pub fn ticks_y(&self, step: f64) -> Vec<f64> {
        ticks(self.y_min, self.y_max, step)
    }
}

/// Tick spacing for a range: small ranges get unit steps, larger ranges
/// round steps, anything beyond 100 about ten ticks.
pub fn calculate_step(min: f64, max: f64) -> f64 {
    let range = max - min;
    if !range.is_finite() || range <= 0.0 {
        return 1.0;
    }
    if range <= 10.0 {
        1.0
    } else if range <= 20.0 {
        2.0
    } else if range <= 50.0 {
        5.0
    } else if range <= 100.0 {
        10.0
    } else {
        (range / 10.0).ceil()
    }
}

fn ticks(min: f64, max: f64, step: f64) -> Vec<f64> {
    if step <= 0.0 {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut value = (min / step).ceil() * step;
    while value <= max + 1e-9 {
        if value.abs() > 1e-9 {
            out.push(value);
        }
        value += step;
    }
    out
}
