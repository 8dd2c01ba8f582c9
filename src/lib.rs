//! tikzlite: a TikZ-subset interpreter and SVG renderer for plane-geometry
//! and function-graph diagrams of the kind found in math exercises.
//!
//! The pipeline is parse → sample → render: [`parse_scene`] turns directive
//! text into an immutable [`Scene`], and [`render_scene`] turns a scene into
//! SVG markup on a fixed square canvas. [`tikz_to_svg`] chains the two.
//! Parsing is best effort and never fails; directives that cannot be
//! understood are dropped, with the reasons available through
//! [`parse_scene_with_diagnostics`].
//!
//! ```
//! use tikzlite::tikz_to_svg;
//!
//! let svg = tikz_to_svg(r"\draw[->] (-5,0) -- (5,0); \draw[->] (0,-5) -- (0,5);");
//! assert!(svg.starts_with("<svg"));
//! ```

pub mod core;
pub mod utils;

use fxhash::FxHashMap;

pub use crate::core::parse::{
    parse_scene, parse_scene_with_diagnostics, ParseOutcome, ParseWarning, WarningKind,
};
pub use crate::core::render::{
    DrawOp, MathTypesetter, PlainText, RenderOptions, TextAnchor,
};
pub use crate::core::scene::{
    Coord, FilledArea, FunctionPlot, Label, LabelPos, Line, LineStyle, PointMarker, Scene,
};
pub use crate::utils::error::{DiagramError, DiagramResult};

/// Render an already-parsed scene to an SVG document.
pub fn render_scene(scene: &Scene, options: &RenderOptions) -> String {
    let ops = core::render::render(scene, options);
    core::render::svg::draw_ops_to_svg(&ops, options.width, options.height)
}

/// Render a scene through a custom math typesetter.
pub fn render_scene_with_typesetter(
    scene: &Scene,
    options: &RenderOptions,
    typesetter: &dyn MathTypesetter,
) -> String {
    let ops = core::render::render_with_typesetter(scene, options, typesetter);
    core::render::svg::draw_ops_to_svg(&ops, options.width, options.height)
}

/// Directive text straight to SVG with the default canvas.
pub fn tikz_to_svg(input: &str) -> String {
    tikz_to_svg_with_options(input, &RenderOptions::default())
}

/// Directive text straight to SVG.
pub fn tikz_to_svg_with_options(input: &str, options: &RenderOptions) -> String {
    render_scene(&parse_scene(input), options)
}

/// Memo table over [`tikz_to_svg_with_options`], keyed on the source text.
///
/// Rendering is deterministic, so re-rendering an already-seen directive
/// string can be answered from the table. One cache holds one canvas
/// configuration.
pub struct RenderCache {
    options: RenderOptions,
    rendered: FxHashMap<u64, String>,
}

impl RenderCache {
    pub fn new(options: RenderOptions) -> Self {
        RenderCache {
            options,
            rendered: FxHashMap::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.rendered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rendered.is_empty()
    }

    /// Render `input`, reusing the previous output when the same source
    /// text has been rendered before.
    pub fn render(&mut self, input: &str) -> String {
        let key = fxhash::hash64(input.as_bytes());
        if let Some(svg) = self.rendered.get(&key) {
            return svg.clone();
        }
        let svg = tikz_to_svg_with_options(input, &self.options);
        self.rendered.insert(key, svg.clone());
        svg
    }

    pub fn clear(&mut self) {
        self.rendered.clear();
    }
}

impl Default for RenderCache {
    fn default() -> Self {
        RenderCache::new(RenderOptions::default())
    }
}
