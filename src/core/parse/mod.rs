//! Directive text to Scene pipeline
//!
//! The whole parse is one synchronous, best-effort walk over the directive
//! text: comments and the optional `tikzpicture` environment are stripped,
//! `\def` variables are collected, the text is split into commands, and each
//! command is classified once and dispatched to its extraction stage. A
//! malformed or unresolvable directive is dropped with a warning; nothing
//! here can panic its way out to the caller.

pub mod context;
pub mod coordinate;
pub mod eval;
pub mod extract;
pub mod labels;

use log::debug;

use crate::core::render::viewport::calculate_step;
use crate::core::scene::{
    Coord, FilledArea, Label, LabelPos, Line, LineStyle, PointMarker, Scene,
};
use context::ParseContext;

// =============================================================================
// Warning System
// =============================================================================

/// Kind of non-fatal diagnostic generated during a parse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// A directive matched no known pattern and was silently dropped
    SkippedDirective,
    /// An expression could not be evaluated; the owning directive was dropped
    EvalError,
    /// A coordinate name was referenced before its definition
    UnresolvedCoordinate,
    /// No axis information and no fragments at all; an empty canvas renders
    EmptyScene,
}

impl std::fmt::Display for WarningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WarningKind::SkippedDirective => write!(f, "skipped directive"),
            WarningKind::EvalError => write!(f, "evaluation error"),
            WarningKind::UnresolvedCoordinate => write!(f, "unresolved coordinate"),
            WarningKind::EmptyScene => write!(f, "empty scene"),
        }
    }
}

/// A warning generated while building a scene
#[derive(Debug, Clone)]
pub struct ParseWarning {
    pub kind: WarningKind,
    pub message: String,
    /// Offending directive text, truncated
    pub location: Option<String>,
}

impl ParseWarning {
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        ParseWarning {
            kind,
            message: message.into(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref loc) = self.location {
            write!(f, "[{}] {}: {}", self.kind, loc, self.message)
        } else {
            write!(f, "[{}] {}", self.kind, self.message)
        }
    }
}

/// Scene plus the diagnostics collected while building it
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub scene: Scene,
    pub warnings: Vec<ParseWarning>,
}

impl ParseOutcome {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

// =============================================================================
// Fragments
// =============================================================================

/// Typed output of one extraction stage, consumed uniformly by the scene
/// assembler.
#[derive(Debug, Clone)]
pub(crate) enum Fragment {
    /// An axis-aligned arrow segment contributing scene bounds
    Axis {
        horizontal: bool,
        min: f64,
        max: f64,
    },
    Filled(FilledArea),
    Path(Line),
    Point(PointMarker),
    Plot {
        expression: String,
        variable: String,
        /// `None` defers to the final x-range of the scene
        domain: Option<(f64, f64)>,
        color: String,
        style: LineStyle,
        /// Position keyword and normalized text of a trailing node label
        label: Option<(LabelPos, String)>,
    },
    Text(Label),
}

/// Find the index of the close char matching the first open char, handling
/// nesting. Text before the first open char is skipped.
pub(crate) fn find_matching(s: &str, open: char, close: char) -> Option<usize> {
    let mut depth = 0;
    for (i, c) in s.char_indices() {
        if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

// =============================================================================
// Pipeline
// =============================================================================

/// Build a scene from raw directive text, collecting diagnostics.
pub fn parse_scene_with_diagnostics(input: &str) -> ParseOutcome {
    let mut ctx = ParseContext::new();

    let text = extract::strip_comments(input);
    let text = extract::strip_environment(&text).to_string();
    let text = extract::build_variable_table(&text, &mut ctx);
    let commands = extract::split_commands(&text);
    debug!("parsing {} directives", commands.len());

    let mut fragments = Vec::new();
    for cmd in &commands {
        if let Some(fragment) = extract::extract(cmd, &mut ctx) {
            fragments.push(fragment);
        }
    }

    let scene = assemble(fragments, &mut ctx);
    ParseOutcome {
        scene,
        warnings: ctx.warnings,
    }
}

/// Build a scene from raw directive text. Never fails; malformed input
/// yields an empty or partial scene.
pub fn parse_scene(input: &str) -> Scene {
    parse_scene_with_diagnostics(input).scene
}

/// Fold extracted fragments into the final scene.
fn assemble(fragments: Vec<Fragment>, ctx: &mut ParseContext) -> Scene {
    let mut scene = Scene::default();
    let mut saw_axis = false;

    // Bounds first, so deferred plot domains and labels can use them
    for fragment in &fragments {
        if let Fragment::Axis {
            horizontal,
            min,
            max,
        } = fragment
        {
            if min.is_finite() && max.is_finite() && min < max {
                saw_axis = true;
                if *horizontal {
                    scene.x_min = *min;
                    scene.x_max = *max;
                } else {
                    scene.y_min = *min;
                    scene.y_max = *max;
                }
            }
        }
    }
    // Repair anything degenerate rather than propagating it
    if !(scene.x_min.is_finite() && scene.x_max.is_finite() && scene.x_min < scene.x_max) {
        scene.x_min = Scene::DEFAULT_MIN;
        scene.x_max = Scene::DEFAULT_MAX;
    }
    if !(scene.y_min.is_finite() && scene.y_max.is_finite() && scene.y_min < scene.y_max) {
        scene.y_min = Scene::DEFAULT_MIN;
        scene.y_max = Scene::DEFAULT_MAX;
    }
    scene.tick_step_x = calculate_step(scene.x_min, scene.x_max);
    scene.tick_step_y = calculate_step(scene.y_min, scene.y_max);

    for fragment in fragments {
        match fragment {
            Fragment::Axis { .. } => {}
            Fragment::Filled(area) => scene.filled_areas.push(area),
            Fragment::Path(line) => scene.lines.push(line),
            Fragment::Point(point) => scene.points.push(point),
            Fragment::Text(label) => scene.labels.push(label),
            Fragment::Plot {
                expression,
                variable,
                domain,
                color,
                style,
                label,
            } => {
                let (domain_min, domain_max) =
                    domain.unwrap_or((scene.x_min, scene.x_max));

                if let Some((pos, text)) = label {
                    if !text.is_empty() {
                        let anchor_x = match pos {
                            LabelPos::Right | LabelPos::AboveRight | LabelPos::BelowRight => {
                                domain_max
                            }
                            LabelPos::Left | LabelPos::AboveLeft | LabelPos::BelowLeft => {
                                domain_min
                            }
                            _ => (domain_min + domain_max) / 2.0,
                        };
                        let mut vars = fxhash::FxHashMap::default();
                        vars.insert(variable.clone(), anchor_x);
                        match eval::eval(&expression, &vars) {
                            Ok(y) if y.is_finite() => scene.labels.push(Label {
                                coord: Coord::new(anchor_x, y),
                                text,
                                color: color.clone(),
                            }),
                            Ok(_) => {}
                            Err(e) => {
                                ctx.warn(
                                    WarningKind::EvalError,
                                    format!("plot label anchor did not evaluate: {}", e),
                                );
                            }
                        }
                    }
                }

                scene.function_plots.push(crate::core::scene::FunctionPlot {
                    expression,
                    variable,
                    domain_min,
                    domain_max,
                    color,
                    style,
                });
            }
        }
    }

    // Final state of the named-coordinate table, in definition order
    for name in &ctx.coordinate_order {
        if let Some(coord) = ctx.coordinates.get(name) {
            scene.coordinates.insert(name.clone(), *coord);
        }
    }

    if !saw_axis && scene.is_empty() {
        ctx.warn(
            WarningKind::EmptyScene,
            "no recognizable directives; rendering an empty canvas",
        );
    }

    scene
}
