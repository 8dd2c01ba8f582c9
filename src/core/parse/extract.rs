//! Directive extraction
//!
//! One named extraction stage per directive family, driven by a single
//! central classifier so that the exclusion rules (plot/grid/foreach/
//! rectangle paths never reach the plain-line stage, circle markers never
//! reach the fill stage) live in exactly one place.
//!
//! Every extractor is best-effort: a directive that fails to resolve is
//! dropped with a warning on the context and the rest of the diagram still
//! renders.

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use super::context::ParseContext;
use super::coordinate::{self, ResolveError};
use super::eval;
use super::labels;
use super::{find_matching, Fragment, WarningKind};
use crate::core::scene::{Coord, FilledArea, Label, LabelPos, Line, LineStyle, PointMarker};

lazy_static! {
    static ref DEF: Regex = Regex::new(r"\\def\s*\\([a-zA-Z]+)\s*\{([^{}]*)\}").unwrap();
    static ref COORDINATE_DEF: Regex = Regex::new(
        r"^\\coordinate\s*(?:\[[^\]]*\])?\s*\(([A-Za-z][A-Za-z0-9_']*)\)\s*at\s*(.+)$"
    )
    .unwrap();
    static ref PLOT_BODY: Regex =
        Regex::new(r"plot\s*\(\s*\{?\\?([a-zA-Z]+)\}?\s*,\s*\{").unwrap();
    static ref NODE_HEAD: Regex = Regex::new(
        r"^\\node\s*(?:\[([^\]]*)\])?\s*(?:\([A-Za-z][A-Za-z0-9_']*\)\s*)?at\s*"
    )
    .unwrap();
}

/// The fixed stroke/fill palette; anything else renders black.
pub(crate) fn palette_color(name: &str) -> Option<&'static str> {
    match name.trim() {
        "blue" => Some("blue"),
        "red" => Some("red"),
        "green" => Some("green"),
        "gray" => Some("gray"),
        "orange" => Some("orange"),
        "purple" => Some("purple"),
        "brown" => Some("brown"),
        "pink" => Some("pink"),
        "cyan" => Some("cyan"),
        "magenta" => Some("magenta"),
        "yellow" => Some("yellow"),
        _ => None,
    }
}

/// A `color` or `color!opacityPercent` fill spec
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FillSpec {
    pub color: String,
    /// `None` when the `!` part is absent; the owning extractor applies its
    /// own default (0.7 for rectangles, 0.3 for filled polygons)
    pub opacity: Option<f64>,
}

impl FillSpec {
    fn parse(input: &str) -> Option<FillSpec> {
        let input = input.trim();
        if let Some((name, pct)) = input.split_once('!') {
            let color = palette_color(name)?.to_string();
            let opacity = pct.trim().parse::<f64>().ok().map(|p| {
                (p / 100.0).clamp(0.0, 1.0)
            });
            Some(FillSpec { color, opacity })
        } else {
            palette_color(input).map(|c| FillSpec {
                color: c.to_string(),
                opacity: None,
            })
        }
    }
}

/// Parsed `[...]` option list of one directive
#[derive(Debug, Clone, Default)]
pub(crate) struct DirectiveOptions {
    pub color: Option<String>,
    pub fill: Option<FillSpec>,
    pub dashed: bool,
    pub arrow: bool,
    /// Raw `min:max` halves of a `domain=` option
    pub domain: Option<(String, String)>,
}

impl DirectiveOptions {
    /// Parse an option string such as `->, thick, blue` or
    /// `fill=red!20, dashed`. Unknown options are ignored.
    pub(crate) fn parse(input: &str) -> Self {
        let mut opts = DirectiveOptions::default();
        let cleaned = input.trim_start_matches('[').trim_end_matches(']');

        for part in cleaned.split(',') {
            let part = part.trim();

            if part.contains("->") || part.contains("<-") {
                opts.arrow = true;
            }
            if part == "dashed" || part == "dotted" {
                opts.dashed = true;
            }
            if let Some(value) = part.strip_prefix("domain=") {
                if let Some((lo, hi)) = value.split_once(':') {
                    opts.domain = Some((lo.trim().to_string(), hi.trim().to_string()));
                }
            } else if let Some(value) = part.strip_prefix("fill=") {
                if let Some(fill) = FillSpec::parse(value) {
                    opts.fill = Some(fill);
                }
            } else if let Some(value) = part
                .strip_prefix("draw=")
                .or_else(|| part.strip_prefix("color="))
            {
                if let Some(color) = palette_color(value) {
                    opts.color = Some(color.to_string());
                }
            } else if let Some(color) = palette_color(part) {
                opts.color = Some(color.to_string());
            } else if part.contains('!') {
                // Bare `blue!30` inside a fill command
                if let Some(fill) = FillSpec::parse(part) {
                    opts.fill = Some(fill);
                }
            }
        }

        opts
    }

    fn stroke_color(&self) -> String {
        self.color.clone().unwrap_or_else(|| "black".to_string())
    }

    fn line_style(&self) -> LineStyle {
        if self.dashed {
            LineStyle::Dashed
        } else {
            LineStyle::Solid
        }
    }
}

/// An inline `node[options] {text}` attached to a path
#[derive(Debug, Clone)]
struct InlineNode {
    options: String,
    text: String,
}

// =============================================================================
// Source preparation
// =============================================================================

/// Strip `%` comments (to end of line, `\%` escapes kept).
pub(crate) fn strip_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for line in input.lines() {
        let mut cut = line.len();
        let bytes = line.as_bytes();
        for (i, &b) in bytes.iter().enumerate() {
            if b == b'%' && (i == 0 || bytes[i - 1] != b'\\') {
                cut = i;
                break;
            }
        }
        out.push_str(&line[..cut]);
        out.push('\n');
    }
    out
}

/// Tolerate and remove a surrounding `tikzpicture` environment.
pub(crate) fn strip_environment(input: &str) -> &str {
    let mut content = input.trim();
    if let Some(rest) = content.strip_prefix(r"\begin{tikzpicture}") {
        content = rest.trim_start();
        if content.starts_with('[') {
            if let Some(end) = find_matching(content, '[', ']') {
                content = content[end + 1..].trim_start();
            }
        }
    }
    if let Some(rest) = content.strip_suffix(r"\end{tikzpicture}") {
        content = rest.trim_end();
    }
    content
}

/// Extract `\def\name{expr}` definitions into the variable table and remove
/// them from the text. Definitions are evaluated in source order, so later
/// ones may reference earlier ones.
pub(crate) fn build_variable_table(input: &str, ctx: &mut ParseContext) -> String {
    for caps in DEF.captures_iter(input) {
        let name = &caps[1];
        let body = &caps[2];
        match eval::eval(body, &ctx.variables) {
            Ok(value) => {
                ctx.variables.insert(name.to_string(), value);
            }
            Err(e) => {
                ctx.warn_at(
                    WarningKind::EvalError,
                    format!("variable definition did not evaluate: {}", e),
                    format!("\\def\\{}", name),
                );
            }
        }
    }
    DEF.replace_all(input, "").into_owned()
}

/// Split directive text into commands on `;` at brace depth zero.
pub(crate) fn split_commands(input: &str) -> Vec<String> {
    let mut commands = Vec::new();
    let mut current = String::new();
    let mut brace_depth: i32 = 0;

    for c in input.chars() {
        match c {
            '{' => {
                brace_depth += 1;
                current.push(c);
            }
            '}' => {
                brace_depth = brace_depth.saturating_sub(1);
                current.push(c);
            }
            ';' if brace_depth == 0 => {
                let cmd = current.trim().to_string();
                if !cmd.is_empty() {
                    commands.push(cmd);
                }
                current.clear();
            }
            _ => current.push(c),
        }
    }
    let cmd = current.trim().to_string();
    if !cmd.is_empty() {
        commands.push(cmd);
    }
    commands
}

// =============================================================================
// Classification
// =============================================================================

/// Directive families, decided centrally so exclusion rules apply once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DirectiveKind {
    CoordinateDef,
    FunctionPlot,
    Rectangle,
    PointMarker,
    FilledPolygon,
    AxisCandidate,
    Path,
    TextNode,
    /// `\foreach`, `grid` paths and anything unrecognized
    Skip,
}

pub(crate) fn classify(cmd: &str) -> DirectiveKind {
    let cmd = cmd.trim_start();

    if cmd.starts_with(r"\coordinate") {
        return DirectiveKind::CoordinateDef;
    }
    if cmd.starts_with(r"\node") {
        return DirectiveKind::TextNode;
    }
    if cmd.starts_with(r"\foreach") || cmd.contains("foreach") {
        return DirectiveKind::Skip;
    }

    let is_fill_cmd = cmd.starts_with(r"\filldraw") || cmd.starts_with(r"\fill");
    let is_draw_cmd = cmd.starts_with(r"\draw");
    if !is_fill_cmd && !is_draw_cmd {
        return DirectiveKind::Skip;
    }

    let (options, body) = split_options(cmd);

    // Keyword exclusions, checked against the path body only
    if body.contains("plot") {
        return if is_draw_cmd {
            DirectiveKind::FunctionPlot
        } else {
            DirectiveKind::Skip
        };
    }
    if body.contains("grid") {
        return DirectiveKind::Skip;
    }
    if body.contains("rectangle") {
        return DirectiveKind::Rectangle;
    }
    if body.contains("circle") {
        return DirectiveKind::PointMarker;
    }
    if is_fill_cmd {
        return DirectiveKind::FilledPolygon;
    }
    if options.contains("->") || options.contains("<-") {
        return DirectiveKind::AxisCandidate;
    }
    DirectiveKind::Path
}

/// Split a command into its option string and path body, e.g.
/// `\draw[blue, dashed] (A) -- (B)` into `"blue, dashed"` and `"(A) -- (B)"`.
fn split_options(cmd: &str) -> (String, String) {
    let rest = cmd
        .trim_start()
        .trim_start_matches(r"\filldraw")
        .trim_start_matches(r"\fill")
        .trim_start_matches(r"\draw")
        .trim_start();
    if rest.starts_with('[') {
        if let Some(end) = find_matching(rest, '[', ']') {
            return (
                rest[1..end].to_string(),
                rest[end + 1..].trim().to_string(),
            );
        }
    }
    (String::new(), rest.to_string())
}

// =============================================================================
// Per-family extractors
// =============================================================================

/// Dispatch one command to its extractor. Table-only directives return
/// `None`; everything else yields a typed fragment.
pub(crate) fn extract(cmd: &str, ctx: &mut ParseContext) -> Option<Fragment> {
    match classify(cmd) {
        DirectiveKind::CoordinateDef => {
            extract_coordinate_def(cmd, ctx);
            None
        }
        DirectiveKind::AxisCandidate => extract_axis(cmd, ctx),
        DirectiveKind::Rectangle => extract_rectangle(cmd, ctx),
        DirectiveKind::FilledPolygon => extract_filled_polygon(cmd, ctx),
        DirectiveKind::Path => extract_path(cmd, ctx),
        DirectiveKind::PointMarker => extract_point_marker(cmd, ctx),
        DirectiveKind::FunctionPlot => extract_function_plot(cmd, ctx),
        DirectiveKind::TextNode => extract_text_node(cmd, ctx),
        DirectiveKind::Skip => {
            debug!("skipping directive: {}", cmd);
            ctx.warn_at(
                WarningKind::SkippedDirective,
                "directive matched no known pattern",
                truncate(cmd),
            );
            None
        }
    }
}

fn truncate(cmd: &str) -> String {
    const MAX: usize = 40;
    if cmd.len() <= MAX {
        return cmd.to_string();
    }
    let mut cut = MAX;
    while !cmd.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &cmd[..cut])
}

/// Report a failed coordinate resolution and drop the owning directive.
fn warn_unresolved(ctx: &mut ParseContext, cmd: &str, err: ResolveError) {
    let kind = match err {
        ResolveError::Unknown(_) => WarningKind::UnresolvedCoordinate,
        _ => WarningKind::EvalError,
    };
    ctx.warn_at(kind, err.to_string(), truncate(cmd));
}

fn extract_coordinate_def(cmd: &str, ctx: &mut ParseContext) {
    let Some(caps) = COORDINATE_DEF.captures(cmd.trim()) else {
        ctx.warn_at(
            WarningKind::SkippedDirective,
            "coordinate definition did not parse",
            truncate(cmd),
        );
        return;
    };
    let name = caps[1].to_string();
    let token = caps[2].trim();
    match coordinate::resolve(token, ctx) {
        Ok(coord) => ctx.define_coordinate(&name, coord),
        Err(e) => warn_unresolved(ctx, cmd, e),
    }
}

/// Arrow-terminated segments: an axis-aligned one updates the scene bounds,
/// anything else degrades to a plain line.
fn extract_axis(cmd: &str, ctx: &mut ParseContext) -> Option<Fragment> {
    let (options_str, body) = split_options(cmd);
    let options = DirectiveOptions::parse(&options_str);
    let (body, _nodes) = take_inline_nodes(&body);

    let points = resolve_path_points(&body, cmd, ctx)?;
    if points.len() < 2 {
        return None;
    }
    let (a, b) = (points[0], points[1]);

    const EPS: f64 = 1e-9;
    if (a.y - b.y).abs() < EPS {
        return Some(Fragment::Axis {
            horizontal: true,
            min: a.x.min(b.x).floor(),
            max: a.x.max(b.x).ceil(),
        });
    }
    if (a.x - b.x).abs() < EPS {
        return Some(Fragment::Axis {
            horizontal: false,
            min: a.y.min(b.y).floor(),
            max: a.y.max(b.y).ceil(),
        });
    }

    // A diagonal arrow is just a line with an arrowhead we do not draw
    Some(Fragment::Path(Line {
        points,
        style: options.line_style(),
        color: options.stroke_color(),
        is_cycle: false,
    }))
}

fn extract_rectangle(cmd: &str, ctx: &mut ParseContext) -> Option<Fragment> {
    const DEFAULT_OPACITY: f64 = 0.7;
    let (options_str, body) = split_options(cmd);
    let options = DirectiveOptions::parse(&options_str);
    let (body, _nodes) = take_inline_nodes(&body);

    let (before, after) = body.split_once("rectangle")?;
    let c1 = match coordinate::resolve(before.trim(), ctx) {
        Ok(c) => c,
        Err(e) => {
            warn_unresolved(ctx, cmd, e);
            return None;
        }
    };
    let c2 = match coordinate::resolve(after.trim(), ctx) {
        Ok(c) => c,
        Err(e) => {
            warn_unresolved(ctx, cmd, e);
            return None;
        }
    };

    let fill = options.fill.clone().unwrap_or_else(|| FillSpec {
        color: options.stroke_color(),
        opacity: None,
    });
    Some(Fragment::Filled(FilledArea {
        points: vec![
            Coord::new(c1.x, c1.y),
            Coord::new(c2.x, c1.y),
            Coord::new(c2.x, c2.y),
            Coord::new(c1.x, c2.y),
        ],
        color: fill.color,
        opacity: fill.opacity.unwrap_or(DEFAULT_OPACITY),
    }))
}

fn extract_filled_polygon(cmd: &str, ctx: &mut ParseContext) -> Option<Fragment> {
    const DEFAULT_OPACITY: f64 = 0.3;
    let (options_str, body) = split_options(cmd);
    let options = DirectiveOptions::parse(&options_str);
    let (body, _nodes) = take_inline_nodes(&body);

    let points = resolve_path_points(&body, cmd, ctx)?;
    if points.len() < 3 {
        ctx.warn_at(
            WarningKind::SkippedDirective,
            "filled path needs at least three points",
            truncate(cmd),
        );
        return None;
    }

    let fill = options.fill.clone().unwrap_or_else(|| FillSpec {
        color: options.stroke_color(),
        opacity: None,
    });
    Some(Fragment::Filled(FilledArea {
        points,
        color: fill.color,
        opacity: fill.opacity.unwrap_or(DEFAULT_OPACITY),
    }))
}

fn extract_path(cmd: &str, ctx: &mut ParseContext) -> Option<Fragment> {
    let (options_str, body) = split_options(cmd);
    let options = DirectiveOptions::parse(&options_str);
    let (body, _nodes) = take_inline_nodes(&body);

    let mut tokens: Vec<&str> = split_path_tokens(&body);
    let is_cycle = tokens.last().map(|t| t.trim() == "cycle").unwrap_or(false);
    if is_cycle {
        tokens.pop();
    }

    let mut points = Vec::with_capacity(tokens.len());
    for token in tokens {
        match coordinate::resolve(token, ctx) {
            Ok(c) => points.push(c),
            Err(e) => {
                warn_unresolved(ctx, cmd, e);
                return None;
            }
        }
    }
    if points.len() < 2 {
        return None;
    }

    Some(Fragment::Path(Line {
        points,
        style: options.line_style(),
        color: options.stroke_color(),
        is_cycle,
    }))
}

fn extract_point_marker(cmd: &str, ctx: &mut ParseContext) -> Option<Fragment> {
    let (options_str, body) = split_options(cmd);
    let options = DirectiveOptions::parse(&options_str);
    let (body, nodes) = take_inline_nodes(&body);

    let (before, _after) = body.split_once("circle")?;
    let coord = match coordinate::resolve(before.trim(), ctx) {
        Ok(c) => c,
        Err(e) => {
            warn_unresolved(ctx, cmd, e);
            return None;
        }
    };

    let (label, label_pos) = match nodes.first() {
        Some(node) => (
            labels::normalize(&node.text),
            LabelPos::parse(&node.options),
        ),
        None => (String::new(), LabelPos::default()),
    };

    // Point markers take their color from the fill spec or bare palette name
    let color = options
        .fill
        .as_ref()
        .map(|f| f.color.clone())
        .unwrap_or_else(|| options.stroke_color());

    Some(Fragment::Point(PointMarker {
        coord,
        color,
        label,
        label_pos,
    }))
}

fn extract_function_plot(cmd: &str, ctx: &mut ParseContext) -> Option<Fragment> {
    let (options_str, body) = split_options(cmd);
    let options = DirectiveOptions::parse(&options_str);
    let (body, nodes) = take_inline_nodes(&body);

    let caps = PLOT_BODY.captures(&body)?;
    let variable = caps[1].to_string();
    let expr_open = caps.get(0)?.end() - 1;
    let expr_end = find_matching(&body[expr_open..], '{', '}')?;
    let raw_expr = &body[expr_open + 1..expr_open + expr_end];

    // Substitute every known variable except the free one, so the sampler
    // needs no table of its own
    let expression = substitute_variables(raw_expr, &variable, ctx);

    let domain = match &options.domain {
        Some((lo, hi)) => {
            let lo = eval::eval(lo, &ctx.variables);
            let hi = eval::eval(hi, &ctx.variables);
            match (lo, hi) {
                (Ok(lo), Ok(hi)) if lo.is_finite() && hi.is_finite() && lo < hi => {
                    Some((lo, hi))
                }
                _ => {
                    ctx.warn_at(
                        WarningKind::EvalError,
                        "plot domain did not evaluate, using x-range",
                        truncate(cmd),
                    );
                    None
                }
            }
        }
        None => None,
    };

    let label = nodes.first().map(|node| {
        (
            LabelPos::parse(&node.options),
            labels::normalize(&node.text),
        )
    });

    Some(Fragment::Plot {
        expression,
        variable,
        domain,
        color: options.stroke_color(),
        style: options.line_style(),
        label,
    })
}

/// Replace `\name` (and brace-wrapped `{\name}`) occurrences of table
/// variables with their numeric values, leaving the free variable alone.
fn substitute_variables(expr: &str, free_var: &str, ctx: &ParseContext) -> String {
    let mut names: Vec<&String> = ctx
        .variables
        .keys()
        .filter(|name| name.as_str() != free_var)
        .collect();
    // Longest first so `\ab` never matches a prefix of itself
    names.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));

    let mut out = expr.to_string();
    for name in names {
        let value = ctx.variables[name.as_str()];
        out = out.replace(&format!("\\{}", name), &format!("({})", value));
    }
    out
}

fn extract_text_node(cmd: &str, ctx: &mut ParseContext) -> Option<Fragment> {
    let caps = NODE_HEAD.captures(cmd.trim())?;
    let options = DirectiveOptions::parse(caps.get(1).map(|m| m.as_str()).unwrap_or(""));

    let after_at = &cmd.trim()[caps.get(0).map(|m| m.end())?..];
    let coord_end = find_matching(after_at, '(', ')')?;
    let coord = match coordinate::resolve(&after_at[..coord_end + 1], ctx) {
        Ok(c) => c,
        Err(e) => {
            warn_unresolved(ctx, cmd, e);
            return None;
        }
    };

    // Brace-matched body capture handles nested groups (fractions)
    let after_coord = &after_at[coord_end + 1..];
    let brace_start = after_coord.find('{')?;
    let brace_end = find_matching(&after_coord[brace_start..], '{', '}')?;
    let raw_text = &after_coord[brace_start + 1..brace_start + brace_end];

    let text = labels::normalize(raw_text);

    // Axis-variable placeholders and the origin marker are never emitted
    if text == "x" || text == "y" {
        return None;
    }
    if (text == "O" || text == "o") && coord.x == 0.0 && coord.y == 0.0 {
        return None;
    }
    if text.is_empty() {
        return None;
    }

    Some(Fragment::Text(Label {
        coord,
        text,
        color: options.stroke_color(),
    }))
}

// =============================================================================
// Path scanning helpers
// =============================================================================

/// Split a path body on `--` at parenthesis/brace depth zero.
fn split_path_tokens(body: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let bytes = body.as_bytes();
    let mut depth = 0i32;
    let mut start = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'(' | b'{' => depth += 1,
            b')' | b'}' => depth -= 1,
            b'-' if depth == 0 && i + 1 < bytes.len() && bytes[i + 1] == b'-' => {
                tokens.push(body[start..i].trim());
                i += 2;
                start = i;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    tokens.push(body[start..].trim());
    tokens.retain(|t| !t.is_empty());
    tokens
}

/// Resolve every `--`-joined token of a path body, dropping the directive on
/// the first failure.
fn resolve_path_points(body: &str, cmd: &str, ctx: &mut ParseContext) -> Option<Vec<Coord>> {
    let mut tokens = split_path_tokens(body);
    if tokens.last().map(|t| *t == "cycle").unwrap_or(false) {
        tokens.pop();
    }
    let mut points = Vec::with_capacity(tokens.len());
    for token in tokens {
        match coordinate::resolve(token, ctx) {
            Ok(c) => points.push(c),
            Err(e) => {
                warn_unresolved(ctx, cmd, e);
                return None;
            }
        }
    }
    Some(points)
}

/// Remove inline `node[options] (name) {text}` groups from a path body,
/// returning the cleaned body and the nodes in source order.
fn take_inline_nodes(body: &str) -> (String, Vec<InlineNode>) {
    let mut cleaned = String::with_capacity(body.len());
    let mut nodes = Vec::new();
    let mut rest = body;

    while let Some(pos) = rest.find("node") {
        // Word boundary on both sides so a coordinate named `nodeA` survives
        let before_ok = rest[..pos]
            .chars()
            .last()
            .map(|c| !c.is_ascii_alphanumeric())
            .unwrap_or(true);
        let after = &rest[pos + 4..];
        let after_ok = after
            .chars()
            .next()
            .map(|c| !c.is_ascii_alphanumeric())
            .unwrap_or(true);
        if !before_ok || !after_ok {
            cleaned.push_str(&rest[..pos + 4]);
            rest = after;
            continue;
        }

        cleaned.push_str(&rest[..pos]);
        let mut tail = after.trim_start();
        let mut options = String::new();

        if tail.starts_with('[') {
            if let Some(end) = find_matching(tail, '[', ']') {
                options = tail[1..end].to_string();
                tail = tail[end + 1..].trim_start();
            }
        }
        if tail.starts_with('(') {
            if let Some(end) = find_matching(tail, '(', ')') {
                tail = tail[end + 1..].trim_start();
            }
        }
        let mut text = String::new();
        if tail.starts_with('{') {
            if let Some(end) = find_matching(tail, '{', '}') {
                text = tail[1..end].to_string();
                tail = &tail[end + 1..];
            }
        }

        nodes.push(InlineNode { options, text });
        rest = tail;
    }
    cleaned.push_str(rest);
    (cleaned, nodes)
}
