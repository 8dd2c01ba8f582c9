//! Integration tests for the directive-to-scene pipeline

use tikzlite::{
    parse_scene, parse_scene_with_diagnostics, Coord, LabelPos, LineStyle, Scene, WarningKind,
};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// ============================================================================
// Axes and Bounds
// ============================================================================

mod bounds {
    use super::*;

    #[test]
    fn test_axis_arrows_set_bounds() {
        let scene = parse_scene(
            r"\draw[->] (-5,0) -- (5,0) node[right] {$x$};
              \draw[->] (0,-3) -- (0,7) node[above] {$y$};",
        );
        assert_eq!(scene.x_min, -5.0);
        assert_eq!(scene.x_max, 5.0);
        assert_eq!(scene.y_min, -3.0);
        assert_eq!(scene.y_max, 7.0);
        // Arrow shafts are not kept as lines; the axes are drawn separately
        assert!(scene.lines.is_empty());
    }

    #[test]
    fn test_fractional_axis_endpoints_rounded_outward() {
        let scene = parse_scene(r"\draw[->] (-4.2,0) -- (4.7,0);");
        assert_eq!(scene.x_min, -5.0);
        assert_eq!(scene.x_max, 5.0);
    }

    #[test]
    fn test_default_bounds_without_axes() {
        let scene = parse_scene(r"\filldraw[red] (1,1) circle (2pt);");
        assert_eq!(scene.x_min, Scene::DEFAULT_MIN);
        assert_eq!(scene.x_max, Scene::DEFAULT_MAX);
        assert_eq!(scene.y_min, Scene::DEFAULT_MIN);
        assert_eq!(scene.y_max, Scene::DEFAULT_MAX);
    }

    #[test]
    fn test_tick_step_follows_range() {
        let scene = parse_scene(r"\draw[->] (-10,0) -- (40,0);");
        assert_eq!(scene.tick_step_x, 5.0);
        let scene = parse_scene(r"\draw[->] (0,-1) -- (0,119);");
        assert_eq!(scene.tick_step_y, 12.0);
        let scene = parse_scene(r"\draw[->] (-5,0) -- (5,0);");
        assert_eq!(scene.tick_step_x, 1.0);
    }

    #[test]
    fn test_diagonal_arrow_is_a_plain_line() {
        let scene = parse_scene(r"\draw[->] (0,0) -- (3,4);");
        assert_eq!(scene.x_min, Scene::DEFAULT_MIN);
        assert_eq!(scene.lines.len(), 1);
    }
}

// ============================================================================
// Variables and Coordinates
// ============================================================================

mod variables {
    use super::*;

    #[test]
    fn test_def_feeds_coordinates() {
        let scene = parse_scene(
            r"\def\a{20} \def\b{2}
              \coordinate (P) at (\a/10, \b);
              \filldraw (P) circle (2pt);",
        );
        assert_eq!(scene.points.len(), 1);
        assert!(close(scene.points[0].coord.x, 2.0));
        assert!(close(scene.points[0].coord.y, 2.0));
    }

    #[test]
    fn test_def_can_reference_earlier_def() {
        let scene = parse_scene(
            r"\def\a{3} \def\b{\a*2}
              \filldraw (\b, 0) circle (2pt);",
        );
        assert!(close(scene.points[0].coord.x, 6.0));
    }

    #[test]
    fn test_redefined_coordinate_keeps_first_value_for_earlier_uses() {
        let scene = parse_scene(
            r"\coordinate (A) at (1,1);
              \filldraw (A) circle (2pt);
              \coordinate (A) at (4,4);
              \filldraw (A) circle (2pt);",
        );
        assert_eq!(scene.points.len(), 2);
        assert!(close(scene.points[0].coord.x, 1.0));
        assert!(close(scene.points[1].coord.x, 4.0));
        // The scene table ends up with the final value
        assert_eq!(scene.coordinates.get("A"), Some(&Coord::new(4.0, 4.0)));
    }

    #[test]
    fn test_forward_reference_drops_directive() {
        let outcome = parse_scene_with_diagnostics(
            r"\draw (A) -- (B);
              \coordinate (A) at (0,0);
              \coordinate (B) at (2,2);",
        );
        assert!(outcome.scene.lines.is_empty());
        assert!(outcome
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::UnresolvedCoordinate));
    }

    #[test]
    fn test_division_by_zero_drops_directive() {
        let outcome = parse_scene_with_diagnostics(r"\coordinate (A) at (1/0, 2);");
        assert!(outcome.scene.coordinates.is_empty());
        assert!(outcome
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::EvalError));
    }
}

// ============================================================================
// Directive Families
// ============================================================================

mod directives {
    use super::*;

    #[test]
    fn test_point_marker_with_label() {
        let scene = parse_scene(
            r"\filldraw[red] (3,4) circle (2.5pt) node[above right] {$A$};",
        );
        assert_eq!(scene.points.len(), 1);
        let p = &scene.points[0];
        assert_eq!(p.color, "red");
        assert_eq!(p.label, "A");
        assert_eq!(p.label_pos, LabelPos::AboveRight);
    }

    #[test]
    fn test_rectangle_becomes_four_corner_fill() {
        let scene = parse_scene(r"\draw[fill=red!20] (1,0) rectangle (3,5);");
        assert_eq!(scene.filled_areas.len(), 1);
        let area = &scene.filled_areas[0];
        assert_eq!(area.points.len(), 4);
        assert_eq!(area.color, "red");
        assert!(close(area.opacity, 0.2));
    }

    #[test]
    fn test_fill_polygon_default_opacity() {
        let scene = parse_scene(r"\fill[blue] (0,0) -- (2,0) -- (2,2) -- cycle;");
        assert_eq!(scene.filled_areas.len(), 1);
        assert!(close(scene.filled_areas[0].opacity, 0.3));
    }

    #[test]
    fn test_dashed_and_dotted_lines() {
        let scene = parse_scene(
            r"\draw[dashed] (0,0) -- (1,1);
              \draw[dotted, blue] (0,0) -- (2,0);",
        );
        assert_eq!(scene.lines.len(), 2);
        assert_eq!(scene.lines[0].style, LineStyle::Dashed);
        assert_eq!(scene.lines[1].style, LineStyle::Dashed);
        assert_eq!(scene.lines[1].color, "blue");
    }

    #[test]
    fn test_cycle_closes_path() {
        let scene = parse_scene(r"\draw (0,0) -- (2,0) -- (1,2) -- cycle;");
        assert_eq!(scene.lines.len(), 1);
        assert!(scene.lines[0].is_cycle);
        assert_eq!(scene.lines[0].points.len(), 3);
    }

    #[test]
    fn test_grid_and_foreach_are_skipped() {
        let outcome = parse_scene_with_diagnostics(
            r"\draw[gray, very thin] (-5,-5) grid (5,5);
              \foreach \i in {1,...,4} { \draw (\i, -0.1) -- (\i, 0.1); }",
        );
        assert!(outcome.scene.is_empty());
        let skipped = outcome
            .warnings
            .iter()
            .filter(|w| w.kind == WarningKind::SkippedDirective)
            .count();
        assert_eq!(skipped, 2);
    }

    #[test]
    fn test_function_plot_with_domain() {
        let scene = parse_scene(
            r"\draw[blue, domain=0.5:5] plot ({\x}, {1/\x});",
        );
        assert_eq!(scene.function_plots.len(), 1);
        let plot = &scene.function_plots[0];
        assert_eq!(plot.variable, "x");
        assert!(close(plot.domain_min, 0.5));
        assert!(close(plot.domain_max, 5.0));
        assert_eq!(plot.color, "blue");
    }

    #[test]
    fn test_plot_without_domain_uses_x_range() {
        let scene = parse_scene(
            r"\draw[->] (-4,0) -- (6,0);
              \draw plot ({\x}, {\x});",
        );
        let plot = &scene.function_plots[0];
        assert!(close(plot.domain_min, -4.0));
        assert!(close(plot.domain_max, 6.0));
    }

    #[test]
    fn test_plot_substitutes_defined_variables() {
        let scene = parse_scene(
            r"\def\k{-6}
              \draw[domain=1:6] plot ({\x}, {\k/\x});",
        );
        let plot = &scene.function_plots[0];
        assert!(plot.expression.contains("-6"));
        assert!(!plot.expression.contains(r"\k"));
    }

    #[test]
    fn test_plot_label_becomes_anchored_text() {
        let scene = parse_scene(
            r"\draw[blue, domain=1:5] plot ({\x}, {\x}) node[right] {$y=x$};",
        );
        assert_eq!(scene.labels.len(), 1);
        let label = &scene.labels[0];
        assert_eq!(label.text, "y=x");
        assert!(close(label.coord.x, 5.0));
        assert!(close(label.coord.y, 5.0));
    }

    #[test]
    fn test_text_node() {
        let scene = parse_scene(r"\node[blue] at (2, -1) {$y=2x$};");
        assert_eq!(scene.labels.len(), 1);
        assert_eq!(scene.labels[0].text, "y=2x");
        assert_eq!(scene.labels[0].color, "blue");
        assert!(close(scene.labels[0].coord.x, 2.0));
    }

    #[test]
    fn test_origin_marker_dropped_only_at_origin() {
        let scene = parse_scene(
            r"\node at (0,0) {$O$};
              \node at (1,1) {$O$};",
        );
        assert_eq!(scene.labels.len(), 1);
        assert!(close(scene.labels[0].coord.x, 1.0));
    }

    #[test]
    fn test_axis_variable_placeholders_dropped() {
        let scene = parse_scene(
            r"\node at (5.2,0) {$x$};
              \node at (0,5.2) {$y$};",
        );
        assert!(scene.labels.is_empty());
    }
}

// ============================================================================
// Label Normalization
// ============================================================================

mod labels {
    use super::*;

    #[test]
    fn test_simple_fraction() {
        let scene = parse_scene(r"\node at (1,1) {$\frac{1}{2}$};");
        assert_eq!(scene.labels[0].text, "1/2");
    }

    #[test]
    fn test_equation_fraction() {
        let scene = parse_scene(r"\node at (1,1) {$y=\frac{k}{x}$};");
        assert_eq!(scene.labels[0].text, "y=k/x");
    }

    #[test]
    fn test_expression_operands_keep_grouping() {
        let scene = parse_scene(r"\node at (1,1) {$\frac{x+1}{2}$};");
        assert_eq!(scene.labels[0].text, "(x+1)/(2)");
    }

    #[test]
    fn test_style_wrappers_unwrapped() {
        let scene = parse_scene(
            r"\node at (1,1) {$\mathrm{B}$};
              \node at (2,2) {\textbf{area}};",
        );
        assert_eq!(scene.labels[0].text, "B");
        assert_eq!(scene.labels[1].text, "area");
    }

    #[test]
    fn test_unknown_commands_stripped() {
        let scene = parse_scene(r"\node at (1,1) {$\alpha\beta q$};");
        assert_eq!(scene.labels[0].text, "q");
    }
}

// ============================================================================
// Robustness
// ============================================================================

mod robustness {
    use super::*;

    #[test]
    fn test_malformed_input_never_panics() {
        let cases = [
            r"\draw[->] (a",
            r"\coordinate (A at (1,2);",
            r"\draw (0,0) -- ;",
            r"\node at {missing coord};",
            r"\draw[domain=:] plot ({\x}, {\x});",
            "{{{{{",
            r"\def\a{\a};",
            "(((((((((()",
            r"\fill[red!xx] (0,0) -- (1,0) -- (1,1) -- cycle;",
        ];
        for case in cases {
            let _ = parse_scene(case);
        }
    }

    #[test]
    fn test_comments_and_environment_stripped() {
        let scene = parse_scene(
            "\\begin{tikzpicture}[scale=1.2]\n% setup\n\\filldraw (1,1) circle (2pt); % point\n\\end{tikzpicture}",
        );
        assert_eq!(scene.points.len(), 1);
    }

    #[test]
    fn test_empty_input_warns() {
        let outcome = parse_scene_with_diagnostics("   \n  % nothing here\n");
        assert!(outcome.scene.is_empty());
        assert!(outcome
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::EmptyScene));
    }

    #[test]
    fn test_parse_is_deterministic() {
        let src = r"\def\k{2}
            \draw[->] (-5,0) -- (5,0);
            \coordinate (A) at (\k, \k);
            \filldraw[red] (A) circle (2pt) node[above] {$A$};
            \draw[blue, domain=0.5:5] plot ({\x}, {\k/\x});";
        let a = parse_scene(src);
        let b = parse_scene(src);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}
