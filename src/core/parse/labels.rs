//! Label normalization
//!
//! Deterministic, purely textual rewrite of label markup into plain text.
//! The external math-notation engine is never invoked here; the renderer
//! only consults it later for fraction-looking labels.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Innermost fraction-like two-argument groups
    static ref FRAC: Regex = Regex::new(r"\\[dt]?frac\s*\{([^{}]*)\}\s*\{([^{}]*)\}").unwrap();
    // Single-argument style/wrapper markers, keep the argument
    static ref WRAPPER: Regex = Regex::new(
        r"\\(?:mathrm|mathbf|mathit|mathsf|textrm|textbf|textit|text|mbox|operatorname)\s*\{([^{}]*)\}"
    )
    .unwrap();
    // Standalone size/style keywords with no argument
    static ref STYLE_KEYWORD: Regex = Regex::new(
        r"\\(?:displaystyle|textstyle|scriptstyle|scriptscriptstyle|small|large|Large|LARGE|huge|Huge|rm|bf|it|left|right)\b"
    )
    .unwrap();
    // Any bare markup command that survived the passes above
    static ref BARE_COMMAND: Regex = Regex::new(r"\\[a-zA-Z]+").unwrap();
    // Redundant parentheses around bare numeric/identifier fraction operands
    static ref TIDY_FRACTION: Regex =
        Regex::new(r"\((-?[A-Za-z0-9.]+)\)\s*/\s*\((-?[A-Za-z0-9.]+)\)").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// How many passes the nesting-sensitive rewrites repeat
const MAX_PASSES: usize = 3;

/// Normalize raw label markup into plain text.
pub fn normalize(raw: &str) -> String {
    let mut text = raw.trim().to_string();

    // Surrounding math delimiters
    while text.starts_with('$') && text.ends_with('$') && text.len() >= 2 {
        text = text[1..text.len() - 1].trim().to_string();
    }

    // Doubled escape markers from JSON-ish generator output
    while text.contains("\\\\") {
        text = text.replace("\\\\", "\\");
    }

    // Fractions, innermost first; repeated passes handle nesting
    for _ in 0..MAX_PASSES {
        if !FRAC.is_match(&text) {
            break;
        }
        text = FRAC.replace_all(&text, "($1)/($2)").into_owned();
    }

    // Style/wrapper markers, keeping their argument
    for _ in 0..MAX_PASSES {
        if !WRAPPER.is_match(&text) {
            break;
        }
        text = WRAPPER.replace_all(&text, "$1").into_owned();
    }

    text = STYLE_KEYWORD.replace_all(&text, "").into_owned();
    text = BARE_COMMAND.replace_all(&text, "").into_owned();
    text = text.replace(['{', '}'], "");
    text = TIDY_FRACTION.replace_all(&text, "$1/$2").into_owned();
    text = WHITESPACE.replace_all(&text, " ").trim().to_string();

    text
}

/// True when the normalized text still looks like a fraction; the renderer
/// hands these to the external typesetting engine.
pub fn looks_like_fraction(normalized: &str) -> bool {
    normalized.contains('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_fraction() {
        assert_eq!(normalize(r"$\frac{1}{2}$"), "1/2");
    }

    #[test]
    fn test_doubled_escapes() {
        assert_eq!(normalize("$\\\\frac{1}{2}$"), "1/2");
    }

    #[test]
    fn test_wrapper_strip() {
        assert_eq!(normalize(r"$\mathrm{B}$"), "B");
        assert_eq!(normalize(r"\textbf{sum}"), "sum");
    }

    #[test]
    fn test_fraction_with_expression_operands() {
        // Non-trivial operands keep their grouping parentheses
        assert_eq!(normalize(r"$\frac{x+1}{2}$"), "(x+1)/(2)");
    }

    #[test]
    fn test_equation_label() {
        assert_eq!(normalize(r"$y=\frac{k}{x}$"), "y=k/x");
        assert_eq!(normalize(r"$y=\frac{16}{x}$"), "y=16/x");
    }

    #[test]
    fn test_nested_fraction() {
        // Inner fraction rewritten on the first pass, outer on the second
        let out = normalize(r"$\frac{1}{\frac{2}{3}}$");
        assert!(out.contains("2)/(3") || out.contains("2/3"), "got {}", out);
    }

    #[test]
    fn test_style_keywords_and_leftovers() {
        assert_eq!(normalize(r"$\displaystyle x$"), "x");
        assert_eq!(normalize(r"\alpha"), "");
        assert_eq!(normalize("   a   b  "), "a b");
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(normalize("A"), "A");
        assert_eq!(normalize("$O$"), "O");
    }

    #[test]
    fn test_fraction_detection() {
        assert!(looks_like_fraction("y=k/x"));
        assert!(!looks_like_fraction("y=2x"));
    }
}
