//! Coordinate token resolution
//!
//! Turns one coordinate token into a resolved point. Token forms, tried in
//! order:
//!
//! 1. parenthesized pair `(expr, expr)` — both halves go through the
//!    expression evaluator with the current variable table;
//! 2. bare or parenthesized identifier — exact-name lookup in the
//!    coordinate table.
//!
//! A name that is not yet defined is reported as `Unknown`, which callers
//! treat as a silent drop of the owning directive (forward references are
//! tolerated but never re-resolved later).

use std::fmt;

use super::context::ParseContext;
use super::eval::{self, EvalError};
use super::find_matching;
use crate::core::scene::Coord;

/// Why a coordinate token did not resolve
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveError {
    /// One of the halves of a pair failed to evaluate
    Eval(EvalError),
    /// Identifier not present in the coordinate table
    Unknown(String),
    /// Token matched no known form at all
    Malformed(String),
    /// A pair evaluated to a non-finite component
    NonFinite,
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::Eval(e) => write!(f, "expression error: {}", e),
            ResolveError::Unknown(name) => write!(f, "undefined coordinate '{}'", name),
            ResolveError::Malformed(tok) => write!(f, "malformed coordinate token '{}'", tok),
            ResolveError::NonFinite => write!(f, "coordinate is not finite"),
        }
    }
}

impl From<EvalError> for ResolveError {
    fn from(e: EvalError) -> Self {
        ResolveError::Eval(e)
    }
}

/// Resolve a coordinate token against the current tables.
pub fn resolve(token: &str, ctx: &ParseContext) -> Result<Coord, ResolveError> {
    let token = token.trim();

    // Strip one level of parentheses if the token carries them
    let inner = if token.starts_with('(') {
        match find_matching(token, '(', ')') {
            Some(end) if end == token.len() - 1 => token[1..end].trim(),
            // `(a` or `(a) trailing` is not a coordinate token
            _ => return Err(ResolveError::Malformed(token.to_string())),
        }
    } else {
        token
    };

    if inner.is_empty() {
        return Err(ResolveError::Malformed(token.to_string()));
    }

    // Pair form: split on a comma at paren depth zero
    if let Some(split) = top_level_comma(inner) {
        let x = eval::eval(&inner[..split], &ctx.variables)?;
        let y = eval::eval(&inner[split + 1..], &ctx.variables)?;
        let coord = Coord::new(x, y);
        if !coord.is_finite() {
            return Err(ResolveError::NonFinite);
        }
        return Ok(coord);
    }

    // Identifier form: exact-name table lookup
    if is_identifier(inner) {
        return ctx
            .lookup_coordinate(inner)
            .ok_or_else(|| ResolveError::Unknown(inner.to_string()));
    }

    Err(ResolveError::Malformed(token.to_string()))
}

/// Position of the first comma at parenthesis depth zero, if any
fn top_level_comma(s: &str) -> Option<usize> {
    let mut depth = 0i32;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '\'')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_pair() {
        let ctx = ParseContext::new();
        assert_eq!(resolve("(3, 4)", &ctx).unwrap(), Coord::new(3.0, 4.0));
        assert_eq!(resolve("(-1.5,2)", &ctx).unwrap(), Coord::new(-1.5, 2.0));
    }

    #[test]
    fn test_expression_pair_with_variables() {
        let mut ctx = ParseContext::new();
        ctx.variables.insert("a".to_string(), 20.0);
        assert_eq!(
            resolve(r"(\a/2, 3)", &ctx).unwrap(),
            Coord::new(10.0, 3.0)
        );
        assert_eq!(
            resolve("(a/2, a/4)", &ctx).unwrap(),
            Coord::new(10.0, 5.0)
        );
    }

    #[test]
    fn test_named_lookup() {
        let mut ctx = ParseContext::new();
        ctx.define_coordinate("A", Coord::new(1.0, 1.0));
        assert_eq!(resolve("(A)", &ctx).unwrap(), Coord::new(1.0, 1.0));
        assert_eq!(resolve("A", &ctx).unwrap(), Coord::new(1.0, 1.0));
        assert_eq!(
            resolve("(B)", &ctx),
            Err(ResolveError::Unknown("B".to_string()))
        );
    }

    #[test]
    fn test_malformed_tokens() {
        let ctx = ParseContext::new();
        assert!(matches!(
            resolve("(a", &ctx),
            Err(ResolveError::Malformed(_))
        ));
        assert!(matches!(resolve("", &ctx), Err(ResolveError::Malformed(_))));
        assert!(matches!(
            resolve("(1,0)/2", &ctx),
            Err(ResolveError::Malformed(_))
        ));
    }

    #[test]
    fn test_division_by_zero_in_pair() {
        let ctx = ParseContext::new();
        assert_eq!(
            resolve("(1/0, 2)", &ctx),
            Err(ResolveError::Eval(EvalError::DivisionByZero))
        );
    }
}
