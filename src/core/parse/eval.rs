//! Arithmetic expression evaluator
//!
//! A small recursive-descent evaluator over `+ - * / ( )`, unary minus,
//! integer/decimal literals and variable names. This is the only expression
//! engine in the crate; generator output is never executed as code.
//!
//! Grammar (standard precedence, left-associative):
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := factor (('*' | '/') factor)*
//! factor := '-' factor | '(' expr ')' | number | variable
//! ```
//!
//! Variable names may appear with or without a leading backslash
//! (`\a` in raw directive text, `a` in the table).

use std::fmt;

use fxhash::FxHashMap;

/// Evaluation failure
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// Unexpected character at byte offset
    UnexpectedChar(char, usize),
    /// Expression ended while more input was expected
    UnexpectedEnd,
    /// Input left over after a complete expression
    TrailingInput(usize),
    /// Division by zero
    DivisionByZero,
    /// Variable not present in the table
    UnknownVariable(String),
    /// Malformed numeric literal
    BadNumber(String),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::UnexpectedChar(c, pos) => {
                write!(f, "unexpected character '{}' at offset {}", c, pos)
            }
            EvalError::UnexpectedEnd => write!(f, "unexpected end of expression"),
            EvalError::TrailingInput(pos) => {
                write!(f, "trailing input at offset {}", pos)
            }
            EvalError::DivisionByZero => write!(f, "division by zero"),
            EvalError::UnknownVariable(name) => write!(f, "unknown variable '{}'", name),
            EvalError::BadNumber(lit) => write!(f, "malformed number '{}'", lit),
        }
    }
}

impl std::error::Error for EvalError {}

/// Evaluate `input` against the given variable table.
///
/// All values are IEEE-754 doubles. Fails instead of panicking on any
/// malformed input.
pub fn eval(input: &str, variables: &FxHashMap<String, f64>) -> Result<f64, EvalError> {
    let mut parser = Parser {
        bytes: input.as_bytes(),
        pos: 0,
        variables,
    };
    parser.skip_ws();
    let value = parser.expr()?;
    parser.skip_ws();
    if parser.pos < parser.bytes.len() {
        return Err(EvalError::TrailingInput(parser.pos));
    }
    Ok(value)
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
    variables: &'a FxHashMap<String, f64>,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r')) {
            self.pos += 1;
        }
    }

    fn expr(&mut self) -> Result<f64, EvalError> {
        let mut value = self.term()?;
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b'+') => {
                    self.pos += 1;
                    value += self.term()?;
                }
                Some(b'-') => {
                    self.pos += 1;
                    value -= self.term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn term(&mut self) -> Result<f64, EvalError> {
        let mut value = self.factor()?;
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b'*') => {
                    self.pos += 1;
                    value *= self.factor()?;
                }
                Some(b'/') => {
                    self.pos += 1;
                    let divisor = self.factor()?;
                    if divisor == 0.0 {
                        return Err(EvalError::DivisionByZero);
                    }
                    value /= divisor;
                }
                _ => return Ok(value),
            }
        }
    }

    fn factor(&mut self) -> Result<f64, EvalError> {
        self.skip_ws();
        match self.peek() {
            None => Err(EvalError::UnexpectedEnd),
            Some(b'-') => {
                self.pos += 1;
                Ok(-self.factor()?)
            }
            Some(b'(') => {
                self.pos += 1;
                let value = self.expr()?;
                self.skip_ws();
                match self.peek() {
                    Some(b')') => {
                        self.pos += 1;
                        Ok(value)
                    }
                    Some(c) => Err(EvalError::UnexpectedChar(c as char, self.pos)),
                    None => Err(EvalError::UnexpectedEnd),
                }
            }
            Some(c) if c.is_ascii_digit() || c == b'.' => self.number(),
            Some(b'\\') => {
                self.pos += 1;
                self.variable()
            }
            Some(c) if c.is_ascii_alphabetic() => self.variable(),
            Some(c) => Err(EvalError::UnexpectedChar(c as char, self.pos)),
        }
    }

    fn number(&mut self) -> Result<f64, EvalError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == b'.') {
            self.pos += 1;
        }
        let lit = &self.bytes[start..self.pos];
        let lit = std::str::from_utf8(lit).unwrap_or("");
        lit.parse::<f64>()
            .map_err(|_| EvalError::BadNumber(lit.to_string()))
    }

    fn variable(&mut self) -> Result<f64, EvalError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric()) {
            self.pos += 1;
        }
        if self.pos == start {
            return match self.peek() {
                Some(c) => Err(EvalError::UnexpectedChar(c as char, self.pos)),
                None => Err(EvalError::UnexpectedEnd),
            };
        }
        let name = std::str::from_utf8(&self.bytes[start..self.pos]).unwrap_or("");
        self.variables
            .get(name)
            .copied()
            .ok_or_else(|| EvalError::UnknownVariable(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, f64)]) -> FxHashMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_literals_and_precedence() {
        let empty = FxHashMap::default();
        assert_eq!(eval("2 + 3 * 4", &empty).unwrap(), 14.0);
        assert_eq!(eval("(2 + 3) * 4", &empty).unwrap(), 20.0);
        assert_eq!(eval("10 - 4 - 3", &empty).unwrap(), 3.0);
        assert_eq!(eval("12 / 4 / 3", &empty).unwrap(), 1.0);
        assert_eq!(eval("1.5 * 2", &empty).unwrap(), 3.0);
    }

    #[test]
    fn test_unary_minus() {
        let empty = FxHashMap::default();
        assert_eq!(eval("-3", &empty).unwrap(), -3.0);
        assert_eq!(eval("--3", &empty).unwrap(), 3.0);
        assert_eq!(eval("2 * -3", &empty).unwrap(), -6.0);
        assert_eq!(eval("-(1 + 2)", &empty).unwrap(), -3.0);
    }

    #[test]
    fn test_variables() {
        let v = vars(&[("a", 20.0), ("x", 2.5)]);
        assert_eq!(eval(r"\a/2", &v).unwrap(), 10.0);
        assert_eq!(eval("a / 2", &v).unwrap(), 10.0);
        assert_eq!(eval(r"-6/\x", &v).unwrap(), -2.4);
    }

    #[test]
    fn test_errors() {
        let empty = FxHashMap::default();
        assert_eq!(eval("1/0", &empty), Err(EvalError::DivisionByZero));
        assert_eq!(
            eval("b + 1", &empty),
            Err(EvalError::UnknownVariable("b".to_string()))
        );
        assert!(matches!(eval("1 +", &empty), Err(EvalError::UnexpectedEnd)));
        assert!(matches!(eval("(1", &empty), Err(EvalError::UnexpectedEnd)));
        assert!(matches!(
            eval("1 2", &empty),
            Err(EvalError::TrailingInput(_))
        ));
        assert!(matches!(
            eval("#", &empty),
            Err(EvalError::UnexpectedChar('#', 0))
        ));
    }

    #[test]
    fn test_never_panics_on_junk() {
        let empty = FxHashMap::default();
        for junk in ["", "(((", "1..2", "a$b", "\\", "* 3", ") 1 ("] {
            let _ = eval(junk, &empty);
        }
    }
}
