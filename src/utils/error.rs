//! Error handling for diagram rendering
//!
//! Parsing is best-effort and never fails; the fatal errors here only cover
//! the outer surfaces (file IO in the CLI, invalid render options).

use std::fmt;

/// Fatal diagram error type
#[derive(Debug, Clone)]
pub enum DiagramError {
    /// Invalid input that cannot even be treated as an empty diagram
    InvalidInput { message: String },
    /// Invalid render options (non-positive canvas, padding wider than canvas)
    InvalidOptions { message: String },
    /// IO error (for file operations)
    IoError { message: String },
}

impl fmt::Display for DiagramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagramError::InvalidInput { message } => {
                write!(f, "Invalid input: {}", message)
            }
            DiagramError::InvalidOptions { message } => {
                write!(f, "Invalid render options: {}", message)
            }
            DiagramError::IoError { message } => {
                write!(f, "IO error: {}", message)
            }
        }
    }
}

impl std::error::Error for DiagramError {}

impl From<std::io::Error> for DiagramError {
    fn from(err: std::io::Error) -> Self {
        DiagramError::IoError {
            message: err.to_string(),
        }
    }
}

/// Result type for fallible diagram operations
pub type DiagramResult<T> = Result<T, DiagramError>;

// Convenience constructors
impl DiagramError {
    pub fn invalid(message: impl Into<String>) -> Self {
        DiagramError::InvalidInput {
            message: message.into(),
        }
    }

    pub fn options(message: impl Into<String>) -> Self {
        DiagramError::InvalidOptions {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_display() {
        let err = DiagramError::invalid("empty source");
        assert!(err.to_string().contains("Invalid input"));
        assert!(err.to_string().contains("empty source"));
    }

    #[test]
    fn test_io_error_from() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: DiagramError = io.into();
        assert!(err.to_string().contains("IO error"));
    }
}
