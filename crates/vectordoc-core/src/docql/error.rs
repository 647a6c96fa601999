//! Error types for `DocQL` parsing.

use std::fmt;

/// Error that occurred during parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// Kind of error.
    pub kind: ParseErrorKind,
    /// Byte offset in the input where the error occurred. Clause errors are
    /// raised after parsing and leave it at 0.
    pub position: usize,
    /// The problematic input fragment.
    pub fragment: String,
    /// Human-readable message.
    pub message: String,
}

impl ParseError {
    /// Creates a new parse error.
    #[must_use]
    pub fn new(
        kind: ParseErrorKind,
        position: usize,
        fragment: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            position,
            fragment: fragment.into(),
            message: message.into(),
        }
    }

    /// Creates a syntax error.
    #[must_use]
    pub fn syntax(position: usize, fragment: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ParseErrorKind::SyntaxError, position, fragment, message)
    }

    /// Creates an invalid literal error.
    #[must_use]
    pub fn invalid_literal(position: usize, fragment: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ParseErrorKind::InvalidLiteral, position, fragment, message)
    }

    /// Creates an error for a clause that parses but cannot be planned.
    #[must_use]
    pub fn invalid_clause(fragment: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ParseErrorKind::InvalidClause, 0, fragment, message)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ParseErrorKind::InvalidClause => write!(
                f,
                "[{}] {} in '{}'",
                self.kind.code(),
                self.message,
                self.fragment
            ),
            _ => write!(
                f,
                "[{}] {} at position {}",
                self.kind.code(),
                self.message,
                self.position
            ),
        }
    }
}

impl std::error::Error for ParseError {}

/// Kind of parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Syntax error (E001).
    SyntaxError,
    /// Number or vector literal out of range (E002).
    InvalidLiteral,
    /// Well-formed clause with unsupported arguments or placement (E003).
    InvalidClause,
}

impl ParseErrorKind {
    /// Returns the error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::SyntaxError => "E001",
            Self::InvalidLiteral => "E002",
            Self::InvalidClause => "E003",
        }
    }
}
