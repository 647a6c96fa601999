//! Error types for `vectordoc`.
//!
//! A single error enum covers vector construction, distance evaluation,
//! query compilation and the in-memory store. Error codes follow the pattern
//! `VDOC-XXX` so they can be matched in logs.

use thiserror::Error;

/// Result type alias for `vectordoc` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in `vectordoc` operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A value claimed to be a vector has a non-numeric element (VDOC-001).
    #[error("[VDOC-001] Type mismatch: {0}")]
    TypeMismatch(String),

    /// Zero-length vector construction attempt (VDOC-002).
    #[error("[VDOC-002] Vector must have at least one dimension")]
    EmptyVector,

    /// Stored and query vectors differ in length (VDOC-003).
    #[error("[VDOC-003] Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension of the query target.
        expected: usize,
        /// Dimension found in the document field.
        actual: usize,
    },

    /// Collection not found (VDOC-004).
    #[error("[VDOC-004] Collection '{0}' not found")]
    CollectionNotFound(String),

    /// Collection already exists (VDOC-005).
    #[error("[VDOC-005] Collection '{0}' already exists")]
    CollectionExists(String),

    /// Document id already present in the collection (VDOC-006).
    #[error("[VDOC-006] Document with ID '{0}' already exists")]
    DocumentExists(u64),

    /// Query parsing or planning error (VDOC-007).
    ///
    /// Wraps `DocQL` parse errors with position information.
    #[error("[VDOC-007] Query error: {0}")]
    Query(String),

    /// No operator registered under this name and arity (VDOC-008).
    #[error("[VDOC-008] Unknown function {name}/{arity}")]
    UnknownOperator {
        /// Upper-cased operator name.
        name: String,
        /// Number of arguments at the call site.
        arity: usize,
    },

    /// A `$parameter` was referenced but not bound (VDOC-009).
    #[error("[VDOC-009] Missing query parameter: ${0}")]
    MissingParameter(String),

    /// Invalid argument to a query operator (VDOC-010).
    #[error("[VDOC-010] Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration error (VDOC-011).
    #[error("[VDOC-011] Configuration error: {0}")]
    Config(String),

    /// Serialization error (VDOC-012).
    #[error("[VDOC-012] Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Returns the error code (e.g., "VDOC-003").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::TypeMismatch(_) => "VDOC-001",
            Self::EmptyVector => "VDOC-002",
            Self::DimensionMismatch { .. } => "VDOC-003",
            Self::CollectionNotFound(_) => "VDOC-004",
            Self::CollectionExists(_) => "VDOC-005",
            Self::DocumentExists(_) => "VDOC-006",
            Self::Query(_) => "VDOC-007",
            Self::UnknownOperator { .. } => "VDOC-008",
            Self::MissingParameter(_) => "VDOC-009",
            Self::InvalidArgument(_) => "VDOC-010",
            Self::Config(_) => "VDOC-011",
            Self::Serialization(_) => "VDOC-012",
        }
    }

    /// Returns true if this error aborts a running scan.
    ///
    /// Every other variant is raised before the first document is pulled.
    #[must_use]
    pub const fn is_query_fault(&self) -> bool {
        matches!(self, Self::DimensionMismatch { .. } | Self::TypeMismatch(_))
    }
}

impl From<crate::docql::ParseError> for Error {
    fn from(err: crate::docql::ParseError) -> Self {
        Self::Query(err.to_string())
    }
}

impl From<crate::config::ConfigError> for Error {
    fn from(err: crate::config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
