//! Error taxonomy for `beingdb-core`.
//!
//! `MalformedFact` and decode anomalies are deliberately absent here: per the
//! fact/compile contract they never propagate as errors (a malformed line is
//! logged and skipped, a malformed pack entry degrades to a shorter decoded
//! argument list). Everything that genuinely aborts a parse, validation, or
//! execution step is represented below.

use thiserror::Error;

/// Top-level error type for all `beingdb-core` operations.
#[derive(Debug, Error)]
pub enum BeingDbError {
    /// The query parser could not extract at least one pattern from the input.
    #[error("invalid query syntax")]
    ParseError,

    /// A pattern's predicate name failed `[a-z0-9_]+`.
    #[error("invalid predicate name: {0}")]
    InvalidPredicateName(String),

    /// A negative offset was supplied.
    #[error("invalid offset: {0}")]
    InvalidOffset(i64),

    /// A non-positive limit was supplied.
    #[error("invalid limit: {0}")]
    InvalidLimit(i64),

    /// The same predicate name appears twice in one query (implies a Cartesian product).
    #[error("predicate '{0}' appears more than once in the query")]
    CartesianProduct(String),

    /// Execution did not complete before the configured deadline.
    #[error("query exceeded the configured timeout")]
    Timeout,

    /// The join frontier exceeded the configured intermediate-result cap.
    #[error("query exceeded the intermediate result cap of {0}; narrow the patterns or add more constants")]
    IntermediateCap(usize),

    /// The admission gate has no free permits.
    #[error("server is at capacity, try again later")]
    Overloaded,

    /// Compile-time only: a predicate file mixed fact arities.
    #[error("predicate '{predicate}' has inconsistent arities (examples: {samples:?})")]
    ArityViolation {
        /// The predicate (file-derived) name.
        predicate: String,
        /// Up to five representative offending lines.
        samples: Vec<String>,
    },

    /// The pack's backing store failed.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Filesystem error while reading source files or pack directories.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Catch-all for conditions that should be unreachable in correct use.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Convenience alias for `Result`s in `beingdb-core`.
pub type BeingDbResult<T> = Result<T, BeingDbError>;
