//! Solver error kinds.
use thiserror::Error;

/// Errors the solver surfaces to its caller.
///
/// `Timeout` and `ConflictLimitReached` are not logic errors: they report
/// that search was aborted and carry partial statistics alongside them (see
/// [`crate::result::SolverResult`]). `InternalInvariant` is defensive: it
/// signals a broken internal invariant (watch-list inconsistency, clause
/// database accounting mismatch, conflict-analysis step budget exceeded) and
/// must never be silently swallowed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolverError {
    #[error("solver exceeded its deadline")]
    Timeout,

    #[error("solver exceeded its conflict budget")]
    ConflictLimitReached,

    #[error("add_clause is not supported by this solver configuration")]
    IncrementalUnsupported,

    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}
